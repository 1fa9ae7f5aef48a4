//! Proptest strategies for principals, masks and ACLs

use proptest::prelude::*;
use vecs_authorization::{Ace, AceKind, Acl, SecurityDescriptor};
use vecs_core::{AccessMask, Principal};

/// Ordinary users with uids 1000..1008
pub fn arb_user() -> impl Strategy<Value = Principal> {
    (1000u32..1008).prop_map(|uid| Principal::user(uid, format!("user{uid}")))
}

/// Users, a group, or everyone
pub fn arb_principal() -> impl Strategy<Value = Principal> {
    prop_oneof![
        4 => arb_user(),
        1 => Just(Principal::group(2000, "certadmins")),
        1 => Just(Principal::everyone()),
    ]
}

/// Non-empty mask over the low four bits
pub fn arb_access_mask() -> impl Strategy<Value = AccessMask> {
    1u32..16
}

/// Allowed or denied
pub fn arb_ace_kind() -> impl Strategy<Value = AceKind> {
    prop_oneof![Just(AceKind::Allowed), Just(AceKind::Denied)]
}

/// One entry for an arbitrary principal
pub fn arb_ace() -> impl Strategy<Value = Ace> {
    (arb_principal(), arb_ace_kind(), arb_access_mask())
        .prop_map(|(principal, kind, mask)| Ace::persisted(principal, kind, mask))
}

/// Up to eight entries in arbitrary order
pub fn arb_acl() -> impl Strategy<Value = Acl> {
    prop::collection::vec(arb_ace(), 0..8).prop_map(Acl::from_entries)
}

/// Descriptor owned by `owner` with an arbitrary ACL
pub fn arb_descriptor(owner: Principal) -> impl Strategy<Value = SecurityDescriptor> {
    arb_acl().prop_map(move |acl| SecurityDescriptor::from_parts(owner.clone(), acl, 1).unwrap())
}
