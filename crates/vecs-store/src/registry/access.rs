//! Handle-level authorization
//!
//! Both checks validate the handle first and evaluate against the cached
//! descriptor under the shared lock, without copying it.

use vecs_authorization::check_access;
use vecs_core::{AccessMask, Principal, Result, VecsError};

use super::{validated, StoreHandle, StoreRegistry};

impl StoreRegistry {
    /// Authorize `principal` for `desired` on the store behind `handle`
    ///
    /// Root and the owner pass unconditionally; anyone else is evaluated
    /// against the ACL with the registry's group membership source.
    pub fn access_check(
        &self,
        handle: &StoreHandle,
        principal: &Principal,
        desired: AccessMask,
    ) -> Result<()> {
        if desired == 0 {
            return Err(VecsError::invalid_argument("desired access mask is empty"));
        }
        let slots = self.slots.read();
        let session = validated(&slots, handle, principal)?;

        let result = check_access(
            session.descriptor(),
            principal,
            desired,
            self.membership.as_ref(),
        );
        match &result {
            Ok(()) => tracing::debug!(
                store_id = %session.store_id(),
                %principal,
                desired,
                "access granted"
            ),
            Err(error) => tracing::warn!(
                store_id = %session.store_id(),
                %principal,
                desired,
                %error,
                "access denied"
            ),
        }
        result
    }

    /// Require that `principal` is the literal owner of the store
    ///
    /// Root gets no bypass here: permission edits and ownership transfer
    /// are reserved to the owner.
    pub fn check_ownership(&self, handle: &StoreHandle, principal: &Principal) -> Result<()> {
        let slots = self.slots.read();
        let session = validated(&slots, handle, principal)?;
        if !session.descriptor().is_owner(principal) {
            return Err(VecsError::access_denied(format!(
                "{principal} does not own {}",
                session.store_id()
            )));
        }
        Ok(())
    }
}
