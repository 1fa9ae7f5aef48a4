//! Access mask vocabulary
//!
//! The registry and ACL engine treat masks as opaque bitmasks. The named
//! bits below are the ones the store service hands out.

/// Bitmask of requested or granted rights
pub type AccessMask = u32;

/// Read certificates and keys from a store
pub const READ_STORE: AccessMask = 0x1;

/// Add or remove certificates and keys in a store
pub const WRITE_STORE: AccessMask = 0x2;

/// Render a mask as `read|write` for log lines
pub fn describe_mask(mask: AccessMask) -> String {
    let mut parts = Vec::new();
    if mask & READ_STORE != 0 {
        parts.push("read".to_string());
    }
    if mask & WRITE_STORE != 0 {
        parts.push("write".to_string());
    }
    let rest = mask & !(READ_STORE | WRITE_STORE);
    if rest != 0 {
        parts.push(format!("{rest:#x}"));
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join("|")
    }
}
