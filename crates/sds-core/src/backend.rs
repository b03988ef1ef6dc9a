//! The contract every concrete file-format backend implements, plus the
//! metadata policies shared by backends of the same family.
//!
//! A backend translates windowed read/write requests into calls against
//! its format library and releases the native handle on close. Opening
//! a file is backend-specific (each backend crate exposes its own
//! `open`); once open, all data access goes through this trait via the
//! engine in [`crate::io`].

use std::any::Any;

use crate::error::SdsError;
use crate::types::SdsType;

/// Per-buffer backend state. A backend stores whatever bookkeeping it
/// needs to serve repeated reads through one reusable buffer (for
/// example, the HDF4-style per-variable access handle) as a boxed value
/// here. Downcasting identifies the owner: when the slot holds another
/// backend's (or another variable's) state, the backend replaces it,
/// dropping the old record.
pub type BufferSlot = Option<Box<dyn Any>>;

/// One windowed read or write request, fully resolved by the engine.
///
/// `start`/`count` have one entry per axis of the variable, outermost
/// first; the product of `count` times the element width is exactly the
/// byte length of the destination or source slice.
#[derive(Debug)]
pub struct WindowReq<'a> {
    /// Path of the backing file, for diagnostics.
    pub path: &'a str,
    /// Name of the variable, for diagnostics.
    pub var_name: &'a str,
    /// Backend-private variable id assigned at open/create time.
    pub var_id: i32,
    /// Element type of the variable.
    pub ty: SdsType,
    pub start: &'a [usize],
    pub count: &'a [usize],
}

/// The function table bound to a [`Dataset`](crate::Dataset) by the
/// backend that opened or created it.
///
/// Errors returned from these methods are treated as fatal by the
/// engine: there is no recovery path at this layer for corrupt or
/// inaccessible files. Callers that need resilience must wrap the
/// engine at a higher layer.
pub trait Backend {
    /// Read the requested window into `dst`, which the engine has sized
    /// to exactly the request. `state` is the reusable buffer's backend
    /// slot; see [`BufferSlot`].
    fn read_window(
        &mut self,
        req: &WindowReq<'_>,
        state: &mut BufferSlot,
        dst: &mut [u8],
    ) -> Result<(), SdsError>;

    /// Write `data` over the requested window. Backends that do not
    /// support writing return [`SdsError::Unsupported`] so the engine
    /// can fail fast instead of silently dropping data.
    fn write_window(&mut self, req: &WindowReq<'_>, data: &[u8]) -> Result<(), SdsError>;

    /// Release the backend-native handle. Called once, before the
    /// dataset's metadata is dropped.
    fn close(&mut self, path: &str) -> Result<(), SdsError>;
}

/// Attribute names that HDF4-style backends silently drop on open:
/// bulk structural-metadata conventions that describe the file layout
/// rather than the data. Matching is a case-insensitive prefix test.
pub const RESERVED_ATT_PREFIXES: [&str; 4] = [
    "coremetadata",
    "structmetadata",
    "archivemetadata",
    "archivedmetadata",
];

/// Whether an attribute name is reserved bulk metadata (see
/// [`RESERVED_ATT_PREFIXES`]).
pub fn is_reserved_att(name: &str) -> bool {
    RESERVED_ATT_PREFIXES.iter().any(|prefix| {
        name.len() >= prefix.len()
            && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
    })
}

/// Whether a dimension name matches the synthetic `fakeDim<digits>`
/// pattern that HDF4-style tooling generates for unnamed dimensions.
///
/// Two same-size, non-unlimited dimensions matching this pattern are
/// treated as the same logical dimension when a file is opened. This is
/// a compatibility heuristic keyed to tool-generated names, not a
/// general dimension-identity rule; real names never fold.
pub fn is_fake_dim(name: &str) -> bool {
    match name.strip_prefix("fakeDim") {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_dim_pattern_requires_digits() {
        assert!(is_fake_dim("fakeDim0"));
        assert!(is_fake_dim("fakeDim42"));
        assert!(!is_fake_dim("fakeDim"));
        assert!(!is_fake_dim("fakeDim4x"));
        assert!(!is_fake_dim("FakeDim4"));
        assert!(!is_fake_dim("latitude"));
    }

    #[test]
    fn reserved_attributes_match_case_insensitive_prefixes() {
        assert!(is_reserved_att("coremetadata.0"));
        assert!(is_reserved_att("StructMetadata.0"));
        assert!(is_reserved_att("ARCHIVEDMETADATA"));
        assert!(!is_reserved_att("core"));
        assert!(!is_reserved_att("units"));
    }
}
