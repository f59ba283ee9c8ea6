//! Optimistic concurrency check. The lead's modification timestamp is the
//! token: a client that supplies one must match the stored value exactly
//! (both sides are canonicalized on read, so string equality is
//! well-defined). A client that supplies none writes unconditionally.

use leadline_core::errors::ActionError;

/// Compare the client's last-known token against the stored one. Callers
/// re-fetch the stored record immediately before this check; the window
/// between check and write is accepted because single-row writes are
/// atomic at the store.
pub fn check_concurrency(stored: &str, supplied: Option<&str>) -> Result<(), ActionError> {
    match supplied {
        None => Ok(()),
        Some(token) if token == stored => Ok(()),
        Some(_) => Err(ActionError::Conflict),
    }
}
