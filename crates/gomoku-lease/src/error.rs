//! Error types for the lease layer.

/// Errors that can occur when leasing room ids.
///
/// Only genuine failures live here. Renewing or releasing an id that
/// isn't leased is a logged no-op, not an error.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Every id in the space is currently leased.
    /// Retrying immediately won't help; an id frees up only when a room
    /// is deleted or a lease expires.
    #[error("no room ids available (all {capacity} leased)")]
    Exhausted { capacity: u32 },
}
