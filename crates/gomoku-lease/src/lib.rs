//! Room-id leasing for the Gomoku lobby.
//!
//! Room ids are six decimal digits so a player can read one out to a
//! friend. That makes the id space finite (one million values), so ids
//! have to be handed back:
//!
//! 1. **Acquire**: pop an id from a shuffled queue and record a lease.
//! 2. **Renew**: an active room refreshes its lease.
//! 3. **Release**: a room that is gone gives its id back right away.
//! 4. **Reclaim**: a background pass returns ids whose lease ran out.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← acquires an id per room, releases on delete
//!     ↓
//! Lease Layer (this crate)  ← owns the id queue and the lease records
//!     ↓
//! Protocol Layer (below)  ← provides RoomId
//! ```
//!
//! The pool has its own lock. Callers may hold their own lock while
//! calling into the pool, but the pool never calls back out.

mod config;
mod error;
mod pool;

pub use config::LeaseConfig;
pub use error::PoolError;
pub use pool::{Lease, RoomIdPool};
