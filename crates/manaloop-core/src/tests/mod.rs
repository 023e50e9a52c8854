//! Crate-level test suites.
//!
//! - `helpers.rs`: the sandbox test domain and world builders
//! - `scheduler.rs`: resolution precedence, lockstep advancement, hooks
//! - `codec.rs`: permanent-state round-trips, clone, loop reset, projection
//! - `determinism.rs`: reproducibility and property tests

mod codec;
mod helpers;
