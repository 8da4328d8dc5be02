//! Networking modules for the session HTTP contract.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` performs the identity probe and logout calls, and `types` defines
//! the wire schema those calls exchange.

pub mod api;
pub mod types;
