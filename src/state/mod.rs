//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! State is split by concern (`auth`, `notification`) so the guard and the
//! shell can depend on small focused models. Both are cheap-to-clone handles
//! over an `Arc`, constructed explicitly and passed where needed.

pub mod auth;
pub mod notification;
