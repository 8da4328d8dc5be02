//! # session-gate
//!
//! Session restoration and navigation guarding for a cookie-authenticated
//! single-page application shell.
//!
//! This crate contains the session client (`net`), the session and
//! notification state (`state`), the route table with its pre-navigation
//! guard (`router`), typed configuration (`config`), and the `Shell` context
//! object (`app`) that wires them together and enforces the boot barrier.

pub mod app;
pub mod config;
pub mod net;
pub mod router;
pub mod state;
