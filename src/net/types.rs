//! Wire DTOs for the session endpoints and the identity they describe.
//!
//! DESIGN
//! ======
//! The server reports the display name as `username`; inside the crate it is
//! `display_name`. `Identity` holds both fields so they can only ever be set
//! or cleared together.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// The authenticated principal as returned by `GET /me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque unique user identifier.
    pub id: String,
    /// Human-readable name shown in the UI.
    #[serde(rename = "username")]
    pub display_name: String,
}

impl Identity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self { id: id.into(), display_name: display_name.into() }
    }

    /// A payload is only usable when it actually names someone.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty()
    }
}
