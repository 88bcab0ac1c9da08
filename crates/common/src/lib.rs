//! Identifier types shared across the storefront workspace.

mod types;

pub use types::{StreamId, UserId};
