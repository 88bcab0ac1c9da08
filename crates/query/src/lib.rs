//! Read side of the storefront.
//!
//! Orders are listed per owner straight from the journal: the owner's order
//! streams are replayed, optionally filtered by status, and returned newest
//! first.

pub mod filter;
pub mod service;

pub use filter::parse_status_filter;
pub use service::OrderQueryService;
