//! Versioned, append-only journal for the storefront.
//!
//! Every cart and every order is a stream of [`Record`]s. Appends carry an
//! expected stream version, which is the compare-and-set primitive the cart
//! store and the order lifecycle engine rely on.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::{StreamId, UserId};
pub use error::{JournalError, Result};
pub use memory::InMemoryJournal;
pub use postgres::PostgresJournal;
pub use record::{Record, RecordBuilder, RecordId, StreamKind, Version};
pub use store::{AppendOptions, Journal, JournalExt, RecordStream};
