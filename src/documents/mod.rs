//! Document storage and text extraction.
//!
//! [`DocumentStore`] is an explicit handle over a storage directory. It is
//! constructed once and passed to the tool layer, so tests can point it at
//! a temporary directory.

pub mod extract;
pub mod store;

pub use extract::{DocumentFormat, extract_text};
pub use store::{DEFAULT_DATA_DIR, DocumentStore};
