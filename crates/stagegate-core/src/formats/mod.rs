//! # Formats
//!
//! On-disk encodings. File and database I/O live in [`crate::storage`].

pub mod persistence;

pub use persistence::{MAX_SNAPSHOT_SIZE, PersistenceHeader, state_from_bytes, state_to_bytes};
