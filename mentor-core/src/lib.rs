//! Shared data model and local persistence for mentor.
//!
//! The binary crate owns all UI and network concerns; this crate holds the
//! types both sides exchange and the SQLite-backed key-value store that
//! mirrors the two-entry layout of the original design: a JSON history array
//! and a plain integer score string.

pub mod db;
pub mod schema;
pub mod types;
