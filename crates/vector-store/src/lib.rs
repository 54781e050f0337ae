//! # contextd-vector-store
//!
//! The multi-tenant, hash-addressed document store underneath every other
//! contextd module. A `VectorStore` owns a directory of `Collection`s; each
//! collection is a flat, append-mostly set of JSON document records with a
//! cosine-similarity query path. Every read and write is tenant-scoped
//! through a `Filter` — there is no unfiltered query, by design.
//!
//! ## On-disk layout
//!
//! ```text
//! <root>/
//!   <8-hex-hash>/
//!     00000000.json   # collection metadata
//!     00000001.json   # document record
//!     00000002.json
//!   quarantine/
//!     <8-hex-hash>/   # collections missing metadata, set aside on startup
//! ```
//!
//! Recovery (`recovery::recover_metadata`, `recovery::restore_from_quarantine`)
//! is an explicit admin action, never something the running service does on
//! its own.

mod collection;
mod error;
mod health;
mod metadata;
mod paths;
mod recovery;
mod store;
mod types;

pub use collection::Collection;
pub use error::{Result, VectorStoreError};
pub use health::HealthReport;
pub use metadata::{CollectionMetadata, METADATA_SCHEMA_VERSION};
pub use paths::{collection_hash, is_valid_collection_name, is_valid_hash};
pub use recovery::{recover_metadata, restore_from_quarantine};
pub use store::VectorStore;
pub use types::{Document, Filter, ScoredDocument};
