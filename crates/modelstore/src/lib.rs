//! Model store: each named model is read and parsed at most once per
//! store lifetime.
//! M3: lazy per-key slots over a byte-oriented file source.

pub mod source;
pub mod store;

pub use source::{AssetSource, DiskSource, SourceError};
pub use store::{Model, ModelKey, ModelStore, StoreError};
