//! # vp-workspace
//!
//! Workspace persistence for generated verification policies.
//!
//! The workspace is a directory of JSON files, one per policy id. It is
//! the anchor for regeneration: when a policy is converted again, the
//! stored copy becomes the "existing" side of the merge so that
//! operator edits to tenet code and outputs survive.

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::PolicyStore;
