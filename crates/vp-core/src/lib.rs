//! # vp-core
//!
//! Compiles governance policies into attestation verification policies.
//!
//! A governance policy describes *what* must hold (assessment plans,
//! evidence, parameters); a verification policy describes *how* to check
//! it against signed attestations (CEL tenets, predicate type
//! selectors, a runtime context table). The mapper walks every
//! assessment plan, classifies its evidence, and emits one tenet per
//! automatable evaluation method.
//!
//! ## Key invariants
//!
//! - **Deterministic ids**: tenet ids are `{requirement}-{plan}-{ordinal}`
//!   where the ordinal counts only automatable methods, so regeneration
//!   is stable and merging by id is safe.
//! - **Parameters stay late-bound**: generated expressions reference
//!   `context["<id>"]` instead of baking values in; operators retarget a
//!   policy by editing the context table, never the CEL.
//! - **Merge preserves edits**: [`merge_policies`] keeps hand-tuned
//!   code and outputs for tenets that survive regeneration and takes
//!   everything else from the generated side.

pub mod catalog;
pub mod error;
pub mod generate;
pub mod infer;
pub mod mapper;
pub mod merge;
pub mod ordered;
pub mod policy;
pub mod scope;
pub mod source;
pub mod template;

pub use error::CoreError;
pub use mapper::{map_policy, map_policy_set, map_policy_with_imports, SetOptions, TransformOptions};
pub use merge::merge_policies;
pub use ordered::OrderedMap;
pub use policy::{MergeStats, PolicySet, VerificationPolicy};
pub use source::{Catalog, GovernancePolicy};
pub use template::TemplateLibrary;
