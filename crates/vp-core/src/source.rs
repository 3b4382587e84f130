// source.rs — Typed model of the source governance documents.
//
// Governance policies pair requirements with assessment plans: what
// evidence satisfies a requirement, which parameters tune the check,
// and how the check is evaluated (automated, manual, ...). The compiler
// reads these records and never mutates them.
//
// Field names match the document format so YAML/JSON inputs parse
// directly; everything that can be absent in an authored document
// carries `#[serde(default)]`.

use serde::{Deserialize, Serialize};

/// A governance policy document — the compiler's read-only input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernancePolicy {
    /// Stable policy identifier, carried through to the output.
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Dotted version string (e.g. "2.7.3"). Only the major segment
    /// survives the transformation.
    #[serde(default)]
    pub version: String,

    /// Ordered assessment plans; each becomes zero or more tenets.
    #[serde(default)]
    pub plans: Vec<AssessmentPlan>,

    /// Policy-level evaluation methods, scanned for attestation hints.
    #[serde(default)]
    pub methods: Vec<EvaluationMethod>,

    /// Applies-to dimensions, compiled to subject filters on request.
    #[serde(default)]
    pub scope: Scope,

    /// References to external policies (`scheme://host/path#fragment`).
    #[serde(default)]
    pub imports: Vec<String>,
}

/// One assessment plan: a requirement, its evidence, and how to check it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentPlan {
    pub id: String,

    /// The requirement this plan assesses, also the catalog lookup key.
    pub requirement_id: String,

    /// Free-text description of the evidence that satisfies the
    /// requirement. Drives template selection and type inference.
    #[serde(default)]
    pub evidence: String,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub methods: Vec<EvaluationMethod>,
}

/// A tunable check parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameter {
    pub id: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub description: String,

    /// Accepted values in preference order. Empty means the value is
    /// supplied at runtime and the context entry is required.
    #[serde(default)]
    pub accepted_values: Vec<String>,
}

/// How a plan is evaluated. Only a fixed set of kinds is automatable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationMethod {
    /// Classification tag: "automated", "gate", "behavioral",
    /// "autoremediation", "manual", ...
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub description: String,
}

/// Applies-to dimensions of a governance policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scope {
    #[serde(default)]
    pub technologies: Vec<String>,

    #[serde(default)]
    pub regions: Vec<String>,

    #[serde(default)]
    pub sensitivity: Vec<String>,

    #[serde(default)]
    pub groups: Vec<String>,
}

impl Scope {
    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
            && self.regions.is_empty()
            && self.sensitivity.is_empty()
            && self.groups.is_empty()
    }
}

/// An external control catalog used to enrich requirement references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub families: Vec<Family>,

    #[serde(default)]
    pub controls: Vec<CatalogControl>,
}

/// A control family grouping related controls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Family {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,
}

/// A control with its assessment requirements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogControl {
    pub id: String,

    #[serde(default)]
    pub title: String,

    /// Id of the family this control belongs to.
    #[serde(default)]
    pub family: String,

    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

/// A single assessment requirement inside a control.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,

    #[serde(default)]
    pub text: String,
}
