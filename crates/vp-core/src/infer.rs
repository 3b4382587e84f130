// infer.rs — Attestation predicate-type inference.
//
// Evidence descriptions are free text; mapping them to well-known
// predicate types is a keyword heuristic. The rules live in an ordered
// table evaluated top-to-bottom so the tie-break order is auditable and
// testable rule by rule.

use crate::source::GovernancePolicy;

/// SLSA build provenance predicate type.
pub const SLSA_PROVENANCE_V1: &str = "https://slsa.dev/provenance/v1";

/// Generic in-toto statement predicate type.
pub const INTOTO_STATEMENT_V01: &str = "https://in-toto.io/Statement/v0.1";

/// Predicate types considered standard. URLs found in evidence text
/// that match none of these are surfaced as custom types.
const STANDARD_PREDICATE_TYPES: &[&str] = &[
    "https://slsa.dev/provenance/v1",
    "https://in-toto.io/Statement/v0.1",
    "https://in-toto.io/Statement/v1",
];

/// One inference rule: if the lowercased text contains any keyword,
/// the predicate type applies.
struct InferenceRule {
    keywords: &'static [&'static str],
    predicate_type: &'static str,
}

/// Evaluated in order; first match wins.
const INFERENCE_RULES: &[InferenceRule] = &[
    InferenceRule {
        keywords: &["slsa", "provenance", "builder", "build provenance"],
        predicate_type: SLSA_PROVENANCE_V1,
    },
    InferenceRule {
        keywords: &["vulnerabilit", "cve", "security scan", "vuln scan"],
        predicate_type: INTOTO_STATEMENT_V01,
    },
    InferenceRule {
        keywords: &["in-toto", "attestation"],
        predicate_type: INTOTO_STATEMENT_V01,
    },
];

/// Infer a single predicate type from an evidence description.
/// Returns `None` when no rule matches.
pub fn infer_predicate_type(evidence: &str) -> Option<&'static str> {
    let lower = evidence.to_lowercase();
    INFERENCE_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map(|rule| rule.predicate_type)
}

/// Which attestation types a whole policy will need for verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateInference {
    /// SLSA provenance attestations are needed.
    pub requires_provenance: bool,

    /// Vulnerability scan attestations are needed.
    pub requires_vuln_scan: bool,

    /// Non-standard predicate-type URLs found in the text, de-duplicated
    /// in encounter order.
    pub custom_types: Vec<String>,
}

impl PredicateInference {
    /// All inferred types as predicate-type URLs.
    pub fn all_types(&self) -> Vec<String> {
        let mut types = Vec::new();
        if self.requires_provenance {
            types.push(SLSA_PROVENANCE_V1.to_string());
        }
        if self.requires_vuln_scan {
            types.push(INTOTO_STATEMENT_V01.to_string());
        }
        types.extend(self.custom_types.iter().cloned());
        types
    }
}

/// Walk every plan's evidence text and every policy-level method
/// description, collecting required attestation types.
pub fn infer_policy_requirements(policy: &GovernancePolicy) -> PredicateInference {
    let mut inference = PredicateInference::default();

    for plan in &policy.plans {
        if !plan.evidence.is_empty() {
            scan_text(&plan.evidence, &mut inference);
        }
    }
    for method in &policy.methods {
        if !method.description.is_empty() {
            scan_text(&method.description, &mut inference);
        }
    }

    inference
}

const PROVENANCE_HINTS: &[&str] = &[
    "slsa",
    "provenance",
    "builder",
    "build provenance",
    "build attestation",
];

const VULN_SCAN_HINTS: &[&str] = &[
    "vulnerabilit",
    "cve",
    "security scan",
    "vuln scan",
    "vulnerability scan",
];

fn scan_text(text: &str, inference: &mut PredicateInference) {
    let lower = text.to_lowercase();

    if PROVENANCE_HINTS.iter().any(|k| lower.contains(k)) {
        inference.requires_provenance = true;
    }
    if VULN_SCAN_HINTS.iter().any(|k| lower.contains(k)) {
        inference.requires_vuln_scan = true;
    }

    // Literal predicate-type URLs embedded in the text that are not on
    // the standard list are surfaced as custom types.
    if text.contains("https://") {
        for word in text.split_whitespace() {
            if word.starts_with("https://")
                && !is_standard_predicate_type(word)
                && !inference.custom_types.iter().any(|t| t == word)
            {
                inference.custom_types.push(word.to_string());
            }
        }
    }
}

fn is_standard_predicate_type(url: &str) -> bool {
    STANDARD_PREDICATE_TYPES.iter().any(|std| url.contains(std))
}
