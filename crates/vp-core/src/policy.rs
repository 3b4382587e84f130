// policy.rs — The verification-policy output model.
//
// A verification policy is an ordered list of tenets, each a boolean
// expression evaluated against signed attestations by a downstream
// engine. This crate only generates and reconciles these records; it
// never evaluates them.
//
// Serialization contract: optional fields are omitted when empty and
// key order in context/output collections follows source iteration
// order, so regenerated files diff cleanly against hand-edited ones.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ordered::OrderedMap;

/// Expression runtime identifier stamped on policies and tenets.
pub const EXPRESSION_RUNTIME: &str = "cel@v14.0";

/// A machine-evaluable verification policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationPolicy {
    pub id: String,

    pub meta: Meta,

    /// Runtime-overridable parameter values referenced from tenet
    /// expressions as `context["<id>"]`.
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub context: OrderedMap<ContextVal>,

    pub tenets: Vec<Tenet>,
}

/// Policy-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub runtime: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Best-effort major version parsed from the source's dotted
    /// version string.
    pub version: i64,

    pub assert_mode: AssertMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce: Option<String>,

    /// Controls this policy verifies, resolved from a catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<Vec<ControlRef>>,
}

/// How tenet results combine into the policy verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssertMode {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl std::fmt::Display for AssertMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssertMode::And => write!(f, "AND"),
            AssertMode::Or => write!(f, "OR"),
        }
    }
}

/// A typed context entry backing one source parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextVal {
    #[serde(rename = "type")]
    pub value_type: String,

    /// True when the value must be supplied at evaluation time.
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One verification check: an identifier, a boolean expression, and an
/// optional predicate-type filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenet {
    pub id: String,

    pub title: String,

    pub runtime: String,

    /// The verification expression. Hand-edits to this field survive
    /// regeneration through the merge engine.
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicates: Option<PredicateSpec>,

    /// Named output bindings, populated at evaluation time. Hand-edits
    /// survive regeneration like `code`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<OrderedMap<Output>>,
}

/// Filter restricting which attestation payload schemas a tenet sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateSpec {
    pub types: Vec<String>,

    /// Cap on matching attestations considered. Never set by the
    /// mapper; honored when hand-authored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// A named output binding on a tenet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// A control reference resolved from a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRef {
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    /// Control family title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,

    /// Control family id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

/// A collection of policies emitted as one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySet {
    pub id: String,

    pub meta: SetMeta,

    pub policies: Vec<PolicyRef>,
}

/// Policy-set level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// A policy inside a set: either inlined or an external reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRef {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub context: OrderedMap<ContextVal>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tenets: Vec<Tenet>,

    /// Locator for an external, non-inlined policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PolicySource>,
}

/// Where an external policy lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySource {
    pub uri: String,
}

/// Counters from one reconciliation call. Observational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Tenets whose code/outputs were carried over from the existing policy.
    pub preserved: usize,
    /// Brand-new tenets taken from the generated policy.
    pub added: usize,
    /// Existing tenets with no generated counterpart, dropped.
    pub removed: usize,
}

impl VerificationPolicy {
    /// Structural validation: at least one tenet, every tenet carries a
    /// non-empty id and expression, ids are unique. Failures are
    /// returned, never silently corrected.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.tenets.is_empty() {
            return Err(CoreError::Validation {
                field: "tenets".to_string(),
                reason: "policy has no tenets".to_string(),
            });
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(self.tenets.len());
        for (i, tenet) in self.tenets.iter().enumerate() {
            if tenet.id.is_empty() {
                return Err(CoreError::Validation {
                    field: format!("tenets[{i}].id"),
                    reason: "tenet has no identifier".to_string(),
                });
            }
            if tenet.code.is_empty() {
                return Err(CoreError::Validation {
                    field: format!("tenets[{i}].code"),
                    reason: format!("tenet '{}' has no expression", tenet.id),
                });
            }
            if !seen.insert(&tenet.id) {
                return Err(CoreError::Validation {
                    field: format!("tenets[{i}].id"),
                    reason: format!("duplicate tenet id '{}'", tenet.id),
                });
            }
        }
        Ok(())
    }
}

impl PolicySet {
    /// A set must reference at least one policy, and every entry must
    /// either inline a valid policy body or point somewhere external.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.policies.is_empty() {
            return Err(CoreError::Validation {
                field: "policies".to_string(),
                reason: "policy set references no policies".to_string(),
            });
        }
        for (i, policy) in self.policies.iter().enumerate() {
            if policy.id.is_empty() {
                return Err(CoreError::Validation {
                    field: format!("policies[{i}].id"),
                    reason: "policy reference has no identifier".to_string(),
                });
            }
            if policy.source.is_none() && policy.tenets.is_empty() {
                return Err(CoreError::Validation {
                    field: format!("policies[{i}]"),
                    reason: format!(
                        "policy '{}' is neither inlined nor externally referenced",
                        policy.id
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenet(id: &str, code: &str) -> Tenet {
        Tenet {
            id: id.to_string(),
            title: format!("Tenet {id}"),
            runtime: EXPRESSION_RUNTIME.to_string(),
            code: code.to_string(),
            predicates: None,
            outputs: None,
        }
    }

    fn policy_with(tenets: Vec<Tenet>) -> VerificationPolicy {
        VerificationPolicy {
            id: "test-policy".to_string(),
            meta: Meta {
                runtime: EXPRESSION_RUNTIME.to_string(),
                description: String::new(),
                version: 1,
                assert_mode: AssertMode::And,
                enforce: None,
                controls: None,
            },
            context: OrderedMap::new(),
            tenets,
        }
    }

    #[test]
    fn valid_policy_passes() {
        let policy = policy_with(vec![tenet("t-1", "true")]);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn policy_without_tenets_fails() {
        let policy = policy_with(vec![]);
        let err = policy.validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "tenets"));
    }

    #[test]
    fn tenet_without_expression_fails_with_field_path() {
        let policy = policy_with(vec![tenet("t-1", "true"), tenet("t-2", "")]);
        let err = policy.validate().unwrap_err();
        match err {
            CoreError::Validation { field, reason } => {
                assert_eq!(field, "tenets[1].code");
                assert!(reason.contains("t-2"));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_tenet_ids_fail() {
        let policy = policy_with(vec![tenet("t-1", "true"), tenet("t-1", "false")]);
        let err = policy.validate().unwrap_err();
        assert!(format!("{}", err).contains("duplicate tenet id"));
    }

    #[test]
    fn serialization_omits_empty_optionals() {
        let policy = policy_with(vec![tenet("t-1", "true")]);
        let json = serde_json::to_string_pretty(&policy).unwrap();
        assert!(!json.contains("\"context\""));
        assert!(!json.contains("\"predicates\""));
        assert!(!json.contains("\"outputs\""));
        assert!(!json.contains("\"enforce\""));
        assert!(!json.contains("\"controls\""));
        assert!(json.contains("\"assert_mode\": \"AND\""));
    }

    #[test]
    fn policy_round_trips_through_json() {
        let mut policy = policy_with(vec![tenet("t-1", "attestation.predicateType != \"\"")]);
        policy.context.insert(
            "builder-id",
            ContextVal {
                value_type: "string".to_string(),
                required: false,
                default: Some("gh-builder".to_string()),
                value: Some("gh-builder".to_string()),
                description: Some("Expected builder".to_string()),
            },
        );
        let json = serde_json::to_string(&policy).unwrap();
        let restored: VerificationPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(policy, restored);
    }

    #[test]
    fn policy_set_requires_inline_body_or_source() {
        let set = PolicySet {
            id: "set-1".to_string(),
            meta: SetMeta::default(),
            policies: vec![PolicyRef {
                id: "dangling".to_string(),
                meta: None,
                context: OrderedMap::new(),
                tenets: vec![],
                source: None,
            }],
        };
        assert!(set.validate().is_err());
    }
}
