// generate.rs — Expression generation for one evaluation method.
//
// Selection is an ordered rule table over the lowercased evidence
// text: each rule names the category keywords, an optional refining
// keyword set, and the template it selects. First match wins, so the
// tie-break order is exactly the table order. When nothing matches, a
// per-method-kind fallback applies; when even that resolves to no
// known template, a basic expression is emitted — generation never
// fails on unknown evidence.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::infer::infer_predicate_type;
use crate::source::EvaluationMethod;
use crate::template::{self, TemplateLibrary};

/// Suffix on parameter-reference keys that carry a pre-quoted,
/// comma-joined value list for `in [...]` constructs.
pub const LIST_SUFFIX: &str = "-list";

/// The literal context reference an expression uses for a parameter.
pub fn context_reference(parameter_id: &str) -> String {
    format!("context[\"{parameter_id}\"]")
}

/// A generated verification expression and the predicate types it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedExpression {
    pub code: String,
    pub predicate_types: Vec<String>,
}

/// One selection rule: category keywords, refining keywords, template.
/// A rule matches when the text contains any category keyword and — if
/// the refine set is non-empty — any refining keyword.
struct SelectionRule {
    category: &'static [&'static str],
    refine: &'static [&'static str],
    template: &'static str,
}

/// Evaluated top-to-bottom; first match wins.
const SELECTION_RULES: &[SelectionRule] = &[
    SelectionRule {
        category: &["slsa", "provenance"],
        refine: &["builder"],
        template: "provenance-builder",
    },
    SelectionRule {
        category: &["slsa", "provenance"],
        refine: &["material"],
        template: "provenance-materials",
    },
    SelectionRule {
        category: &["slsa", "provenance"],
        refine: &["buildtype", "build type"],
        template: "provenance-buildtype",
    },
    SelectionRule {
        category: &["sbom", "software bill of materials"],
        refine: &["spdx"],
        template: "sbom-spdx",
    },
    SelectionRule {
        category: &["sbom", "software bill of materials"],
        refine: &["cyclonedx"],
        template: "sbom-cyclonedx",
    },
    SelectionRule {
        category: &["sbom", "software bill of materials"],
        refine: &[],
        template: "sbom-present",
    },
    SelectionRule {
        category: &["vulnerabilit", "cve"],
        refine: &["critical"],
        template: "vuln-no-critical",
    },
    SelectionRule {
        category: &["vulnerabilit", "cve"],
        refine: &["threshold"],
        template: "vuln-threshold",
    },
    SelectionRule {
        category: &["vulnerabilit", "cve"],
        refine: &["scanner"],
        template: "vuln-scanner",
    },
];

/// Select a template name from evidence text alone.
fn select_template(evidence: &str) -> Option<&'static str> {
    let lower = evidence.to_lowercase();
    SELECTION_RULES
        .iter()
        .find(|rule| {
            rule.category.iter().any(|k| lower.contains(k))
                && (rule.refine.is_empty() || rule.refine.iter().any(|k| lower.contains(k)))
        })
        .map(|rule| rule.template)
}

/// Generate a verification expression for one evaluation method.
///
/// `params` maps parameter ids to their context references, with
/// `<id>-list` entries holding pre-quoted value lists for multi-value
/// parameters. Errors only surface for malformed templates or missing
/// placeholder values — authoring bugs, not classification misses.
pub fn generate_expression(
    method: &EvaluationMethod,
    evidence: &str,
    params: &HashMap<String, String>,
    templates: &TemplateLibrary,
) -> Result<GeneratedExpression, CoreError> {
    let primary = infer_predicate_type(evidence);
    let predicate_types: Vec<String> = primary.map(|t| t.to_string()).into_iter().collect();

    let name = select_template(evidence).or_else(|| template::for_method_kind(&method.kind));

    if let Some(name) = name {
        if let Some(result) = templates.instantiate(name, params) {
            return Ok(GeneratedExpression {
                code: result?,
                predicate_types,
            });
        }
    }

    Ok(basic_expression(primary, evidence))
}

/// Fallback when no template applies: an equality check against the
/// inferred predicate type, or a syntactic no-op annotated with the
/// evidence text so the output is never empty but clearly needs manual
/// completion.
fn basic_expression(primary: Option<&str>, evidence: &str) -> GeneratedExpression {
    match primary {
        Some(predicate_type) => GeneratedExpression {
            code: format!("attestation.predicateType == \"{predicate_type}\""),
            predicate_types: vec![predicate_type.to_string()],
        },
        None => GeneratedExpression {
            code: format!("true /* TODO: implement verification logic based on: {evidence} */"),
            predicate_types: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::{INTOTO_STATEMENT_V01, SLSA_PROVENANCE_V1};

    fn method(kind: &str) -> EvaluationMethod {
        EvaluationMethod {
            kind: kind.to_string(),
            description: String::new(),
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn selection_order_is_stable() {
        let cases = [
            ("SLSA provenance with trusted builder", Some("provenance-builder")),
            ("Provenance listing all materials", Some("provenance-materials")),
            ("SLSA provenance with expected build type", Some("provenance-buildtype")),
            // Category keyword without a refining keyword falls through.
            ("SLSA provenance present", None),
            ("SBOM in SPDX format", Some("sbom-spdx")),
            ("CycloneDX SBOM attached", Some("sbom-cyclonedx")),
            ("Software bill of materials available", Some("sbom-present")),
            ("Vulnerability scan with no critical findings", Some("vuln-no-critical")),
            ("CVE count below threshold", Some("vuln-threshold")),
            ("Vulnerability report from approved scanner", Some("vuln-scanner")),
            ("internal spreadsheet review", None),
        ];
        for (evidence, expected) in cases {
            assert_eq!(select_template(evidence), expected, "{evidence}");
        }
    }

    #[test]
    fn builder_rule_wins_over_materials_rule() {
        // Both refining keywords present; the builder rule is first.
        assert_eq!(
            select_template("provenance with builder and material digests"),
            Some("provenance-builder")
        );
    }

    #[test]
    fn slsa_builder_scenario() {
        let templates = TemplateLibrary::builtin();
        let generated = generate_expression(
            &method("automated"),
            "SLSA provenance with trusted builder",
            &params(&[("builder-id", "context[\"builder-id\"]")]),
            &templates,
        )
        .unwrap();

        assert_eq!(generated.predicate_types, vec![SLSA_PROVENANCE_V1.to_string()]);
        assert!(generated.code.contains("attestation.predicateType == \"https://slsa.dev/provenance/v1\""));
        assert!(generated.code.contains("builder.id == context[\"builder-id\"]"));
    }

    #[test]
    fn vulnerability_scan_selects_no_critical() {
        let templates = TemplateLibrary::builtin();
        let generated = generate_expression(
            &method("automated"),
            "Vulnerability scan with no critical findings",
            &params(&[]),
            &templates,
        )
        .unwrap();

        assert_eq!(generated.predicate_types, vec![INTOTO_STATEMENT_V01.to_string()]);
        assert!(generated.code.contains("summary.critical == 0"));
    }

    #[test]
    fn unknown_evidence_yields_annotated_noop() {
        let templates = TemplateLibrary::builtin();
        let generated = generate_expression(
            &method("automated"),
            "internal spreadsheet review",
            &params(&[]),
            &templates,
        )
        .unwrap();

        assert!(generated.predicate_types.is_empty());
        assert!(generated.code.starts_with("true /*"));
        assert!(generated.code.contains("internal spreadsheet review"));
    }

    #[test]
    fn inferred_type_without_template_yields_equality_check() {
        let templates = TemplateLibrary::builtin();
        // "provenance present" infers SLSA but selects no template, and
        // the generic-automated override point is absent.
        let generated = generate_expression(
            &method("automated"),
            "Build provenance present",
            &params(&[]),
            &templates,
        )
        .unwrap();

        assert_eq!(
            generated.code,
            "attestation.predicateType == \"https://slsa.dev/provenance/v1\""
        );
        assert_eq!(generated.predicate_types, vec![SLSA_PROVENANCE_V1.to_string()]);
    }

    #[test]
    fn method_kind_override_is_honored() {
        let overrides = params(&[("generic-gate", "attestation.predicateType != \"\"")]);
        let templates = TemplateLibrary::builtin().with_overrides(&overrides);
        let generated = generate_expression(
            &method("gate"),
            "internal spreadsheet review",
            &params(&[]),
            &templates,
        )
        .unwrap();

        assert_eq!(generated.code, "attestation.predicateType != \"\"");
    }

    #[test]
    fn malformed_override_propagates_template_error() {
        let overrides = params(&[("generic-automated", "{{unfilled}} == 1")]);
        let templates = TemplateLibrary::builtin().with_overrides(&overrides);
        let err = generate_expression(
            &method("automated"),
            "internal spreadsheet review",
            &params(&[]),
            &templates,
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::Template { .. }));
    }

    #[test]
    fn context_reference_format() {
        assert_eq!(context_reference("builder-id"), "context[\"builder-id\"]");
    }
}
