// template.rs — The expression template catalog.
//
// Templates are parameterized verification expressions with `{{name}}`
// placeholders — plain named substitution, no control flow. The
// built-in set is a fixed, closed catalog; callers may override or
// extend it but never swap it out wholesale.
//
// Placeholder names are parameter ids, so substituted values are
// usually `context["<id>"]` references and the templates leave them
// unquoted. List placeholders (`<id>-list`) receive pre-quoted,
// comma-joined literals suitable inside an `in [...]` construct.

use std::collections::HashMap;

use crate::error::CoreError;

/// Built-in template catalog. Names are stable: selection rules,
/// documentation, and caller overrides refer to them.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    // SLSA provenance verification
    (
        "provenance-builder",
        r#"attestation.predicateType == "https://slsa.dev/provenance/v1" && attestation.predicate.builder.id == {{builder-id}}"#,
    ),
    (
        "provenance-builder-in",
        r#"attestation.predicateType == "https://slsa.dev/provenance/v1" && attestation.predicate.builder.id in [{{builder-id-list}}]"#,
    ),
    (
        "provenance-materials",
        r#"attestation.predicateType == "https://slsa.dev/provenance/v1" && all(attestation.predicate.materials, m, m.digest.sha256 != "")"#,
    ),
    (
        "provenance-buildtype",
        r#"attestation.predicateType == "https://slsa.dev/provenance/v1" && attestation.predicate.buildType == {{build-type}}"#,
    ),
    // SBOM verification
    (
        "sbom-present",
        r#"attestation.predicateType == "https://spdx.dev/Document" || attestation.predicateType == "https://cyclonedx.org/bom""#,
    ),
    (
        "sbom-spdx",
        r#"attestation.predicateType == "https://spdx.dev/Document""#,
    ),
    (
        "sbom-cyclonedx",
        r#"attestation.predicateType == "https://cyclonedx.org/bom""#,
    ),
    // Vulnerability scan verification
    (
        "vuln-no-critical",
        r#"attestation.predicateType == "https://in-toto.io/Statement/v0.1" && attestation.predicate.scanner.result.summary.critical == 0"#,
    ),
    (
        "vuln-threshold",
        r#"attestation.predicateType == "https://in-toto.io/Statement/v0.1" && attestation.predicate.scanner.result.summary.critical == 0 && attestation.predicate.scanner.result.summary.high < {{max-high}}"#,
    ),
    (
        "vuln-scanner",
        r#"attestation.predicateType == "https://in-toto.io/Statement/v0.1" && attestation.predicate.scanner.vendor == {{scanner}}"#,
    ),
];

/// Generic per-method-kind template names the selection falls back to
/// when no evidence keyword matches. These are deliberately not in the
/// built-in catalog: unless a caller supplies them via overrides, the
/// generator emits its basic fallback expression instead of a template
/// whose placeholders the plan cannot fill.
const METHOD_KIND_TEMPLATES: &[(&str, &str)] = &[
    ("automated", "generic-automated"),
    ("gate", "generic-gate"),
    ("behavioral", "generic-behavioral"),
    ("autoremediation", "generic-autoremediation"),
];

/// Template name for an evaluation-method kind, if the kind has one.
pub fn for_method_kind(kind: &str) -> Option<&'static str> {
    METHOD_KIND_TEMPLATES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, name)| *name)
}

/// An immutable template set: the built-in catalog plus caller overrides.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: HashMap<String, String>,
}

impl TemplateLibrary {
    /// The built-in catalog alone.
    pub fn builtin() -> Self {
        Self {
            templates: BUILTIN_TEMPLATES
                .iter()
                .map(|(name, body)| (name.to_string(), body.to_string()))
                .collect(),
        }
    }

    /// Merge caller templates on top of the built-ins. Same-name
    /// entries replace the built-in; everything else is added.
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Self {
        for (name, body) in overrides {
            self.templates.insert(name.clone(), body.clone());
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Instantiate a template by name. Returns `None` when the name is
    /// unknown (the caller decides how to fall back) and an error when
    /// the template exists but is malformed or a placeholder has no
    /// value.
    pub fn instantiate(
        &self,
        name: &str,
        params: &HashMap<String, String>,
    ) -> Option<Result<String, CoreError>> {
        self.get(name).map(|body| substitute(name, body, params))
    }
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Replace every `{{name}}` placeholder in `template` with the value
/// from `params` and trim surrounding whitespace.
fn substitute(
    name: &str,
    template: &str,
    params: &HashMap<String, String>,
) -> Result<String, CoreError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| CoreError::Template {
            name: name.to_string(),
            reason: "unterminated placeholder".to_string(),
        })?;
        let key = after[..end].trim();
        if key.is_empty() {
            return Err(CoreError::Template {
                name: name.to_string(),
                reason: "empty placeholder".to_string(),
            });
        }
        let value = params.get(key).ok_or_else(|| CoreError::Template {
            name: name.to_string(),
            reason: format!("no value for placeholder '{key}'"),
        })?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    Ok(out.trim().to_string())
}
