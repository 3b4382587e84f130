// mapper.rs — The structural mapper.
//
// Walks a governance policy's assessment plans and assembles the
// verification policy: metadata, the parameter context table, and one
// tenet per automatable evaluation method. Expressions come from the
// generator, subject filters from the scope compiler, and titles and
// control references from the catalog when one is supplied.
//
// Tenet identifiers are `{requirement-id}-{plan-id}-{ordinal}` where
// the ordinal counts only automatable methods — a skipped manual method
// does not reserve an index, so ids stay dense and regeneration after
// removing a manual method does not shift them.

use std::collections::{HashMap, HashSet};

use crate::catalog::{lookup_requirement, CatalogEnrichment};
use crate::error::CoreError;
use crate::generate::{context_reference, generate_expression, LIST_SUFFIX};
use crate::ordered::OrderedMap;
use crate::policy::{
    AssertMode, ContextVal, Meta, PolicyRef, PolicySet, PolicySource, PredicateSpec, SetMeta,
    Tenet, VerificationPolicy, EXPRESSION_RUNTIME,
};
use crate::scope::scope_filter;
use crate::source::{AssessmentPlan, Catalog, EvaluationMethod, GovernancePolicy};
use crate::template::TemplateLibrary;

/// Evaluation-method kinds that can be automated. Exact match; anything
/// else (notably "manual") is skipped without consuming an ordinal.
pub const AUTOMATABLE_METHOD_KINDS: &[&str] =
    &["automated", "gate", "behavioral", "autoremediation"];

/// Default policy rule; "all" combines tenets with AND.
pub const DEFAULT_RULE: &str = "all(tenets)";

const MAX_TITLE_LEN: usize = 80;

/// Options for one governance-policy transformation.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Catalog used to enrich tenet titles and control references.
    pub catalog: Option<Catalog>,

    /// Template overrides merged on top of the built-in catalog.
    pub templates: HashMap<String, String>,

    /// Prefix tenet expressions with a scope-derived subject filter.
    pub scope_filters: bool,

    /// Overall policy rule; "any(...)" yields OR assertion, everything
    /// else AND.
    pub rule: String,

    /// Optional enforcement mode stamped into the metadata.
    pub enforce: Option<String>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            catalog: None,
            templates: HashMap::new(),
            scope_filters: false,
            rule: DEFAULT_RULE.to_string(),
            enforce: None,
        }
    }
}

/// Options for policy-set output.
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// Set identifier; defaults to `<policy-id>-set` for import mapping.
    pub name: String,

    pub description: String,

    pub version: String,

    /// Applied to each inlined policy.
    pub transform: TransformOptions,
}

/// Best-effort major version: the first dot-delimited segment parsed as
/// an integer. Deliberately lossy and one-way — minor and patch
/// components are discarded, and non-numeric or empty segments yield 0.
pub fn best_effort_major_version(version: &str) -> i64 {
    version
        .split('.')
        .next()
        .and_then(|segment| segment.parse().ok())
        .unwrap_or(0)
}

fn is_automatable(kind: &str) -> bool {
    AUTOMATABLE_METHOD_KINDS.contains(&kind)
}

fn assert_mode_for_rule(rule: &str) -> AssertMode {
    if rule.contains("any") {
        AssertMode::Or
    } else {
        AssertMode::And
    }
}

/// Transform a governance policy into a verification policy.
pub fn map_policy(
    source: &GovernancePolicy,
    options: &TransformOptions,
) -> Result<VerificationPolicy, CoreError> {
    let templates = TemplateLibrary::builtin().with_overrides(&options.templates);

    let mut tenets = Vec::new();
    let mut controls: Vec<crate::policy::ControlRef> = Vec::new();
    let mut seen_controls: HashSet<String> = HashSet::new();

    for plan in &source.plans {
        let enrichment = options
            .catalog
            .as_ref()
            .and_then(|catalog| lookup_requirement(catalog, &plan.requirement_id));

        if let Some(enrichment) = &enrichment {
            // One de-duplicated control reference per resolved control,
            // in encounter order.
            if seen_controls.insert(enrichment.control.id.clone()) {
                controls.push(enrichment.control_ref());
            }
        }

        plan_tenets(plan, source, enrichment.as_ref(), options, &templates, &mut tenets)?;
    }

    let policy = VerificationPolicy {
        id: source.id.clone(),
        meta: Meta {
            runtime: EXPRESSION_RUNTIME.to_string(),
            description: source.description.clone(),
            version: best_effort_major_version(&source.version),
            assert_mode: assert_mode_for_rule(&options.rule),
            enforce: options.enforce.clone(),
            controls: (!controls.is_empty()).then_some(controls),
        },
        context: build_context(&source.plans),
        tenets,
    };

    policy
        .validate()
        .map_err(|e| CoreError::mapping(format!("policy '{}'", source.id), e))?;

    tracing::debug!(
        policy = %policy.id,
        tenets = policy.tenets.len(),
        context = policy.context.len(),
        "generated verification policy"
    );
    Ok(policy)
}

/// Append one tenet per automatable method of the plan.
fn plan_tenets(
    plan: &AssessmentPlan,
    source: &GovernancePolicy,
    enrichment: Option<&CatalogEnrichment<'_>>,
    options: &TransformOptions,
    templates: &TemplateLibrary,
    tenets: &mut Vec<Tenet>,
) -> Result<(), CoreError> {
    let params = plan_params(plan);
    let mut ordinal = 0;

    for method in &plan.methods {
        if !is_automatable(&method.kind) {
            continue;
        }

        let generated = generate_expression(method, &plan.evidence, &params, templates)
            .map_err(|e| {
                CoreError::mapping(
                    format!("plan '{}' (requirement '{}')", plan.id, plan.requirement_id),
                    e,
                )
            })?;

        let mut code = generated.code;
        if options.scope_filters {
            let filter = scope_filter(&source.scope);
            if !filter.is_empty() {
                code = format!("({filter}) && ({code})");
            }
        }

        tenets.push(Tenet {
            id: format!("{}-{}-{}", plan.requirement_id, plan.id, ordinal),
            title: tenet_title(method, enrichment, &plan.evidence),
            runtime: EXPRESSION_RUNTIME.to_string(),
            code,
            predicates: (!generated.predicate_types.is_empty()).then(|| PredicateSpec {
                types: generated.predicate_types,
                limit: None,
            }),
            outputs: None,
        });
        ordinal += 1;
    }

    Ok(())
}

/// Parameter references handed to the generator: every parameter id
/// maps to its context reference, and multi-value parameters add a
/// `<id>-list` entry with the accepted values quoted and comma-joined.
fn plan_params(plan: &AssessmentPlan) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for parameter in &plan.parameters {
        params.insert(parameter.id.clone(), context_reference(&parameter.id));
        if parameter.accepted_values.len() > 1 {
            let quoted: Vec<String> = parameter
                .accepted_values
                .iter()
                .map(|v| format!("\"{v}\""))
                .collect();
            params.insert(format!("{}{}", parameter.id, LIST_SUFFIX), quoted.join(", "));
        }
    }
    params
}

/// Context table: the union of distinct parameter ids across every
/// plan, in first-occurrence order. A parameter with accepted values
/// defaults to the first one; one without is required at runtime.
fn build_context(plans: &[AssessmentPlan]) -> OrderedMap<ContextVal> {
    let mut context = OrderedMap::new();
    for plan in plans {
        for parameter in &plan.parameters {
            if context.contains_key(&parameter.id) {
                // First occurrence wins, including its description.
                continue;
            }
            let first = parameter.accepted_values.first().cloned();
            context.insert(
                parameter.id.clone(),
                ContextVal {
                    value_type: "string".to_string(),
                    required: first.is_none(),
                    default: first.clone(),
                    value: first,
                    description: (!parameter.description.is_empty())
                        .then(|| parameter.description.clone()),
                },
            );
        }
    }
    context
}

/// Tenet title preference: method description, catalog requirement
/// text, truncated evidence, and finally "<kind> verification".
fn tenet_title(
    method: &EvaluationMethod,
    enrichment: Option<&CatalogEnrichment<'_>>,
    evidence: &str,
) -> String {
    if !method.description.is_empty() {
        return method.description.clone();
    }
    if let Some(title) = enrichment.and_then(|e| e.title()) {
        return title.to_string();
    }
    let evidence = evidence.trim();
    if !evidence.is_empty() {
        return truncate_title(evidence);
    }
    format!("{} verification", method.kind)
}

fn truncate_title(text: &str) -> String {
    if text.chars().count() <= MAX_TITLE_LEN {
        return text.to_string();
    }
    let head: String = text.chars().take(MAX_TITLE_LEN - 3).collect();
    format!("{head}...")
}

/// Transform several governance policies into one set of inline policies.
pub fn map_policy_set(
    sources: &[GovernancePolicy],
    options: &SetOptions,
) -> Result<PolicySet, CoreError> {
    if sources.is_empty() {
        return Err(CoreError::Validation {
            field: "policies".to_string(),
            reason: "at least one policy is required".to_string(),
        });
    }

    let mut policies = Vec::with_capacity(sources.len());
    for source in sources {
        let policy = map_policy(source, &options.transform)?;
        policies.push(inline_ref(policy));
    }

    let set = PolicySet {
        id: options.name.clone(),
        meta: SetMeta {
            description: options.description.clone(),
            version: options.version.clone(),
        },
        policies,
    };
    set.validate()?;
    Ok(set)
}

/// Transform one governance policy and its imports into a set: the
/// main policy inlined, imports as external references.
pub fn map_policy_with_imports(
    source: &GovernancePolicy,
    options: &SetOptions,
) -> Result<PolicySet, CoreError> {
    let id = if options.name.is_empty() {
        format!("{}-set", source.id)
    } else {
        options.name.clone()
    };
    let description = if options.description.is_empty() {
        source.description.clone()
    } else {
        options.description.clone()
    };
    let version = if options.version.is_empty() {
        source.version.clone()
    } else {
        options.version.clone()
    };

    let main = map_policy(source, &options.transform)?;
    let mut policies = vec![inline_ref(main)];

    for import in &source.imports {
        policies.push(PolicyRef {
            id: reference_id(import),
            meta: None,
            context: OrderedMap::new(),
            tenets: Vec::new(),
            source: Some(PolicySource {
                uri: import.clone(),
            }),
        });
    }

    let set = PolicySet {
        id,
        meta: SetMeta {
            description,
            version,
        },
        policies,
    };
    set.validate()?;
    Ok(set)
}

fn inline_ref(policy: VerificationPolicy) -> PolicyRef {
    PolicyRef {
        id: policy.id,
        meta: Some(policy.meta),
        context: policy.context,
        tenets: policy.tenets,
        source: None,
    }
}

/// Derive a reference id from an import string. For references like
/// `git+https://host/repo#path/to/policy.json` the fragment's filename
/// minus extension is used; references without a fragment are used
/// whole.
pub fn reference_id(reference: &str) -> String {
    match reference.rsplit_once('#') {
        Some((_, fragment)) => {
            let base = fragment.rsplit('/').next().unwrap_or(fragment);
            match base.rfind('.') {
                Some(dot) if dot > 0 => base[..dot].to_string(),
                _ => base.to_string(),
            }
        }
        None => reference.to_string(),
    }
}
