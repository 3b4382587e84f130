// convert.rs — Compile a governance policy into a verification policy.
//
// Reads the source document (YAML or JSON), runs the mapper, and writes
// the resulting policy as pretty-printed JSON. With a workspace, the
// stored copy of the same policy id becomes the "existing" side of a
// merge so operator edits survive regeneration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use vp_core::infer::infer_policy_requirements;
use vp_core::{
    map_policy, map_policy_with_imports, merge_policies, Catalog, GovernancePolicy, SetOptions,
    TransformOptions,
};
use vp_workspace::PolicyStore;

#[derive(Args)]
pub struct ConvertArgs {
    /// Governance policy document (YAML or JSON).
    pub policy: PathBuf,

    /// Output file (defaults to the input filename with a .json extension).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Workspace directory; enables merging with previously generated policies.
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Overwrite the stored policy instead of merging with it.
    #[arg(long)]
    pub force_overwrite: bool,

    /// Control catalog used to enrich titles and control references.
    #[arg(short, long)]
    pub catalog: Option<PathBuf>,

    /// Prefix tenet expressions with subject filters derived from the policy scope.
    #[arg(long)]
    pub scope_filters: bool,

    /// Policy assertion rule; "any(tenets)" asserts with OR instead of AND.
    #[arg(long, default_value = vp_core::mapper::DEFAULT_RULE)]
    pub rule: String,

    /// Enforcement mode stamped into the policy metadata.
    #[arg(long)]
    pub enforce: Option<String>,

    /// Emit a policy set (the policy inlined plus its imports as references).
    #[arg(long)]
    pub policy_set: bool,

    /// Policy set identifier (defaults to "<policy-id>-set").
    #[arg(long, default_value = "")]
    pub set_name: String,

    /// Policy set description (defaults to the policy description).
    #[arg(long, default_value = "")]
    pub set_description: String,

    /// Policy set version (defaults to the policy version).
    #[arg(long, default_value = "")]
    pub set_version: String,
}

pub fn execute(args: &ConvertArgs) -> anyhow::Result<()> {
    let source: GovernancePolicy = read_document(&args.policy)
        .with_context(|| format!("reading governance policy {}", args.policy.display()))?;
    tracing::debug!(policy = %source.id, plans = source.plans.len(), "loaded governance policy");

    let mut options = TransformOptions {
        scope_filters: args.scope_filters,
        rule: args.rule.clone(),
        enforce: args.enforce.clone(),
        ..Default::default()
    };
    if let Some(path) = &args.catalog {
        let catalog: Catalog = read_document(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        options.catalog = Some(catalog);
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.policy));

    if args.policy_set {
        let set = map_policy_with_imports(
            &source,
            &SetOptions {
                name: args.set_name.clone(),
                description: args.set_description.clone(),
                version: args.set_version.clone(),
                transform: options,
            },
        )
        .context("generating policy set")?;
        write_json(&output, &set)?;
        println!(
            "Wrote policy set '{}' ({} policies) to {}",
            set.id,
            set.policies.len(),
            output.display()
        );
        return Ok(());
    }

    let generated = map_policy(&source, &options).context("generating verification policy")?;

    let required = infer_policy_requirements(&source).all_types();
    if !required.is_empty() {
        println!("Required attestation types: {}", required.join(", "));
    }

    let policy = match &args.workspace {
        Some(dir) => {
            let store = PolicyStore::new(dir)
                .with_context(|| format!("opening workspace {}", dir.display()))?;

            let merged = if store.exists(&generated.id) && !args.force_overwrite {
                let existing = store.load(&generated.id)?;
                let (merged, stats) = merge_policies(&existing, &generated)
                    .context("merging with stored policy")?;
                println!(
                    "Merged with stored policy: {} preserved, {} added, {} removed",
                    stats.preserved, stats.added, stats.removed
                );
                merged
            } else {
                generated
            };

            store.save(&merged)?;
            merged
        }
        None => generated,
    };

    write_json(&output, &policy)?;
    println!(
        "Wrote policy '{}' ({} tenets) to {}",
        policy.id,
        policy.tenets.len(),
        output.display()
    );
    Ok(())
}

/// Parse a document as JSON or YAML based on its extension; YAML being
/// a JSON superset, unknown extensions go through the YAML parser.
fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&text)?)
    } else {
        Ok(serde_yaml::from_str(&text)?)
    }
}

fn default_output(input: &Path) -> PathBuf {
    input.with_extension("json")
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY_YAML: &str = r#"
id: policy-001
description: Build provenance policy
version: "1.0.0"
plans:
  - id: plan-01
    requirement_id: REQ-01
    evidence: SLSA provenance with trusted builder
    parameters:
      - id: builder-id
        accepted_values:
          - https://builder.example/v1
    methods:
      - type: automated
        description: Verify provenance
"#;

    fn write_policy(dir: &Path) -> PathBuf {
        let path = dir.join("policy.yaml");
        fs::write(&path, POLICY_YAML).unwrap();
        path
    }

    fn base_args(policy: PathBuf, output: PathBuf) -> ConvertArgs {
        ConvertArgs {
            policy,
            output: Some(output),
            workspace: None,
            force_overwrite: false,
            catalog: None,
            scope_filters: false,
            rule: vp_core::mapper::DEFAULT_RULE.to_string(),
            enforce: None,
            policy_set: false,
            set_name: String::new(),
            set_description: String::new(),
            set_version: String::new(),
        }
    }

    #[test]
    fn converts_yaml_policy_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let policy = write_policy(dir.path());
        let output = dir.path().join("out.json");

        execute(&base_args(policy, output.clone())).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["id"], "policy-001");
        assert_eq!(written["tenets"][0]["id"], "REQ-01-plan-01-0");
    }

    #[test]
    fn workspace_merge_preserves_edits_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let policy = write_policy(dir.path());
        let output = dir.path().join("out.json");
        let workspace = dir.path().join("workspace");

        let mut args = base_args(policy, output);
        args.workspace = Some(workspace.clone());
        execute(&args).unwrap();

        // Hand-edit the stored tenet code.
        let stored_path = workspace.join("policy-001.json");
        let mut stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&stored_path).unwrap()).unwrap();
        stored["tenets"][0]["code"] = "custom_check == true".into();
        fs::write(&stored_path, serde_json::to_string(&stored).unwrap()).unwrap();

        execute(&args).unwrap();
        let merged: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&stored_path).unwrap()).unwrap();
        assert_eq!(merged["tenets"][0]["code"], "custom_check == true");
    }

    #[test]
    fn force_overwrite_discards_stored_edits() {
        let dir = tempfile::tempdir().unwrap();
        let policy = write_policy(dir.path());
        let output = dir.path().join("out.json");
        let workspace = dir.path().join("workspace");

        let mut args = base_args(policy, output);
        args.workspace = Some(workspace.clone());
        execute(&args).unwrap();

        let stored_path = workspace.join("policy-001.json");
        let mut stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&stored_path).unwrap()).unwrap();
        stored["tenets"][0]["code"] = "custom_check == true".into();
        fs::write(&stored_path, serde_json::to_string(&stored).unwrap()).unwrap();

        args.force_overwrite = true;
        execute(&args).unwrap();
        let overwritten: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&stored_path).unwrap()).unwrap();
        assert_ne!(overwritten["tenets"][0]["code"], "custom_check == true");
    }

    #[test]
    fn policy_set_output_inlines_main_policy() {
        let dir = tempfile::tempdir().unwrap();
        let policy = write_policy(dir.path());
        let output = dir.path().join("set.json");

        let mut args = base_args(policy, output.clone());
        args.policy_set = true;
        execute(&args).unwrap();

        let set: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(set["id"], "policy-001-set");
        assert_eq!(set["policies"][0]["id"], "policy-001");
    }

    #[test]
    fn default_output_swaps_extension() {
        assert_eq!(
            default_output(Path::new("dir/policy.yaml")),
            Path::new("dir/policy.json")
        );
        assert_eq!(
            default_output(Path::new("policy")),
            Path::new("policy.json")
        );
    }
}
