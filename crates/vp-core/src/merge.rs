// merge.rs — Reconciliation of regenerated policies with edited ones.
//
// Regeneration would otherwise clobber hand-tuned verification code.
// The merge keeps the operator's expression and outputs for any tenet
// that survives in the regenerated policy, takes everything else from
// the regenerated side, and drops tenets whose source requirement is
// gone. Metadata and the context table always come from the generated
// policy.

use std::collections::{HashMap, HashSet};

use crate::error::CoreError;
use crate::policy::{MergeStats, Tenet, VerificationPolicy};

/// Merge a freshly generated policy with an existing, possibly edited
/// one. Returns the merged policy and the reconciliation counts.
pub fn merge_policies(
    existing: &VerificationPolicy,
    generated: &VerificationPolicy,
) -> Result<(VerificationPolicy, MergeStats), CoreError> {
    let existing_by_id: HashMap<&str, &Tenet> = existing
        .tenets
        .iter()
        .map(|tenet| (tenet.id.as_str(), tenet))
        .collect();
    let generated_ids: HashSet<&str> = generated
        .tenets
        .iter()
        .map(|tenet| tenet.id.as_str())
        .collect();

    let mut stats = MergeStats::default();
    let mut tenets = Vec::with_capacity(generated.tenets.len());

    // Generated order is authoritative.
    for tenet in &generated.tenets {
        match existing_by_id.get(tenet.id.as_str()) {
            Some(edited) => {
                tenets.push(Tenet {
                    code: edited.code.clone(),
                    outputs: edited.outputs.clone(),
                    ..tenet.clone()
                });
                stats.preserved += 1;
            }
            None => {
                tenets.push(tenet.clone());
                stats.added += 1;
            }
        }
    }

    stats.removed = existing
        .tenets
        .iter()
        .filter(|tenet| !generated_ids.contains(tenet.id.as_str()))
        .count();

    let merged = VerificationPolicy {
        id: generated.id.clone(),
        meta: generated.meta.clone(),
        context: generated.context.clone(),
        tenets,
    };

    merged
        .validate()
        .map_err(|e| CoreError::MergeValidation {
            source: Box::new(e),
        })?;

    tracing::debug!(
        policy = %merged.id,
        preserved = stats.preserved,
        added = stats.added,
        removed = stats.removed,
        "merged verification policy"
    );
    Ok((merged, stats))
}
