// store.rs — PolicyStore: persistence for generated verification policies.
//
// Each policy is stored as a JSON file: `<workspace_dir>/<policy_id>.json`.
// The workspace is the merge anchor: on regeneration the stored copy is
// the "existing" side of the merge, so operator edits survive.
//
// Policy ids can contain characters that are hostile to filenames
// (path separators, drive colons); those are replaced with `-` so an id
// can never escape the workspace directory.

use std::fs;
use std::path::{Path, PathBuf};

use vp_core::VerificationPolicy;

use crate::error::StoreError;

/// Persistent store for verification policies, one JSON file per
/// policy id.
pub struct PolicyStore {
    workspace_dir: PathBuf,
}

impl PolicyStore {
    /// Open a store backed by the given directory, creating it if
    /// needed.
    pub fn new(workspace_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let workspace_dir = workspace_dir.as_ref().to_path_buf();
        fs::create_dir_all(&workspace_dir).map_err(|source| StoreError::Io {
            path: workspace_dir.display().to_string(),
            source,
        })?;
        Ok(Self { workspace_dir })
    }

    /// Path a policy id maps to inside the workspace.
    pub fn policy_path(&self, policy_id: &str) -> PathBuf {
        self.workspace_dir.join(format!("{}.json", sanitize(policy_id)))
    }

    /// Whether a stored copy exists for the given policy id.
    pub fn exists(&self, policy_id: &str) -> bool {
        self.policy_path(policy_id).exists()
    }

    /// Load a stored policy by id.
    pub fn load(&self, policy_id: &str) -> Result<VerificationPolicy, StoreError> {
        let path = self.policy_path(policy_id);
        if !path.exists() {
            return Err(StoreError::NotFound { path });
        }
        let json = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| StoreError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Save a policy to the workspace (creates or overwrites).
    pub fn save(&self, policy: &VerificationPolicy) -> Result<PathBuf, StoreError> {
        let path = self.policy_path(&policy.id);
        let json = serde_json::to_string_pretty(policy)?;
        fs::write(&path, json).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, perms).map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }

        tracing::debug!(policy = %policy.id, path = %path.display(), "stored policy");
        Ok(path)
    }
}

/// Replace filename-hostile characters in a policy id.
fn sanitize(policy_id: &str) -> String {
    policy_id
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            other => other,
        })
        .collect()
}
