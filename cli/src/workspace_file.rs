//! JSON workspace file
//!
//! The binary runs against a [`SimulatedPlatform`] whose single workspace is
//! loaded from, and written back to, a JSON file.

use anyhow::{Context, Result};
use clanforge_graph::{SimulatedPlatform, SimulatedWorkspace, WorkspaceId};
use std::path::Path;

/// Load the workspace in `path`, or seed an empty one with `fallback_id`
pub(crate) fn load(path: &Path, fallback_id: WorkspaceId) -> Result<(SimulatedPlatform, WorkspaceId)> {
    if !path.exists() {
        tracing::info!(path = %path.display(), workspace = %fallback_id, "workspace file missing, starting empty");
        let sim = SimulatedPlatform::new();
        sim.seed_workspace(fallback_id);
        return Ok((sim, fallback_id));
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let state: SimulatedWorkspace = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a workspace file", path.display()))?;
    let workspace = state.workspace_id;
    Ok((SimulatedPlatform::from_workspace(state), workspace))
}

/// Write the workspace back through a temp file and rename
pub(crate) fn save(path: &Path, sim: &SimulatedPlatform, workspace: WorkspaceId) -> Result<()> {
    let state = sim
        .export(workspace)
        .with_context(|| format!("workspace {workspace} vanished"))?;
    let json = serde_json::to_string_pretty(&state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("failed to replace {}", path.display()))?;
    tracing::debug!(path = %path.display(), "workspace saved");
    Ok(())
}
