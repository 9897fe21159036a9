use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use super::model::Snapshot;

pub fn parse_snapshot(raw: &str) -> Result<Snapshot> {
    let mut snapshot: Snapshot =
        serde_json::from_str(raw).context("invalid snapshot JSON")?;

    if let Some(position) = snapshot.nodes.iter().position(|node| node.id.is_empty()) {
        return Err(anyhow!("snapshot node #{position} has an empty id"));
    }
    if let Some(position) = snapshot
        .links
        .iter()
        .position(|link| link.source.is_empty() || link.target.is_empty())
    {
        return Err(anyhow!("snapshot link #{position} has an empty endpoint"));
    }

    let mut seen = HashSet::with_capacity(snapshot.nodes.len());
    snapshot.nodes.retain(|node| seen.insert(node.id.clone()));

    Ok(snapshot)
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot file {}", path.display()))?;
    parse_snapshot(&raw)
        .with_context(|| format!("failed to parse snapshot from {}", path.display()))
}
