use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directory holding all scaffolded services.
pub const WORKSPACE_DIR: &str = "workspace";
/// Registry of services inside the workspace.
pub const INDEX_FILE: &str = "index.toml";

/// `workspace/index.toml`: one `[services.<name>]` table per service.
/// BTreeMap keeps registry order stable across regenerations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceIndex {
	#[serde(default)]
	pub services: BTreeMap<String, IndexEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexEntry {
	pub path: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub port: Option<u16>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub language: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub entrypoint: Option<String>,
}

pub fn workspace_dir(project_root: &Path) -> PathBuf {
	project_root.join(WORKSPACE_DIR)
}

pub fn index_path(project_root: &Path) -> PathBuf {
	workspace_dir(project_root).join(INDEX_FILE)
}

pub fn load_index(project_root: &Path) -> Option<WorkspaceIndex> {
	let path = index_path(project_root);
	let content = std::fs::read_to_string(&path).ok()?;
	match toml::from_str(&content) {
		Ok(index) => Some(index),
		Err(e) => {
			tracing::warn!("failed to parse {}: {}", path.display(), e);
			None
		}
	}
}

pub fn save_index(project_root: &Path, index: &WorkspaceIndex) -> std::io::Result<()> {
	let content = toml::to_string_pretty(index)
		.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
	std::fs::create_dir_all(workspace_dir(project_root))?;
	std::fs::write(index_path(project_root), content)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn index_roundtrip() {
		let root = std::env::temp_dir().join("localdev-cli-test-index-roundtrip");
		let _ = std::fs::remove_dir_all(&root);
		std::fs::create_dir_all(&root).unwrap();

		let mut index = WorkspaceIndex::default();
		index.services.insert(
			"gateway".to_string(),
			IndexEntry {
				path: "workspace/gateway".to_string(),
				port: Some(3001),
				language: Some("node".to_string()),
				entrypoint: Some("src/app.js".to_string()),
			},
		);

		save_index(&root, &index).unwrap();
		let loaded = load_index(&root).unwrap();
		assert_eq!(loaded.services.len(), 1);
		assert_eq!(loaded.services["gateway"].port, Some(3001));

		let _ = std::fs::remove_dir_all(&root);
	}
}
