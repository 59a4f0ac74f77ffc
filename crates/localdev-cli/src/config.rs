use serde::Deserialize;
use std::path::Path;

/// Project-level config file, looked for at the invocation root.
pub const CONFIG_FILE: &str = "config.project.toml";

/// `config.project.toml` contents. Loaded once per invocation and passed
/// down explicitly so commands stay reproducible in tests.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
	#[serde(default)]
	pub ai: AiConfig,
	#[serde(default)]
	pub integrity: IntegrityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
	#[serde(default = "default_remote_url")]
	pub remote_url: String,
	pub model: Option<String>,
	#[serde(default = "default_temperature")]
	pub temperature: f64,
}

impl Default for AiConfig {
	fn default() -> Self {
		Self {
			remote_url: default_remote_url(),
			model: None,
			temperature: default_temperature(),
		}
	}
}

fn default_remote_url() -> String {
	"http://127.0.0.1:8080/completion".to_string()
}
fn default_temperature() -> f64 {
	0.8
}

/// Rules for the `check` command's folder-integrity pass.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct IntegrityConfig {
	#[serde(default)]
	pub require_dirs: Vec<String>,
	#[serde(default)]
	pub require_files: Vec<String>,
	#[serde(default)]
	pub forbid_files: Vec<String>,
	#[serde(default)]
	pub ignore_dirs: Vec<String>,
	#[serde(default)]
	pub enforce_flat_src: bool,
}

pub fn config_path(project_root: &Path) -> std::path::PathBuf {
	project_root.join(CONFIG_FILE)
}

/// Load `config.project.toml`, falling back to defaults when absent or
/// unparseable. Commands that require the file to exist check separately.
pub fn load_project_config(project_root: &Path) -> ProjectConfig {
	let path = config_path(project_root);
	if path.exists() {
		match std::fs::read_to_string(&path) {
			Ok(content) => match toml::from_str(&content) {
				Ok(config) => return config,
				Err(e) => tracing::warn!("failed to parse {}: {}", path.display(), e),
			},
			Err(e) => tracing::warn!("failed to read {}: {}", path.display(), e),
		}
	}
	ProjectConfig::default()
}
