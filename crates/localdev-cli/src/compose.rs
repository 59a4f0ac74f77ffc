use serde_yaml::{Mapping, Value};
use std::path::Path;

use localdev_run::locate;

use crate::workspace;

pub const COMPOSE_FILE: &str = "docker-compose.yml";

const DEFAULT_IMAGE: &str = "node:20-alpine";
const DEFAULT_PORT: u16 = 3000;
const COMPOSE_VERSION: &str = "3.9";
const NETWORK_NAME: &str = "localdev-net";

/// Generate or update `docker-compose.yml` from `workspace/index.toml`.
///
/// With `force` the file is overwritten; otherwise the generated service and
/// network blocks are merged into the existing document, preserving unknown
/// top-level keys. Re-running with unchanged inputs and `force = false`
/// produces byte-identical output.
///
/// Returns 0 on success, 1 on skip (fewer than two services), 2 on error.
pub fn generate(project_root: &Path, force: bool) -> i32 {
	let index_path = workspace::index_path(project_root);
	if !index_path.exists() {
		eprintln!("[ERROR] {} not found.", index_path.display());
		return 2;
	}
	let Some(index) = workspace::load_index(project_root) else {
		return 2;
	};

	if index.services.len() < 2 {
		eprintln!("[INFO] Only one service found, skipping docker-compose generation.");
		return 1;
	}

	let generated = build_compose(project_root, &index);
	let compose_path = project_root.join(COMPOSE_FILE);

	let document = if compose_path.exists() && !force {
		let existing = match std::fs::read_to_string(&compose_path) {
			Ok(c) => c,
			Err(e) => {
				eprintln!("[ERROR] failed to read {}: {}", compose_path.display(), e);
				return 2;
			}
		};
		match serde_yaml::from_str::<Value>(&existing) {
			Ok(value) => merge_compose(value, &generated),
			Err(e) => {
				eprintln!("[ERROR] failed to parse {}: {}", compose_path.display(), e);
				return 2;
			}
		}
	} else {
		Value::Mapping(generated)
	};

	let rendered = match serde_yaml::to_string(&document) {
		Ok(s) => s,
		Err(e) => {
			eprintln!("[ERROR] failed to render compose file: {}", e);
			return 2;
		}
	};
	if let Err(e) = std::fs::write(&compose_path, rendered) {
		eprintln!("[ERROR] failed to write {}: {}", compose_path.display(), e);
		return 2;
	}

	eprintln!(
		"[INFO] {} generated with {} services.",
		COMPOSE_FILE,
		index.services.len()
	);
	0
}

/// Run `docker compose up`, streaming output, and return its exit code.
pub fn up() -> i32 {
	match std::process::Command::new("docker")
		.args(["compose", "up"])
		.status()
	{
		Ok(status) => status.code().unwrap_or(1),
		Err(e) => {
			eprintln!("[ERROR] docker compose up failed: {}", e);
			1
		}
	}
}

// --- Document construction ---

fn build_compose(project_root: &Path, index: &workspace::WorkspaceIndex) -> Mapping {
	let mut services = Mapping::new();
	for (name, entry) in &index.services {
		let dir = project_root.join(&entry.path);
		let port = locate::load_service_meta(&dir)
			.and_then(|m| m.port)
			.or(entry.port)
			.unwrap_or(DEFAULT_PORT);
		let has_dockerfile = dir.join("Dockerfile").is_file();

		let mut block = Mapping::new();
		if has_dockerfile {
			block.insert(yaml_str("build"), yaml_str(&entry.path));
		} else {
			block.insert(yaml_str("image"), yaml_str(DEFAULT_IMAGE));
		}
		block.insert(
			yaml_str("ports"),
			Value::Sequence(vec![yaml_string(format!("{}:{}", port, port))]),
		);
		block.insert(
			yaml_str("environment"),
			Value::Sequence(vec![yaml_string(format!("PORT={}", port))]),
		);
		block.insert(yaml_str("restart"), yaml_str("unless-stopped"));
		block.insert(
			yaml_str("networks"),
			Value::Sequence(vec![yaml_str(NETWORK_NAME)]),
		);
		services.insert(yaml_str(name), Value::Mapping(block));
	}

	let mut network = Mapping::new();
	network.insert(yaml_str("driver"), yaml_str("bridge"));
	let mut networks = Mapping::new();
	networks.insert(yaml_str(NETWORK_NAME), Value::Mapping(network));

	let mut compose = Mapping::new();
	compose.insert(yaml_str("version"), yaml_str(COMPOSE_VERSION));
	compose.insert(yaml_str("services"), Value::Mapping(services));
	compose.insert(yaml_str("networks"), Value::Mapping(networks));
	compose
}

/// Replace the managed top-level keys in an existing document, keeping
/// everything else (volumes, x- extensions, ...) untouched.
fn merge_compose(existing: Value, generated: &Mapping) -> Value {
	let mut merged = match existing {
		Value::Mapping(m) => m,
		_ => Mapping::new(),
	};
	for key in ["version", "services", "networks"] {
		if let Some(value) = generated.get(&yaml_str(key)) {
			merged.insert(yaml_str(key), value.clone());
		}
	}
	Value::Mapping(merged)
}

fn yaml_str(s: &str) -> Value {
	Value::String(s.to_string())
}

fn yaml_string(s: String) -> Value {
	Value::String(s)
}
