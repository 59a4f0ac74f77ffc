use std::path::Path;

use localdev_run::locate;

use crate::config::{self, IntegrityConfig};
use crate::workspace;

/// Folder-integrity pass over `workspace/` plus metadata cross-validation
/// against `workspace/index.toml`. Returns human-readable problem lines;
/// empty means the workspace is clean.
pub fn run_check(project_root: &Path, integrity: &IntegrityConfig, fix: bool) -> Vec<String> {
	let mut problems = Vec::new();

	if !config::config_path(project_root).exists() {
		problems.push(format!(
			"[ERROR] {} not found in {}.",
			config::CONFIG_FILE,
			project_root.display()
		));
		return problems;
	}

	let workspace_path = workspace::workspace_dir(project_root);
	let services = match std::fs::read_dir(&workspace_path) {
		Ok(entries) => {
			let mut dirs: Vec<_> = entries
				.flatten()
				.map(|e| e.path())
				.filter(|p| p.is_dir())
				.collect();
			dirs.sort();
			dirs
		}
		Err(_) => {
			problems.push(format!(
				"[ERROR] workspace folder not found at {}.",
				workspace_path.display()
			));
			return problems;
		}
	};

	for service_dir in &services {
		let name = service_dir
			.file_name()
			.unwrap_or_default()
			.to_string_lossy()
			.to_string();
		check_structure(service_dir, &name, integrity, fix, &mut problems);
	}

	check_metadata(project_root, &mut problems);

	problems
}

// --- Folder structure ---

fn check_structure(
	service_dir: &Path,
	name: &str,
	integrity: &IntegrityConfig,
	fix: bool,
	problems: &mut Vec<String>,
) {
	for dir in &integrity.require_dirs {
		let subdir = service_dir.join(dir);
		if !subdir.is_dir() {
			problems.push(format!("[MISSING] {}/ Required subdirectory: {}", name, dir));
			if fix {
				if let Err(e) = std::fs::create_dir_all(&subdir) {
					problems.push(format!(
						"[ERROR] Could not create directory {}/{}: {}",
						name, dir, e
					));
				}
			}
		}
	}

	for file in &integrity.require_files {
		if !service_dir.join(file).is_file() {
			problems.push(format!("[MISSING] {}/ Required file: {}", name, file));
		}
	}

	let patterns: Vec<glob::Pattern> = integrity
		.forbid_files
		.iter()
		.filter_map(|p| glob::Pattern::new(&p.to_lowercase()).ok())
		.collect();
	if !patterns.is_empty() {
		walk_forbidden(service_dir, service_dir, name, &patterns, &integrity.ignore_dirs, problems);
	}

	if integrity.enforce_flat_src {
		let src = service_dir.join("src");
		if src.is_dir() {
			if let Ok(entries) = std::fs::read_dir(&src) {
				let mut subdirs: Vec<_> = entries
					.flatten()
					.map(|e| e.path())
					.filter(|p| p.is_dir())
					.collect();
				subdirs.sort();
				for sub in subdirs {
					let item = sub.file_name().unwrap_or_default().to_string_lossy().to_string();
					problems.push(format!(
						"[STRUCTURE] {}/src/ must be flat — subdirectory found: {}",
						name, item
					));
				}
			}
		}
	}
}

fn walk_forbidden(
	service_dir: &Path,
	dir: &Path,
	name: &str,
	patterns: &[glob::Pattern],
	ignore_dirs: &[String],
	problems: &mut Vec<String>,
) {
	let entries = match std::fs::read_dir(dir) {
		Ok(e) => e,
		Err(_) => return,
	};
	let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).collect();
	paths.sort();

	for path in paths {
		let file_name = path.file_name().unwrap_or_default().to_string_lossy().to_string();
		if path.is_dir() {
			if !ignore_dirs.iter().any(|d| d == &file_name) {
				walk_forbidden(service_dir, &path, name, patterns, ignore_dirs, problems);
			}
			continue;
		}
		let lowered = file_name.to_lowercase();
		for pattern in patterns {
			if pattern.matches(&lowered) {
				let rel = path.strip_prefix(service_dir).unwrap_or(&path);
				problems.push(format!(
					"[FORBIDDEN] {}/ Matches '{}': {}",
					name,
					pattern.as_str(),
					rel.display()
				));
			}
		}
	}
}

// --- Metadata validation ---

fn check_metadata(project_root: &Path, problems: &mut Vec<String>) {
	let Some(index) = workspace::load_index(project_root) else {
		return;
	};

	for (name, entry) in &index.services {
		let service_dir = project_root.join(&entry.path);
		let meta_path = service_dir.join(locate::METADATA_FILE);
		if !meta_path.exists() {
			problems.push(format!(
				"[ERROR] {}: Missing service.toml at {}",
				name,
				meta_path.display()
			));
			continue;
		}
		let Some(meta) = locate::load_service_meta(&service_dir) else {
			problems.push(format!("[ERROR] {}: Unreadable service.toml", name));
			continue;
		};

		if meta.service_name.is_none() {
			problems.push(format!("[ERROR] {}: service.toml missing 'service_name'", name));
		}
		if meta.port.is_none() {
			problems.push(format!("[ERROR] {}: service.toml missing 'port'", name));
		}
		if meta.language.is_none() {
			problems.push(format!("[ERROR] {}: service.toml missing 'language'", name));
		}
		if meta.entrypoint.is_none() {
			problems.push(format!("[ERROR] {}: service.toml missing 'entrypoint'", name));
		}

		if let Some(ref service_name) = meta.service_name {
			if service_name != name {
				problems.push(mismatch(name, "service_name"));
			}
		}
		if let (Some(meta_port), Some(index_port)) = (meta.port, entry.port) {
			if meta_port != index_port {
				problems.push(mismatch(name, "port"));
			}
		}
		if let (Some(ref meta_lang), Some(ref index_lang)) = (&meta.language, &entry.language) {
			if meta_lang != index_lang {
				problems.push(mismatch(name, "language"));
			}
		}
		if let (Some(ref meta_entry), Some(ref index_entry)) = (&meta.entrypoint, &entry.entrypoint)
		{
			if meta_entry != index_entry {
				problems.push(mismatch(name, "entrypoint"));
			}
		}
	}
}

fn mismatch(name: &str, field: &str) -> String {
	format!(
		"[ERROR] {}: Mismatch in '{}' between service.toml and index.toml",
		name, field
	)
}
