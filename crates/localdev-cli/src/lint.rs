use std::path::{Path, PathBuf};

use crate::workspace;

/// Run the appropriate linters over a service directory and return the worst
/// exit code observed. `service` is either a path or a name under
/// `workspace/`.
pub fn run_lint(project_root: &Path, service: &str) -> i32 {
	let Some(dir) = resolve_service_dir(project_root, service) else {
		eprintln!("[ERROR] Service '{}' not found.", service);
		return 2;
	};

	let mut worst = 0;
	let mut ran_any = false;

	if dir.join("package.json").is_file() {
		ran_any = true;
		worst = worst.max(lint_node(&dir));
	}

	if has_python_sources(&dir) {
		ran_any = true;
		worst = worst.max(lint_python(&dir));
	}

	if !ran_any {
		eprintln!("[INFO] Nothing to lint in {}.", dir.display());
	}
	worst
}

fn resolve_service_dir(project_root: &Path, service: &str) -> Option<PathBuf> {
	let direct = PathBuf::from(service);
	if direct.is_dir() {
		return Some(direct);
	}
	let in_workspace = workspace::workspace_dir(project_root).join(service);
	if in_workspace.is_dir() {
		return Some(in_workspace);
	}
	None
}

// --- Language runners ---

fn lint_node(dir: &Path) -> i32 {
	if !eslint_available(dir) {
		eprintln!("[INFO] ESLint not found, skipping JavaScript lint.");
		return 0;
	}
	if which::which("npx").is_err() {
		eprintln!("[INFO] npx not found, skipping ESLint.");
		return 0;
	}
	eprintln!("[INFO] Running ESLint in {}...", dir.display());
	run_tool(dir, "npx", &["--no-install", "eslint", "."])
}

/// ESLint counts as available when installed locally in the service or
/// globally on PATH. `npx` alone is not enough — it would try to install
/// the package on the fly.
fn eslint_available(dir: &Path) -> bool {
	dir.join("node_modules/.bin/eslint").exists() || which::which("eslint").is_ok()
}

fn lint_python(dir: &Path) -> i32 {
	if which::which("ruff").is_ok() {
		eprintln!("[INFO] Running ruff in {}...", dir.display());
		return run_tool(dir, "ruff", &["check", "."]);
	}
	if which::which("flake8").is_ok() {
		eprintln!("[INFO] Running flake8 in {}...", dir.display());
		return run_tool(dir, "flake8", &["--max-line-length=120", "."]);
	}
	eprintln!("[INFO] Neither ruff nor flake8 found, skipping Python lint.");
	0
}

fn run_tool(dir: &Path, program: &str, args: &[&str]) -> i32 {
	match std::process::Command::new(program)
		.args(args)
		.current_dir(dir)
		.status()
	{
		Ok(status) => status.code().unwrap_or(1),
		Err(e) => {
			eprintln!("[ERROR] Failed to run {}: {}", program, e);
			1
		}
	}
}

/// Recursive scan for `.py` files, skipping dependency and VCS directories.
fn has_python_sources(dir: &Path) -> bool {
	let entries = match std::fs::read_dir(dir) {
		Ok(e) => e,
		Err(_) => return false,
	};
	for entry in entries.flatten() {
		let path = entry.path();
		let name = entry.file_name().to_string_lossy().to_string();
		if path.is_dir() {
			if matches!(name.as_str(), "node_modules" | ".git" | "__pycache__" | ".venv") {
				continue;
			}
			if has_python_sources(&path) {
				return true;
			}
		} else if name.ends_with(".py") {
			return true;
		}
	}
	false
}
