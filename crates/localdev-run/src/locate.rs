use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-service metadata file name, looked for at the service root.
pub const METADATA_FILE: &str = "service.toml";

/// Conventional entry file names, checked in order.
const CONVENTIONAL_ENTRIES: [&str; 5] = ["index.js", "main.js", "app.js", "main.py", "app.py"];

/// Contents of a `service.toml`. All keys optional so that partially
/// written metadata still resolves; the integrity checker reports gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceMeta {
	pub service_name: Option<String>,
	pub port: Option<u16>,
	pub language: Option<String>,
	pub entrypoint: Option<String>,
	pub model: Option<String>,
}

pub fn load_service_meta(root: &Path) -> Option<ServiceMeta> {
	let path = root.join(METADATA_FILE);
	let content = std::fs::read_to_string(&path).ok()?;
	match toml::from_str(&content) {
		Ok(meta) => Some(meta),
		Err(e) => {
			tracing::warn!("failed to parse {}: {}", path.display(), e);
			None
		}
	}
}

// --- Service root locator ---

/// Resolve a service identifier (name or path) to its root directory.
///
/// Precedence, first match wins:
/// 1. `<cwd>/<service>` if it is a directory containing `service.toml`
/// 2. `<cwd>/workspace/<service>` if `service.toml` exists there
/// 3. `<cwd>/<service>` if `service.toml` exists there
/// 4. `<cwd>` itself if `service.toml` exists there
/// 5. `<cwd>/<service>` if it is merely a directory
/// 6. the parent of `<cwd>/<service>` if that path is a file
///
/// Metadata beats bare heuristics, and the workspace lookup beats literal
/// paths, so short service names resolve predictably even when a same-named
/// file exists elsewhere.
pub fn find_service_root(cwd: &Path, service: &str) -> Option<PathBuf> {
	let candidate = cwd.join(service);
	if candidate.is_dir() && candidate.join(METADATA_FILE).exists() {
		return Some(candidate);
	}

	let in_workspace = cwd.join("workspace").join(service);
	if in_workspace.join(METADATA_FILE).exists() {
		return Some(in_workspace);
	}

	if candidate.join(METADATA_FILE).exists() {
		return Some(candidate);
	}

	if cwd.join(METADATA_FILE).exists() {
		return Some(cwd.to_path_buf());
	}

	if candidate.is_dir() {
		return Some(candidate);
	}

	if candidate.is_file() {
		return candidate.parent().map(Path::to_path_buf);
	}

	None
}

// --- Entrypoint resolver ---

/// The two runtimes a service entry file can map to. Unknown extensions are
/// never matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpreter {
	Node,
	Python,
}

impl Interpreter {
	pub fn for_extension(ext: &str) -> Option<Self> {
		match ext {
			"js" => Some(Interpreter::Node),
			"py" => Some(Interpreter::Python),
			_ => None,
		}
	}

	/// The command used to launch this interpreter.
	pub fn command(&self) -> String {
		match self {
			Interpreter::Node => "node".to_string(),
			Interpreter::Python => python_command(),
		}
	}
}

/// Locate the host Python runtime. Falls back to a bare `python3` so that a
/// missing runtime surfaces as a spawn error rather than a resolution error.
pub fn python_command() -> String {
	for name in ["python3", "python"] {
		if let Ok(path) = which::which(name) {
			return path.to_string_lossy().into_owned();
		}
	}
	"python3".to_string()
}

/// A resolved (interpreter, entry file) pair. Computed once per invocation —
/// a content edit does not change the entry file's identity, so it is not
/// re-resolved on restart.
#[derive(Debug, Clone)]
pub struct EntrypointSpec {
	pub interpreter: Interpreter,
	pub command: String,
	pub path: PathBuf,
}

impl EntrypointSpec {
	pub fn for_file(path: PathBuf) -> Option<Self> {
		let ext = path.extension()?.to_str()?;
		let interpreter = Interpreter::for_extension(ext)?;
		Some(Self {
			interpreter,
			command: interpreter.command(),
			path,
		})
	}
}

/// Resolve the entry file for a service root.
///
/// A declared `entrypoint` in `service.toml` wins over any conventionally
/// named file. Without one, the conventional names are scanned in order,
/// then the directory is scanned for the lexicographically first `.js` file,
/// then the first `.py` file.
pub fn find_entrypoint(root: &Path) -> Option<EntrypointSpec> {
	if let Some(meta) = load_service_meta(root) {
		if let Some(entry) = meta.entrypoint {
			let path = root.join(&entry);
			if path.exists() {
				if let Some(spec) = EntrypointSpec::for_file(path) {
					return Some(spec);
				}
			}
		}
	}

	for name in CONVENTIONAL_ENTRIES {
		let path = root.join(name);
		if path.exists() {
			if let Some(spec) = EntrypointSpec::for_file(path) {
				return Some(spec);
			}
		}
	}

	// Fallback: any script directly in the root, sorted for determinism.
	let mut files: Vec<PathBuf> = match std::fs::read_dir(root) {
		Ok(entries) => entries
			.flatten()
			.map(|e| e.path())
			.filter(|p| p.is_file())
			.collect(),
		Err(_) => return None,
	};
	files.sort();

	for ext in ["js", "py"] {
		let found = files
			.iter()
			.find(|p| p.extension().and_then(|e| e.to_str()) == Some(ext));
		if let Some(path) = found {
			return EntrypointSpec::for_file(path.clone());
		}
	}

	None
}
