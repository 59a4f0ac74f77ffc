use std::io;
use std::path::Path;

use localdev_run::ServiceMeta;

use crate::workspace::{self, IndexEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
	Node,
	Python,
}

impl Language {
	pub fn parse(s: &str) -> Option<Self> {
		match s {
			"node" => Some(Language::Node),
			"python" => Some(Language::Python),
			_ => None,
		}
	}

	fn as_str(&self) -> &'static str {
		match self {
			Language::Node => "node",
			Language::Python => "python",
		}
	}
}

#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
	pub port: u16,
	pub language: Language,
	pub model: Option<String>,
	pub git: bool,
}

impl Default for ScaffoldOptions {
	fn default() -> Self {
		Self {
			port: 3000,
			language: Language::Node,
			model: None,
			git: false,
		}
	}
}

/// Scaffold `workspace/<name>` and register it in `workspace/index.toml`.
///
/// Refuses to touch an existing service directory.
pub fn create_microservice(
	project_root: &Path,
	name: &str,
	opts: &ScaffoldOptions,
) -> io::Result<()> {
	let base = workspace::workspace_dir(project_root).join(name);
	if base.exists() {
		return Err(io::Error::new(
			io::ErrorKind::AlreadyExists,
			format!("service folder '{}' already exists", base.display()),
		));
	}

	for folder in [
		"src/controllers",
		"src/routes",
		"views",
		"public",
		"tests",
		"docs",
	] {
		std::fs::create_dir_all(base.join(folder))?;
	}

	let entrypoint = match opts.language {
		Language::Node => {
			std::fs::write(base.join("src/app.js"), node_app(name))?;
			std::fs::write(base.join("views/index.ejs"), ejs_index(name))?;
			std::fs::write(base.join("package.json"), package_json(name))?;
			std::fs::write(base.join("Dockerfile"), node_dockerfile())?;
			"src/app.js"
		}
		Language::Python => {
			std::fs::write(base.join("src/app.py"), python_app(name))?;
			std::fs::write(base.join("requirements.txt"), "flask>=3.0\n")?;
			std::fs::write(base.join("Dockerfile"), python_dockerfile())?;
			"src/app.py"
		}
	};

	std::fs::write(base.join("README.md"), readme(name, opts.language))?;
	std::fs::write(base.join(".gitignore"), "node_modules/\n__pycache__/\n.env\n")?;

	let meta = ServiceMeta {
		service_name: Some(name.to_string()),
		port: Some(opts.port),
		language: Some(opts.language.as_str().to_string()),
		entrypoint: Some(entrypoint.to_string()),
		model: opts.model.clone(),
	};
	let meta_toml = toml::to_string_pretty(&meta)
		.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
	std::fs::write(base.join("service.toml"), meta_toml)?;

	let mut index = workspace::load_index(project_root).unwrap_or_default();
	index.services.insert(
		name.to_string(),
		IndexEntry {
			path: format!("{}/{}", workspace::WORKSPACE_DIR, name),
			port: Some(opts.port),
			language: Some(opts.language.as_str().to_string()),
			entrypoint: Some(entrypoint.to_string()),
		},
	);
	workspace::save_index(project_root, &index)?;

	if opts.git {
		let status = std::process::Command::new("git")
			.arg("init")
			.current_dir(&base)
			.status();
		match status {
			Ok(s) if s.success() => {}
			Ok(_) => eprintln!("warning: git init failed in {}", base.display()),
			Err(e) => eprintln!("warning: could not run git init: {}", e),
		}
	}

	Ok(())
}

// --- Templates ---

fn node_app(name: &str) -> String {
	format!(
		r#"const express = require('express');
const path = require('path');
const app = express();

app.set('view engine', 'ejs');
app.set('views', path.join(__dirname, '../views'));
app.use(express.static(path.join(__dirname, '../public')));

app.get('/', (req, res) => {{
    res.render('index', {{ service: '{name}' }});
}});

const PORT = process.env.PORT || 3000;
app.listen(PORT, () => {{
    console.log(`{name} running on port ${{PORT}}`);
}});
"#
	)
}

fn python_app(name: &str) -> String {
	format!(
		r#"import os

from flask import Flask

app = Flask(__name__)


@app.get("/")
def index():
    return {{"service": "{name}"}}


if __name__ == "__main__":
    port = int(os.environ.get("PORT", "3000"))
    app.run(host="0.0.0.0", port=port)
"#
	)
}

fn ejs_index(name: &str) -> String {
	format!(
		r#"<html>
  <head><title>{name} Home</title></head>
  <body>
    <h1>Welcome to {name}!</h1>
    <p>This is a minimal Express.js + EJS microservice scaffold.</p>
  </body>
</html>
"#
	)
}

fn package_json(name: &str) -> String {
	format!(
		r#"{{
  "name": "{name}",
  "version": "1.0.0",
  "main": "src/app.js",
  "scripts": {{
    "start": "node src/app.js"
  }},
  "dependencies": {{
    "express": "^4.18.0",
    "ejs": "^3.1.8"
  }}
}}
"#
	)
}

fn node_dockerfile() -> &'static str {
	r#"FROM node:20-alpine
WORKDIR /app
COPY package.json ./
RUN npm install --production
COPY . .
EXPOSE 3000
CMD ["npm", "start"]
"#
}

fn python_dockerfile() -> &'static str {
	r#"FROM python:3.12-slim
WORKDIR /app
COPY requirements.txt ./
RUN pip install --no-cache-dir -r requirements.txt
COPY . .
EXPOSE 3000
CMD ["python", "src/app.py"]
"#
}

fn readme(name: &str, language: Language) -> String {
	let start = match language {
		Language::Node => "npm install\nnode src/app.js",
		Language::Python => "pip install -r requirements.txt\npython src/app.py",
	};
	format!(
		"# {name}\n\nMinimal microservice scaffolded by localdev.\n\n## Getting Started\n\n```bash\ncd workspace/{name}\n{start}\n```\n\nOpen http://localhost:3000\n"
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn temp_root(name: &str) -> std::path::PathBuf {
		let root = std::env::temp_dir().join(format!("localdev-cli-test-scaffold-{}", name));
		let _ = std::fs::remove_dir_all(&root);
		std::fs::create_dir_all(&root).unwrap();
		root
	}

	#[test]
	fn scaffolds_node_service_and_registers_it() {
		let root = temp_root("node");
		let opts = ScaffoldOptions {
			port: 3001,
			..ScaffoldOptions::default()
		};
		create_microservice(&root, "gateway", &opts).unwrap();

		let base = root.join("workspace/gateway");
		assert!(base.join("src/app.js").is_file());
		assert!(base.join("package.json").is_file());
		assert!(base.join("Dockerfile").is_file());
		assert!(base.join("service.toml").is_file());

		let index = crate::workspace::load_index(&root).unwrap();
		assert_eq!(index.services["gateway"].port, Some(3001));
		assert_eq!(
			index.services["gateway"].entrypoint.as_deref(),
			Some("src/app.js")
		);

		// The scaffolded service resolves through the supervisor's resolver.
		let spec = localdev_run::find_entrypoint(&base).unwrap();
		assert_eq!(spec.path, base.join("src/app.js"));

		let _ = std::fs::remove_dir_all(&root);
	}

	#[test]
	fn scaffolds_python_service() {
		let root = temp_root("python");
		let opts = ScaffoldOptions {
			language: Language::Python,
			..ScaffoldOptions::default()
		};
		create_microservice(&root, "worker", &opts).unwrap();

		let base = root.join("workspace/worker");
		assert!(base.join("src/app.py").is_file());
		assert!(base.join("requirements.txt").is_file());

		let meta = localdev_run::locate::load_service_meta(&base).unwrap();
		assert_eq!(meta.language.as_deref(), Some("python"));
		assert_eq!(meta.entrypoint.as_deref(), Some("src/app.py"));

		let _ = std::fs::remove_dir_all(&root);
	}

	#[test]
	fn refuses_existing_service_dir() {
		let root = temp_root("existing");
		std::fs::create_dir_all(root.join("workspace/taken")).unwrap();

		let err = create_microservice(&root, "taken", &ScaffoldOptions::default()).unwrap_err();
		assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);

		let _ = std::fs::remove_dir_all(&root);
	}
}
