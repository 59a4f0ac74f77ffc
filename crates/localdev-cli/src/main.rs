mod check;
mod compose;
mod config;
mod lint;
mod scaffold;
mod suggest;
mod workspace;

use std::path::PathBuf;

use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_writer(std::io::stderr)
		.init();

	let args: Vec<String> = std::env::args().skip(1).collect();

	if args.is_empty() {
		print_usage();
		return;
	}

	match args[0].as_str() {
		"help" | "--help" | "-h" => print_usage(),
		"version" | "--version" | "-V" => println!("localdev {}", env!("CARGO_PKG_VERSION")),
		"run" => cmd_run(&args[1..]),
		"init" => cmd_init(&args[1..]),
		"check" => cmd_check(&args[1..]),
		"compose" => cmd_compose(&args[1..]),
		"suggest" => cmd_suggest(&args[1..]),
		"lint" => cmd_lint(&args[1..]),
		name => {
			eprintln!("unknown command: {}", name);
			eprintln!("run 'localdev help' for usage");
			std::process::exit(1);
		}
	}
}

fn print_usage() {
	eprintln!(
		"{} {} — local microservice development toolkit",
		"localdev".bold(),
		env!("CARGO_PKG_VERSION")
	);
	eprintln!();
	eprintln!("usage: {} <command> [options]", "localdev".bold());
	eprintln!();

	eprintln!("{}", "services".cyan().bold());
	eprintln!(
		"  {} <name> [--port N] [--language node|python] [--model m] [--git] [--docker-compose]",
		"init".bold()
	);
	eprintln!("                              Scaffold a new microservice");
	eprintln!(
		"  {} <service> [--watch] [--model m]   Run a service, optionally restarting on change",
		"run".bold()
	);
	eprintln!("  {} <service>                Lint a service (ESLint / ruff / flake8)", "lint".bold());
	eprintln!();

	eprintln!("{}", "workspace".cyan().bold());
	eprintln!("  {} [--fix] [--json]        Validate workspace structure and metadata", "check".bold());
	eprintln!(
		"  {} generate [--force] | compose up",
		"compose".bold()
	);
	eprintln!("                              Generate docker-compose.yml");
	eprintln!();

	eprintln!("{}", "assist".cyan().bold());
	eprintln!(
		"  {} <file> [--task refactor|optimize|explain] [--out path]",
		"suggest".bold()
	);
	eprintln!("                              Ask the configured model to improve a file");
}

fn project_root() -> PathBuf {
	match std::env::current_dir() {
		Ok(dir) => dir,
		Err(e) => {
			eprintln!("[ERROR] cannot determine working directory: {}", e);
			std::process::exit(1);
		}
	}
}

fn runtime() -> tokio::runtime::Runtime {
	match tokio::runtime::Runtime::new() {
		Ok(rt) => rt,
		Err(e) => {
			eprintln!("[ERROR] failed to start async runtime: {}", e);
			std::process::exit(1);
		}
	}
}

// --- Commands ---

fn cmd_run(args: &[String]) {
	let mut service = None;
	let mut watch = false;
	let mut model = None;

	let mut iter = args.iter();
	while let Some(arg) = iter.next() {
		match arg.as_str() {
			"--watch" | "-w" => watch = true,
			"--model" => model = iter.next().cloned(),
			other if service.is_none() => service = Some(other.to_string()),
			other => {
				eprintln!("unexpected argument: {}", other);
				std::process::exit(1);
			}
		}
	}
	let Some(service) = service else {
		eprintln!("usage: localdev run <service> [--watch] [--model m]");
		std::process::exit(1);
	};

	let root = project_root();
	let config = config::load_project_config(&root);
	if let Some(model) = model.or(config.ai.model) {
		println!("[INFO] Using model: {}", model);
	}

	match runtime().block_on(localdev_run::run(&root, &service, watch)) {
		Ok(code) => std::process::exit(code),
		Err(e) => {
			eprintln!("[ERROR] {}", e);
			std::process::exit(e.exit_code());
		}
	}
}

fn cmd_init(args: &[String]) {
	let mut name = None;
	let mut opts = scaffold::ScaffoldOptions::default();
	let mut docker_compose = false;

	let mut iter = args.iter();
	while let Some(arg) = iter.next() {
		match arg.as_str() {
			"--port" | "-p" => {
				let value = iter.next().and_then(|v| v.parse().ok());
				match value {
					Some(port) => opts.port = port,
					None => {
						eprintln!("--port requires a number");
						std::process::exit(1);
					}
				}
			}
			"--language" | "-l" => {
				let value = iter.next().and_then(|v| scaffold::Language::parse(v));
				match value {
					Some(language) => opts.language = language,
					None => {
						eprintln!("--language must be 'node' or 'python'");
						std::process::exit(1);
					}
				}
			}
			"--model" => opts.model = iter.next().cloned(),
			"--git" => opts.git = true,
			"--docker-compose" => docker_compose = true,
			other if name.is_none() => name = Some(other.to_string()),
			other => {
				eprintln!("unexpected argument: {}", other);
				std::process::exit(1);
			}
		}
	}
	let Some(name) = name else {
		eprintln!("usage: localdev init <name> [--port N] [--language node|python] [--model m] [--git] [--docker-compose]");
		std::process::exit(1);
	};

	let root = project_root();
	if let Err(e) = scaffold::create_microservice(&root, &name, &opts) {
		eprintln!("[ERROR] {}", e);
		std::process::exit(1);
	}
	println!(
		"[INFO] Service '{}' created at workspace/{} ({} on port {}).",
		name,
		name,
		match opts.language {
			scaffold::Language::Node => "node",
			scaffold::Language::Python => "python",
		},
		opts.port
	);

	if docker_compose {
		let code = compose::generate(&root, false);
		if code == 2 {
			std::process::exit(2);
		}
	}
}

fn cmd_check(args: &[String]) {
	let fix = args.iter().any(|a| a == "--fix");
	let json = args.iter().any(|a| a == "--json");

	let root = project_root();
	let config = config::load_project_config(&root);
	let problems = check::run_check(&root, &config.integrity, fix);

	if json {
		let report = serde_json::json!({ "problems": problems });
		match serde_json::to_string_pretty(&report) {
			Ok(s) => println!("{}", s),
			Err(e) => {
				eprintln!("[ERROR] failed to render report: {}", e);
				std::process::exit(1);
			}
		}
	} else if problems.is_empty() {
		println!("{}", "workspace is clean".green());
	} else {
		for problem in &problems {
			println!("{}", problem);
		}
	}

	if !problems.is_empty() {
		std::process::exit(1);
	}
}

#[derive(Debug, PartialEq, Eq)]
enum ComposeAction {
	Generate { force: bool },
	Up,
}

fn parse_compose_args(args: &[String]) -> Option<ComposeAction> {
	match args.first().map(|s| s.as_str()) {
		Some("up") => Some(ComposeAction::Up),
		// `generate` is the documented subcommand; a bare `compose` does the
		// same thing.
		Some("generate") | Some("--force") | None => Some(ComposeAction::Generate {
			force: args.iter().any(|a| a == "--force"),
		}),
		Some(_) => None,
	}
}

fn cmd_compose(args: &[String]) {
	let root = project_root();
	let code = match parse_compose_args(args) {
		Some(ComposeAction::Up) => compose::up(),
		Some(ComposeAction::Generate { force }) => compose::generate(&root, force),
		None => {
			eprintln!("usage: localdev compose [generate [--force] | up]");
			1
		}
	};
	std::process::exit(code);
}

fn cmd_suggest(args: &[String]) {
	let mut file = None;
	let mut task = "refactor".to_string();
	let mut out = None;

	let mut iter = args.iter();
	while let Some(arg) = iter.next() {
		match arg.as_str() {
			"--task" | "-t" => {
				let value = iter.next().cloned();
				match value.as_deref() {
					Some("refactor") | Some("optimize") | Some("explain") => {
						task = value.unwrap_or_default();
					}
					_ => {
						eprintln!("--task must be 'refactor', 'optimize' or 'explain'");
						std::process::exit(1);
					}
				}
			}
			"--out" | "-o" => out = iter.next().map(PathBuf::from),
			other if file.is_none() => file = Some(PathBuf::from(other)),
			other => {
				eprintln!("unexpected argument: {}", other);
				std::process::exit(1);
			}
		}
	}
	let Some(file) = file else {
		eprintln!("usage: localdev suggest <file> [--task refactor|optimize|explain] [--out path]");
		std::process::exit(1);
	};

	let root = project_root();
	let config = config::load_project_config(&root);
	let result = runtime().block_on(suggest::suggest_code_improvement(&config.ai, &file, &task));
	match result {
		Ok(suggestion) => match out {
			Some(path) => {
				if let Err(e) = std::fs::write(&path, suggestion) {
					eprintln!("[ERROR] failed to write {}: {}", path.display(), e);
					std::process::exit(1);
				}
				println!("[INFO] Suggestion written to {}.", path.display());
			}
			None => println!("{}", suggestion),
		},
		Err(e) => {
			eprintln!("[ERROR] {}", e);
			std::process::exit(1);
		}
	}
}

fn cmd_lint(args: &[String]) {
	let Some(service) = args.first() else {
		eprintln!("usage: localdev lint <service>");
		std::process::exit(1);
	};
	let root = project_root();
	std::process::exit(lint::run_lint(&root, service));
}

#[cfg(test)]
mod tests {
	use super::*;

	fn argv(args: &[&str]) -> Vec<String> {
		args.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn compose_generate_subcommand_is_accepted() {
		assert_eq!(
			parse_compose_args(&argv(&["generate"])),
			Some(ComposeAction::Generate { force: false })
		);
		assert_eq!(
			parse_compose_args(&argv(&["generate", "--force"])),
			Some(ComposeAction::Generate { force: true })
		);
	}

	#[test]
	fn compose_bare_and_up_forms() {
		assert_eq!(
			parse_compose_args(&argv(&[])),
			Some(ComposeAction::Generate { force: false })
		);
		assert_eq!(
			parse_compose_args(&argv(&["--force"])),
			Some(ComposeAction::Generate { force: true })
		);
		assert_eq!(parse_compose_args(&argv(&["up"])), Some(ComposeAction::Up));
		assert_eq!(parse_compose_args(&argv(&["bogus"])), None);
	}
}
