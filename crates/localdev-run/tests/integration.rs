use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use localdev_run::locate::{self, Interpreter};
use localdev_run::supervisor::{supervise, RunSpec};
use localdev_run::{find_entrypoint, find_service_root, ChangeWatcher, EntrypointSpec, RunError};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

fn temp_dir(name: &str) -> PathBuf {
	let n = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
	let dir = std::env::temp_dir().join(format!("localdev-run-test-{}-{}", n, name));
	let _ = std::fs::create_dir_all(&dir);
	dir
}

fn write(dir: &std::path::Path, name: &str, content: &str) {
	std::fs::write(dir.join(name), content).unwrap();
}

// --- Service root locator ---

#[test]
fn root_directory_with_metadata() {
	let cwd = temp_dir("root-meta");
	let service_dir = cwd.join("foo");
	std::fs::create_dir_all(&service_dir).unwrap();
	write(&service_dir, "service.toml", "port = 3000\n");

	assert_eq!(find_service_root(&cwd, "foo"), Some(service_dir));

	let _ = std::fs::remove_dir_all(&cwd);
}

#[test]
fn root_workspace_lookup() {
	let cwd = temp_dir("root-workspace");
	let service_dir = cwd.join("workspace").join("gateway");
	std::fs::create_dir_all(&service_dir).unwrap();
	write(&service_dir, "service.toml", "port = 3000\n");

	assert_eq!(find_service_root(&cwd, "gateway"), Some(service_dir));

	let _ = std::fs::remove_dir_all(&cwd);
}

#[test]
fn root_cwd_with_metadata() {
	let cwd = temp_dir("root-cwd");
	write(&cwd, "service.toml", "port = 3000\n");

	assert_eq!(find_service_root(&cwd, "whatever"), Some(cwd.clone()));

	let _ = std::fs::remove_dir_all(&cwd);
}

#[test]
fn root_bare_directory() {
	let cwd = temp_dir("root-bare");
	let service_dir = cwd.join("svc");
	std::fs::create_dir_all(&service_dir).unwrap();

	assert_eq!(find_service_root(&cwd, "svc"), Some(service_dir));

	let _ = std::fs::remove_dir_all(&cwd);
}

#[test]
fn root_file_resolves_to_parent() {
	let cwd = temp_dir("root-file");
	write(&cwd, "script.js", "console.log('hi')\n");

	assert_eq!(find_service_root(&cwd, "script.js"), Some(cwd.clone()));

	let _ = std::fs::remove_dir_all(&cwd);
}

#[test]
fn root_metadata_directory_beats_same_named_file() {
	// A directory foo/ with metadata must win over a plain file foo.
	let cwd = temp_dir("root-precedence");
	let service_dir = cwd.join("workspace").join("foo");
	std::fs::create_dir_all(&service_dir).unwrap();
	write(&service_dir, "service.toml", "port = 3000\n");
	write(&cwd, "foo", "not a service\n");

	assert_eq!(find_service_root(&cwd, "foo"), Some(service_dir));

	let _ = std::fs::remove_dir_all(&cwd);
}

#[test]
fn root_not_found() {
	let cwd = temp_dir("root-notfound");
	assert_eq!(find_service_root(&cwd, "notfound"), None);
	let _ = std::fs::remove_dir_all(&cwd);
}

// --- Entrypoint resolver ---

#[test]
fn entrypoint_declared_in_metadata_wins() {
	let root = temp_dir("entry-declared");
	write(&root, "service.toml", "entrypoint = 'server.py'\n");
	write(&root, "server.py", "print('hi')\n");
	// A conventional name that would otherwise match first.
	write(&root, "index.js", "console.log('hi')\n");

	let spec = find_entrypoint(&root).unwrap();
	assert_eq!(spec.interpreter, Interpreter::Python);
	assert_eq!(spec.path, root.join("server.py"));

	let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn entrypoint_conventional_names_in_order() {
	let root = temp_dir("entry-conventional");
	write(&root, "main.py", "print('hi')\n");
	write(&root, "app.py", "print('hi')\n");

	let spec = find_entrypoint(&root).unwrap();
	assert_eq!(spec.interpreter, Interpreter::Python);
	assert_eq!(spec.path, root.join("main.py"));

	// A js conventional name beats any py one.
	write(&root, "main.js", "console.log('hi')\n");
	let spec = find_entrypoint(&root).unwrap();
	assert_eq!(spec.interpreter, Interpreter::Node);
	assert_eq!(spec.path, root.join("main.js"));

	let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn entrypoint_fallback_is_sorted() {
	let root = temp_dir("entry-fallback");
	write(&root, "zeta.js", "console.log('hi')\n");
	write(&root, "alpha.js", "console.log('hi')\n");
	write(&root, "beta.py", "print('hi')\n");

	// Lexicographically first .js wins before any .py is considered.
	let spec = find_entrypoint(&root).unwrap();
	assert_eq!(spec.interpreter, Interpreter::Node);
	assert_eq!(spec.path, root.join("alpha.js"));

	let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn entrypoint_unknown_extensions_never_match() {
	let root = temp_dir("entry-none");
	write(&root, "README.md", "# nope\n");
	write(&root, "data.txt", "nope\n");

	assert!(find_entrypoint(&root).is_none());

	let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn entrypoint_declared_but_missing_falls_back() {
	let root = temp_dir("entry-missing-declared");
	write(&root, "service.toml", "entrypoint = 'gone.py'\n");
	write(&root, "app.js", "console.log('hi')\n");

	let spec = find_entrypoint(&root).unwrap();
	assert_eq!(spec.path, root.join("app.js"));

	let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn service_meta_roundtrip() {
	let root = temp_dir("meta");
	write(
		&root,
		"service.toml",
		"service_name = 'api'\nport = 3001\nlanguage = 'node'\nentrypoint = 'src/app.js'\n",
	);

	let meta = locate::load_service_meta(&root).unwrap();
	assert_eq!(meta.service_name.as_deref(), Some("api"));
	assert_eq!(meta.port, Some(3001));
	assert_eq!(meta.entrypoint.as_deref(), Some("src/app.js"));

	let _ = std::fs::remove_dir_all(&root);
}

// --- Error taxonomy ---

#[test]
fn exit_codes() {
	assert_eq!(RunError::RootNotFound("x".into()).exit_code(), 2);
	assert_eq!(RunError::EntrypointNotFound("x".into()).exit_code(), 3);
	assert_eq!(RunError::WatchUnavailable("x".into()).exit_code(), 4);
}

#[tokio::test]
async fn run_unknown_identifier_is_root_not_found() {
	let cwd = temp_dir("run-notfound");
	let err = localdev_run::run(&cwd, "notfound", false).await.unwrap_err();
	assert!(matches!(err, RunError::RootNotFound(_)));
	let _ = std::fs::remove_dir_all(&cwd);
}

#[tokio::test]
async fn run_root_without_scripts_is_entrypoint_not_found() {
	let cwd = temp_dir("run-noentry");
	let service_dir = cwd.join("svc");
	std::fs::create_dir_all(&service_dir).unwrap();
	write(&service_dir, "notes.txt", "no scripts here\n");

	let err = localdev_run::run(&cwd, "svc", false).await.unwrap_err();
	assert!(matches!(err, RunError::EntrypointNotFound(_)));

	let _ = std::fs::remove_dir_all(&cwd);
}

// --- Supervision ---

fn shell_spec(name: &str, root: PathBuf, script: &str) -> RunSpec {
	let script_path = root.join("entry.sh");
	std::fs::write(&script_path, script).unwrap();
	RunSpec {
		name: name.to_string(),
		root,
		entry: EntrypointSpec {
			interpreter: Interpreter::Python,
			command: "sh".to_string(),
			path: script_path,
		},
		watch: false,
	}
}

#[tokio::test]
async fn supervise_propagates_child_exit_code() {
	let root = temp_dir("sup-exit-code");
	let spec = shell_spec("svc", root.clone(), "exit 7\n");

	let code = supervise(&spec).await.unwrap();
	assert_eq!(code, 7);

	let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn supervise_clean_exit_is_zero() {
	let root = temp_dir("sup-clean");
	let spec = shell_spec("svc", root.clone(), "echo done\n");

	let code = supervise(&spec).await.unwrap();
	assert_eq!(code, 0);

	let _ = std::fs::remove_dir_all(&root);
}

#[cfg(unix)]
#[tokio::test]
async fn group_terminate_reaches_nested_children() {
	use localdev_run::{signal_group, SignalIntent};
	use std::process::Stdio;

	let root = temp_dir("sup-group");
	// The shell spawns its own child; the group signal must reach both.
	let mut cmd = tokio::process::Command::new("sh");
	cmd.args(["-c", "sleep 30 & wait"])
		.current_dir(&root)
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.process_group(0);
	let mut child = cmd.spawn().unwrap();

	tokio::time::sleep(std::time::Duration::from_millis(200)).await;
	signal_group(&mut child, SignalIntent::Terminate);

	let status = tokio::time::timeout(std::time::Duration::from_secs(5), child.wait())
		.await
		.expect("child did not exit after group terminate")
		.unwrap();
	assert!(!status.success());

	let _ = std::fs::remove_dir_all(&root);
}

#[cfg(unix)]
#[tokio::test]
async fn group_interrupt_reaches_nested_children() {
	use localdev_run::{signal_group, SignalIntent};
	use std::process::Stdio;

	let root = temp_dir("sup-interrupt");
	// The shell traps the interrupt into a clean exit; the nested sleep's
	// pid is recorded so the test can prove it did not survive as an orphan.
	let mut cmd = tokio::process::Command::new("sh");
	cmd.args([
		"-c",
		"trap 'exit 0' INT; sleep 30 & echo $! > sleep.pid; wait",
	])
	.current_dir(&root)
	.stdout(Stdio::null())
	.stderr(Stdio::null())
	.process_group(0);
	let mut child = cmd.spawn().unwrap();

	tokio::time::sleep(std::time::Duration::from_millis(200)).await;
	signal_group(&mut child, SignalIntent::Interrupt);

	let status = tokio::time::timeout(std::time::Duration::from_secs(5), child.wait())
		.await
		.expect("child did not exit after group interrupt")
		.unwrap();
	// Operator interrupt reads as a clean shutdown, not a failure.
	assert!(status.success());

	let pid: i32 = std::fs::read_to_string(root.join("sleep.pid"))
		.unwrap()
		.trim()
		.parse()
		.unwrap();
	let sleep_pid = nix::unistd::Pid::from_raw(pid);
	let mut gone = false;
	for _ in 0..20 {
		if nix::sys::signal::kill(sleep_pid, None).is_err() {
			gone = true;
			break;
		}
		tokio::time::sleep(std::time::Duration::from_millis(100)).await;
	}
	assert!(gone, "nested sleep survived the group interrupt");

	let _ = std::fs::remove_dir_all(&root);
}

// --- Restart signal ---

#[tokio::test]
async fn rapid_change_events_collapse_into_one_restart() {
	let (tx, mut rx) = tokio::sync::watch::channel(());

	// Two events in quick succession while a restart is already pending.
	tx.send(()).unwrap();
	tx.send(()).unwrap();

	// Exactly one wakeup is observed...
	tokio::time::timeout(std::time::Duration::from_secs(1), rx.changed())
		.await
		.expect("restart signal not raised")
		.unwrap();

	// ...and once consumed, nothing further is pending.
	let _ = rx.borrow_and_update();
	assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn change_watcher_raises_restart_signal() {
	let root = temp_dir("watch-trigger");
	let (tx, mut rx) = tokio::sync::watch::channel(());
	let _watcher = ChangeWatcher::arm(&root, tx).unwrap();

	// Let the watch settle before mutating the tree.
	tokio::time::sleep(std::time::Duration::from_millis(200)).await;
	std::fs::write(root.join("touched.js"), "console.log('hi')\n").unwrap();

	tokio::time::timeout(std::time::Duration::from_secs(5), rx.changed())
		.await
		.expect("file change did not raise the restart signal")
		.unwrap();

	let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn change_watcher_fails_fast_on_missing_root() {
	let missing = std::env::temp_dir().join("localdev-run-test-definitely-missing");
	let (tx, _rx) = tokio::sync::watch::channel(());
	assert!(ChangeWatcher::arm(&missing, tx).is_err());
}
