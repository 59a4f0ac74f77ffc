use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

use crate::error::RunError;
use crate::locate::{self, EntrypointSpec, Interpreter};
use crate::relay;
use crate::signal::{signal_group, SignalIntent};
use crate::watch::ChangeWatcher;

/// How long a terminated child gets to exit before the group is killed.
const GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Lifecycle states of the supervision loop. At most one child is alive at
/// any point; `Restarting` loops back to `Spawning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
	Idle,
	Spawning,
	Running,
	Exited,
	Restarting,
	Interrupted,
}

/// Everything the supervisor needs for one invocation. Resolution happens
/// once up front; only the child process restarts.
#[derive(Debug, Clone)]
pub struct RunSpec {
	/// Prefix for relayed output lines, normally the identifier as given.
	pub name: String,
	pub root: PathBuf,
	pub entry: EntrypointSpec,
	pub watch: bool,
}

/// Resolve and supervise a service until it exits or is interrupted.
///
/// Returns the invocation's exit code: the child's own code, or 0 for a
/// clean interrupted shutdown.
pub async fn run(cwd: &Path, identifier: &str, watch: bool) -> Result<i32, RunError> {
	let root = locate::find_service_root(cwd, identifier)
		.ok_or_else(|| RunError::RootNotFound(identifier.to_string()))?;
	let entry = locate::find_entrypoint(&root)
		.ok_or_else(|| RunError::EntrypointNotFound(identifier.to_string()))?;

	let spec = RunSpec {
		name: identifier.to_string(),
		root,
		entry,
		watch,
	};
	supervise(&spec).await
}

/// Supervise an already-resolved service.
pub async fn supervise(spec: &RunSpec) -> Result<i32, RunError> {
	transition(SupervisorState::Idle, SupervisorState::Spawning);

	if spec.watch {
		// Node services delegate the whole watch+restart cycle to nodemon
		// when it is installed; otherwise fall through to our own watcher.
		if spec.entry.interpreter == Interpreter::Node {
			if let Ok(nodemon) = which::which("nodemon") {
				return delegate_to_nodemon(&nodemon, spec).await;
			}
		}
		return supervise_watched(spec).await;
	}

	run_once(spec).await
}

// --- Single run, no watch ---

async fn run_once(spec: &RunSpec) -> Result<i32, RunError> {
	let mut child = spawn_child(spec)?;
	relay::attach(&mut child, &spec.name);
	transition(SupervisorState::Spawning, SupervisorState::Running);

	tokio::select! {
		status = child.wait() => {
			transition(SupervisorState::Running, SupervisorState::Exited);
			Ok(exit_code(status.map_err(RunError::Wait)?))
		}
		_ = tokio::signal::ctrl_c() => {
			transition(SupervisorState::Running, SupervisorState::Interrupted);
			interrupt_child(&mut child).await;
			println!("[{}] Shutting down.", spec.name);
			Ok(0)
		}
	}
}

// --- Watch mode ---

async fn supervise_watched(spec: &RunSpec) -> Result<i32, RunError> {
	let (restart_tx, mut restart_rx) = tokio::sync::watch::channel(());
	let _watcher = ChangeWatcher::arm(&spec.root, restart_tx)
		.map_err(|e| RunError::WatchUnavailable(e.to_string()))?;

	loop {
		// Anything raised while the previous child was shutting down
		// collapses into the restart that already happened.
		let _ = restart_rx.borrow_and_update();

		let mut child = spawn_child(spec)?;
		relay::attach(&mut child, &spec.name);
		transition(SupervisorState::Spawning, SupervisorState::Running);

		tokio::select! {
			status = child.wait() => {
				// Only a file event or interrupt restarts a running
				// process, never its own exit.
				transition(SupervisorState::Running, SupervisorState::Exited);
				return Ok(exit_code(status.map_err(RunError::Wait)?));
			}
			changed = restart_rx.changed() => {
				transition(SupervisorState::Running, SupervisorState::Restarting);
				if changed.is_err() {
					// Watcher gone; finish the current run unwatched.
					let status = child.wait().await.map_err(RunError::Wait)?;
					return Ok(exit_code(status));
				}
				terminate_child(&mut child).await?;
				println!("[{}] Restarting due to file change...", spec.name);
				transition(SupervisorState::Restarting, SupervisorState::Spawning);
			}
			_ = tokio::signal::ctrl_c() => {
				transition(SupervisorState::Running, SupervisorState::Interrupted);
				interrupt_child(&mut child).await;
				println!("[{}] Shutting down.", spec.name);
				return Ok(0);
			}
		}
	}
}

async fn delegate_to_nodemon(nodemon: &Path, spec: &RunSpec) -> Result<i32, RunError> {
	tracing::debug!("delegating watch mode to {}", nodemon.display());

	// nodemon owns restarts; its output goes straight to the terminal.
	let mut cmd = Command::new(nodemon);
	cmd.arg(&spec.entry.path).current_dir(&spec.root);
	#[cfg(unix)]
	cmd.process_group(0);

	let mut child = cmd.spawn().map_err(RunError::Spawn)?;
	transition(SupervisorState::Spawning, SupervisorState::Running);

	tokio::select! {
		status = child.wait() => {
			transition(SupervisorState::Running, SupervisorState::Exited);
			Ok(exit_code(status.map_err(RunError::Wait)?))
		}
		_ = tokio::signal::ctrl_c() => {
			transition(SupervisorState::Running, SupervisorState::Interrupted);
			interrupt_child(&mut child).await;
			println!("[{}] Shutting down.", spec.name);
			Ok(0)
		}
	}
}

// --- Process lifecycle ---

fn spawn_child(spec: &RunSpec) -> Result<Child, RunError> {
	let mut cmd = Command::new(&spec.entry.command);
	cmd.arg(&spec.entry.path)
		.current_dir(&spec.root)
		.stdout(Stdio::piped())
		.stderr(Stdio::piped());
	// Own process group so group signals reach any children it spawns.
	#[cfg(unix)]
	cmd.process_group(0);

	cmd.spawn().map_err(RunError::Spawn)
}

/// Graceful-then-forceful group termination, joining the child either way.
async fn terminate_child(child: &mut Child) -> Result<(), RunError> {
	signal_group(child, SignalIntent::Terminate);
	match tokio::time::timeout(GRACE_PERIOD, child.wait()).await {
		Ok(status) => {
			status.map_err(RunError::Wait)?;
		}
		Err(_) => {
			signal_group(child, SignalIntent::Kill);
			child.wait().await.map_err(RunError::Wait)?;
		}
	}
	Ok(())
}

/// Best-effort interrupt of the whole group, then join. Shutdown paths never
/// fail the invocation.
async fn interrupt_child(child: &mut Child) {
	signal_group(child, SignalIntent::Interrupt);
	if tokio::time::timeout(GRACE_PERIOD, child.wait()).await.is_err() {
		signal_group(child, SignalIntent::Kill);
		let _ = child.wait().await;
	}
}

fn exit_code(status: std::process::ExitStatus) -> i32 {
	// A signal death has no code; report a generic failure.
	status.code().unwrap_or(1)
}

fn transition(from: SupervisorState, to: SupervisorState) {
	tracing::debug!("supervisor: {:?} -> {:?}", from, to);
}
