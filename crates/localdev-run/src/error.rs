use std::io;
use thiserror::Error;

/// Everything that can go wrong while resolving and supervising a service.
///
/// Child processes exiting non-zero are not errors — their exit code becomes
/// the invocation's result. These variants cover the supervisor's own
/// failures, each with a distinct exit code.
#[derive(Debug, Error)]
pub enum RunError {
	#[error("could not find service root for '{0}'")]
	RootNotFound(String),

	#[error("no entrypoint found for service '{0}'")]
	EntrypointNotFound(String),

	/// Watch mode was requested but neither nodemon nor a working file
	/// watcher is available. Never degrades to an unwatched run.
	#[error("--watch requires a working file watcher or nodemon on PATH: {0}")]
	WatchUnavailable(String),

	#[error("failed to spawn service process: {0}")]
	Spawn(#[source] io::Error),

	#[error("failed waiting on service process: {0}")]
	Wait(#[source] io::Error),
}

impl RunError {
	pub fn exit_code(&self) -> i32 {
		match self {
			RunError::RootNotFound(_) => 2,
			RunError::EntrypointNotFound(_) => 3,
			RunError::WatchUnavailable(_) => 4,
			RunError::Spawn(_) | RunError::Wait(_) => 1,
		}
	}
}
