use tokio::process::Child;

/// What the supervisor wants a signal to achieve. Keeps the state machine
/// platform-agnostic; the platform mapping lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalIntent {
	/// Operator interrupt (Ctrl-C equivalent), delivered group-wide so
	/// nested children see it too.
	Interrupt,
	/// Graceful shutdown request.
	Terminate,
	/// Forceful kill after the grace period.
	Kill,
}

/// Signal the child's entire process group.
///
/// The child is spawned with `process_group(0)`, so its pid doubles as the
/// group id and descendants it spawned receive the signal as well.
#[cfg(unix)]
pub fn signal_group(child: &mut Child, intent: SignalIntent) {
	use nix::sys::signal::{killpg, Signal};
	use nix::unistd::Pid;

	let Some(pid) = child.id() else {
		// Already reaped, nothing to signal.
		return;
	};
	let sig = match intent {
		SignalIntent::Interrupt => Signal::SIGINT,
		SignalIntent::Terminate => Signal::SIGTERM,
		SignalIntent::Kill => Signal::SIGKILL,
	};
	if let Err(e) = killpg(Pid::from_raw(pid as i32), sig) {
		tracing::debug!("killpg({}, {:?}) failed: {}", pid, sig, e);
	}
}

/// No process groups here; kill the direct child only.
#[cfg(not(unix))]
pub fn signal_group(child: &mut Child, _intent: SignalIntent) {
	let _ = child.start_kill();
}
