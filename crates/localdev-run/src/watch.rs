use notify::event::{CreateKind, RemoveKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;

/// Recursive filesystem watch over a service root.
///
/// Every mutation of a non-directory entry sends on the restart channel —
/// no extension filtering, no content diffing. The channel is single-slot,
/// so rapid event bursts collapse into one pending restart.
///
/// Armed once per invocation and kept alive across restarts of the
/// supervised process; dropping the watcher tears the watch down.
pub struct ChangeWatcher {
	_watcher: RecommendedWatcher,
}

impl ChangeWatcher {
	pub fn arm(
		root: &Path,
		restart: tokio::sync::watch::Sender<()>,
	) -> Result<Self, notify::Error> {
		// notify callbacks run on a notify-internal thread; the watch channel
		// is the only thing shared with the supervision loop.
		let mut watcher = RecommendedWatcher::new(
			move |res: Result<Event, notify::Error>| match res {
				Ok(event) => {
					if is_significant(&event) {
						let _ = restart.send(());
					}
				}
				Err(e) => {
					tracing::warn!("file watch error: {}", e);
				}
			},
			Config::default(),
		)?;
		watcher.watch(root, RecursiveMode::Recursive)?;
		Ok(Self { _watcher: watcher })
	}
}

fn is_significant(event: &Event) -> bool {
	match &event.kind {
		EventKind::Access(_) => false,
		EventKind::Create(CreateKind::Folder) => false,
		EventKind::Remove(RemoveKind::Folder) => false,
		_ => event.paths.iter().any(|p| !p.is_dir()),
	}
}
