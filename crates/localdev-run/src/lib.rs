//! # localdev-run
//!
//! Foreground service supervisor for the `localdev` CLI.
//!
//! Resolve a service's root directory and entrypoint, spawn it as a child
//! process in its own process group, stream its output line by line, and —
//! in watch mode — restart it whenever a file under the root changes.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use localdev_run::run;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cwd = std::env::current_dir().unwrap();
//! match run(&cwd, "gateway", false).await {
//!     Ok(code) => std::process::exit(code),
//!     Err(e) => {
//!         eprintln!("error: {}", e);
//!         std::process::exit(e.exit_code());
//!     }
//! }
//! # }
//! ```

pub mod error;
pub mod locate;
pub mod relay;
pub mod signal;
pub mod supervisor;
pub mod watch;

pub use error::RunError;
pub use locate::{find_entrypoint, find_service_root, EntrypointSpec, Interpreter, ServiceMeta};
pub use signal::{signal_group, SignalIntent};
pub use supervisor::{run, supervise, RunSpec};
pub use watch::ChangeWatcher;
