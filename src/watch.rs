//! Watch mode: re-resolve a configuration when it or its content changes.
//!
//! The project root is watched recursively with debouncing. A change to the
//! config file, or to any path the last good configuration counts as
//! content, triggers a new resolution on a worker thread. A newer trigger
//! cancels the running resolution and waits for it before starting over, so
//! at most one resolution is ever in flight and cancelled results are never
//! published.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind};
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::config::{load_raw_config, LoadError};
use crate::error::ConfigError;
use crate::resolve::{ResolvedConfig, Resolver};

/// Default debounce window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Error during watch mode setup or event delivery
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(#[source] notify::Error),
    /// Failed to add watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(#[source] notify::Error),
    /// Event channel closed
    #[error("Watch channel error: {0}")]
    ChannelClosed(String),
    /// Resolution worker could not be started
    #[error("Failed to start resolution worker: {0}")]
    Spawn(#[source] std::io::Error),
    /// Project root not found
    #[error("Project root not found: {}", .0.display())]
    RootNotFound(PathBuf),
}

/// Options for watch mode
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    /// Configuration file to load on every resolution
    pub config_path: PathBuf,
    /// Project root; defaults to the config file's directory
    pub project_root: Option<PathBuf>,
    /// Debounce window for file system events
    pub debounce_ms: u64,
}

impl WatchOptions {
    /// Watch a configuration file with default settings
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self { config_path: config_path.into(), project_root: None, debounce_ms: DEFAULT_DEBOUNCE_MS }
    }

    /// Set an explicit project root
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    /// Set the debounce window
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// Effective project root
    pub fn root(&self) -> PathBuf {
        match &self.project_root {
            Some(root) => root.clone(),
            None => self
                .config_path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// Outcome of one resolution, delivered to the sink
#[derive(Debug)]
pub enum WatchEvent {
    /// Resolution succeeded
    Resolved {
        /// The new configuration
        config: Arc<ResolvedConfig>,
        /// Time spent loading and resolving
        duration: Duration,
    },
    /// Loading or resolution failed; watching continues
    BuildFailed {
        /// What went wrong
        error: LoadError,
        /// Time spent before failing
        duration: Duration,
    },
}

enum Message {
    Fs(DebounceEventResult),
    Done { generation: u64, outcome: Result<ResolvedConfig, LoadError>, duration: Duration },
}

struct InFlight {
    generation: u64,
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

/// Runs resolutions one at a time on a worker thread.
struct ResolutionRunner {
    resolver: Resolver,
    config_path: PathBuf,
    project_root: PathBuf,
    tx: Sender<Message>,
    generation: u64,
    in_flight: Option<InFlight>,
}

impl ResolutionRunner {
    /// Cancel and join any running resolution, then start a new one.
    fn trigger(&mut self) -> Result<(), WatchError> {
        self.stop();

        self.generation += 1;
        let generation = self.generation;
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let resolver = self.resolver.clone();
        let config_path = self.config_path.clone();
        let project_root = self.project_root.clone();
        let tx = self.tx.clone();

        let handle = thread::Builder::new()
            .name("windconf-resolve".into())
            .spawn(move || {
                let start = Instant::now();
                let outcome = load_raw_config(&config_path).and_then(|raw| {
                    resolver
                        .resolve_with_cancel(&raw, &project_root, &worker_cancel)
                        .map_err(LoadError::from)
                });
                // The loop may already be gone.
                let _ = tx.send(Message::Done { generation, outcome, duration: start.elapsed() });
            })
            .map_err(WatchError::Spawn)?;

        self.in_flight = Some(InFlight { generation, cancel, handle });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(running) = self.in_flight.take() {
            running.cancel.cancel();
            if running.handle.join().is_err() {
                tracing::warn!(generation = running.generation, "resolution worker panicked");
            }
        }
    }

    /// Accept a finished run if it is the latest and was not cancelled.
    fn finish(&mut self, generation: u64) -> bool {
        let Some(running) = self.in_flight.as_ref().filter(|r| r.generation == generation) else {
            return false;
        };
        let cancelled = running.cancel.is_cancelled();
        self.stop();
        !cancelled
    }
}

impl Drop for ResolutionRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Format duration for display
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Check if a changed path should trigger a new resolution
fn is_relevant(path: &Path, config_path: &Path, last_good: Option<&ResolvedConfig>) -> bool {
    path == config_path || last_good.is_some_and(|config| config.matches(path))
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Watch a configuration and its content, re-resolving on change.
///
/// Resolves once at startup, then after every relevant debounced change.
/// Each outcome is handed to `sink`; returning [`ControlFlow::Break`] stops
/// watching. Failed resolutions are reported and never end the loop.
///
/// # Example
/// ```ignore
/// let options = WatchOptions::new("tailwind.config.js");
/// watch_and_resolve(options, Resolver::default(), |event| {
///     if let WatchEvent::Resolved { config, .. } = event {
///         engine.reload(config);
///     }
///     ControlFlow::Continue(())
/// })?;
/// ```
pub fn watch_and_resolve<F>(
    options: WatchOptions,
    resolver: Resolver,
    mut sink: F,
) -> Result<(), WatchError>
where
    F: FnMut(WatchEvent) -> ControlFlow<()>,
{
    let root = options.root();
    if !root.is_dir() {
        return Err(WatchError::RootNotFound(root));
    }
    let root = canonical(&root);
    let config_path = canonical(&options.config_path);

    let (tx, rx) = channel();
    let fs_tx = tx.clone();
    let debounce = Duration::from_millis(options.debounce_ms);
    let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
        let _ = fs_tx.send(Message::Fs(result));
    })
    .map_err(WatchError::WatcherInit)?;
    debouncer.watcher().watch(&root, RecursiveMode::Recursive).map_err(WatchError::WatchPath)?;

    let mut runner = ResolutionRunner {
        resolver,
        config_path: config_path.clone(),
        project_root: root.clone(),
        tx,
        generation: 0,
        in_flight: None,
    };
    let mut last_good: Option<Arc<ResolvedConfig>> = None;

    tracing::info!(config = %config_path.display(), root = %root.display(), "watching for changes");
    runner.trigger()?;

    loop {
        let message = rx.recv().map_err(|e| WatchError::ChannelClosed(e.to_string()))?;
        match message {
            Message::Fs(Ok(events)) => {
                let changed: Vec<&PathBuf> = events
                    .iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                    .map(|e| &e.path)
                    .filter(|path| is_relevant(path, &config_path, last_good.as_deref()))
                    .collect();

                if !changed.is_empty() {
                    for path in &changed {
                        tracing::debug!(path = %path.display(), "changed");
                    }
                    runner.trigger()?;
                }
            }
            Message::Fs(Err(error)) => {
                tracing::warn!("watch error: {:?}; continuing", error);
            }
            Message::Done { generation, outcome, duration } => {
                if !runner.finish(generation) {
                    tracing::debug!(generation, "discarding superseded resolution");
                    continue;
                }

                let event = match outcome {
                    Ok(config) => {
                        let config = Arc::new(config);
                        tracing::info!("resolved in {}", format_duration(duration));
                        last_good = Some(Arc::clone(&config));
                        WatchEvent::Resolved { config, duration }
                    }
                    Err(LoadError::Config(ConfigError::Cancelled)) => continue,
                    Err(error) => {
                        tracing::error!("resolution failed after {}: {}", format_duration(duration), error);
                        WatchEvent::BuildFailed { error, duration }
                    }
                };

                if sink(event).is_break() {
                    return Ok(());
                }
            }
        }
    }
}
