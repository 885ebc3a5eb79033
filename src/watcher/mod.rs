//! Filesystem watching: turns raw `notify` events for a workspace root into
//! debounced, directory-batched [`WorkspaceEvent`]s the engine can act on
//! (reload the touched file, invalidate the resolver).
//!
//! Debouncing exists because editors and `go fmt`-style tools tend to emit
//! several events per save (truncate, write, rename-into-place); without
//! it the engine would re-parse and rebuild the symbol table several times
//! per keystroke-adjacent save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{GorefactorError, Result};

/// What happened to a file, after debouncing collapses a burst of raw
/// `notify` events down to the event kind that matters to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

#[derive(Debug, Clone)]
pub struct WorkspaceEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// A batch of debounced events for one tick, grouped by directory so a
/// caller can invalidate one package at a time instead of the whole
/// workspace when only one directory changed.
#[derive(Debug, Clone, Default)]
pub struct EventBatch {
    pub by_dir: HashMap<PathBuf, Vec<WorkspaceEvent>>,
}

impl EventBatch {
    pub fn is_empty(&self) -> bool {
        self.by_dir.values().all(Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.by_dir.values().map(Vec::len).sum()
    }
}

/// Owns a background `notify` watcher and a debounce thread. Dropping this
/// stops both threads: `_watcher` stops watching when dropped, and the
/// debounce thread exits once the raw-event channel it reads from closes.
pub struct WorkspaceWatcher {
    _watcher: RecommendedWatcher,
    batches: Receiver<EventBatch>,
    debounce_thread: Option<JoinHandle<()>>,
}

impl WorkspaceWatcher {
    /// Starts watching `root` recursively, debouncing raw events for
    /// `debounce` before emitting a batch on the returned watcher's
    /// [`Self::recv`]/[`Self::try_recv`].
    pub fn spawn(root: &Path, debounce: Duration, should_watch: impl Fn(&Path) -> bool + Send + 'static) -> Result<Self> {
        let (raw_tx, raw_rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = raw_tx.send(res);
        })
        .map_err(notify_error)?;
        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(notify_error)?;

        let (batch_tx, batch_rx) = mpsc::channel();
        let debounce_thread = std::thread::spawn(move || debounce_loop(raw_rx, batch_tx, debounce, should_watch));

        Ok(Self {
            _watcher: watcher,
            batches: batch_rx,
            debounce_thread: Some(debounce_thread),
        })
    }

    /// Blocks until the next debounced batch, or returns `None` once the
    /// watcher has shut down.
    pub fn recv(&self) -> Option<EventBatch> {
        self.batches.recv().ok()
    }

    pub fn try_recv(&self) -> Option<EventBatch> {
        self.batches.try_recv().ok()
    }
}

impl Drop for WorkspaceWatcher {
    fn drop(&mut self) {
        if let Some(handle) = self.debounce_thread.take() {
            let _ = handle.join();
        }
    }
}

fn notify_error(e: notify::Error) -> GorefactorError {
    GorefactorError::invalid(format!("filesystem watcher failed: {e}"))
}

/// Collects raw events into a per-path "last write wins" map, flushing a
/// batch whenever `debounce` elapses since the most recent event with no
/// further event for that path arriving in the meantime.
fn debounce_loop(
    raw_rx: Receiver<notify::Result<Event>>,
    batch_tx: Sender<EventBatch>,
    debounce: Duration,
    should_watch: impl Fn(&Path) -> bool,
) {
    let mut pending: HashMap<PathBuf, (ChangeKind, Instant)> = HashMap::new();

    loop {
        let timeout = next_timeout(&pending, debounce);
        match raw_rx.recv_timeout(timeout) {
            Ok(Ok(event)) => {
                if let Some(kind) = classify(&event.kind) {
                    for path in event.paths {
                        if should_watch(&path) {
                            pending.insert(path, (kind, Instant::now()));
                        }
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "filesystem watcher reported an error");
            }
            Err(RecvTimeoutError::Timeout) => {
                flush_ready(&mut pending, debounce, &batch_tx);
            }
            Err(RecvTimeoutError::Disconnected) => {
                flush_ready(&mut pending, Duration::ZERO, &batch_tx);
                return;
            }
        }
    }
}

fn next_timeout(pending: &HashMap<PathBuf, (ChangeKind, Instant)>, debounce: Duration) -> Duration {
    pending
        .values()
        .map(|(_, seen_at)| debounce.saturating_sub(seen_at.elapsed()))
        .min()
        .unwrap_or(debounce)
}

fn flush_ready(pending: &mut HashMap<PathBuf, (ChangeKind, Instant)>, debounce: Duration, batch_tx: &Sender<EventBatch>) {
    let ready: Vec<PathBuf> = pending
        .iter()
        .filter(|(_, (_, seen_at))| seen_at.elapsed() >= debounce)
        .map(|(path, _)| path.clone())
        .collect();
    if ready.is_empty() {
        return;
    }

    let mut batch = EventBatch::default();
    for path in ready {
        let Some((kind, _)) = pending.remove(&path) else {
            continue;
        };
        let dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        batch.by_dir.entry(dir).or_default().push(WorkspaceEvent { path, kind });
    }
    if batch_tx.send(batch).is_err() {
        tracing::debug!("event batch receiver dropped; watcher shutting down");
    }
}

fn classify(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_reports_its_length() {
        let mut batch = EventBatch::default();
        batch.by_dir.insert(
            PathBuf::from("/ws"),
            vec![WorkspaceEvent {
                path: PathBuf::from("/ws/main.go"),
                kind: ChangeKind::Modified,
            }],
        );
        assert_eq!(batch.len(), 1);
        assert!(!batch.is_empty());
    }

    #[test]
    fn empty_batch_reports_empty() {
        assert!(EventBatch::default().is_empty());
    }

    #[test]
    fn classifies_notify_event_kinds() {
        assert_eq!(classify(&EventKind::Create(notify::event::CreateKind::File)), Some(ChangeKind::Created));
        assert_eq!(classify(&EventKind::Remove(notify::event::RemoveKind::File)), Some(ChangeKind::Removed));
        assert_eq!(classify(&EventKind::Access(notify::event::AccessKind::Any)), None);
    }

    #[test]
    fn debounce_collapses_a_burst_into_one_event_per_path() {
        let (raw_tx, raw_rx) = mpsc::channel();
        let (batch_tx, batch_rx) = mpsc::channel();
        let handle = std::thread::spawn(move || {
            debounce_loop(raw_rx, batch_tx, Duration::from_millis(30), |_| true);
        });

        let path = PathBuf::from("/ws/main.go");
        for _ in 0..3 {
            raw_tx
                .send(Ok(Event::new(EventKind::Modify(notify::event::ModifyKind::Any)).add_path(path.clone())))
                .unwrap();
        }
        drop(raw_tx);

        let batch = batch_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(batch.len(), 1);
        handle.join().unwrap();
    }
}
