//! Live reload.
//!
//! The open file's directory is polled once a second with notify's
//! [`PollWatcher`]. An event for the file only counts as a change when its
//! modification time first becomes readable or moves forward.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, SystemTime};

use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace};

/// How often the file is checked.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Last seen modification time of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModificationTracker {
    last: Option<SystemTime>,
}

impl ModificationTracker {
    pub const fn new(initial: Option<SystemTime>) -> Self {
        Self { last: initial }
    }

    pub const fn last(&self) -> Option<SystemTime> {
        self.last
    }

    /// Record `current`. Returns true if it counts as a change: the time is
    /// newer than the last one, or the first readable one.
    pub fn observe(&mut self, current: Option<SystemTime>) -> bool {
        match (current, self.last) {
            (Some(current), Some(last)) if current > last => {
                self.last = Some(current);
                true
            }
            (Some(current), None) => {
                self.last = Some(current);
                true
            }
            _ => false,
        }
    }
}

/// Modification time of `path`, if it can be read.
pub fn modification_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// Watches a single file for changes.
pub struct FileWatcher {
    _watcher: PollWatcher,
    rx: Receiver<notify::Result<Event>>,
    target_path: PathBuf,
    target_name: Option<OsString>,
    tracker: ModificationTracker,
}

impl FileWatcher {
    /// Watch `path` at [`POLL_INTERVAL`].
    ///
    /// # Errors
    /// Returns an error if the directory cannot be watched.
    pub fn new(path: impl AsRef<Path>) -> notify::Result<Self> {
        Self::with_interval(path, POLL_INTERVAL)
    }

    /// Watch `path`, polling every `interval`.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be watched.
    pub fn with_interval(path: impl AsRef<Path>, interval: Duration) -> notify::Result<Self> {
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = PollWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(interval),
        )?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;
        debug!(path = %target_path.display(), ?interval, "watching file");

        Ok(Self {
            _watcher: watcher,
            rx,
            tracker: ModificationTracker::new(modification_time(&target_path)),
            target_path,
            target_name,
        })
    }

    /// The canonical path of the file being watched.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Drain pending events. Returns true if the file changed since the last
    /// call.
    pub fn take_change_ready(&mut self) -> bool {
        let mut saw_relevant_event = false;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.is_relevant(&ev) => saw_relevant_event = true,
                Ok(ev) => trace!(kind = ?ev.kind, paths = ?ev.paths, "ignoring watch event"),
                Err(err) => debug!(%err, "watch error"),
            }
        }
        saw_relevant_event && self.tracker.observe(modification_time(&self.target_path))
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use std::time::Instant;
    use tempfile::tempdir;

    fn at(secs: u64) -> Option<SystemTime> {
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    #[test]
    fn test_tracker_fires_only_when_time_moves_forward() {
        let mut tracker = ModificationTracker::new(at(10));
        assert!(!tracker.observe(at(10)));
        assert!(!tracker.observe(at(5)));
        assert!(tracker.observe(at(11)));
        assert_eq!(tracker.last(), at(11));
        assert!(!tracker.observe(None));
        assert_eq!(tracker.last(), at(11));
    }

    #[test]
    fn test_tracker_fires_when_file_appears() {
        let mut tracker = ModificationTracker::new(None);
        assert!(!tracker.observe(None));
        assert!(tracker.observe(at(3)));
        assert!(!tracker.observe(at(3)));
    }

    #[test]
    fn test_watch_root_for_relative_file_is_dot() {
        let root = watch_root_for(Path::new("README.md"));
        assert_eq!(root, PathBuf::from("."));
    }

    #[test]
    fn test_sibling_events_are_ignored() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "hi").expect("write");
        let watcher = FileWatcher::with_interval(&path, Duration::from_millis(50)).expect("watcher");

        let sibling = Event {
            kind: EventKind::Any,
            paths: vec![dir.path().join("other.md")],
            attrs: notify::event::EventAttributes::new(),
        };
        assert!(!watcher.is_relevant(&sibling));

        let own = Event {
            kind: EventKind::Any,
            paths: vec![dir.path().join("doc.md")],
            attrs: notify::event::EventAttributes::new(),
        };
        assert!(watcher.is_relevant(&own));
    }

    #[test]
    fn test_real_file_modification_detected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("watched.md");
        std::fs::write(&path, "original").expect("write");

        let mut watcher =
            FileWatcher::with_interval(&path, Duration::from_millis(100)).expect("watcher");

        // coarse mtime filesystems need the write to land in a later second
        std::thread::sleep(Duration::from_millis(1100));
        std::fs::write(&path, "modified by another process").expect("write");

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut detected = false;
        while Instant::now() < deadline {
            if watcher.take_change_ready() {
                detected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(detected, "modification should be seen within 5 seconds");
        assert!(!watcher.take_change_ready());
    }
}
