//! # Save Policy
//!
//! Decides when the tally hits the disk.
//!
//! - `EveryKey`: rewrite the file after each counted press.
//! - `Interval(d)`: a background task flushes every `d`, skipping the write
//!   when nothing changed since the last save.
//!
//! Either way a final flush happens on exit, so the persisted tally is
//! eventually correct.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::core::tally::{Tally, TallyError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SavePolicy {
    #[default]
    EveryKey,
    Interval(Duration),
}

impl SavePolicy {
    /// `0` seconds means save on every key.
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            SavePolicy::EveryKey
        } else {
            SavePolicy::Interval(Duration::from_secs(secs))
        }
    }
}

pub struct Saver {
    tally: Arc<Tally>,
    path: PathBuf,
    policy: SavePolicy,
    /// Revision of the last successful save.
    saved_revision: AtomicU64,
}

impl Saver {
    pub fn new(tally: Arc<Tally>, path: PathBuf, policy: SavePolicy) -> Self {
        let saved_revision = AtomicU64::new(tally.revision());
        Self {
            tally,
            path,
            policy,
            saved_revision,
        }
    }

    pub fn tally(&self) -> &Arc<Tally> {
        &self.tally
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Called by the capture loop after each counted press.
    pub fn after_increment(&self) {
        if self.policy == SavePolicy::EveryKey
            && let Err(e) = self.flush_now()
        {
            warn!("Failed to save tally to {}: {}", self.path.display(), e);
        }
    }

    /// Saves only if the tally changed since the last successful save.
    /// Returns whether a write happened.
    pub fn flush(&self) -> Result<bool, TallyError> {
        if self.tally.revision() == self.saved_revision.load(Ordering::Acquire) {
            return Ok(false);
        }
        self.flush_now()?;
        Ok(true)
    }

    /// Saves unconditionally.
    pub fn flush_now(&self) -> Result<(), TallyError> {
        let revision = self.tally.save(&self.path)?;
        self.saved_revision.fetch_max(revision, Ordering::AcqRel);
        Ok(())
    }
}

/// Spawns the background flusher for `SavePolicy::Interval`.
/// Runs until aborted.
pub fn spawn_periodic(saver: Arc<Saver>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match saver.flush() {
                Ok(true) => debug!("Periodic save to {}", saver.path().display()),
                Ok(false) => {}
                Err(e) => warn!("Periodic save to {} failed: {}", saver.path().display(), e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn saver_in(dir: &Path, policy: SavePolicy) -> Saver {
        Saver::new(Arc::new(Tally::new()), dir.join("key_counts.json"), policy)
    }

    #[test]
    fn test_from_secs_zero_is_every_key() {
        assert_eq!(SavePolicy::from_secs(0), SavePolicy::EveryKey);
        assert_eq!(
            SavePolicy::from_secs(5),
            SavePolicy::Interval(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_every_key_writes_after_increment() {
        let dir = tempdir().unwrap();
        let saver = saver_in(dir.path(), SavePolicy::EveryKey);
        saver.tally().increment("a");
        saver.after_increment();
        assert_eq!(fs::read_to_string(saver.path()).unwrap(), "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn test_interval_policy_defers_writes() {
        let dir = tempdir().unwrap();
        let saver = saver_in(dir.path(), SavePolicy::Interval(Duration::from_secs(60)));
        saver.tally().increment("a");
        saver.after_increment();
        assert!(!saver.path().exists());

        assert!(saver.flush().unwrap());
        assert!(saver.path().exists());
    }

    #[test]
    fn test_flush_skips_when_unchanged() {
        let dir = tempdir().unwrap();
        let saver = saver_in(dir.path(), SavePolicy::EveryKey);
        assert!(!saver.flush().unwrap());
        assert!(!saver.path().exists());

        saver.tally().increment("x");
        assert!(saver.flush().unwrap());
        assert!(!saver.flush().unwrap());
    }

    #[test]
    fn test_save_failure_does_not_panic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blocked");
        fs::create_dir(&path).unwrap();
        fs::create_dir(dir.path().join("blocked.tmp")).unwrap();

        let saver = Saver::new(Arc::new(Tally::new()), path, SavePolicy::EveryKey);
        saver.tally().increment("a");
        saver.after_increment();
        assert!(saver.flush().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_flush_writes_changes() {
        let dir = tempdir().unwrap();
        let saver = Arc::new(saver_in(dir.path(), SavePolicy::Interval(Duration::from_secs(5))));
        let handle = spawn_periodic(Arc::clone(&saver), Duration::from_secs(5));

        saver.tally().increment("k");
        tokio::time::sleep(Duration::from_secs(6)).await;
        handle.abort();

        let restored = Tally::new();
        restored.load(saver.path()).unwrap();
        assert_eq!(restored.count("k"), 1);
    }
}
