//! Stability detection for files that may still be written.
//!
//! A file is stable once its size and modification time have stayed the
//! same for the quiet window and its last modification is at least the
//! minimum age in the past. Probing is read-only.

use std::io;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use tracing::debug;

use crate::config::StabilityConfig;

/// Size and modification time of a file at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub size: u64,
    pub modified: SystemTime,
}

/// Probe a path. `Ok(None)` means the file is gone (or is no longer a file).
pub fn probe(path: &Path) -> io::Result<Option<Fingerprint>> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(Some(Fingerprint {
            size: meta.len(),
            modified: meta.modified()?,
        })),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StabilityPolicy {
    pub quiet_window: Duration,
    pub min_age: Duration,
    pub check_interval: Duration,
    pub max_checks: u32,
}

impl From<&StabilityConfig> for StabilityPolicy {
    fn from(config: &StabilityConfig) -> Self {
        Self {
            quiet_window: config.quiet_window(),
            min_age: config.min_file_age(),
            check_interval: config.check_interval(),
            max_checks: config.max_checks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Stable(Fingerprint),
    /// Still changing after `max_checks` probes; retried on the next sweep.
    Unsettled,
    Vanished,
}

/// Running observation of one candidate file.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    fingerprint: Fingerprint,
    unchanged_since: Instant,
}

impl Observation {
    pub fn new(fingerprint: Fingerprint, at: Instant) -> Self {
        Self {
            fingerprint,
            unchanged_since: at,
        }
    }

    /// Record a fresh probe. Returns `true` once the file counts as stable.
    /// Any change restarts the quiet window.
    pub fn observe(
        &mut self,
        current: Fingerprint,
        at: Instant,
        wall_now: SystemTime,
        policy: &StabilityPolicy,
    ) -> bool {
        if current != self.fingerprint {
            self.fingerprint = current;
            self.unchanged_since = at;
            return false;
        }

        let quiet = at.saturating_duration_since(self.unchanged_since) >= policy.quiet_window;
        // An mtime in the future cannot be aged; the quiet window alone decides.
        let old_enough = match wall_now.duration_since(current.modified) {
            Ok(age) => age >= policy.min_age,
            Err(_) => true,
        };

        quiet && old_enough
    }
}

/// Re-probe `path` on a timer until it is stable, vanishes, or the check
/// budget runs out.
pub async fn await_stable(path: &Path, policy: &StabilityPolicy) -> io::Result<Verdict> {
    let first = match probe(path)? {
        Some(fp) => fp,
        None => return Ok(Verdict::Vanished),
    };
    let mut observation = Observation::new(first, Instant::now());

    for _ in 0..policy.max_checks {
        tokio::time::sleep(policy.check_interval).await;

        let current = match probe(path)? {
            Some(fp) => fp,
            None => return Ok(Verdict::Vanished),
        };
        if observation.observe(current, Instant::now(), SystemTime::now(), policy) {
            return Ok(Verdict::Stable(current));
        }
    }

    debug!(path = %path.display(), checks = policy.max_checks, "file did not settle");
    Ok(Verdict::Unsettled)
}
