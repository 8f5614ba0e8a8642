use crate::config::{CompareConfig, ScanErrorPolicy};
use crate::diff;
use crate::error::Error;
use crate::sync::{self, ApplyReport};
use crate::vcs::VersionControl;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// The last poll found nothing to do; repeated no-ops stay quiet.
    Idle,
    /// The last poll synced something, or no poll has run yet.
    Active,
}

#[derive(Debug)]
pub enum TickOutcome {
    /// Changes were applied and a snapshot was requested.
    Synced { report: ApplyReport, bucket: i64 },
    /// First poll without changes after activity.
    NowSynced,
    /// Still nothing to do.
    Unchanged,
}

/// Snapshot identifier: whole intervals elapsed since the epoch.
pub fn commit_bucket(now: DateTime<Utc>, interval: Duration) -> i64 {
    let interval_millis = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX).max(1);
    now.timestamp_millis().div_euclid(interval_millis)
}

pub fn commit_message(bucket: i64) -> String {
    format!("autosave #{}", bucket)
}

/// Fixed grid of tick deadlines measured from the loop start.
///
/// Deadlines that passed while a tick was still running are skipped, so
/// ticks never overlap and never pile up.
#[derive(Debug, Clone)]
pub struct Schedule {
    start: Instant,
    interval: Duration,
    ticks: u128,
}

impl Schedule {
    pub fn new(start: Instant, interval: Duration) -> Self {
        Self {
            start,
            interval,
            ticks: 0,
        }
    }

    /// First grid point strictly after `now`.
    pub fn next_deadline(&mut self, now: Instant) -> Instant {
        let interval_nanos = self.interval.as_nanos().max(1);
        let elapsed = now.saturating_duration_since(self.start).as_nanos();
        let next = elapsed / interval_nanos + 1;

        if next > self.ticks + 1 {
            debug!("Skipped {} overdue ticks", next - self.ticks - 1);
        }
        self.ticks = next;

        let offset = u64::try_from(next * interval_nanos).unwrap_or(u64::MAX);
        self.start + Duration::from_nanos(offset)
    }
}

pub struct Poller<V: VersionControl> {
    source: PathBuf,
    dest: PathBuf,
    config: CompareConfig,
    interval: Duration,
    scan_errors: ScanErrorPolicy,
    vcs: V,
    state: LoopState,
}

impl<V: VersionControl> Poller<V> {
    pub fn new(
        source: &Path,
        dest: &Path,
        config: CompareConfig,
        interval: Duration,
        vcs: V,
    ) -> Self {
        Self {
            source: source.to_path_buf(),
            dest: dest.to_path_buf(),
            config,
            interval,
            scan_errors: ScanErrorPolicy::default(),
            vcs,
            state: LoopState::Active,
        }
    }

    pub fn with_scan_error_policy(mut self, policy: ScanErrorPolicy) -> Self {
        self.scan_errors = policy;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// One poll: diff, and when anything differs apply and snapshot.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<TickOutcome, Error> {
        let active = self.state == LoopState::Active;

        if active {
            info!("Comparing files...");
        }
        let diff = diff::diff_trees(&self.source, &self.dest, &self.config)?;
        if active {
            info!("Comparing files done!");
        }

        if !diff.is_changed() {
            if !active {
                return Ok(TickOutcome::Unchanged);
            }
            info!("Checking folders...");
            info!("Folders already synced, do nothing.");
            self.state = LoopState::Idle;
            return Ok(TickOutcome::NowSynced);
        }

        self.state = LoopState::Active;

        info!("Checking folders...");
        info!(
            "Syncing '{}' to '{}'...",
            self.source.display(),
            self.dest.display()
        );
        let report = sync::apply(&diff, &self.config);
        info!("Sync of folders done!");

        let bucket = commit_bucket(now, self.interval);
        self.vcs.add(".");
        self.vcs.commit(&commit_message(bucket), false);

        Ok(TickOutcome::Synced { report, bucket })
    }

    /// Tick, applying the scan error policy to a failed tick.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Result<Option<TickOutcome>, Error> {
        match self.tick(now) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(err) => match self.scan_errors {
                ScanErrorPolicy::Retry => {
                    error!("Comparing files failed, retrying next tick: {}", err);
                    Ok(None)
                }
                ScanErrorPolicy::Abort => Err(err),
            },
        }
    }

    /// Poll forever on a fixed grid starting now. Only returns on an error
    /// under [`ScanErrorPolicy::Abort`].
    pub fn run(&mut self) -> Result<(), Error> {
        let mut schedule = Schedule::new(Instant::now(), self.interval);
        loop {
            self.poll(Utc::now())?;
            let deadline = schedule.next_deadline(Instant::now());
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
        }
    }
}
