//! Waiting for the downloader's output to settle before scanning.

use std::thread;
use std::time::{Duration, Instant};

use crate::config::SettlePolicy;
use crate::discovery::FileStamp;
use crate::error::CoreResult;

/// What the settle step ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleResult {
    Skipped,
    Waited(Duration),
    /// Two consecutive snapshots matched after `polls` snapshots.
    Stable { polls: u32 },
    TimedOut { waited: Duration },
}

/// Applies `policy`, calling `snapshot` to observe the candidate set when
/// polling for stability.
///
/// A snapshot error ends polling early; the scan that follows will report it.
pub fn wait_for_settle<F>(policy: SettlePolicy, mut snapshot: F) -> SettleResult
where
    F: FnMut() -> CoreResult<Vec<FileStamp>>,
{
    match policy {
        SettlePolicy::None => SettleResult::Skipped,
        SettlePolicy::Fixed(delay) => {
            thread::sleep(delay);
            SettleResult::Waited(delay)
        }
        SettlePolicy::UntilStable { interval, timeout } => {
            poll_until_stable(interval, timeout, &mut snapshot)
        }
    }
}

fn poll_until_stable<F>(interval: Duration, timeout: Duration, snapshot: &mut F) -> SettleResult
where
    F: FnMut() -> CoreResult<Vec<FileStamp>>,
{
    let start = Instant::now();
    let mut polls = 1;
    let mut previous = match snapshot() {
        Ok(stamps) => stamps,
        Err(e) => {
            log::debug!("Settle snapshot failed: {e}");
            return SettleResult::Waited(start.elapsed());
        }
    };

    loop {
        let remaining = timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            return SettleResult::TimedOut {
                waited: start.elapsed(),
            };
        }
        thread::sleep(interval.min(remaining));

        polls += 1;
        let current = match snapshot() {
            Ok(stamps) => stamps,
            Err(e) => {
                log::debug!("Settle snapshot failed: {e}");
                return SettleResult::Waited(start.elapsed());
            }
        };
        if current == previous {
            return SettleResult::Stable { polls };
        }
        previous = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn stamp(size: u64) -> FileStamp {
        FileStamp {
            path: PathBuf::from("a.flac"),
            size,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_none_and_fixed() {
        let mut calls = 0;
        assert_eq!(
            wait_for_settle(SettlePolicy::None, || {
                calls += 1;
                Ok(Vec::new())
            }),
            SettleResult::Skipped
        );
        assert_eq!(calls, 0);

        let delay = Duration::from_millis(5);
        let start = Instant::now();
        assert_eq!(
            wait_for_settle(SettlePolicy::Fixed(delay), || Ok(Vec::new())),
            SettleResult::Waited(delay)
        );
        assert!(start.elapsed() >= delay);
    }

    #[test]
    fn test_stable_after_sizes_stop_growing() {
        let mut sizes = [10, 20, 30, 30].into_iter();
        let policy = SettlePolicy::UntilStable {
            interval: Duration::from_millis(1),
            timeout: Duration::from_secs(10),
        };
        let result = wait_for_settle(policy, || Ok(vec![stamp(sizes.next().unwrap_or(30))]));
        assert_eq!(result, SettleResult::Stable { polls: 4 });
    }

    #[test]
    fn test_times_out_when_always_changing() {
        let mut size = 0;
        let policy = SettlePolicy::UntilStable {
            interval: Duration::from_millis(2),
            timeout: Duration::from_millis(20),
        };
        let result = wait_for_settle(policy, || {
            size += 1;
            Ok(vec![stamp(size)])
        });
        match result {
            SettleResult::TimedOut { waited } => assert!(waited >= Duration::from_millis(20)),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_error_stops_polling() {
        let policy = SettlePolicy::UntilStable {
            interval: Duration::from_millis(1),
            timeout: Duration::from_secs(10),
        };
        let result = wait_for_settle(policy, || Err(CoreError::Config("boom".to_string())));
        assert!(matches!(result, SettleResult::Waited(_)));
    }
}
