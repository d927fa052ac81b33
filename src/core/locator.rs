// LogCutter - core/locator.rs
//
// Hybrid binary/linear search for the first line at or after an instant.
//
// Logs are appended in timestamp order but interleaved with lines that carry
// no timestamp at all. Pure binary search is unsound when a probed line may
// lack a timestamp; pure linear search is too slow on multi-gigabyte files.
// The locator binary-searches while the remaining window is wider than the
// crossover threshold, then scans the narrowed window linearly.
//
// Known limitation: the binary phase assumes timestamps never decrease.
// Out-of-order lines (clock skew, interleaved writers) can steer it into the
// wrong region; the linear phase only corrects within the final window.

use crate::util::constants;
use chrono::NaiveDateTime;
use std::cmp::Ordering;

/// Tuning for the hybrid search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Window size (lines) at or below which the search turns linear.
    pub crossover_threshold: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            crossover_threshold: constants::DEFAULT_CROSSOVER_THRESHOLD,
        }
    }
}

/// Locate the index of the first line whose timestamp is `>= target`.
///
/// `timestamp_of` extracts a raw line's instant (or `None` for
/// untimestamped lines). Returns `None` when no line qualifies, which callers must keep
/// distinct from index 0.
///
/// Binary phase, over the half-open window `[lo, hi)`:
/// - the probe starts at the midpoint and walks forward to the first
///   timestamped line; if it runs past the window, `[mid, hi)` holds no
///   timestamps and `hi` drops to the midpoint;
/// - equal: the probe is returned;
/// - less: `lo` moves past the probe;
/// - greater: `hi` moves to the midpoint and the probe is remembered, since
///   it is the best qualifying line seen and sits right after the window.
///
/// Linear phase: the first qualifying line in `[lo, hi)`, else the
/// remembered probe.
pub fn locate<S, F>(
    lines: &[S],
    target: NaiveDateTime,
    config: &SearchConfig,
    timestamp_of: F,
) -> Option<usize>
where
    S: AsRef<[u8]>,
    F: Fn(&[u8]) -> Option<NaiveDateTime>,
{
    let threshold = config
        .crossover_threshold
        .max(constants::MIN_CROSSOVER_THRESHOLD);

    let mut lo = 0usize;
    let mut hi = lines.len();
    let mut candidate: Option<usize> = None;
    let mut probes = 0usize;

    while hi - lo > threshold {
        let mid = lo + (hi - lo) / 2;
        let mut probe = mid;
        let mut instant = None;
        while probe < hi {
            instant = timestamp_of(lines[probe].as_ref());
            if instant.is_some() {
                break;
            }
            probe += 1;
        }
        probes += 1;

        let Some(instant) = instant else {
            // [mid, hi) holds no timestamps: only [lo, mid) can still hold
            // an earlier qualifying line than the remembered candidate.
            tracing::trace!(lo, mid, hi, "No timestamped line above the midpoint");
            hi = mid;
            continue;
        };

        match instant.cmp(&target) {
            Ordering::Equal => {
                tracing::trace!(index = probe, probes, "Exact timestamp hit");
                return Some(probe);
            }
            Ordering::Less => lo = probe + 1,
            Ordering::Greater => {
                candidate = Some(probe);
                hi = mid;
            }
        }
    }

    tracing::trace!(lo, hi, probes, "Switching to linear scan");

    lines[lo..hi]
        .iter()
        .position(|line| timestamp_of(line.as_ref()).is_some_and(|instant| instant >= target))
        .map(|offset| lo + offset)
        .or(candidate)
}
