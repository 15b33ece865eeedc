//! Active line lookup over a sorted lyric sequence.

use super::parser::LyricLine;

/// Index of the line that should be highlighted at `current_ms`.
///
/// Returns the greatest `i` with `lines[i].time_ms <= current_ms`, clamped to
/// `0` before the first timestamp. `None` only when `lines` is empty.
/// Binary search, so a non-decreasing sequence of times always yields a
/// non-decreasing sequence of indices.
pub fn locate(lines: &[LyricLine], current_ms: u64) -> Option<usize> {
    if lines.is_empty() {
        return None;
    }
    let idx = lines.partition_point(|l| l.time_ms <= current_ms);
    Some(idx.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<LyricLine> {
        [1000, 2500, 4000, 9000]
            .into_iter()
            .map(|t| LyricLine::new(t, format!("t{t}")))
            .collect()
    }

    #[test]
    fn test_empty_returns_none() {
        assert_eq!(locate(&[], 0), None);
        assert_eq!(locate(&[], 123_456), None);
    }

    #[test]
    fn test_before_first_clamps_to_zero() {
        let lines = sample();
        assert_eq!(locate(&lines, 0), Some(0));
        assert_eq!(locate(&lines, 999), Some(0));
    }

    #[test]
    fn test_exact_and_between() {
        let lines = sample();
        assert_eq!(locate(&lines, 1000), Some(0));
        assert_eq!(locate(&lines, 2499), Some(0));
        assert_eq!(locate(&lines, 2500), Some(1));
        assert_eq!(locate(&lines, 8999), Some(2));
        assert_eq!(locate(&lines, 9000), Some(3));
        assert_eq!(locate(&lines, u64::MAX), Some(3));
    }

    #[test]
    fn test_monotonic_over_increasing_time() {
        let lines = sample();
        let mut last = 0;
        for t in (0..12_000).step_by(37) {
            let idx = locate(&lines, t).unwrap();
            assert!(idx >= last, "index went backwards at {t}");
            last = idx;
        }
        assert_eq!(last, 3);
    }
}
