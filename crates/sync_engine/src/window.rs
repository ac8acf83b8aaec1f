//! Sample-grid helpers: counter alignment across IMU sensors and trial crop windows.

use std::ops::Range;

use contracts::Vector3;

/// Common counter range `[first, last]` of several strictly increasing counter vectors
pub fn common_counter_range<'a>(counters: impl IntoIterator<Item = &'a [u32]>) -> Option<(u32, u32)> {
    let mut range: Option<(u32, u32)> = None;
    for c in counters {
        let (&first, &last) = (c.first()?, c.last()?);
        range = Some(match range {
            None => (first, last),
            Some((lo, hi)) => (lo.max(first), hi.min(last)),
        });
    }
    range.filter(|(lo, hi)| lo <= hi)
}

/// Place `values` on the row grid `first..=last`; rows without a sample get `fill`
pub fn place_on_grid<T: Copy>(counters: &[u32], values: &[T], (first, last): (u32, u32), fill: T) -> Vec<T> {
    let mut grid = vec![fill; (last - first) as usize + 1];
    for (&counter, value) in counters.iter().zip(values) {
        if (first..=last).contains(&counter) {
            grid[(counter - first) as usize] = *value;
        }
    }
    grid
}

pub fn place_vectors(counters: &[u32], values: &[Vector3], range: (u32, u32)) -> Vec<Vector3> {
    place_on_grid(counters, values, range, Vector3::NAN)
}

/// Rows kept around `origin`: `padding_s` before it, `duration_s + padding_s` after it
///
/// Clamped to the stream; without a duration the window runs to the end.
pub fn crop_window(
    len: usize,
    origin: usize,
    rate_hz: f64,
    duration_s: Option<f64>,
    padding_s: f64,
) -> Range<usize> {
    let before = (padding_s * rate_hz).round() as usize;
    let start = origin.saturating_sub(before).min(len);
    let end = match duration_s {
        Some(duration) => {
            let after = ((duration + padding_s) * rate_hz).round() as usize;
            origin.saturating_add(after).saturating_add(1).min(len)
        }
        None => len,
    };
    start..end.max(start)
}

/// `t_i = (i − origin) / rate`
pub fn time_index(window: Range<usize>, origin: usize, rate_hz: f64) -> Vec<f64> {
    window
        .map(|i| (i as f64 - origin as f64) / rate_hz)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_range() {
        let a = [3, 4, 5, 6, 7];
        let b = [0, 2, 5, 9];
        assert_eq!(common_counter_range([&a[..], &b[..]]), Some((3, 7)));
        assert_eq!(common_counter_range([&a[..], &[10, 11][..]]), None);
        assert_eq!(common_counter_range([&a[..], &[][..]]), None);
    }

    #[test]
    fn test_gaps_become_fill() {
        let grid = place_on_grid(&[1, 2, 4, 5], &[10, 20, 40, 50], (2, 5), -1);
        assert_eq!(grid, [20, -1, 40, 50]);
    }

    #[test]
    fn test_crop_window() {
        // origin 100, 1 s at 100 Hz plus 0.5 s padding each side
        assert_eq!(crop_window(1000, 100, 100.0, Some(1.0), 0.5), 50..251);
        // clamped at both ends
        assert_eq!(crop_window(120, 10, 100.0, Some(1.0), 0.5), 0..120);
        assert_eq!(crop_window(120, 10, 100.0, None, 0.0), 10..120);
    }

    #[test]
    fn test_time_is_zero_at_origin() {
        let t = time_index(98..103, 100, 100.0);
        assert_eq!(t, [-0.02, -0.01, 0.0, 0.01, 0.02]);
    }
}
