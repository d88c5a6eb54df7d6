//! Generic local-maximum detector over a sampled signal.

use itertools::Itertools;

use crate::params::PeakFinderParams;

/// Indices of the local maxima of `x`, filtered by `params`.
///
/// A sample is a local maximum when it is strictly larger than its left neighbour and
/// strictly larger than the first differing sample on its right; for a flat top, the
/// middle index (rounded down) of the plateau is returned. The first and last samples are
/// never maxima.
///
/// Filters are applied in this order:
/// 1. `height`: keep `x[i] >= height`;
/// 2. `distance`: among maxima closer than `distance` samples, keep the largest
///    (ties resolved in favour of the leftmost);
/// 3. `prominence`: keep maxima whose prominence is at least `prominence`.
///
/// Return
/// ----------
/// * Strictly increasing indices into `x`.
pub fn find_peaks(x: &[f64], params: &PeakFinderParams) -> Vec<usize> {
    let mut peaks = local_maxima(x);

    if let Some(height) = params.height {
        peaks.retain(|&p| x[p] >= height);
    }

    if let Some(distance) = params.distance {
        peaks = select_by_distance(x, &peaks, distance);
    }

    if let Some(min_prominence) = params.prominence {
        peaks.retain(|&p| prominence(x, p) >= min_prominence);
    }

    peaks
}

fn local_maxima(x: &[f64]) -> Vec<usize> {
    let n = x.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }

    let mut i = 1;
    while i < n - 1 {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < n - 1 && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let right = ahead - 1;
                peaks.push((i + right) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}

fn select_by_distance(x: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    if distance <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }

    let mut keep = vec![true; peaks.len()];
    // Highest first
    let priority = (0..peaks.len())
        .sorted_by(|&a, &b| x[peaks[b]].total_cmp(&x[peaks[a]]))
        .collect_vec();

    for &j in &priority {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            k -= 1;
            keep[k] = false;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}

/// Height of the peak above the higher of its two bases, each base being the lowest
/// point between the peak and the nearest strictly higher sample (or the signal edge).
fn prominence(x: &[f64], peak: usize) -> f64 {
    let value = x[peak];

    let mut left_min = value;
    for &v in x[..peak].iter().rev() {
        if v > value {
            break;
        }
        left_min = left_min.min(v);
    }

    let mut right_min = value;
    for &v in &x[peak + 1..] {
        if v > value {
            break;
        }
        right_min = right_min.min(v);
    }

    value - left_min.max(right_min)
}

#[cfg(test)]
mod peaks_test {
    use super::*;

    #[test]
    fn test_simple_maxima() {
        let x = [0.0, 1.0, 0.0, 2.0, 0.5, 3.0, 1.0];
        assert_eq!(find_peaks(&x, &PeakFinderParams::default()), vec![1, 3, 5]);
    }

    #[test]
    fn test_edges_are_not_peaks() {
        let x = [5.0, 1.0, 2.0, 1.0, 6.0];
        assert_eq!(find_peaks(&x, &PeakFinderParams::default()), vec![2]);
    }

    #[test]
    fn test_plateau() {
        let x = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 2.0, 2.0, 3.0, 0.0];
        // Plateau 1..=4 -> 2 ; 2.0, 2.0 rises again -> not a peak ; 8 is a peak
        assert_eq!(find_peaks(&x, &PeakFinderParams::default()), vec![2, 8]);
    }

    #[test]
    fn test_height_filter() {
        let x = [0.0, 1.0, 0.0, 2.0, 0.5, 3.0, 1.0];
        let params = PeakFinderParams {
            height: Some(1.5),
            ..Default::default()
        };
        assert_eq!(find_peaks(&x, &params), vec![3, 5]);
    }

    #[test]
    fn test_distance_filter() {
        let x = [0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.5, 0.0];
        let params = PeakFinderParams {
            distance: Some(3),
            ..Default::default()
        };
        // 3 (highest) removes 1 ; 7 is 4 samples away and stays
        assert_eq!(find_peaks(&x, &params), vec![3, 7]);
    }

    #[test]
    fn test_prominence_filter() {
        let x = [0.0, 3.0, 2.8, 2.9, 0.0, 1.0, 0.0];
        let params = PeakFinderParams {
            prominence: Some(0.5),
            ..Default::default()
        };
        // 3 has prominence 0.1, 1 has prominence 3.0, 5 has prominence 1.0
        assert_eq!(find_peaks(&x, &params), vec![1, 5]);
        assert!((prominence(&x, 3) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_short_signal() {
        assert!(find_peaks(&[1.0, 2.0], &PeakFinderParams::default()).is_empty());
    }
}
