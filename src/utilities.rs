/// Utility functions for searching sorted grid axes

/// Where a coordinate sits relative to a sorted axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisPosition {
    /// Exactly on grid line `idx` (also used for clamped coordinates).
    Node(usize),
    /// Strictly between `lo` and `lo + 1`; `frac` in (0, 1) is the relative offset from `lo`.
    Interval { lo: usize, frac: f64 },
}

/// Which side of the axis a coordinate fell off, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clamp {
    None,
    Below,
    Above,
}

/// Find the largest `i` with `axis[i] <= x`, assuming `axis[0] <= x < axis[len - 1]`.
///
/// Binary search keeps the target interval within `(low, high]`.
pub fn find_interval(axis: &[f64], x: f64) -> usize {
    let mut low = 0usize;
    let mut high = axis.len() - 1;
    while high - low > 1 {
        let mid = (low + high) >> 1;
        if axis[mid] <= x {
            low = mid;
        } else {
            high = mid;
        }
    }
    low
}

/// Relative distance below which a coordinate is treated as lying on a grid line.
///
/// `log10(10^x)` does not always round-trip to `x`; snapping keeps lattice
/// queries on the exact-lookup path.
pub const NODE_SNAP_TOLERANCE: f64 = 1e-12;

#[inline]
fn near(a: f64, b: f64) -> bool {
    a.is_finite() && (a - b).abs() <= NODE_SNAP_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Locate `x` on a strictly increasing, non-empty `axis`.
///
/// Coordinates outside the axis are clamped to the nearest end node, and
/// coordinates within [`NODE_SNAP_TOLERANCE`] of a grid line snap onto it.
/// `x` must not be NaN.
pub fn locate(axis: &[f64], x: f64) -> (AxisPosition, Clamp) {
    let last = axis.len() - 1;
    if x <= axis[0] || near(x, axis[0]) {
        let clamp = if x < axis[0] && !near(x, axis[0]) {
            Clamp::Below
        } else {
            Clamp::None
        };
        return (AxisPosition::Node(0), clamp);
    }
    if x >= axis[last] || near(x, axis[last]) {
        let clamp = if x > axis[last] && !near(x, axis[last]) {
            Clamp::Above
        } else {
            Clamp::None
        };
        return (AxisPosition::Node(last), clamp);
    }

    let lo = find_interval(axis, x);
    let x1 = axis[lo];
    let x2 = axis[lo + 1];
    if near(x, x1) {
        return (AxisPosition::Node(lo), Clamp::None);
    }
    if near(x, x2) {
        return (AxisPosition::Node(lo + 1), Clamp::None);
    }
    (
        AxisPosition::Interval {
            lo,
            frac: (x - x1) / (x2 - x1),
        },
        Clamp::None,
    )
}

/// Linear interpolation between `y1` (at frac 0) and `y2` (at frac 1).
#[inline]
pub fn lerp(y1: f64, y2: f64, frac: f64) -> f64 {
    y1 + frac * (y2 - y1)
}

/// Check that `axis` is strictly increasing and finite.
pub fn is_strictly_increasing(axis: &[f64]) -> bool {
    axis.iter().all(|v| v.is_finite()) && axis.windows(2).all(|w| w[0] < w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    const AXIS: [f64; 5] = [7.0, 7.5, 8.0, 9.0, 10.0];

    #[test]
    fn test_find_interval() {
        assert_eq!(find_interval(&AXIS, 7.0), 0);
        assert_eq!(find_interval(&AXIS, 7.2), 0);
        assert_eq!(find_interval(&AXIS, 7.5), 1);
        assert_eq!(find_interval(&AXIS, 9.99), 3);
    }

    #[test]
    fn test_locate_on_nodes() {
        for (i, &x) in AXIS.iter().enumerate() {
            assert_eq!(locate(&AXIS, x), (AxisPosition::Node(i), Clamp::None));
        }
    }

    #[test]
    fn test_locate_inside_interval() {
        let (pos, clamp) = locate(&AXIS, 8.25);
        assert_eq!(clamp, Clamp::None);
        match pos {
            AxisPosition::Interval { lo, frac } => {
                assert_eq!(lo, 2);
                assert!((frac - 0.25).abs() < 1e-12);
            }
            other => panic!("expected interval, got {:?}", other),
        }
    }

    #[test]
    fn test_locate_clamps_outside_axis() {
        assert_eq!(locate(&AXIS, 3.0), (AxisPosition::Node(0), Clamp::Below));
        assert_eq!(locate(&AXIS, f64::NEG_INFINITY), (AxisPosition::Node(0), Clamp::Below));
        assert_eq!(locate(&AXIS, 12.0), (AxisPosition::Node(4), Clamp::Above));
    }

    #[test]
    fn test_locate_single_point_axis() {
        let axis = [8.0];
        assert_eq!(locate(&axis, 8.0), (AxisPosition::Node(0), Clamp::None));
        assert_eq!(locate(&axis, 7.0), (AxisPosition::Node(0), Clamp::Below));
        assert_eq!(locate(&axis, 9.0), (AxisPosition::Node(0), Clamp::Above));
    }

    #[test]
    fn test_locate_snaps_round_trip_noise() {
        let axis = [8.0, 8.3, 9.176, 10.0];
        for (i, &x) in axis.iter().enumerate() {
            let round_trip = 10f64.powf(x).log10();
            assert_eq!(locate(&axis, round_trip), (AxisPosition::Node(i), Clamp::None));
        }
        assert_eq!(locate(&axis, 10.0 + 1e-13), (AxisPosition::Node(3), Clamp::None));
        assert_eq!(locate(&axis, 10.0 + 1e-9), (AxisPosition::Node(3), Clamp::Above));
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
        assert!((lerp(-10.0, 10.0, 0.75) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_is_strictly_increasing() {
        assert!(is_strictly_increasing(&AXIS));
        assert!(is_strictly_increasing(&[1.0]));
        assert!(!is_strictly_increasing(&[1.0, 1.0]));
        assert!(!is_strictly_increasing(&[2.0, 1.0]));
        assert!(!is_strictly_increasing(&[1.0, f64::INFINITY]));
    }
}
