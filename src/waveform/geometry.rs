//! Geometry-to-waveform processor.
//!
//! Six landmark points become the first half of a period. The second half
//! is the first half rotated 180° about the join, so the resulting period is
//! point-symmetric and starts and ends on the same level.
//!
//! Anything short of six finite points, or a pose with no horizontal extent,
//! falls back to the static sine table. A pose with no vertical extent
//! produces silence.

use super::generator::{StaticShape, static_waveform};

/// Number of landmarks that make up one half period.
pub const HALF_POINTS: usize = 6;

/// Number of control points in the full period polyline.
pub const POLYLINE_POINTS: usize = HALF_POINTS * 2;

/// A control point of the waveform polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Build the 12-point polyline for six landmark points, before any
/// rescaling.
///
/// Points are sorted by x, translated so the leftmost sits at x = 0 and the
/// rightmost at y = 0, then mirrored through the origin and appended so the
/// mirrored half begins where the first half ends.
///
/// Returns `None` unless exactly six finite points are given.
pub fn pose_polyline(points: &[(f64, f64)]) -> Option<[Point; POLYLINE_POINTS]> {
    if points.len() != HALF_POINTS {
        return None;
    }
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return None;
    }

    let mut sorted: Vec<Point> = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

    let left_x = sorted[0].x;
    let right_y = sorted[HALF_POINTS - 1].y;

    let mut polyline = [Point::new(0.0, 0.0); POLYLINE_POINTS];
    for (dst, p) in polyline.iter_mut().zip(&sorted) {
        *dst = Point::new(p.x - left_x, p.y - right_y);
    }

    // Mirrored half: negate, reverse, then shift so its first point lands on
    // the last point of the first half.
    let shift = 2.0 * polyline[HALF_POINTS - 1].x;
    for j in 0..HALF_POINTS {
        let src = polyline[HALF_POINTS - 1 - j];
        polyline[HALF_POINTS + j] = Point::new(shift - src.x, -src.y);
    }

    Some(polyline)
}

/// Resample a polyline onto `n` integer positions.
///
/// x is stretched onto [0, n - 1] and y min-max scaled onto [-0.5, 0.5];
/// a flat polyline yields all zeros. Returns `None` when the polyline has no
/// horizontal extent.
fn resample(polyline: &[Point; POLYLINE_POINTS], n: usize) -> Option<Vec<f32>> {
    let first = polyline[0];
    let last = polyline[POLYLINE_POINTS - 1];
    let span = last.x - first.x;
    if !(span > 0.0) || n == 0 {
        return None;
    }

    let (min_y, max_y) = polyline
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    let range_y = max_y - min_y;

    let top = (n - 1) as f64;
    let scaled: Vec<Point> = polyline
        .iter()
        .map(|p| {
            let x = (p.x - first.x) / span * top;
            let y = if range_y > 0.0 {
                (p.y - min_y) / range_y - 0.5
            } else {
                0.0
            };
            Point::new(x, y)
        })
        .collect();

    let mut out = Vec::with_capacity(n);
    let mut seg = 0;
    for i in 0..n {
        let pos = i as f64;
        while seg + 2 < scaled.len() && pos > scaled[seg + 1].x {
            seg += 1;
        }
        let left = scaled[seg];
        let right = scaled[seg + 1];

        let value = if pos > right.x {
            // Past the final control point: hold its level.
            right.y
        } else if right.x > left.x {
            let t = (pos - left.x) / (right.x - left.x);
            left.y + t * (right.y - left.y)
        } else {
            left.y
        };
        out.push(if value.is_finite() { value as f32 } else { 0.0 });
    }

    Some(out)
}

/// Turn landmark points into `n` waveform samples.
///
/// Falls back to the static sine for anything but six usable points.
pub fn geometry_samples(points: &[(f64, f64)], n: usize) -> Vec<f32> {
    pose_polyline(points)
        .and_then(|polyline| resample(&polyline, n))
        .unwrap_or_else(|| static_waveform(StaticShape::Sine, n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const N: usize = 2048;

    fn scenario() -> Vec<(f64, f64)> {
        vec![
            (0.1, 0.5),
            (0.2, 0.3),
            (0.3, 0.7),
            (0.4, 0.3),
            (0.5, 0.5),
            (0.6, 0.2),
        ]
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn scenario_first_half_is_translated() {
        let poly = pose_polyline(&scenario()).unwrap();
        let expected = [
            (0.0, 0.3),
            (0.1, 0.1),
            (0.2, 0.5),
            (0.3, 0.1),
            (0.4, 0.3),
            (0.5, 0.0),
        ];
        for (p, (x, y)) in poly.iter().zip(expected) {
            assert!(close(p.x, x) && close(p.y, y), "got {p:?}, want ({x}, {y})");
        }
    }

    #[test]
    fn scenario_second_half_spans_half_to_one() {
        let poly = pose_polyline(&scenario()).unwrap();
        assert!(close(poly[6].x, 0.5), "second half starts at {}", poly[6].x);
        assert!(close(poly[11].x, 1.0), "second half ends at {}", poly[11].x);
        assert!(poly.windows(2).all(|w| w[1].x >= w[0].x));
    }

    #[test]
    fn scenario_table_starts_on_first_point() {
        let table = geometry_samples(&scenario(), N);
        assert_eq!(table.len(), N);
        // y range of the polyline is [-0.5, 0.5] → first y 0.3 maps to 0.3
        assert!((table[0] - 0.3).abs() < 1e-6, "got {}", table[0]);
        assert!(table.iter().all(|s| s.is_finite()));
        // half-way sample sits on the join, y = 0
        let mid = ((N - 1) as f64 * 0.5).floor() as usize;
        assert!(table[mid].abs() < 0.01, "join should be near zero, got {}", table[mid]);
    }

    #[test]
    fn slot_order_does_not_matter() {
        let mut shuffled = scenario();
        shuffled.reverse();
        shuffled.swap(1, 4);
        assert_eq!(geometry_samples(&shuffled, N), geometry_samples(&scenario(), N));
    }

    #[test]
    fn fewer_points_fall_back_to_sine() {
        let sine = static_waveform(StaticShape::Sine, N);
        assert_eq!(geometry_samples(&scenario()[..5], N), sine);
        assert_eq!(geometry_samples(&[], N), sine);
        let mut seven = scenario();
        seven.push((0.9, 0.9));
        assert_eq!(geometry_samples(&seven, N), sine);
    }

    #[test]
    fn flat_pose_is_silent() {
        let flat: Vec<(f64, f64)> = (0..6).map(|i| (i as f64 * 0.1, 0.4)).collect();
        let table = geometry_samples(&flat, N);
        assert!(table.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn vertical_pose_falls_back_to_sine() {
        let column: Vec<(f64, f64)> = (0..6).map(|i| (0.5, i as f64 * 0.1)).collect();
        assert_eq!(geometry_samples(&column, N), static_waveform(StaticShape::Sine, N));
    }

    #[test]
    fn nan_falls_back_to_sine() {
        let mut pts = scenario();
        pts[2].1 = f64::NAN;
        assert_eq!(geometry_samples(&pts, N), static_waveform(StaticShape::Sine, N));
    }

    fn six_points() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((0.0f64..1.0, 0.0f64..1.0), 6)
    }

    proptest! {
        #[test]
        fn table_length_and_range(points in six_points()) {
            let table = geometry_samples(&points, N);
            prop_assert_eq!(table.len(), N);
            for s in &table {
                prop_assert!((-0.5..=0.5).contains(s), "sample {} out of range", s);
            }
        }

        #[test]
        fn polyline_is_point_symmetric(points in six_points()) {
            let poly = pose_polyline(&points).unwrap();
            for j in 0..POLYLINE_POINTS {
                let mirror = poly[POLYLINE_POINTS - 1 - j];
                prop_assert!((poly[j].y + mirror.y).abs() < 1e-12);
            }
        }
    }
}
