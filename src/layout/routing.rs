use std::fmt::Write;

use super::Point;

const EPS: f32 = 1e-4;

fn same_point(a: Point, b: Point) -> bool {
    (a.0 - b.0).abs() <= EPS && (a.1 - b.1).abs() <= EPS
}

/// Drops repeated points and interior points that continue a straight run.
pub(super) fn compress_path(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &point in points {
        if out.last().is_some_and(|&last| same_point(last, point)) {
            continue;
        }
        if out.len() >= 2 {
            let prev = out[out.len() - 2];
            let curr = out[out.len() - 1];
            let vertical_run = (prev.0 - curr.0).abs() <= EPS && (curr.0 - point.0).abs() <= EPS;
            let horizontal_run =
                (prev.1 - curr.1).abs() <= EPS && (curr.1 - point.1).abs() <= EPS;
            if vertical_run || horizontal_run {
                out.pop();
            }
        }
        out.push(point);
    }
    out
}

fn distance(a: Point, b: Point) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

/// Corner radius actually used between two segments: never more than half of
/// the shorter adjacent segment.
pub(super) fn corner_radius(radius: f32, len_in: f32, len_out: f32) -> f32 {
    radius.min(len_in / 2.0).min(len_out / 2.0).max(0.0)
}

/// SVG path data for an orthogonal polyline with uniformly rounded corners.
pub(super) fn rounded_path_data(points: &[Point], radius: f32) -> String {
    let Some(&first) = points.first() else {
        return String::new();
    };
    let mut d = String::new();
    let _ = write!(d, "M {:.2} {:.2}", first.0, first.1);
    if points.len() == 1 {
        return d;
    }
    for idx in 1..points.len() - 1 {
        let prev = points[idx - 1];
        let curr = points[idx];
        let next = points[idx + 1];
        let len_in = distance(prev, curr);
        let len_out = distance(curr, next);
        let r = corner_radius(radius, len_in, len_out);
        if r <= EPS {
            let _ = write!(d, " L {:.2} {:.2}", curr.0, curr.1);
            continue;
        }
        let entry = (
            curr.0 - (curr.0 - prev.0) / len_in * r,
            curr.1 - (curr.1 - prev.1) / len_in * r,
        );
        let exit = (
            curr.0 + (next.0 - curr.0) / len_out * r,
            curr.1 + (next.1 - curr.1) / len_out * r,
        );
        let _ = write!(
            d,
            " L {:.2} {:.2} Q {:.2} {:.2} {:.2} {:.2}",
            entry.0, entry.1, curr.0, curr.1, exit.0, exit.1
        );
    }
    let last = points[points.len() - 1];
    let _ = write!(d, " L {:.2} {:.2}", last.0, last.1);
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_removes_duplicates_and_straight_runs() {
        let points = vec![(0.0, 0.0), (0.0, 0.0), (0.0, 5.0), (0.0, 10.0), (10.0, 10.0)];
        assert_eq!(compress_path(&points), vec![(0.0, 0.0), (0.0, 10.0), (10.0, 10.0)]);
    }

    #[test]
    fn compress_collapses_zero_length_turn() {
        let points = vec![(5.0, 0.0), (5.0, 20.0), (5.0, 20.0), (5.0, 40.0)];
        assert_eq!(compress_path(&points), vec![(5.0, 0.0), (5.0, 40.0)]);
    }

    #[test]
    fn radius_capped_by_short_segment() {
        assert_eq!(corner_radius(8.0, 100.0, 100.0), 8.0);
        assert_eq!(corner_radius(8.0, 6.0, 100.0), 3.0);
        assert_eq!(corner_radius(8.0, 100.0, 2.0), 1.0);
    }

    #[test]
    fn rounded_corner_uses_quadratic_curve() {
        let d = rounded_path_data(&[(0.0, 0.0), (20.0, 0.0), (20.0, 20.0)], 8.0);
        assert_eq!(d, "M 0.00 0.00 L 12.00 0.00 Q 20.00 0.00 20.00 8.00 L 20.00 20.00");
    }

    #[test]
    fn straight_path_has_no_curve() {
        let d = rounded_path_data(&[(0.0, 0.0), (0.0, 30.0)], 8.0);
        assert_eq!(d, "M 0.00 0.00 L 0.00 30.00");
    }
}
