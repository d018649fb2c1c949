use image::{GrayImage, Luma};

use crate::geometry::Point;

// flattened quadratic segments are at most this many pixels long
const FLATTEN_TOLERANCE_PX: f64 = 2.0;

/// Per-pixel stroke coverage. Overlapping parts of one path take the maximum
/// coverage, so a stroke never darkens where it crosses itself.
#[derive(Debug, Clone)]
pub struct CoverageMask {
    coverage: GrayImage,
}

impl CoverageMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            coverage: GrayImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.coverage.width()
    }

    pub fn height(&self) -> u32 {
        self.coverage.height()
    }

    pub fn coverage_at(&self, x: u32, y: u32) -> f32 {
        self.coverage
            .get_pixel_checked(x, y)
            .map_or(0.0, |Luma([value])| f32::from(*value) / 255.0)
    }

    /// Iterates `(x, y, coverage)` for every pixel with non-zero coverage.
    pub fn covered(&self) -> impl Iterator<Item = (u32, u32, f32)> + '_ {
        self.coverage
            .enumerate_pixels()
            .filter(|(_, _, Luma([value]))| *value > 0)
            .map(|(x, y, Luma([value]))| (x, y, f32::from(*value) / 255.0))
    }

    /// Strokes a round-capped, round-joined polyline of the given width.
    pub fn stroke_polyline(&mut self, points: &[Point], width: f64) {
        let radius = (width / 2.0).max(0.5);
        match points {
            [] => {}
            [single] => self.stroke_segment(*single, *single, radius),
            _ => {
                for pair in points.windows(2) {
                    self.stroke_segment(pair[0], pair[1], radius);
                }
            }
        }
    }

    fn stroke_segment(&mut self, from: Point, to: Point, radius: f64) {
        let (width, height) = self.coverage.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        let reach = radius + 1.0;
        let min_x = (from.x.min(to.x) - reach).floor().max(0.0);
        let min_y = (from.y.min(to.y) - reach).floor().max(0.0);
        let max_x = (from.x.max(to.x) + reach).ceil().min(f64::from(width));
        let max_y = (from.y.max(to.y) + reach).ceil().min(f64::from(height));
        if min_x >= max_x || min_y >= max_y {
            return;
        }

        for y in min_y as u32..max_y as u32 {
            for x in min_x as u32..max_x as u32 {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let distance = distance_to_segment(center, from, to);
                // one-pixel antialiased edge
                let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let value = (coverage * 255.0).round() as u8;
                let pixel = self.coverage.get_pixel_mut(x, y);
                pixel.0[0] = pixel.0[0].max(value);
            }
        }
    }
}

fn distance_to_segment(point: Point, from: Point, to: Point) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return point.distance(from);
    }
    let t = (((point.x - from.x) * dx + (point.y - from.y) * dy) / length_sq).clamp(0.0, 1.0);
    point.distance(Point::new(from.x + t * dx, from.y + t * dy))
}

/// Flattens raw pointer samples into the smoothed polyline a stroke renders.
///
/// Each pair of consecutive samples contributes a quadratic curve using the
/// earlier sample as control point and ending at the pair's midpoint; the
/// path closes with a straight segment to the final sample. Only the raw
/// samples are ever stored, so replaying them reproduces the same geometry.
pub fn smoothed_path(samples: &[Point]) -> Vec<Point> {
    let Some((&first, rest)) = samples.split_first() else {
        return Vec::new();
    };
    let mut path = vec![first];
    if rest.is_empty() {
        return path;
    }

    let mut current = first;
    for pair in samples.windows(2) {
        let control = pair[0];
        let end = pair[0].midpoint(pair[1]);
        flatten_quadratic(current, control, end, &mut path);
        current = end;
    }
    if let Some(&last) = samples.last() {
        if last != current {
            path.push(last);
        }
    }
    path
}

fn flatten_quadratic(start: Point, control: Point, end: Point, out: &mut Vec<Point>) {
    let approx_length = start.distance(control) + control.distance(end);
    let segments = (approx_length / FLATTEN_TOLERANCE_PX).ceil().max(1.0) as u32;
    for step in 1..=segments {
        let t = f64::from(step) / f64::from(segments);
        let inv = 1.0 - t;
        let point = Point::new(
            inv * inv * start.x + 2.0 * inv * t * control.x + t * t * end.x,
            inv * inv * start.y + 2.0 * inv * t * control.y + t * t * end.y,
        );
        if out.last() != Some(&point) {
            out.push(point);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothed_path_starts_at_first_sample_and_ends_at_last() {
        let samples = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        let path = smoothed_path(&samples);
        assert_eq!(path.first(), Some(&samples[0]));
        assert_eq!(path.last(), Some(&samples[2]));
        assert!(path.contains(&samples[0].midpoint(samples[1])));
        assert!(path.contains(&samples[1].midpoint(samples[2])));
    }

    #[test]
    fn smoothed_path_of_single_sample_is_a_dot() {
        let path = smoothed_path(&[Point::new(3.0, 4.0)]);
        assert_eq!(path, vec![Point::new(3.0, 4.0)]);
        assert!(smoothed_path(&[]).is_empty());
    }

    #[test]
    fn stroke_polyline_covers_line_and_not_far_pixels() {
        let mut mask = CoverageMask::new(20, 20);
        mask.stroke_polyline(&[Point::new(2.0, 10.5), Point::new(18.0, 10.5)], 3.0);
        assert_eq!(mask.coverage_at(10, 10), 1.0);
        assert_eq!(mask.coverage_at(10, 2), 0.0);
        assert_eq!(mask.coverage_at(10, 18), 0.0);
    }

    #[test]
    fn overlapping_segments_take_max_coverage() {
        let mut mask = CoverageMask::new(10, 10);
        let points = [
            Point::new(1.0, 5.5),
            Point::new(8.0, 5.5),
            Point::new(1.0, 5.5),
        ];
        mask.stroke_polyline(&points, 2.0);
        assert!(mask.covered().all(|(_, _, coverage)| coverage <= 1.0));
        assert_eq!(mask.coverage_at(4, 5), 1.0);
    }
}
