// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadrilateral geometry: corner ordering and perspective rectification.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use miniscan_core::error::ScanError;
use tracing::{debug, instrument};

/// A point in pixel coordinates.
pub type Point = (f32, f32);

/// Four corners. Once ordered: top-left, top-right, bottom-right, bottom-left.
pub type Quad = [Point; 4];

/// Index of the first element with the smallest (`min`) or largest key.
fn first_extreme(keys: &[f32; 4], min: bool) -> usize {
    let mut best = 0;
    for i in 1..4 {
        let better = if min { keys[i] < keys[best] } else { keys[i] > keys[best] };
        if better {
            best = i;
        }
    }
    best
}

/// Order four points as top-left, top-right, bottom-right, bottom-left.
///
/// Top-left has the smallest `x + y`, bottom-right the largest. Top-right has
/// the smallest `y - x`, bottom-left the largest. Ties go to the earliest
/// point. Only reliable for convex quads rotated less than 45 degrees; two
/// roles can land on the same input point otherwise.
pub fn order_points(points: Quad) -> Quad {
    let sums = points.map(|(x, y)| x + y);
    let diffs = points.map(|(x, y)| y - x);

    [
        points[first_extreme(&sums, true)],
        points[first_extreme(&diffs, true)],
        points[first_extreme(&sums, false)],
        points[first_extreme(&diffs, false)],
    ]
}

#[inline]
fn distance(a: Point, b: Point) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Output size for an ordered quad: the longer of each pair of opposite
/// edges, truncated to whole pixels.
pub fn target_size(ordered: &Quad) -> (u32, u32) {
    let [tl, tr, br, bl] = *ordered;
    let width = (distance(br, bl) as u32).max(distance(tr, tl) as u32);
    let height = (distance(tr, br) as u32).max(distance(tl, bl) as u32);
    (width, height)
}

/// Warp the region bounded by `points` onto an axis-aligned rectangle.
///
/// Points may be in any order. Fails with [`ScanError::InvalidGeometry`] when
/// the target collapses to zero width/height or no projective transform maps
/// the corners (e.g. three collinear points).
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn four_point_transform(image: &RgbImage, points: Quad) -> Result<RgbImage, ScanError> {
    let ordered = order_points(points);
    let (width, height) = target_size(&ordered);
    if width == 0 || height == 0 {
        return Err(ScanError::InvalidGeometry(format!(
            "target rectangle is {width}x{height}"
        )));
    }

    let (right, bottom) = ((width - 1) as f32, (height - 1) as f32);
    let dest: Quad = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];

    let projection = Projection::from_control_points(ordered, dest).ok_or_else(|| {
        ScanError::InvalidGeometry(format!("no perspective transform maps {ordered:?}"))
    })?;

    let mut output = RgbImage::new(width, height);
    warp_into(image, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut output);

    debug!(out_w = width, out_h = height, "Perspective rectified");
    Ok(output)
}

/// Enclosed area of a closed polygon (shoelace formula).
pub fn polygon_area(points: &[Point]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.0 as f64 * b.1 as f64 - b.0 as f64 * a.1 as f64
        })
        .sum();
    (twice.abs() / 2.0) as f32
}

/// Length of the closed polyline through `points`.
pub fn perimeter(points: &[Point]) -> f32 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| distance(points[i], points[(i + 1) % n])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_shuffled_corners() {
        let shuffled = [(90.0, 80.0), (10.0, 5.0), (12.0, 85.0), (95.0, 8.0)];
        assert_eq!(
            order_points(shuffled),
            [(10.0, 5.0), (95.0, 8.0), (90.0, 80.0), (12.0, 85.0)]
        );
    }

    #[test]
    fn ordering_is_idempotent() {
        let once = order_points([(300.0, 20.0), (15.0, 400.0), (20.0, 30.0), (310.0, 390.0)]);
        assert_eq!(order_points(once), once);
    }

    #[test]
    fn ties_resolve_to_first_point() {
        // A diamond: (50,0) and (0,50) share the minimum sum.
        let diamond = [(50.0, 0.0), (100.0, 50.0), (50.0, 100.0), (0.0, 50.0)];
        // (50,0) and (100,50) also share the minimum y - x, so the first
        // point fills both the top-left and top-right roles.
        let ordered = order_points(diamond);
        assert_eq!(ordered, [(50.0, 0.0), (50.0, 0.0), (100.0, 50.0), (50.0, 100.0)]);
    }

    #[test]
    fn target_size_uses_longer_edges() {
        let ordered = [(0.0, 0.0), (100.9, 0.0), (90.0, 60.0), (0.0, 50.0)];
        let (w, h) = target_size(&ordered);
        assert_eq!(w, 100);
        assert_eq!(h, 60);
    }

    #[test]
    fn axis_aligned_rectangle_behaves_like_a_crop() {
        let mut img = RgbImage::from_pixel(200, 150, Rgb([10, 10, 10]));
        for y in 20..80 {
            for x in 30..130 {
                img.put_pixel(x, y, Rgb([240, 200, 30]));
            }
        }
        let quad = [(129.0, 79.0), (30.0, 20.0), (129.0, 20.0), (30.0, 79.0)];
        let out = four_point_transform(&img, quad).unwrap();

        assert!((out.width() as i32 - 99).abs() <= 1, "width {}", out.width());
        assert!((out.height() as i32 - 59).abs() <= 1, "height {}", out.height());
        let Rgb([r, g, b]) = *out.get_pixel(out.width() / 2, out.height() / 2);
        assert_eq!((r, g, b), (240, 200, 30));
        assert_eq!(*out.get_pixel(2, 2), Rgb([240, 200, 30]));
    }

    #[test]
    fn collapsed_quad_is_invalid_geometry() {
        let point = (5.0, 5.0);
        let err = four_point_transform(&RgbImage::new(10, 10), [point; 4]).unwrap_err();
        assert!(matches!(err, ScanError::InvalidGeometry(_)));
    }

    #[test]
    fn area_and_perimeter_of_rectangle() {
        let rect = [(0.0, 0.0), (10.0, 0.0), (10.0, 5.0), (0.0, 5.0)];
        assert!((polygon_area(&rect) - 50.0).abs() < 1e-3);
        assert!((perimeter(&rect) - 30.0).abs() < 1e-3);
        assert_eq!(polygon_area(&rect[..2]), 0.0);
    }
}
