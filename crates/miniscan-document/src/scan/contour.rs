// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document boundary detection: Canny edges, contour tracing, and polygon
// simplification to find the page outline as a quadrilateral.

use image::RgbImage;
use imageproc::contours::find_contours;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, info, instrument};

use crate::image::color::to_gray;
use crate::image::filters::gaussian_sigma_for_kernel;
use crate::scan::geometry::{Point, Quad, perimeter, polygon_area};

/// Gaussian kernel size applied before edge detection.
const BLUR_KERNEL: u32 = 5;
/// Canny hysteresis thresholds.
const CANNY_LOW: f32 = 75.0;
const CANNY_HIGH: f32 = 200.0;
/// How many of the largest contours are tried.
const MAX_CANDIDATES: usize = 5;
/// Simplification tolerance as a fraction of the contour perimeter.
const APPROX_TOLERANCE: f32 = 0.02;

/// Find the page outline in a photo.
///
/// ## Pipeline
///
/// 1. Grayscale, then Gaussian blur (5x5 equivalent)
/// 2. Canny edge detection (75 / 200)
/// 3. Trace every contour in the edge map
/// 4. Keep the five with the largest enclosed area
/// 5. Simplify each (Douglas-Peucker, 2% of perimeter) in that order
/// 6. Return the first one that simplifies to exactly four corners
///
/// Returns `None` when no candidate is a quadrilateral; callers keep the
/// image uncropped. The corners are in contour order, not ordered.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn detect_document_contour(image: &RgbImage) -> Option<Quad> {
    if image.width() < 3 || image.height() < 3 {
        debug!("Image too small for boundary detection");
        return None;
    }

    let gray = to_gray(image);
    let blurred = gaussian_blur_f32(&gray, gaussian_sigma_for_kernel(BLUR_KERNEL));
    let edges = canny(&blurred, CANNY_LOW, CANNY_HIGH);

    let mut contours: Vec<(f32, Vec<Point>)> = find_contours::<i32>(&edges)
        .into_iter()
        .map(|contour| {
            let points: Vec<Point> = contour
                .points
                .iter()
                .map(|p| (p.x as f32, p.y as f32))
                .collect();
            (polygon_area(&points), points)
        })
        .collect();
    debug!(contours = contours.len(), "Contours traced");

    contours.sort_by(|a, b| b.0.total_cmp(&a.0));

    for (rank, (area, points)) in contours.iter().take(MAX_CANDIDATES).enumerate() {
        let epsilon = APPROX_TOLERANCE * perimeter(points);
        let approx = approximate_polygon(points, epsilon);
        debug!(rank, area, vertices = approx.len(), "Candidate simplified");

        if let [a, b, c, d] = approx[..] {
            info!(area, "Document boundary found");
            return Some([a, b, c, d]);
        }
    }

    info!("No quadrilateral boundary found");
    None
}

/// Distance from `p` to the line through `a` and `b` (or to `a` if they coincide).
fn distance_to_line(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return ((p.0 - a.0).powi(2) + (p.1 - a.1).powi(2)).sqrt();
    }
    (dy * (p.0 - a.0) - dx * (p.1 - a.1)).abs() / len
}

/// Index of the point farthest from `origin`, first one on ties.
fn farthest_from(points: &[Point], origin: Point) -> usize {
    let mut best = (0, -1.0f32);
    for (i, p) in points.iter().enumerate() {
        let d = (p.0 - origin.0).powi(2) + (p.1 - origin.1).powi(2);
        if d > best.1 {
            best = (i, d);
        }
    }
    best.0
}

/// Douglas-Peucker on an open chain; both endpoints are kept.
fn simplify_chain(chain: &[Point], epsilon: f32) -> Vec<Point> {
    let n = chain.len();
    if n <= 2 {
        return chain.to_vec();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0, n - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let (mut split, mut max_dist) = (start, 0.0f32);
        for i in start + 1..end {
            let d = distance_to_line(chain[i], chain[start], chain[end]);
            if d > max_dist {
                split = i;
                max_dist = d;
            }
        }
        if max_dist > epsilon {
            keep[split] = true;
            stack.push((start, split));
            stack.push((split, end));
        }
    }

    chain
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Simplify a closed contour to a polygon whose edges stay within `epsilon`
/// of the original points.
///
/// The ring is cut at two mutually distant points and each half is
/// simplified as an open chain.
pub fn approximate_polygon(points: &[Point], epsilon: f32) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    let (start, end) = (a.min(b), a.max(b));
    if start == end {
        return vec![points[start]];
    }

    let forward = &points[start..=end];
    let wrapped: Vec<Point> = points[end..]
        .iter()
        .chain(&points[..=start])
        .copied()
        .collect();

    let mut polygon = simplify_chain(forward, epsilon);
    polygon.pop();
    let mut back = simplify_chain(&wrapped, epsilon);
    back.pop();
    polygon.extend(back);
    polygon
}
