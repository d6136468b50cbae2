// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fast-marching inpainting (Telea, 2004).
//
// Masked pixels are filled in order of their distance from the mask
// boundary. Each newly reached pixel is estimated from the already known
// pixels within `radius`, weighted by direction (along the normal of the
// marching front), distance, and level-set proximity.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use image::{GrayImage, Rgb, RgbImage};

/// Distance assigned to pixels the front has not reached.
const FAR: f32 = 1.0e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Known,
    Band,
    Inside,
}

/// Min-heap entry ordered by arrival time, ties broken by index.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    time: f32,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// Arrival times and states of the marching front.
struct Front {
    width: i64,
    height: i64,
    time: Vec<f32>,
    state: Vec<State>,
}

impl Front {
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    fn state_at(&self, x: i64, y: i64) -> State {
        self.index(x, y).map_or(State::Inside, |i| self.state[i])
    }

    fn time_at(&self, x: i64, y: i64) -> f32 {
        self.index(x, y).map_or(FAR, |i| self.time[i])
    }

    /// Eikonal update from two orthogonal neighbours.
    fn solve(&self, (x1, y1): (i64, i64), (x2, y2): (i64, i64)) -> f32 {
        let a = self.time_at(x1, y1);
        let b = self.time_at(x2, y2);
        let a_known = self.state_at(x1, y1) != State::Inside;
        let b_known = self.state_at(x2, y2) != State::Inside;
        match (a_known, b_known) {
            (true, true) => {
                if (a - b).abs() >= 1.0 {
                    1.0 + a.min(b)
                } else {
                    (a + b + (2.0 - (a - b) * (a - b)).sqrt()) * 0.5
                }
            }
            (true, false) => 1.0 + a,
            (false, true) => 1.0 + b,
            (false, false) => 1.0 + a.min(b),
        }
    }

    fn arrival(&self, x: i64, y: i64) -> f32 {
        [
            self.solve((x, y - 1), (x - 1, y)),
            self.solve((x, y + 1), (x - 1, y)),
            self.solve((x, y - 1), (x + 1, y)),
            self.solve((x, y + 1), (x + 1, y)),
        ]
        .into_iter()
        .fold(FAR, f32::min)
    }

    /// Gradient of `value` at (x, y), using only samples that are not inside.
    fn gradient(&self, x: i64, y: i64, value: impl Fn(i64, i64) -> f32) -> (f32, f32) {
        let axis = |(px, py): (i64, i64), (nx, ny): (i64, i64)| {
            let plus = self.state_at(px, py) != State::Inside;
            let minus = self.state_at(nx, ny) != State::Inside;
            match (plus, minus) {
                (true, true) => (value(px, py) - value(nx, ny)) * 0.5,
                (true, false) => value(px, py) - value(x, y),
                (false, true) => value(x, y) - value(nx, ny),
                (false, false) => 0.0,
            }
        };
        (axis((x + 1, y), (x - 1, y)), axis((x, y + 1), (x, y - 1)))
    }

    /// Advance the front from `heap`, calling `on_reach` for every pixel that
    /// leaves the inside. Stops once the popped time exceeds `limit`.
    fn march(
        &mut self,
        heap: &mut BinaryHeap<Candidate>,
        limit: f32,
        mut on_reach: impl FnMut(&Front, i64, i64),
    ) {
        while let Some(Candidate { time, index }) = heap.pop() {
            if time > limit {
                break;
            }
            self.state[index] = State::Known;
            let (x, y) = (index as i64 % self.width, index as i64 / self.width);

            for (nx, ny) in [(x, y - 1), (x - 1, y), (x, y + 1), (x + 1, y)] {
                let Some(n) = self.index(nx, ny) else { continue };
                if self.state[n] != State::Inside {
                    continue;
                }
                let arrival = self.arrival(nx, ny);
                self.time[n] = arrival;
                on_reach(&*self, nx, ny);
                self.state[n] = State::Band;
                heap.push(Candidate { time: arrival, index: n });
            }
        }
    }
}

/// Inpaint every pixel where `mask` is non-zero.
///
/// `mask` must have the same dimensions as `image`. Returns a new image; the
/// input is left untouched. An empty mask returns an identical copy.
pub fn inpaint_telea(image: &RgbImage, mask: &GrayImage, radius: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut out = image.clone();
    if mask.dimensions() != (w, h) || !mask.pixels().any(|p| p.0[0] != 0) {
        return out;
    }

    let n = (w * h) as usize;
    let mut front = Front {
        width: w as i64,
        height: h as i64,
        time: vec![0.0; n],
        state: vec![State::Known; n],
    };
    for (i, p) in mask.pixels().enumerate() {
        if p.0[0] != 0 {
            front.state[i] = State::Inside;
            front.time[i] = FAR;
        }
    }

    // Known pixels touching the mask form the initial band.
    let mut band = Vec::new();
    for y in 0..front.height {
        for x in 0..front.width {
            let i = (y * front.width + x) as usize;
            if front.state[i] != State::Known {
                continue;
            }
            let touches = [(x, y - 1), (x - 1, y), (x, y + 1), (x + 1, y)]
                .into_iter()
                .any(|(nx, ny)| front.index(nx, ny).is_some_and(|j| front.state[j] == State::Inside));
            if touches {
                band.push(i);
            }
        }
    }

    distance_outside(&mut front, &band, radius);

    let mut heap = BinaryHeap::with_capacity(band.len());
    for &i in &band {
        front.state[i] = State::Band;
        heap.push(Candidate { time: 0.0, index: i });
    }

    let radius = radius.max(1) as i64;
    front.march(&mut heap, f32::INFINITY, |front, x, y| {
        let color = estimate(front, &out, x, y, radius);
        out.put_pixel(x as u32, y as u32, color);
    });

    out
}

/// Give known pixels near the band negative arrival times, so the level-set
/// weight and gradient are meaningful on both sides of the boundary.
fn distance_outside(front: &mut Front, band: &[usize], radius: u32) {
    let mut outer = Front {
        width: front.width,
        height: front.height,
        time: front.time.iter().map(|&t| if t >= FAR { 0.0 } else { FAR }).collect(),
        state: front
            .state
            .iter()
            .map(|s| match s {
                State::Inside => State::Known,
                _ => State::Inside,
            })
            .collect(),
    };

    let mut heap = BinaryHeap::with_capacity(band.len());
    for &i in band {
        outer.state[i] = State::Band;
        outer.time[i] = 0.0;
        heap.push(Candidate { time: 0.0, index: i });
    }
    outer.march(&mut heap, (2 * radius) as f32, |_, _, _| {});

    for (i, state) in front.state.iter().enumerate() {
        if *state == State::Known && outer.time[i] < FAR {
            front.time[i] = -outer.time[i];
        }
    }
}

/// Weighted estimate of the colour at (x, y) from its known neighbourhood.
fn estimate(front: &Front, image: &RgbImage, x: i64, y: i64, radius: i64) -> Rgb<u8> {
    let t_here = front.time_at(x, y);
    let grad_t = front.gradient(x, y, |px, py| front.time_at(px, py));
    let sample = |px: i64, py: i64, c: usize| image.get_pixel(px as u32, py as u32).0[c] as f32;

    let mut channels = [0u8; 3];
    for (c, slot) in channels.iter_mut().enumerate() {
        let (mut sum, mut weight_sum, mut jx, mut jy) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);

        for ny in (y - radius)..=(y + radius) {
            for nx in (x - radius)..=(x + radius) {
                if front.state_at(nx, ny) == State::Inside {
                    continue;
                }
                let (rx, ry) = ((x - nx) as f32, (y - ny) as f32);
                let len_sq = rx * rx + ry * ry;
                if len_sq > (radius * radius) as f32 {
                    continue;
                }

                let dst = 1.0 / (len_sq * len_sq.sqrt());
                let lev = 1.0 / (1.0 + (front.time_at(nx, ny) - t_here).abs());
                let mut dir = rx * grad_t.0 + ry * grad_t.1;
                if dir.abs() <= 0.01 {
                    dir = 1.0e-6;
                }
                let w = (dst * lev * dir).abs();

                let grad_i = front.gradient(nx, ny, |px, py| sample(px, py, c));
                sum += w * sample(nx, ny, c);
                jx -= w * grad_i.0 * rx;
                jy -= w * grad_i.1 * ry;
                weight_sum += w;
            }
        }

        *slot = if weight_sum > 0.0 {
            let value = sum / weight_sum + (jx + jy) / ((jx * jx + jy * jy).sqrt() + 1.0e-20);
            value.round().clamp(0.0, 255.0) as u8
        } else {
            image.get_pixel(x as u32, y as u32).0[c]
        };
    }

    Rgb(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn empty_mask_returns_identical_copy() {
        let img = RgbImage::from_fn(10, 10, |x, y| Rgb([x as u8 * 20, y as u8 * 20, 7]));
        let mask = GrayImage::new(10, 10);
        assert_eq!(inpaint_telea(&img, &mask, 3), img);
    }

    #[test]
    fn hole_in_flat_area_is_filled_with_surrounding_color() {
        let mut img = RgbImage::from_pixel(30, 30, Rgb([200, 190, 180]));
        let mut mask = GrayImage::new(30, 30);
        for y in 12..18 {
            for x in 10..20 {
                img.put_pixel(x, y, Rgb([255, 0, 0]));
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        let out = inpaint_telea(&img, &mask, 3);
        for y in 12..18 {
            for x in 10..20 {
                let Rgb([r, g, b]) = *out.get_pixel(x, y);
                assert!((r as i32 - 200).abs() <= 2, "r={r} at ({x},{y})");
                assert!((g as i32 - 190).abs() <= 2, "g={g} at ({x},{y})");
                assert!((b as i32 - 180).abs() <= 2, "b={b} at ({x},{y})");
            }
        }
        assert_eq!(out.get_pixel(0, 0), img.get_pixel(0, 0));
    }

    #[test]
    fn mask_touching_the_border_is_filled() {
        let mut img = RgbImage::from_pixel(12, 12, Rgb([50, 60, 70]));
        let mut mask = GrayImage::new(12, 12);
        for y in 0..3 {
            for x in 0..3 {
                img.put_pixel(x, y, Rgb([0, 255, 0]));
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let out = inpaint_telea(&img, &mask, 3);
        let Rgb([r, g, b]) = *out.get_pixel(0, 0);
        assert!((r as i32 - 50).abs() <= 2 && (g as i32 - 60).abs() <= 2 && (b as i32 - 70).abs() <= 2);
    }

    #[test]
    fn fill_follows_vertical_split() {
        // Left half dark, right half light; a thin vertical scratch on each side.
        let mut img = RgbImage::from_fn(40, 20, |x, _| if x < 20 { Rgb([40, 40, 40]) } else { Rgb([220, 220, 220]) });
        let mut mask = GrayImage::new(40, 20);
        for y in 5..15 {
            for x in [8u32, 30] {
                img.put_pixel(x, y, Rgb([255, 0, 255]));
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let out = inpaint_telea(&img, &mask, 3);
        assert!(out.get_pixel(8, 10).0[0] < 60);
        assert!(out.get_pixel(30, 10).0[0] > 200);
    }
}
