//! Edge Density
//!
//! Canny-style edge map over a luma image: Sobel L1 gradient,
//! non-maximum suppression, hysteresis between LOW and HIGH.

use crate::logic::pixels::PixelBuffer;

/// Weak-edge gradient threshold
pub const EDGE_LOW_THRESHOLD: i32 = 100;

/// Strong-edge gradient threshold
pub const EDGE_HIGH_THRESHOLD: i32 = 200;

/// Gradient direction, quantized to the neighbour pair NMS compares against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Direction {
    Horizontal,
    Vertical,
    Diagonal,
    AntiDiagonal,
}

impl Direction {
    fn of(gx: i32, gy: i32) -> Self {
        let (ax, ay) = (gx.abs() as f32, gy.abs() as f32);
        // tan(22.5°) ≈ 0.4142, tan(67.5°) ≈ 2.4142
        if ay <= ax * 0.4142 {
            Direction::Horizontal
        } else if ay >= ax * 2.4142 {
            Direction::Vertical
        } else if (gx > 0) == (gy > 0) {
            Direction::Diagonal
        } else {
            Direction::AntiDiagonal
        }
    }
}

/// Fraction of pixels classified as edge, in [0, 1]
pub fn edge_density(gray: &PixelBuffer) -> f32 {
    let total = gray.pixel_count();
    if total == 0 || gray.channels != 1 {
        return 0.0;
    }
    let edges = edge_map(gray, EDGE_LOW_THRESHOLD, EDGE_HIGH_THRESHOLD);
    edges.iter().filter(|&&e| e).count() as f32 / total as f32
}

/// Boolean edge map, row-major
pub fn edge_map(gray: &PixelBuffer, low: i32, high: i32) -> Vec<bool> {
    let w = gray.width as usize;
    let h = gray.height as usize;
    let mut edges = vec![false; w * h];
    if w < 3 || h < 3 {
        return edges;
    }

    let px = |x: isize, y: isize| -> i32 {
        let cx = x.clamp(0, w as isize - 1) as usize;
        let cy = y.clamp(0, h as isize - 1) as usize;
        gray.data[cy * w + cx] as i32
    };

    // Sobel L1 magnitude (max 2040) + quantized direction, replicated border
    let mut magnitude = vec![0u16; w * h];
    let mut direction = vec![Direction::Horizontal; w * h];
    for y in 0..h as isize {
        for x in 0..w as isize {
            let dx = (px(x + 1, y - 1) + 2 * px(x + 1, y) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2 * px(x - 1, y) + px(x - 1, y + 1));
            let dy = (px(x - 1, y + 1) + 2 * px(x, y + 1) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2 * px(x, y - 1) + px(x + 1, y - 1));
            let i = y as usize * w + x as usize;
            magnitude[i] = (dx.abs() + dy.abs()) as u16;
            direction[i] = Direction::of(dx, dy);
        }
    }

    let mag = |x: isize, y: isize| -> i32 {
        if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
            0
        } else {
            i32::from(magnitude[y as usize * w + x as usize])
        }
    };

    // Non-maximum suppression along the gradient direction
    let mut strong = Vec::new();
    let mut candidate = vec![false; w * h];
    for y in 0..h as isize {
        for x in 0..w as isize {
            let i = y as usize * w + x as usize;
            let m = i32::from(magnitude[i]);
            if m <= low {
                continue;
            }

            let (n1, n2) = match direction[i] {
                Direction::Horizontal => (mag(x - 1, y), mag(x + 1, y)),
                Direction::Vertical => (mag(x, y - 1), mag(x, y + 1)),
                Direction::Diagonal => (mag(x - 1, y - 1), mag(x + 1, y + 1)),
                Direction::AntiDiagonal => (mag(x + 1, y - 1), mag(x - 1, y + 1)),
            };

            if m > n1 && m >= n2 {
                candidate[i] = true;
                if m > high {
                    strong.push(i);
                }
            }
        }
    }

    // Hysteresis: grow strong edges through connected candidates
    while let Some(i) = strong.pop() {
        if edges[i] {
            continue;
        }
        edges[i] = true;

        let (x, y) = ((i % w) as isize, (i / w) as isize);
        for dy in -1..=1isize {
            for dx in -1..=1isize {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let j = ny as usize * w + nx as usize;
                if candidate[j] && !edges[j] {
                    strong.push(j);
                }
            }
        }
    }

    edges
}
