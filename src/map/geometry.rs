use crate::braille::BrailleCanvas;
use glam::DVec2;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Scanline-fill a polygon given as projected rings (exterior and holes).
///
/// Even-odd rule, sampled at pixel centers. Edge crossings are bucketed per
/// row, so cost scales with the polygon's on-screen perimeter rather than
/// rows x edges.
pub fn fill_polygon(canvas: &mut BrailleCanvas, rings: &[Vec<DVec2>]) {
    let (width, height) = canvas.pixel_size();
    if width == 0 || height == 0 {
        return;
    }

    let (min_y, max_y) = rings
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    if !(min_y.is_finite() && max_y.is_finite()) || max_y < 0.0 || min_y >= height as f64 {
        return;
    }

    let row_start = min_y.max(0.0).floor() as usize;
    let row_end = (max_y.ceil() as usize).min(height); // exclusive
    if row_start >= row_end {
        return;
    }
    let mut crossings: Vec<Vec<f64>> = vec![Vec::new(); row_end - row_start];

    for ring in rings {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        for i in 0..n {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            if a.y == b.y {
                continue;
            }
            let (lo, hi) = if a.y < b.y { (a, b) } else { (b, a) };

            // Rows whose center (r + 0.5) lies in [lo.y, hi.y)
            let first = (lo.y - 0.5).ceil().max(row_start as f64);
            let last = (hi.y - 0.5).ceil().min(row_end as f64);
            if first >= last {
                continue;
            }

            let slope = (hi.x - lo.x) / (hi.y - lo.y);
            for r in first as usize..last as usize {
                let yc = r as f64 + 0.5;
                crossings[r - row_start].push(lo.x + (yc - lo.y) * slope);
            }
        }
    }

    for (offset, xs) in crossings.iter_mut().enumerate() {
        if xs.len() < 2 {
            continue;
        }
        xs.sort_by(f64::total_cmp);
        let y = row_start + offset;
        for pair in xs.chunks_exact(2) {
            // Pixels whose center (x + 0.5) lies in [left, right)
            let left = (pair[0] - 0.5).ceil().max(0.0);
            let right = (pair[1] - 0.5).ceil().min(width as f64);
            if left < right {
                canvas.fill_span(y, left as usize, right as usize);
            }
        }
    }
}
