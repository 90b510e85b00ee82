use crate::braille::BrailleCanvas;

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

/// Draw a line `weight` Braille pixels wide. Weights below 2 draw a hairline.
pub fn draw_weighted_line(
    canvas: &mut BrailleCanvas,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    weight: f64,
) {
    draw_line(canvas, x0, y0, x1, y1);
    if weight >= 2.0 {
        draw_line(canvas, x0 + 1, y0, x1 + 1, y1);
        draw_line(canvas, x0, y0 + 1, x1, y1 + 1);
    }
}

/// Draw a filled disc. Non-positive radii draw nothing; radii under one
/// pixel still light the center dot.
pub fn draw_disc(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: f64) {
    if radius.is_nan() || radius <= 0.0 {
        return;
    }
    let r2 = radius * radius;
    for_each_in_box(canvas, cx, cy, radius, |d2| d2 <= r2);
    canvas.set_pixel_signed(cx, cy);
}

/// Draw the one-pixel outline of a disc
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: f64) {
    if radius.is_nan() || radius < 1.0 {
        return;
    }
    let outer = radius * radius;
    let inner = (radius - 1.0) * (radius - 1.0);
    for_each_in_box(canvas, cx, cy, radius, |d2| d2 <= outer && d2 > inner);
}

/// Set every pixel of the disc's bounding box that lies on the canvas and
/// whose squared distance from the center passes `keep`.
fn for_each_in_box<F>(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: f64, keep: F)
where
    F: Fn(f64) -> bool,
{
    let r = radius.ceil() as i64;
    let (cx, cy) = (cx as i64, cy as i64);
    let max_x = canvas.width() as i64 * 2 - 1;
    let max_y = canvas.height() as i64 * 4 - 1;

    for y in cy.saturating_sub(r).max(0)..=cy.saturating_add(r).min(max_y) {
        let dy = (y - cy) as f64;
        for x in cx.saturating_sub(r).max(0)..=cx.saturating_add(r).min(max_x) {
            let dx = (x - cx) as f64;
            if keep(dx * dx + dy * dy) {
                canvas.set_pixel(x as usize, y as usize);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_weighted_line_is_wider() {
        let mut thin = BrailleCanvas::new(5, 2);
        draw_weighted_line(&mut thin, 0, 0, 9, 0, 1.0);
        let mut thick = BrailleCanvas::new(5, 2);
        draw_weighted_line(&mut thick, 0, 0, 9, 0, 2.0);
        assert_eq!(thin.to_string(), "⠉⠉⠉⠉⠉\n⠀⠀⠀⠀⠀");
        assert_eq!(thick.to_string(), "⠛⠛⠛⠛⠛\n⠀⠀⠀⠀⠀");
    }

    #[test]
    fn test_disc_degenerate_radius() {
        let mut canvas = BrailleCanvas::new(4, 4);
        draw_disc(&mut canvas, 4, 8, 0.0);
        draw_disc(&mut canvas, 4, 8, -2.0);
        draw_disc(&mut canvas, 4, 8, f64::NAN);
        assert_eq!(canvas.cells().count(), 0);

        draw_disc(&mut canvas, 4, 8, 0.3);
        assert_eq!(canvas.cells().count(), 1);
    }

    #[test]
    fn test_disc_grows_with_radius() {
        let dots = |radius: f64| {
            let mut canvas = BrailleCanvas::new(20, 10);
            draw_disc(&mut canvas, 20, 20, radius);
            canvas
                .cells()
                .map(|c| (c.glyph as u32 - 0x2800).count_ones())
                .sum::<u32>()
        };
        assert!(dots(2.0) < dots(4.0));
        assert!(dots(4.0) < dots(8.0));
    }

    #[test]
    fn test_huge_disc_clipped_to_canvas() {
        let mut canvas = BrailleCanvas::new(3, 2);
        draw_disc(&mut canvas, 2, 3, 2e10);
        assert_eq!(canvas.to_string(), "⣿⣿⣿\n⣿⣿⣿");

        let mut ring = BrailleCanvas::new(3, 2);
        draw_ring(&mut ring, i32::MAX, i32::MIN, f64::INFINITY);
        draw_disc(&mut ring, i32::MIN, i32::MAX, 1e300);
        assert_eq!(ring.cells().count(), 6);
    }
}
