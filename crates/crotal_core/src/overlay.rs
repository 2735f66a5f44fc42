//! Painting detection rectangles onto a decoded image.

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayStyle {
    pub stroke_width: u32,
    pub color: Rgba<u8>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke_width: 5,
            color: Rgba([0x1c, 0x7f, 0xff, 0xff]),
        }
    }
}

/// Parse `#rrggbb` (the leading `#` is optional).
pub fn parse_hex_color(raw: &str) -> Result<Rgba<u8>> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        anyhow::bail!("expected a #rrggbb colour, got {raw:?}");
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .with_context(|| format!("expected a #rrggbb colour, got {raw:?}"))
    };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 0xff]))
}

/// One-pixel outlines `[x, y, width, height]` that together form a stroke of
/// `width` centred on the rectangle path. Degenerate inner rings are dropped.
pub fn stroke_rings(rect: [i64; 4], width: u32) -> Vec<[i64; 4]> {
    let [mut x, mut y, mut w, mut h] = rect;
    if w < 0 {
        x = x.saturating_add(w);
        w = w.saturating_neg();
    }
    if h < 0 {
        y = y.saturating_add(h);
        h = h.saturating_neg();
    }
    let half = i64::from(width / 2);
    let mut rings = Vec::with_capacity(width as usize);
    for d in -half..i64::from(width) - half {
        let (rw, rh) = (w.saturating_sub(2 * d), h.saturating_sub(2 * d));
        if rw < 1 || rh < 1 {
            continue;
        }
        rings.push([x.saturating_add(d), y.saturating_add(d), rw, rh]);
    }
    rings
}

/// Stroke every rectangle in order. Returns how many were painted; rectangles
/// outside the image still count even though nothing visible changes.
pub fn paint_rects(image: &mut RgbaImage, rects: &[[i64; 4]], style: &OverlayStyle) -> usize {
    for rect in rects {
        for ring in stroke_rings(*rect, style.stroke_width) {
            paint_ring(image, ring, style.color);
        }
    }
    rects.len()
}

/// Draw the four sides of a one-pixel outline, each clipped to the image first.
fn paint_ring(image: &mut RgbaImage, [x, y, w, h]: [i64; 4], color: Rgba<u8>) {
    let right = x.saturating_add(w - 1);
    let bottom = y.saturating_add(h - 1);
    let sides = [
        (x, y, w, 1),
        (x, bottom, w, 1),
        (x, y, 1, h),
        (right, y, 1, h),
    ];
    let (img_w, img_h) = image.dimensions();
    for (sx, sy, sw, sh) in sides {
        if let Some((cx, cw)) = clip_span(sx, sw, img_w)
            && let Some((cy, ch)) = clip_span(sy, sh, img_h)
        {
            draw_filled_rect_mut(image, Rect::at(cx, cy).of_size(cw, ch), color);
        }
    }
}

/// Intersect `start..start + len` with `0..limit`.
fn clip_span(start: i64, len: i64, limit: u32) -> Option<(i32, u32)> {
    let lo = start.max(0);
    let hi = start.saturating_add(len).min(i64::from(limit));
    (hi > lo).then(|| (lo as i32, (hi - lo) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn blank(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, WHITE)
    }

    #[rstest]
    #[case("#1c7fff", [0x1c, 0x7f, 0xff, 0xff])]
    #[case("000000", [0, 0, 0, 0xff])]
    #[case(" #FFa500 ", [0xff, 0xa5, 0x00, 0xff])]
    fn parses_hex_colours(#[case] raw: &str, #[case] expected: [u8; 4]) {
        assert_eq!(parse_hex_color(raw).unwrap(), Rgba(expected));
    }

    #[rstest]
    #[case("blue")]
    #[case("#12345")]
    #[case("#gg0000")]
    #[case("#ééé")]
    fn rejects_bad_colours(#[case] raw: &str) {
        assert!(parse_hex_color(raw).is_err());
    }

    #[test]
    fn stroke_is_centred_on_the_path() {
        let mut img = blank(20, 20);
        let style = OverlayStyle::default();
        assert_eq!(paint_rects(&mut img, &[[5, 5, 10, 10]], &style), 1);

        assert_eq!(*img.get_pixel(5, 5), style.color);
        assert_eq!(*img.get_pixel(3, 3), style.color);
        assert_eq!(*img.get_pixel(7, 7), style.color);
        assert_eq!(*img.get_pixel(2, 2), WHITE);
        assert_eq!(*img.get_pixel(8, 8), WHITE);
        assert_eq!(*img.get_pixel(10, 10), WHITE);
    }

    #[test]
    fn stroke_width_does_not_scale_with_image() {
        let style = OverlayStyle::default();
        for size in [40u32, 400] {
            let mut img = blank(size, size);
            paint_rects(&mut img, &[[10, 10, 20, 20]], &style);
            let left_of_stroke = (0..size)
                .filter(|&y| *img.get_pixel(5, y) != WHITE)
                .count();
            assert_eq!(left_of_stroke, 0);
            let column: Vec<u32> = (0..size)
                .filter(|&x| *img.get_pixel(x, 20) != WHITE)
                .collect();
            assert_eq!(column, vec![8, 9, 10, 11, 12, 27, 28, 29, 30, 31]);
        }
    }

    #[test]
    fn rings_follow_input_geometry() {
        let rings = stroke_rings([10, 10, 4, 4], 5);
        let tops: Vec<(i64, i64, i64)> = rings.iter().map(|r| (r[0], r[1], r[2])).collect();
        assert_eq!(tops, vec![(8, 8, 8), (9, 9, 6), (10, 10, 4), (11, 11, 2)]);
    }

    #[test]
    fn negative_size_is_normalised() {
        assert_eq!(stroke_rings([14, 14, -4, -4], 1), stroke_rings([10, 10, 4, 4], 1));
    }

    #[test]
    fn off_image_rects_are_counted_but_harmless() {
        let mut img = blank(10, 10);
        let count = paint_rects(
            &mut img,
            &[[100, 100, 5, 5], [-50, -50, 2, 2]],
            &OverlayStyle::default(),
        );
        assert_eq!(count, 2);
        assert!(img.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn huge_rects_are_clipped_to_the_image() {
        let mut img = blank(10, 10);
        let started = std::time::Instant::now();
        let count = paint_rects(
            &mut img,
            &[[0, 0, 50_000_000, 50_000_000], [i64::MIN, i64::MIN, i64::MAX, i64::MAX]],
            &OverlayStyle::default(),
        );
        assert_eq!(count, 2);
        assert!(started.elapsed() < std::time::Duration::from_millis(200));
        assert_eq!(*img.get_pixel(0, 0), OverlayStyle::default().color);
        assert_eq!(*img.get_pixel(2, 2), OverlayStyle::default().color);
        assert_eq!(*img.get_pixel(5, 5), WHITE);
    }

    #[test]
    fn partially_visible_rect_keeps_its_visible_sides() {
        let mut img = blank(20, 20);
        let style = OverlayStyle {
            stroke_width: 1,
            ..OverlayStyle::default()
        };
        paint_rects(&mut img, &[[-5, 5, 10, 10]], &style);
        // Left side is off-image; top, bottom and right remain.
        assert_eq!(*img.get_pixel(0, 5), style.color);
        assert_eq!(*img.get_pixel(4, 14), style.color);
        assert_eq!(*img.get_pixel(4, 9), style.color);
        assert_eq!(*img.get_pixel(0, 9), WHITE);
        assert_eq!(*img.get_pixel(5, 9), WHITE);
    }

    #[test]
    fn empty_list_leaves_image_untouched() {
        let mut img = blank(8, 8);
        assert_eq!(paint_rects(&mut img, &[], &OverlayStyle::default()), 0);
        assert!(img.pixels().all(|p| *p == WHITE));
    }
}
