//! Side-by-side composition of two images with a solid separator bar.
//!
//! ```text
//!   ┌────────┬──┬──────────┐
//!   │  left  │▒▒│  right   │   height = max(left, right)
//!   │        │▒▒│          │
//!   └────────┤▒▒│          │   shorter image is top-anchored;
//!            │▒▒│          │   the area below it stays black
//!            └──┴──────────┘
//! ```

use crate::image::{PixelBuffer, PixelFormat, pack_argb, unpack_argb};

/// Width of the separator bar in pixels.
pub const SEPARATOR_WIDTH: u32 = 10;

/// Output format of [`merge`]. Opaque 565 keeps two full frames cheap to hold.
pub const COMPOSITE_FORMAT: PixelFormat = PixelFormat::Rgb565;

/// Output size for two images of the given sizes.
pub fn composite_dimensions(left: (u32, u32), right: (u32, u32)) -> (u32, u32) {
    (
        left.0 + right.0 + SEPARATOR_WIDTH,
        left.1.max(right.1),
    )
}

/// Draw `left` at the origin, a `separator_color` bar after it and `right`
/// after the bar, into a new buffer. Inputs are only borrowed.
///
/// `separator_color` is packed RGB or ARGB; it is drawn fully opaque.
pub fn merge(left: &PixelBuffer, right: &PixelBuffer, separator_color: u32) -> PixelBuffer {
    let (width, height) = composite_dimensions(
        (left.width(), left.height()),
        (right.width(), right.height()),
    );
    let mut out = PixelBuffer::new(width, height, COMPOSITE_FORMAT);

    draw(&mut out, left, 0);

    let bar = 0xFF00_0000 | separator_color;
    for y in 0..height {
        for x in left.width()..left.width() + SEPARATOR_WIDTH {
            out.set_pixel(x, y, bar);
        }
    }

    draw(&mut out, right, left.width() + SEPARATOR_WIDTH);

    tracing::debug!(
        "merged {}x{} and {}x{} into {width}x{height}",
        left.width(),
        left.height(),
        right.width(),
        right.height()
    );
    out
}

/// Source-over `src` onto `dst` with its top-left corner at `(x0, 0)`.
fn draw(dst: &mut PixelBuffer, src: &PixelBuffer, x0: u32) {
    for y in 0..src.height() {
        for x in 0..src.width() {
            let px = src.pixel(x, y);
            let blended = match px >> 24 {
                0xFF => px,
                0 => continue,
                _ => blend_over(px, dst.pixel(x0 + x, y)),
            };
            dst.set_pixel(x0 + x, y, blended);
        }
    }
}

fn blend_over(src: u32, dst: u32) -> u32 {
    let [sa, sr, sg, sb] = unpack_argb(src);
    let [da, dr, dg, db] = unpack_argb(dst);
    let alpha = sa as u32;
    let mix = |s: u8, d: u8| ((s as u32 * alpha + d as u32 * (255 - alpha) + 127) / 255) as u8;
    let out_a = (alpha + (da as u32 * (255 - alpha) + 127) / 255) as u8;
    pack_argb(out_a, mix(sr, dr), mix(sg, dg), mix(sb, db))
}
