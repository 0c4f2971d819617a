//! CPU-side pixel unpacking applied before texture uploads.
//!
//! Order is fixed: rows are flipped per 2D slice first, then alpha is
//! premultiplied. The result is a fresh buffer that only lives for the
//! native upload call it is produced for.

use tracing::trace;

use crate::constants::*;
use crate::formats;

/// Unpack state set through `pixelStorei`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackOptions {
    pub flip_y: bool,
    pub premultiply_alpha: bool,
    pub alignment: u32,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self {
            flip_y: false,
            premultiply_alpha: false,
            alignment: formats::DEFAULT_ALIGNMENT,
        }
    }
}

impl UnpackOptions {
    /// True when no CPU-side transform is needed.
    pub fn is_identity(&self) -> bool {
        !self.flip_y && !self.premultiply_alpha
    }
}

/// Flip and/or premultiply `raw`, laid out as `depth` slices of `height`
/// rows in `(format, ty)`.
///
/// Bytes past the end of the last full row and alignment padding are copied
/// through unchanged.
pub fn unpack_pixels(
    ty: u32,
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    raw: &[u8],
    options: &UnpackOptions,
) -> Vec<u8> {
    let mut out = raw.to_vec();
    let pixel_size = formats::pixel_size(format, ty);
    if pixel_size == 0 || width == 0 || height == 0 || depth == 0 {
        return out;
    }

    let row_bytes = width as usize * pixel_size as usize;
    let stride = formats::compute_row_stride_aligned(width, pixel_size, options.alignment);
    let height = height as usize;
    let rows = height * depth as usize;

    trace!(
        width,
        height,
        depth,
        flip_y = options.flip_y,
        premultiply = options.premultiply_alpha,
        "unpacking pixels"
    );

    if options.flip_y {
        for slice in 0..depth as usize {
            for y in 0..height {
                let src = (slice * height + y) * stride;
                let dst = (slice * height + (height - 1 - y)) * stride;
                if src + row_bytes <= raw.len() && dst + row_bytes <= out.len() {
                    out[dst..dst + row_bytes].copy_from_slice(&raw[src..src + row_bytes]);
                }
            }
        }
    }

    if options.premultiply_alpha {
        for row in 0..rows {
            let start = row * stride;
            if let Some(bytes) = out.get_mut(start..start + row_bytes) {
                premultiply_row(bytes, format, ty);
            }
        }
    }

    out
}

fn premultiply_row(row: &mut [u8], format: u32, ty: u32) {
    match (format, ty) {
        (RGBA, UNSIGNED_BYTE) => {
            for px in row.chunks_exact_mut(4) {
                let alpha = px[3];
                for c in &mut px[..3] {
                    *c = mul_u8(*c, alpha);
                }
            }
        }
        (LUMINANCE_ALPHA, UNSIGNED_BYTE) => {
            for px in row.chunks_exact_mut(2) {
                px[0] = mul_u8(px[0], px[1]);
            }
        }
        (RGBA, FLOAT) => premultiply_f32(row, 4),
        (LUMINANCE_ALPHA, FLOAT) => premultiply_f32(row, 2),
        (RGBA, UNSIGNED_SHORT_4_4_4_4) => {
            for px in row.chunks_exact_mut(2) {
                let v = u16::from_ne_bytes([px[0], px[1]]);
                let a = v & 0xF;
                let scale = |c: u16| (c * a + 7) / 15;
                let r = scale(v >> 12);
                let g = scale((v >> 8) & 0xF);
                let b = scale((v >> 4) & 0xF);
                px.copy_from_slice(&((r << 12) | (g << 8) | (b << 4) | a).to_ne_bytes());
            }
        }
        (RGBA, UNSIGNED_SHORT_5_5_5_1) => {
            for px in row.chunks_exact_mut(2) {
                let v = u16::from_ne_bytes([px[0], px[1]]);
                if v & 1 == 0 {
                    px.copy_from_slice(&0u16.to_ne_bytes());
                }
            }
        }
        // No alpha channel, or a layout we leave to the driver.
        _ => trace!(format, ty, "premultiply not applicable"),
    }
}

fn premultiply_f32(row: &mut [u8], components: usize) {
    for px in row.chunks_exact_mut(components * 4) {
        let alpha_at = (components - 1) * 4;
        let alpha = f32::from_ne_bytes([
            px[alpha_at],
            px[alpha_at + 1],
            px[alpha_at + 2],
            px[alpha_at + 3],
        ]);
        for c in px[..alpha_at].chunks_exact_mut(4) {
            let value = f32::from_ne_bytes([c[0], c[1], c[2], c[3]]) * alpha;
            c.copy_from_slice(&value.to_ne_bytes());
        }
    }
}

fn mul_u8(c: u8, alpha: u8) -> u8 {
    ((c as u32 * alpha as u32 + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    // Row 0: opaque orange, fully transparent blue-ish.
    // Row 1: half-transparent white, opaque grey.
    const RGBA_2X2: [u8; 16] = [
        200, 100, 50, 255, 10, 20, 30, 0, //
        255, 255, 255, 128, 60, 60, 60, 255,
    ];

    fn opts(flip_y: bool, premultiply_alpha: bool) -> UnpackOptions {
        UnpackOptions {
            flip_y,
            premultiply_alpha,
            ..Default::default()
        }
    }

    fn unpack_rgba(raw: &[u8], options: UnpackOptions) -> Vec<u8> {
        unpack_pixels(UNSIGNED_BYTE, RGBA, 2, 2, 1, raw, &options)
    }

    #[test]
    fn test_flip_only_reorders_rows() {
        let out = unpack_rgba(&RGBA_2X2, opts(true, false));
        assert_eq!(&out[..8], &RGBA_2X2[8..]);
        assert_eq!(&out[8..], &RGBA_2X2[..8]);
    }

    #[test]
    fn test_premultiply_only_scales_colors() {
        let out = unpack_rgba(&RGBA_2X2, opts(false, true));
        assert_eq!(
            out,
            vec![200, 100, 50, 255, 0, 0, 0, 0, 128, 128, 128, 128, 60, 60, 60, 255]
        );
    }

    #[test]
    fn test_flip_then_premultiply_composes() {
        let flipped = unpack_rgba(&RGBA_2X2, opts(true, false));
        let expected = unpack_rgba(&flipped, opts(false, true));
        assert_eq!(unpack_rgba(&RGBA_2X2, opts(true, true)), expected);
        assert_eq!(&expected[..4], &[128, 128, 128, 128]);
    }

    #[test]
    fn test_identity_copies_input() {
        assert!(opts(false, false).is_identity());
        assert_eq!(unpack_rgba(&RGBA_2X2, opts(false, false)), RGBA_2X2.to_vec());
    }

    #[test]
    fn test_flip_preserves_row_padding() {
        // 1x2 RGB: each row is 3 bytes padded to 4.
        let raw = [1, 2, 3, 0xEE, 4, 5, 6];
        let out = unpack_pixels(UNSIGNED_BYTE, RGB, 1, 2, 1, &raw, &opts(true, false));
        assert_eq!(out, vec![4, 5, 6, 0xEE, 1, 2, 3]);
    }

    #[test]
    fn test_flip_is_per_slice() {
        // 1x2x2 LUMINANCE at alignment 1: slices [1,2] and [3,4].
        let options = UnpackOptions {
            flip_y: true,
            premultiply_alpha: false,
            alignment: 1,
        };
        let out = unpack_pixels(UNSIGNED_BYTE, LUMINANCE, 1, 2, 2, &[1, 2, 3, 4], &options);
        assert_eq!(out, vec![2, 1, 4, 3]);
    }

    #[test]
    fn test_premultiply_float_rgba() {
        let raw: Vec<u8> = [0.5f32, 1.0, 0.25, 0.5]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        let out = unpack_pixels(FLOAT, RGBA, 1, 1, 1, &raw, &opts(false, true));
        let values: Vec<f32> = out
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(values, vec![0.25, 0.5, 0.125, 0.5]);
    }

    #[test]
    fn test_premultiply_luminance_alpha() {
        let out = unpack_pixels(
            UNSIGNED_BYTE,
            LUMINANCE_ALPHA,
            2,
            1,
            1,
            &[255, 0, 255, 255],
            &opts(false, true),
        );
        assert_eq!(out, vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_premultiply_packed_5551_clears_transparent() {
        let opaque = 0xFFFFu16.to_ne_bytes();
        let clear = 0xFFFEu16.to_ne_bytes();
        let raw = [opaque[0], opaque[1], clear[0], clear[1]];
        let out = unpack_pixels(UNSIGNED_SHORT_5_5_5_1, RGBA, 2, 1, 1, &raw, &opts(false, true));
        assert_eq!(out, vec![opaque[0], opaque[1], 0, 0]);
    }

    #[test]
    fn test_premultiply_ignores_formats_without_alpha() {
        let raw = [10, 20, 30, 0];
        let out = unpack_pixels(UNSIGNED_BYTE, RGB, 1, 1, 1, &raw, &opts(false, true));
        assert_eq!(out, raw.to_vec());
    }
}
