//! Format/type validation and pixel-size arithmetic.
//!
//! Everything here is pure. [`verify_format`] decides whether an
//! (internalformat, format, type) triple is legal at all; [`pixel_size`]
//! decides whether this layer knows how to size it. A legal triple whose
//! pixel size is zero is uploaded as a silent no-op by the context.

use crate::constants::*;

/// Default `UNPACK_ALIGNMENT`.
pub const DEFAULT_ALIGNMENT: u32 = 4;

/// Legal (internalformat, format, type) triples.
///
/// Unsized entries repeat the format as the internal format.
const FORMAT_TABLE: &[(u32, u32, u32)] = &[
    // Unsized
    (RGB, RGB, UNSIGNED_BYTE),
    (RGB, RGB, UNSIGNED_SHORT_5_6_5),
    (RGBA, RGBA, UNSIGNED_BYTE),
    (RGBA, RGBA, UNSIGNED_SHORT_4_4_4_4),
    (RGBA, RGBA, UNSIGNED_SHORT_5_5_5_1),
    (LUMINANCE_ALPHA, LUMINANCE_ALPHA, UNSIGNED_BYTE),
    (LUMINANCE, LUMINANCE, UNSIGNED_BYTE),
    (ALPHA, ALPHA, UNSIGNED_BYTE),
    // R
    (R8, RED, UNSIGNED_BYTE),
    (R8_SNORM, RED, BYTE),
    (R16F, RED, HALF_FLOAT),
    (R16F, RED, FLOAT),
    (R32F, RED, FLOAT),
    (R8UI, RED_INTEGER, UNSIGNED_BYTE),
    (R8I, RED_INTEGER, BYTE),
    (R16UI, RED_INTEGER, UNSIGNED_SHORT),
    (R16I, RED_INTEGER, SHORT),
    (R32UI, RED_INTEGER, UNSIGNED_INT),
    (R32I, RED_INTEGER, INT),
    // RG
    (RG8, RG, UNSIGNED_BYTE),
    (RG8_SNORM, RG, BYTE),
    (RG16F, RG, HALF_FLOAT),
    (RG16F, RG, FLOAT),
    (RG32F, RG, FLOAT),
    (RG8UI, RG_INTEGER, UNSIGNED_BYTE),
    (RG8I, RG_INTEGER, BYTE),
    (RG16UI, RG_INTEGER, UNSIGNED_SHORT),
    (RG16I, RG_INTEGER, SHORT),
    (RG32UI, RG_INTEGER, UNSIGNED_INT),
    (RG32I, RG_INTEGER, INT),
    // RGB
    (RGB8, RGB, UNSIGNED_BYTE),
    (SRGB8, RGB, UNSIGNED_BYTE),
    (RGB565, RGB, UNSIGNED_BYTE),
    (RGB565, RGB, UNSIGNED_SHORT_5_6_5),
    (RGB8_SNORM, RGB, BYTE),
    (R11F_G11F_B10F, RGB, UNSIGNED_INT_10F_11F_11F_REV),
    (R11F_G11F_B10F, RGB, HALF_FLOAT),
    (R11F_G11F_B10F, RGB, FLOAT),
    (RGB9_E5, RGB, UNSIGNED_INT_5_9_9_9_REV),
    (RGB9_E5, RGB, HALF_FLOAT),
    (RGB9_E5, RGB, FLOAT),
    (RGB16F, RGB, HALF_FLOAT),
    (RGB16F, RGB, FLOAT),
    (RGB32F, RGB, FLOAT),
    (RGB8UI, RGB_INTEGER, UNSIGNED_BYTE),
    (RGB8I, RGB_INTEGER, BYTE),
    (RGB16UI, RGB_INTEGER, UNSIGNED_SHORT),
    (RGB16I, RGB_INTEGER, SHORT),
    (RGB32UI, RGB_INTEGER, UNSIGNED_INT),
    (RGB32I, RGB_INTEGER, INT),
    // RGBA
    (RGBA8, RGBA, UNSIGNED_BYTE),
    (SRGB8_ALPHA8, RGBA, UNSIGNED_BYTE),
    (RGBA8_SNORM, RGBA, BYTE),
    (RGB5_A1, RGBA, UNSIGNED_BYTE),
    (RGB5_A1, RGBA, UNSIGNED_SHORT_5_5_5_1),
    (RGB5_A1, RGBA, UNSIGNED_INT_2_10_10_10_REV),
    (RGBA4, RGBA, UNSIGNED_BYTE),
    (RGBA4, RGBA, UNSIGNED_SHORT_4_4_4_4),
    (RGB10_A2, RGBA, UNSIGNED_INT_2_10_10_10_REV),
    (RGBA16F, RGBA, HALF_FLOAT),
    (RGBA16F, RGBA, FLOAT),
    (RGBA32F, RGBA, FLOAT),
    (RGBA8UI, RGBA_INTEGER, UNSIGNED_BYTE),
    (RGBA8I, RGBA_INTEGER, BYTE),
    (RGB10_A2UI, RGBA_INTEGER, UNSIGNED_INT_2_10_10_10_REV),
    (RGBA16UI, RGBA_INTEGER, UNSIGNED_SHORT),
    (RGBA16I, RGBA_INTEGER, SHORT),
    (RGBA32I, RGBA_INTEGER, INT),
    (RGBA32UI, RGBA_INTEGER, UNSIGNED_INT),
    // Depth / stencil
    (DEPTH_COMPONENT16, DEPTH_COMPONENT, UNSIGNED_SHORT),
    (DEPTH_COMPONENT16, DEPTH_COMPONENT, UNSIGNED_INT),
    (DEPTH_COMPONENT24, DEPTH_COMPONENT, UNSIGNED_INT),
    (DEPTH_COMPONENT32F, DEPTH_COMPONENT, FLOAT),
    (DEPTH24_STENCIL8, DEPTH_STENCIL, UNSIGNED_INT_24_8),
    (DEPTH32F_STENCIL8, DEPTH_STENCIL, FLOAT_32_UNSIGNED_INT_24_8_REV),
];

/// Check an (internalformat, format, type) triple against the WebGL2 table.
pub fn verify_format(internal_format: u32, format: u32, ty: u32) -> bool {
    FORMAT_TABLE
        .iter()
        .any(|&entry| entry == (internal_format, format, ty))
}

/// Whether `internal_format` is a sized internal format.
pub fn is_sized_format(internal_format: u32) -> bool {
    FORMAT_TABLE
        .iter()
        .any(|&(internal, format, _)| internal == internal_format && internal != format)
}

/// The (format, type) an immutable allocation of `internal_format` implies.
pub fn storage_format(internal_format: u32) -> Option<(u32, u32)> {
    FORMAT_TABLE
        .iter()
        .find(|&&(internal, format, _)| internal == internal_format && internal != format)
        .map(|&(_, format, ty)| (format, ty))
}

/// Number of components in a base, unpack or sized internal format. Zero if unknown.
pub fn component_count(format: u32) -> u32 {
    match format {
        RED | RED_INTEGER | ALPHA | LUMINANCE | DEPTH_COMPONENT => 1,
        RG | RG_INTEGER | LUMINANCE_ALPHA | DEPTH_STENCIL => 2,
        RGB | RGB_INTEGER => 3,
        RGBA | RGBA_INTEGER => 4,
        sized => storage_format(sized).map_or(0, |(base, _)| component_count(base)),
    }
}

/// Bytes per pixel for `(internal_format, ty)`, or 0 when unsupported.
///
/// The 32-bit packed types are deliberately unsupported here.
pub fn pixel_size(internal_format: u32, ty: u32) -> u32 {
    let components = component_count(internal_format);
    if components == 0 {
        return 0;
    }
    match ty {
        UNSIGNED_BYTE | BYTE => components,
        UNSIGNED_SHORT | SHORT | HALF_FLOAT => components * 2,
        UNSIGNED_INT | INT | FLOAT => components * 4,
        UNSIGNED_SHORT_5_6_5 if components == 3 => 2,
        UNSIGNED_SHORT_4_4_4_4 | UNSIGNED_SHORT_5_5_5_1 if components == 4 => 2,
        _ => 0,
    }
}

/// Row stride at the default unpack alignment of 4.
pub fn compute_row_stride(width: u32, pixel_size: u32) -> usize {
    compute_row_stride_aligned(width, pixel_size, DEFAULT_ALIGNMENT)
}

/// Row stride rounded up to `alignment` (1, 2, 4 or 8).
pub fn compute_row_stride_aligned(width: u32, pixel_size: u32, alignment: u32) -> usize {
    let row = width as usize * pixel_size as usize;
    let alignment = alignment.max(1) as usize;
    row.div_ceil(alignment) * alignment
}

/// Bytes an upload of `width x height x depth` pixels reads from client memory.
///
/// The last row is not padded out to the alignment.
pub fn image_byte_len(width: u32, height: u32, depth: u32, pixel_size: u32, alignment: u32) -> usize {
    let rows = height as usize * depth as usize;
    if width == 0 || rows == 0 {
        return 0;
    }
    let stride = compute_row_stride_aligned(width, pixel_size, alignment);
    stride * (rows - 1) + width as usize * pixel_size as usize
}

/// Highest valid mip level for a texture whose largest allowed size is `max_size`.
pub fn max_mip_level(max_size: i32) -> usize {
    if max_size <= 1 {
        0
    } else {
        (31 - (max_size as u32).leading_zeros()) as usize
    }
}

/// Number of mip levels a `width x height` image can have.
pub fn mip_level_count(width: i32, height: i32) -> i32 {
    max_mip_level(width.max(height)) as i32 + 1
}

/// Depth-carrying formats.
pub fn is_depth_format(internal_format: u32) -> bool {
    matches!(
        internal_format,
        DEPTH_COMPONENT
            | DEPTH_STENCIL
            | DEPTH_COMPONENT16
            | DEPTH_COMPONENT24
            | DEPTH_COMPONENT32
            | DEPTH_COMPONENT32F
            | DEPTH24_STENCIL8
            | DEPTH32F_STENCIL8
    )
}

/// Stencil-carrying formats.
pub fn has_stencil(internal_format: u32) -> bool {
    matches!(
        internal_format,
        DEPTH_STENCIL | DEPTH24_STENCIL8 | DEPTH32F_STENCIL8 | STENCIL_INDEX8
    )
}

/// Integer color formats (no multisampling, no linear filtering).
pub fn is_integer_format(internal_format: u32) -> bool {
    matches!(
        storage_format(internal_format),
        Some((RED_INTEGER | RG_INTEGER | RGB_INTEGER | RGBA_INTEGER, _))
    )
}

/// A renderbuffer internal format that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderbufferFormat {
    pub internal_format: u32,
    pub integer: bool,
}

/// Validate a renderbuffer internal format.
///
/// Float formats are only renderable when the native layer exposes
/// `EXT_color_buffer_float`.
pub fn renderbuffer_format(internal_format: u32, float_color_buffer: bool) -> Option<RenderbufferFormat> {
    let renderable = match internal_format {
        R8 | RG8 | RGB8 | RGB565 | RGBA4 | RGB5_A1 | RGBA8 | RGB10_A2 | RGB10_A2UI
        | SRGB8_ALPHA8 | R8I | R8UI | R16I | R16UI | R32I | R32UI | RG8I | RG8UI | RG16I
        | RG16UI | RG32I | RG32UI | RGBA8I | RGBA8UI | RGBA16I | RGBA16UI | RGBA32I
        | RGBA32UI => true,
        DEPTH_COMPONENT16 | DEPTH_COMPONENT24 | DEPTH_COMPONENT32 | DEPTH_COMPONENT32F
        | DEPTH24_STENCIL8 | DEPTH32F_STENCIL8 | STENCIL_INDEX8 => true,
        R16F | RG16F | RGBA16F | R32F | RG32F | RGBA32F | R11F_G11F_B10F => float_color_buffer,
        _ => false,
    };
    renderable.then(|| RenderbufferFormat {
        internal_format,
        integer: is_integer_format(internal_format),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_stride_rounds_up_to_four() {
        assert_eq!(compute_row_stride(5, 3), 16);
        assert_eq!(compute_row_stride(4, 4), 16);
        assert_eq!(compute_row_stride(1, 1), 4);
        assert_eq!(compute_row_stride(0, 4), 0);
    }

    #[test]
    fn test_row_stride_honours_alignment() {
        assert_eq!(compute_row_stride_aligned(5, 3, 1), 15);
        assert_eq!(compute_row_stride_aligned(5, 3, 2), 16);
        assert_eq!(compute_row_stride_aligned(5, 3, 8), 16);
        assert_eq!(compute_row_stride_aligned(3, 3, 8), 16);
    }

    #[test]
    fn test_image_byte_len_skips_last_row_padding() {
        // 3 rows of 5 RGB pixels: two padded rows of 16 plus one of 15.
        assert_eq!(image_byte_len(5, 3, 1, 3, 4), 47);
        assert_eq!(image_byte_len(2, 2, 2, 4, 4), 32);
        assert_eq!(image_byte_len(0, 2, 2, 4, 4), 0);
    }

    #[test]
    fn test_verify_format_accepts_table_entries() {
        assert!(verify_format(RGBA, RGBA, UNSIGNED_BYTE));
        assert!(verify_format(RGBA8, RGBA, UNSIGNED_BYTE));
        assert!(verify_format(RGB565, RGB, UNSIGNED_SHORT_5_6_5));
        assert!(verify_format(R32F, RED, FLOAT));
        assert!(verify_format(DEPTH24_STENCIL8, DEPTH_STENCIL, UNSIGNED_INT_24_8));
    }

    #[test]
    fn test_verify_format_rejects_mismatches() {
        assert!(!verify_format(RGBA8, RGB, UNSIGNED_BYTE));
        assert!(!verify_format(RGB, RGBA, UNSIGNED_BYTE));
        assert!(!verify_format(R32F, RED, HALF_FLOAT));
        assert!(!verify_format(RGBA, RGBA, FLOAT));
        assert!(!verify_format(0xDEAD, RGBA, UNSIGNED_BYTE));
    }

    #[test]
    fn test_pixel_size() {
        assert_eq!(pixel_size(RGBA, UNSIGNED_BYTE), 4);
        assert_eq!(pixel_size(RGB, UNSIGNED_BYTE), 3);
        assert_eq!(pixel_size(RGBA32F, FLOAT), 16);
        assert_eq!(pixel_size(RG16F, HALF_FLOAT), 4);
        assert_eq!(pixel_size(RGB, UNSIGNED_SHORT_5_6_5), 2);
        assert_eq!(pixel_size(RGBA4, UNSIGNED_SHORT_4_4_4_4), 2);
        assert_eq!(pixel_size(DEPTH_COMPONENT16, UNSIGNED_SHORT), 2);
    }

    #[test]
    fn test_pixel_size_zero_for_unsupported() {
        assert_eq!(pixel_size(RGB10_A2, UNSIGNED_INT_2_10_10_10_REV), 0);
        assert_eq!(pixel_size(DEPTH24_STENCIL8, UNSIGNED_INT_24_8), 0);
        assert_eq!(pixel_size(RGBA, UNSIGNED_SHORT_5_6_5), 0);
        assert_eq!(pixel_size(0xDEAD, UNSIGNED_BYTE), 0);
    }

    #[test]
    fn test_sized_and_storage_formats() {
        assert!(is_sized_format(RGBA8));
        assert!(!is_sized_format(RGBA));
        assert_eq!(storage_format(RGBA8), Some((RGBA, UNSIGNED_BYTE)));
        assert_eq!(storage_format(R16F), Some((RED, HALF_FLOAT)));
        assert_eq!(storage_format(RGBA), None);
    }

    #[test]
    fn test_mip_levels() {
        assert_eq!(max_mip_level(4096), 12);
        assert_eq!(max_mip_level(1), 0);
        assert_eq!(mip_level_count(8, 3), 4);
        assert_eq!(mip_level_count(1, 1), 1);
    }

    #[test]
    fn test_renderbuffer_formats() {
        assert_eq!(
            renderbuffer_format(RGBA8, false),
            Some(RenderbufferFormat {
                internal_format: RGBA8,
                integer: false
            })
        );
        assert!(renderbuffer_format(RGBA8UI, false).is_some_and(|f| f.integer));
        assert!(renderbuffer_format(RGBA16F, false).is_none());
        assert!(renderbuffer_format(RGBA16F, true).is_some());
        assert!(renderbuffer_format(RGBA, false).is_none());
    }
}
