//! Context configuration: creation attributes and native limits.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::native::NativeGl;

/// `WebGLContextAttributes` as passed to `getContext("webgl2", ...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextAttributes {
    pub alpha: bool,
    pub depth: bool,
    pub stencil: bool,
    pub antialias: bool,
    pub premultiplied_alpha: bool,
    pub preserve_drawing_buffer: bool,
    pub fail_if_major_performance_caveat: bool,
}

impl Default for ContextAttributes {
    fn default() -> Self {
        Self {
            alpha: true,
            depth: true,
            stencil: false,
            antialias: true,
            premultiplied_alpha: true,
            preserve_drawing_buffer: false,
            fail_if_major_performance_caveat: false,
        }
    }
}

impl ContextAttributes {
    /// Parse attributes from the host's JSON dictionary. Missing keys keep
    /// their WebGL defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Implementation limits, queried once from the native layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    pub max_draw_buffers: u32,
    pub max_texture_size: i32,
    pub max_cube_map_texture_size: i32,
    pub max_3d_texture_size: i32,
    pub max_array_texture_layers: i32,
    pub max_renderbuffer_size: i32,
    pub max_samples: i32,
    pub max_texture_units: u32,
    /// What `DEPTH_COMPONENT32` renderbuffer requests map to.
    pub preferred_depth_format: u32,
    /// Float color formats are renderable.
    pub color_buffer_float: bool,
}

impl ContextLimits {
    pub fn query<G: NativeGl>(gl: &mut G) -> Self {
        let preferred_depth_format = if gl.has_extension("GL_OES_depth32") {
            constants::DEPTH_COMPONENT32
        } else if gl.has_extension("GL_OES_depth24") {
            constants::DEPTH_COMPONENT24
        } else {
            constants::DEPTH_COMPONENT16
        };

        Self {
            max_draw_buffers: gl.get_integer(constants::MAX_DRAW_BUFFERS).max(1) as u32,
            max_texture_size: gl.get_integer(constants::MAX_TEXTURE_SIZE),
            max_cube_map_texture_size: gl.get_integer(constants::MAX_CUBE_MAP_TEXTURE_SIZE),
            max_3d_texture_size: gl.get_integer(constants::MAX_3D_TEXTURE_SIZE),
            max_array_texture_layers: gl.get_integer(constants::MAX_ARRAY_TEXTURE_LAYERS),
            max_renderbuffer_size: gl.get_integer(constants::MAX_RENDERBUFFER_SIZE),
            max_samples: gl.get_integer(constants::MAX_SAMPLES),
            max_texture_units: gl
                .get_integer(constants::MAX_COMBINED_TEXTURE_IMAGE_UNITS)
                .max(1) as u32,
            preferred_depth_format,
            color_buffer_float: gl.has_extension("GL_EXT_color_buffer_float"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingGl;

    #[test]
    fn test_default_attributes_match_webgl() {
        let attrs = ContextAttributes::default();
        assert!(attrs.alpha);
        assert!(attrs.premultiplied_alpha);
        assert!(!attrs.stencil);
    }

    #[test]
    fn test_attributes_from_partial_json() {
        let attrs = ContextAttributes::from_json(r#"{"stencil": true, "preserveDrawingBuffer": true}"#)
            .unwrap();
        assert!(attrs.stencil);
        assert!(attrs.preserve_drawing_buffer);
        assert!(attrs.depth);
    }

    #[test]
    fn test_attributes_reject_malformed_json() {
        assert!(ContextAttributes::from_json(r#"{"alpha": "yes"}"#).is_err());
    }

    #[test]
    fn test_limits_query() {
        let mut gl = RecordingGl::new()
            .with_integer(constants::MAX_DRAW_BUFFERS, 8)
            .with_extension("GL_OES_depth24");
        let limits = ContextLimits::query(&mut gl);
        assert_eq!(limits.max_draw_buffers, 8);
        assert_eq!(limits.max_texture_size, 4096);
        assert_eq!(limits.preferred_depth_format, constants::DEPTH_COMPONENT24);
        assert!(!limits.color_buffer_float);
    }
}
