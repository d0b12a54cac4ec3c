//! # GL Enum Names
//!
//! Turns the enum values seen by [`LoggingBackend`](super::LoggingBackend)
//! into readable names. Values without a name print as `0x..`.

use std::borrow::Cow;

use crate::gl::*;

fn hex(value: GLenum) -> Cow<'static, str> {
    Cow::Owned(format!("0x{value:x}"))
}

/// Name of an `glEnable`/`glDisable`/client-state capability.
#[must_use]
pub fn cap_name(cap: GLenum) -> Cow<'static, str> {
    let name = match cap {
        GL_TEXTURE_2D => "GL_TEXTURE_2D",
        GL_BLEND => "GL_BLEND",
        GL_DEPTH_TEST => "GL_DEPTH_TEST",
        GL_CULL_FACE => "GL_CULL_FACE",
        GL_CLIP_PLANE0 => "GL_CLIP_PLANE0",
        GL_COLOR_ARRAY => "GL_COLOR_ARRAY",
        GL_TEXTURE_COORD_ARRAY => "GL_TEXTURE_COORD_ARRAY",
        GL_VERTEX_ARRAY => "GL_VERTEX_ARRAY",
        GL_NORMAL_ARRAY => "GL_NORMAL_ARRAY",
        GL_ALPHA_TEST => "GL_ALPHA_TEST",
        GL_STENCIL_TEST => "GL_STENCIL_TEST",
        GL_SCISSOR_TEST => "GL_SCISSOR_TEST",
        GL_POLYGON_OFFSET_FILL => "GL_POLYGON_OFFSET_FILL",
        _ => return hex(cap),
    };
    Cow::Borrowed(name)
}

/// Name of a primitive mode.
#[must_use]
pub fn prim_name(mode: GLenum) -> Cow<'static, str> {
    let name = match mode {
        GL_TRIANGLES => "GL_TRIANGLES",
        GL_TRIANGLE_STRIP => "GL_TRIANGLE_STRIP",
        GL_TRIANGLE_FAN => "GL_TRIANGLE_FAN",
        GL_QUADS => "GL_QUADS",
        GL_QUAD_STRIP => "GL_QUAD_STRIP",
        GL_POLYGON => "GL_POLYGON",
        GL_POINTS => "GL_POINTS",
        GL_LINES => "GL_LINES",
        GL_LINE_STRIP => "GL_LINE_STRIP",
        GL_LINE_LOOP => "GL_LINE_LOOP",
        _ => return hex(mode),
    };
    Cow::Borrowed(name)
}

/// Name of a depth or alpha comparison function.
#[must_use]
pub fn func_name(func: GLenum) -> Cow<'static, str> {
    let name = match func {
        GL_ALWAYS => "GL_ALWAYS",
        GL_NEVER => "GL_NEVER",
        GL_LEQUAL => "GL_LEQUAL",
        GL_LESS => "GL_LESS",
        GL_EQUAL => "GL_EQUAL",
        GL_GREATER => "GL_GREATER",
        GL_GEQUAL => "GL_GEQUAL",
        GL_NOTEQUAL => "GL_NOTEQUAL",
        _ => return hex(func),
    };
    Cow::Borrowed(name)
}

/// Name of an index or vertex component type.
#[must_use]
pub fn type_name(ty: GLenum) -> Cow<'static, str> {
    let name = match ty {
        GL_BYTE => "GL_BYTE",
        GL_UNSIGNED_BYTE => "GL_UNSIGNED_BYTE",
        GL_SHORT => "GL_SHORT",
        GL_UNSIGNED_SHORT => "GL_UNSIGNED_SHORT",
        GL_INT => "GL_INT",
        GL_UNSIGNED_INT => "GL_UNSIGNED_INT",
        GL_FLOAT => "GL_FLOAT",
        GL_DOUBLE => "GL_DOUBLE",
        _ => return hex(ty),
    };
    Cow::Borrowed(name)
}

/// Name of a blend factor.
#[must_use]
pub fn blend_name(factor: GLenum) -> Cow<'static, str> {
    let name = match factor {
        GL_ONE => "GL_ONE",
        GL_ZERO => "GL_ZERO",
        GL_SRC_COLOR => "GL_SRC_COLOR",
        GL_ONE_MINUS_SRC_COLOR => "GL_ONE_MINUS_SRC_COLOR",
        GL_SRC_ALPHA => "GL_SRC_ALPHA",
        GL_ONE_MINUS_SRC_ALPHA => "GL_ONE_MINUS_SRC_ALPHA",
        GL_DST_COLOR => "GL_DST_COLOR",
        GL_ONE_MINUS_DST_COLOR => "GL_ONE_MINUS_DST_COLOR",
        GL_DST_ALPHA => "GL_DST_ALPHA",
        GL_ONE_MINUS_DST_ALPHA => "GL_ONE_MINUS_DST_ALPHA",
        GL_SRC_ALPHA_SATURATE => "GL_SRC_ALPHA_SATURATE",
        _ => return hex(factor),
    };
    Cow::Borrowed(name)
}

/// `GL_TRUE` or `GL_FALSE`.
#[must_use]
pub const fn bool_name(flag: bool) -> &'static str {
    if flag {
        "GL_TRUE"
    } else {
        "GL_FALSE"
    }
}

/// Lists the buffer bits set in a `glClear` mask.
#[must_use]
pub fn clear_bits(mask: GLbitfield) -> String {
    const BITS: [(GLbitfield, &str); 4] = [
        (GL_COLOR_BUFFER_BIT, "GL_COLOR_BUFFER_BIT"),
        (GL_DEPTH_BUFFER_BIT, "GL_DEPTH_BUFFER_BIT"),
        (GL_STENCIL_BUFFER_BIT, "GL_STENCIL_BUFFER_BIT"),
        (GL_ACCUM_BUFFER_BIT, "GL_ACCUM_BUFFER_BIT"),
    ];

    BITS.iter()
        .filter(|(bit, _)| mask & bit != 0)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(cap_name(GL_BLEND), "GL_BLEND");
        assert_eq!(prim_name(GL_TRIANGLE_FAN), "GL_TRIANGLE_FAN");
        assert_eq!(func_name(GL_LEQUAL), "GL_LEQUAL");
        assert_eq!(type_name(GL_UNSIGNED_SHORT), "GL_UNSIGNED_SHORT");
        assert_eq!(blend_name(GL_ONE_MINUS_SRC_ALPHA), "GL_ONE_MINUS_SRC_ALPHA");
        assert_eq!(bool_name(true), "GL_TRUE");
    }

    #[test]
    fn test_unknown_values_print_as_hex() {
        assert_eq!(cap_name(0xBEEF), "0xbeef");
        assert_eq!(prim_name(0x42), "0x42");
        assert_eq!(func_name(0), "0x0");
        assert_eq!(type_name(0x1499), "0x1499");
        assert_eq!(blend_name(0x0999), "0x999");
    }

    #[test]
    fn test_clear_bits() {
        assert_eq!(
            clear_bits(GL_COLOR_BUFFER_BIT | GL_DEPTH_BUFFER_BIT),
            "GL_COLOR_BUFFER_BIT GL_DEPTH_BUFFER_BIT"
        );
        assert_eq!(clear_bits(0), "");
    }
}
