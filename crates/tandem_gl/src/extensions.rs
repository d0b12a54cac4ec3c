//! # Extension Probing
//!
//! Reads the driver's extension string once at init and decides which
//! optional features the renderer may use. Multitexturing is mandatory.

use std::collections::BTreeSet;

use tracing::info;

use crate::backend::GraphicsBackend;
use crate::config::PlatformConfig;
use crate::error::{PlatformError, PlatformResult};
use crate::gl::{GL_EXTENSIONS, GL_MAX_TEXTURE_UNITS_ARB};

/// S3 texture compression.
pub const EXT_S3TC: &str = "GL_S3_s3tc";
/// Additive texture environment.
pub const EXT_TEXTURE_ENV_ADD: &str = "GL_EXT_texture_env_add";
/// Multitexturing.
pub const ARB_MULTITEXTURE: &str = "GL_ARB_multitexture";
/// Locked vertex arrays.
pub const EXT_COMPILED_VERTEX_ARRAY: &str = "GL_EXT_compiled_vertex_array";

/// Fewest texture units the renderer runs with.
pub const MIN_TEXTURE_UNITS: i32 = 2;

/// Extension names advertised by the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSet {
    names: BTreeSet<String>,
}

impl ExtensionSet {
    /// Splits a space-separated extension string into names.
    #[must_use]
    pub fn parse(extensions: &str) -> Self {
        Self {
            names: extensions.split_whitespace().map(str::to_owned).collect(),
        }
    }

    /// Whether `name` is advertised. Matches whole names only.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the driver advertised nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Resolves driver entry points by name.
pub trait ProcLookup {
    /// Whether the driver exports `name`.
    fn has_proc(&self, name: &str) -> bool;
}

impl<F: Fn(&str) -> bool> ProcLookup for F {
    fn has_proc(&self, name: &str) -> bool {
        self(name)
    }
}

/// Texture compression scheme in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureCompression {
    /// Uncompressed uploads.
    #[default]
    None,
    /// S3TC.
    S3tc,
}

/// What the renderer may use on this driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlCapabilities {
    /// Compression for texture uploads.
    pub texture_compression: TextureCompression,
    /// `GL_ADD` texture environment available.
    pub texture_env_add: bool,
    /// Swap interval can be set.
    pub swap_control: bool,
    /// Texture units reported by the driver.
    pub texture_units: i32,
    /// `glLockArraysEXT`/`glUnlockArraysEXT` available.
    pub compiled_vertex_array: bool,
}

impl GlCapabilities {
    /// Capabilities reported when no GL driver is in use.
    #[must_use]
    pub const fn placeholder() -> Self {
        Self {
            texture_compression: TextureCompression::None,
            texture_env_add: false,
            swap_control: false,
            texture_units: MIN_TEXTURE_UNITS,
            compiled_vertex_array: false,
        }
    }
}

/// Optional extension: advertised and enabled, advertised but disabled, or absent.
fn optional(extensions: &ExtensionSet, name: &str, enabled: bool) -> bool {
    match (extensions.contains(name), enabled) {
        (true, true) => {
            info!(extension = name, "using extension");
            true
        }
        (true, false) => {
            info!(extension = name, "ignoring extension");
            false
        }
        (false, _) => {
            info!(extension = name, "extension not found");
            false
        }
    }
}

fn require_proc(
    lookup: &dyn ProcLookup,
    extension: &'static str,
    entry_point: &'static str,
) -> PlatformResult<()> {
    if lookup.has_proc(entry_point) {
        Ok(())
    } else {
        Err(PlatformError::MissingEntryPoint { extension, entry_point })
    }
}

/// Decides the capabilities for `extensions` under `config`.
///
/// # Errors
///
/// - [`PlatformError::MissingExtension`] without `GL_ARB_multitexture`
/// - [`PlatformError::MissingEntryPoint`] if a required entry point of a
///   used extension does not resolve
/// - [`PlatformError::TooFewTextureUnits`] below [`MIN_TEXTURE_UNITS`]
pub fn probe_extensions(
    extensions: &ExtensionSet,
    config: &PlatformConfig,
    lookup: &dyn ProcLookup,
    max_texture_units: i32,
) -> PlatformResult<GlCapabilities> {
    info!(advertised = extensions.len(), "initializing GL extensions");

    let texture_compression = if optional(extensions, EXT_S3TC, config.ext_compressed_textures) {
        TextureCompression::S3tc
    } else {
        TextureCompression::None
    };

    let texture_env_add = optional(extensions, EXT_TEXTURE_ENV_ADD, config.ext_texture_env_add);

    let swap_control = lookup.has_proc("wglSwapIntervalEXT");
    if swap_control {
        info!("using WGL_EXT_swap_control");
    } else {
        info!("WGL_EXT_swap_control not found");
    }

    if !extensions.contains(ARB_MULTITEXTURE) {
        return Err(PlatformError::MissingExtension(ARB_MULTITEXTURE));
    }
    require_proc(lookup, ARB_MULTITEXTURE, "glActiveTextureARB")?;
    require_proc(lookup, ARB_MULTITEXTURE, "glClientActiveTextureARB")?;
    if max_texture_units < MIN_TEXTURE_UNITS {
        return Err(PlatformError::TooFewTextureUnits(max_texture_units));
    }
    info!(texture_units = max_texture_units, "using GL_ARB_multitexture");

    let compiled_vertex_array =
        optional(extensions, EXT_COMPILED_VERTEX_ARRAY, config.ext_compiled_vertex_array);
    if compiled_vertex_array {
        require_proc(lookup, EXT_COMPILED_VERTEX_ARRAY, "glLockArraysEXT")?;
        require_proc(lookup, EXT_COMPILED_VERTEX_ARRAY, "glUnlockArraysEXT")?;
    }

    Ok(GlCapabilities {
        texture_compression,
        texture_env_add,
        swap_control,
        texture_units: max_texture_units,
        compiled_vertex_array,
    })
}

/// Queries `backend` for its extension string and texture unit count, then
/// runs [`probe_extensions`].
///
/// # Errors
///
/// As [`probe_extensions`].
pub fn probe_backend(
    backend: &mut dyn GraphicsBackend,
    config: &PlatformConfig,
    lookup: &dyn ProcLookup,
) -> PlatformResult<GlCapabilities> {
    let extensions = ExtensionSet::parse(&backend.get_string(GL_EXTENSIONS));
    let units = backend.get_integer(GL_MAX_TEXTURE_UNITS_ARB);
    probe_extensions(&extensions, config, lookup, units)
}
