use std::path::PathBuf;

use thiserror::Error;

/// Failure to load or parse a font resource.
#[derive(Error, Debug)]
pub enum FontError {
    #[error("failed to read font file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("font data contains no usable face")]
    NoFaces,

    #[error("no face registered with id {0:?}")]
    UnknownFace(fontdb::ID),

    #[error("failed to parse face {id:?}: {message}")]
    Parse { id: fontdb::ID, message: String },

    #[error("no installed face matches the query")]
    NoMatchingFace,
}

/// Failure to rasterize a single code point.
///
/// The cache builder treats every variant as "absent" and moves on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterizeError {
    #[error("font has no glyph for {0:?}")]
    MissingGlyph(char),

    #[error("pixel height must be positive and finite, got {0}")]
    InvalidPixelHeight(f32),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("pixel height must be positive and finite, got {0}")]
    InvalidPixelHeight(f32),
}

/// Failure to create or drive the shader program.
#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("failed to read shader source {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader failed validation: {0}")]
    Compile(String),

    #[error("shader has no uniform named {0:?}")]
    UnknownUniform(String),

    #[error("uniform {name:?} takes {expected} bytes, got {actual}")]
    UniformSize {
        name: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("wireframe rendering needs the POLYGON_MODE_LINE device feature")]
    WireframeUnsupported,

    #[error("glyph bitmap {width}x{height} exceeds the device limit of {max}")]
    GlyphTooLarge { width: u32, height: u32, max: u32 },
}
