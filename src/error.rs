//! Error types for the pack renderer.

use thiserror::Error;

/// Result type alias using RenderError.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Main error type for render operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to read or parse a ZIP archive.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read, decode or encode an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read NBT data.
    #[error("NBT error: {0}")]
    Nbt(#[from] quartz_nbt::io::NbtIoError),

    /// A model, texture, blockstate, item definition or structure is absent.
    #[error("{kind} not found: {key}")]
    AssetNotFound { kind: &'static str, key: String },

    /// An input file violates the expected schema.
    #[error("invalid {path}: {message}")]
    Schema { path: String, message: String },

    /// A model names a parent that does not exist.
    #[error("parent model not found: {0}")]
    ParentMissing(String),

    /// A model's parent chain loops back on itself.
    #[error("cyclic parent chain through {0}")]
    CyclicParent(String),

    /// A special model kind or option the renderer cannot draw.
    #[error("unsupported: {0}")]
    UnsupportedFeature(String),

    /// The render target could not be set up or read back.
    #[error("framebuffer: {0}")]
    Gl(String),

    /// Profile lookup or skin download failed.
    #[error("network: {0}")]
    Network(String),

    /// Invalid render configuration.
    #[error("config: {0}")]
    Config(String),
}

impl RenderError {
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        RenderError::AssetNotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn schema(path: impl Into<String>, message: impl ToString) -> Self {
        RenderError::Schema {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Short label used for the one-line user report.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::Zip(_) | RenderError::Io(_) => "IoError",
            RenderError::Json(_) | RenderError::Schema { .. } | RenderError::CyclicParent(_) => {
                "SchemaError"
            }
            RenderError::Image(_) => "ImageError",
            RenderError::Nbt(_) => "SchemaError",
            RenderError::AssetNotFound { .. } => "AssetNotFound",
            RenderError::ParentMissing(_) => "ParentMissing",
            RenderError::UnsupportedFeature(_) => "UnsupportedFeature",
            RenderError::Gl(_) => "GLError",
            RenderError::Network(_) => "NetworkError",
            RenderError::Config(_) => "ConfigError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(RenderError::ParentMissing("a:b".into()).kind(), "ParentMissing");
        assert_eq!(RenderError::CyclicParent("a:b".into()).kind(), "SchemaError");
        assert_eq!(RenderError::not_found("texture", "minecraft:x").kind(), "AssetNotFound");
    }

    #[test]
    fn test_display_includes_context() {
        let err = RenderError::schema("models/minecraft/block/stone.json", "bad elements");
        assert_eq!(
            err.to_string(),
            "invalid models/minecraft/block/stone.json: bad elements"
        );
    }
}
