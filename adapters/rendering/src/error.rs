use thiserror::Error;

/// Failures reported by a platform surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The pixel buffer could not be locked.
    #[error("surface lock failed: {reason}")]
    LockFailed {
        /// Platform description of the failure.
        reason: String,
    },
    /// The finished frame could not be presented.
    #[error("surface flip failed: {reason}")]
    FlipFailed {
        /// Platform description of the failure.
        reason: String,
    },
    /// The locked surface does not match the frame buffer dimensions.
    #[error("surface is {actual_width}x{actual_height} but the frame is {expected_width}x{expected_height}")]
    SizeMismatch {
        /// Frame buffer width.
        expected_width: i32,
        /// Frame buffer height.
        expected_height: i32,
        /// Surface width.
        actual_width: i32,
        /// Surface height.
        actual_height: i32,
    },
}

/// Failures raised while decoding asset bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The asset source has no entry with this name.
    #[error("asset `{name}` not found")]
    Missing {
        /// Requested asset name.
        name: String,
    },
    /// The asset exists but could not be read.
    #[error("asset `{name}` could not be read: {reason}")]
    Unreadable {
        /// Requested asset name.
        name: String,
        /// Platform description of the failure.
        reason: String,
    },
    /// Palette data is not 768 bytes of 6-bit components.
    #[error("palette `{name}` is malformed: {reason}")]
    MalformedPalette {
        /// Asset name.
        name: String,
        /// What was wrong.
        reason: String,
    },
    /// Tile data is not a whole number of tiles.
    #[error("tile set `{name}` is malformed: {reason}")]
    MalformedTiles {
        /// Asset name.
        name: String,
        /// What was wrong.
        reason: String,
    },
    /// Shape header or frame descriptors are inconsistent.
    #[error("shape `{name}` is malformed: {reason}")]
    MalformedShape {
        /// Asset name.
        name: String,
        /// What was wrong.
        reason: String,
    },
}

/// Failures raised while reading configuration documents.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML for the expected structure.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The manifest declares a version this build does not understand.
    #[error("unsupported manifest version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version declared by the document.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_mismatch_message_names_both_sizes() {
        let error = SurfaceError::SizeMismatch {
            expected_width: 640,
            expected_height: 400,
            actual_width: 320,
            actual_height: 200,
        };
        assert_eq!(
            error.to_string(),
            "surface is 320x200 but the frame is 640x400",
            "message should report the surface size first"
        );
    }
}
