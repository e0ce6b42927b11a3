// Profile pictures: image files encoded as `data:` URIs.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;
use tracing::debug;

/// Largest accepted image file, in bytes.
pub const DEFAULT_MAX_AVATAR_BYTES: u64 = 50_000;

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("image file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("image is {size} bytes, the limit is {max}")]
    TooLarge { size: u64, max: u64 },

    #[error("failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unsupported image type: {}", .path.display())]
    UnsupportedType { path: PathBuf },
}

/// Summary of a stored avatar for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarInfo {
    pub mime: String,
    pub bytes: usize,
}

/// Read the image at `path` into a `data:<mime>;base64,...` URI.
///
/// The size limit is checked against file metadata before the file is
/// read, so oversize files are never loaded.
pub fn load_avatar(path: &Path, max_bytes: u64) -> Result<String, AvatarError> {
    let mime = mime_for(path).ok_or_else(|| AvatarError::UnsupportedType {
        path: path.to_path_buf(),
    })?;

    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AvatarError::NotFound {
            path: path.to_path_buf(),
        },
        _ => AvatarError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    if !metadata.is_file() {
        return Err(AvatarError::NotFound {
            path: path.to_path_buf(),
        });
    }
    if metadata.len() > max_bytes {
        return Err(AvatarError::TooLarge {
            size: metadata.len(),
            max: max_bytes,
        });
    }

    let bytes = std::fs::read(path).map_err(|e| AvatarError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), size = bytes.len(), "avatar loaded");

    Ok(format!("data:{mime};base64,{}", STANDARD.encode(&bytes)))
}

/// Media type and decoded size of a `data:` URI, or `None` if `uri` is not
/// a base64 data URI.
pub fn describe_avatar(uri: &str) -> Option<AvatarInfo> {
    let rest = uri.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let decoded = STANDARD.decode(data.trim()).ok()?;
    Some(AvatarInfo {
        mime: if mime.is_empty() {
            "application/octet-stream".to_string()
        } else {
            mime.to_string()
        },
        bytes: decoded.len(),
    })
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => return None,
    };
    Some(mime)
}
