use std::io;
use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::debug;

const PLACEHOLDER_LIGHT: [u8; 4] = [255, 0, 255, 255];
const PLACEHOLDER_DARK: [u8; 4] = [40, 0, 40, 255];
const PLACEHOLDER_CHECKER_PX: u32 = 4;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource not found: {path}")]
    Missing { path: PathBuf },
    #[error("failed to read resource {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl ResourceError {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Missing { path } | Self::Unreadable { path, .. } | Self::Decode { path, .. } => {
                path
            }
        }
    }
}

/// Decoded RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Image {
    /// Returns `None` when `rgba` does not hold exactly `width * height` pixels.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if rgba.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }

    /// Magenta checkerboard used in place of an image that failed to load.
    pub fn placeholder(width: u32, height: u32) -> Self {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let light = ((x / PLACEHOLDER_CHECKER_PX) + (y / PLACEHOLDER_CHECKER_PX)) % 2 == 0;
                rgba.extend_from_slice(if light {
                    &PLACEHOLDER_LIGHT
                } else {
                    &PLACEHOLDER_DARK
                });
            }
        }
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(out)
    }
}

pub fn load_image(path: impl AsRef<Path>) -> Result<Image, ResourceError> {
    let path = path.as_ref();
    let reader = ImageReader::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ResourceError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            ResourceError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let decoded = reader.decode().map_err(|source| ResourceError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decoded.to_rgba8();
    debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "image_loaded"
    );
    Ok(Image {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}
