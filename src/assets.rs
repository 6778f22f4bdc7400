//! Format/size policy and decoding for uploaded images.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::raster::RasterImage;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetFormat {
    Png,
    Jpeg,
    Gif,
    #[serde(rename = "webp")]
    WebP,
}

impl AssetFormat {
    #[must_use]
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }

    #[must_use]
    pub const fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Gif => ImageFormat::Gif,
            Self::WebP => ImageFormat::WebP,
        }
    }
}

/// Which formats an upload may use and how large it may be.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetPolicy {
    pub max_bytes: u64,
    pub formats: Vec<AssetFormat>,
}

impl AssetPolicy {
    /// Masks must carry alpha: PNG only, up to 10 MiB.
    #[must_use]
    pub fn mask() -> Self {
        Self {
            max_bytes: 10 * MIB,
            formats: vec![AssetFormat::Png],
        }
    }

    /// Replacements: common raster formats, up to 20 MiB.
    #[must_use]
    pub fn replacement() -> Self {
        Self {
            max_bytes: 20 * MIB,
            formats: vec![
                AssetFormat::Jpeg,
                AssetFormat::Png,
                AssetFormat::Gif,
                AssetFormat::WebP,
            ],
        }
    }

    /// # Errors
    /// [`Error::Validation`] if the policy can never accept anything.
    pub fn validate(&self) -> Result<()> {
        if self.max_bytes == 0 {
            return Err(Error::Validation("max-bytes must be greater than zero".into()));
        }
        if self.formats.is_empty() {
            return Err(Error::Validation("formats must not be empty".into()));
        }
        Ok(())
    }

    fn check_size(&self, len: u64) -> Result<()> {
        if len == 0 {
            return Err(Error::Validation("file is empty".into()));
        }
        if len > self.max_bytes {
            return Err(Error::Validation(format!(
                "file is {}, limit is {}",
                format_size(len),
                format_size(self.max_bytes)
            )));
        }
        Ok(())
    }

    fn check_format(&self, bytes: &[u8]) -> Result<AssetFormat> {
        let format = image::guess_format(bytes)
            .ok()
            .and_then(AssetFormat::from_image_format)
            .ok_or_else(|| Error::Validation("unsupported image format".into()))?;
        if !self.formats.contains(&format) {
            return Err(Error::Validation(format!(
                "{format:?} is not allowed here (expected one of {:?})",
                self.formats
            )));
        }
        Ok(format)
    }
}

/// Human readable byte count: `0 Bytes`, `1.5 KB`, `10 MB`.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Validate `bytes` against `policy` and decode them.
///
/// # Errors
/// [`Error::Validation`] when the policy rejects the asset, [`Error::Decode`]
/// when the bytes are malformed.
pub fn load(bytes: &[u8], policy: &AssetPolicy) -> Result<RasterImage> {
    policy.check_size(bytes.len() as u64)?;
    let format = policy.check_format(bytes)?;
    let decoded = image::load_from_memory_with_format(bytes, format.image_format())
        .map_err(Error::Decode)?
        .to_rgba8();
    debug!(
        ?format,
        width = decoded.width(),
        height = decoded.height(),
        size = %format_size(bytes.len() as u64),
        "decoded asset"
    );
    RasterImage::new(decoded)
}

/// Like [`load`], reading the file after checking its size on disk.
///
/// # Errors
/// Also fails with [`Error::Io`] if the file cannot be read.
pub fn load_file(path: &Path, policy: &AssetPolicy) -> Result<RasterImage> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(Error::Validation(format!("{} is not a file", path.display())));
    }
    policy.check_size(metadata.len())?;
    let bytes = fs::read(path)?;
    load(&bytes, policy)
}

/// Decode on the blocking pool and await the result.
///
/// # Errors
/// See [`load`]; [`Error::Join`] if the decode task panicked.
pub async fn load_async(bytes: Vec<u8>, policy: AssetPolicy) -> Result<RasterImage> {
    tokio::task::spawn_blocking(move || load(&bytes, &policy)).await?
}

/// # Errors
/// See [`load_file`]; [`Error::Join`] if the decode task panicked.
pub async fn load_file_async(path: PathBuf, policy: AssetPolicy) -> Result<RasterImage> {
    tokio::task::spawn_blocking(move || load_file(&path, &policy)).await?
}
