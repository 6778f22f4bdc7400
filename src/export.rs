//! PNG export of the committed composite.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbaImage};
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::session::Session;
use crate::surface::RenderSurface;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExportOptions {
    /// File name prefix; the export time in unix milliseconds is appended.
    pub file_prefix: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_prefix: "shape-mask-result".into(),
        }
    }
}

impl ExportOptions {
    #[must_use]
    pub fn file_name(&self, at: DateTime<Utc>) -> String {
        format!("{}-{}.png", self.file_prefix, at.timestamp_millis())
    }
}

/// Encode a frame as PNG.
///
/// # Errors
/// [`Error::Encode`] if the encoder fails.
pub fn encode_png(frame: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    frame
        .write_to(&mut out, ImageFormat::Png)
        .map_err(Error::Encode)?;
    Ok(out.into_inner())
}

/// PNG bytes of the committed composite, or of the mask if nothing was
/// committed yet.
///
/// # Errors
/// [`Error::NothingToExport`] when the session holds neither.
pub fn export_png<S: RenderSurface>(session: &Session<S>) -> Result<Vec<u8>> {
    let frame = session.export_source().ok_or(Error::NothingToExport)?;
    encode_png(frame)
}

/// Write the export into `dir` under a timestamped name and return its path.
///
/// # Errors
/// [`Error::NothingToExport`], encoding and IO errors.
pub fn write_png<S: RenderSurface>(
    session: &Session<S>,
    dir: &Path,
    options: &ExportOptions,
) -> Result<PathBuf> {
    let bytes = export_png(session)?;
    let path = dir.join(options.file_name(Utc::now()));
    fs::write(&path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn file_name_uses_prefix_and_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            ExportOptions::default().file_name(at),
            "shape-mask-result-1700000000123.png"
        );
    }

    #[test]
    fn encoded_png_decodes_back() {
        let frame = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4]));
        let bytes = encode_png(&frame).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, frame);
    }
}
