use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::assets::AssetPolicy;
use crate::export::ExportOptions;
use crate::processing::composite::{CompositeOptions, DEFAULT_GHOST_OPACITY};

/// Resampling filter used when the replacement is scaled into the mask frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    #[default]
    CatmullRom,
    Lanczos3,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Opacity of the replacement outside the mask silhouette in previews.
    pub ghost_opacity: f32,
    /// Filter used to scale the replacement.
    pub resize_filter: ResizeFilter,
    /// Format and size policy for mask uploads.
    pub mask_policy: AssetPolicy,
    /// Format and size policy for replacement uploads.
    pub replacement_policy: AssetPolicy,
    /// Naming of exported files.
    pub export: ExportOptions,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self::from_yaml_str(&s)?)
    }

    /// Parse a YAML document without validating it.
    ///
    /// # Errors
    /// [`crate::Error::Config`] for malformed YAML or unknown values.
    pub fn from_yaml_str(s: &str) -> crate::Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            self.ghost_opacity.is_finite() && (0.0..=1.0).contains(&self.ghost_opacity),
            "ghost-opacity must be between 0 and 1"
        );
        self.mask_policy
            .validate()
            .context("invalid mask-policy")?;
        self.replacement_policy
            .validate()
            .context("invalid replacement-policy")?;
        ensure!(
            !self.export.file_prefix.trim().is_empty(),
            "export.file-prefix must not be empty"
        );
        ensure!(
            !self
                .export
                .file_prefix
                .contains(|c: char| matches!(c, '/' | '\\')),
            "export.file-prefix must not contain path separators"
        );
        Ok(self)
    }

    #[must_use]
    pub fn composite_options(&self) -> CompositeOptions {
        CompositeOptions {
            ghost_opacity: self.ghost_opacity,
            filter: self.resize_filter,
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            ghost_opacity: DEFAULT_GHOST_OPACITY,
            resize_filter: ResizeFilter::default(),
            mask_policy: AssetPolicy::mask(),
            replacement_policy: AssetPolicy::replacement(),
            export: ExportOptions::default(),
        }
    }
}
