//! Fill the transparent cutout of a silhouette mask with a second image.
//!
//! A [`Session`] walks the replacement workflow; the compositor in
//! [`processing::composite`] renders ghosted previews and mask-clipped finals
//! from a [`Transform`].

pub mod assets;
pub mod config;
pub mod error;
pub mod export;
pub mod raster;
pub mod session;
pub mod surface;
pub mod transform;
pub mod processing {
    pub mod composite;
    pub mod layout;
    pub mod resample;
}

pub use error::{Error, Result};
pub use processing::composite::{
    CompositeMode, CompositeOptions, CompositeResult, composite, composite_with,
};
pub use raster::RasterImage;
pub use session::{Session, TransformEdit, WorkflowEvent, WorkflowState};
pub use transform::{Transform, fit_scale};
