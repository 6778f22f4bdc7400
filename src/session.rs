//! Replacement workflow: one explicit session object owning the mask, the
//! replacement, the transform being edited and the committed composite.
//!
//! Structural events (`load_mask`, `load_replacement`, `commit`, `cancel`)
//! outside their source state fail with [`Error::InvalidTransition`]. UI
//! gestures (`activate_tool`, scale and drag edits) outside their window are
//! no-ops that report `false`. A failed operation never touches the session
//! or the surface.

use std::fmt;

use image::RgbaImage;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::processing::composite::{
    CompositeMode, CompositeOptions, CompositeResult, composite_with,
};
use crate::raster::RasterImage;
use crate::surface::RenderSurface;
use crate::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Initial,
    MaskLoaded,
    ToolActive,
    Processing,
    Completed,
}

impl WorkflowState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::MaskLoaded => "mask-loaded",
            Self::ToolActive => "tool-active",
            Self::Processing => "processing",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    LoadMask,
    ActivateTool,
    LoadReplacement,
    Commit,
    Cancel,
    Reset,
}

impl WorkflowEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoadMask => "load mask",
            Self::ActivateTool => "activate tool",
            Self::LoadReplacement => "load replacement",
            Self::Commit => "commit",
            Self::Cancel => "cancel",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for WorkflowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input-device independent transform edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformEdit {
    /// Set an absolute scale, keeping offsets.
    SetScale(f32),
    /// Re-fit the replacement inside the mask and recentre it.
    Fit,
    BeginDrag,
    /// Relative pixel delta, applied only while a drag is active.
    DragBy { dx: f32, dy: f32 },
    EndDrag,
}

pub struct Session<S> {
    surface: S,
    options: CompositeOptions,
    state: WorkflowState,
    mask: Option<RasterImage>,
    replacement: Option<RasterImage>,
    transform: Transform,
    dragging: bool,
    preview: Option<CompositeResult>,
    final_composite: Option<CompositeResult>,
    generation: u64,
}

impl<S> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("mask", &self.mask.as_ref().map(RasterImage::dimensions))
            .field(
                "replacement",
                &self.replacement.as_ref().map(RasterImage::dimensions),
            )
            .field("transform", &self.transform)
            .field("dragging", &self.dragging)
            .field("has_final", &self.final_composite.is_some())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<S: RenderSurface> Session<S> {
    pub fn new(surface: S) -> Self {
        Self::with_options(surface, CompositeOptions::default())
    }

    pub fn with_options(surface: S, options: CompositeOptions) -> Self {
        Self {
            surface,
            options,
            state: WorkflowState::Initial,
            mask: None,
            replacement: None,
            transform: Transform::default(),
            dragging: false,
            preview: None,
            final_composite: None,
            generation: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> WorkflowState {
        self.state
    }

    #[must_use]
    pub const fn mask(&self) -> Option<&RasterImage> {
        self.mask.as_ref()
    }

    #[must_use]
    pub const fn replacement(&self) -> Option<&RasterImage> {
        self.replacement.as_ref()
    }

    /// Current transform; the default whenever no replacement is loaded.
    #[must_use]
    pub const fn transform(&self) -> Transform {
        self.transform
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Latest preview, present only while processing.
    #[must_use]
    pub const fn preview(&self) -> Option<&CompositeResult> {
        self.preview.as_ref()
    }

    #[must_use]
    pub const fn final_composite(&self) -> Option<&CompositeResult> {
        self.final_composite.as_ref()
    }

    /// Output frame size, which is always the mask size.
    #[must_use]
    pub fn frame_dimensions(&self) -> Option<(u32, u32)> {
        self.mask.as_ref().map(RasterImage::dimensions)
    }

    /// Number of previews rendered so far.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// What an export should contain: the committed composite, else the mask.
    #[must_use]
    pub fn export_source(&self) -> Option<&RgbaImage> {
        base_frame(&self.final_composite, &self.mask)
    }

    /// # Errors
    /// [`Error::InvalidTransition`] outside `Initial`; surface errors.
    pub fn load_mask(&mut self, mask: RasterImage) -> Result<()> {
        self.expect_state(WorkflowEvent::LoadMask, &[WorkflowState::Initial])?;
        self.surface.paint(mask.pixels())?;
        info!(width = mask.width(), height = mask.height(), "mask loaded");
        self.mask = Some(mask);
        self.transition(WorkflowState::MaskLoaded);
        Ok(())
    }

    /// Open the replacement tool. Returns `false` when the tool cannot open
    /// in the current state.
    pub fn activate_tool(&mut self) -> bool {
        match self.state {
            WorkflowState::MaskLoaded | WorkflowState::Completed => {
                self.transition(WorkflowState::ToolActive);
                true
            }
            _ => {
                debug!(state = %self.state, "tool activation ignored");
                false
            }
        }
    }

    /// Load (or swap) the replacement, fit it inside the mask and render a
    /// preview.
    ///
    /// # Errors
    /// [`Error::InvalidTransition`] outside `ToolActive`/`Processing`;
    /// compositing and surface errors.
    pub fn load_replacement(&mut self, replacement: RasterImage) -> Result<()> {
        self.expect_state(
            WorkflowEvent::LoadReplacement,
            &[WorkflowState::ToolActive, WorkflowState::Processing],
        )?;
        let mask = self.mask.as_ref().ok_or(Error::MissingAsset("mask"))?;
        let transform = Transform::fitted(mask, &replacement);
        let preview = self.render(mask, &replacement, &transform, CompositeMode::Preview)?;
        self.surface.paint(preview.image())?;
        info!(
            width = replacement.width(),
            height = replacement.height(),
            scale = transform.scale,
            "replacement loaded"
        );
        self.replacement = Some(replacement);
        self.transform = transform;
        self.dragging = false;
        self.preview = Some(preview);
        self.generation += 1;
        self.transition(WorkflowState::Processing);
        Ok(())
    }

    /// Apply one transform edit. Returns whether the edit took effect.
    ///
    /// # Errors
    /// [`Error::InvalidScale`]/[`Error::InvalidOffset`] for edits producing an
    /// invalid transform; compositing and surface errors.
    pub fn apply_edit(&mut self, edit: TransformEdit) -> Result<bool> {
        match edit {
            TransformEdit::SetScale(scale) => self.set_scale(scale),
            TransformEdit::Fit => self.fit_to_mask(),
            TransformEdit::BeginDrag => Ok(self.begin_drag()),
            TransformEdit::DragBy { dx, dy } => self.drag_by(dx, dy),
            TransformEdit::EndDrag => Ok(self.end_drag()),
        }
    }

    /// # Errors
    /// See [`Session::apply_edit`].
    pub fn set_scale(&mut self, scale: f32) -> Result<bool> {
        if !self.can_edit() {
            return Ok(false);
        }
        self.update_transform(self.transform.with_scale(scale))
    }

    /// Reset the transform to the fit-inside scale, centred.
    ///
    /// # Errors
    /// See [`Session::apply_edit`].
    pub fn fit_to_mask(&mut self) -> Result<bool> {
        if !self.can_edit() {
            return Ok(false);
        }
        let (Some(mask), Some(replacement)) = (&self.mask, &self.replacement) else {
            return Ok(false);
        };
        let fitted = Transform::fitted(mask, replacement);
        self.update_transform(fitted)
    }

    pub fn begin_drag(&mut self) -> bool {
        if !self.can_edit() {
            return false;
        }
        self.dragging = true;
        true
    }

    /// Move the replacement by a relative delta while a drag is active.
    ///
    /// # Errors
    /// See [`Session::apply_edit`].
    pub fn drag_by(&mut self, dx: f32, dy: f32) -> Result<bool> {
        if !(self.dragging && self.can_edit()) {
            return Ok(false);
        }
        self.update_transform(self.transform.translated(dx, dy))
    }

    pub fn end_drag(&mut self) -> bool {
        std::mem::replace(&mut self.dragging, false)
    }

    /// Render the final composite, retain it and paint it.
    ///
    /// # Errors
    /// [`Error::InvalidTransition`] outside `Processing`;
    /// [`Error::MissingAsset`] without both images; compositing and surface
    /// errors.
    pub fn commit(&mut self) -> Result<&CompositeResult> {
        self.expect_state(WorkflowEvent::Commit, &[WorkflowState::Processing])?;
        let mask = self.mask.as_ref().ok_or(Error::MissingAsset("mask"))?;
        let replacement = self
            .replacement
            .as_ref()
            .ok_or(Error::MissingAsset("replacement"))?;
        let result = self.render(mask, replacement, &self.transform, CompositeMode::Final)?;
        self.surface.paint(result.image())?;
        info!(
            scale = self.transform.scale,
            offset_x = self.transform.offset_x,
            offset_y = self.transform.offset_y,
            "replacement committed"
        );
        self.clear_replacement();
        self.transition(WorkflowState::Completed);
        Ok(&*self.final_composite.insert(result))
    }

    /// Close the tool. From `Processing` the replacement is discarded and the
    /// last committed frame (or the bare mask) is painted again.
    ///
    /// # Errors
    /// [`Error::InvalidTransition`] outside `ToolActive`/`Processing`; surface
    /// errors.
    pub fn cancel(&mut self) -> Result<()> {
        self.expect_state(
            WorkflowEvent::Cancel,
            &[WorkflowState::ToolActive, WorkflowState::Processing],
        )?;
        if self.state == WorkflowState::Processing {
            let base = base_frame(&self.final_composite, &self.mask)
                .ok_or(Error::MissingAsset("mask"))?;
            self.surface.paint(base)?;
            self.clear_replacement();
        }
        self.transition(WorkflowState::MaskLoaded);
        Ok(())
    }

    /// Discard everything and return to `Initial`.
    ///
    /// # Errors
    /// Surface errors while blanking.
    pub fn reset(&mut self) -> Result<()> {
        if self.state == WorkflowState::Initial {
            return Ok(());
        }
        self.surface.clear()?;
        self.mask = None;
        self.final_composite = None;
        self.clear_replacement();
        self.transition(WorkflowState::Initial);
        Ok(())
    }

    fn can_edit(&self) -> bool {
        self.state == WorkflowState::Processing && self.replacement.is_some()
    }

    fn update_transform(&mut self, candidate: Transform) -> Result<bool> {
        candidate.validate()?;
        let (Some(mask), Some(replacement)) = (&self.mask, &self.replacement) else {
            return Err(Error::MissingAsset("replacement"));
        };
        let preview = self.render(mask, replacement, &candidate, CompositeMode::Preview)?;
        self.surface.paint(preview.image())?;
        self.transform = candidate;
        self.preview = Some(preview);
        self.generation += 1;
        debug!(
            generation = self.generation,
            scale = candidate.scale,
            offset_x = candidate.offset_x,
            offset_y = candidate.offset_y,
            "preview updated"
        );
        Ok(true)
    }

    fn render(
        &self,
        mask: &RasterImage,
        replacement: &RasterImage,
        transform: &Transform,
        mode: CompositeMode,
    ) -> Result<CompositeResult> {
        composite_with(mask, replacement, transform, mode, &self.options)
    }

    fn clear_replacement(&mut self) {
        self.replacement = None;
        self.transform = Transform::default();
        self.dragging = false;
        self.preview = None;
    }

    fn expect_state(&self, event: WorkflowEvent, allowed: &[WorkflowState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                state: self.state,
                event,
            })
        }
    }

    fn transition(&mut self, next: WorkflowState) {
        if self.state != next {
            info!(from = %self.state, to = %next, "workflow transition");
        }
        self.state = next;
    }
}

fn base_frame<'a>(
    final_composite: &'a Option<CompositeResult>,
    mask: &'a Option<RasterImage>,
) -> Option<&'a RgbaImage> {
    final_composite
        .as_ref()
        .map(CompositeResult::image)
        .or_else(|| mask.as_ref().map(RasterImage::pixels))
}
