//! The single active crop session.
//!
//! A `CropSession` is the explicit state behind one crop dialog: the decoded
//! source, the last measured viewport, the selection, zoom/pan and the resize
//! reconciler. The host dispatches user events to it and renders what it
//! returns; submit and cancel end the session and discard its state.
//!
//! # Lifecycle
//!
//! ```ignore
//! let mut session = CropSession::open(&file_bytes, CropConfig::default())?;
//! let crop = session.image_loaded(Size::new(640.0, 320.0))?;
//! let crop = session.drag(session.mount_key(), candidate);
//! session.zoom_in();
//! let export = session.submit(&CancelToken::new())?;
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::config::{ConfigError, CropConfig};
use crate::decode::{decode_image, DecodeError, RasterImage};
use crate::encode::EncodeError;
use crate::export::{CancelToken, ExportedImage};
use crate::reconcile::{Remount, ResizeReconciler};
use crate::selection::{clamp_to_bounds_with_aspect, initialize, mask_polygon, MaskPolygon};
use crate::transform::{encode_bitmap, rasterize_with, RasterError};
use crate::zoom::{PanDirection, PanOffset, ZoomController};
use crate::{CropRect, Size, ViewportMetrics};

/// Errors returned by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not read image: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    /// The displayed image box has not been measured yet
    #[error("Image has not been measured")]
    NotMeasured,

    /// The session was already submitted or cancelled
    #[error("Crop session is closed")]
    Closed,
}

#[derive(Debug)]
pub struct CropSession {
    config: CropConfig,
    source: RasterImage,
    metrics: Option<ViewportMetrics>,
    aspect: Option<f64>,
    crop: CropRect,
    zoom: ZoomController,
    reconciler: ResizeReconciler,
    open: bool,
}

impl CropSession {
    /// Decode the selected file and start a session.
    pub fn open(bytes: &[u8], config: CropConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let source = decode_image(bytes)?;
        Self::from_image(source, config)
    }

    /// Start a session over an already decoded image.
    pub fn from_image(source: RasterImage, config: CropConfig) -> Result<Self, SessionError> {
        config.validate()?;
        if source.is_empty() {
            return Err(DecodeError::InvalidFormat.into());
        }

        tracing::debug!(
            width = source.width,
            height = source.height,
            "Crop session opened"
        );
        Ok(Self {
            zoom: ZoomController::from_config(&config),
            reconciler: ResizeReconciler::new(Duration::from_millis(config.resize_debounce_ms)),
            config,
            source,
            metrics: None,
            aspect: None,
            crop: CropRect::FULL,
            open: true,
        })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    /// Natural (width, height) of the source image.
    pub fn natural_size(&self) -> (u32, u32) {
        self.source.dimensions()
    }

    pub fn metrics(&self) -> Option<ViewportMetrics> {
        self.metrics
    }

    /// Current selection; `CropRect::FULL` until the image is measured.
    pub fn crop(&self) -> CropRect {
        self.crop
    }

    /// The aspect ratio drags are locked to, if any.
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.aspect
    }

    pub fn mask(&self) -> MaskPolygon {
        mask_polygon(&self.crop)
    }

    pub fn zoom(&self) -> &ZoomController {
        &self.zoom
    }

    pub fn mount_key(&self) -> u64 {
        self.reconciler.mount_key()
    }

    /// The host measured the image element: set up the default selection.
    pub fn image_loaded(&mut self, displayed: Size) -> Result<CropRect, SessionError> {
        self.ensure_open()?;
        if !displayed.is_measurable() {
            return Err(SessionError::NotMeasured);
        }

        let (natural_w, natural_h) = self.natural_size();
        let metrics = ViewportMetrics::new(displayed, natural_w, natural_h);
        self.aspect = self.config.aspect.resolve(metrics.natural_aspect());
        self.crop = initialize(&metrics, self.aspect);
        self.metrics = Some(metrics);
        Ok(self.crop)
    }

    /// Apply a drag-produced candidate.
    ///
    /// Candidates without area, drags from a stale mount, and drags before
    /// the image is measured are dropped; the current selection is returned
    /// unchanged in that case.
    pub fn drag(&mut self, mount_key: u64, candidate: CropRect) -> CropRect {
        if !self.open {
            return self.crop;
        }
        if !self.reconciler.is_current(mount_key) {
            tracing::debug!(
                mount_key,
                current = self.reconciler.mount_key(),
                "Dropping drag from stale mount"
            );
            return self.crop;
        }
        let Some(metrics) = self.metrics else {
            return self.crop;
        };
        if !candidate.has_area() {
            tracing::debug!(?candidate, "Dropping degenerate drag");
            return self.crop;
        }

        self.crop = clamp_to_bounds_with_aspect(candidate, metrics.displayed(), self.aspect);
        self.crop
    }

    pub fn zoom_in(&mut self) -> f64 {
        if self.open {
            self.zoom.zoom_in();
        }
        self.zoom.scale()
    }

    pub fn zoom_out(&mut self) -> f64 {
        if self.open {
            self.zoom.zoom_out();
            self.zoom.clamp_pan(self.displayed());
        }
        self.zoom.scale()
    }

    pub fn reset_zoom(&mut self) -> f64 {
        if self.open {
            self.zoom.reset_zoom();
        }
        self.zoom.scale()
    }

    pub fn pan(&mut self, direction: PanDirection) -> PanOffset {
        if self.open {
            let displayed = self.displayed();
            self.zoom.pan(direction, displayed);
        }
        self.zoom.pan_offset()
    }

    /// Record a viewport resize at host time `now`.
    pub fn resize(&mut self, displayed: Size, now: Duration) {
        let (natural_w, natural_h) = self.natural_size();
        self.reconciler
            .on_resize(ViewportMetrics::new(displayed, natural_w, natural_h), now);
    }

    /// Apply a settled resize, if one is due.
    ///
    /// The returned `Remount` tells the host to rebuild its crop view; drags
    /// carrying the previous mount key are dropped from here on.
    pub fn poll_resize(&mut self, now: Duration) -> Option<Remount> {
        let remount = self.reconciler.poll(now)?;
        if !remount.metrics.is_measurable() {
            return Some(remount);
        }

        let displayed = remount.metrics.displayed();
        match self.metrics {
            Some(_) => {
                self.crop = clamp_to_bounds_with_aspect(self.crop, displayed, self.aspect);
            }
            None => {
                self.aspect = self.config.aspect.resolve(remount.metrics.natural_aspect());
                self.crop = initialize(&remount.metrics, self.aspect);
            }
        }
        self.metrics = Some(remount.metrics);
        self.zoom.clamp_pan(displayed);
        Some(remount)
    }

    pub fn next_resize_deadline(&self) -> Option<Duration> {
        self.reconciler.next_deadline()
    }

    /// Rasterize the current selection and close the session.
    ///
    /// On failure the session stays open so the user can retry.
    pub fn submit(&mut self, cancel: &CancelToken) -> Result<ExportedImage, SessionError> {
        self.submit_with(cancel, encode_bitmap)
    }

    fn submit_with<E>(
        &mut self,
        cancel: &CancelToken,
        encode: E,
    ) -> Result<ExportedImage, SessionError>
    where
        E: FnOnce(&RasterImage) -> Result<Vec<u8>, EncodeError>,
    {
        self.ensure_open()?;
        if self.metrics.is_none() {
            return Err(SessionError::NotMeasured);
        }

        let result = rasterize_with(
            &self.source,
            &self.crop,
            self.zoom.scale(),
            self.config.filter,
            cancel,
            encode,
        );
        match result {
            Ok(export) => {
                self.close();
                Ok(export)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Crop export failed");
                Err(err.into())
            }
        }
    }

    /// Abandon the session, discarding all transient state.
    pub fn cancel(&mut self) {
        if self.open {
            tracing::debug!("Crop session cancelled");
            self.close();
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.reconciler.teardown();
        self.source = RasterImage::new(0, 0, Vec::new());
        self.metrics = None;
        self.aspect = None;
        self.crop = CropRect::FULL;
        self.zoom.reset_zoom();
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.open {
            Ok(())
        } else {
            Err(SessionError::Closed)
        }
    }

    fn displayed(&self) -> Size {
        self.metrics
            .map(|m| m.displayed())
            .unwrap_or(Size::new(0.0, 0.0))
    }
}
