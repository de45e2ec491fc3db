//! Session configuration.
//!
//! All pipeline behaviour outside the per-batch knobs (target format,
//! compression level) is controlled through [`SessionConfig`], built via
//! its [`SessionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a configuration across sessions and to diff two runs
//! to understand why their outputs differ.

use crate::error::ConvertError;
use crate::progress::ProgressHandle;
use std::fmt;

/// Configuration for a [`crate::session::BatchSession`].
///
/// Built via [`SessionConfig::builder()`] or [`SessionConfig::default()`].
///
/// # Example
/// ```rust
/// use fileforge::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .quality(0.8)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    /// Raster re-encode quality in `(0, 1]`. Default: 0.9.
    ///
    /// Applies only to lossy targets (JPEG); lossless encoders ignore it.
    pub quality: f32,

    /// Exact output dimensions `(width, height)` for raster targets.
    /// Default: `None` (keep the source's native dimensions).
    ///
    /// Scaling is a single uniform stretch to these bounds, not an
    /// aspect-preserving crop.
    pub resize: Option<(u32, u32)>,

    /// Number of item transforms in flight at once. Default: 8.
    ///
    /// All items of a batch are dispatched as concurrently-pending work;
    /// this bounds how many run simultaneously.
    pub concurrency: usize,

    /// Tick interval for the generic progress simulator, in milliseconds.
    /// Default: 200.
    ///
    /// This is a display affordance, not a timeout.
    pub tick_interval_ms: u64,

    /// Progress callback receiving per-item updates and status transitions.
    /// Default: none.
    pub progress: Option<ProgressHandle>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quality: 0.9,
            resize: None,
            concurrency: 8,
            tick_interval_ms: 200,
            progress: None,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("quality", &self.quality)
            .field("resize", &self.resize)
            .field("concurrency", &self.concurrency)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn ConversionProgress>"))
            .finish()
    }
}

impl SessionConfig {
    /// Create a new builder for `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn quality(mut self, q: f32) -> Self {
        self.config.quality = q;
        self
    }

    pub fn resize(mut self, width: u32, height: u32) -> Self {
        self.config.resize = Some((width, height));
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn tick_interval_ms(mut self, ms: u64) -> Self {
        self.config.tick_interval_ms = ms;
        self
    }

    pub fn progress(mut self, callback: ProgressHandle) -> Self {
        self.config.progress = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SessionConfig, ConvertError> {
        let c = &self.config;
        if !(c.quality > 0.0 && c.quality <= 1.0) {
            return Err(ConvertError::InvalidConfig(format!(
                "quality must be in (0, 1], got {}",
                c.quality
            )));
        }
        if c.concurrency == 0 {
            return Err(ConvertError::InvalidConfig(
                "concurrency must be at least 1".into(),
            ));
        }
        if c.tick_interval_ms == 0 {
            return Err(ConvertError::InvalidConfig(
                "tick interval must be at least 1ms".into(),
            ));
        }
        if let Some((w, h)) = c.resize {
            if w == 0 || h == 0 {
                return Err(ConvertError::InvalidConfig(format!(
                    "resize dimensions must be non-zero, got {w}x{h}"
                )));
            }
        }
        Ok(self.config)
    }
}
