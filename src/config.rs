//! Configuration types for card generation.
//!
//! All run behaviour is controlled through [`CardConfig`], built via its
//! [`CardConfigBuilder`]. Asset paths, the output destination and the layout
//! scale all live here, so a harness only has to hand one value to
//! [`crate::generate::generate`].

use crate::error::CardError;
use crate::layout::{CardLayout, SCALE_RANGE};
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};

/// Label printed under the primary logo when none is configured.
pub const DEFAULT_INSTITUTE_LABEL: &str = "sirifort institute of management studies";

/// Configuration for one card-generation run.
///
/// Built via [`CardConfig::builder()`] or using [`CardConfig::default()`].
///
/// # Example
/// ```rust
/// use cardsmith::CardConfig;
///
/// let config = CardConfig::builder()
///     .output_dir("out")
///     .font_path("fonts/DejaVuSans.ttf")
///     .scale(1.5)
///     .build()
///     .unwrap();
/// assert_eq!(config.document_path(), std::path::Path::new("out/student_id_cards.pdf"));
/// ```
#[derive(Clone)]
pub struct CardConfig {
    /// Directory receiving the PDF and the per-row card images. Default: `id_cards`.
    ///
    /// Created on demand when the document is opened.
    pub output_dir: PathBuf,

    /// File name of the assembled PDF inside `output_dir`. Default: `student_id_cards.pdf`.
    pub document_name: String,

    /// TrueType font used for every text element. Default: `arial.ttf`.
    ///
    /// Missing or unparsable fonts fall back to the built-in bitmap face.
    pub font_path: PathBuf,

    /// Logo drawn in the top-left corner. Default: `sims_logo.png`.
    pub primary_logo_path: PathBuf,

    /// Wide logo drawn under the institute label. Default: `dazzle_logo.png`.
    pub secondary_logo_path: PathBuf,

    /// Text centred under the primary logo.
    pub institute_label: String,

    /// Uniform scale applied to the canonical 600×1000 layout. Range 0.25–4.0. Default: 1.0.
    pub scale: f32,

    /// Save every card as `<output_dir>/<name>.png` in addition to the PDF. Default: true.
    pub write_card_images: bool,

    /// Stop at the first failed row instead of skipping it. Default: false.
    pub fail_fast: bool,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-row progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("id_cards"),
            document_name: "student_id_cards.pdf".to_string(),
            font_path: PathBuf::from("arial.ttf"),
            primary_logo_path: PathBuf::from("sims_logo.png"),
            secondary_logo_path: PathBuf::from("dazzle_logo.png"),
            institute_label: DEFAULT_INSTITUTE_LABEL.to_string(),
            scale: 1.0,
            write_card_images: true,
            fail_fast: false,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardConfig")
            .field("output_dir", &self.output_dir)
            .field("document_name", &self.document_name)
            .field("font_path", &self.font_path)
            .field("primary_logo_path", &self.primary_logo_path)
            .field("secondary_logo_path", &self.secondary_logo_path)
            .field("institute_label", &self.institute_label)
            .field("scale", &self.scale)
            .field("write_card_images", &self.write_card_images)
            .field("fail_fast", &self.fail_fast)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl CardConfig {
    /// Create a new builder for `CardConfig`.
    pub fn builder() -> CardConfigBuilder {
        CardConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full path of the PDF this run will write.
    pub fn document_path(&self) -> PathBuf {
        self.output_dir.join(&self.document_name)
    }

    /// Layout table after applying [`CardConfig::scale`].
    pub fn layout(&self) -> CardLayout {
        if (self.scale - 1.0).abs() < f32::EPSILON {
            CardLayout::default()
        } else {
            CardLayout::default().scaled(self.scale)
        }
    }

    /// The three asset locations in the shape the loader wants.
    pub fn asset_paths(&self) -> crate::pipeline::assets::AssetPaths {
        crate::pipeline::assets::AssetPaths {
            font: self.font_path.clone(),
            primary_logo: self.primary_logo_path.clone(),
            secondary_logo: self.secondary_logo_path.clone(),
        }
    }
}

/// Builder for [`CardConfig`].
#[derive(Debug)]
pub struct CardConfigBuilder {
    config: CardConfig,
}

impl CardConfigBuilder {
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn document_name(mut self, name: impl Into<String>) -> Self {
        self.config.document_name = name.into();
        self
    }

    pub fn font_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.font_path = path.as_ref().to_path_buf();
        self
    }

    pub fn primary_logo_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.primary_logo_path = path.as_ref().to_path_buf();
        self
    }

    pub fn secondary_logo_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.secondary_logo_path = path.as_ref().to_path_buf();
        self
    }

    pub fn institute_label(mut self, label: impl Into<String>) -> Self {
        self.config.institute_label = label.into();
        self
    }

    pub fn scale(mut self, factor: f32) -> Self {
        self.config.scale = factor;
        self
    }

    pub fn write_card_images(mut self, v: bool) -> Self {
        self.config.write_card_images = v;
        self
    }

    pub fn fail_fast(mut self, v: bool) -> Self {
        self.config.fail_fast = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CardConfig, CardError> {
        let c = &self.config;
        if !c.scale.is_finite() || c.scale < SCALE_RANGE.0 || c.scale > SCALE_RANGE.1 {
            return Err(CardError::InvalidConfig(format!(
                "scale must be {}–{}, got {}",
                SCALE_RANGE.0, SCALE_RANGE.1, c.scale
            )));
        }
        let name = c.document_name.trim();
        if name.is_empty() {
            return Err(CardError::InvalidConfig(
                "document name must not be empty".into(),
            ));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(CardError::InvalidConfig(format!(
                "document name must be a bare file name, got '{name}'"
            )));
        }
        if !name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(CardError::InvalidConfig(format!(
                "document name must end in .pdf, got '{name}'"
            )));
        }
        Ok(self.config)
    }
}
