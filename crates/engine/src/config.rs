use serde::Deserialize;
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::playlist::PlaylistEntry;

/// Page-wide settings, usually embedded as inline JSON in the markup.
///
/// Every field has a default, so an empty object (or no config at all) yields
/// the stock pet page.
///
/// # Example
/// ```
/// use engine::SiteConfig;
///
/// let config = SiteConfig::from_json(r#"{"filmstrip":{"frame_count":10}}"#)
///     .expect("valid config");
/// assert_eq!(config.filmstrip.frame_count, 10);
/// assert_eq!(config.filmstrip.timeout_ms, 15_000);
/// assert_eq!(config.playlist.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub playlist: Vec<PlaylistEntry>,
    pub filmstrip: FilmstripSettings,
    pub media_retry: RetryPolicy,
    pub sections: SectionSettings,
    pub elements: ElementIds,
}

/// Filmstrip generation knobs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilmstripSettings {
    pub frame_count: u32,
    pub retry_delay_ms: u64,
    pub timeout_ms: u64,
    pub cache_bust_param: String,
    pub background: String,
}

/// Retry policy for primary media load failures.
///
/// `max_attempts: None` retries forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub delay_ms: u64,
    pub max_attempts: Option<u32>,
}

/// Hysteresis band used to pick the current page section, as fractions of the
/// section height around its top edge.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SectionSettings {
    pub enter_fraction: f64,
    pub leave_fraction: f64,
}

/// Element ids, selectors and class names supplied by the markup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub video: String,
    pub video_link: String,
    pub timeline: String,
    pub scrubber_selector: String,
    pub section_selector: String,
    pub scroll_up: String,
    pub scroll_down: String,
    pub hotspot_selector: String,
    pub hotspot_target_attribute: String,
    pub panel_selector: String,
    pub annotated_section: String,
    pub layout_class: String,
    pub hidden_class: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            playlist: vec![
                PlaylistEntry::new("videos/lyla.mp4", "pets/lyla.html", "Lyla →"),
                PlaylistEntry::new("videos/max.mp4", "pets/max.html", "Max →"),
            ],
            filmstrip: FilmstripSettings::default(),
            media_retry: RetryPolicy::default(),
            sections: SectionSettings::default(),
            elements: ElementIds::default(),
        }
    }
}

impl Default for FilmstripSettings {
    fn default() -> Self {
        Self {
            frame_count: 20,
            retry_delay_ms: 500,
            timeout_ms: 15_000,
            cache_bust_param: String::from("cachebuster"),
            background: String::from("#000"),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay_ms: 1_000,
            max_attempts: None,
        }
    }
}

impl Default for SectionSettings {
    fn default() -> Self {
        Self {
            enter_fraction: 0.25,
            leave_fraction: 0.75,
        }
    }
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            video: String::from("petVideo"),
            video_link: String::from("petVideoLink"),
            timeline: String::from("videoTimeline"),
            scrubber_selector: String::from(".timeline-scrubber"),
            section_selector: String::from("section"),
            scroll_up: String::from("scrollUp"),
            scroll_down: String::from("scrollDown"),
            hotspot_selector: String::from("model-viewer .hotspot"),
            hotspot_target_attribute: String::from("data-target"),
            panel_selector: String::from(".info-panel"),
            annotated_section: String::from("modelSection"),
            layout_class: String::from("annotated"),
            hidden_class: String::from("hidden"),
        }
    }
}

impl SiteConfig {
    /// Parses and validates a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a config, falling back to defaults when it is malformed.
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(config) => config,
            Err(error) => {
                warn!(%error, "site config rejected, using defaults");
                Self::default()
            }
        }
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.playlist.is_empty() {
            return Err(EngineError::EmptyPlaylist);
        }
        if self.filmstrip.frame_count == 0 {
            return Err(invalid("filmstrip.frame_count must be positive"));
        }
        if self.filmstrip.timeout_ms == 0 {
            return Err(invalid("filmstrip.timeout_ms must be positive"));
        }
        if self.media_retry.max_attempts == Some(0) {
            return Err(invalid("media_retry.max_attempts must be positive when set"));
        }
        let SectionSettings {
            enter_fraction,
            leave_fraction,
        } = self.sections;
        if !(0.0..=1.0).contains(&enter_fraction) || !(0.0..=1.0).contains(&leave_fraction) {
            return Err(invalid("section fractions must lie in [0, 1]"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> EngineError {
    EngineError::InvalidConfig {
        reason: reason.to_owned(),
    }
}
