use engine::SiteConfig;
use tracing::{info, warn};
use web_sys::Document;

use crate::bridge::PlayerBridge;
use crate::dom::{self, DomError};
use crate::widgets::hotspots::HotspotBinding;
use crate::widgets::sections::SectionBinding;

/// Id of the inline `<script type="application/json">` holding site settings.
const CONFIG_ELEMENT_ID: &str = "site-config";

/// Every page binding of one session.
///
/// Each binding mounts on its own: markup missing for one leaves the others
/// working.
pub struct App {
    _player: Option<PlayerBridge>,
    _sections: Option<SectionBinding>,
    _hotspots: Option<HotspotBinding>,
}

impl App {
    pub fn mount() -> Result<Self, DomError> {
        let window = dom::window()?;
        let document = dom::document()?;
        let config = load_config(&document);

        let player = mount_component(
            "hero player",
            PlayerBridge::mount(&window, &document, &config),
        );
        let sections = mount_component(
            "section navigation",
            SectionBinding::mount(&window, &document, &config),
        );
        let hotspots = mount_component(
            "hotspot annotations",
            HotspotBinding::mount(&document, &config),
        );

        Ok(Self {
            _player: player,
            _sections: sections,
            _hotspots: hotspots,
        })
    }
}

fn mount_component<T>(component: &'static str, mounted: Result<T, DomError>) -> Option<T> {
    match mounted {
        Ok(binding) => Some(binding),
        Err(err) => {
            warn!(component, error = %err, "component disabled");
            None
        }
    }
}

fn load_config(document: &Document) -> SiteConfig {
    let text = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|element| element.text_content());
    config_from_text(text.as_deref())
}

fn config_from_text(text: Option<&str>) -> SiteConfig {
    match text.map(str::trim).filter(|text| !text.is_empty()) {
        Some(json) => SiteConfig::from_json_or_default(json),
        None => {
            info!("no inline site config, using defaults");
            SiteConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use engine::SiteConfig;

    use super::config_from_text;

    #[test]
    fn missing_or_blank_config_uses_defaults() {
        assert_eq!(config_from_text(None), SiteConfig::default());
        assert_eq!(config_from_text(Some("  \n")), SiteConfig::default());
    }

    #[test]
    fn inline_config_overrides_defaults() {
        let config = config_from_text(Some(r#"{ "filmstrip": { "frame_count": 8 } }"#));

        assert_eq!(config.filmstrip.frame_count, 8);
        assert_eq!(config.playlist, SiteConfig::default().playlist);
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        assert_eq!(config_from_text(Some("{ not json")), SiteConfig::default());
    }
}
