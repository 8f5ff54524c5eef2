use tracing::{debug, info};

const HOTSPOT_SLOT_PREFIX: &str = "hotspot-";

/// Resolves the panel label a hotspot points at.
///
/// An explicit target attribute wins; otherwise a model viewer slot name of
/// the form `hotspot-<label>` yields `<label>`.
///
/// # Example
/// ```
/// use engine::hotspots::hotspot_target;
///
/// assert_eq!(hotspot_target(Some("ear"), Some("hotspot-leg")).as_deref(), Some("ear"));
/// assert_eq!(hotspot_target(None, Some("hotspot-leg")).as_deref(), Some("leg"));
/// assert_eq!(hotspot_target(None, Some("caption")), None);
/// ```
pub fn hotspot_target(data_target: Option<&str>, slot: Option<&str>) -> Option<String> {
    if let Some(target) = data_target.map(str::trim).filter(|target| !target.is_empty()) {
        return Some(target.to_owned());
    }
    slot.and_then(|slot| slot.strip_prefix(HOTSPOT_SLOT_PREFIX))
        .filter(|label| !label.is_empty())
        .map(str::to_owned)
}

/// Visibility changes produced by one hotspot activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelChange {
    pub hide: Vec<String>,
    pub show: Option<String>,
    /// True only for the first activation: add the layout class to the
    /// annotated section.
    pub apply_layout: bool,
}

/// Keeps at most one informational panel visible, keyed by hotspot label.
#[derive(Debug)]
pub struct HotspotAnnotator {
    panels: Vec<String>,
    visible: Option<String>,
    layout_applied: bool,
}

impl HotspotAnnotator {
    pub fn new(panels: Vec<String>) -> Self {
        Self {
            panels,
            visible: None,
            layout_applied: false,
        }
    }

    pub fn visible(&self) -> Option<&str> {
        self.visible.as_deref()
    }

    pub fn layout_applied(&self) -> bool {
        self.layout_applied
    }

    /// Hides every panel, then shows the one named `target` if it exists.
    pub fn activate(&mut self, target: &str) -> PanelChange {
        let apply_layout = !self.layout_applied;
        if apply_layout {
            info!(label = target, "first hotspot activated, applying layout");
            self.layout_applied = true;
        }

        let show = self.panels.iter().find(|panel| panel.as_str() == target).cloned();
        if show.is_none() {
            debug!(label = target, "hotspot has no matching panel");
        }
        self.visible = show.clone();

        PanelChange {
            hide: self.panels.clone(),
            show,
            apply_layout,
        }
    }
}
