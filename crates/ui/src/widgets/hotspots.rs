use std::cell::RefCell;
use std::rc::Rc;

use engine::config::SiteConfig;
use engine::hotspots::hotspot_target;
use engine::{HotspotAnnotator, PanelChange};
use gloo::events::EventListener;
use tracing::{info, warn};
use web_sys::{Document, Element, HtmlElement};

use crate::dom::{self, DomError};

/// Model hotspots that reveal the matching informational panel.
pub struct HotspotBinding {
    _shared: Rc<HotspotShared>,
    _listeners: Vec<EventListener>,
}

struct HotspotShared {
    annotator: RefCell<HotspotAnnotator>,
    panels: Vec<(String, HtmlElement)>,
    /// Panels without an id; no hotspot can show them, every activation
    /// hides them.
    unnamed_panels: Vec<HtmlElement>,
    section: Option<Element>,
    layout_class: String,
    hidden_class: String,
}

impl HotspotBinding {
    pub fn mount(document: &Document, config: &SiteConfig) -> Result<Self, DomError> {
        let ids = &config.elements;
        let hotspots = dom::query_all(document, &ids.hotspot_selector)?;
        if hotspots.is_empty() {
            return Err(DomError::MissingElement(ids.hotspot_selector.clone()));
        }

        let (panels, unnamed_panels) = split_named(
            dom::query_all(document, &ids.panel_selector)?
                .into_iter()
                .map(|panel| (panel.id(), panel)),
        );
        if !unnamed_panels.is_empty() {
            warn!(
                count = unnamed_panels.len(),
                selector = %ids.panel_selector,
                "panels without an id can only be hidden"
            );
        }
        let section = document.get_element_by_id(&ids.annotated_section);
        if section.is_none() {
            warn!(id = %ids.annotated_section, "annotated section missing, layout class skipped");
        }

        let shared = Rc::new(HotspotShared {
            annotator: RefCell::new(HotspotAnnotator::new(
                panels.iter().map(|(id, _)| id.clone()).collect(),
            )),
            panels,
            unnamed_panels,
            section,
            layout_class: ids.layout_class.clone(),
            hidden_class: ids.hidden_class.clone(),
        });

        let mut listeners = Vec::with_capacity(hotspots.len());
        for hotspot in &hotspots {
            let target = hotspot_target(
                hotspot
                    .get_attribute(&ids.hotspot_target_attribute)
                    .as_deref(),
                hotspot.get_attribute("slot").as_deref(),
            );
            let Some(target) = target else {
                warn!(slot = ?hotspot.get_attribute("slot"), "hotspot without target ignored");
                continue;
            };

            let shared = Rc::downgrade(&shared);
            listeners.push(EventListener::new(hotspot, "click", move |_| {
                if let Some(shared) = shared.upgrade() {
                    shared.activate(&target);
                }
            }));
        }
        info!(
            hotspots = listeners.len(),
            panels = shared.panels.len(),
            "hotspot annotations mounted"
        );

        Ok(Self {
            _shared: shared,
            _listeners: listeners,
        })
    }
}

impl HotspotShared {
    fn activate(&self, target: &str) {
        let change = self.annotator.borrow_mut().activate(target);
        self.apply(&change);
    }

    fn apply(&self, change: &PanelChange) {
        let named = change.hide.iter().filter_map(|id| self.panel(id));
        for panel in named.chain(&self.unnamed_panels) {
            dom::set_class(panel, &self.hidden_class, true);
        }
        if let Some(panel) = change.show.as_deref().and_then(|id| self.panel(id)) {
            dom::set_class(panel, &self.hidden_class, false);
        }
        if change.apply_layout
            && let Some(section) = &self.section
        {
            dom::set_class(section, &self.layout_class, true);
        }
    }

    fn panel(&self, id: &str) -> Option<&HtmlElement> {
        self.panels
            .iter()
            .find(|(panel_id, _)| panel_id == id)
            .map(|(_, panel)| panel)
    }
}

/// Splits `(id, panel)` pairs into panels a hotspot can name and those with
/// an empty id.
fn split_named<T>(
    panels: impl IntoIterator<Item = (String, T)>,
) -> (Vec<(String, T)>, Vec<T>) {
    let mut named = Vec::new();
    let mut unnamed = Vec::new();
    for (id, panel) in panels {
        if id.is_empty() {
            unnamed.push(panel);
        } else {
            named.push((id, panel));
        }
    }
    (named, unnamed)
}
