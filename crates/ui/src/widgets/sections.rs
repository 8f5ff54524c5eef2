use std::cell::RefCell;
use std::rc::Rc;

use engine::config::SiteConfig;
use engine::{ArrowVisibility, ScrollDirection, SectionBounds, SectionNavigator};
use gloo::events::EventListener;
use tracing::{debug, info};
use web_sys::{Document, HtmlElement, ScrollBehavior, ScrollToOptions, Window};

use crate::dom::{self, DomError};

/// Up/down arrows that step between page sections.
pub struct SectionBinding {
    _shared: Rc<SectionShared>,
    _listeners: Vec<EventListener>,
}

struct SectionShared {
    window: Window,
    navigator: RefCell<SectionNavigator>,
    sections: Vec<HtmlElement>,
    up: HtmlElement,
    down: HtmlElement,
    hidden_class: String,
}

impl SectionBinding {
    pub fn mount(
        window: &Window,
        document: &Document,
        config: &SiteConfig,
    ) -> Result<Self, DomError> {
        let ids = &config.elements;
        let up = dom::element_by_id::<HtmlElement>(document, &ids.scroll_up)?;
        let down = dom::element_by_id::<HtmlElement>(document, &ids.scroll_down)?;
        let sections = dom::query_all(document, &ids.section_selector)?;
        if sections.is_empty() {
            return Err(DomError::MissingElement(ids.section_selector.clone()));
        }

        let shared = Rc::new(SectionShared {
            window: window.clone(),
            navigator: RefCell::new(SectionNavigator::new(config.sections)),
            sections,
            up,
            down,
            hidden_class: ids.hidden_class.clone(),
        });
        shared.refresh();
        info!(sections = shared.sections.len(), "section navigation mounted");

        let listeners = vec![
            {
                let shared = Rc::downgrade(&shared);
                EventListener::new(window, "scroll", move |_| {
                    if let Some(shared) = shared.upgrade() {
                        shared.refresh();
                    }
                })
            },
            {
                let shared = Rc::downgrade(&shared);
                EventListener::new(window, "resize", move |_| {
                    if let Some(shared) = shared.upgrade() {
                        shared.refresh();
                    }
                })
            },
            arrow_listener(&shared, ScrollDirection::Up),
            arrow_listener(&shared, ScrollDirection::Down),
        ];

        Ok(Self {
            _shared: shared,
            _listeners: listeners,
        })
    }
}

impl SectionShared {
    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    /// Section tops in document coordinates. Late media and model loads move
    /// sections without a resize, so this runs on every scroll and click.
    fn measure(&self) -> Vec<SectionBounds> {
        let scroll_y = self.scroll_y();
        self.sections
            .iter()
            .map(|section| {
                let rect = section.get_bounding_client_rect();
                SectionBounds::new(rect.top() + scroll_y, rect.height())
            })
            .collect()
    }

    fn refresh(&self) {
        let sections = self.measure();
        let arrows = {
            let mut navigator = self.navigator.borrow_mut();
            navigator.set_sections(sections);
            navigator.on_scroll(self.scroll_y())
        };
        self.show_arrows(arrows);
    }

    fn show_arrows(&self, arrows: ArrowVisibility) {
        dom::set_class(&self.up, &self.hidden_class, !arrows.up);
        dom::set_class(&self.down, &self.hidden_class, !arrows.down);
    }

    fn step(&self, direction: ScrollDirection) {
        self.refresh();
        let Some(top) = self.navigator.borrow().scroll_target(direction) else {
            return;
        };
        debug!(?direction, top, "scrolling to section");

        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }
}

fn arrow_listener(shared: &Rc<SectionShared>, direction: ScrollDirection) -> EventListener {
    let target = match direction {
        ScrollDirection::Up => &shared.up,
        ScrollDirection::Down => &shared.down,
    };
    let shared = Rc::downgrade(shared);
    EventListener::new(target, "click", move |_| {
        if let Some(shared) = shared.upgrade() {
            shared.step(direction);
        }
    })
}
