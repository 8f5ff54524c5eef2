use tracing::debug;

use crate::config::SectionSettings;

/// Vertical extent of one page section in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionBounds {
    pub top: f64,
    pub height: f64,
}

impl SectionBounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    fn band_start(&self, settings: SectionSettings) -> f64 {
        self.top - settings.enter_fraction * self.height
    }

    fn band_end(&self, settings: SectionSettings) -> f64 {
        self.top + settings.leave_fraction * self.height
    }
}

/// Which directional controls should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowVisibility {
    pub up: bool,
    pub down: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Picks the current section for `scroll_y`.
///
/// A section is current from `enter_fraction` of its height above its top
/// edge until `leave_fraction` of its height past it; the first such section
/// wins. Scroll positions outside every band resolve to the nearest section
/// above (or the first section when above all of them). The result depends on
/// `scroll_y` alone, so repeated identical scroll events never flip it.
///
/// # Example
/// ```
/// use engine::config::SectionSettings;
/// use engine::sections::{SectionBounds, current_section};
///
/// let sections = [SectionBounds::new(0.0, 800.0), SectionBounds::new(800.0, 800.0)];
/// let settings = SectionSettings::default();
///
/// assert_eq!(current_section(&sections, 599.0, settings), Some(0));
/// assert_eq!(current_section(&sections, 600.0, settings), Some(1));
/// ```
pub fn current_section(
    sections: &[SectionBounds],
    scroll_y: f64,
    settings: SectionSettings,
) -> Option<usize> {
    if sections.is_empty() {
        return None;
    }

    if let Some(index) = sections.iter().position(|section| {
        section.band_start(settings) <= scroll_y && scroll_y < section.band_end(settings)
    }) {
        return Some(index);
    }

    let above = sections
        .iter()
        .rposition(|section| section.band_start(settings) <= scroll_y);
    Some(above.unwrap_or(0))
}

/// Tracks the section in view and the arrow controls that step between
/// sections.
#[derive(Debug)]
pub struct SectionNavigator {
    settings: SectionSettings,
    sections: Vec<SectionBounds>,
    current: usize,
}

impl SectionNavigator {
    pub fn new(settings: SectionSettings) -> Self {
        Self {
            settings,
            sections: Vec::new(),
            current: 0,
        }
    }

    /// Replaces the measured section layout before the next scroll or step.
    pub fn set_sections(&mut self, sections: Vec<SectionBounds>) {
        self.sections = sections;
        self.current = self.current.min(self.sections.len().saturating_sub(1));
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Recomputes the current section and returns the arrows to show.
    pub fn on_scroll(&mut self, scroll_y: f64) -> ArrowVisibility {
        if let Some(index) = current_section(&self.sections, scroll_y, self.settings)
            && index != self.current
        {
            debug!(from = self.current, to = index, scroll_y, "current section changed");
            self.current = index;
        }
        self.arrows()
    }

    pub fn arrows(&self) -> ArrowVisibility {
        let count = self.sections.len();
        ArrowVisibility {
            up: count > 0 && self.current > 0,
            down: self.current + 1 < count,
        }
    }

    /// Top of the adjacent section in `direction`, clamped at both ends.
    pub fn scroll_target(&self, direction: ScrollDirection) -> Option<f64> {
        let last = self.sections.len().checked_sub(1)?;
        let index = match direction {
            ScrollDirection::Up => self.current.saturating_sub(1),
            ScrollDirection::Down => (self.current + 1).min(last),
        };
        self.sections.get(index).map(|section| section.top)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ArrowVisibility, ScrollDirection, SectionBounds, SectionNavigator, current_section,
    };
    use crate::config::SectionSettings;

    fn page() -> Vec<SectionBounds> {
        vec![
            SectionBounds::new(0.0, 1_000.0),
            SectionBounds::new(1_000.0, 1_000.0),
            SectionBounds::new(2_000.0, 400.0),
        ]
    }

    #[test]
    fn section_becomes_current_a_quarter_before_its_top() {
        let settings = SectionSettings::default();
        assert_eq!(current_section(&page(), 749.0, settings), Some(0));
        assert_eq!(current_section(&page(), 750.0, settings), Some(1));
    }

    #[test]
    fn gap_between_bands_resolves_to_section_above() {
        // Band of section 1 ends at 1750, band of section 2 starts at 1900.
        let settings = SectionSettings::default();
        assert_eq!(current_section(&page(), 1_800.0, settings), Some(1));
        assert_eq!(current_section(&page(), 1_900.0, settings), Some(2));
    }

    #[test]
    fn positions_past_the_last_band_stay_on_the_last_section() {
        assert_eq!(
            current_section(&page(), 10_000.0, SectionSettings::default()),
            Some(2)
        );
    }

    #[test]
    fn negative_overscroll_resolves_to_first_section() {
        assert_eq!(
            current_section(&page(), -400.0, SectionSettings::default()),
            Some(0)
        );
    }

    #[test]
    fn empty_page_has_no_current_section() {
        assert_eq!(current_section(&[], 0.0, SectionSettings::default()), None);
    }

    #[test]
    fn arrows_hide_at_first_and_last_section() {
        let mut navigator = SectionNavigator::new(SectionSettings::default());
        navigator.set_sections(page());

        assert_eq!(
            navigator.on_scroll(0.0),
            ArrowVisibility {
                up: false,
                down: true
            }
        );
        assert_eq!(
            navigator.on_scroll(1_200.0),
            ArrowVisibility {
                up: true,
                down: true
            }
        );
        assert_eq!(
            navigator.on_scroll(2_100.0),
            ArrowVisibility {
                up: true,
                down: false
            }
        );
    }

    #[test]
    fn repeated_boundary_scrolls_do_not_oscillate() {
        let mut navigator = SectionNavigator::new(SectionSettings::default());
        navigator.set_sections(page());

        for _ in 0..5 {
            navigator.on_scroll(750.0);
            assert_eq!(navigator.current(), 1);
        }
    }

    #[test]
    fn scroll_targets_clamp_at_boundaries() {
        let mut navigator = SectionNavigator::new(SectionSettings::default());
        navigator.set_sections(page());

        navigator.on_scroll(0.0);
        assert_eq!(navigator.scroll_target(ScrollDirection::Up), Some(0.0));
        assert_eq!(navigator.scroll_target(ScrollDirection::Down), Some(1_000.0));

        navigator.on_scroll(2_300.0);
        assert_eq!(navigator.scroll_target(ScrollDirection::Down), Some(2_000.0));
        assert_eq!(navigator.scroll_target(ScrollDirection::Up), Some(1_000.0));
    }

    #[test]
    fn re_measured_layout_moves_scroll_targets_and_current_section() {
        let mut navigator = SectionNavigator::new(SectionSettings::default());
        navigator.set_sections(vec![
            SectionBounds::new(0.0, 300.0),
            SectionBounds::new(300.0, 800.0),
        ]);
        assert!(navigator.on_scroll(500.0).up);
        assert_eq!(navigator.current(), 1);

        // The hero grew once its video metadata arrived.
        navigator.set_sections(vec![
            SectionBounds::new(0.0, 700.0),
            SectionBounds::new(700.0, 800.0),
        ]);
        navigator.on_scroll(500.0);

        assert_eq!(navigator.current(), 0);
        assert_eq!(navigator.scroll_target(ScrollDirection::Down), Some(700.0));
    }

    #[test]
    fn shrinking_layout_clamps_current_section() {
        let mut navigator = SectionNavigator::new(SectionSettings::default());
        navigator.set_sections(page());
        navigator.on_scroll(2_100.0);

        navigator.set_sections(vec![SectionBounds::new(0.0, 900.0)]);

        assert_eq!(navigator.current(), 0);
        assert_eq!(
            navigator.arrows(),
            ArrowVisibility {
                up: false,
                down: false
            }
        );
        assert_eq!(navigator.scroll_target(ScrollDirection::Down), Some(0.0));
    }
}
