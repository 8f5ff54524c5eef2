use std::rc::Rc;

use engine::filmstrip::{FrameSlot, PassId};
use engine::scrubber::TrackBounds;
use engine::{ProbeEvent, SurfaceSize};
use gloo::events::EventListener;
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, Event, HtmlCanvasElement, HtmlElement, HtmlVideoElement,
    PointerEvent,
};

use crate::dom::{DomError, js_message};

/// The filmstrip canvas under the hero video and its scrub indicator.
pub struct TimelineCanvas {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    indicator: Option<HtmlElement>,
    background: String,
}

impl TimelineCanvas {
    pub fn new(
        canvas: HtmlCanvasElement,
        indicator: Option<HtmlElement>,
        background: &str,
    ) -> Result<Self, DomError> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| DomError::Js(String::from("2d context unavailable")))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| DomError::UnexpectedElementType {
                selector: String::from("canvas context"),
                expected: "CanvasRenderingContext2d",
            })?;

        Ok(Self {
            canvas,
            context,
            indicator,
            background: background.to_owned(),
        })
    }

    pub fn element(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Displayed size of the canvas, used as its drawing resolution.
    pub fn measure(&self) -> SurfaceSize {
        SurfaceSize::new(
            clamp_dimension(self.canvas.offset_width()),
            clamp_dimension(self.canvas.offset_height()),
        )
    }

    pub fn resize(&self, surface: SurfaceSize) {
        self.canvas.set_width(surface.width);
        self.canvas.set_height(surface.height);
    }

    pub fn clear(&self) {
        self.context.set_fill_style_str(&self.background);
        self.context.fill_rect(
            0.0,
            0.0,
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
        );
    }

    pub fn draw_frame(&self, probe: &HtmlVideoElement, slot: FrameSlot) -> Result<(), String> {
        self.context
            .draw_image_with_html_video_element_and_dw_and_dh(
                probe,
                slot.x,
                0.0,
                slot.width,
                slot.height,
            )
            .map_err(|err| js_message(&err))
    }

    pub fn track_bounds(&self) -> TrackBounds {
        let rect = self.canvas.get_bounding_client_rect();
        TrackBounds::new(rect.left(), rect.width())
    }

    /// Keeps pointer events flowing to the canvas for the rest of a drag.
    pub fn capture_pointer(&self, event: &Event) {
        let Some(pointer) = event.dyn_ref::<PointerEvent>() else {
            return;
        };
        if let Err(err) = self.canvas.set_pointer_capture(pointer.pointer_id()) {
            debug!(error = %js_message(&err), "pointer capture refused");
        }
    }

    pub fn move_indicator(&self, percent: f64) {
        let Some(indicator) = &self.indicator else {
            return;
        };
        if let Err(err) = indicator
            .style()
            .set_property("left", &percent_offset(percent))
        {
            warn!(error = %js_message(&err), "indicator update failed");
        }
    }
}

/// A detached, muted video used to capture frames for one pass.
///
/// Dropping it removes its listeners and aborts any pending fetch.
pub struct ProbeVideo {
    pass: PassId,
    video: HtmlVideoElement,
    _listeners: Vec<EventListener>,
}

impl ProbeVideo {
    pub fn load(
        document: &Document,
        pass: PassId,
        src: &str,
        sink: Rc<dyn Fn(ProbeEvent)>,
    ) -> Result<Self, DomError> {
        let video = document
            .create_element("video")?
            .dyn_into::<HtmlVideoElement>()
            .map_err(|_| DomError::UnexpectedElementType {
                selector: String::from("video"),
                expected: "HtmlVideoElement",
            })?;
        video.set_cross_origin(Some("anonymous"));
        video.set_muted(true);
        video.set_preload("auto");
        video.set_attribute("playsinline", "")?;

        let listeners = vec![
            probe_listener(&video, "loadedmetadata", &sink, move || {
                ProbeEvent::MetadataLoaded { pass }
            }),
            probe_listener(&video, "seeked", &sink, move || ProbeEvent::Seeked { pass }),
            probe_listener(&video, "error", &sink, move || ProbeEvent::Error { pass }),
        ];

        debug!(pass, src, "probe loading");
        video.set_src(src);

        Ok(Self {
            pass,
            video,
            _listeners: listeners,
        })
    }

    pub fn pass(&self) -> PassId {
        self.pass
    }

    pub fn video(&self) -> &HtmlVideoElement {
        &self.video
    }

    pub fn seek(&self, seconds: f64) {
        self.video.set_current_time(seconds);
    }
}

impl Drop for ProbeVideo {
    fn drop(&mut self) {
        if let Err(err) = self.video.remove_attribute("src") {
            debug!(pass = self.pass, error = %js_message(&err), "probe source not cleared");
        }
        self.video.load();
    }
}

fn probe_listener(
    video: &HtmlVideoElement,
    event_type: &'static str,
    sink: &Rc<dyn Fn(ProbeEvent)>,
    event: impl Fn() -> ProbeEvent + 'static,
) -> EventListener {
    let sink = Rc::clone(sink);
    EventListener::new(video, event_type, move |_| sink(event()))
}

fn clamp_dimension(pixels: i32) -> u32 {
    u32::try_from(pixels).unwrap_or(0)
}

fn percent_offset(percent: f64) -> String {
    format!("{percent}%")
}

#[cfg(test)]
mod tests {
    use super::{clamp_dimension, percent_offset};

    #[test]
    fn negative_layout_sizes_clamp_to_zero() {
        assert_eq!(clamp_dimension(-4), 0);
        assert_eq!(clamp_dimension(640), 640);
    }

    #[test]
    fn indicator_offset_is_a_css_percentage() {
        assert_eq!(percent_offset(25.0), "25%");
        assert_eq!(percent_offset(12.5), "12.5%");
    }
}
