use engine::MediaSnapshot;
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{HtmlAnchorElement, HtmlSourceElement, HtmlVideoElement};

use crate::dom::js_message;

/// The primary hero video and the link naming the pet on screen.
pub struct HeroVideo {
    video: HtmlVideoElement,
    link: Option<HtmlAnchorElement>,
}

impl HeroVideo {
    pub fn new(video: HtmlVideoElement, link: Option<HtmlAnchorElement>) -> Self {
        Self { video, link }
    }

    pub fn element(&self) -> &HtmlVideoElement {
        &self.video
    }

    pub fn snapshot(&self) -> MediaSnapshot {
        MediaSnapshot {
            source: self.video.current_src(),
            duration: self.video.duration(),
            current_time: self.video.current_time(),
            ready_state: self.video.ready_state(),
            paused: self.video.paused(),
        }
    }

    /// Points the `<source>` child at `src` (or the video itself when the
    /// markup has none) and reloads.
    pub fn load_source(&self, src: &str) {
        let source = self
            .video
            .query_selector("source")
            .ok()
            .flatten()
            .and_then(|element| element.dyn_into::<HtmlSourceElement>().ok());
        match source {
            Some(source) => source.set_src(src),
            None => self.video.set_src(src),
        }
        self.video.load();
    }

    pub fn reload(&self) {
        self.video.load();
    }

    pub fn play(&self) {
        match self.video.play() {
            Ok(promise) => spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    debug!(error = %js_message(&err), "playback did not start");
                }
            }),
            Err(err) => warn!(error = %js_message(&err), "play rejected"),
        }
    }

    pub fn pause(&self) {
        if let Err(err) = self.video.pause() {
            warn!(error = %js_message(&err), "pause rejected");
        }
    }

    pub fn seek(&self, seconds: f64) {
        self.video.set_current_time(seconds);
    }

    pub fn update_link(&self, href: &str, text: &str) {
        if let Some(link) = &self.link {
            link.set_href(href);
            link.set_text_content(Some(text));
        }
    }

    pub fn error_reason(&self) -> String {
        media_error_reason(self.video.error().map(|error| error.code())).to_owned()
    }
}

/// A failing `<source>` child leaves the video's `error` unset.
fn media_error_reason(code: Option<u16>) -> &'static str {
    match code {
        Some(1) => "aborted",
        Some(2) => "network",
        Some(3) => "decode",
        Some(4) => "source not supported",
        Some(_) => "unknown",
        None => "source unreachable",
    }
}

#[cfg(test)]
mod tests {
    use super::media_error_reason;

    #[test]
    fn media_error_codes_have_names() {
        assert_eq!(media_error_reason(Some(2)), "network");
        assert_eq!(media_error_reason(Some(4)), "source not supported");
        assert_eq!(media_error_reason(Some(0)), "unknown");
    }

    #[test]
    fn source_child_failure_without_media_error_is_still_a_reason() {
        assert_eq!(media_error_reason(None), "source unreachable");
    }
}
