use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use engine::config::SiteConfig;
use engine::{FilmstripAction, HeroPlayer, PlayerAction, PlayerEvent, ProbeEvent};
use gloo::events::{EventListener, EventListenerOptions};
use gloo::timers::callback::Timeout;
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Event, EventTarget, HtmlAnchorElement, HtmlCanvasElement, HtmlVideoElement,
    MouseEvent, Window,
};

use crate::dom::{self, DomError};
use crate::widgets::hero::HeroVideo;
use crate::widgets::timeline::{ProbeVideo, TimelineCanvas};

/// Connects the hero video, its filmstrip canvas and the window to a
/// [`HeroPlayer`].
///
/// Page events become [`PlayerEvent`]s; the returned [`PlayerAction`]s are
/// performed here. Dropping the bridge removes every listener, pending timer
/// and probe video.
pub struct PlayerBridge {
    _shared: Rc<PlayerShared>,
    _listeners: Vec<EventListener>,
}

struct PlayerShared {
    document: Document,
    player: RefCell<HeroPlayer>,
    hero: HeroVideo,
    timeline: TimelineCanvas,
    probe: RefCell<Option<ProbeVideo>>,
    timers: RefCell<Timers>,
}

/// Document events that end a scrub drag. A touch pan cancels the pointer
/// instead of releasing it.
const DOCUMENT_DRAG_END_EVENTS: [&str; 2] = ["pointerup", "pointercancel"];

/// Canvas events that end a scrub drag once it holds pointer capture.
const CANVAS_DRAG_END_EVENTS: [&str; 1] = ["lostpointercapture"];

#[derive(Default)]
struct Timers {
    reload: Option<Timeout>,
    filmstrip_retry: Option<Timeout>,
    filmstrip_timeout: Option<Timeout>,
}

impl PlayerBridge {
    pub fn mount(
        window: &Window,
        document: &Document,
        config: &SiteConfig,
    ) -> Result<Self, DomError> {
        let ids = &config.elements;
        let video = dom::element_by_id::<HtmlVideoElement>(document, &ids.video)?;
        let canvas = dom::element_by_id::<HtmlCanvasElement>(document, &ids.timeline)?;
        let link = dom::element_by_id::<HtmlAnchorElement>(document, &ids.video_link)
            .inspect_err(|err| warn!(error = %err, "video link disabled"))
            .ok();
        let indicator = dom::query(document, &ids.scrubber_selector)
            .inspect_err(|err| warn!(error = %err, "scrub indicator disabled"))
            .ok();

        let player = HeroPlayer::new(config)
            .map_err(|err| DomError::Js(format!("invalid site config: {err}")))?;
        let timeline = TimelineCanvas::new(canvas, indicator, &config.filmstrip.background)?;

        let shared = Rc::new(PlayerShared {
            document: document.clone(),
            player: RefCell::new(player),
            hero: HeroVideo::new(video, link),
            timeline,
            probe: RefCell::new(None),
            timers: RefCell::new(Timers::default()),
        });

        let listeners = shared.listen(window, document);
        let surface = shared.timeline.measure();
        shared.dispatch(PlayerEvent::Started { surface });
        info!(width = surface.width, height = surface.height, "hero player mounted");

        Ok(Self {
            _shared: shared,
            _listeners: listeners,
        })
    }
}

impl PlayerShared {
    fn listen(self: &Rc<Self>, window: &Window, document: &Document) -> Vec<EventListener> {
        let video = self.hero.element();
        let canvas = self.timeline.element();

        let mut listeners = vec![
            self.on(video, "loadedmetadata", |shared, _| {
                Some(PlayerEvent::MetadataLoaded {
                    media: shared.hero.snapshot(),
                })
            }),
            self.on(video, "timeupdate", |shared, _| {
                let media = shared.hero.snapshot();
                Some(PlayerEvent::TimeUpdate {
                    current_time: media.current_time,
                    duration: media.duration,
                })
            }),
            self.on(video, "ended", |_, _| Some(PlayerEvent::Ended)),
            // `<source>` children report load failures on themselves and the
            // event does not bubble, so listen while it passes the video.
            self.on_with(
                video,
                "error",
                EventListenerOptions::run_in_capture_phase(),
                |shared, _| {
                    Some(PlayerEvent::MediaError {
                        reason: shared.hero.error_reason(),
                    })
                },
            ),
            self.on(video, "click", |shared, _| {
                Some(PlayerEvent::VideoClicked {
                    paused: shared.hero.element().paused(),
                })
            }),
            self.on(canvas, "pointerdown", |shared, event| {
                shared.timeline.capture_pointer(event);
                Some(PlayerEvent::PointerPressed {
                    x: pointer_x(event)?,
                    track: shared.timeline.track_bounds(),
                    duration: shared.hero.element().duration(),
                })
            }),
            self.on(canvas, "click", |shared, event| {
                Some(PlayerEvent::TrackClicked {
                    x: pointer_x(event)?,
                    track: shared.timeline.track_bounds(),
                    duration: shared.hero.element().duration(),
                })
            }),
            self.on(document, "pointermove", |shared, event| {
                if !shared.player.borrow().scrubber().is_dragging() {
                    return None;
                }
                Some(PlayerEvent::PointerMoved {
                    x: pointer_x(event)?,
                    track: shared.timeline.track_bounds(),
                    duration: shared.hero.element().duration(),
                })
            }),
            self.on(window, "resize", |shared, _| {
                Some(PlayerEvent::Resized {
                    surface: shared.timeline.measure(),
                    media: shared.hero.snapshot(),
                })
            }),
        ];

        let document_target: &EventTarget = document;
        let canvas_target: &EventTarget = canvas;
        let drag_ends = DOCUMENT_DRAG_END_EVENTS
            .into_iter()
            .map(|event_type| (document_target, event_type))
            .chain(
                CANVAS_DRAG_END_EVENTS
                    .into_iter()
                    .map(|event_type| (canvas_target, event_type)),
            );
        for (target, event_type) in drag_ends {
            listeners.push(self.on(target, event_type, |_, _| {
                Some(PlayerEvent::PointerReleased)
            }));
        }
        listeners
    }

    /// Listens for `event_type` on `target` and dispatches whatever `map`
    /// turns the DOM event into.
    fn on(
        self: &Rc<Self>,
        target: &EventTarget,
        event_type: &'static str,
        map: impl Fn(&PlayerShared, &Event) -> Option<PlayerEvent> + 'static,
    ) -> EventListener {
        self.on_with(target, event_type, EventListenerOptions::default(), map)
    }

    fn on_with(
        self: &Rc<Self>,
        target: &EventTarget,
        event_type: &'static str,
        options: EventListenerOptions,
        map: impl Fn(&PlayerShared, &Event) -> Option<PlayerEvent> + 'static,
    ) -> EventListener {
        let shared = Rc::downgrade(self);
        EventListener::new_with_options(target, event_type, options, move |event| {
            if let Some(shared) = shared.upgrade()
                && let Some(player_event) = map(shared.as_ref(), event)
            {
                shared.dispatch(player_event);
            }
        })
    }

    /// Feeds `event` to the player and performs the resulting actions,
    /// including any events those actions report synchronously.
    fn dispatch(self: &Rc<Self>, event: PlayerEvent) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            let actions = self.player.borrow_mut().handle(event, dom::now_ms());
            for action in actions {
                if let Some(follow_up) = self.perform(action) {
                    pending.push_back(follow_up);
                }
            }
        }
    }

    fn perform(self: &Rc<Self>, action: PlayerAction) -> Option<PlayerEvent> {
        match action {
            PlayerAction::LoadSource { src } => self.hero.load_source(&src),
            PlayerAction::Play => self.hero.play(),
            PlayerAction::Pause => self.hero.pause(),
            PlayerAction::UpdateLink { href, text } => self.hero.update_link(&href, &text),
            PlayerAction::Reload => self.hero.reload(),
            PlayerAction::ScheduleReload { after_ms } => {
                let timer = self.after(after_ms, |_| Some(PlayerEvent::ReloadElapsed));
                self.timers.borrow_mut().reload = Some(timer);
            }
            PlayerAction::SeekTo { seconds } => self.hero.seek(seconds),
            PlayerAction::MoveIndicator { percent } => self.timeline.move_indicator(percent),
            PlayerAction::ResizeSurface { surface } => self.timeline.resize(surface),
            PlayerAction::Filmstrip(action) => return self.perform_filmstrip(action),
        }
        None
    }

    fn perform_filmstrip(self: &Rc<Self>, action: FilmstripAction) -> Option<PlayerEvent> {
        match action {
            FilmstripAction::ClearSurface => self.timeline.clear(),
            FilmstripAction::ScheduleRetry { after_ms } => {
                let timer = self.after(after_ms, |shared| {
                    Some(PlayerEvent::FilmstripRetryElapsed {
                        media: shared.hero.snapshot(),
                    })
                });
                self.timers.borrow_mut().filmstrip_retry = Some(timer);
            }
            FilmstripAction::LoadProbe { pass, src } => {
                self.probe.borrow_mut().take();
                match ProbeVideo::load(&self.document, pass, &src, self.probe_sink()) {
                    Ok(probe) => *self.probe.borrow_mut() = Some(probe),
                    Err(err) => {
                        warn!(pass, error = %err, "probe video unavailable");
                        return Some(PlayerEvent::Probe(ProbeEvent::Error { pass }));
                    }
                }
            }
            FilmstripAction::ArmTimeout { pass, after_ms } => {
                let timer = self.after(after_ms, move |_| {
                    Some(PlayerEvent::Probe(ProbeEvent::TimeoutElapsed { pass }))
                });
                self.timers.borrow_mut().filmstrip_timeout = Some(timer);
            }
            FilmstripAction::SeekProbe {
                pass,
                index,
                at_seconds,
            } => match &*self.probe.borrow() {
                Some(probe) if probe.pass() == pass => probe.seek(at_seconds),
                _ => {
                    debug!(pass, index, "no probe to seek");
                    return Some(PlayerEvent::Probe(ProbeEvent::Error { pass }));
                }
            },
            FilmstripAction::DrawFrame { pass, index, slot } => {
                let outcome = match &*self.probe.borrow() {
                    Some(probe) if probe.pass() == pass => {
                        self.timeline.draw_frame(probe.video(), slot)
                    }
                    _ => Err(String::from("probe released")),
                };
                return Some(PlayerEvent::Probe(match outcome {
                    Ok(()) => ProbeEvent::FrameDrawn { pass, index },
                    Err(reason) => ProbeEvent::FrameFailed {
                        pass,
                        index,
                        reason,
                    },
                }));
            }
            FilmstripAction::ReleaseProbe { pass } => {
                let mut probe = self.probe.borrow_mut();
                if probe.as_ref().is_some_and(|probe| probe.pass() == pass) {
                    probe.take();
                }
                self.timers.borrow_mut().filmstrip_timeout.take();
            }
        }
        None
    }

    fn probe_sink(self: &Rc<Self>) -> Rc<dyn Fn(ProbeEvent)> {
        let shared = Rc::downgrade(self);
        Rc::new(move |event| {
            if let Some(shared) = shared.upgrade() {
                shared.dispatch(PlayerEvent::Probe(event));
            }
        })
    }

    /// One-shot timer that dispatches the event built by `make` unless the
    /// bridge is gone by then.
    fn after(
        self: &Rc<Self>,
        after_ms: u64,
        make: impl FnOnce(&PlayerShared) -> Option<PlayerEvent> + 'static,
    ) -> Timeout {
        let shared: Weak<Self> = Rc::downgrade(self);
        Timeout::new(timer_millis(after_ms), move || {
            if let Some(shared) = shared.upgrade()
                && let Some(event) = make(shared.as_ref())
            {
                shared.dispatch(event);
            }
        })
    }
}

fn pointer_x(event: &Event) -> Option<f64> {
    event
        .dyn_ref::<MouseEvent>()
        .map(|event| f64::from(event.client_x()))
}

fn timer_millis(after_ms: u64) -> u32 {
    u32::try_from(after_ms).unwrap_or(u32::MAX)
}
