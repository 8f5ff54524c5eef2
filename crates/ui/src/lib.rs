//! Browser shell for the pet site: binds the engine components to the page.

mod app;
mod bridge;
mod dom;
mod logging;
mod widgets;

use std::cell::RefCell;

use gloo::events::EventListener;
use tracing::{error, info};
use wasm_bindgen::prelude::*;

use app::App;

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

/// Entry point run when the module is instantiated.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    logging::init_tracing();

    let document = dom::document()?;
    if document.ready_state() == "loading" {
        EventListener::once(&document, "DOMContentLoaded", |_| mount()).forget();
    } else {
        mount();
    }
    Ok(())
}

/// Detaches every listener and timer installed by [`start`].
#[wasm_bindgen]
pub fn unmount() {
    let app = APP.with(|slot| slot.borrow_mut().take());
    if app.is_some() {
        info!("page bindings removed");
    }
}

fn mount() {
    match App::mount() {
        Ok(app) => APP.with(|slot| *slot.borrow_mut() = Some(app)),
        Err(err) => error!(error = %err, "page interactivity unavailable"),
    }
}
