use std::error::Error;
use std::fmt::{self, Display, Formatter};

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Window};

/// Failures while locating or driving page elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    NoWindow,
    NoDocument,
    MissingElement(String),
    UnexpectedElementType {
        selector: String,
        expected: &'static str,
    },
    Js(String),
}

impl Display for DomError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWindow => write!(f, "no global window"),
            Self::NoDocument => write!(f, "window has no document"),
            Self::MissingElement(selector) => write!(f, "element not found: {selector}"),
            Self::UnexpectedElementType { selector, expected } => {
                write!(f, "element {selector} is not a {expected}")
            }
            Self::Js(message) => write!(f, "javascript error: {message}"),
        }
    }
}

impl Error for DomError {}

impl From<JsValue> for DomError {
    fn from(value: JsValue) -> Self {
        Self::Js(js_message(&value))
    }
}

impl From<DomError> for JsValue {
    fn from(error: DomError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}

/// Best-effort text for a thrown JS value.
pub fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

pub fn window() -> Result<Window, DomError> {
    web_sys::window().ok_or(DomError::NoWindow)
}

pub fn document() -> Result<Document, DomError> {
    window()?.document().ok_or(DomError::NoDocument)
}

/// Milliseconds since the epoch, the clock every engine component runs on.
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

pub fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, DomError> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| DomError::MissingElement(format!("#{id}")))?;
    cast(element, &format!("#{id}"))
}

pub fn query<T: JsCast>(document: &Document, selector: &str) -> Result<T, DomError> {
    let element = document
        .query_selector(selector)?
        .ok_or_else(|| DomError::MissingElement(selector.to_owned()))?;
    cast(element, selector)
}

/// Every `HtmlElement` matching `selector`, in document order.
pub fn query_all(document: &Document, selector: &str) -> Result<Vec<HtmlElement>, DomError> {
    let nodes = document.query_selector_all(selector)?;
    Ok((0..nodes.length())
        .filter_map(|index| nodes.item(index))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .collect())
}

pub fn set_class(element: &Element, class: &str, enabled: bool) {
    if let Err(err) = element.class_list().toggle_with_force(class, enabled) {
        tracing::warn!(class, error = %js_message(&err), "class toggle failed");
    }
}

fn cast<T: JsCast>(element: Element, selector: &str) -> Result<T, DomError> {
    element
        .dyn_into::<T>()
        .map_err(|_| DomError::UnexpectedElementType {
            selector: selector.to_owned(),
            expected: std::any::type_name::<T>()
                .rsplit("::")
                .next()
                .unwrap_or("element"),
        })
}
