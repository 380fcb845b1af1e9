use crate::{
    core::bounds::Bounds,
    dom::Dom,
    input::events::{ClickEvent, ClickListener},
    MapError, Result,
};
use std::{cell::RefCell, fmt, rc::Rc};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, MouseEvent, Node};

pub(crate) fn js_error(value: JsValue) -> MapError {
    MapError::Dom(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}

type ClickClosure = Closure<dyn FnMut(MouseEvent)>;

#[derive(Default)]
struct Listeners {
    active: Vec<(Element, ClickClosure)>,
    /// Released by the last `remove`; one of them may still be running
    retired: Vec<ClickClosure>,
}

/// The browser document, reached through `web-sys`.
///
/// Click listeners are wrapped in `Closure`s keyed by their element. They are
/// released when that element, or one of its ancestors, goes through
/// [`Dom::remove`].
#[derive(Clone)]
pub struct WebDom {
    document: Document,
    listeners: Rc<RefCell<Listeners>>,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            listeners: Rc::new(RefCell::new(Listeners::default())),
        }
    }

    /// The document of the global `window`
    pub fn from_window() -> Result<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| MapError::Dom("no window document available".to_string()))?;
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Click closures still attached to live elements
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().active.len()
    }
}

impl fmt::Debug for WebDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDom")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Dom for WebDom {
    type Element = Element;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn create_element(&self, tag: &str) -> Result<Element> {
        self.document.create_element(tag).map_err(js_error)
    }

    fn append_child(&self, parent: &Element, child: &Element) -> Result<()> {
        parent.append_child(child).map(|_| ()).map_err(js_error)
    }

    fn remove(&self, element: &Element) {
        element.remove();

        let mut listeners = self.listeners.borrow_mut();
        // A close button removes its popup from inside its own closure, so
        // closures are dropped one removal late
        listeners.retired.clear();
        let (released, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut listeners.active)
            .into_iter()
            .partition(|(target, _)| {
                let target: &Node = target;
                element.contains(Some(target))
            });
        listeners.active = kept;
        listeners
            .retired
            .extend(released.into_iter().map(|(_, closure)| closure));
    }

    fn set_class_name(&self, element: &Element, class_name: &str) {
        element.set_class_name(class_name);
    }

    fn add_class(&self, element: &Element, class: &str) -> Result<()> {
        element.class_list().add_1(class).map_err(js_error)
    }

    fn set_style(&self, element: &Element, property: &str, value: &str) -> Result<()> {
        let element = element
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| MapError::Dom(format!("<{}> has no inline style", element.tag_name())))?;
        let style = element.style();
        if value.is_empty() {
            style.remove_property(property).map(|_| ()).map_err(js_error)
        } else {
            style.set_property(property, value).map_err(js_error)
        }
    }

    fn set_attribute(&self, element: &Element, name: &str, value: &str) -> Result<()> {
        element.set_attribute(name, value).map_err(js_error)
    }

    fn set_inner_html(&self, element: &Element, html: &str) {
        element.set_inner_html(html);
    }

    fn bounding_rect(&self, element: &Element) -> Bounds {
        let rect = element.get_bounding_client_rect();
        Bounds::from_origin_and_size(rect.left(), rect.top(), rect.width(), rect.height())
    }

    fn add_click_listener(&self, element: &Element, mut listener: ClickListener) -> Result<()> {
        let closure = ClickClosure::new(move |event: MouseEvent| {
            let mut click = ClickEvent::new(event.client_x() as f64, event.client_y() as f64);
            listener(&mut click);
            if click.propagation_stopped() {
                event.stop_propagation();
            }
            if click.default_prevented() {
                event.prevent_default();
            }
        });

        element
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
            .map_err(js_error)?;
        self.listeners
            .borrow_mut()
            .active
            .push((element.clone(), closure));
        Ok(())
    }
}
