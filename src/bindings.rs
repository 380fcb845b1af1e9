//! JavaScript bindings over the browser DOM.
//!
//! Exposes `map`, `imageOverlay`, `marker` and `popup` with the familiar
//! chainable camelCase methods. Handles returned to JavaScript share state,
//! so both chained and statement-by-statement use behave the same.

use crate::{
    core::{
        config::{ImageOverlayOptions, MapOptions, MarkerOptions},
        geo::{LatLng, LatLngBounds},
        map::{Container, Map},
    },
    dom::{web::js_error, WebDom},
    input::events::MapClickEvent,
    layers::{
        base::{Layer, LayerType},
        image::ImageOverlay,
        marker::Marker,
    },
    ui::popup::Popup,
    MapError,
};
use js_sys::{Array, Function, Reflect};
use serde::de::DeserializeOwned;
use std::{cell::RefCell, rc::Rc};
use wasm_bindgen::{prelude::*, JsCast};
use web_sys::Element;

#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn to_js_error(error: MapError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_js_value<T: serde::Serialize>(value: &T) -> JsValue {
    serde_json::to_string(value)
        .ok()
        .and_then(|json| js_sys::JSON::parse(&json).ok())
        .unwrap_or(JsValue::NULL)
}

/// Deserializes an options object; `undefined` and `null` give the defaults.
/// Functions in the object are dropped by `JSON.stringify`.
fn options_from_js<T: DeserializeOwned + Default>(value: &JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    let json: String = js_sys::JSON::stringify(value)?.into();
    serde_json::from_str(&json).map_err(|e| to_js_error(MapError::from(e)))
}

/// Accepts `[lat, lng]` or `{lat, lng}`.
fn lat_lng_from_js(value: &JsValue) -> Result<LatLng, JsValue> {
    let (lat, lng) = if Array::is_array(value) {
        let array = Array::from(value);
        (array.get(0).as_f64(), array.get(1).as_f64())
    } else {
        (
            Reflect::get(value, &JsValue::from_str("lat"))?.as_f64(),
            Reflect::get(value, &JsValue::from_str("lng"))?.as_f64(),
        )
    };

    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(LatLng::new(lat, lng)),
        _ => Err(JsValue::from_str("expected [lat, lng] or {lat, lng}")),
    }
}

/// Accepts `[[lat, lng], [lat, lng]]`.
fn bounds_from_js(value: &JsValue) -> Result<LatLngBounds, JsValue> {
    if !Array::is_array(value) {
        return Err(JsValue::from_str("expected [[lat, lng], [lat, lng]]"));
    }
    let corners = Array::from(value);
    let a = lat_lng_from_js(&corners.get(0))?;
    let b = lat_lng_from_js(&corners.get(1))?;
    let mut bounds = LatLngBounds::new(a, a);
    bounds.extend(&b);
    Ok(bounds)
}

fn call_handler(handler: &Function, event: &MapClickEvent) {
    if let Err(e) = handler.call1(&JsValue::NULL, &to_js_value(event)) {
        web_sys::console::error_1(&e);
    }
}

#[wasm_bindgen]
#[derive(Clone)]
pub struct MapHandle {
    inner: Map<WebDom>,
}

/// `map(idOrElement, options)`; `options.onclick` receives `{latlng: {lat, lng}}`.
#[wasm_bindgen(js_name = map)]
pub fn create_map(container: JsValue, options: JsValue) -> Result<MapHandle, JsValue> {
    let dom = WebDom::from_window().map_err(to_js_error)?;

    let container = match container.as_string() {
        Some(id) => Container::Id(id),
        None => Container::Element(
            container
                .dyn_into::<Element>()
                .map_err(|_| JsValue::from_str("map container must be an id or an element"))?,
        ),
    };

    let mut map_options: MapOptions = options_from_js(&options)?;
    if options.is_object() {
        let onclick = Reflect::get(&options, &JsValue::from_str("onclick"))?;
        if let Some(handler) = onclick.dyn_ref::<Function>() {
            let handler = handler.clone();
            map_options = map_options.on_click(move |event| call_handler(&handler, event));
        }
    }

    let inner = Map::new(dom, container, map_options).map_err(to_js_error)?;
    Ok(MapHandle { inner })
}

#[wasm_bindgen]
impl MapHandle {
    pub fn on(&self, event: &str, handler: Function) -> MapHandle {
        self.inner
            .on_named(event, move |e| call_handler(&handler, e));
        self.clone()
    }

    #[wasm_bindgen(js_name = fitBounds)]
    pub fn fit_bounds(&self, bounds: JsValue) -> Result<MapHandle, JsValue> {
        self.inner.fit_bounds(bounds_from_js(&bounds)?);
        Ok(self.clone())
    }

    /// Records `layer`, then calls `layer.addTo(this)` when it has one.
    #[wasm_bindgen(js_name = addLayer)]
    pub fn add_layer(&self, layer: JsValue) -> Result<MapHandle, JsValue> {
        self.inner
            .add_layer(ScriptLayer { value: layer })
            .map_err(to_js_error)?;
        Ok(self.clone())
    }

    #[wasm_bindgen(js_name = closePopup)]
    pub fn close_popup(&self) {
        self.inner.close_popup();
    }
}

/// Any JavaScript object handed to `addLayer`. Adding it defers to its own
/// `addTo`, so the overlay and marker handles as well as foreign objects work.
#[derive(Clone)]
struct ScriptLayer {
    value: JsValue,
}

impl Layer<WebDom> for ScriptLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::Custom
    }

    fn add_to_map(&self, map: &Map<WebDom>) -> crate::Result<()> {
        let add_to = Reflect::get(&self.value, &JsValue::from_str("addTo")).map_err(js_error)?;
        match add_to.dyn_ref::<Function>() {
            Some(add_to) => {
                let handle = MapHandle { inner: map.clone() };
                add_to
                    .call1(&self.value, &JsValue::from(handle))
                    .map_err(js_error)?;
            }
            None => log::debug!("layer has no addTo; recorded only"),
        }
        Ok(())
    }

    fn element(&self) -> Option<Element> {
        None
    }
}

#[wasm_bindgen]
#[derive(Clone)]
pub struct ImageOverlayHandle {
    inner: ImageOverlay<WebDom>,
}

#[wasm_bindgen(js_name = imageOverlay)]
pub fn create_image_overlay(
    url: String,
    bounds: JsValue,
    options: JsValue,
) -> Result<ImageOverlayHandle, JsValue> {
    let options: ImageOverlayOptions = options_from_js(&options)?;
    Ok(ImageOverlayHandle {
        inner: ImageOverlay::new(url, bounds_from_js(&bounds)?, options),
    })
}

#[wasm_bindgen]
impl ImageOverlayHandle {
    #[wasm_bindgen(js_name = addTo)]
    pub fn add_to(&self, map: &MapHandle) -> Result<ImageOverlayHandle, JsValue> {
        self.inner.add_to_map(&map.inner).map_err(to_js_error)?;
        Ok(self.clone())
    }
}

#[wasm_bindgen]
#[derive(Clone)]
pub struct MarkerHandle {
    inner: Marker<WebDom>,
}

#[wasm_bindgen(js_name = marker)]
pub fn create_marker(latlng: JsValue, options: JsValue) -> Result<MarkerHandle, JsValue> {
    let options: MarkerOptions = options_from_js(&options)?;
    Ok(MarkerHandle {
        inner: Marker::new(lat_lng_from_js(&latlng)?, options),
    })
}

#[wasm_bindgen]
impl MarkerHandle {
    #[wasm_bindgen(js_name = addTo)]
    pub fn add_to(&self, map: &MapHandle) -> Result<MarkerHandle, JsValue> {
        self.inner.add_to_map(&map.inner).map_err(to_js_error)?;
        Ok(self.clone())
    }

    #[wasm_bindgen(js_name = bindPopup)]
    pub fn bind_popup(&self, content: String) -> MarkerHandle {
        Self {
            inner: self.inner.clone().bind_popup(content),
        }
    }

    #[wasm_bindgen(js_name = openPopup)]
    pub fn open_popup(&self) -> Result<(), JsValue> {
        self.inner.open_popup().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = getLatLng)]
    pub fn get_lat_lng(&self) -> JsValue {
        to_js_value(&self.inner.lat_lng())
    }

    #[wasm_bindgen(js_name = setLatLng)]
    pub fn set_lat_lng(&self, latlng: JsValue) -> Result<MarkerHandle, JsValue> {
        self.inner
            .set_lat_lng(lat_lng_from_js(&latlng)?)
            .map_err(to_js_error)?;
        Ok(self.clone())
    }
}

#[wasm_bindgen]
#[derive(Clone, Default)]
pub struct PopupHandle {
    inner: Rc<RefCell<Popup>>,
}

#[wasm_bindgen(js_name = popup)]
pub fn create_popup() -> PopupHandle {
    PopupHandle::default()
}

#[wasm_bindgen]
impl PopupHandle {
    #[wasm_bindgen(js_name = setLatLng)]
    pub fn set_lat_lng(&self, latlng: JsValue) -> Result<PopupHandle, JsValue> {
        let lat_lng = lat_lng_from_js(&latlng)?;
        self.inner.replace_with(|popup| popup.clone().set_lat_lng(lat_lng));
        Ok(self.clone())
    }

    #[wasm_bindgen(js_name = setContent)]
    pub fn set_content(&self, content: String) -> PopupHandle {
        self.inner.replace_with(|popup| popup.clone().set_content(content));
        self.clone()
    }

    #[wasm_bindgen(js_name = openOn)]
    pub fn open_on(&self, map: &MapHandle) -> Result<PopupHandle, JsValue> {
        let popup = self.inner.borrow().clone();
        popup.open_on(&map.inner).map_err(to_js_error)?;
        Ok(self.clone())
    }
}
