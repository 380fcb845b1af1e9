use crate::{
    core::{
        config::MarkerOptions,
        constants::MARKER_ICON_CLASS,
        geo::LatLng,
        map::{Map, PaneKind, WeakMap},
        projection::{lat_lng_to_percent, percent_css},
    },
    dom::Dom,
    input::events::ClickEvent,
    layers::base::{Layer, LayerType},
    Result,
};
use std::{cell::RefCell, rc::Rc};

struct MarkerState<D: Dom> {
    lat_lng: LatLng,
    options: MarkerOptions,
    popup_content: Option<String>,
    map: Option<WeakMap<D>>,
    element: Option<D::Element>,
}

/// A clickable pin at a fixed position, optionally carrying popup content.
pub struct Marker<D: Dom> {
    state: Rc<RefCell<MarkerState<D>>>,
}

impl<D: Dom> Clone for Marker<D> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

fn place<D: Dom>(dom: &D, element: &D::Element, lat_lng: &LatLng) -> Result<()> {
    let position = lat_lng_to_percent(lat_lng);
    dom.set_style(element, "left", &percent_css(position.x))?;
    dom.set_style(element, "top", &percent_css(position.y))
}

impl<D: Dom> Marker<D> {
    pub fn new(lat_lng: impl Into<LatLng>, options: MarkerOptions) -> Self {
        Self {
            state: Rc::new(RefCell::new(MarkerState {
                lat_lng: lat_lng.into(),
                options,
                popup_content: None,
                map: None,
                element: None,
            })),
        }
    }

    /// Adds the marker to `map` and hands it back for chaining.
    pub fn add_to(self, map: &Map<D>) -> Result<Self> {
        self.add_to_map(map)?;
        Ok(self)
    }

    /// Attaches popup content shown when the marker is clicked.
    pub fn bind_popup(self, content: impl Into<String>) -> Self {
        self.state.borrow_mut().popup_content = Some(content.into());
        self
    }

    /// Opens the bound popup on the marker's map. Does nothing until the
    /// marker has both a popup and a map.
    pub fn open_popup(&self) -> Result<()> {
        let (content, lat_lng, map) = {
            let state = self.state.borrow();
            let map = state.map.as_ref().and_then(WeakMap::upgrade);
            match (&state.popup_content, map) {
                (Some(content), Some(map)) => (content.clone(), state.lat_lng, map),
                _ => return Ok(()),
            }
        };
        map.open_popup(&content, lat_lng)
    }

    pub fn lat_lng(&self) -> LatLng {
        self.state.borrow().lat_lng
    }

    /// Moves the marker, repositioning its element if it is on a map.
    pub fn set_lat_lng(&self, lat_lng: impl Into<LatLng>) -> Result<()> {
        let lat_lng = lat_lng.into();
        let (element, map) = {
            let mut state = self.state.borrow_mut();
            state.lat_lng = lat_lng;
            (
                state.element.clone(),
                state.map.as_ref().and_then(WeakMap::upgrade),
            )
        };

        if let (Some(element), Some(map)) = (element, map) {
            place(map.dom(), &element, &lat_lng)?;
        }
        Ok(())
    }

    pub fn popup_content(&self) -> Option<String> {
        self.state.borrow().popup_content.clone()
    }

    pub fn is_added(&self) -> bool {
        self.state.borrow().element.is_some()
    }

    fn on_click(&self) {
        if self.state.borrow().popup_content.is_none() {
            return;
        }
        if let Err(e) = self.open_popup() {
            log::warn!("failed to open marker popup: {}", e);
        }
    }
}

impl<D: Dom> Layer<D> for Marker<D> {
    fn layer_type(&self) -> LayerType {
        LayerType::Marker
    }

    fn add_to_map(&self, map: &Map<D>) -> Result<()> {
        let dom = map.dom();
        let (lat_lng, declarations) = {
            let state = self.state.borrow();
            (state.lat_lng, state.options.style.declarations())
        };

        let element = dom.create_element("div")?;
        dom.set_class_name(&element, MARKER_ICON_CLASS);
        dom.set_styles(&element, &declarations[..])?;
        place(dom, &element, &lat_lng)?;

        let weak = Rc::downgrade(&self.state);
        dom.add_click_listener(
            &element,
            Box::new(move |event: &mut ClickEvent| {
                // Marker clicks never count as map clicks
                event.stop_propagation();
                if let Some(state) = weak.upgrade() {
                    Marker { state }.on_click();
                }
            }),
        )?;

        dom.append_child(&map.pane(PaneKind::Marker), &element)?;
        {
            let mut state = self.state.borrow_mut();
            state.element = Some(element);
            state.map = Some(map.downgrade());
        }
        map.register_marker(self.clone());

        log::debug!("marker added at ({}, {})", lat_lng.lat, lat_lng.lng);
        Ok(())
    }

    fn element(&self) -> Option<D::Element> {
        self.state.borrow().element.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::config::{MapOptions, MarkerStyle},
        dom::MemoryDom,
    };
    use std::cell::Cell;

    fn setup() -> (MemoryDom, Map<MemoryDom>) {
        let dom = MemoryDom::new();
        dom.create_container("map", 800.0, 400.0);
        let map = crate::map(&dom, "map", MapOptions::default()).unwrap();
        (dom, map)
    }

    #[test]
    fn test_marker_placement() {
        let (dom, map) = setup();
        let marker = Marker::new([45.0, 90.0], MarkerOptions::default())
            .add_to(&map)
            .unwrap();

        let element = marker.element().unwrap();
        assert_eq!(dom.parent(element), Some(map.pane(PaneKind::Marker)));
        assert!(dom.has_class(element, "leaflet-marker-icon"));
        assert_eq!(dom.style(element, "left").as_deref(), Some("75%"));
        assert_eq!(dom.style(element, "top").as_deref(), Some("25%"));
        assert_eq!(dom.style(element, "position").as_deref(), Some("absolute"));
        assert_eq!(dom.style(element, "transform").as_deref(), Some("rotate(-45deg)"));
        assert_eq!(map.markers().len(), 1);
    }

    #[test]
    fn test_custom_style() {
        let (dom, map) = setup();
        let style = MarkerStyle {
            background_color: "#0000ff".to_string(),
            size: 30,
            ..MarkerStyle::default()
        };
        let marker = Marker::new([0.0, 0.0], MarkerOptions::default().with_style(style))
            .add_to(&map)
            .unwrap();

        let element = marker.element().unwrap();
        assert_eq!(dom.style(element, "background-color").as_deref(), Some("#0000ff"));
        assert_eq!(dom.style(element, "width").as_deref(), Some("30px"));
    }

    #[test]
    fn test_open_popup_requires_popup_and_map() {
        let (dom, map) = setup();

        let unattached: Marker<MemoryDom> =
            Marker::new([0.0, 0.0], MarkerOptions::default()).bind_popup("hi");
        unattached.open_popup().unwrap();

        let bare = Marker::new([0.0, 0.0], MarkerOptions::default())
            .add_to(&map)
            .unwrap();
        bare.open_popup().unwrap();

        assert!(dom.children(map.pane(PaneKind::Popup)).is_empty());
    }

    #[test]
    fn test_click_opens_bound_popup_and_stops_propagation() {
        let (dom, map) = setup();
        let map_clicks = Rc::new(Cell::new(0));
        let clicks = map_clicks.clone();
        map.on(crate::MapEventKind::Click, move |_| clicks.set(clicks.get() + 1));

        let marker = Marker::new([10.0, 20.0], MarkerOptions::default())
            .bind_popup("<b>Station</b>")
            .add_to(&map)
            .unwrap();

        let event = dom.dispatch_click(marker.element().unwrap(), 10.0, 10.0);
        assert!(event.propagation_stopped());
        assert_eq!(map_clicks.get(), 0);

        let popups = dom.children(map.pane(PaneKind::Popup));
        assert_eq!(popups.len(), 1);
        let content = dom.elements_by_class(popups[0], "leaflet-popup-content");
        assert_eq!(dom.inner_html(content[0]), "<b>Station</b>");
    }

    #[test]
    fn test_click_without_popup_does_nothing() {
        let (dom, map) = setup();
        let marker = Marker::new([10.0, 20.0], MarkerOptions::default())
            .add_to(&map)
            .unwrap();

        dom.dispatch_click(marker.element().unwrap(), 0.0, 0.0);
        assert!(!map.has_open_popup());
    }

    #[test]
    fn test_set_lat_lng_moves_element() {
        let (dom, map) = setup();
        let marker = Marker::new([0.0, 0.0], MarkerOptions::default())
            .add_to(&map)
            .unwrap();

        marker.set_lat_lng([-45.0, -90.0]).unwrap();
        let element = marker.element().unwrap();
        assert_eq!(marker.lat_lng(), LatLng::new(-45.0, -90.0));
        assert_eq!(dom.style(element, "left").as_deref(), Some("25%"));
        assert_eq!(dom.style(element, "top").as_deref(), Some("75%"));
    }
}
