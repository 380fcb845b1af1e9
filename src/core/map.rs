use crate::{
    core::{
        config::MapOptions,
        constants::{
            CONTAINER_CLASS, MAP_PANE_CLASS, MARKER_PANE_CLASS, OVERLAY_PANE_CLASS,
            POPUP_PANE_CLASS, SHADOW_PANE_CLASS, TILE_PANE_CLASS, TOOLTIP_PANE_CLASS,
        },
        geo::{LatLng, LatLngBounds},
        projection,
    },
    dom::Dom,
    input::events::{ClickEvent, MapClickEvent, MapClickHandler, MapEventKind},
    layers::{base::Layer, marker::Marker},
    ui::popup::build_popup_element,
    MapError, Result,
};
use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

/// Where the map should mount: an element id or the element itself
#[derive(Debug, Clone, PartialEq)]
pub enum Container<E> {
    Id(String),
    Element(E),
}

impl<E> From<&str> for Container<E> {
    fn from(id: &str) -> Self {
        Container::Id(id.to_string())
    }
}

impl<E> From<String> for Container<E> {
    fn from(id: String) -> Self {
        Container::Id(id)
    }
}

/// The stacked panes inside the map pane, bottom to top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneKind {
    Map,
    Tile,
    Overlay,
    Shadow,
    Marker,
    Tooltip,
    Popup,
}

impl PaneKind {
    /// Panes nested in the map pane, in creation order
    pub const LAYERED: [PaneKind; 6] = [
        PaneKind::Tile,
        PaneKind::Overlay,
        PaneKind::Shadow,
        PaneKind::Marker,
        PaneKind::Tooltip,
        PaneKind::Popup,
    ];

    pub fn class_name(&self) -> &'static str {
        match self {
            PaneKind::Map => MAP_PANE_CLASS,
            PaneKind::Tile => TILE_PANE_CLASS,
            PaneKind::Overlay => OVERLAY_PANE_CLASS,
            PaneKind::Shadow => SHADOW_PANE_CLASS,
            PaneKind::Marker => MARKER_PANE_CLASS,
            PaneKind::Tooltip => TOOLTIP_PANE_CLASS,
            PaneKind::Popup => POPUP_PANE_CLASS,
        }
    }
}

struct Panes<E> {
    map: E,
    tile: E,
    overlay: E,
    shadow: E,
    marker: E,
    tooltip: E,
    popup: E,
}

impl<E: Clone> Panes<E> {
    fn create<D: Dom<Element = E>>(dom: &D, container: &E) -> Result<Self> {
        let map = create_pane(dom, PaneKind::Map, container)?;
        Ok(Self {
            tile: create_pane(dom, PaneKind::Tile, &map)?,
            overlay: create_pane(dom, PaneKind::Overlay, &map)?,
            shadow: create_pane(dom, PaneKind::Shadow, &map)?,
            marker: create_pane(dom, PaneKind::Marker, &map)?,
            tooltip: create_pane(dom, PaneKind::Tooltip, &map)?,
            popup: create_pane(dom, PaneKind::Popup, &map)?,
            map,
        })
    }

    fn get(&self, kind: PaneKind) -> &E {
        match kind {
            PaneKind::Map => &self.map,
            PaneKind::Tile => &self.tile,
            PaneKind::Overlay => &self.overlay,
            PaneKind::Shadow => &self.shadow,
            PaneKind::Marker => &self.marker,
            PaneKind::Tooltip => &self.tooltip,
            PaneKind::Popup => &self.popup,
        }
    }
}

fn create_pane<D: Dom>(dom: &D, kind: PaneKind, parent: &D::Element) -> Result<D::Element> {
    let pane = dom.create_element("div")?;
    dom.set_class_name(&pane, kind.class_name());
    dom.set_style(&pane, "position", "absolute")?;
    // Tiles never intercept clicks meant for the container
    if kind == PaneKind::Tile {
        dom.set_style(&pane, "pointer-events", "none")?;
    }
    dom.append_child(parent, &pane)?;
    Ok(pane)
}

struct MapState<D: Dom> {
    layers: Vec<Box<dyn Layer<D>>>,
    markers: Vec<Marker<D>>,
    current_popup: Option<D::Element>,
    bounds: Option<LatLngBounds>,
    click_handler: Option<MapClickHandler>,
}

struct MapInner<D: Dom> {
    dom: D,
    container: D::Element,
    panes: Panes<D::Element>,
    options: MapOptions,
    state: RefCell<MapState<D>>,
}

/// A map mounted in a container element.
///
/// `Map` is a handle: clones refer to the same map. Listeners registered in
/// the document only hold weak references to it.
pub struct Map<D: Dom> {
    inner: Rc<MapInner<D>>,
}

/// Non-owning map reference held by DOM listeners and markers
pub(crate) struct WeakMap<D: Dom> {
    inner: Weak<MapInner<D>>,
}

impl<D: Dom> WeakMap<D> {
    pub(crate) fn upgrade(&self) -> Option<Map<D>> {
        self.inner.upgrade().map(|inner| Map { inner })
    }
}

impl<D: Dom> Clone for WeakMap<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<D: Dom> Clone for Map<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<D: Dom> fmt::Debug for Map<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Map")
            .field("container", &self.inner.container)
            .field("layers", &state.layers.len())
            .field("markers", &state.markers.len())
            .field("popup_open", &state.current_popup.is_some())
            .field("bounds", &state.bounds)
            .finish()
    }
}

impl<D: Dom> Map<D> {
    /// Mounts a map: styles the container, builds the panes and starts
    /// listening for clicks on the container.
    pub fn new(dom: D, container: Container<D::Element>, options: MapOptions) -> Result<Self> {
        let container = match container {
            Container::Id(id) => dom
                .element_by_id(&id)
                .ok_or(MapError::ContainerNotFound(id))?,
            Container::Element(element) => element,
        };

        dom.set_style(&container, "position", "relative")?;
        dom.set_style(&container, "overflow", "hidden")?;
        dom.add_class(&container, CONTAINER_CLASS)?;

        let panes = Panes::create(&dom, &container)?;

        let map = Self {
            inner: Rc::new(MapInner {
                dom,
                container,
                panes,
                options,
                state: RefCell::new(MapState {
                    layers: Vec::new(),
                    markers: Vec::new(),
                    current_popup: None,
                    bounds: None,
                    click_handler: None,
                }),
            }),
        };
        map.setup_events()?;

        log::debug!("map mounted in {:?}", map.inner.container);
        Ok(map)
    }

    fn setup_events(&self) -> Result<()> {
        let weak = self.downgrade();
        self.inner.dom.add_click_listener(
            &self.inner.container,
            Box::new(move |event: &mut ClickEvent| {
                if let Some(map) = weak.upgrade() {
                    map.handle_click(event);
                }
            }),
        )
    }

    /// Converts a click into a position, then runs the `on_click` option
    /// followed by the handler registered with [`Map::on`].
    fn handle_click(&self, event: &ClickEvent) {
        // The rect is read on every click, so resizes need no bookkeeping
        let rect = self.inner.dom.bounding_rect(&self.inner.container);
        let offset = rect.offset_of(&event.client_point());
        // Dropped on purpose: a container without area has no meaningful
        // position, and handlers would only ever see NaN
        let Some(latlng) = projection::container_point_to_lat_lng(&offset, &rect.size()) else {
            log::debug!("ignoring click on a map container without area");
            return;
        };

        let payload = MapClickEvent { latlng };
        let handlers: Vec<MapClickHandler> = [
            self.inner.options.on_click.clone(),
            self.inner.state.borrow().click_handler.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        for handler in handlers {
            match handler.try_borrow_mut() {
                Ok(mut handler) => (&mut *handler)(&payload),
                Err(_) => log::warn!("map click handler re-entered itself; skipping"),
            }
        }
    }

    pub(crate) fn downgrade(&self) -> WeakMap<D> {
        WeakMap {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Registers a handler for `event`, replacing any previous handler for it.
    pub fn on<F>(&self, event: MapEventKind, handler: F) -> &Self
    where
        F: FnMut(&MapClickEvent) + 'static,
    {
        match event {
            MapEventKind::Click => {
                self.inner.state.borrow_mut().click_handler = Some(Rc::new(RefCell::new(handler)));
            }
        }
        self
    }

    /// Like [`Map::on`] with an event name; names other than `click` are
    /// ignored.
    pub fn on_named<F>(&self, event: &str, handler: F) -> &Self
    where
        F: FnMut(&MapClickEvent) + 'static,
    {
        match event.parse::<MapEventKind>() {
            Ok(kind) => self.on(kind, handler),
            Err(reason) => {
                log::debug!("{}; handler ignored", reason);
                self
            }
        }
    }

    /// Remembers `bounds`. The view itself is fixed, so nothing moves.
    pub fn fit_bounds(&self, bounds: impl Into<LatLngBounds>) -> &Self {
        self.inner.state.borrow_mut().bounds = Some(bounds.into());
        self
    }

    /// Records the layer, then adds it to this map.
    pub fn add_layer<L>(&self, layer: L) -> Result<&Self>
    where
        L: Layer<D> + Clone + 'static,
    {
        self.inner
            .state
            .borrow_mut()
            .layers
            .push(Box::new(layer.clone()));
        layer.add_to_map(self)?;
        log::debug!("added {} layer", layer.layer_type());
        Ok(self)
    }

    /// Removes the open popup, if any.
    pub fn close_popup(&self) {
        let popup = self.inner.state.borrow_mut().current_popup.take();
        if let Some(popup) = popup {
            self.inner.dom.remove(&popup);
            log::debug!("popup closed");
        }
    }

    /// Opens a popup with `content` at `lat_lng`, closing the previous one.
    pub fn open_popup(&self, content: &str, lat_lng: impl Into<LatLng>) -> Result<()> {
        let lat_lng = lat_lng.into();
        self.close_popup();

        let popup = build_popup_element(self, content, &lat_lng)?;
        self.inner.dom.append_child(&self.inner.panes.popup, &popup)?;
        self.inner.state.borrow_mut().current_popup = Some(popup);

        log::debug!("popup opened at ({}, {})", lat_lng.lat, lat_lng.lng);
        Ok(())
    }

    /// Detaches a popup element built by this map; clears the open popup if
    /// it is that element.
    pub(crate) fn remove_popup(&self, popup: &D::Element) {
        self.inner.dom.remove(popup);
        let mut state = self.inner.state.borrow_mut();
        if state.current_popup.as_ref() == Some(popup) {
            state.current_popup = None;
        }
    }

    pub(crate) fn register_marker(&self, marker: Marker<D>) {
        self.inner.state.borrow_mut().markers.push(marker);
    }

    pub fn dom(&self) -> &D {
        &self.inner.dom
    }

    pub fn container(&self) -> D::Element {
        self.inner.container.clone()
    }

    pub fn pane(&self, kind: PaneKind) -> D::Element {
        self.inner.panes.get(kind).clone()
    }

    pub fn options(&self) -> &MapOptions {
        &self.inner.options
    }

    /// Bounds last passed to [`Map::fit_bounds`]
    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.inner.state.borrow().bounds.clone()
    }

    /// Number of layers added through [`Map::add_layer`]
    pub fn layer_count(&self) -> usize {
        self.inner.state.borrow().layers.len()
    }

    /// Markers added to this map, in insertion order
    pub fn markers(&self) -> Vec<Marker<D>> {
        self.inner.state.borrow().markers.clone()
    }

    pub fn current_popup(&self) -> Option<D::Element> {
        self.inner.state.borrow().current_popup.clone()
    }

    pub fn has_open_popup(&self) -> bool {
        self.inner.state.borrow().current_popup.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use std::cell::Cell;

    fn setup() -> (MemoryDom, Map<MemoryDom>) {
        let dom = MemoryDom::new();
        dom.create_container("map", 800.0, 600.0);
        let map = Map::new(dom.clone(), "map".into(), MapOptions::default()).unwrap();
        (dom, map)
    }

    #[test]
    fn test_container_styling() {
        let (dom, map) = setup();
        let container = map.container();

        assert_eq!(dom.style(container, "position").as_deref(), Some("relative"));
        assert_eq!(dom.style(container, "overflow").as_deref(), Some("hidden"));
        assert!(dom.has_class(container, "leaflet-container"));
    }

    #[test]
    fn test_existing_classes_are_kept() {
        let dom = MemoryDom::new();
        let container = dom.create_container("map", 100.0, 100.0);
        dom.set_class_name(&container, "page-map");

        Map::new(dom.clone(), Container::Element(container), MapOptions::default()).unwrap();
        assert_eq!(dom.class_name(container), "page-map leaflet-container");
    }

    #[test]
    fn test_pane_layout() {
        let (dom, map) = setup();
        let map_pane = map.pane(PaneKind::Map);

        assert_eq!(dom.children(map.container()), vec![map_pane]);

        let classes: Vec<String> = dom
            .children(map_pane)
            .into_iter()
            .map(|pane| dom.class_name(pane))
            .collect();
        let expected: Vec<String> = PaneKind::LAYERED
            .iter()
            .map(|kind| kind.class_name().to_string())
            .collect();
        assert_eq!(classes, expected);

        for kind in PaneKind::LAYERED {
            let pane = map.pane(kind);
            assert_eq!(dom.style(pane, "position").as_deref(), Some("absolute"));
            let pointer_events = dom.style(pane, "pointer-events");
            if kind == PaneKind::Tile {
                assert_eq!(pointer_events.as_deref(), Some("none"));
            } else {
                assert_eq!(pointer_events, None);
            }
        }
    }

    #[test]
    fn test_missing_container() {
        let dom = MemoryDom::new();
        let err = Map::new(dom, "nowhere".into(), MapOptions::default()).unwrap_err();
        assert!(matches!(err, MapError::ContainerNotFound(id) if id == "nowhere"));
    }

    #[test]
    fn test_fit_bounds_only_stores() {
        let (_, map) = setup();
        assert!(map.bounds().is_none());

        map.fit_bounds([[-10.0, -20.0], [10.0, 20.0]]);
        assert_eq!(
            map.bounds(),
            Some(LatLngBounds::from_coords(-10.0, -20.0, 10.0, 20.0))
        );
    }

    #[test]
    fn test_click_handlers_receive_position() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let from_option = seen.clone();

        let dom = MemoryDom::new();
        let container = dom.create_container("map", 800.0, 600.0);
        let options = MapOptions::default()
            .on_click(move |e| from_option.borrow_mut().push(("option", e.latlng)));
        let map = Map::new(dom.clone(), "map".into(), options).unwrap();

        let from_on = seen.clone();
        map.on(MapEventKind::Click, move |e| from_on.borrow_mut().push(("on", e.latlng)));

        // top-left quarter point
        dom.dispatch_click(container, 200.0, 150.0);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "option");
        assert_eq!(seen[1].0, "on");
        assert_eq!(seen[0].1, LatLng::new(45.0, -90.0));
        assert_eq!(seen[1].1, LatLng::new(45.0, -90.0));
    }

    #[test]
    fn test_on_replaces_handler_and_ignores_unknown_events() {
        let (dom, map) = setup();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let f = first.clone();
        map.on(MapEventKind::Click, move |_| f.set(f.get() + 1));
        let s = second.clone();
        map.on_named("click", move |_| s.set(s.get() + 1));
        map.on_named("zoomend", |_| panic!("never registered"));

        dom.click_center(map.container());
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_click_on_empty_container_is_ignored() {
        let dom = MemoryDom::new();
        let container = dom.create_container("map", 0.0, 0.0);
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let options = MapOptions::default().on_click(move |_| h.set(h.get() + 1));
        Map::new(dom.clone(), "map".into(), options).unwrap();

        dom.dispatch_click(container, 0.0, 0.0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_open_and_close_popup() {
        let (dom, map) = setup();
        let pane = map.pane(PaneKind::Popup);

        map.open_popup("first", [0.0, 0.0]).unwrap();
        map.open_popup("second", [10.0, 10.0]).unwrap();
        assert_eq!(dom.children(pane).len(), 1);
        assert!(map.has_open_popup());

        map.close_popup();
        assert!(dom.children(pane).is_empty());
        assert!(!map.has_open_popup());

        // closing twice is harmless
        map.close_popup();
    }

    #[test]
    fn test_closed_popups_are_released() {
        let (dom, map) = setup();
        map.open_popup("warm-up", [0.0, 0.0]).unwrap();
        map.close_popup();
        let nodes = dom.node_count();
        let listeners = dom.listener_count();

        for i in 0..200 {
            map.open_popup(&format!("popup {}", i), [i as f64 % 90.0, 0.0])
                .unwrap();
            if i % 2 == 0 {
                let popup = map.current_popup().unwrap();
                let close = dom.elements_by_class(popup, "leaflet-popup-close-button")[0];
                dom.dispatch_click(close, 0.0, 0.0);
            }
        }
        map.close_popup();

        assert_eq!(dom.node_count(), nodes);
        assert_eq!(dom.listener_count(), listeners);
        assert!(dom.children(map.pane(PaneKind::Popup)).is_empty());
    }
}
