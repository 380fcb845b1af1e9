use crate::{
    core::{
        constants::{
            OVERLAY_Z_INDEX, POPUP_CLASS, POPUP_CLOSE_BUTTON_CLASS, POPUP_CLOSE_HREF,
            POPUP_CLOSE_TEXT, POPUP_CONTENT_CLASS, POPUP_CONTENT_WRAPPER_CLASS,
        },
        geo::LatLng,
        map::Map,
        projection::{lat_lng_to_percent, percent_css},
    },
    dom::Dom,
    input::events::ClickEvent,
    MapError, Result,
};

/// A content box that can be opened at any position on a map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Popup {
    content: String,
    lat_lng: Option<LatLng>,
}

impl Popup {
    /// Creates an empty popup with no position
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_lat_lng(mut self, lat_lng: impl Into<LatLng>) -> Self {
        self.lat_lng = Some(lat_lng.into());
        self
    }

    /// Sets the popup's HTML content.
    pub fn set_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn lat_lng(&self) -> Option<LatLng> {
        self.lat_lng
    }

    /// Opens the popup on `map`, replacing whatever popup was open there.
    pub fn open_on<D: Dom>(self, map: &Map<D>) -> Result<Self> {
        let lat_lng = self.lat_lng.ok_or(MapError::MissingLatLng)?;
        map.open_popup(&self.content, lat_lng)?;
        Ok(self)
    }
}

/// Builds the detached popup subtree:
///
/// ```text
/// div.leaflet-popup
///   div.leaflet-popup-content-wrapper
///     a.leaflet-popup-close-button
///     div.leaflet-popup-content
/// ```
///
/// The box's top-left corner sits at the anchor, raised by the map's popup
/// offset. The close button removes this popup from `map`.
pub(crate) fn build_popup_element<D: Dom>(
    map: &Map<D>,
    content: &str,
    lat_lng: &LatLng,
) -> Result<D::Element> {
    let dom = map.dom();

    let popup = dom.create_element("div")?;
    dom.set_class_name(&popup, POPUP_CLASS);
    dom.set_style(&popup, "position", "absolute")?;
    dom.set_style(&popup, "z-index", &OVERLAY_Z_INDEX.to_string())?;

    let wrapper = dom.create_element("div")?;
    dom.set_class_name(&wrapper, POPUP_CONTENT_WRAPPER_CLASS);

    let body = dom.create_element("div")?;
    dom.set_class_name(&body, POPUP_CONTENT_CLASS);
    dom.set_inner_html(&body, content);

    let close = dom.create_element("a")?;
    dom.set_class_name(&close, POPUP_CLOSE_BUTTON_CLASS);
    dom.set_inner_html(&close, POPUP_CLOSE_TEXT);
    dom.set_attribute(&close, "href", POPUP_CLOSE_HREF)?;

    let weak = map.downgrade();
    let target = popup.clone();
    dom.add_click_listener(
        &close,
        Box::new(move |event: &mut ClickEvent| {
            event.prevent_default();
            if let Some(map) = weak.upgrade() {
                map.remove_popup(&target);
            }
        }),
    )?;

    dom.append_child(&wrapper, &close)?;
    dom.append_child(&wrapper, &body)?;
    dom.append_child(&popup, &wrapper)?;

    let position = lat_lng_to_percent(lat_lng);
    dom.set_style(&popup, "left", &percent_css(position.x))?;
    dom.set_style(
        &popup,
        "top",
        &percent_css(position.y - map.options().popup_offset),
    )?;

    Ok(popup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{config::MapOptions, map::PaneKind},
        dom::MemoryDom,
    };

    fn setup() -> (MemoryDom, Map<MemoryDom>) {
        let dom = MemoryDom::new();
        dom.create_container("map", 800.0, 600.0);
        let map = crate::map(&dom, "map", MapOptions::default()).unwrap();
        (dom, map)
    }

    #[test]
    fn test_builder() {
        let popup = Popup::new().set_lat_lng([1.0, 2.0]).set_content("hello");
        assert_eq!(popup.content(), "hello");
        assert_eq!(popup.lat_lng(), Some(LatLng::new(1.0, 2.0)));
        assert_eq!(Popup::new().content(), "");
        assert_eq!(Popup::new().lat_lng(), None);
    }

    #[test]
    fn test_popup_structure() {
        let (dom, map) = setup();
        Popup::new()
            .set_lat_lng([0.0, 0.0])
            .set_content("<p>Hi</p>")
            .open_on(&map)
            .unwrap();

        let popup = map.current_popup().unwrap();
        assert_eq!(dom.parent(popup), Some(map.pane(PaneKind::Popup)));
        assert!(dom.has_class(popup, "leaflet-popup"));
        assert_eq!(dom.style(popup, "left").as_deref(), Some("50%"));
        assert_eq!(dom.style(popup, "top").as_deref(), Some("40%"));
        assert_eq!(dom.style(popup, "z-index").as_deref(), Some("1000"));

        let wrapper = dom.children(popup);
        assert_eq!(wrapper.len(), 1);
        assert!(dom.has_class(wrapper[0], "leaflet-popup-content-wrapper"));

        let parts = dom.children(wrapper[0]);
        assert_eq!(parts.len(), 2);
        assert!(dom.has_class(parts[0], "leaflet-popup-close-button"));
        assert_eq!(dom.tag_name(parts[0]).as_deref(), Some("a"));
        assert_eq!(dom.inner_html(parts[0]), "×");
        assert_eq!(dom.attribute(parts[0], "href").as_deref(), Some("#close"));
        assert!(dom.has_class(parts[1], "leaflet-popup-content"));
        assert_eq!(dom.inner_html(parts[1]), "<p>Hi</p>");
    }

    #[test]
    fn test_custom_offset() {
        let dom = MemoryDom::new();
        dom.create_container("map", 800.0, 600.0);
        let map = crate::map(&dom, "map", MapOptions::default().with_popup_offset(0.0)).unwrap();

        map.open_popup("x", [45.0, 0.0]).unwrap();
        let popup = map.current_popup().unwrap();
        assert_eq!(dom.style(popup, "top").as_deref(), Some("25%"));
    }

    #[test]
    fn test_open_without_position_fails() {
        let (dom, map) = setup();
        let err = Popup::new().set_content("lost").open_on(&map).unwrap_err();
        assert!(matches!(err, MapError::MissingLatLng));
        assert!(dom.children(map.pane(PaneKind::Popup)).is_empty());
    }

    #[test]
    fn test_close_button_removes_popup() {
        let (dom, map) = setup();
        Popup::new()
            .set_lat_lng([0.0, 0.0])
            .set_content("bye")
            .open_on(&map)
            .unwrap();

        let popup = map.current_popup().unwrap();
        let close = dom.elements_by_class(popup, "leaflet-popup-close-button")[0];
        let event = dom.dispatch_click(close, 0.0, 0.0);

        assert!(event.default_prevented());
        assert!(!map.has_open_popup());
        assert!(dom.children(map.pane(PaneKind::Popup)).is_empty());
    }

    #[test]
    fn test_close_click_still_reaches_map() {
        let (dom, map) = setup();
        let clicks = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = clicks.clone();
        map.on(crate::MapEventKind::Click, move |_| counter.set(counter.get() + 1));

        map.open_popup("bye", [0.0, 0.0]).unwrap();
        let popup = map.current_popup().unwrap();
        let close = dom.elements_by_class(popup, "leaflet-popup-close-button")[0];
        dom.dispatch_click(close, 400.0, 300.0);

        assert!(!map.has_open_popup());
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_stale_close_button_keeps_newer_popup() {
        let (dom, map) = setup();
        map.open_popup("old", [0.0, 0.0]).unwrap();
        let old = map.current_popup().unwrap();
        let old_close = dom.elements_by_class(old, "leaflet-popup-close-button")[0];

        map.open_popup("new", [5.0, 5.0]).unwrap();
        dom.dispatch_click(old_close, 0.0, 0.0);

        assert_eq!(dom.tag_name(old_close), None);
        assert!(map.has_open_popup());
        assert_eq!(dom.children(map.pane(PaneKind::Popup)).len(), 1);
    }
}
