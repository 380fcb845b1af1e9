use crate::{
    core::{
        config::ImageOverlayOptions,
        geo::LatLngBounds,
        map::{Map, PaneKind},
    },
    dom::Dom,
    layers::base::{Layer, LayerType},
    Result,
};
use std::{cell::RefCell, rc::Rc};

struct ImageOverlayState<D: Dom> {
    url: String,
    bounds: LatLngBounds,
    options: ImageOverlayOptions,
    element: Option<D::Element>,
}

/// An image stretched over the whole tile pane.
///
/// The bounds are kept for callers but do not affect placement.
pub struct ImageOverlay<D: Dom> {
    state: Rc<RefCell<ImageOverlayState<D>>>,
}

impl<D: Dom> Clone for ImageOverlay<D> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<D: Dom> ImageOverlay<D> {
    pub fn new(
        url: impl Into<String>,
        bounds: impl Into<LatLngBounds>,
        options: ImageOverlayOptions,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(ImageOverlayState {
                url: url.into(),
                bounds: bounds.into(),
                options,
                element: None,
            })),
        }
    }

    /// Adds the overlay to `map` and hands it back for chaining.
    pub fn add_to(self, map: &Map<D>) -> Result<Self> {
        self.add_to_map(map)?;
        Ok(self)
    }

    pub fn url(&self) -> String {
        self.state.borrow().url.clone()
    }

    pub fn bounds(&self) -> LatLngBounds {
        self.state.borrow().bounds.clone()
    }
}

impl<D: Dom> Layer<D> for ImageOverlay<D> {
    fn layer_type(&self) -> LayerType {
        LayerType::Image
    }

    fn add_to_map(&self, map: &Map<D>) -> Result<()> {
        let dom = map.dom();
        let (url, options) = {
            let state = self.state.borrow();
            (state.url.clone(), state.options.clone())
        };

        let img = dom.create_element("img")?;
        dom.set_attribute(&img, "src", &url)?;
        dom.set_styles(
            &img,
            &[
                ("position", "absolute"),
                ("left", "0"),
                ("top", "0"),
                ("width", "100%"),
                ("height", "100%"),
                ("object-fit", options.object_fit.as_str()),
            ],
        )?;
        if let Some(opacity) = options.opacity {
            dom.set_style(&img, "opacity", &opacity.to_string())?;
        }

        dom.append_child(&map.pane(PaneKind::Tile), &img)?;
        self.state.borrow_mut().element = Some(img);

        log::debug!("image overlay {} added", url);
        Ok(())
    }

    fn element(&self) -> Option<D::Element> {
        self.state.borrow().element.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::config::MapOptions, dom::MemoryDom};

    fn setup() -> (MemoryDom, Map<MemoryDom>) {
        let dom = MemoryDom::new();
        dom.create_container("map", 640.0, 320.0);
        let map = crate::map(&dom, "map", MapOptions::default()).unwrap();
        (dom, map)
    }

    #[test]
    fn test_overlay_fills_tile_pane() {
        let (dom, map) = setup();
        let overlay = ImageOverlay::new(
            "world.png",
            [[-90.0, -180.0], [90.0, 180.0]],
            ImageOverlayOptions::default(),
        )
        .add_to(&map)
        .unwrap();

        let img = overlay.element().unwrap();
        assert_eq!(dom.tag_name(img).as_deref(), Some("img"));
        assert_eq!(dom.parent(img), Some(map.pane(PaneKind::Tile)));
        assert_eq!(dom.attribute(img, "src").as_deref(), Some("world.png"));
        assert_eq!(dom.style(img, "width").as_deref(), Some("100%"));
        assert_eq!(dom.style(img, "height").as_deref(), Some("100%"));
        assert_eq!(dom.style(img, "left").as_deref(), Some("0"));
        assert_eq!(dom.style(img, "object-fit").as_deref(), Some("cover"));
        assert_eq!(dom.style(img, "opacity"), None);
    }

    #[test]
    fn test_bounds_do_not_affect_placement() {
        let (dom, map) = setup();
        let overlay = ImageOverlay::new(
            "corner.png",
            [[10.0, 10.0], [20.0, 20.0]],
            ImageOverlayOptions::default().with_opacity(0.5),
        )
        .add_to(&map)
        .unwrap();

        let img = overlay.element().unwrap();
        assert_eq!(overlay.bounds(), LatLngBounds::from_coords(10.0, 10.0, 20.0, 20.0));
        assert_eq!(dom.style(img, "top").as_deref(), Some("0"));
        assert_eq!(dom.style(img, "opacity").as_deref(), Some("0.5"));
    }

    #[test]
    fn test_add_layer_records_overlay() {
        let (dom, map) = setup();
        let overlay: ImageOverlay<MemoryDom> =
            ImageOverlay::new("a.png", [[0.0, 0.0], [1.0, 1.0]], ImageOverlayOptions::default());

        map.add_layer(overlay.clone()).unwrap();
        assert_eq!(map.layer_count(), 1);
        assert_eq!(dom.children(map.pane(PaneKind::Tile)).len(), 1);
        assert!(overlay.element().is_some());
    }
}
