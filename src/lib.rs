//! # panemap
//!
//! A small Leaflet-style map widget over a document tree.
//!
//! A [`Map`] takes over a container element and stacks panes inside it for
//! tiles, markers and popups. Image overlays are stretched over the tile
//! pane, markers and popups are placed with a linear percentage mapping of
//! latitude/longitude. The document is reached through the [`dom::Dom`]
//! trait, so the same code drives the in-memory tree used by tests and the
//! browser DOM (feature `wasm`).
//!
//! ```
//! use panemap::{dom::MemoryDom, prelude::*};
//!
//! let dom = MemoryDom::new();
//! let container = dom.create_container("map", 800.0, 600.0);
//! let map = panemap::map(&dom, "map", MapOptions::default()).unwrap();
//!
//! panemap::marker([51.5, -0.09], MarkerOptions::default())
//!     .bind_popup("<b>Hello</b>")
//!     .add_to(&map)
//!     .unwrap();
//!
//! assert_eq!(dom.elements_by_class(container, "leaflet-marker-icon").len(), 1);
//! ```

pub mod core;
pub mod dom;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod ui;
pub use crate::core::constants;

#[cfg(feature = "wasm")]
pub mod bindings;

// Re-export public API
pub use crate::core::{
    bounds::Bounds,
    config::{ImageOverlayOptions, MapOptions, MarkerOptions, MarkerStyle},
    geo::{LatLng, LatLngBounds, Point},
    map::{Container, Map, PaneKind},
};

pub use layers::{
    base::{Layer, LayerType},
    image::ImageOverlay,
    marker::Marker,
};

pub use input::events::{ClickEvent, MapClickEvent, MapEventKind};

pub use ui::popup::Popup;

use dom::Dom;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Map container not found: {0}")]
    ContainerNotFound(String),

    #[error("DOM error: {0}")]
    Dom(String),

    #[error("Popup has no position; call set_lat_lng before opening it")]
    MissingLatLng,

    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Creates a map inside the container with the given id or element.
pub fn map<D: Dom>(
    dom: &D,
    container: impl Into<Container<D::Element>>,
    options: MapOptions,
) -> Result<Map<D>> {
    Map::new(dom.clone(), container.into(), options)
}

/// Creates an image overlay. The bounds are kept but the image always fills
/// the tile pane.
pub fn image_overlay<D: Dom>(
    url: impl Into<String>,
    bounds: impl Into<LatLngBounds>,
    options: ImageOverlayOptions,
) -> ImageOverlay<D> {
    ImageOverlay::new(url, bounds, options)
}

/// Creates a marker at `latlng`.
pub fn marker<D: Dom>(latlng: impl Into<LatLng>, options: MarkerOptions) -> Marker<D> {
    Marker::new(latlng, options)
}

/// Creates an empty popup with no position.
pub fn popup() -> Popup {
    Popup::new()
}
