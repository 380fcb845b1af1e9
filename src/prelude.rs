//! Prelude module for common panemap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use panemap::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{ImageOverlayOptions, MapOptions, MarkerOptions, MarkerStyle},
    geo::{LatLng, LatLngBounds, Point},
    map::{Container, Map, PaneKind},
};

pub use crate::dom::{Dom, MemoryDom, NodeId};

#[cfg(feature = "wasm")]
pub use crate::dom::WebDom;

pub use crate::input::events::{ClickEvent, MapClickEvent, MapEventKind};

pub use crate::layers::{
    base::{Layer, LayerType},
    image::ImageOverlay,
    marker::Marker,
};

pub use crate::ui::popup::Popup;

pub use crate::{image_overlay, map, marker, popup};

pub use crate::{Error as MapError, Result};
