//! Option structs for the map, markers and image overlays.
//!
//! Every struct deserializes from JSON with all fields optional, so a page can
//! ship its configuration as data. Callbacks are not serializable and are set
//! through the builder methods instead.

use crate::{
    core::constants::{
        DEFAULT_POPUP_OFFSET, MARKER_BACKGROUND, MARKER_BORDER, MARKER_BORDER_RADIUS,
        MARKER_BOX_SHADOW, MARKER_ICON_ANCHOR, MARKER_ICON_SIZE, MARKER_TRANSFORM,
        OVERLAY_Z_INDEX,
    },
    input::events::{MapClickEvent, MapClickHandler},
    Result,
};
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, fmt, rc::Rc};

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    /// Percentage points between a popup's anchor and its top edge
    #[serde(alias = "popupOffset")]
    pub popup_offset: f64,
    /// Called with the clicked position on every click that reaches the
    /// container
    #[serde(skip)]
    pub on_click: Option<MapClickHandler>,
}

impl MapOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&MapClickEvent) + 'static,
    {
        self.on_click = Some(Rc::new(RefCell::new(handler)));
        self
    }

    pub fn with_popup_offset(mut self, offset: f64) -> Self {
        self.popup_offset = offset;
        self
    }
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            popup_offset: DEFAULT_POPUP_OFFSET,
            on_click: None,
        }
    }
}

impl fmt::Debug for MapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapOptions")
            .field("popup_offset", &self.popup_offset)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

/// Inline styling of a marker icon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub size: u32,
    /// Hot-spot inside the icon, applied as negative left/top margins
    pub anchor: (u32, u32),
    #[serde(alias = "backgroundColor")]
    pub background_color: String,
    pub border: String,
    #[serde(alias = "borderRadius")]
    pub border_radius: String,
    pub transform: String,
    #[serde(alias = "boxShadow")]
    pub box_shadow: String,
    pub cursor: String,
    #[serde(alias = "zIndex")]
    pub z_index: i32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            size: MARKER_ICON_SIZE,
            anchor: MARKER_ICON_ANCHOR,
            background_color: MARKER_BACKGROUND.to_string(),
            border: MARKER_BORDER.to_string(),
            border_radius: MARKER_BORDER_RADIUS.to_string(),
            transform: MARKER_TRANSFORM.to_string(),
            box_shadow: MARKER_BOX_SHADOW.to_string(),
            cursor: "pointer".to_string(),
            z_index: OVERLAY_Z_INDEX,
        }
    }
}

impl MarkerStyle {
    /// `(property, value)` pairs in the order they are applied
    pub fn declarations(&self) -> Vec<(&'static str, String)> {
        vec![
            ("position", "absolute".to_string()),
            ("width", format!("{}px", self.size)),
            ("height", format!("{}px", self.size)),
            ("margin-left", format!("-{}px", self.anchor.0)),
            ("margin-top", format!("-{}px", self.anchor.1)),
            ("background-image", "none".to_string()),
            ("background-color", self.background_color.clone()),
            ("border", self.border.clone()),
            ("border-radius", self.border_radius.clone()),
            ("transform", self.transform.clone()),
            ("box-shadow", self.box_shadow.clone()),
            ("cursor", self.cursor.clone()),
            ("z-index", self.z_index.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerOptions {
    pub style: MarkerStyle,
}

impl MarkerOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_style(mut self, style: MarkerStyle) -> Self {
        self.style = style;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOverlayOptions {
    /// CSS `object-fit` of the stretched image
    #[serde(alias = "objectFit")]
    pub object_fit: String,
    pub opacity: Option<f32>,
}

impl ImageOverlayOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity.clamp(0.0, 1.0));
        self
    }
}

impl Default for ImageOverlayOptions {
    fn default() -> Self {
        Self {
            object_fit: "cover".to_string(),
            opacity: None,
        }
    }
}
