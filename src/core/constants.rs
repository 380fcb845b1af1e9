//! Class names and default styling shared by the panes, markers and popups.
//! The class names match the stylesheet conventions of Leaflet so existing
//! CSS keeps working.

/// Class appended to the container element.
pub const CONTAINER_CLASS: &str = "leaflet-container";

pub const MAP_PANE_CLASS: &str = "leaflet-map-pane";
pub const TILE_PANE_CLASS: &str = "leaflet-tile-pane";
pub const OVERLAY_PANE_CLASS: &str = "leaflet-overlay-pane";
pub const SHADOW_PANE_CLASS: &str = "leaflet-shadow-pane";
pub const MARKER_PANE_CLASS: &str = "leaflet-marker-pane";
pub const TOOLTIP_PANE_CLASS: &str = "leaflet-tooltip-pane";
pub const POPUP_PANE_CLASS: &str = "leaflet-popup-pane";

pub const MARKER_ICON_CLASS: &str = "leaflet-marker-icon";

pub const POPUP_CLASS: &str = "leaflet-popup";
pub const POPUP_CONTENT_WRAPPER_CLASS: &str = "leaflet-popup-content-wrapper";
pub const POPUP_CONTENT_CLASS: &str = "leaflet-popup-content";
pub const POPUP_CLOSE_BUTTON_CLASS: &str = "leaflet-popup-close-button";

/// Inner HTML of the popup close button.
pub const POPUP_CLOSE_TEXT: &str = "×";
pub const POPUP_CLOSE_HREF: &str = "#close";

/// Popups sit this many percentage points above their anchor.
pub const DEFAULT_POPUP_OFFSET: f64 = 10.0;

/// z-index shared by marker icons and popups.
pub const OVERLAY_Z_INDEX: i32 = 1000;

/// Marker icon edge length in pixels.
pub const MARKER_ICON_SIZE: u32 = 25;

/// Hot-spot of the marker icon, as negative margins in pixels.
pub const MARKER_ICON_ANCHOR: (u32, u32) = (12, 25);

pub const MARKER_BACKGROUND: &str = "#ff6b6b";
pub const MARKER_BORDER: &str = "3px solid #fff";
pub const MARKER_BORDER_RADIUS: &str = "50% 50% 50% 0";
pub const MARKER_TRANSFORM: &str = "rotate(-45deg)";
pub const MARKER_BOX_SHADOW: &str = "0 2px 5px rgba(0,0,0,0.3)";
