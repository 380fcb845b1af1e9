use crate::core::geo::{LatLng, Point};
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, fmt, rc::Rc, str::FromStr};

/// A pointer click as seen by a DOM click listener.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEvent {
    pub client_x: f64,
    pub client_y: f64,
    propagation_stopped: bool,
    default_prevented: bool,
}

impl ClickEvent {
    pub fn new(client_x: f64, client_y: f64) -> Self {
        Self {
            client_x,
            client_y,
            propagation_stopped: false,
            default_prevented: false,
        }
    }

    pub fn client_point(&self) -> Point {
        Point::new(self.client_x, self.client_y)
    }

    /// Keeps the event from reaching ancestor elements.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Suppresses the element's default action, e.g. following a link.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Listener attached to an element with `Dom::add_click_listener`.
pub type ClickListener = Box<dyn FnMut(&mut ClickEvent)>;

/// Payload handed to map click callbacks: `{"latlng": {"lat": .., "lng": ..}}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapClickEvent {
    pub latlng: LatLng,
}

/// Shared map click callback. Shared so the container listener can invoke it
/// without holding a borrow of the map state.
pub type MapClickHandler = Rc<RefCell<dyn FnMut(&MapClickEvent)>>;

/// Event names accepted by `Map::on`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventKind {
    Click,
}

impl fmt::Display for MapEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapEventKind::Click => write!(f, "click"),
        }
    }
}

impl FromStr for MapEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "click" => Ok(MapEventKind::Click),
            other => Err(format!("unsupported map event: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_event_flags() {
        let mut event = ClickEvent::new(10.0, 20.0);
        assert_eq!(event.client_point(), Point::new(10.0, 20.0));
        assert!(!event.propagation_stopped());
        assert!(!event.default_prevented());

        event.stop_propagation();
        event.prevent_default();
        assert!(event.propagation_stopped());
        assert!(event.default_prevented());
    }

    #[test]
    fn test_map_click_event_json_shape() {
        let event = MapClickEvent {
            latlng: LatLng::new(12.5, -30.0),
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json, serde_json::json!({"latlng": {"lat": 12.5, "lng": -30.0}}));
    }

    #[test]
    fn test_event_kind_parsing() {
        assert_eq!("click".parse::<MapEventKind>(), Ok(MapEventKind::Click));
        assert!("zoomend".parse::<MapEventKind>().is_err());
        assert_eq!(MapEventKind::Click.to_string(), "click");
    }
}
