use crate::{core::map::Map, dom::Dom, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Image,
    Marker,
    /// Defined outside the crate, e.g. a script object
    Custom,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Image => write!(f, "image"),
            LayerType::Marker => write!(f, "marker"),
            LayerType::Custom => write!(f, "custom"),
        }
    }
}

/// Something that can put itself on a map.
///
/// Layers are handles; `Map::add_layer` keeps a clone and then calls
/// [`Layer::add_to_map`] on it.
pub trait Layer<D: Dom> {
    fn layer_type(&self) -> LayerType;

    /// Creates the layer's element and attaches it to the right pane of `map`.
    fn add_to_map(&self, map: &Map<D>) -> Result<()>;

    /// The element created by the most recent add, if any
    fn element(&self) -> Option<D::Element>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_type_display() {
        assert_eq!(LayerType::Image.to_string(), "image");
        assert_eq!(LayerType::Marker.to_string(), "marker");
        assert_eq!(LayerType::Custom.to_string(), "custom");
    }
}
