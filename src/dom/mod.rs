//! Access to the document tree the map draws into.
//!
//! The map never touches a concrete DOM. Everything it does goes through the
//! [`Dom`] trait: create an element, style it, hang it under a parent, listen
//! for clicks, remove it again. [`MemoryDom`] keeps the tree in process;
//! `WebDom` (feature `wasm`) forwards to the browser through `web-sys`.

pub mod memory;
#[cfg(feature = "wasm")]
pub mod web;

pub use memory::{MemoryDom, NodeId};
#[cfg(feature = "wasm")]
pub use web::WebDom;

use crate::{core::bounds::Bounds, input::events::ClickListener, Result};
use std::fmt;

/// A document the map can build its element tree in.
///
/// Implementations are cheap handles; cloning one yields another handle to
/// the same document. Style properties use CSS (kebab-case) names, and an
/// empty value removes the property.
pub trait Dom: Clone + 'static {
    type Element: Clone + PartialEq + fmt::Debug + 'static;

    /// Looks up an element attached to the document by its `id` attribute.
    fn element_by_id(&self, id: &str) -> Option<Self::Element>;

    /// Creates a detached element.
    fn create_element(&self, tag: &str) -> Result<Self::Element>;

    /// Appends `child` as the last child of `parent`, moving it if it is
    /// already attached somewhere.
    fn append_child(&self, parent: &Self::Element, child: &Self::Element) -> Result<()>;

    /// Takes `element` out of the document for good and releases the click
    /// listeners registered on it and its descendants. The element must not
    /// be appended again. Removing an already removed element is a no-op.
    fn remove(&self, element: &Self::Element);

    fn set_class_name(&self, element: &Self::Element, class_name: &str);

    /// Adds one class to the element's class list.
    fn add_class(&self, element: &Self::Element, class: &str) -> Result<()>;

    fn set_style(&self, element: &Self::Element, property: &str, value: &str) -> Result<()>;

    fn set_attribute(&self, element: &Self::Element, name: &str, value: &str) -> Result<()>;

    fn set_inner_html(&self, element: &Self::Element, html: &str);

    /// The element's bounding rectangle in client coordinates.
    fn bounding_rect(&self, element: &Self::Element) -> Bounds;

    fn add_click_listener(&self, element: &Self::Element, listener: ClickListener) -> Result<()>;

    /// Applies several style declarations in order.
    fn set_styles<V: AsRef<str>>(
        &self,
        element: &Self::Element,
        declarations: &[(&str, V)],
    ) -> Result<()> {
        for (property, value) in declarations {
            self.set_style(element, property, value.as_ref())?;
        }
        Ok(())
    }
}
