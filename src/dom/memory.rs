use crate::{
    core::bounds::Bounds,
    dom::Dom,
    input::events::{ClickEvent, ClickListener},
    MapError, Result,
};
use fxhash::FxHashMap;
use std::{cell::RefCell, fmt, fmt::Write as _, rc::Rc};

/// Handle to an element of a [`MemoryDom`].
///
/// Slots are reused once an element is removed; the generation tells a stale
/// handle apart from the element now living in its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

type SharedListener = Rc<RefCell<ClickListener>>;

/// Elements that never have children or a closing tag
const VOID_ELEMENTS: &[&str] = &["img", "br", "hr", "input"];

struct Node {
    tag: String,
    class_name: String,
    style: Vec<(String, String)>,
    attributes: Vec<(String, String)>,
    inner_html: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: Bounds,
    listeners: Vec<SharedListener>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            class_name: String::new(),
            style: Vec::new(),
            attributes: Vec::new(),
            inner_html: String::new(),
            parent: None,
            children: Vec::new(),
            rect: Bounds::default(),
            listeners: Vec::new(),
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.class_name.split_whitespace().any(|c| c == class)
    }
}

/// Upserts `name` in an ordered property list; an empty value removes it.
fn upsert(entries: &mut Vec<(String, String)>, name: &str, value: &str) {
    if value.is_empty() {
        entries.retain(|(n, _)| n != name);
    } else if let Some(entry) = entries.iter_mut().find(|(n, _)| n == name) {
        entry.1 = value.to_string();
    } else {
        entries.push((name.to_string(), value.to_string()));
    }
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

struct Tree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    ids: FxHashMap<String, Vec<NodeId>>,
}

impl Tree {
    fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::new("body")),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            ids: FxHashMap::default(),
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        match self.slots.get_mut(id.index) {
            Some(slot) if slot.generation == id.generation => slot.node.as_mut(),
            _ => None,
        }
    }

    fn try_node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.node_mut(id)
            .ok_or_else(|| MapError::Dom(format!("unknown node {:?}", id)))
    }

    fn create(&mut self, tag: &str) -> NodeId {
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index) {
                slot.node = Some(Node::new(tag));
                return NodeId {
                    index,
                    generation: slot.generation,
                };
            }
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(Node::new(tag)),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Detaches `id` and frees it with its whole subtree, listeners included.
    /// Handles to freed elements go stale.
    fn release(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        self.detach(id);

        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let node = match self.slots.get_mut(id.index) {
                Some(slot) if slot.generation == id.generation => {
                    slot.generation = slot.generation.wrapping_add(1);
                    slot.node.take()
                }
                _ => None,
            };
            let Some(node) = node else {
                continue;
            };

            self.free.push(id.index);
            if let Some((_, key)) = node.attributes.iter().find(|(name, _)| name == "id") {
                if let Some(nodes) = self.ids.get_mut(key) {
                    nodes.retain(|n| *n != id);
                    if nodes.is_empty() {
                        self.ids.remove(key);
                    }
                }
            }
            pending.extend(node.children);
        }
    }

    fn live_nodes(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().filter_map(|slot| slot.node.as_ref())
    }

    fn detach(&mut self, id: NodeId) {
        let parent = self.node_mut(id).and_then(|node| node.parent.take());
        if let Some(parent) = parent {
            if let Some(parent) = self.node_mut(parent) {
                parent.children.retain(|child| *child != id);
            }
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.node(id).and_then(|node| node.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn is_connected(&self, id: NodeId) -> bool {
        self.is_ancestor_or_self(self.root, id)
    }

    fn collect_by_class(&self, id: NodeId, class: &str, out: &mut Vec<NodeId>) {
        if let Some(node) = self.node(id) {
            for child in &node.children {
                if self.node(*child).map_or(false, |c| c.has_class(class)) {
                    out.push(*child);
                }
                self.collect_by_class(*child, class, out);
            }
        }
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };

        let _ = write!(out, "<{}", node.tag);
        if !node.class_name.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape_attribute(&node.class_name));
        }
        for (name, value) in &node.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape_attribute(value));
        }
        if !node.style.is_empty() {
            let style = node
                .style
                .iter()
                .map(|(property, value)| format!("{}: {};", property, value))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(out, " style=\"{}\"", escape_attribute(&style));
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&node.tag.as_str()) {
            return;
        }

        out.push_str(&node.inner_html);
        for child in &node.children {
            self.write_html(*child, out);
        }
        let _ = write!(out, "</{}>", node.tag);
    }
}

/// An in-process document tree.
///
/// Supports everything the map needs plus the inspection helpers tests and
/// the headless demo rely on: class and style lookups, click dispatch with
/// bubbling, and HTML serialization. Layout is not computed; bounding rects
/// are whatever [`MemoryDom::set_bounding_rect`] assigned (zero otherwise).
#[derive(Clone)]
pub struct MemoryDom {
    tree: Rc<RefCell<Tree>>,
}

impl MemoryDom {
    /// Creates an empty document with a `body` root
    pub fn new() -> Self {
        Self {
            tree: Rc::new(RefCell::new(Tree::new())),
        }
    }

    pub fn body(&self) -> NodeId {
        self.tree.borrow().root
    }

    /// Creates a `div` with the given id and size, attached to the body at
    /// the client origin.
    pub fn create_container(&self, id: &str, width: f64, height: f64) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        let node = tree.create("div");
        let root = tree.root;
        if let Some(container) = tree.node_mut(node) {
            container.attributes.push(("id".to_string(), id.to_string()));
            container.rect = Bounds::from_origin_and_size(0.0, 0.0, width, height);
            container.parent = Some(root);
        }
        if let Some(body) = tree.node_mut(root) {
            body.children.push(node);
        }
        tree.ids.entry(id.to_string()).or_default().push(node);
        node
    }

    pub fn set_bounding_rect(&self, element: NodeId, rect: Bounds) {
        if let Some(node) = self.tree.borrow_mut().node_mut(element) {
            node.rect = rect;
        }
    }

    pub fn tag_name(&self, element: NodeId) -> Option<String> {
        self.tree.borrow().node(element).map(|n| n.tag.clone())
    }

    pub fn class_name(&self, element: NodeId) -> String {
        self.tree
            .borrow()
            .node(element)
            .map(|n| n.class_name.clone())
            .unwrap_or_default()
    }

    pub fn has_class(&self, element: NodeId, class: &str) -> bool {
        self.tree
            .borrow()
            .node(element)
            .map_or(false, |n| n.has_class(class))
    }

    pub fn style(&self, element: NodeId, property: &str) -> Option<String> {
        let tree = self.tree.borrow();
        let node = tree.node(element)?;
        node.style
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.clone())
    }

    pub fn attribute(&self, element: NodeId, name: &str) -> Option<String> {
        let tree = self.tree.borrow();
        let node = tree.node(element)?;
        node.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.clone())
    }

    pub fn inner_html(&self, element: NodeId) -> String {
        self.tree
            .borrow()
            .node(element)
            .map(|n| n.inner_html.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, element: NodeId) -> Option<NodeId> {
        self.tree.borrow().node(element).and_then(|n| n.parent)
    }

    pub fn children(&self, element: NodeId) -> Vec<NodeId> {
        self.tree
            .borrow()
            .node(element)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Whether the element is reachable from the body
    pub fn is_connected(&self, element: NodeId) -> bool {
        self.tree.borrow().is_connected(element)
    }

    /// Descendants of `root` carrying `class`, in document order
    pub fn elements_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.tree.borrow().collect_by_class(root, class, &mut found);
        found
    }

    /// Dispatches a click at the given client coordinates to `target`, then
    /// bubbles it through the ancestors until a listener stops propagation.
    /// The path is fixed before any listener runs, so a listener removing its
    /// own element does not cut the bubbling short. Returns the event so
    /// callers can inspect its flags.
    pub fn dispatch_click(&self, target: NodeId, client_x: f64, client_y: f64) -> ClickEvent {
        let mut event = ClickEvent::new(client_x, client_y);
        let path = {
            let tree = self.tree.borrow();
            let mut path = Vec::new();
            let mut current = Some(target);
            while let Some(id) = current {
                let Some(node) = tree.node(id) else {
                    break;
                };
                path.push(id);
                current = node.parent;
            }
            path
        };

        for id in path {
            // Listeners may mutate the tree, so none of it stays borrowed
            let listeners = match self.tree.borrow().node(id) {
                Some(node) => node.listeners.clone(),
                None => continue,
            };

            for listener in listeners {
                match listener.try_borrow_mut() {
                    Ok(mut listener) => {
                        let listener: &mut dyn FnMut(&mut ClickEvent) = &mut **listener;
                        listener(&mut event);
                    }
                    Err(_) => log::warn!("skipping re-entrant click listener on {:?}", id),
                }
            }

            if event.propagation_stopped() {
                break;
            }
        }

        event
    }

    /// Clicks the center of the element's bounding rect
    pub fn click_center(&self, target: NodeId) -> ClickEvent {
        let center = self.bounding_rect(&target).center();
        self.dispatch_click(target, center.x, center.y)
    }

    /// Serializes the element and its subtree
    pub fn to_html(&self, element: NodeId) -> String {
        let mut out = String::new();
        self.tree.borrow().write_html(element, &mut out);
        out
    }

    /// Elements currently alive, attached or not
    pub fn node_count(&self) -> usize {
        self.tree.borrow().live_nodes().count()
    }

    /// Click listeners held by live elements
    pub fn listener_count(&self) -> usize {
        self.tree
            .borrow()
            .live_nodes()
            .map(|node| node.listeners.len())
            .sum()
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDom")
            .field("nodes", &self.node_count())
            .finish()
    }
}

impl Dom for MemoryDom {
    type Element = NodeId;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let tree = self.tree.borrow();
        tree.ids
            .get(id)?
            .iter()
            .copied()
            .find(|node| tree.is_connected(*node))
    }

    fn create_element(&self, tag: &str) -> Result<NodeId> {
        if tag.is_empty() {
            return Err(MapError::Dom("empty tag name".to_string()));
        }
        Ok(self.tree.borrow_mut().create(tag))
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        if tree.node(*parent).is_none() || tree.node(*child).is_none() {
            return Err(MapError::Dom(format!(
                "cannot append {:?} to {:?}: unknown node",
                child, parent
            )));
        }
        if tree.is_ancestor_or_self(*child, *parent) {
            return Err(MapError::Dom(format!(
                "cannot append {:?} inside its own subtree",
                child
            )));
        }

        tree.detach(*child);
        tree.try_node_mut(*child)?.parent = Some(*parent);
        tree.try_node_mut(*parent)?.children.push(*child);
        Ok(())
    }

    fn remove(&self, element: &NodeId) {
        self.tree.borrow_mut().release(*element);
    }

    fn set_class_name(&self, element: &NodeId, class_name: &str) {
        if let Some(node) = self.tree.borrow_mut().node_mut(*element) {
            node.class_name = class_name.to_string();
        }
    }

    fn add_class(&self, element: &NodeId, class: &str) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let node = tree.try_node_mut(*element)?;
        if !node.has_class(class) {
            if !node.class_name.is_empty() {
                node.class_name.push(' ');
            }
            node.class_name.push_str(class);
        }
        Ok(())
    }

    fn set_style(&self, element: &NodeId, property: &str, value: &str) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        upsert(&mut tree.try_node_mut(*element)?.style, property, value);
        Ok(())
    }

    fn set_attribute(&self, element: &NodeId, name: &str, value: &str) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let node = tree.try_node_mut(*element)?;
        let previous = node
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone());

        match node.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => node.attributes.push((name.to_string(), value.to_string())),
        }

        if name == "id" {
            if let Some(old) = previous {
                if let Some(nodes) = tree.ids.get_mut(&old) {
                    nodes.retain(|n| n != element);
                }
            }
            tree.ids.entry(value.to_string()).or_default().push(*element);
        }
        Ok(())
    }

    fn set_inner_html(&self, element: &NodeId, html: &str) {
        let mut tree = self.tree.borrow_mut();
        let children = match tree.node_mut(*element) {
            Some(node) => {
                node.inner_html = html.to_string();
                std::mem::take(&mut node.children)
            }
            None => return,
        };
        for child in children {
            if let Some(child) = tree.node_mut(child) {
                child.parent = None;
            }
        }
    }

    fn bounding_rect(&self, element: &NodeId) -> Bounds {
        self.tree
            .borrow()
            .node(*element)
            .map(|n| n.rect.clone())
            .unwrap_or_default()
    }

    fn add_click_listener(&self, element: &NodeId, listener: ClickListener) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        tree.try_node_mut(*element)?
            .listeners
            .push(Rc::new(RefCell::new(listener)));
        Ok(())
    }
}
