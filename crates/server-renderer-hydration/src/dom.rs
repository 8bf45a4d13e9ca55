//! DOM access for hydration.
//!
//! The reconciler only needs a handful of operations, captured by the
//! [`Dom`] trait. [`MemoryDom`] implements them over an in-memory arena
//! (native builds and tests); `WebDom` implements them over the browser
//! document on `wasm32`.

use server_renderer_core::MountSelector;
use server_renderer_core::view::{escape_html, is_void_element};
use std::fmt;

/// What the reconciler sees of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
	/// An element with its lowercase tag and attributes.
	Element {
		/// Tag name, lowercase.
		tag: String,
		/// Attributes in document order.
		attrs: Vec<(String, String)>,
	},
	/// A text node.
	Text(String),
	/// Comments, doctypes and anything else the reconciler ignores.
	Other,
}

/// The operations the reconciler performs on a document.
pub trait Dom {
	/// Node handle.
	type Node: Clone + PartialEq + fmt::Debug;

	/// Returns the first element matching `selector`, in document order.
	fn query_selector(&self, selector: &MountSelector) -> Option<Self::Node>;

	/// Returns the child nodes of `node`.
	fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

	/// Describes `node`.
	fn describe(&self, node: &Self::Node) -> DomNode;

	/// Creates a detached element.
	fn create_element(&mut self, tag: &str) -> Self::Node;

	/// Creates a detached text node.
	fn create_text(&mut self, text: &str) -> Self::Node;

	/// Appends `child` to `parent`.
	fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

	/// Replaces `old` with `new` under `parent`.
	fn replace_child(&mut self, parent: &Self::Node, new: &Self::Node, old: &Self::Node);

	/// Removes `child` from `parent`.
	fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);

	/// Sets an attribute.
	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

	/// Removes an attribute.
	fn remove_attribute(&mut self, node: &Self::Node, name: &str);

	/// Replaces the content of a text node.
	fn set_text(&mut self, node: &Self::Node, text: &str);
}

/// Handle to a [`MemoryDom`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
	Document,
	Element {
		tag: String,
		attrs: Vec<(String, String)>,
	},
	Text(String),
	Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
	kind: NodeKind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

/// An arena-backed document.
#[derive(Debug, Clone)]
pub struct MemoryDom {
	nodes: Vec<NodeData>,
}

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDom {
	/// Creates an empty document.
	pub fn new() -> Self {
		Self {
			nodes: vec![NodeData {
				kind: NodeKind::Document,
				parent: None,
				children: Vec::new(),
			}],
		}
	}

	/// The document node.
	pub fn document(&self) -> NodeId {
		NodeId(0)
	}

	/// Parses an HTML document the way a browser would.
	#[cfg(not(target_arch = "wasm32"))]
	pub fn parse_html(html: &str) -> Self {
		let parsed = scraper::Html::parse_document(html);
		let mut dom = Self::new();
		let document = dom.document();

		let mut stack: Vec<_> = parsed
			.tree
			.root()
			.children()
			.rev()
			.map(|child| (child, document))
			.collect();

		while let Some((node, parent)) = stack.pop() {
			let kind = match node.value() {
				scraper::Node::Element(element) => NodeKind::Element {
					tag: element.name().to_ascii_lowercase(),
					attrs: element
						.attrs()
						.map(|(name, value)| (name.to_string(), value.to_string()))
						.collect(),
				},
				scraper::Node::Text(text) => NodeKind::Text(text.text.to_string()),
				scraper::Node::Comment(comment) => NodeKind::Comment(comment.comment.to_string()),
				_ => continue,
			};
			let id = dom.push(kind);
			dom.append_child(&parent, &id);
			stack.extend(node.children().rev().map(|child| (child, id)));
		}
		dom
	}

	/// Returns the parent of `node`.
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.nodes[node.0].parent
	}

	/// Serializes the children of `node` in the same format as
	/// [`Page::render_to_string`](server_renderer_core::Page::render_to_string).
	pub fn inner_html(&self, node: NodeId) -> String {
		let mut out = String::new();
		for child in &self.nodes[node.0].children {
			self.write_node(*child, &mut out);
		}
		out
	}

	/// Text content of `node` and its descendants.
	pub fn text_content(&self, node: NodeId) -> String {
		match &self.nodes[node.0].kind {
			NodeKind::Text(text) => text.clone(),
			NodeKind::Comment(_) => String::new(),
			_ => self.nodes[node.0]
				.children
				.iter()
				.map(|child| self.text_content(*child))
				.collect(),
		}
	}

	fn write_node(&self, node: NodeId, out: &mut String) {
		match &self.nodes[node.0].kind {
			NodeKind::Document => out.push_str(&self.inner_html(node)),
			NodeKind::Element { tag, attrs } => {
				out.push('<');
				out.push_str(tag);
				for (name, value) in attrs {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					out.push_str(&escape_html(value));
					out.push('"');
				}
				if is_void_element(tag) {
					out.push_str(" />");
					return;
				}
				out.push('>');
				out.push_str(&self.inner_html(node));
				out.push_str("</");
				out.push_str(tag);
				out.push('>');
			}
			NodeKind::Text(text) => out.push_str(&escape_html(text)),
			NodeKind::Comment(comment) => {
				out.push_str("<!--");
				out.push_str(comment);
				out.push_str("-->");
			}
		}
	}

	fn push(&mut self, kind: NodeKind) -> NodeId {
		self.nodes.push(NodeData {
			kind,
			parent: None,
			children: Vec::new(),
		});
		NodeId(self.nodes.len() - 1)
	}

	fn detach(&mut self, node: NodeId) {
		if let Some(parent) = self.nodes[node.0].parent.take() {
			self.nodes[parent.0].children.retain(|c| *c != node);
		}
	}

	fn find(&self, node: NodeId, selector: &MountSelector) -> Option<NodeId> {
		if let NodeKind::Element { tag, attrs } = &self.nodes[node.0].kind
			&& selector.matches(tag, attrs.iter().map(|(k, v)| (k, v)))
		{
			return Some(node);
		}
		self.nodes[node.0]
			.children
			.iter()
			.find_map(|child| self.find(*child, selector))
	}
}

impl Dom for MemoryDom {
	type Node = NodeId;

	fn query_selector(&self, selector: &MountSelector) -> Option<NodeId> {
		self.find(self.document(), selector)
	}

	fn children(&self, node: &NodeId) -> Vec<NodeId> {
		self.nodes[node.0].children.clone()
	}

	fn describe(&self, node: &NodeId) -> DomNode {
		match &self.nodes[node.0].kind {
			NodeKind::Element { tag, attrs } => DomNode::Element {
				tag: tag.clone(),
				attrs: attrs.clone(),
			},
			NodeKind::Text(text) => DomNode::Text(text.clone()),
			NodeKind::Document | NodeKind::Comment(_) => DomNode::Other,
		}
	}

	fn create_element(&mut self, tag: &str) -> NodeId {
		self.push(NodeKind::Element {
			tag: tag.to_ascii_lowercase(),
			attrs: Vec::new(),
		})
	}

	fn create_text(&mut self, text: &str) -> NodeId {
		self.push(NodeKind::Text(text.to_string()))
	}

	fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
		self.detach(*child);
		self.nodes[child.0].parent = Some(*parent);
		self.nodes[parent.0].children.push(*child);
	}

	fn replace_child(&mut self, parent: &NodeId, new: &NodeId, old: &NodeId) {
		self.detach(*new);
		let siblings = &mut self.nodes[parent.0].children;
		if let Some(slot) = siblings.iter_mut().find(|c| **c == *old) {
			*slot = *new;
			self.nodes[new.0].parent = Some(*parent);
			self.nodes[old.0].parent = None;
		}
	}

	fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
		if self.nodes[child.0].parent == Some(*parent) {
			self.detach(*child);
		}
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
		if let NodeKind::Element { attrs, .. } = &mut self.nodes[node.0].kind {
			match attrs.iter_mut().find(|(n, _)| n == name) {
				Some((_, existing)) => *existing = value.to_string(),
				None => attrs.push((name.to_string(), value.to_string())),
			}
		}
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) {
		if let NodeKind::Element { attrs, .. } = &mut self.nodes[node.0].kind {
			attrs.retain(|(n, _)| n != name);
		}
	}

	fn set_text(&mut self, node: &NodeId, text: &str) {
		if let NodeKind::Text(existing) = &mut self.nodes[node.0].kind {
			*existing = text.to_string();
		}
	}
}

#[cfg(target_arch = "wasm32")]
pub use web::WebDom;

#[cfg(target_arch = "wasm32")]
mod web {
	use super::{Dom, DomNode};
	use server_renderer_core::MountSelector;
	use wasm_bindgen::JsCast;

	/// The browser document.
	#[derive(Debug, Clone)]
	pub struct WebDom {
		document: web_sys::Document,
	}

	impl WebDom {
		/// Binds to the global document, if any.
		pub fn new() -> Option<Self> {
			let document = web_sys::window()?.document()?;
			Some(Self { document })
		}

		/// The underlying document.
		pub fn document(&self) -> &web_sys::Document {
			&self.document
		}
	}

	fn log_failure(operation: &str, result: Result<impl Sized, wasm_bindgen::JsValue>) {
		if let Err(err) = result {
			tracing::error!(operation, ?err, "DOM operation failed");
		}
	}

	impl Dom for WebDom {
		type Node = web_sys::Node;

		fn query_selector(&self, selector: &MountSelector) -> Option<web_sys::Node> {
			self.document
				.query_selector(selector.as_str())
				.ok()
				.flatten()
				.map(Into::into)
		}

		fn children(&self, node: &web_sys::Node) -> Vec<web_sys::Node> {
			let list = node.child_nodes();
			(0..list.length()).filter_map(|i| list.item(i)).collect()
		}

		fn describe(&self, node: &web_sys::Node) -> DomNode {
			match node.node_type() {
				web_sys::Node::ELEMENT_NODE => {
					let Some(element) = node.dyn_ref::<web_sys::Element>() else {
						return DomNode::Other;
					};
					let attrs = element
						.get_attribute_names()
						.iter()
						.filter_map(|name| name.as_string())
						.map(|name| {
							let value = element.get_attribute(&name).unwrap_or_default();
							(name, value)
						})
						.collect();
					DomNode::Element {
						tag: element.tag_name().to_ascii_lowercase(),
						attrs,
					}
				}
				web_sys::Node::TEXT_NODE => DomNode::Text(node.text_content().unwrap_or_default()),
				_ => DomNode::Other,
			}
		}

		fn create_element(&mut self, tag: &str) -> web_sys::Node {
			match self.document.create_element(tag) {
				Ok(element) => element.into(),
				Err(err) => {
					tracing::error!(tag, ?err, "createElement failed");
					self.document.create_text_node("").into()
				}
			}
		}

		fn create_text(&mut self, text: &str) -> web_sys::Node {
			self.document.create_text_node(text).into()
		}

		fn append_child(&mut self, parent: &web_sys::Node, child: &web_sys::Node) {
			log_failure("appendChild", parent.append_child(child));
		}

		fn replace_child(&mut self, parent: &web_sys::Node, new: &web_sys::Node, old: &web_sys::Node) {
			log_failure("replaceChild", parent.replace_child(new, old));
		}

		fn remove_child(&mut self, parent: &web_sys::Node, child: &web_sys::Node) {
			log_failure("removeChild", parent.remove_child(child));
		}

		fn set_attribute(&mut self, node: &web_sys::Node, name: &str, value: &str) {
			if let Some(element) = node.dyn_ref::<web_sys::Element>() {
				log_failure("setAttribute", element.set_attribute(name, value));
			}
		}

		fn remove_attribute(&mut self, node: &web_sys::Node, name: &str) {
			if let Some(element) = node.dyn_ref::<web_sys::Element>() {
				log_failure("removeAttribute", element.remove_attribute(name));
			}
		}

		fn set_text(&mut self, node: &web_sys::Node, text: &str) {
			node.set_text_content(Some(text));
		}
	}
}
