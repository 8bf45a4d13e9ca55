//! Reconciling attach.
//!
//! Walks the rendered [`Page`] and the existing DOM side by side. Nodes
//! that match are kept, so the server's DOM (and anything attached to it)
//! survives hydration. Differences are repaired in place and recorded:
//! - text that differs is rewritten,
//! - attributes that differ are set or removed,
//! - nodes of a different kind or tag are replaced,
//! - missing nodes are appended, extra nodes removed.
//!
//! Comment nodes in the DOM are ignored. Fragments in the page are
//! flattened and adjacent text is merged, matching how the browser parses
//! the server's markup.

use crate::dom::{Dom, DomNode};
use server_renderer_core::{ElementView, Page};
use std::fmt;

/// What differed at one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchKind {
	/// A text node held different text.
	Text {
		/// Rendered text.
		expected: String,
		/// Text found in the document.
		found: String,
	},
	/// An attribute was missing, extra or different.
	Attribute {
		/// Attribute name.
		name: String,
		/// Rendered value, `None` when the attribute should not exist.
		expected: Option<String>,
		/// Value found in the document.
		found: Option<String>,
	},
	/// A node of a different kind or tag was replaced.
	Replaced {
		/// Rendered node.
		expected: String,
		/// Node found in the document.
		found: String,
	},
	/// A rendered node was absent and has been appended.
	Missing {
		/// Rendered node.
		expected: String,
	},
	/// A node the render did not produce has been removed.
	Extra {
		/// Node found in the document.
		found: String,
	},
}

/// One repaired difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
	/// Position below the mount point, e.g. `main[0]/p[1]`.
	pub path: String,
	/// What differed.
	pub kind: MismatchKind,
}

impl fmt::Display for Mismatch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.kind {
			MismatchKind::Text { expected, found } => {
				write!(f, "{}: text {:?} != {:?}", self.path, found, expected)
			}
			MismatchKind::Attribute {
				name,
				expected,
				found,
			} => write!(
				f,
				"{}: attribute {} {:?} != {:?}",
				self.path, name, found, expected
			),
			MismatchKind::Replaced { expected, found } => {
				write!(f, "{}: replaced {} with {}", self.path, found, expected)
			}
			MismatchKind::Missing { expected } => write!(f, "{}: inserted {}", self.path, expected),
			MismatchKind::Extra { found } => write!(f, "{}: removed {}", self.path, found),
		}
	}
}

/// Every difference repaired by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationReport {
	/// Repaired differences in document order.
	pub mismatches: Vec<Mismatch>,
}

impl HydrationReport {
	/// Returns `true` if the DOM already matched.
	pub fn is_clean(&self) -> bool {
		self.mismatches.is_empty()
	}

	/// Number of repairs.
	pub fn len(&self) -> usize {
		self.mismatches.len()
	}

	/// Returns `true` if nothing was repaired.
	pub fn is_empty(&self) -> bool {
		self.mismatches.is_empty()
	}

	fn record(&mut self, path: &str, kind: MismatchKind) {
		let mismatch = Mismatch {
			path: path.to_string(),
			kind,
		};
		tracing::warn!(mismatch = %mismatch, "Hydration mismatch");
		self.mismatches.push(mismatch);
	}
}

enum Expected<'a> {
	Element(&'a ElementView),
	Text(String),
}

impl Expected<'_> {
	fn label(&self) -> String {
		match self {
			Expected::Element(el) => format!("<{}>", el.tag_name()),
			Expected::Text(text) => format!("text {:?}", text),
		}
	}
}

fn flatten<'a>(page: &'a Page, out: &mut Vec<Expected<'a>>) {
	match page {
		Page::Element(el) => out.push(Expected::Element(el)),
		Page::Text(text) if text.is_empty() => {}
		Page::Text(text) => match out.last_mut() {
			Some(Expected::Text(previous)) => previous.push_str(text),
			_ => out.push(Expected::Text(text.to_string())),
		},
		Page::Fragment(children) => children.iter().for_each(|child| flatten(child, out)),
		Page::Empty => {}
	}
}

fn flatten_children(pages: &[Page]) -> Vec<Expected<'_>> {
	let mut out = Vec::new();
	for page in pages {
		flatten(page, &mut out);
	}
	out
}

fn describe_label(node: &DomNode) -> String {
	match node {
		DomNode::Element { tag, .. } => format!("<{}>", tag),
		DomNode::Text(text) => format!("text {:?}", text),
		DomNode::Other => "other node".to_string(),
	}
}

/// Makes the children of `root` match `page`.
pub fn reconcile<D: Dom>(dom: &mut D, root: &D::Node, page: &Page) -> HydrationReport {
	let mut report = HydrationReport::default();
	let expected = flatten_children(std::slice::from_ref(page));
	reconcile_children(dom, root, &expected, "", &mut report);
	report
}

fn reconcile_children<D: Dom>(
	dom: &mut D,
	parent: &D::Node,
	expected: &[Expected<'_>],
	path: &str,
	report: &mut HydrationReport,
) {
	let actual: Vec<(D::Node, DomNode)> = dom
		.children(parent)
		.into_iter()
		.map(|node| {
			let described = dom.describe(&node);
			(node, described)
		})
		.filter(|(_, described)| match described {
			DomNode::Other => false,
			DomNode::Text(text) => !text.is_empty(),
			DomNode::Element { .. } => true,
		})
		.collect();

	for (index, want) in expected.iter().enumerate() {
		let segment = match want {
			Expected::Element(el) => format!("{}[{}]", el.tag_name(), index),
			Expected::Text(_) => format!("#text[{}]", index),
		};
		let child_path = if path.is_empty() {
			segment
		} else {
			format!("{}/{}", path, segment)
		};

		match actual.get(index) {
			None => {
				let node = build(dom, want);
				dom.append_child(parent, &node);
				report.record(
					&child_path,
					MismatchKind::Missing {
						expected: want.label(),
					},
				);
			}
			Some((node, found)) => {
				patch(dom, parent, node, found, want, &child_path, report);
			}
		}
	}

	for (node, found) in actual.iter().skip(expected.len()) {
		dom.remove_child(parent, node);
		report.record(
			path,
			MismatchKind::Extra {
				found: describe_label(found),
			},
		);
	}
}

fn patch<D: Dom>(
	dom: &mut D,
	parent: &D::Node,
	node: &D::Node,
	found: &DomNode,
	want: &Expected<'_>,
	path: &str,
	report: &mut HydrationReport,
) {
	match (want, found) {
		(Expected::Text(expected), DomNode::Text(actual)) => {
			if expected != actual {
				dom.set_text(node, expected);
				report.record(
					path,
					MismatchKind::Text {
						expected: expected.clone(),
						found: actual.clone(),
					},
				);
			}
		}
		(Expected::Element(el), DomNode::Element { tag, attrs }) if el.tag_name().eq_ignore_ascii_case(tag) => {
			patch_attributes(dom, node, el, attrs, path, report);
			let children = flatten_children(el.child_pages());
			reconcile_children(dom, node, &children, path, report);
		}
		_ => {
			let replacement = build(dom, want);
			dom.replace_child(parent, &replacement, node);
			report.record(
				path,
				MismatchKind::Replaced {
					expected: want.label(),
					found: describe_label(found),
				},
			);
		}
	}
}

fn patch_attributes<D: Dom>(
	dom: &mut D,
	node: &D::Node,
	el: &ElementView,
	found: &[(String, String)],
	path: &str,
	report: &mut HydrationReport,
) {
	for (name, value) in el.attrs() {
		let current = found.iter().find(|(n, _)| n == name).map(|(_, v)| v);
		if current.map(String::as_str) != Some(value.as_ref()) {
			dom.set_attribute(node, name, value);
			report.record(
				path,
				MismatchKind::Attribute {
					name: name.to_string(),
					expected: Some(value.to_string()),
					found: current.cloned(),
				},
			);
		}
	}

	for (name, value) in found {
		if el.get_attr(name).is_none() {
			dom.remove_attribute(node, name);
			report.record(
				path,
				MismatchKind::Attribute {
					name: name.clone(),
					expected: None,
					found: Some(value.clone()),
				},
			);
		}
	}
}

fn build<D: Dom>(dom: &mut D, want: &Expected<'_>) -> D::Node {
	match want {
		Expected::Text(text) => dom.create_text(text),
		Expected::Element(el) => {
			let node = dom.create_element(el.tag_name());
			for (name, value) in el.attrs() {
				dom.set_attribute(&node, name, value);
			}
			for child in flatten_children(el.child_pages()) {
				let child_node = build(dom, &child);
				dom.append_child(&node, &child_node);
			}
			node
		}
	}
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use crate::dom::MemoryDom;
	use rstest::rstest;
	use server_renderer_core::MountSelector;

	fn mounted(inner: &str) -> (MemoryDom, crate::dom::NodeId) {
		let dom = MemoryDom::parse_html(&format!(
			r#"<html><body><div id="root">{inner}</div></body></html>"#
		));
		let root = dom
			.query_selector(&MountSelector::parse("#root").unwrap())
			.unwrap();
		(dom, root)
	}

	fn page() -> Page {
		Page::element("main")
			.attr("class", "app")
			.child(Page::element("h1").child("Hello, ").child("world"))
			.child(Page::fragment([
				Page::element("p").child("a").into(),
				Page::empty(),
				Page::element("br").into(),
			]))
			.into()
	}

	#[rstest]
	fn test_matching_markup_is_clean() {
		// Arrange
		let markup = page().render_to_string();
		let (mut dom, root) = mounted(&markup);
		let before = dom.children(&root);

		// Act
		let report = reconcile(&mut dom, &root, &page());

		// Assert
		assert!(report.is_clean(), "{:?}", report);
		assert_eq!(dom.children(&root), before);
		assert_eq!(dom.inner_html(root), markup);
	}

	#[rstest]
	fn test_text_mismatch_is_patched_in_place() {
		let (mut dom, root) = mounted(r#"<main class="app"><h1>Hello, moon</h1><p>a</p><br></main>"#);
		let main = dom.children(&root)[0];

		let report = reconcile(&mut dom, &root, &page());

		assert_eq!(report.len(), 1);
		assert_eq!(report.mismatches[0].path, "main[0]/h1[0]/#text[0]");
		assert!(matches!(
			&report.mismatches[0].kind,
			MismatchKind::Text { expected, found } if expected == "Hello, world" && found == "Hello, moon"
		));
		assert_eq!(dom.children(&root)[0], main);
		assert_eq!(dom.inner_html(root), page().render_to_string());
	}

	#[rstest]
	fn test_attribute_mismatch() {
		let (mut dom, root) = mounted(
			r#"<main class="old" data-x="1"><h1>Hello, world</h1><p>a</p><br></main>"#,
		);

		let report = reconcile(&mut dom, &root, &page());

		assert_eq!(report.len(), 2);
		assert_eq!(dom.inner_html(root), page().render_to_string());
	}

	#[rstest]
	fn test_structural_mismatch_replaces_and_trims() {
		let (mut dom, root) = mounted(
			r#"<main class="app"><h2>x</h2><p>a</p><br><span>extra</span></main>"#,
		);

		let report = reconcile(&mut dom, &root, &page());

		let kinds: Vec<_> = report.mismatches.iter().map(|m| &m.kind).collect();
		assert!(matches!(kinds[0], MismatchKind::Replaced { .. }));
		assert!(matches!(kinds[1], MismatchKind::Extra { .. }));
		assert_eq!(dom.inner_html(root), page().render_to_string());
	}

	#[rstest]
	fn test_empty_mount_is_filled() {
		let (mut dom, root) = mounted("");

		let report = reconcile(&mut dom, &root, &page());

		assert!(matches!(report.mismatches[0].kind, MismatchKind::Missing { .. }));
		assert_eq!(dom.inner_html(root), page().render_to_string());
	}

	#[rstest]
	fn test_comments_are_ignored() {
		let markup = page().render_to_string();
		let (mut dom, root) = mounted(&format!("<!-- ssr -->{markup}"));

		let report = reconcile(&mut dom, &root, &page());

		assert!(report.is_clean());
	}
}
