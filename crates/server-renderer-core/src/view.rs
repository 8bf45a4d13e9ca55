//! The view tree rendered on both sides of the network.
//!
//! [`Page`] is deliberately inert: no event handlers, no reactive cells.
//! The server serializes it with [`Page::render_to_string`] and the client
//! reconciles the very same tree against the delivered DOM, so anything
//! that could differ between the two (closures, ids generated at runtime)
//! has no place here.

use std::borrow::Cow;

/// A unified representation of renderable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
	/// A DOM element.
	Element(ElementView),
	/// A text node.
	Text(Cow<'static, str>),
	/// A fragment containing multiple pages (no wrapper element).
	Fragment(Vec<Page>),
	/// Renders nothing.
	Empty,
}

/// Represents a DOM element in the view tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementView {
	tag: Cow<'static, str>,
	attrs: Vec<(Cow<'static, str>, Cow<'static, str>)>,
	children: Vec<Page>,
	is_void: bool,
}

/// Returns whether `tag` is an HTML void element (no closing tag).
pub fn is_void_element(tag: &str) -> bool {
	matches!(
		tag,
		"area"
			| "base" | "br"
			| "col" | "embed"
			| "hr" | "img"
			| "input" | "link"
			| "meta" | "source"
			| "track" | "wbr"
	)
}

impl ElementView {
	/// Creates a new element view.
	pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
		let tag = tag.into();
		let is_void = is_void_element(&tag);
		Self {
			tag,
			attrs: Vec::new(),
			children: Vec::new(),
			is_void,
		}
	}

	/// Adds an attribute.
	pub fn attr(
		mut self,
		name: impl Into<Cow<'static, str>>,
		value: impl Into<Cow<'static, str>>,
	) -> Self {
		self.attrs.push((name.into(), value.into()));
		self
	}

	/// Adds an attribute only when `value` is `Some`.
	pub fn attr_opt(
		self,
		name: impl Into<Cow<'static, str>>,
		value: Option<impl Into<Cow<'static, str>>>,
	) -> Self {
		match value {
			Some(value) => self.attr(name, value),
			None => self,
		}
	}

	/// Adds a child.
	pub fn child(mut self, child: impl IntoPage) -> Self {
		self.children.push(child.into_page());
		self
	}

	/// Adds multiple children.
	pub fn children(mut self, children: impl IntoIterator<Item = impl IntoPage>) -> Self {
		self.children
			.extend(children.into_iter().map(IntoPage::into_page));
		self
	}

	/// Returns the tag name.
	pub fn tag_name(&self) -> &str {
		&self.tag
	}

	/// Returns the attributes in declaration order.
	pub fn attrs(&self) -> &[(Cow<'static, str>, Cow<'static, str>)] {
		&self.attrs
	}

	/// Returns the value of the first attribute called `name`.
	pub fn get_attr(&self, name: &str) -> Option<&str> {
		self.attrs
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v.as_ref())
	}

	/// Returns the children.
	pub fn child_pages(&self) -> &[Page] {
		&self.children
	}

	/// Returns whether this is a void element.
	pub fn is_void(&self) -> bool {
		self.is_void
	}
}

impl Page {
	/// Creates an element builder.
	pub fn element(tag: impl Into<Cow<'static, str>>) -> ElementView {
		ElementView::new(tag)
	}

	/// Creates a text node.
	pub fn text(content: impl Into<Cow<'static, str>>) -> Self {
		Self::Text(content.into())
	}

	/// Creates a fragment.
	pub fn fragment(children: impl IntoIterator<Item = impl IntoPage>) -> Self {
		Self::Fragment(children.into_iter().map(IntoPage::into_page).collect())
	}

	/// Creates an empty page.
	pub fn empty() -> Self {
		Self::Empty
	}

	/// Renders the tree to an HTML string.
	///
	/// Attribute values and text are escaped with [`escape_html`]; void
	/// elements are written as `<tag ... />`.
	pub fn render_to_string(&self) -> String {
		let mut output = String::new();
		self.render_into(&mut output);
		output
	}

	fn render_into(&self, output: &mut String) {
		match self {
			Page::Element(el) => {
				output.push('<');
				output.push_str(el.tag_name());

				for (name, value) in el.attrs() {
					output.push(' ');
					output.push_str(name);
					output.push_str("=\"");
					output.push_str(&escape_html(value));
					output.push('"');
				}

				if el.is_void() {
					output.push_str(" />");
				} else {
					output.push('>');
					for child in el.child_pages() {
						child.render_into(output);
					}
					output.push_str("</");
					output.push_str(el.tag_name());
					output.push('>');
				}
			}
			Page::Text(text) => output.push_str(&escape_html(text)),
			Page::Fragment(children) => {
				for child in children {
					child.render_into(output);
				}
			}
			Page::Empty => {}
		}
	}
}

impl From<ElementView> for Page {
	fn from(el: ElementView) -> Self {
		Page::Element(el)
	}
}

/// Conversion into a [`Page`].
pub trait IntoPage {
	/// Performs the conversion.
	fn into_page(self) -> Page;
}

impl IntoPage for Page {
	fn into_page(self) -> Page {
		self
	}
}

impl IntoPage for ElementView {
	fn into_page(self) -> Page {
		Page::Element(self)
	}
}

impl IntoPage for &'static str {
	fn into_page(self) -> Page {
		Page::Text(Cow::Borrowed(self))
	}
}

impl IntoPage for String {
	fn into_page(self) -> Page {
		Page::Text(Cow::Owned(self))
	}
}

impl<T: IntoPage> IntoPage for Option<T> {
	fn into_page(self) -> Page {
		self.map_or(Page::Empty, IntoPage::into_page)
	}
}

impl<T: IntoPage> IntoPage for Vec<T> {
	fn into_page(self) -> Page {
		Page::fragment(self)
	}
}

/// Escapes HTML special characters to prevent XSS.
///
/// Escapes `&`, `<`, `>`, `"` and `'`. Borrows the input when nothing needs
/// escaping.
pub fn escape_html(s: &str) -> Cow<'_, str> {
	if !s.contains(['&', '<', '>', '"', '\'']) {
		return Cow::Borrowed(s);
	}

	let mut escaped = String::with_capacity(s.len() + 8);
	for c in s.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#x27;"),
			_ => escaped.push(c),
		}
	}
	Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_element_renders_attributes_and_children() {
		// Arrange
		let page = Page::element("div")
			.attr("class", "card")
			.child(Page::element("span").child("hi"))
			.into_page();

		// Act
		let html = page.render_to_string();

		// Assert
		assert_eq!(html, r#"<div class="card"><span>hi</span></div>"#);
	}

	#[rstest]
	fn test_void_element_has_no_closing_tag() {
		let page = Page::element("img").attr("src", "/a.png").into_page();
		assert_eq!(page.render_to_string(), r#"<img src="/a.png" />"#);
	}

	#[rstest]
	#[case("plain", "plain")]
	#[case("<b>", "&lt;b&gt;")]
	#[case("a & b", "a &amp; b")]
	#[case(r#"say "hi""#, "say &quot;hi&quot;")]
	#[case("it's", "it&#x27;s")]
	fn test_escape_html(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(escape_html(input), expected);
	}

	#[rstest]
	fn test_escape_html_borrows_when_clean() {
		assert!(matches!(escape_html("nothing to do"), Cow::Borrowed(_)));
	}

	#[rstest]
	fn test_text_and_attribute_are_escaped() {
		let page = Page::element("p")
			.attr("title", "<x>")
			.child("1 < 2")
			.into_page();
		assert_eq!(
			page.render_to_string(),
			r#"<p title="&lt;x&gt;">1 &lt; 2</p>"#
		);
	}

	#[rstest]
	fn test_fragment_and_empty() {
		let page = Page::fragment(vec![Page::text("a"), Page::empty(), Page::text("b")]);
		assert_eq!(page.render_to_string(), "ab");
	}

	#[rstest]
	fn test_attr_opt_skips_none() {
		let el = Page::element("a")
			.attr_opt("class", None::<&'static str>)
			.attr_opt("href", Some("/x"));
		assert_eq!(el.attrs().len(), 1);
		assert_eq!(el.get_attr("href"), Some("/x"));
	}
}
