//! Page components.
//!
//! A [`PageComponent`] pairs a render function with an optional
//! initial-props loader. Whether a component has a loader is part of its
//! declared shape ([`PageComponent::has_initial_props`]) and is decided
//! when the component is built, never by probing at render time.
//!
//! Components receive everything they need through [`RenderContext`];
//! there is no ambient router state to look up.

use crate::location::Location;
use crate::props::{InitialPropsLoader, PageProps};
use crate::view::Page;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Explicit render-time context handed to every component.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
	/// The location being rendered.
	pub location: &'a Location,
	/// Named parameters extracted by the matched route.
	pub params: &'a HashMap<String, String>,
	/// The page props produced by the loader (or `{}`).
	pub props: &'a PageProps,
}

impl<'a> RenderContext<'a> {
	/// Creates a new context.
	pub fn new(
		location: &'a Location,
		params: &'a HashMap<String, String>,
		props: &'a PageProps,
	) -> Self {
		Self {
			location,
			params,
			props,
		}
	}

	/// Returns a route parameter by name.
	pub fn param(&self, name: &str) -> Option<&'a str> {
		self.params.get(name).map(String::as_str)
	}

	/// Returns a top-level string field of the page props.
	pub fn prop_str(&self, key: &str) -> Option<&'a str> {
		self.props.get(key).and_then(|v| v.as_str())
	}
}

/// Render function stored by a [`PageComponent`].
pub type RenderFn = Arc<dyn Fn(&RenderContext<'_>) -> Page + Send + Sync>;

/// A routable component: a name, a render function and an optional
/// initial-props loader.
///
/// Cloning is cheap; render function and loader are shared.
#[derive(Clone)]
pub struct PageComponent {
	name: Arc<str>,
	render: RenderFn,
	loader: Option<Arc<dyn InitialPropsLoader>>,
}

impl PageComponent {
	/// Creates a component without a loader.
	///
	/// # Examples
	///
	/// ```
	/// use server_renderer_core::{Page, PageComponent};
	///
	/// let about = PageComponent::new("About", |_cx| {
	///     Page::element("h1").child("About").into()
	/// });
	/// assert!(!about.has_initial_props());
	/// ```
	pub fn new<F>(name: impl Into<Arc<str>>, render: F) -> Self
	where
		F: Fn(&RenderContext<'_>) -> Page + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			render: Arc::new(render),
			loader: None,
		}
	}

	/// Attaches an initial-props loader.
	pub fn with_loader(mut self, loader: Arc<dyn InitialPropsLoader>) -> Self {
		self.loader = Some(loader);
		self
	}

	/// Returns the component name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns whether this component declares a loader.
	pub fn has_initial_props(&self) -> bool {
		self.loader.is_some()
	}

	/// Returns the loader, if any.
	pub fn loader(&self) -> Option<&Arc<dyn InitialPropsLoader>> {
		self.loader.as_ref()
	}

	/// Renders the component.
	pub fn render(&self, cx: &RenderContext<'_>) -> Page {
		(self.render)(cx)
	}
}

impl fmt::Debug for PageComponent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PageComponent")
			.field("name", &self.name)
			.field("has_initial_props", &self.has_initial_props())
			.finish()
	}
}
