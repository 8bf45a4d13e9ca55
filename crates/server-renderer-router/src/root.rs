//! The root of every rendered tree.
//!
//! [`AppShell`] turns a [`ResolvedView`] into a [`Page`] and is used by
//! both the server renderer and the hydration bootstrap. Because both
//! sides render through the same shell with the same inputs, the client
//! produces exactly the markup the server sent.

use crate::table::{RouteMatch, RouteTable};
use server_renderer_core::{
	GlobalAppData, Location, Page, PageProps, RenderContext, SerializedError, empty_props,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Application-wide wrapper around every page (layout, providers).
pub trait App: Send + Sync {
	/// Wraps the rendered page.
	fn render(&self, page: Page, cx: &RenderContext<'_>) -> Page;
}

/// An [`App`] that returns the page unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultApp;

impl App for DefaultApp {
	fn render(&self, page: Page, _cx: &RenderContext<'_>) -> Page {
		page
	}
}

/// Renders a captured loader failure.
pub type ErrorView = Arc<dyn Fn(&SerializedError, &Location) -> Page + Send + Sync>;

/// Renders the page for an unmatched location.
pub type NotFoundView = Arc<dyn Fn(&Location) -> Page + Send + Sync>;

/// Built-in error view.
///
/// ```html
/// <div class="error"><h1>message</h1><pre>stack</pre></div>
/// ```
///
/// The `<pre>` block is omitted when there is no stack.
pub fn default_error_view(error: &SerializedError, _location: &Location) -> Page {
	Page::element("div")
		.attr("class", "error")
		.child(Page::element("h1").child(error.message.clone()))
		.child(
			error
				.stack
				.clone()
				.map(|stack| Page::element("pre").child(stack)),
		)
		.into()
}

/// Built-in not-found view.
pub fn default_not_found_view(_location: &Location) -> Page {
	Page::element("div")
		.attr("class", "not-found")
		.child(Page::element("h1").child("Not Found"))
		.into()
}

/// What a location resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewContent {
	/// A route matched and its props are ready.
	Matched {
		/// The match.
		route_match: RouteMatch,
		/// Loader output or `{}`.
		props: PageProps,
	},
	/// No route matched.
	NotFound,
	/// The matched route's loader failed.
	Error {
		/// The match whose loader failed, when known.
		route_match: Option<RouteMatch>,
		/// The captured failure.
		error: SerializedError,
	},
}

/// A location together with what it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedView {
	/// The location the view was resolved for.
	pub location: Location,
	/// The resolution.
	pub content: ViewContent,
}

impl ResolvedView {
	/// Rebuilds the server's view from the embedded payload without running
	/// any loader.
	pub fn from_app_data(table: &RouteTable, location: Location, data: GlobalAppData) -> Self {
		let route_match = table.match_path(&location.pathname);
		let content = match (data.error, route_match) {
			(Some(error), route_match) => ViewContent::Error { route_match, error },
			(None, Some(route_match)) => ViewContent::Matched {
				route_match,
				props: data.page_props,
			},
			(None, None) => ViewContent::NotFound,
		};
		Self { location, content }
	}

	/// Returns the route match, if any.
	pub fn route_match(&self) -> Option<&RouteMatch> {
		match &self.content {
			ViewContent::Matched { route_match, .. } => Some(route_match),
			ViewContent::Error { route_match, .. } => route_match.as_ref(),
			ViewContent::NotFound => None,
		}
	}

	/// Returns the props when the view is a matched page.
	pub fn props(&self) -> Option<&PageProps> {
		match &self.content {
			ViewContent::Matched { props, .. } => Some(props),
			_ => None,
		}
	}

	/// Returns the error when the view is an error view.
	pub fn error(&self) -> Option<&SerializedError> {
		match &self.content {
			ViewContent::Error { error, .. } => Some(error),
			_ => None,
		}
	}

	/// The payload the server embeds for this view.
	pub fn app_data(&self) -> GlobalAppData {
		match &self.content {
			ViewContent::Matched { props, .. } => GlobalAppData::with_props(props.clone()),
			ViewContent::NotFound => GlobalAppData::with_props(empty_props()),
			ViewContent::Error { error, .. } => GlobalAppData::with_error(error.clone()),
		}
	}
}

/// Root wrapper: the [`App`], the error view and the not-found view.
#[derive(Clone)]
pub struct AppShell {
	app: Arc<dyn App>,
	error_view: ErrorView,
	not_found: NotFoundView,
}

impl Default for AppShell {
	fn default() -> Self {
		Self {
			app: Arc::new(DefaultApp),
			error_view: Arc::new(default_error_view),
			not_found: Arc::new(default_not_found_view),
		}
	}
}

impl AppShell {
	/// Creates a shell with the built-in views.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the application wrapper.
	pub fn with_app(mut self, app: impl App + 'static) -> Self {
		self.app = Arc::new(app);
		self
	}

	/// Sets the error view.
	pub fn with_error_view<F>(mut self, view: F) -> Self
	where
		F: Fn(&SerializedError, &Location) -> Page + Send + Sync + 'static,
	{
		self.error_view = Arc::new(view);
		self
	}

	/// Sets the not-found view.
	pub fn with_not_found<F>(mut self, view: F) -> Self
	where
		F: Fn(&Location) -> Page + Send + Sync + 'static,
	{
		self.not_found = Arc::new(view);
		self
	}

	/// Renders the root tree for `view`.
	///
	/// Starts a fresh [`Link`](crate::Link) click-hook registry on this
	/// thread.
	pub fn render(&self, view: &ResolvedView) -> Page {
		crate::link::reset_click_hooks();
		let no_params = HashMap::new();
		let no_props = empty_props();

		match &view.content {
			ViewContent::Matched { route_match, props } => {
				let cx = RenderContext::new(&view.location, route_match.params(), props);
				let page = route_match.component().render(&cx);
				self.app.render(page, &cx)
			}
			ViewContent::NotFound => {
				let cx = RenderContext::new(&view.location, &no_params, &no_props);
				self.app.render((self.not_found)(&view.location), &cx)
			}
			ViewContent::Error { route_match, error } => {
				let params = route_match.as_ref().map_or(&no_params, RouteMatch::params);
				let cx = RenderContext::new(&view.location, params, &no_props);
				self.app
					.render((self.error_view)(error, &view.location), &cx)
			}
		}
	}
}

impl fmt::Debug for AppShell {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AppShell").finish_non_exhaustive()
	}
}
