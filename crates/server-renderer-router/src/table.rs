//! The route table.
//!
//! An ordered list of [`Route`] declarations compiled into [`PathPattern`]s
//! once, at start-up. The table is immutable afterwards and cheap to clone,
//! so the server can share it across concurrent requests and the client
//! can hand it to the router.

use crate::error::PatternError;
use crate::pattern::{MatchOptions, PathPattern, TrailingSlash};
use server_renderer_core::{Location, PageComponent};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A route declaration: a pattern, the component it renders and whether
/// the whole path must match.
#[derive(Debug, Clone)]
pub struct Route {
	pattern: String,
	component: PageComponent,
	exact: bool,
}

impl Route {
	/// Declares an exact route.
	pub fn new(pattern: impl Into<String>, component: PageComponent) -> Self {
		Self {
			pattern: pattern.into(),
			component,
			exact: true,
		}
	}

	/// Sets whether the route requires a full-path match.
	pub fn exact(mut self, exact: bool) -> Self {
		self.exact = exact;
		self
	}

	/// Returns the pattern as declared.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Returns the component.
	pub fn component(&self) -> &PageComponent {
		&self.component
	}

	/// Returns whether the route is exact.
	pub fn is_exact(&self) -> bool {
		self.exact
	}
}

/// Result of matching a path against the table.
#[derive(Debug, Clone)]
pub struct RouteMatch {
	route: Route,
	index: usize,
	params: HashMap<String, String>,
	matched: String,
}

impl RouteMatch {
	/// The matched route.
	pub fn route(&self) -> &Route {
		&self.route
	}

	/// Position of the route in the table.
	pub fn index(&self) -> usize {
		self.index
	}

	/// Extracted parameters.
	pub fn params(&self) -> &HashMap<String, String> {
		&self.params
	}

	/// The matched portion of the path.
	pub fn matched(&self) -> &str {
		&self.matched
	}

	/// Shortcut for `route().component()`.
	pub fn component(&self) -> &PageComponent {
		&self.route.component
	}
}

impl PartialEq for RouteMatch {
	fn eq(&self, other: &Self) -> bool {
		self.index == other.index
			&& self.route.pattern == other.route.pattern
			&& self.params == other.params
			&& self.matched == other.matched
	}
}

#[derive(Debug)]
struct CompiledRoute {
	route: Route,
	matcher: PathPattern,
}

struct TableInner {
	routes: Vec<CompiledRoute>,
	trailing_slash: TrailingSlash,
}

/// An ordered, compiled, immutable route table.
#[derive(Clone)]
pub struct RouteTable {
	inner: Arc<TableInner>,
}

impl RouteTable {
	/// Compiles `routes` with the default (lenient) trailing-slash policy.
	pub fn new(routes: impl IntoIterator<Item = Route>) -> Result<Self, PatternError> {
		Self::builder().routes(routes).build()
	}

	/// Starts a builder.
	pub fn builder() -> RouteTableBuilder {
		RouteTableBuilder::default()
	}

	/// Matches a pathname. Routes are tried in declaration order and the
	/// first match wins.
	pub fn match_path(&self, pathname: &str) -> Option<RouteMatch> {
		let found = self
			.inner
			.routes
			.iter()
			.enumerate()
			.find_map(|(index, compiled)| {
				compiled.matcher.matches(pathname).map(|m| RouteMatch {
					route: compiled.route.clone(),
					index,
					params: m.params,
					matched: m.matched,
				})
			});

		match &found {
			Some(m) => tracing::debug!(
				pathname,
				pattern = m.route.pattern(),
				component = m.component().name(),
				"Route matched"
			),
			None => tracing::debug!(pathname, "No route matched"),
		}
		found
	}

	/// Matches the pathname of a URL or request target.
	pub fn match_url(&self, url: &str) -> Option<RouteMatch> {
		self.match_path(&Location::parse(url).pathname)
	}

	/// Returns the routes in declaration order.
	pub fn routes(&self) -> impl Iterator<Item = &Route> {
		self.inner.routes.iter().map(|c| &c.route)
	}

	/// Returns the number of routes.
	pub fn len(&self) -> usize {
		self.inner.routes.len()
	}

	/// Returns `true` if the table has no routes.
	pub fn is_empty(&self) -> bool {
		self.inner.routes.is_empty()
	}

	/// Returns the trailing-slash policy.
	pub fn trailing_slash(&self) -> TrailingSlash {
		self.inner.trailing_slash
	}
}

impl fmt::Debug for RouteTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteTable")
			.field(
				"routes",
				&self.routes().map(Route::pattern).collect::<Vec<_>>(),
			)
			.field("trailing_slash", &self.inner.trailing_slash)
			.finish()
	}
}

/// Builder for [`RouteTable`].
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
	routes: Vec<Route>,
	trailing_slash: TrailingSlash,
}

impl RouteTableBuilder {
	/// Appends a route.
	pub fn route(mut self, route: Route) -> Self {
		self.routes.push(route);
		self
	}

	/// Appends several routes.
	pub fn routes(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
		self.routes.extend(routes);
		self
	}

	/// Sets the trailing-slash policy for every route.
	pub fn trailing_slash(mut self, trailing_slash: TrailingSlash) -> Self {
		self.trailing_slash = trailing_slash;
		self
	}

	/// Compiles every pattern.
	///
	/// # Errors
	///
	/// Returns the first [`PatternError`] encountered.
	pub fn build(self) -> Result<RouteTable, PatternError> {
		let trailing_slash = self.trailing_slash;
		let routes = self
			.routes
			.into_iter()
			.map(|route| {
				let options = MatchOptions {
					exact: route.exact,
					trailing_slash,
				};
				let matcher = PathPattern::compile(&route.pattern, options)?;
				Ok(CompiledRoute { route, matcher })
			})
			.collect::<Result<Vec<_>, PatternError>>()?;

		Ok(RouteTable {
			inner: Arc::new(TableInner {
				routes,
				trailing_slash,
			}),
		})
	}
}
