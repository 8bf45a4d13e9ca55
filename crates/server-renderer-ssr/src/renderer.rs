//! Request-time rendering.

use crate::error::RenderError;
use crate::template::HtmlTemplate;
use server_renderer_core::{
	BuildProfile, LoaderContext, Location, PropsOutcome, ResponseHandle, resolve_initial_props,
};
use server_renderer_router::{AppShell, ResolvedView, RouteTable, ViewContent};
use std::fmt;
use std::sync::Arc;

/// Everything a render needs besides the request.
///
/// Built once at start-up and shared read-only by every request.
#[derive(Clone)]
pub struct RenderOptions {
	/// Route table shared with the client.
	pub routes: RouteTable,
	/// Parsed HTML template.
	pub template: Arc<HtmlTemplate>,
	/// App wrapper, error view and not-found view.
	pub shell: AppShell,
	/// Build profile; controls whether error stacks are embedded.
	pub profile: BuildProfile,
	/// Extra attributes written on the injected data script.
	pub script_attributes: Vec<(String, String)>,
}

impl RenderOptions {
	/// Creates options with the default shell and the development profile.
	pub fn new(routes: RouteTable, template: HtmlTemplate) -> Self {
		Self {
			routes,
			template: Arc::new(template),
			shell: AppShell::default(),
			profile: BuildProfile::default(),
			script_attributes: Vec::new(),
		}
	}

	/// Sets the shell.
	pub fn with_shell(mut self, shell: AppShell) -> Self {
		self.shell = shell;
		self
	}

	/// Sets the build profile.
	pub fn with_profile(mut self, profile: BuildProfile) -> Self {
		self.profile = profile;
		self
	}

	/// Adds an attribute to the injected data script.
	pub fn with_script_attribute(
		mut self,
		name: impl Into<String>,
		value: impl Into<String>,
	) -> Self {
		self.script_attributes.push((name.into(), value.into()));
		self
	}

	/// Adds several attributes to the injected data script.
	pub fn with_script_attributes<I, K, V>(mut self, attributes: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.script_attributes
			.extend(attributes.into_iter().map(|(k, v)| (k.into(), v.into())));
		self
	}
}

impl fmt::Debug for RenderOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderOptions")
			.field("routes", &self.routes)
			.field("selector", &self.template.selector().as_str())
			.field("profile", &self.profile)
			.field("script_attributes", &self.script_attributes)
			.finish_non_exhaustive()
	}
}

/// Result of a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutput {
	/// The full HTML document.
	Html(String),
	/// A loader finalized the response; send it as the loader left it.
	Finalized,
}

impl RenderOutput {
	/// Returns the document, if one was rendered.
	pub fn html(&self) -> Option<&str> {
		match self {
			RenderOutput::Html(html) => Some(html),
			RenderOutput::Finalized => None,
		}
	}
}

/// Renders `url` into the template.
///
/// Matches the route, runs its loader once with the live request and
/// response, renders the shell and embeds the page data. The response
/// handle is only passed to the loader; this function never writes it.
///
/// # Errors
///
/// Returns [`RenderError`] when loader output cannot be serialized.
#[tracing::instrument(skip(req, res, options), fields(profile = %options.profile))]
pub async fn render_to_string(
	req: Option<Arc<http::request::Parts>>,
	res: &ResponseHandle,
	url: &str,
	options: &RenderOptions,
) -> Result<RenderOutput, RenderError> {
	let location = Location::parse(url);

	let content = match options.routes.match_path(&location.pathname) {
		None => ViewContent::NotFound,
		Some(route_match) => {
			let cx = LoaderContext::server(url, route_match.params().clone(), req, res.clone());
			match resolve_initial_props(route_match.component(), cx, options.profile).await? {
				PropsOutcome::Ready(props) => ViewContent::Matched { route_match, props },
				PropsOutcome::Failed(error) => ViewContent::Error {
					route_match: Some(route_match),
					error,
				},
				PropsOutcome::Finalized => return Ok(RenderOutput::Finalized),
			}
		}
	};
	let view = ResolvedView { location, content };

	let markup = options.shell.render(&view).render_to_string();
	let script = view.app_data().to_script_tag(
		options
			.script_attributes
			.iter()
			.map(|(name, value)| (name.as_str(), value.as_str())),
	)?;

	Ok(RenderOutput::Html(options.template.render(&markup, &script)))
}

/// A cloneable renderer holding shared [`RenderOptions`].
#[derive(Debug, Clone)]
pub struct ServerRenderer {
	options: Arc<RenderOptions>,
}

impl ServerRenderer {
	/// Creates a renderer.
	pub fn new(options: RenderOptions) -> Self {
		Self {
			options: Arc::new(options),
		}
	}

	/// The shared options.
	pub fn options(&self) -> &RenderOptions {
		&self.options
	}

	/// See [`render_to_string`].
	pub async fn render_to_string(
		&self,
		req: Option<Arc<http::request::Parts>>,
		res: &ResponseHandle,
		url: &str,
	) -> Result<RenderOutput, RenderError> {
		render_to_string(req, res, url, &self.options).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::StatusCode;
	use rstest::rstest;
	use serde_json::json;
	use server_renderer_core::{GlobalAppData, Page, PageComponent, loader_fn};
	use server_renderer_router::Route;

	const TEMPLATE: &str =
		r#"<html><body><div id="root"></div><script src="/app.js"></script></body></html>"#;

	fn options(routes: Vec<Route>) -> RenderOptions {
		RenderOptions::new(
			RouteTable::new(routes).unwrap(),
			HtmlTemplate::new(TEMPLATE, "#root").unwrap(),
		)
	}

	fn data_of(html: &str) -> GlobalAppData {
		let start = html.find("window.__APP_DATA__ = \"").unwrap() + 23;
		let end = start + html[start..].find('"').unwrap();
		GlobalAppData::decode(&html[start..end]).unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_renders_component_without_loader() {
		// Arrange
		let options = options(vec![Route::new(
			"/",
			PageComponent::new("Home", |_| Page::element("h1").child("home").into()),
		)]);

		// Act
		let output = render_to_string(None, &ResponseHandle::new(), "/", &options)
			.await
			.unwrap();

		// Assert
		assert_eq!(
			output.html().unwrap(),
			concat!(
				r#"<html><body><div id="root"><h1>home</h1></div>"#,
				r#"<script type="text/javascript">window.__APP_DATA__ = "%7B%22pageProps%22%3A%7B%7D%7D";</script>"#,
				r#"<script src="/app.js"></script></body></html>"#,
			)
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_embeds_loader_props() {
		let component = PageComponent::new("User", |cx| {
			Page::text(cx.prop_str("name").unwrap_or_default().to_string())
		})
		.with_loader(loader_fn(|cx| async move {
			Ok(json!({ "name": format!("user-{}", cx.param("id").unwrap_or_default()) }))
		}));
		let options = options(vec![Route::new("/users/:id", component)]);

		let output = render_to_string(None, &ResponseHandle::new(), "/users/4", &options)
			.await
			.unwrap();

		let html = output.html().unwrap();
		assert!(html.contains(r#"<div id="root">user-4</div>"#));
		assert_eq!(data_of(html), GlobalAppData::with_props(json!({ "name": "user-4" })));
	}

	#[rstest]
	#[tokio::test]
	async fn test_not_found_renders_not_found_view() {
		let options = options(vec![]);

		let output = render_to_string(None, &ResponseHandle::new(), "/missing", &options)
			.await
			.unwrap();

		let html = output.html().unwrap();
		assert!(html.contains(r#"<div class="not-found"><h1>Not Found</h1></div>"#));
		assert_eq!(data_of(html), GlobalAppData::with_props(json!({})));
	}

	#[rstest]
	#[tokio::test]
	async fn test_absolute_url_in_query_does_not_select_route() {
		// Arrange
		let options = options(vec![
			Route::new("/login", PageComponent::new("Login", |_| Page::text("login page"))),
			Route::new(
				"/dashboard",
				PageComponent::new("Dashboard", |_| Page::text("dashboard page")),
			),
		]);

		// Act
		let output = render_to_string(
			None,
			&ResponseHandle::new(),
			"/login?next=https://example.com/dashboard",
			&options,
		)
		.await
		.unwrap();

		// Assert
		let html = output.html().unwrap();
		assert!(html.contains(r#"<div id="root">login page</div>"#));
		assert!(!html.contains("dashboard page"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_redirect_finalizes() {
		let component = PageComponent::new("Old", |_| Page::empty()).with_loader(loader_fn(
			|cx| async move {
				if let Some(res) = cx.res() {
					res.redirect("/new", StatusCode::FOUND)?;
				}
				Ok(json!({}))
			},
		));
		let options = options(vec![Route::new("/old", component)]);
		let res = ResponseHandle::new();

		let output = render_to_string(None, &res, "/old", &options).await.unwrap();

		assert_eq!(output, RenderOutput::Finalized);
		assert_eq!(res.status(), StatusCode::FOUND);
		assert_eq!(res.header("location").as_deref(), Some("/new"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_script_attributes_are_written() {
		let options = options(vec![Route::new(
			"/",
			PageComponent::new("Home", |_| Page::empty()),
		)])
		.with_script_attribute("nonce", "abc");

		let output = render_to_string(None, &ResponseHandle::new(), "/", &options)
			.await
			.unwrap();

		assert!(
			output
				.html()
				.unwrap()
				.contains(r#"<script type="text/javascript" nonce="abc">window.__APP_DATA__"#)
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_unserializable_props_abort_render() {
		let component = PageComponent::new("Bad", |_| Page::empty()).with_loader(loader_fn(
			|_| async move {
				let mut map = std::collections::HashMap::new();
				map.insert(vec![1u8], "non-string key");
				Ok(map)
			},
		));
		let options = options(vec![Route::new("/", component)]);

		let result = render_to_string(None, &ResponseHandle::new(), "/", &options).await;

		assert!(matches!(result, Err(RenderError::Serialization(_))));
	}
}
