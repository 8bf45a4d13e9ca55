//! End-to-end tests: server render, then hydration of the same document
//!
//! Every test renders on the server through the facade, parses the output
//! into a `MemoryDom` and hydrates it with the same route table, checking
//! that both sides agree on the route, the parameters and the markup.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use rstest::rstest;
use serde_json::json;
use server_renderer::hydration::{AppDataSlot, DocumentSource, MemoryDom, render};
use server_renderer::prelude::*;
use server_renderer::router::{ViewContent, default_error_view};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>parity</title></head>
<body>
<div id="root"></div>
<script src="/static/app.js"></script>
</body>
</html>
"#;

struct Layout;

impl App for Layout {
	fn render(&self, page: Page, cx: &RenderContext<'_>) -> Page {
		Page::element("div")
			.attr("class", "layout")
			.child(
				Page::element("nav")
					.child(Link::new("/").active_class("active").child("home").render(cx))
					.child(Link::new("/users/1").active_class("active").child("first").render(cx)),
			)
			.child(Page::element("main").child(page))
			.into()
	}
}

fn describe(cx: &RenderContext<'_>, name: &str) -> Page {
	let mut params: Vec<_> = cx.params.iter().collect();
	params.sort();
	let params = params
		.into_iter()
		.map(|(k, v)| format!("{k}={v}"))
		.collect::<Vec<_>>()
		.join(",");
	Page::element("p")
		.attr("data-route", name.to_string())
		.child(format!("{name}({params})"))
		.into()
}

struct Fixture {
	routes: RouteTable,
	shell: AppShell,
	calls: Arc<AtomicUsize>,
}

fn fixture() -> Fixture {
	let calls = Arc::new(AtomicUsize::new(0));
	let counted = calls.clone();
	let routes = RouteTable::builder()
		.route(Route::new("/", PageComponent::new("Home", |cx| describe(cx, "Home"))))
		.route(Route::new(
			"/users/:id",
			PageComponent::new("User", |cx| {
				Page::fragment([
					describe(cx, "User"),
					Page::element("h1")
						.child(cx.prop_str("name").unwrap_or_default().to_string())
						.into(),
				])
			})
			.with_loader(loader_fn(move |cx| {
				let counted = counted.clone();
				async move {
					counted.fetch_add(1, Ordering::SeqCst);
					Ok(json!({
						"name": format!("user {}", cx.param("id").unwrap_or_default()),
						"tags": ["a", "b"],
						"meta": { "nested": { "deep": null } },
					}))
				}
			})),
		))
		.route(Route::new(
			"/users/:id/posts/:post",
			PageComponent::new("Post", |cx| describe(cx, "Post")),
		))
		.route(Route::new(
			"/files/:rest*",
			PageComponent::new("Files", |cx| describe(cx, "Files")),
		))
		.route(Route::new(
			"/boom",
			PageComponent::new("Boom", |_| Page::text("unreachable")).with_loader(loader_fn(
				|_| async move { Err::<serde_json::Value, _>(anyhow::anyhow!("boom")) },
			)),
		))
		.build()
		.unwrap();
	Fixture {
		routes,
		shell: AppShell::new().with_app(Layout),
		calls,
	}
}

fn renderer(fixture: &Fixture, profile: BuildProfile) -> ServerRenderer {
	let template = HtmlTemplate::new(INDEX_HTML, "#root").unwrap();
	ServerRenderer::new(
		RenderOptions::new(fixture.routes.clone(), template)
			.with_shell(fixture.shell.clone())
			.with_profile(profile),
	)
}

async fn server_html(fixture: &Fixture, url: &str, profile: BuildProfile) -> String {
	renderer(fixture, profile)
		.render_to_string(None, &ResponseHandle::new(), url)
		.await
		.unwrap()
		.html()
		.unwrap()
		.to_string()
}

fn hydrate(
	fixture: &Fixture,
	html: &str,
	url: &str,
) -> (MemoryDom, HydratedApp<MemoryDom>) {
	let mut dom = MemoryDom::parse_html(html);
	let options = HydrateOptions::new(fixture.routes.clone(), "#root")
		.unwrap()
		.with_shell(fixture.shell.clone());
	let app = render(
		&options,
		DocumentSource::new(html),
		&mut dom,
		Arc::new(MemoryHistory::new(url)),
	)
	.unwrap();
	(dom, app)
}

// ============================================================================
// Matcher parity
// ============================================================================

#[rstest]
#[case("/", "Home()")]
#[case("/users/42", "User(id=42)")]
#[case("/users/42/", "User(id=42)")]
#[case("/users/42/posts/7", "Post(id=42,post=7)")]
#[case("/files/a/b/c.txt", "Files(rest=a/b/c.txt)")]
#[case("/users/42?tab=posts#top", "User(id=42)")]
#[tokio::test]
async fn test_server_and_client_agree_on_route(#[case] url: &str, #[case] expected: &str) {
	// Arrange
	let fixture = fixture();
	let html = server_html(&fixture, url, BuildProfile::Development).await;

	// Act
	let (dom, app) = hydrate(&fixture, &html, url);

	// Assert
	assert!(app.report().is_clean(), "{url}: {:?}", app.report());
	let mount = dom.inner_html(*app.mount());
	assert!(mount.contains(expected), "{url}: {mount}");
	let server_match = fixture.routes.match_url(url);
	let client_match = app.router().view().unwrap().route_match().cloned();
	assert_eq!(
		server_match.map(|m| m.params().clone()),
		client_match.map(|m| m.params().clone())
	);
}

#[rstest]
#[case("/nope")]
#[case("/users")]
#[case("/users/1/posts")]
#[tokio::test]
async fn test_unmatched_urls_hydrate_not_found(#[case] url: &str) {
	let fixture = fixture();
	let html = server_html(&fixture, url, BuildProfile::Development).await;

	let (dom, app) = hydrate(&fixture, &html, url);

	assert!(app.report().is_clean());
	assert!(matches!(
		app.router().view().unwrap().content,
		ViewContent::NotFound
	));
	assert!(dom.inner_html(*app.mount()).contains("Not Found"));
}

// ============================================================================
// Single loader invocation
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_loader_runs_once_across_render_and_hydration() {
	// Arrange
	let fixture = fixture();
	let html = server_html(&fixture, "/users/9", BuildProfile::Development).await;

	// Act
	let (_dom, app) = hydrate(&fixture, &html, "/users/9");
	tokio::time::sleep(std::time::Duration::from_millis(20)).await;

	// Assert
	assert_eq!(fixture.calls.load(Ordering::SeqCst), 1);
	assert_eq!(
		app.router().view().unwrap().props().cloned(),
		Some(json!({
			"name": "user 9",
			"tags": ["a", "b"],
			"meta": { "nested": { "deep": null } },
		}))
	);
}

#[rstest]
#[tokio::test]
async fn test_active_link_class_matches_on_both_sides() {
	let fixture = fixture();
	let html = server_html(&fixture, "/users/1", BuildProfile::Development).await;

	let (dom, app) = hydrate(&fixture, &html, "/users/1");

	assert!(app.report().is_clean());
	assert!(
		dom.inner_html(*app.mount())
			.contains(r#"<a href="/users/1" class="active" data-link="">first</a>"#)
	);
}

// ============================================================================
// Payload round trip
// ============================================================================

#[rstest]
#[case(json!({ "a": { "b": { "c": [1, 2, { "d": null }] } } }))]
#[case(json!({ "list": [], "empty": {}, "n": -1.5, "flag": false }))]
#[case(json!({ "text": "héllo 世界 🚀", "quote": "\"</script><!--", "amp": "a&b%20" }))]
#[tokio::test]
async fn test_page_props_survive_the_document(#[case] props: serde_json::Value) {
	// Arrange
	let echoed = props.clone();
	let routes = RouteTable::builder()
		.route(Route::new(
			"/",
			PageComponent::new("Echo", |_| Page::empty()).with_loader(loader_fn(move |_| {
				let echoed = echoed.clone();
				async move { Ok(echoed) }
			})),
		))
		.build()
		.unwrap();
	let template = HtmlTemplate::new(INDEX_HTML, "#root").unwrap();
	let html = ServerRenderer::new(RenderOptions::new(routes, template))
		.render_to_string(None, &ResponseHandle::new(), "/")
		.await
		.unwrap()
		.html()
		.unwrap()
		.to_string();

	// Act
	let data = AppDataSlot::new(DocumentSource::new(html)).take().unwrap();

	// Assert
	assert_eq!(data, GlobalAppData::with_props(props));
}

// ============================================================================
// Loader failure
// ============================================================================

#[rstest]
#[case(BuildProfile::Development, true)]
#[case(BuildProfile::Production, false)]
#[tokio::test]
async fn test_loader_error_renders_error_view_everywhere(
	#[case] profile: BuildProfile,
	#[case] has_stack: bool,
) {
	// Arrange
	let fixture = fixture();
	let res = ResponseHandle::new();
	let output = renderer(&fixture, profile)
		.render_to_string(None, &res, "/boom")
		.await
		.unwrap();
	let html = output.html().unwrap().to_string();

	// Act
	let (dom, app) = hydrate(&fixture, &html, "/boom");

	// Assert
	assert_eq!(res.status(), http::StatusCode::OK);
	let view = app.router().view().unwrap();
	let error = view.error().unwrap();
	assert_eq!(error.message, "boom");
	assert_eq!(error.stack.is_some(), has_stack);
	assert!(app.report().is_clean(), "{:?}", app.report());
	let expected = default_error_view(error, &view.location).render_to_string();
	assert!(dom.inner_html(*app.mount()).contains(&expected));
}

// ============================================================================
// Over HTTP
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_http_response_hydrates_cleanly() {
	// Arrange
	let fixture = fixture();
	let server = SsrServer::new(renderer(&fixture, BuildProfile::Production));
	let request = http::Request::builder()
		.uri("/users/3")
		.body(Full::new(Bytes::new()))
		.unwrap();

	// Act
	let response = server.handle(request).await;
	let body = response.into_body().collect().await.unwrap().to_bytes();
	let html = String::from_utf8(body.to_vec()).unwrap();
	let (_dom, app) = hydrate(&fixture, &html, "/users/3");

	// Assert
	assert!(app.report().is_clean());
	assert_eq!(fixture.calls.load(Ordering::SeqCst), 1);
}
