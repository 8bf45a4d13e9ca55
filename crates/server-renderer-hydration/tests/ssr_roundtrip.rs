//! Integration tests for hydrating server-rendered documents
//!
//! Renders pages with the server renderer, parses the output into a
//! `MemoryDom` and hydrates it with the same route table.

use rstest::rstest;
use serde_json::json;
use server_renderer_core::{Page, PageComponent, ResponseHandle, loader_fn};
use server_renderer_hydration::{
	Dom, DocumentSource, HydrateOptions, MemoryDom, MismatchKind, render,
};
use server_renderer_router::{Link, MemoryHistory, Route, RouteTable};
use server_renderer_ssr::{HtmlTemplate, RenderOptions, ServerRenderer};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>app</title></head>
<body>
<div id="root"></div>
<script src="/static/app.js"></script>
</body>
</html>
"#;

fn routes(calls: Arc<AtomicUsize>) -> RouteTable {
	let user = PageComponent::new("User", |cx| {
		Page::element("section")
			.attr("class", "user")
			.child(Page::element("h1").child(cx.prop_str("name").unwrap_or_default().to_string()))
			.child(Link::new("/users/2").child("next").render(cx))
			.into()
	})
	.with_loader(loader_fn(move |cx| {
		let calls = calls.clone();
		async move {
			calls.fetch_add(1, Ordering::SeqCst);
			Ok(json!({ "name": format!("user {}", cx.param("id").unwrap_or_default()) }))
		}
	}));

	RouteTable::builder()
		.route(Route::new("/users/:id", user))
		.build()
		.unwrap()
}

async fn server_render(routes: RouteTable, url: &str) -> String {
	let template = HtmlTemplate::new(INDEX_HTML, "#root").unwrap();
	let renderer = ServerRenderer::new(RenderOptions::new(routes, template));
	renderer
		.render_to_string(None, &ResponseHandle::new(), url)
		.await
		.unwrap()
		.html()
		.unwrap()
		.to_string()
}

// ============================================================================
// Hydration of server output
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_server_output_hydrates_cleanly_without_loader() {
	// Arrange
	let calls = Arc::new(AtomicUsize::new(0));
	let routes = routes(calls.clone());
	let html = server_render(routes.clone(), "/users/1").await;
	let mut dom = MemoryDom::parse_html(&html);
	let options = HydrateOptions::new(routes, "#root").unwrap();

	// Act
	let app = render(
		&options,
		DocumentSource::new(html),
		&mut dom,
		Arc::new(MemoryHistory::new("/users/1")),
	)
	.unwrap();

	// Assert
	assert!(app.report().is_clean(), "{:?}", app.report());
	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(
		dom.inner_html(*app.mount()),
		r#"<section class="user"><h1>user 1</h1><a href="/users/2" data-link="">next</a></section>"#
	);
}

#[rstest]
#[tokio::test]
async fn test_unmatched_url_hydrates_not_found_view() {
	let routes = routes(Arc::new(AtomicUsize::new(0)));
	let html = server_render(routes.clone(), "/nowhere").await;
	let mut dom = MemoryDom::parse_html(&html);
	let options = HydrateOptions::new(routes, "#root").unwrap();

	let app = render(
		&options,
		DocumentSource::new(html),
		&mut dom,
		Arc::new(MemoryHistory::new("/nowhere")),
	)
	.unwrap();

	assert!(app.report().is_clean());
	assert_eq!(
		dom.inner_html(*app.mount()),
		r#"<div class="not-found"><h1>Not Found</h1></div>"#
	);
}

// ============================================================================
// Mismatch repair
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_client_render_differences_are_patched() {
	// Arrange
	let server_routes = routes(Arc::new(AtomicUsize::new(0)));
	let html = server_render(server_routes, "/users/1").await;
	let client_routes = RouteTable::builder()
		.route(Route::new(
			"/users/:id",
			PageComponent::new("User", |cx| {
				Page::element("section")
					.attr("class", "profile")
					.child(Page::element("h1").child(cx.prop_str("name").unwrap_or_default().to_string()))
					.into()
			}),
		))
		.build()
		.unwrap();
	let mut dom = MemoryDom::parse_html(&html);
	let options = HydrateOptions::new(client_routes, "#root").unwrap();

	// Act
	let app = render(
		&options,
		DocumentSource::new(html),
		&mut dom,
		Arc::new(MemoryHistory::new("/users/1")),
	)
	.unwrap();

	// Assert
	let kinds: Vec<_> = app.report().mismatches.iter().map(|m| m.kind.clone()).collect();
	assert_eq!(kinds.len(), 2);
	assert!(matches!(&kinds[0], MismatchKind::Attribute { name, .. } if name == "class"));
	assert!(matches!(&kinds[1], MismatchKind::Extra { .. }));
	assert_eq!(
		dom.inner_html(*app.mount()),
		r#"<section class="profile"><h1>user 1</h1></section>"#
	);
}

// ============================================================================
// Navigation after hydration
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_navigation_runs_loader_and_sync_updates_dom() {
	// Arrange
	let calls = Arc::new(AtomicUsize::new(0));
	let routes = routes(calls.clone());
	let html = server_render(routes.clone(), "/users/1").await;
	let mut dom = MemoryDom::parse_html(&html);
	let options = HydrateOptions::new(routes, "#root").unwrap();
	let mut app = render(
		&options,
		DocumentSource::new(html),
		&mut dom,
		Arc::new(MemoryHistory::new("/users/1")),
	)
	.unwrap();
	let section = dom.children(app.mount())[0];

	// Act
	app.router().push("/users/2");
	tokio::time::sleep(Duration::from_millis(50)).await;
	let report = app.sync(&mut dom).clone();

	// Assert
	assert_eq!(calls.load(Ordering::SeqCst), 2);
	assert_eq!(report.len(), 1);
	assert!(matches!(&report.mismatches[0].kind, MismatchKind::Text { expected, .. } if expected == "user 2"));
	assert_eq!(dom.children(app.mount())[0], section);
	assert!(dom.inner_html(*app.mount()).contains("<h1>user 2</h1>"));
}
