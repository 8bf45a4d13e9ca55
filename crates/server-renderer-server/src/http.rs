//! Hyper service rendering every request.

use crate::error::ServerError;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use server_renderer_core::ResponseHandle;
use server_renderer_ssr::{RenderOutput, ServerRenderer};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Content type of rendered pages.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// HTTP server rendering every request through a [`ServerRenderer`]
///
/// Static assets are not served; put the server behind something that
/// serves the build output.
#[derive(Debug, Clone)]
pub struct SsrServer {
	renderer: ServerRenderer,
}

impl SsrServer {
	/// Create a new server with the given renderer
	///
	/// # Examples
	///
	/// ```
	/// use server_renderer_core::{Page, PageComponent};
	/// use server_renderer_router::{Route, RouteTable};
	/// use server_renderer_server::SsrServer;
	/// use server_renderer_ssr::{HtmlTemplate, RenderOptions, ServerRenderer};
	///
	/// let routes = RouteTable::builder()
	///     .route(Route::new("/", PageComponent::new("Home", |_| Page::text("home"))))
	///     .build()
	///     .unwrap();
	/// let template = HtmlTemplate::new(r#"<div id="root"></div>"#, "#root").unwrap();
	/// let server = SsrServer::new(ServerRenderer::new(RenderOptions::new(routes, template)));
	/// ```
	pub fn new(renderer: ServerRenderer) -> Self {
		Self { renderer }
	}

	/// The renderer.
	pub fn renderer(&self) -> &ServerRenderer {
		&self.renderer
	}

	/// Start the server and listen on the given address
	///
	/// Runs until accepting a connection fails.
	pub async fn listen(self, addr: SocketAddr) -> Result<(), ServerError> {
		self.listen_with_shutdown(addr, std::future::pending()).await
	}

	/// Start the server and stop accepting connections once `shutdown`
	/// completes
	///
	/// Connections already accepted run to completion.
	pub async fn listen_with_shutdown(
		self,
		addr: SocketAddr,
		shutdown: impl Future<Output = ()>,
	) -> Result<(), ServerError> {
		let listener = TcpListener::bind(addr).await?;
		tracing::info!(addr = %listener.local_addr()?, "Server listening");
		self.serve(listener, shutdown).await
	}

	/// Serve connections from an already bound listener
	pub async fn serve(
		self,
		listener: TcpListener,
		shutdown: impl Future<Output = ()>,
	) -> Result<(), ServerError> {
		let server = Arc::new(self);
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, remote_addr) = result?;
					let server = server.clone();
					tokio::task::spawn(async move {
						if let Err(err) = Self::handle_connection(stream, remote_addr, server).await {
							tracing::warn!(%remote_addr, error = %err, "Error handling connection");
						}
					});
				}
				_ = &mut shutdown => {
					tracing::info!("Shutdown signal received, stopping server");
					return Ok(());
				}
			}
		}
	}

	async fn handle_connection(
		stream: TcpStream,
		remote_addr: SocketAddr,
		server: Arc<SsrServer>,
	) -> Result<(), hyper::Error> {
		let io = TokioIo::new(stream);
		let service = RequestService {
			server,
			remote_addr,
		};
		http1::Builder::new().serve_connection(io, service).await
	}

	/// Render one request
	///
	/// The request body is ignored. Render failures become an empty 500.
	#[tracing::instrument(skip_all, fields(method = %req.method(), uri = %req.uri()))]
	pub async fn handle<B>(&self, req: hyper::Request<B>) -> hyper::Response<Full<Bytes>> {
		let (parts, _body) = req.into_parts();
		let url = parts
			.uri
			.path_and_query()
			.map(|pq| pq.as_str().to_string())
			.unwrap_or_else(|| "/".to_string());
		let res = ResponseHandle::new();

		let output = match self
			.renderer
			.render_to_string(Some(Arc::new(parts)), &res, &url)
			.await
		{
			Ok(output) => output,
			Err(err) => {
				tracing::error!(error = %err, "Render failed");
				return internal_server_error();
			}
		};

		match build_response(&res, output) {
			Ok(response) => response,
			Err(err) => {
				tracing::error!(error = %err, "Failed to assemble response");
				internal_server_error()
			}
		}
	}
}

fn build_response(
	res: &ResponseHandle,
	output: RenderOutput,
) -> Result<hyper::Response<Full<Bytes>>, ServerError> {
	let snapshot = res.snapshot();
	let body = match output {
		RenderOutput::Html(html) => html,
		RenderOutput::Finalized => snapshot.body.unwrap_or_default(),
	};
	let is_html = !snapshot.finalized;

	let mut response = hyper::Response::builder().status(snapshot.status);
	if let Some(headers) = response.headers_mut() {
		headers.extend(snapshot.headers);
		if is_html {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
		}
	}
	Ok(response.body(Full::new(Bytes::from(body)))?)
}

fn internal_server_error() -> hyper::Response<Full<Bytes>> {
	let mut response = hyper::Response::new(Full::new(Bytes::new()));
	*response.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
	response
}

/// Service implementation for hyper
struct RequestService {
	server: Arc<SsrServer>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = std::convert::Infallible;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let server = self.server.clone();
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			tracing::debug!(%remote_addr, "Request received");
			Ok(server.handle(req).await)
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::StatusCode;
	use http_body_util::BodyExt;
	use rstest::rstest;
	use serde_json::json;
	use server_renderer_core::{Page, PageComponent, loader_fn};
	use server_renderer_router::{Route, RouteTable};
	use server_renderer_ssr::{HtmlTemplate, RenderOptions};

	fn server() -> SsrServer {
		let routes = RouteTable::builder()
			.route(Route::new(
				"/",
				PageComponent::new("Home", |_| Page::element("h1").child("home").into()),
			))
			.route(Route::new(
				"/old",
				PageComponent::new("Old", |_| Page::empty()).with_loader(loader_fn(|cx| async move {
					if let Some(res) = cx.res() {
						res.redirect("/", StatusCode::MOVED_PERMANENTLY)?;
					}
					Ok(json!({}))
				})),
			))
			.route(Route::new(
				"/teapot",
				PageComponent::new("Teapot", |_| Page::text("short and stout")).with_loader(
					loader_fn(|cx| async move {
						if let Some(res) = cx.res() {
							res.set_status(StatusCode::IM_A_TEAPOT)?;
							res.insert_header("x-brewed", "yes")?;
						}
						Ok(json!({}))
					}),
				),
			))
			.build()
			.unwrap();
		let template = HtmlTemplate::new(r#"<body><div id="root"></div></body>"#, "#root").unwrap();
		SsrServer::new(ServerRenderer::new(RenderOptions::new(routes, template)))
	}

	fn request(uri: &str) -> hyper::Request<()> {
		hyper::Request::builder().uri(uri).body(()).unwrap()
	}

	async fn body_of(response: hyper::Response<Full<Bytes>>) -> String {
		let bytes = response.into_body().collect().await.unwrap().to_bytes();
		String::from_utf8(bytes.to_vec()).unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_html_response() {
		// Act
		let response = server().handle(request("/")).await;

		// Assert
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(response.headers()[CONTENT_TYPE], HTML_CONTENT_TYPE);
		assert!(body_of(response).await.contains("<h1>home</h1>"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_loader_status_and_headers_are_kept() {
		let response = server().handle(request("/teapot")).await;

		assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
		assert_eq!(response.headers()["x-brewed"], "yes");
		assert_eq!(response.headers()[CONTENT_TYPE], HTML_CONTENT_TYPE);
	}

	#[rstest]
	#[tokio::test]
	async fn test_finalized_redirect() {
		let response = server().handle(request("/old?x=1")).await;

		assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
		assert_eq!(response.headers()["location"], "/");
		assert!(response.headers().get(CONTENT_TYPE).is_none());
		assert_eq!(body_of(response).await, "");
	}

	#[rstest]
	#[tokio::test]
	async fn test_unmatched_path_renders_not_found_view() {
		let response = server().handle(request("/missing")).await;

		assert_eq!(response.status(), StatusCode::OK);
		assert!(body_of(response).await.contains("Not Found"));
	}
}
