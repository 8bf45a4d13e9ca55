//! HTTP adapter for server-renderer.
//!
//! [`SsrServer`] serves every request by rendering it through a
//! [`ServerRenderer`](server_renderer_ssr::ServerRenderer) on hyper 1.
//! Responses finalized by a loader (redirects, custom bodies) are sent as
//! the loader left them; everything else is sent as `text/html` with the
//! status and headers the loader set.
//!
//! ```no_run
//! use server_renderer_conf::Settings;
//! use server_renderer_core::{BuildProfile, Page, PageComponent};
//! use server_renderer_router::{Route, RouteTable};
//! use server_renderer_server::{SsrServer, init_tracing, render_options_from_environment};
//! use server_renderer_ssr::ServerRenderer;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! init_tracing();
//! let settings = Settings::load(".", BuildProfile::Production)?;
//! let routes = RouteTable::builder()
//!     .route(Route::new("/", PageComponent::new("Home", |_| Page::text("home"))))
//!     .build()?;
//! let options = render_options_from_environment(&settings, routes)?;
//! let addr = ([0, 0, 0, 0], settings.port).into();
//! SsrServer::new(ServerRenderer::new(options)).listen(addr).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod logging;
pub mod setup;

pub use error::ServerError;
pub use self::http::{HTML_CONTENT_TYPE, SsrServer};
pub use logging::{DEFAULT_FILTER, init_tracing};
pub use setup::{render_options, render_options_from_environment};
