//! # server-renderer
//!
//! Server-side rendering with a single route table shared by the server and
//! the browser.
//!
//! A request flows through four stages:
//!
//! 1. **Match**: the URL is matched against the [`RouteTable`]
//! 2. **Load**: the matched component's initial-props loader runs once
//!    with the live request and response
//! 3. **Render**: the [`AppShell`] is rendered to markup, spliced into the
//!    HTML template and the page data is embedded as
//!    `window.__APP_DATA__`
//! 4. **Hydrate**: the browser consumes the page data, hydrates a
//!    [`Router`] without running the loader again and reconciles the same
//!    tree into the server's DOM
//!
//! ## Feature Flags
//!
//! - `server` (default): [`ssr`], [`conf`] and [`server`] (native targets only)
//! - `client` (default): [`hydration`]
//!
//! ## Quick Example
//!
//! ```
//! use server_renderer::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let routes = RouteTable::builder()
//!     .route(Route::new(
//!         "/users/:id",
//!         PageComponent::new("User", |cx| {
//!             Page::element("h1")
//!                 .child(cx.prop_str("name").unwrap_or_default().to_string())
//!                 .into()
//!         })
//!         .with_loader(loader_fn(|cx| async move {
//!             Ok(serde_json::json!({ "name": format!("user {}", cx.param("id").unwrap_or_default()) }))
//!         })),
//!     ))
//!     .build()?;
//!
//! let template = HtmlTemplate::new(r#"<body><div id="root"></div></body>"#, "#root")?;
//! let renderer = ServerRenderer::new(RenderOptions::new(routes, template));
//! let output = renderer
//!     .render_to_string(None, &ResponseHandle::new(), "/users/7")
//!     .await?;
//! assert!(output.html().unwrap().contains("<h1>user 7</h1>"));
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod router;

#[cfg(all(feature = "server", not(target_arch = "wasm32")))]
pub mod conf;
#[cfg(all(feature = "server", not(target_arch = "wasm32")))]
pub mod server;
#[cfg(all(feature = "server", not(target_arch = "wasm32")))]
pub mod ssr;

#[cfg(feature = "client")]
pub mod hydration;

// Re-export core types
pub use server_renderer_core::{
	BuildProfile, GlobalAppData, InitialPropsLoader, IntoPage, LoaderContext, Location,
	MountSelector, Page, PageComponent, PageProps, RenderContext, ResponseHandle, SerializedError,
	loader_fn,
};

// Re-export routing
pub use server_renderer_router::{
	App, AppShell, History, Link, MemoryHistory, Navigate, Route, RouteTable, Router,
};

// Re-export server rendering
#[cfg(all(feature = "server", not(target_arch = "wasm32")))]
pub use server_renderer_conf::{PublicEnv, Settings};
#[cfg(all(feature = "server", not(target_arch = "wasm32")))]
pub use server_renderer_server::{SsrServer, init_tracing};
#[cfg(all(feature = "server", not(target_arch = "wasm32")))]
pub use server_renderer_ssr::{HtmlTemplate, RenderOptions, RenderOutput, ServerRenderer};

// Re-export hydration
#[cfg(feature = "client")]
pub use server_renderer_hydration::{HydrateOptions, HydratedApp, HydrationReport};

/// Commonly used items.
pub mod prelude {
	pub use crate::{
		App, AppShell, BuildProfile, GlobalAppData, History, InitialPropsLoader, IntoPage, Link,
		LoaderContext, Location, MemoryHistory, MountSelector, Navigate, Page, PageComponent,
		PageProps, RenderContext, ResponseHandle, Route, RouteTable, Router, SerializedError,
		loader_fn,
	};

	#[cfg(all(feature = "server", not(target_arch = "wasm32")))]
	pub use crate::{
		HtmlTemplate, PublicEnv, RenderOptions, RenderOutput, ServerRenderer, Settings, SsrServer,
		init_tracing,
	};

	#[cfg(feature = "client")]
	pub use crate::{HydrateOptions, HydratedApp, HydrationReport};

	// External
	pub use async_trait::async_trait;
}
