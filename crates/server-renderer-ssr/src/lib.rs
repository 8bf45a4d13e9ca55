//! Server-side rendering for server-renderer.
//!
//! A request is rendered in one pass:
//!
//! 1. match the URL against the shared [`RouteTable`](server_renderer_router::RouteTable)
//! 2. run the matched component's initial-props loader once
//! 3. render the [`AppShell`](server_renderer_router::AppShell) to markup
//! 4. splice the markup into the [`HtmlTemplate`] mount point
//! 5. embed the page data as `window.__APP_DATA__` for hydration
//!
//! The renderer never writes the HTTP response itself; the caller sends
//! either the returned document or, for [`RenderOutput::Finalized`], the
//! response the loader prepared through its
//! [`ResponseHandle`](server_renderer_core::ResponseHandle).

#![warn(missing_docs)]

pub mod error;
pub mod renderer;
pub mod template;

pub use error::{RenderError, TemplateError};
pub use renderer::{RenderOptions, RenderOutput, ServerRenderer, render_to_string};
pub use template::HtmlTemplate;
