//! Client bootstrap for server-renderer.
//!
//! Hydration takes over a document produced by the server renderer:
//!
//! 1. the embedded `window.__APP_DATA__` payload is consumed once through
//!    an [`AppDataSlot`]
//! 2. a [`Router`](server_renderer_router::Router) is hydrated for the
//!    current location without running any loader
//! 3. the shared [`AppShell`](server_renderer_router::AppShell) is rendered
//!    and [reconciled](reconcile()) into the existing mount point
//!
//! DOM access goes through the [`Dom`] trait. [`MemoryDom`] is an arena
//! DOM used natively and in tests; on `wasm32` [`WebDom`] drives the real
//! document and [`render_in_browser`] wires everything to the window.

#![warn(missing_docs)]

pub mod bootstrap;
pub mod dom;
pub mod error;
pub mod reconcile;
pub mod slot;

#[cfg(target_arch = "wasm32")]
pub use bootstrap::{BrowserApp, render_in_browser};
pub use bootstrap::{HydrateOptions, HydratedApp, render};
#[cfg(target_arch = "wasm32")]
pub use dom::WebDom;
pub use dom::{Dom, DomNode, MemoryDom, NodeId};
pub use error::HydrationError;
pub use reconcile::{HydrationReport, Mismatch, MismatchKind, reconcile};
#[cfg(target_arch = "wasm32")]
pub use slot::WindowSource;
pub use slot::{AppDataSlot, AppDataSource, DocumentSource};
