//! Routing for server-renderer.
//!
//! The same [`RouteTable`] is consulted by the server renderer at request
//! time and by the client [`Router`] at navigation time, through the same
//! compiled [`PathPattern`]s, so a URL resolves to the same route and the
//! same parameters on both sides.
//!
//! ## Pattern syntax
//!
//! - `/users/:id` or `/users/{id}`: named segment
//! - `/files/:rest*` or `/files/{rest:*}`: named trailing wildcard
//! - `/files/*`: anonymous trailing wildcard, captured as `"*"`
//!
//! ## Example
//!
//! ```
//! use server_renderer_core::{Page, PageComponent};
//! use server_renderer_router::{Route, RouteTable};
//!
//! let table = RouteTable::builder()
//!     .route(Route::new("/", PageComponent::new("Home", |_| Page::text("home"))))
//!     .route(Route::new("/users/:id", PageComponent::new("User", |cx| {
//!         Page::text(cx.param("id").unwrap_or_default().to_string())
//!     })))
//!     .build()
//!     .unwrap();
//!
//! let matched = table.match_path("/users/42").unwrap();
//! assert_eq!(matched.params()["id"], "42");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod history;
pub mod link;
pub mod pattern;
pub mod root;
pub mod router;
pub mod subscription;
pub mod table;

pub use error::PatternError;
#[cfg(target_arch = "wasm32")]
pub use history::BrowserHistory;
pub use history::{History, HistoryListener, MemoryHistory};
pub use link::{
	ClickEvent, ClickHook, HOOK_ATTRIBUTE, LINK_ATTRIBUTE, Link, REPLACE_ATTRIBUTE, dispatch_click,
	intercept_click, reset_click_hooks, run_click_hook, should_intercept,
};
pub use pattern::{
	MAX_PATH_SEGMENTS, MAX_PATTERN_LENGTH, MatchOptions, PathMatch, PathPattern, TrailingSlash,
};
pub use root::{
	App, AppShell, DefaultApp, ErrorView, NotFoundView, ResolvedView, ViewContent,
	default_error_view, default_not_found_view,
};
pub use router::{Navigate, Phase, Router, RouterHandle, RouterListener, RouterSnapshot};
pub use subscription::Subscription;
pub use table::{Route, RouteMatch, RouteTable, RouteTableBuilder};
