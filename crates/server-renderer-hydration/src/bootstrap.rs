//! Client bootstrap.
//!
//! [`render`] turns a server-rendered document into a live application:
//! it consumes the embedded page data, builds a hydrated [`Router`] for
//! the current location, renders the same [`AppShell`] the server used and
//! reconciles the result into the existing mount point. No loader runs
//! during hydration.

use crate::dom::Dom;
use crate::error::HydrationError;
use crate::reconcile::{HydrationReport, reconcile};
use crate::slot::{AppDataSlot, AppDataSource};
use server_renderer_core::{BuildProfile, MountSelector};
use server_renderer_router::{AppShell, History, RouteTable, Router};
use std::fmt;
use std::sync::Arc;

/// Client-side configuration.
///
/// Must use the same route table and shell as the server's
/// `RenderOptions`, or hydration will report mismatches.
#[derive(Clone)]
pub struct HydrateOptions {
	/// Route table shared with the server.
	pub routes: RouteTable,
	/// App wrapper, error view and not-found view.
	pub shell: AppShell,
	/// Mount point selector.
	pub selector: MountSelector,
	/// Build profile for client-side loaders.
	pub profile: BuildProfile,
}

impl HydrateOptions {
	/// Creates options mounting at `selector`.
	///
	/// # Errors
	///
	/// Returns [`HydrationError::Selector`] if the selector is invalid.
	pub fn new(routes: RouteTable, selector: &str) -> Result<Self, HydrationError> {
		Ok(Self {
			routes,
			shell: AppShell::default(),
			selector: MountSelector::parse(selector)?,
			profile: BuildProfile::default(),
		})
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
}

impl fmt::Debug for HydrateOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HydrateOptions")
			.field("routes", &self.routes)
			.field("selector", &self.selector.as_str())
			.field("profile", &self.profile)
			.finish_non_exhaustive()
	}
}

/// A hydrated application bound to a mount node.
pub struct HydratedApp<D: Dom> {
	router: Router,
	shell: AppShell,
	mount: D::Node,
	report: HydrationReport,
}

impl<D: Dom> HydratedApp<D> {
	/// The client router.
	pub fn router(&self) -> &Router {
		&self.router
	}

	/// Differences repaired by the last reconciliation.
	pub fn report(&self) -> &HydrationReport {
		&self.report
	}

	/// The mount node.
	pub fn mount(&self) -> &D::Node {
		&self.mount
	}

	/// Reconciles the router's current view into the mount node.
	///
	/// Call after the router commits a navigation. Does nothing while no
	/// view has been committed.
	pub fn sync(&mut self, dom: &mut D) -> &HydrationReport {
		if let Some(view) = self.router.view() {
			let page = self.shell.render(&view);
			self.report = reconcile(dom, &self.mount, &page);
			tracing::debug!(
				location = %view.location,
				patched = self.report.len(),
				"View synchronized"
			);
		}
		&self.report
	}
}

impl<D: Dom> fmt::Debug for HydratedApp<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HydratedApp")
			.field("router", &self.router)
			.field("mount", &self.mount)
			.field("report", &self.report)
			.finish_non_exhaustive()
	}
}

/// Hydrates the document held by `dom`.
///
/// # Errors
///
/// Fails when the page data is missing or undecodable, or when no node
/// matches the mount selector.
pub fn render<S, D>(
	options: &HydrateOptions,
	source: S,
	dom: &mut D,
	history: Arc<dyn History>,
) -> Result<HydratedApp<D>, HydrationError>
where
	S: AppDataSource,
	D: Dom,
{
	let data = AppDataSlot::new(source).take()?;

	let mount = dom
		.query_selector(&options.selector)
		.ok_or_else(|| HydrationError::MountPointNotFound(options.selector.as_str().to_string()))?;

	let router = Router::hydrate(options.routes.clone(), history, data, options.profile);
	let mut app = HydratedApp {
		router,
		shell: options.shell.clone(),
		mount,
		report: HydrationReport::default(),
	};
	app.sync(dom);

	if app.report.is_clean() {
		tracing::info!(location = %app.router.location(), "Hydrated");
	} else {
		tracing::warn!(
			location = %app.router.location(),
			mismatches = app.report.len(),
			"Hydrated with mismatches"
		);
	}
	Ok(app)
}

#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserApp, render_in_browser};

#[cfg(target_arch = "wasm32")]
mod browser {
	use super::{HydrateOptions, HydratedApp, render};
	use crate::dom::WebDom;
	use crate::error::HydrationError;
	use crate::slot::WindowSource;
	use server_renderer_router::{
		BrowserHistory, ClickEvent, HOOK_ATTRIBUTE, LINK_ATTRIBUTE, REPLACE_ATTRIBUTE, RouterHandle,
		Subscription, dispatch_click,
	};
	use std::cell::RefCell;
	use std::rc::Rc;
	use std::sync::Arc;
	use wasm_bindgen::JsCast;
	use wasm_bindgen::prelude::*;

	struct BrowserState {
		app: HydratedApp<WebDom>,
		dom: WebDom,
	}

	/// An application running in the browser.
	///
	/// Dropping it detaches the click interceptor and the router listener.
	/// Call [`BrowserApp::forget`] to keep it alive for the page lifetime.
	pub struct BrowserApp {
		state: Rc<RefCell<BrowserState>>,
		mount: web_sys::Node,
		click: Closure<dyn FnMut(web_sys::Event)>,
		_subscription: Subscription,
	}

	impl BrowserApp {
		/// A navigator for the running router.
		pub fn handle(&self) -> RouterHandle {
			self.state.borrow().app.router().handle()
		}

		/// Keeps the application alive until the page unloads.
		pub fn forget(self) {
			std::mem::forget(self);
		}
	}

	impl Drop for BrowserApp {
		fn drop(&mut self) {
			let _ = self
				.mount
				.remove_event_listener_with_callback("click", self.click.as_ref().unchecked_ref());
		}
	}

	fn click_event(event: &web_sys::MouseEvent, target: Option<String>) -> ClickEvent {
		ClickEvent {
			button: event.button(),
			meta_key: event.meta_key(),
			ctrl_key: event.ctrl_key(),
			shift_key: event.shift_key(),
			alt_key: event.alt_key(),
			default_prevented: event.default_prevented(),
			target,
		}
	}

	fn on_click(handle: &RouterHandle, event: web_sys::Event) {
		let Some(mouse) = event.dyn_ref::<web_sys::MouseEvent>() else {
			return;
		};
		let Some(anchor) = event
			.target()
			.and_then(|target| target.dyn_into::<web_sys::Element>().ok())
			.and_then(|element| element.closest(&format!("a[{}]", LINK_ATTRIBUTE)).ok().flatten())
		else {
			return;
		};
		let Some(href) = anchor.get_attribute("href") else {
			return;
		};

		let mut click = click_event(mouse, anchor.get_attribute("target"));
		let replace = anchor.has_attribute(REPLACE_ATTRIBUTE);
		let hook_id = anchor.get_attribute(HOOK_ATTRIBUTE);
		let navigated = dispatch_click(&mut click, &href, replace, hook_id.as_deref(), handle);
		// A hook cancelling the click also cancels the browser's navigation.
		if navigated || click.default_prevented {
			event.prevent_default();
		}
	}

	/// Hydrates `document` and starts routing.
	///
	/// Reads `window.__APP_DATA__`, reconciles the mount point, re-renders
	/// after every committed navigation and intercepts clicks on router
	/// links inside the mount point.
	///
	/// # Errors
	///
	/// See [`render`]; also [`HydrationError::NoWindow`] outside a browser.
	pub fn render_in_browser(options: HydrateOptions) -> Result<BrowserApp, HydrationError> {
		let mut dom = WebDom::new().ok_or(HydrationError::NoWindow)?;
		let history = BrowserHistory::new().ok_or(HydrationError::NoWindow)?;
		let app = render(&options, WindowSource, &mut dom, Arc::new(history))?;
		let mount = app.mount().clone();
		let handle = app.router().handle();

		let state = Rc::new(RefCell::new(BrowserState { app, dom }));

		let weak = Rc::downgrade(&state);
		let subscription = state.borrow().app.router().subscribe(move |snapshot| {
			if snapshot.phase.is_navigating() {
				return;
			}
			let Some(state) = weak.upgrade() else {
				return;
			};
			let Ok(mut state) = state.try_borrow_mut() else {
				tracing::warn!("Skipping re-render while the view is borrowed");
				return;
			};
			let BrowserState { app, dom } = &mut *state;
			app.sync(dom);
		});

		let click = Closure::wrap(Box::new(move |event: web_sys::Event| {
			on_click(&handle, event);
		}) as Box<dyn FnMut(web_sys::Event)>);
		if let Err(err) =
			mount.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())
		{
			tracing::error!(?err, "Failed to install link interceptor");
		}

		Ok(BrowserApp {
			state,
			mount,
			click,
			_subscription: subscription,
		})
	}
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use crate::dom::MemoryDom;
	use crate::slot::DocumentSource;
	use rstest::rstest;
	use serde_json::json;
	use server_renderer_core::{GlobalAppData, Page, PageComponent, SerializedError};
	use server_renderer_router::{MemoryHistory, Route, ViewContent};

	fn options() -> HydrateOptions {
		let table = RouteTable::builder()
			.route(Route::new(
				"/hello/:name",
				PageComponent::new("Hello", |cx| {
					Page::element("p")
						.child(format!(
							"{} {}",
							cx.prop_str("greeting").unwrap_or_default(),
							cx.param("name").unwrap_or_default()
						))
						.into()
				}),
			))
			.build()
			.unwrap();
		HydrateOptions::new(table, "#root").unwrap()
	}

	fn document(inner: &str, data: &GlobalAppData) -> String {
		format!(
			"<html><body><div id=\"root\">{inner}</div>{}</body></html>",
			data.to_script_tag([]).unwrap()
		)
	}

	#[rstest]
	fn test_render_hydrates_matching_document() {
		// Arrange
		let data = GlobalAppData::with_props(json!({ "greeting": "hi" }));
		let html = document("<p>hi ann</p>", &data);
		let mut dom = MemoryDom::parse_html(&html);
		let history = Arc::new(MemoryHistory::new("/hello/ann"));

		// Act
		let app = render(&options(), DocumentSource::new(html), &mut dom, history).unwrap();

		// Assert
		assert!(app.report().is_clean());
		assert_eq!(app.router().location().pathname, "/hello/ann");
		assert!(matches!(
			app.router().view().unwrap().content,
			ViewContent::Matched { .. }
		));
	}

	#[rstest]
	fn test_render_error_payload() {
		let data = GlobalAppData::with_error(SerializedError::new("boom"));
		let html = document("", &data);
		let mut dom = MemoryDom::parse_html(&html);
		let history = Arc::new(MemoryHistory::new("/hello/ann"));

		let app = render(&options(), DocumentSource::new(html), &mut dom, history).unwrap();

		let mount = *app.mount();
		assert_eq!(
			dom.inner_html(mount),
			r#"<div class="error"><h1>boom</h1></div>"#
		);
	}

	#[rstest]
	fn test_missing_mount_point() {
		let data = GlobalAppData::with_props(json!({}));
		let html = format!("<body>{}</body>", data.to_script_tag([]).unwrap());
		let mut dom = MemoryDom::parse_html(&html);
		let history = Arc::new(MemoryHistory::new("/"));

		let result = render(&options(), DocumentSource::new(html), &mut dom, history);

		assert!(matches!(result, Err(HydrationError::MountPointNotFound(s)) if s == "#root"));
	}

	#[rstest]
	fn test_missing_payload() {
		let mut dom = MemoryDom::parse_html(r#"<div id="root"></div>"#);
		let history = Arc::new(MemoryHistory::new("/"));

		let result = render(
			&options(),
			DocumentSource::new("<div id=\"root\"></div>"),
			&mut dom,
			history,
		);

		assert!(matches!(result, Err(HydrationError::MissingPayload)));
	}

	#[rstest]
	fn test_invalid_selector() {
		let table = RouteTable::builder().build().unwrap();
		assert!(matches!(
			HydrateOptions::new(table, ""),
			Err(HydrationError::Selector(_))
		));
	}
}
