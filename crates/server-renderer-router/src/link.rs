//! Client-side links.
//!
//! A [`Link`] renders a plain `<a href>` so it works without JavaScript and
//! is marked with `data-link` so the hydrated client can intercept clicks
//! and navigate through the router instead of reloading the page.
//!
//! Click hooks set with [`Link::on_click`] are registered per thread while
//! the tree renders and the anchor carries the hook's id in
//! `data-link-hook`. [`AppShell::render`](crate::AppShell::render) starts a
//! fresh registry, so ids follow render order and the server and the
//! client assign the same ids to the same tree. The delegated browser
//! listener looks the hook up again through [`dispatch_click`].

use crate::router::Navigate;
use server_renderer_core::{ElementView, IntoPage, Location, Page, RenderContext};
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// Attribute marking router links in rendered markup.
pub const LINK_ATTRIBUTE: &str = "data-link";

/// Attribute marking links that replace instead of push.
pub const REPLACE_ATTRIBUTE: &str = "data-replace";

/// Attribute carrying the id of a link's registered click hook.
pub const HOOK_ATTRIBUTE: &str = "data-link-hook";

/// The parts of a DOM click event relevant to link interception.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickEvent {
	/// `MouseEvent.button`; `0` is the primary button.
	pub button: i16,
	/// Meta (command) key held.
	pub meta_key: bool,
	/// Control key held.
	pub ctrl_key: bool,
	/// Shift key held.
	pub shift_key: bool,
	/// Alt (option) key held.
	pub alt_key: bool,
	/// `preventDefault` was already called.
	pub default_prevented: bool,
	/// The anchor's `target` attribute.
	pub target: Option<String>,
}

impl ClickEvent {
	/// A plain primary-button click.
	pub fn primary() -> Self {
		Self::default()
	}

	/// Marks the event as handled.
	pub fn prevent_default(&mut self) {
		self.default_prevented = true;
	}

	/// Returns `true` if any modifier key is held.
	pub fn has_modifier(&self) -> bool {
		self.meta_key || self.ctrl_key || self.shift_key || self.alt_key
	}
}

/// Decides whether a click on a router link should be handled by the
/// router instead of the browser.
pub fn should_intercept(event: &ClickEvent) -> bool {
	event.button == 0
		&& !event.has_modifier()
		&& !event.default_prevented
		&& event.target.as_deref().is_none_or(|target| target == "_self")
}

/// Intercepts a click on an anchor pointing at `href`.
///
/// Returns `true` and navigates when the click was intercepted.
pub fn intercept_click(
	event: &mut ClickEvent,
	href: &str,
	replace: bool,
	navigator: &impl Navigate,
) -> bool {
	if !should_intercept(event) {
		return false;
	}
	event.prevent_default();
	tracing::debug!(href, replace, "Intercepted link click");
	if replace {
		navigator.replace(href);
	} else {
		navigator.push(href);
	}
	true
}

/// Application click hook, run before interception.
pub type ClickHook = Arc<dyn Fn(&mut ClickEvent) + Send + Sync>;

thread_local! {
	static CLICK_HOOKS: RefCell<Vec<ClickHook>> = const { RefCell::new(Vec::new()) };
}

/// Drops the hooks registered by the previous render on this thread.
pub fn reset_click_hooks() {
	CLICK_HOOKS.with_borrow_mut(Vec::clear);
}

fn register_click_hook(hook: &ClickHook) -> usize {
	CLICK_HOOKS.with_borrow_mut(|hooks| {
		hooks.push(hook.clone());
		hooks.len() - 1
	})
}

/// Runs the hook registered under `id`.
///
/// Returns `false` when the id is malformed or nothing is registered
/// under it.
pub fn run_click_hook(id: &str, event: &mut ClickEvent) -> bool {
	let Ok(index) = id.parse::<usize>() else {
		return false;
	};
	// Cloned out so the hook may render without re-entering the registry.
	let hook = CLICK_HOOKS.with_borrow(|hooks| hooks.get(index).cloned());
	match hook {
		Some(hook) => {
			hook(event);
			true
		}
		None => {
			tracing::debug!(id, "No click hook registered");
			false
		}
	}
}

/// Handles a click delegated from a rendered anchor.
///
/// Runs the hook named by the anchor's `data-link-hook`, if any, then
/// intercepts unless the hook or the event rule it out. Returns `true` if
/// the router navigated.
pub fn dispatch_click(
	event: &mut ClickEvent,
	href: &str,
	replace: bool,
	hook_id: Option<&str>,
	navigator: &impl Navigate,
) -> bool {
	if let Some(id) = hook_id {
		run_click_hook(id, event);
	}
	intercept_click(event, href, replace, navigator)
}

/// A router-aware anchor.
#[derive(Clone)]
pub struct Link {
	to: String,
	children: Vec<Page>,
	class: Option<String>,
	active_class: Option<String>,
	replace: bool,
	target: Option<String>,
	attrs: Vec<(String, String)>,
	on_click: Option<ClickHook>,
}

impl Link {
	/// Creates a link to `to`.
	pub fn new(to: impl Into<String>) -> Self {
		Self {
			to: to.into(),
			children: Vec::new(),
			class: None,
			active_class: None,
			replace: false,
			target: None,
			attrs: Vec::new(),
			on_click: None,
		}
	}

	/// Appends a child.
	pub fn child(mut self, child: impl IntoPage) -> Self {
		self.children.push(child.into_page());
		self
	}

	/// Appends several children.
	pub fn children(mut self, children: impl IntoIterator<Item = impl IntoPage>) -> Self {
		self.children
			.extend(children.into_iter().map(IntoPage::into_page));
		self
	}

	/// Sets the class.
	pub fn class(mut self, class: impl Into<String>) -> Self {
		self.class = Some(class.into());
		self
	}

	/// Sets the class added while the link points at the current location.
	pub fn active_class(mut self, class: impl Into<String>) -> Self {
		self.active_class = Some(class.into());
		self
	}

	/// Replaces the history entry instead of pushing one.
	pub fn replace(mut self, replace: bool) -> Self {
		self.replace = replace;
		self
	}

	/// Sets the `target` attribute.
	pub fn target(mut self, target: impl Into<String>) -> Self {
		self.target = Some(target.into());
		self
	}

	/// Adds an attribute.
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attrs.push((name.into(), value.into()));
		self
	}

	/// Sets the application click hook.
	///
	/// The hook runs before interception and may cancel it with
	/// [`ClickEvent::prevent_default`]. In the browser it is found through
	/// the anchor's `data-link-hook` id.
	pub fn on_click<F>(mut self, hook: F) -> Self
	where
		F: Fn(&mut ClickEvent) + Send + Sync + 'static,
	{
		self.on_click = Some(Arc::new(hook));
		self
	}

	/// The destination.
	pub fn to(&self) -> &str {
		&self.to
	}

	/// Returns `true` if `location`'s path equals the destination path,
	/// ignoring one trailing slash.
	pub fn is_active(&self, location: &Location) -> bool {
		fn trim(path: &str) -> &str {
			match path.strip_suffix('/') {
				Some(rest) if !rest.is_empty() => rest,
				_ => path,
			}
		}
		let target = Location::parse(&self.to);
		trim(&target.pathname) == trim(&location.pathname)
	}

	/// Renders the anchor.
	pub fn render(&self, cx: &RenderContext<'_>) -> Page {
		let active = self.is_active(cx.location);
		let class = match (&self.class, &self.active_class) {
			(Some(class), Some(active_class)) if active => Some(format!("{class} {active_class}")),
			(None, Some(active_class)) if active => Some(active_class.clone()),
			(class, _) => class.clone(),
		};

		self.anchor(class)
			.children(self.children.iter().cloned())
			.into()
	}

	fn anchor(&self, class: Option<String>) -> ElementView {
		let mut anchor = Page::element("a")
			.attr("href", self.to.clone())
			.attr_opt("class", class)
			.attr(LINK_ATTRIBUTE, "");
		if self.replace {
			anchor = anchor.attr(REPLACE_ATTRIBUTE, "");
		}
		anchor = anchor.attr_opt("target", self.target.clone());
		if let Some(hook) = &self.on_click {
			anchor = anchor.attr(HOOK_ATTRIBUTE, register_click_hook(hook).to_string());
		}
		for (name, value) in &self.attrs {
			anchor = anchor.attr(name.clone(), value.clone());
		}
		anchor
	}

	/// Handles a click: runs the application hook, then intercepts unless
	/// the hook or the event rule it out.
	///
	/// Returns `true` if the router navigated.
	pub fn click(&self, event: &mut ClickEvent, navigator: &impl Navigate) -> bool {
		if let Some(hook) = &self.on_click {
			hook(event);
		}
		if event.target.is_none() {
			event.target = self.target.clone();
		}
		intercept_click(event, &self.to, self.replace, navigator)
	}
}

impl fmt::Debug for Link {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Link")
			.field("to", &self.to)
			.field("replace", &self.replace)
			.field("target", &self.target)
			.field("has_on_click", &self.on_click.is_some())
			.finish_non_exhaustive()
	}
}

impl IntoPage for Link {
	fn into_page(self) -> Page {
		self.anchor(self.class.clone())
			.children(self.children)
			.into()
	}
}
