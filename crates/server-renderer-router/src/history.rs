//! Session history backends.
//!
//! The router talks to history through the [`History`] trait:
//! - [`MemoryHistory`] keeps entries in memory (server-side use, tests,
//!   non-browser hosts).
//! - `BrowserHistory` (wasm32 only) drives `window.history` and listens to
//!   `popstate`.
//!
//! `push`/`replace` never notify listeners, mirroring the browser where
//! `pushState` fires no event. Only back/forward traversal does.

use crate::subscription::Subscription;
use parking_lot::Mutex;
use server_renderer_core::{Location, MaybeSend, MaybeSync};
use std::sync::{Arc, Weak};

/// Callback invoked with the new location on back/forward traversal.
#[cfg(not(target_arch = "wasm32"))]
pub type HistoryListener = Arc<dyn Fn(&Location) + Send + Sync>;

/// Callback invoked with the new location on back/forward traversal.
#[cfg(target_arch = "wasm32")]
pub type HistoryListener = Arc<dyn Fn(&Location)>;

/// A session history.
pub trait History: MaybeSend + MaybeSync {
	/// Returns the current location.
	fn location(&self) -> Location;

	/// Pushes a new entry, dropping any forward entries.
	fn push(&self, location: &Location);

	/// Replaces the current entry.
	fn replace(&self, location: &Location);

	/// Registers a traversal listener until the returned subscription is
	/// dropped.
	fn listen(&self, listener: HistoryListener) -> Subscription;
}

struct MemoryState {
	entries: Vec<Location>,
	index: usize,
	listeners: Vec<(u64, HistoryListener)>,
	next_id: u64,
}

/// In-memory history.
///
/// Cloning yields another handle to the same stack.
#[derive(Clone)]
pub struct MemoryHistory {
	state: Arc<Mutex<MemoryState>>,
}

impl MemoryHistory {
	/// Creates a history with a single entry.
	pub fn new(initial: impl Into<Location>) -> Self {
		Self {
			state: Arc::new(Mutex::new(MemoryState {
				entries: vec![initial.into()],
				index: 0,
				listeners: Vec::new(),
				next_id: 0,
			})),
		}
	}

	/// Moves `delta` entries through the stack and notifies listeners.
	///
	/// Returns `false` without notifying when the target is out of range.
	pub fn go(&self, delta: isize) -> bool {
		let (location, listeners) = {
			let mut state = self.state.lock();
			let Some(target) = state.index.checked_add_signed(delta) else {
				return false;
			};
			if target >= state.entries.len() || delta == 0 {
				return false;
			}
			state.index = target;
			let listeners: Vec<HistoryListener> =
				state.listeners.iter().map(|(_, l)| l.clone()).collect();
			(state.entries[target].clone(), listeners)
		};

		tracing::debug!(location = %location, delta, "History traversal");
		for listener in listeners {
			listener(&location);
		}
		true
	}

	/// Goes one entry back.
	pub fn back(&self) -> bool {
		self.go(-1)
	}

	/// Goes one entry forward.
	pub fn forward(&self) -> bool {
		self.go(1)
	}

	/// Number of registered listeners.
	pub fn listener_count(&self) -> usize {
		self.state.lock().listeners.len()
	}

	/// All entries, oldest first.
	pub fn entries(&self) -> Vec<Location> {
		self.state.lock().entries.clone()
	}

	/// Index of the current entry.
	pub fn index(&self) -> usize {
		self.state.lock().index
	}
}

impl Default for MemoryHistory {
	fn default() -> Self {
		Self::new(Location::default())
	}
}

impl std::fmt::Debug for MemoryHistory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.lock();
		f.debug_struct("MemoryHistory")
			.field("entries", &state.entries)
			.field("index", &state.index)
			.field("listeners", &state.listeners.len())
			.finish()
	}
}

impl History for MemoryHistory {
	fn location(&self) -> Location {
		let state = self.state.lock();
		state.entries[state.index].clone()
	}

	fn push(&self, location: &Location) {
		let mut state = self.state.lock();
		let keep = state.index + 1;
		state.entries.truncate(keep);
		state.entries.push(location.clone());
		state.index = keep;
	}

	fn replace(&self, location: &Location) {
		let mut state = self.state.lock();
		let index = state.index;
		state.entries[index] = location.clone();
	}

	fn listen(&self, listener: HistoryListener) -> Subscription {
		let id = {
			let mut state = self.state.lock();
			let id = state.next_id;
			state.next_id += 1;
			state.listeners.push((id, listener));
			id
		};

		let weak: Weak<Mutex<MemoryState>> = Arc::downgrade(&self.state);
		Subscription::new(Box::new(move || {
			if let Some(state) = weak.upgrade() {
				state.lock().listeners.retain(|(lid, _)| *lid != id);
			}
		}))
	}
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserHistory;

#[cfg(target_arch = "wasm32")]
mod browser {
	use super::{History, HistoryListener};
	use crate::subscription::Subscription;
	use server_renderer_core::Location;
	use wasm_bindgen::JsCast;
	use wasm_bindgen::prelude::*;

	/// History backed by `window.history`.
	#[derive(Debug, Clone)]
	pub struct BrowserHistory {
		window: web_sys::Window,
	}

	impl BrowserHistory {
		/// Binds to the global window, if any.
		pub fn new() -> Option<Self> {
			web_sys::window().map(|window| Self { window })
		}

		fn read_location(window: &web_sys::Window) -> Location {
			let loc = window.location();
			Location {
				pathname: loc.pathname().unwrap_or_else(|_| "/".to_string()),
				search: loc.search().unwrap_or_default(),
				hash: loc.hash().unwrap_or_default(),
			}
		}
	}

	impl History for BrowserHistory {
		fn location(&self) -> Location {
			Self::read_location(&self.window)
		}

		fn push(&self, location: &Location) {
			let result = self.window.history().and_then(|history| {
				history.push_state_with_url(&JsValue::NULL, "", Some(&location.href()))
			});
			if let Err(err) = result {
				tracing::error!(?err, "history.pushState failed");
			}
		}

		fn replace(&self, location: &Location) {
			let result = self.window.history().and_then(|history| {
				history.replace_state_with_url(&JsValue::NULL, "", Some(&location.href()))
			});
			if let Err(err) = result {
				tracing::error!(?err, "history.replaceState failed");
			}
		}

		fn listen(&self, listener: HistoryListener) -> Subscription {
			let window = self.window.clone();
			let closure = Closure::wrap(Box::new(move |_event: web_sys::PopStateEvent| {
				listener(&BrowserHistory::read_location(&window));
			}) as Box<dyn FnMut(_)>);

			if let Err(err) = self
				.window
				.add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref())
			{
				tracing::error!(?err, "Failed to register popstate listener");
				return Subscription::noop();
			}

			let window = self.window.clone();
			Subscription::new(Box::new(move || {
				let _ = window.remove_event_listener_with_callback(
					"popstate",
					closure.as_ref().unchecked_ref(),
				);
				drop(closure);
			}))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[rstest]
	fn test_push_and_replace() {
		// Arrange
		let history = MemoryHistory::new("/");

		// Act
		history.push(&Location::parse("/a"));
		history.push(&Location::parse("/b"));
		history.replace(&Location::parse("/c"));

		// Assert
		let paths: Vec<_> = history.entries().into_iter().map(|l| l.pathname).collect();
		assert_eq!(paths, vec!["/", "/a", "/c"]);
		assert_eq!(history.location().pathname, "/c");
	}

	#[rstest]
	fn test_push_drops_forward_entries() {
		let history = MemoryHistory::new("/");
		history.push(&Location::parse("/a"));
		history.push(&Location::parse("/b"));
		assert!(history.back());
		assert!(history.back());

		history.push(&Location::parse("/z"));

		let paths: Vec<_> = history.entries().into_iter().map(|l| l.pathname).collect();
		assert_eq!(paths, vec!["/", "/z"]);
		assert_eq!(history.index(), 1);
	}

	#[rstest]
	fn test_traversal_notifies_listeners() {
		// Arrange
		let history = MemoryHistory::new("/");
		history.push(&Location::parse("/a"));
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = seen.clone();
		let _sub = history.listen(Arc::new(move |loc: &Location| {
			sink.lock().push(loc.pathname.clone());
		}));

		// Act
		history.back();
		history.forward();
		let beyond = history.forward();

		// Assert
		assert!(!beyond);
		assert_eq!(*seen.lock(), vec!["/", "/a"]);
	}

	#[rstest]
	fn test_push_does_not_notify() {
		let history = MemoryHistory::new("/");
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = calls.clone();
		let _sub = history.listen(Arc::new(move |_: &Location| {
			counter.fetch_add(1, Ordering::SeqCst);
		}));

		history.push(&Location::parse("/a"));

		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[rstest]
	fn test_dropping_subscription_removes_listener() {
		let history = MemoryHistory::default();
		let sub = history.listen(Arc::new(|_: &Location| {}));
		assert_eq!(history.listener_count(), 1);

		drop(sub);

		assert_eq!(history.listener_count(), 0);
	}
}
