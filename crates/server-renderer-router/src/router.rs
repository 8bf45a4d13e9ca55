//! Client navigation state machine.
//!
//! The [`Router`] owns the authoritative [`Location`] and the view currently
//! shown for it. A navigation moves it from [`Phase::Idle`] to
//! [`Phase::Navigating`], runs the matched component's loader in a spawned
//! task and commits the result back to `Idle`.
//!
//! Every navigation is stamped with a generation number. A result is
//! committed only while its generation is still the newest one, so a slow
//! navigation that finishes after a faster, later one never replaces it.

use crate::history::History;
use crate::root::{ResolvedView, ViewContent};
use crate::subscription::Subscription;
use crate::table::RouteTable;
use parking_lot::Mutex;
use server_renderer_core::{
	BuildProfile, GlobalAppData, Location, LoaderContext, MaybeSend, MaybeSync, PropsOutcome,
	SerializedError, resolve_initial_props, spawn,
};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;

/// Something that can navigate.
pub trait Navigate {
	/// Navigates to `to`, adding a history entry.
	fn push(&self, to: &str);

	/// Navigates to `to`, replacing the current history entry.
	fn replace(&self, to: &str);
}

/// Router phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
	/// The view matches the location.
	#[default]
	Idle,
	/// A navigation is resolving.
	Navigating {
		/// Generation of the in-flight navigation.
		generation: u64,
	},
}

impl Phase {
	/// Returns `true` while a navigation is resolving.
	pub fn is_navigating(&self) -> bool {
		matches!(self, Phase::Navigating { .. })
	}
}

/// Point-in-time copy of the router state.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterSnapshot {
	/// Current location.
	pub location: Location,
	/// Current phase.
	pub phase: Phase,
	/// The last committed view; `None` until the first resolution finishes.
	pub view: Option<ResolvedView>,
}

/// Callback invoked on every router state change.
#[cfg(not(target_arch = "wasm32"))]
pub type RouterListener = Arc<dyn Fn(&RouterSnapshot) + Send + Sync>;

/// Callback invoked on every router state change.
#[cfg(target_arch = "wasm32")]
pub type RouterListener = Arc<dyn Fn(&RouterSnapshot)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryAction {
	Push,
	Replace,
	None,
}

struct RouterState {
	location: Location,
	phase: Phase,
	view: Option<ResolvedView>,
	cancel: Option<CancellationToken>,
}

struct RouterInner {
	table: RouteTable,
	history: Arc<dyn History>,
	profile: BuildProfile,
	state: Mutex<RouterState>,
	generation: AtomicU64,
	listeners: Mutex<Vec<(u64, RouterListener)>>,
	next_listener: AtomicU64,
}

impl RouterInner {
	fn snapshot(&self) -> RouterSnapshot {
		let state = self.state.lock();
		RouterSnapshot {
			location: state.location.clone(),
			phase: state.phase,
			view: state.view.clone(),
		}
	}

	fn notify(&self) {
		let listeners: Vec<RouterListener> = self
			.listeners
			.lock()
			.iter()
			.map(|(_, listener)| listener.clone())
			.collect();
		if listeners.is_empty() {
			return;
		}
		let snapshot = self.snapshot();
		for listener in listeners {
			listener(&snapshot);
		}
	}

	fn navigate(self: &Arc<Self>, location: Location, action: HistoryAction) {
		match action {
			HistoryAction::Push => self.history.push(&location),
			HistoryAction::Replace => self.history.replace(&location),
			HistoryAction::None => {}
		}

		let token = CancellationToken::new();
		let generation = {
			let mut state = self.state.lock();
			let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
			if let Some(previous) = state.cancel.replace(token.clone()) {
				previous.cancel();
			}
			state.location = location.clone();
			state.phase = Phase::Navigating { generation };
			generation
		};

		tracing::debug!(location = %location, generation, ?action, "Navigation started");
		self.notify();

		let weak = Arc::downgrade(self);
		let table = self.table.clone();
		let profile = self.profile;
		spawn(async move {
			let view = resolve_view(&table, location, token, profile).await;
			if let Some(inner) = weak.upgrade() {
				inner.commit(generation, view);
			}
		});
	}

	fn commit(&self, generation: u64, view: ResolvedView) {
		{
			let mut state = self.state.lock();
			if self.generation.load(Ordering::SeqCst) != generation {
				tracing::debug!(
					location = %view.location,
					generation,
					"Discarding stale navigation result"
				);
				return;
			}
			state.view = Some(view);
			state.phase = Phase::Idle;
			state.cancel = None;
		}
		tracing::debug!(generation, "Navigation committed");
		self.notify();
	}
}

async fn resolve_view(
	table: &RouteTable,
	location: Location,
	token: CancellationToken,
	profile: BuildProfile,
) -> ResolvedView {
	let Some(route_match) = table.match_path(&location.pathname) else {
		return ResolvedView {
			location,
			content: ViewContent::NotFound,
		};
	};

	let cx = LoaderContext::client(location.href(), route_match.params().clone(), token);
	let content = match resolve_initial_props(route_match.component(), cx, profile).await {
		Ok(PropsOutcome::Ready(props)) => ViewContent::Matched { route_match, props },
		Ok(PropsOutcome::Failed(error)) => ViewContent::Error {
			route_match: Some(route_match),
			error,
		},
		Ok(PropsOutcome::Finalized) => ViewContent::Error {
			route_match: Some(route_match),
			error: SerializedError::new("loader finalized a response during client navigation"),
		},
		Err(err) => {
			tracing::error!(error = %err, "Client navigation failed");
			ViewContent::Error {
				route_match: Some(route_match),
				error: SerializedError::new(err.to_string()),
			}
		}
	};
	ResolvedView { location, content }
}

/// The client router.
///
/// Dropping the router unsubscribes it from history and cancels any
/// in-flight navigation.
pub struct Router {
	inner: Arc<RouterInner>,
	history_subscription: Option<Subscription>,
}

impl Router {
	/// Creates a router and resolves the current history location live.
	///
	/// The initial loader runs in a spawned task, so a runtime must be
	/// available on native targets.
	pub fn start(table: RouteTable, history: Arc<dyn History>, profile: BuildProfile) -> Self {
		let location = history.location();
		let router = Self::with_state(table, history, profile, location.clone(), None);
		router.inner.navigate(location, HistoryAction::None);
		router
	}

	/// Creates a router whose first view is rebuilt from the server payload.
	///
	/// No loader runs.
	pub fn hydrate(
		table: RouteTable,
		history: Arc<dyn History>,
		app_data: GlobalAppData,
		profile: BuildProfile,
	) -> Self {
		let location = history.location();
		let view = ResolvedView::from_app_data(&table, location.clone(), app_data);
		tracing::debug!(location = %location, "Router hydrated from server payload");
		Self::with_state(table, history, profile, location, Some(view))
	}

	fn with_state(
		table: RouteTable,
		history: Arc<dyn History>,
		profile: BuildProfile,
		location: Location,
		view: Option<ResolvedView>,
	) -> Self {
		let inner = Arc::new(RouterInner {
			table,
			history: history.clone(),
			profile,
			state: Mutex::new(RouterState {
				location,
				phase: Phase::Idle,
				view,
				cancel: None,
			}),
			generation: AtomicU64::new(0),
			listeners: Mutex::new(Vec::new()),
			next_listener: AtomicU64::new(0),
		});

		let weak = Arc::downgrade(&inner);
		let history_subscription = history.listen(Arc::new(move |location: &Location| {
			if let Some(inner) = weak.upgrade() {
				inner.navigate(location.clone(), HistoryAction::None);
			}
		}));

		Self {
			inner,
			history_subscription: Some(history_subscription),
		}
	}

	/// Navigates to `to`, adding a history entry.
	pub fn push(&self, to: &str) {
		self.inner.navigate(Location::parse(to), HistoryAction::Push);
	}

	/// Navigates to `to`, replacing the current history entry.
	pub fn replace(&self, to: &str) {
		self.inner
			.navigate(Location::parse(to), HistoryAction::Replace);
	}

	/// Current location.
	pub fn location(&self) -> Location {
		self.inner.state.lock().location.clone()
	}

	/// Current phase.
	pub fn phase(&self) -> Phase {
		self.inner.state.lock().phase
	}

	/// The last committed view.
	pub fn view(&self) -> Option<ResolvedView> {
		self.inner.state.lock().view.clone()
	}

	/// Copies the whole state.
	pub fn snapshot(&self) -> RouterSnapshot {
		self.inner.snapshot()
	}

	/// The route table.
	pub fn table(&self) -> &RouteTable {
		&self.inner.table
	}

	/// Registers `listener` for every state change until the returned
	/// subscription is dropped.
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&RouterSnapshot) + MaybeSend + MaybeSync + 'static,
	{
		let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
		self.inner
			.listeners
			.lock()
			.push((id, Arc::new(listener) as RouterListener));

		let weak = Arc::downgrade(&self.inner);
		Subscription::new(Box::new(move || {
			if let Some(inner) = weak.upgrade() {
				inner.listeners.lock().retain(|(lid, _)| *lid != id);
			}
		}))
	}

	/// A cloneable navigator for this router.
	pub fn handle(&self) -> RouterHandle {
		RouterHandle {
			inner: Arc::downgrade(&self.inner),
		}
	}
}

impl Navigate for Router {
	fn push(&self, to: &str) {
		Router::push(self, to);
	}

	fn replace(&self, to: &str) {
		Router::replace(self, to);
	}
}

impl Drop for Router {
	fn drop(&mut self) {
		if let Some(subscription) = self.history_subscription.take() {
			subscription.unsubscribe();
		}
		if let Some(token) = self.inner.state.lock().cancel.take() {
			token.cancel();
		}
	}
}

impl fmt::Debug for Router {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("Router")
			.field("location", &state.location)
			.field("phase", &state.phase)
			.finish_non_exhaustive()
	}
}

/// Cloneable navigator that does not keep the router alive.
///
/// Navigating through a handle whose router was dropped does nothing.
#[derive(Clone)]
pub struct RouterHandle {
	inner: Weak<RouterInner>,
}

impl RouterHandle {
	/// Current location, if the router is still alive.
	pub fn location(&self) -> Option<Location> {
		self.inner
			.upgrade()
			.map(|inner| inner.state.lock().location.clone())
	}
}

impl Navigate for RouterHandle {
	fn push(&self, to: &str) {
		if let Some(inner) = self.inner.upgrade() {
			inner.navigate(Location::parse(to), HistoryAction::Push);
		}
	}

	fn replace(&self, to: &str) {
		if let Some(inner) = self.inner.upgrade() {
			inner.navigate(Location::parse(to), HistoryAction::Replace);
		}
	}
}

impl fmt::Debug for RouterHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouterHandle")
			.field("alive", &(self.inner.strong_count() > 0))
			.finish()
	}
}
