//! Drop guard for listeners.

/// Callback run when a [`Subscription`] ends.
#[cfg(not(target_arch = "wasm32"))]
pub type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

/// Callback run when a [`Subscription`] ends.
#[cfg(target_arch = "wasm32")]
pub type Unsubscribe = Box<dyn FnOnce()>;

/// Keeps a listener registered for as long as it is alive.
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`])
/// removes the listener.
#[must_use = "dropping a Subscription immediately removes the listener"]
pub struct Subscription {
	unsubscribe: Option<Unsubscribe>,
}

impl Subscription {
	/// Creates a subscription that runs `unsubscribe` when dropped.
	pub fn new(unsubscribe: Unsubscribe) -> Self {
		Self {
			unsubscribe: Some(unsubscribe),
		}
	}

	/// A subscription with nothing to undo.
	pub fn noop() -> Self {
		Self { unsubscribe: None }
	}

	/// Removes the listener now.
	pub fn unsubscribe(mut self) {
		if let Some(f) = self.unsubscribe.take() {
			f();
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(f) = self.unsubscribe.take() {
			f();
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.unsubscribe.is_some())
			.finish()
	}
}
