//! Target shims.
//!
//! Native builds run navigations on the tokio runtime and need `Send`
//! futures; the browser is single-threaded and its futures (fetch,
//! timers) are not `Send`. [`MaybeSend`] and [`MaybeSync`] resolve to
//! `Send`/`Sync` on native targets and to nothing on `wasm32`.

use std::future::Future;

/// `Send` on native targets, no bound on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + ?Sized> MaybeSend for T {}

/// `Send` on native targets, no bound on `wasm32`.
#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSend for T {}

/// `Sync` on native targets, no bound on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSync: Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Sync + ?Sized> MaybeSync for T {}

/// `Sync` on native targets, no bound on `wasm32`.
#[cfg(target_arch = "wasm32")]
pub trait MaybeSync {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSync for T {}

/// Spawns a detached background task.
///
/// Uses `tokio::spawn` on native targets (a runtime must be running) and
/// `wasm_bindgen_futures::spawn_local` in the browser.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn<F>(future: F)
where
	F: Future<Output = ()> + MaybeSend + 'static,
{
	tokio::spawn(future);
}

/// Spawns a detached background task.
#[cfg(target_arch = "wasm32")]
pub fn spawn<F>(future: F)
where
	F: Future<Output = ()> + MaybeSend + 'static,
{
	wasm_bindgen_futures::spawn_local(future);
}
