//! Initial-props protocol.
//!
//! A component may declare a loader that produces its [`PageProps`] before
//! it renders. The protocol guarantees:
//!
//! - no loader means `{}`;
//! - a declared loader is invoked exactly once per resolution, with a
//!   [`LoaderContext`] that carries the live request and response on the
//!   server and neither on the client;
//! - loader failures (errors and panics) are captured as a
//!   [`SerializedError`] instead of failing the caller;
//! - a loader that finalized the response (redirect, custom body) stops
//!   rendering with [`PropsOutcome::Finalized`];
//! - props that cannot be converted to JSON are a programming error and
//!   surface as [`ProtocolError::Serialization`].

use crate::component::PageComponent;
use crate::data::SerializedError;
use crate::location::Location;
use crate::platform::{MaybeSend, MaybeSync};
use crate::profile::BuildProfile;
use crate::response::ResponseHandle;
use async_trait::async_trait;
use futures::FutureExt;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Props handed to a component: any JSON value.
pub type PageProps = serde_json::Value;

/// Returns `{}`, the props of a component without a loader.
pub fn empty_props() -> PageProps {
	serde_json::Value::Object(serde_json::Map::new())
}

/// Context passed to a loader.
#[derive(Debug, Clone)]
pub struct LoaderContext {
	url: String,
	location: Location,
	params: HashMap<String, String>,
	request: Option<Arc<http::request::Parts>>,
	response: Option<ResponseHandle>,
	cancellation: CancellationToken,
}

impl LoaderContext {
	/// Context for a server render: request and response are present.
	pub fn server(
		url: impl Into<String>,
		params: HashMap<String, String>,
		request: Option<Arc<http::request::Parts>>,
		response: ResponseHandle,
	) -> Self {
		let url = url.into();
		Self {
			location: Location::parse(&url),
			url,
			params,
			request,
			response: Some(response),
			cancellation: CancellationToken::new(),
		}
	}

	/// Context for a client navigation: no request or response.
	pub fn client(
		url: impl Into<String>,
		params: HashMap<String, String>,
		cancellation: CancellationToken,
	) -> Self {
		let url = url.into();
		Self {
			location: Location::parse(&url),
			url,
			params,
			request: None,
			response: None,
			cancellation,
		}
	}

	/// The URL being resolved, as given.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// The parsed location of [`LoaderContext::url`].
	pub fn location(&self) -> &Location {
		&self.location
	}

	/// Route parameters.
	pub fn params(&self) -> &HashMap<String, String> {
		&self.params
	}

	/// A single route parameter.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name).map(String::as_str)
	}

	/// The incoming request head (server only).
	pub fn req(&self) -> Option<&http::request::Parts> {
		self.request.as_deref()
	}

	/// The response under construction (server only).
	pub fn res(&self) -> Option<&ResponseHandle> {
		self.response.as_ref()
	}

	/// Returns `true` when running inside a server render.
	pub fn is_server(&self) -> bool {
		self.response.is_some()
	}

	/// Token cancelled when a newer client navigation supersedes this one.
	///
	/// Honoring it is optional; results of superseded navigations are
	/// discarded either way.
	pub fn cancellation(&self) -> &CancellationToken {
		&self.cancellation
	}
}

/// Failure returned by a loader.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
	/// The loader failed; captured and shown through the error view.
	#[error(transparent)]
	Failed(#[from] anyhow::Error),
	/// The loader's output could not be converted to JSON.
	#[error("Page props are not serializable: {0}")]
	Serialization(#[source] serde_json::Error),
}

/// Errors that escape the protocol instead of being captured.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
	/// Loader output is not JSON-serializable.
	#[error("Page props of component '{component}' are not serializable: {source}")]
	Serialization {
		/// Component whose loader produced the value.
		component: String,
		/// Underlying serializer error.
		#[source]
		source: serde_json::Error,
	},
}

/// A component's asynchronous initial-data hook.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait InitialPropsLoader: MaybeSend + MaybeSync {
	/// Produces the page props for `cx`.
	async fn load(&self, cx: LoaderContext) -> Result<PageProps, LoaderError>;
}

/// Adapter turning an async closure into an [`InitialPropsLoader`].
pub struct FnLoader<F>(F);

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<F, Fut, T> InitialPropsLoader for FnLoader<F>
where
	F: Fn(LoaderContext) -> Fut + MaybeSend + MaybeSync,
	Fut: Future<Output = anyhow::Result<T>> + MaybeSend,
	T: Serialize + MaybeSend,
{
	async fn load(&self, cx: LoaderContext) -> Result<PageProps, LoaderError> {
		let value = (self.0)(cx).await?;
		serde_json::to_value(value).map_err(LoaderError::Serialization)
	}
}

/// Wraps an async closure as a shared loader.
///
/// # Examples
///
/// ```
/// use server_renderer_core::{loader_fn, Page, PageComponent};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct UserProps {
///     id: String,
/// }
///
/// let user = PageComponent::new("User", |cx| Page::text(cx.prop_str("id").unwrap_or("").to_string()))
///     .with_loader(loader_fn(|cx| async move {
///         Ok(UserProps { id: cx.param("id").unwrap_or_default().to_string() })
///     }));
/// assert!(user.has_initial_props());
/// ```
pub fn loader_fn<F, Fut, T>(f: F) -> Arc<dyn InitialPropsLoader>
where
	F: Fn(LoaderContext) -> Fut + MaybeSend + MaybeSync + 'static,
	Fut: Future<Output = anyhow::Result<T>> + MaybeSend + 'static,
	T: Serialize + MaybeSend + 'static,
{
	Arc::new(FnLoader(f))
}

/// Result of running the protocol for one component.
#[derive(Debug, Clone, PartialEq)]
pub enum PropsOutcome {
	/// Props are ready; render the component.
	Ready(PageProps),
	/// The loader failed; render the error view.
	Failed(SerializedError),
	/// The loader finalized the response; do not render.
	Finalized,
}

/// Runs the initial-props protocol for `component`.
///
/// See the module documentation for the guarantees.
pub async fn resolve_initial_props(
	component: &PageComponent,
	cx: LoaderContext,
	profile: BuildProfile,
) -> Result<PropsOutcome, ProtocolError> {
	let Some(loader) = component.loader() else {
		return Ok(PropsOutcome::Ready(empty_props()));
	};

	let response = cx.res().cloned();
	tracing::debug!(
		component = component.name(),
		url = cx.url(),
		server = cx.is_server(),
		"Running initial props loader"
	);

	let result = AssertUnwindSafe(loader.load(cx)).catch_unwind().await;
	let finalized = response.as_ref().is_some_and(ResponseHandle::is_finalized);

	let outcome = match result {
		Ok(Ok(_)) | Ok(Err(LoaderError::Failed(_))) | Err(_) if finalized => {
			tracing::debug!(component = component.name(), "Response finalized by loader");
			PropsOutcome::Finalized
		}
		Ok(Ok(props)) => PropsOutcome::Ready(props),
		Ok(Err(LoaderError::Failed(err))) => {
			tracing::warn!(component = component.name(), error = %err, "Initial props loader failed");
			PropsOutcome::Failed(SerializedError::from_error(&err, profile))
		}
		Ok(Err(LoaderError::Serialization(source))) => {
			return Err(ProtocolError::Serialization {
				component: component.name().to_string(),
				source,
			});
		}
		Err(panic) => {
			let error = SerializedError::from_panic(panic.as_ref(), profile);
			tracing::warn!(component = component.name(), error = %error.message, "Initial props loader panicked");
			PropsOutcome::Failed(error)
		}
	};
	Ok(outcome)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::view::Page;
	use http::StatusCode;
	use rstest::rstest;
	use serde_json::json;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn component_with<F, Fut>(loader: F) -> PageComponent
	where
		F: Fn(LoaderContext) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<serde_json::Value>> + Send + 'static,
	{
		PageComponent::new("Test", |_| Page::empty()).with_loader(loader_fn(loader))
	}

	fn server_cx(url: &str) -> (LoaderContext, ResponseHandle) {
		let res = ResponseHandle::new();
		(
			LoaderContext::server(url, HashMap::new(), None, res.clone()),
			res,
		)
	}

	#[rstest]
	#[tokio::test]
	async fn test_no_loader_yields_empty_object() {
		// Arrange
		let component = PageComponent::new("Plain", |_| Page::empty());
		let (cx, _) = server_cx("/");

		// Act
		let outcome = resolve_initial_props(&component, cx, BuildProfile::Development)
			.await
			.unwrap();

		// Assert
		assert_eq!(outcome, PropsOutcome::Ready(json!({})));
	}

	#[rstest]
	#[tokio::test]
	async fn test_loader_called_once_with_context() {
		// Arrange
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = calls.clone();
		let component = component_with(move |cx| {
			counter.fetch_add(1, Ordering::SeqCst);
			async move {
				Ok(json!({
					"url": cx.url(),
					"server": cx.is_server(),
					"id": cx.param("id"),
				}))
			}
		});
		let cx = LoaderContext::server(
			"/users/9?x=1",
			HashMap::from([("id".to_string(), "9".to_string())]),
			None,
			ResponseHandle::new(),
		);

		// Act
		let outcome = resolve_initial_props(&component, cx, BuildProfile::Development)
			.await
			.unwrap();

		// Assert
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(
			outcome,
			PropsOutcome::Ready(json!({ "url": "/users/9?x=1", "server": true, "id": "9" }))
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_client_context_has_no_request_or_response() {
		let component = component_with(|cx| async move {
			Ok(json!({ "server": cx.is_server(), "req": cx.req().is_some() }))
		});
		let cx = LoaderContext::client("/a", HashMap::new(), CancellationToken::new());

		let outcome = resolve_initial_props(&component, cx, BuildProfile::Development)
			.await
			.unwrap();

		assert_eq!(
			outcome,
			PropsOutcome::Ready(json!({ "server": false, "req": false }))
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_loader_error_is_captured() {
		// Arrange
		let component = component_with(|_| async { Err(anyhow::anyhow!("boom")) });
		let (cx, _) = server_cx("/");

		// Act
		let outcome = resolve_initial_props(&component, cx, BuildProfile::Production)
			.await
			.unwrap();

		// Assert
		assert_eq!(outcome, PropsOutcome::Failed(SerializedError::new("boom")));
	}

	#[rstest]
	#[tokio::test]
	async fn test_loader_panic_is_captured() {
		let component = component_with(|_| async {
			if true {
				panic!("kaboom");
			}
			Ok(json!({}))
		});
		let (cx, _) = server_cx("/");

		let outcome = resolve_initial_props(&component, cx, BuildProfile::Development)
			.await
			.unwrap();

		match outcome {
			PropsOutcome::Failed(err) => {
				assert_eq!(err.message, "kaboom");
				assert!(err.stack.is_some());
			}
			other => panic!("expected failure, got {:?}", other),
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_redirect_inside_loader_finalizes() {
		// Arrange
		let component = component_with(|cx| async move {
			if let Some(res) = cx.res() {
				res.redirect("/login", StatusCode::FOUND)?;
			}
			Ok(json!({}))
		});
		let (cx, res) = server_cx("/private");

		// Act
		let outcome = resolve_initial_props(&component, cx, BuildProfile::Development)
			.await
			.unwrap();

		// Assert
		assert_eq!(outcome, PropsOutcome::Finalized);
		assert_eq!(res.status(), StatusCode::FOUND);
	}

	#[rstest]
	#[tokio::test]
	async fn test_failed_loader_after_finalize_does_not_render() {
		let component = component_with(|cx| async move {
			if let Some(res) = cx.res() {
				res.end("custom")?;
			}
			Err(anyhow::anyhow!("late failure"))
		});
		let (cx, _) = server_cx("/");

		let outcome = resolve_initial_props(&component, cx, BuildProfile::Development)
			.await
			.unwrap();

		assert_eq!(outcome, PropsOutcome::Finalized);
	}

	#[rstest]
	#[tokio::test]
	async fn test_unserializable_props_escape_as_error() {
		struct Unserializable;
		impl Serialize for Unserializable {
			fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
				Err(serde::ser::Error::custom("cannot serialize"))
			}
		}
		let component = PageComponent::new("Bad", |_| Page::empty())
			.with_loader(loader_fn(|_| async { Ok(Unserializable) }));
		let (cx, _) = server_cx("/");

		let result = resolve_initial_props(&component, cx, BuildProfile::Development).await;

		assert!(matches!(
			result,
			Err(ProtocolError::Serialization { ref component, .. }) if component == "Bad"
		));
	}
}
