//! Server-side response handle exposed to loaders.
//!
//! The renderer never writes to the socket. Loaders record what they want
//! the response to look like (status, headers, cookies, or a full
//! short-circuit such as a redirect) in a [`ResponseHandle`]; the HTTP
//! adapter turns the final [`ResponseSnapshot`] into a real response.

use http::header::{HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};
use http::{HeaderMap, StatusCode};
use parking_lot::Mutex;
use std::sync::Arc;

/// Errors raised by [`ResponseHandle`] mutations.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
	/// The response was already finalized by `redirect` or `end`.
	#[error("Response already finalized")]
	AlreadyFinalized,
	/// Header name is not a valid HTTP token.
	#[error("Invalid header name: {0}")]
	InvalidHeaderName(#[from] InvalidHeaderName),
	/// Header value contains forbidden bytes.
	#[error("Invalid header value: {0}")]
	InvalidHeaderValue(#[from] InvalidHeaderValue),
	/// Redirect requested with a non-3xx status.
	#[error("Invalid redirect status: {0}")]
	InvalidRedirectStatus(u16),
}

#[derive(Debug)]
struct ResponseState {
	status: StatusCode,
	headers: HeaderMap,
	body: Option<String>,
	finalized: bool,
}

impl Default for ResponseState {
	fn default() -> Self {
		Self {
			status: StatusCode::OK,
			headers: HeaderMap::new(),
			body: None,
			finalized: false,
		}
	}
}

/// Point-in-time copy of a response under construction.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
	/// Status code.
	pub status: StatusCode,
	/// Headers set by loaders.
	pub headers: HeaderMap,
	/// Body written by [`ResponseHandle::end`], if any.
	pub body: Option<String>,
	/// Whether the response was finalized.
	pub finalized: bool,
}

/// Shared, cloneable handle to the response of the current request.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle {
	inner: Arc<Mutex<ResponseState>>,
}

impl ResponseHandle {
	/// Creates a fresh `200 OK` response.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the current status.
	pub fn status(&self) -> StatusCode {
		self.inner.lock().status
	}

	/// Sets the status code.
	pub fn set_status(&self, status: StatusCode) -> Result<(), ResponseError> {
		let mut state = self.inner.lock();
		if state.finalized {
			return Err(ResponseError::AlreadyFinalized);
		}
		state.status = status;
		Ok(())
	}

	/// Returns a header value, if set and valid UTF-8.
	pub fn header(&self, name: &str) -> Option<String> {
		self.inner
			.lock()
			.headers
			.get(name)
			.and_then(|v| v.to_str().ok())
			.map(str::to_string)
	}

	/// Inserts a header, replacing existing values.
	pub fn insert_header(&self, name: &str, value: &str) -> Result<(), ResponseError> {
		let name = HeaderName::try_from(name)?;
		let value = HeaderValue::try_from(value)?;
		let mut state = self.inner.lock();
		if state.finalized {
			return Err(ResponseError::AlreadyFinalized);
		}
		state.headers.insert(name, value);
		Ok(())
	}

	/// Appends a `Set-Cookie` header.
	pub fn append_cookie(&self, cookie: &str) -> Result<(), ResponseError> {
		let value = HeaderValue::try_from(cookie)?;
		let mut state = self.inner.lock();
		if state.finalized {
			return Err(ResponseError::AlreadyFinalized);
		}
		state.headers.append(http::header::SET_COOKIE, value);
		Ok(())
	}

	/// Short-circuits the response with a redirect and finalizes it.
	///
	/// `status` must be a 3xx code.
	pub fn redirect(&self, location: &str, status: StatusCode) -> Result<(), ResponseError> {
		if !status.is_redirection() {
			return Err(ResponseError::InvalidRedirectStatus(status.as_u16()));
		}
		let value = HeaderValue::try_from(location)?;
		let mut state = self.inner.lock();
		if state.finalized {
			return Err(ResponseError::AlreadyFinalized);
		}
		state.status = status;
		state.headers.insert(http::header::LOCATION, value);
		state.finalized = true;
		tracing::debug!(location, status = status.as_u16(), "Response redirected by loader");
		Ok(())
	}

	/// Writes a complete body and finalizes the response.
	pub fn end(&self, body: impl Into<String>) -> Result<(), ResponseError> {
		let mut state = self.inner.lock();
		if state.finalized {
			return Err(ResponseError::AlreadyFinalized);
		}
		state.body = Some(body.into());
		state.finalized = true;
		Ok(())
	}

	/// Returns whether the response was finalized.
	pub fn is_finalized(&self) -> bool {
		self.inner.lock().finalized
	}

	/// Copies the current state.
	pub fn snapshot(&self) -> ResponseSnapshot {
		let state = self.inner.lock();
		ResponseSnapshot {
			status: state.status,
			headers: state.headers.clone(),
			body: state.body.clone(),
			finalized: state.finalized,
		}
	}
}
