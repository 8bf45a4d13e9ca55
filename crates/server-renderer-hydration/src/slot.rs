//! The one-shot initial data slot.
//!
//! The server embeds exactly one [`GlobalAppData`] per page. The client
//! reads it once through [`AppDataSlot::take`], which consumes the slot so
//! the payload cannot be read twice. [`WindowSource`] also deletes the
//! global after reading it.

use crate::error::HydrationError;
use regex::Regex;
use server_renderer_core::GlobalAppData;
use std::sync::LazyLock;

static PAYLOAD_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"window\.__APP_DATA__\s*=\s*"([A-Za-z0-9\-_.~%]*)""#).unwrap()
});

/// Somewhere the encoded payload can be read from.
pub trait AppDataSource {
	/// Removes and returns the encoded payload.
	fn take_payload(&mut self) -> Option<String>;
}

/// Reads the payload out of an HTML document string.
#[derive(Debug, Clone)]
pub struct DocumentSource {
	html: Option<String>,
}

impl DocumentSource {
	/// Wraps a server-rendered document.
	pub fn new(html: impl Into<String>) -> Self {
		Self {
			html: Some(html.into()),
		}
	}
}

impl AppDataSource for DocumentSource {
	fn take_payload(&mut self) -> Option<String> {
		let html = self.html.take()?;
		PAYLOAD_RE
			.captures(&html)
			.and_then(|caps| caps.get(1))
			.map(|m| m.as_str().to_string())
	}
}

#[cfg(target_arch = "wasm32")]
pub use window::WindowSource;

#[cfg(target_arch = "wasm32")]
mod window {
	use super::AppDataSource;
	use server_renderer_core::APP_DATA_GLOBAL;
	use wasm_bindgen::JsValue;

	/// Reads `window.__APP_DATA__` and deletes it.
	#[derive(Debug, Clone, Copy, Default)]
	pub struct WindowSource;

	impl AppDataSource for WindowSource {
		fn take_payload(&mut self) -> Option<String> {
			let window = web_sys::window()?;
			let key = JsValue::from_str(APP_DATA_GLOBAL);
			let value = js_sys::Reflect::get(&window, &key).ok()?;
			if js_sys::Reflect::delete_property(&window, &key).is_err() {
				tracing::warn!("Failed to delete window.{}", APP_DATA_GLOBAL);
			}
			value.as_string()
		}
	}
}

/// Consumable handle to the embedded payload.
#[derive(Debug)]
pub struct AppDataSlot<S> {
	source: S,
}

impl<S: AppDataSource> AppDataSlot<S> {
	/// Wraps a source.
	pub fn new(source: S) -> Self {
		Self { source }
	}

	/// Reads and decodes the payload, consuming the slot.
	///
	/// # Errors
	///
	/// [`HydrationError::MissingPayload`] when the source holds nothing,
	/// [`HydrationError::Decode`] when it holds something undecodable.
	pub fn take(mut self) -> Result<GlobalAppData, HydrationError> {
		let payload = self
			.source
			.take_payload()
			.ok_or(HydrationError::MissingPayload)?;
		let data = GlobalAppData::decode(&payload)?;
		tracing::debug!(has_error = data.error.is_some(), "Initial page data consumed");
		Ok(data)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use server_renderer_core::SerializedError;

	#[rstest]
	fn test_take_decodes_embedded_payload() {
		// Arrange
		let data = GlobalAppData::with_props(json!({ "name": "日本", "n": null }));
		let script = data.to_script_tag([]).unwrap();
		let html = format!("<body><div id=\"root\"></div>{script}</body>");

		// Act
		let taken = AppDataSlot::new(DocumentSource::new(html)).take().unwrap();

		// Assert
		assert_eq!(taken, data);
	}

	#[rstest]
	fn test_take_error_payload() {
		let data = GlobalAppData::with_error(SerializedError::new("boom"));
		let html = data.to_script_tag([("nonce", "n1")]).unwrap();

		let taken = AppDataSlot::new(DocumentSource::new(html)).take().unwrap();

		assert_eq!(taken.error.unwrap().message, "boom");
	}

	#[rstest]
	fn test_source_yields_payload_once() {
		let html = GlobalAppData::with_props(json!({})).to_script_tag([]).unwrap();
		let mut source = DocumentSource::new(html);

		assert!(source.take_payload().is_some());
		assert!(source.take_payload().is_none());
	}

	#[rstest]
	fn test_missing_payload() {
		let result = AppDataSlot::new(DocumentSource::new("<body></body>")).take();
		assert!(matches!(result, Err(HydrationError::MissingPayload)));
	}

	#[rstest]
	fn test_undecodable_payload() {
		let html = r#"<script>window.__APP_DATA__ = "%7Bnot-json";</script>"#;
		let result = AppDataSlot::new(DocumentSource::new(html)).take();
		assert!(matches!(result, Err(HydrationError::Decode(_))));
	}
}
