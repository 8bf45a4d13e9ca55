//! The page payload handed from server to client.
//!
//! The server embeds exactly one [`GlobalAppData`] into the document as
//!
//! ```text
//! <script type="text/javascript">window.__APP_DATA__ = "<encoded>";</script>
//! ```
//!
//! where `<encoded>` is the JSON text percent-encoded with
//! [`urlencoding::encode`]. Everything except `A-Z a-z 0-9 - _ . ~` is
//! escaped, so the string literal can contain neither a quote nor `</script>`.

use crate::profile::BuildProfile;
use crate::props::PageProps;
use serde::{Deserialize, Serialize};

/// Name of the global the payload is assigned to.
pub const APP_DATA_GLOBAL: &str = "__APP_DATA__";

/// Errors encoding or decoding the embedded payload.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum AppDataError {
	/// JSON serialization or parsing failed.
	#[error("App data JSON error: {0}")]
	Json(#[from] serde_json::Error),
	/// The percent-encoding was not valid UTF-8.
	#[error("App data is not valid percent-encoded UTF-8: {0}")]
	Encoding(#[from] std::string::FromUtf8Error),
}

/// A loader failure in a form that survives the trip to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedError {
	/// Human-readable message.
	pub message: String,
	/// Error chain / backtrace, only in development builds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
}

impl SerializedError {
	/// Creates an error with a message and no stack.
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			stack: None,
		}
	}

	/// Captures an [`anyhow::Error`].
	///
	/// The message is the outermost error's `Display`; in development
	/// builds `stack` carries the `Debug` rendering, which lists the cause
	/// chain and a backtrace when one was captured.
	pub fn from_error(err: &anyhow::Error, profile: BuildProfile) -> Self {
		Self {
			message: err.to_string(),
			stack: (!profile.is_production()).then(|| format!("{:?}", err)),
		}
	}

	/// Captures a panic payload from `catch_unwind`.
	pub fn from_panic(payload: &(dyn std::any::Any + Send), profile: BuildProfile) -> Self {
		let message = if let Some(s) = payload.downcast_ref::<&str>() {
			(*s).to_string()
		} else if let Some(s) = payload.downcast_ref::<String>() {
			s.clone()
		} else {
			"loader panicked".to_string()
		};
		Self {
			stack: (!profile.is_production()).then(|| format!("panic: {}", message)),
			message,
		}
	}
}

/// The single payload embedded per page load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAppData {
	/// Props produced by the matched component's loader.
	pub page_props: PageProps,
	/// Set when the loader failed.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<SerializedError>,
}

impl GlobalAppData {
	/// Payload for a successful render.
	pub fn with_props(page_props: PageProps) -> Self {
		Self {
			page_props,
			error: None,
		}
	}

	/// Payload for a failed loader.
	pub fn with_error(error: SerializedError) -> Self {
		Self {
			page_props: crate::props::empty_props(),
			error: Some(error),
		}
	}

	/// Serializes to JSON and percent-encodes the result.
	pub fn encode(&self) -> Result<String, AppDataError> {
		let json = serde_json::to_string(self)?;
		Ok(urlencoding::encode(&json).into_owned())
	}

	/// Reverses [`GlobalAppData::encode`].
	pub fn decode(encoded: &str) -> Result<Self, AppDataError> {
		let json = urlencoding::decode(encoded)?;
		Ok(serde_json::from_str(&json)?)
	}

	/// Builds the inline `<script>` carrying this payload.
	///
	/// `attributes` are written after `type`, in order, with escaped values.
	pub fn to_script_tag<'a, I>(&self, attributes: I) -> Result<String, AppDataError>
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let encoded = self.encode()?;
		let mut tag = String::from(r#"<script type="text/javascript""#);
		for (name, value) in attributes {
			tag.push(' ');
			tag.push_str(name);
			tag.push_str("=\"");
			tag.push_str(&crate::view::escape_html(value));
			tag.push('"');
		}
		tag.push_str(&format!(r#">window.{APP_DATA_GLOBAL} = "{encoded}";</script>"#));
		Ok(tag)
	}
}
