//! Error types for template loading and rendering.

use server_renderer_core::{AppDataError, ProtocolError, SelectorError};
use std::path::PathBuf;

/// Errors raised while loading or parsing an HTML template.
///
/// These surface at start-up, before any request is served.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
	/// The template file could not be read.
	#[error("Failed to read template {path}: {source}")]
	Io {
		/// Path that was read.
		path: PathBuf,
		/// Underlying I/O error.
		#[source]
		source: std::io::Error,
	},

	/// No element matches the mount selector.
	#[error("Mount point '{0}' not found in template")]
	MountPointNotFound(String),

	/// The mount element is never closed.
	#[error("Mount point '{0}' is not closed")]
	UnclosedMountPoint(String),

	/// The mount element is a void element and cannot hold markup.
	#[error("Mount point '{selector}' is a void <{tag}> element")]
	VoidMountPoint {
		/// Selector as written.
		selector: String,
		/// Tag of the matched element.
		tag: String,
	},

	/// The mount selector is invalid.
	#[error(transparent)]
	Selector(#[from] SelectorError),
}

/// Errors that abort a render.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
	/// Loader output could not be serialized.
	#[error(transparent)]
	Serialization(#[from] ProtocolError),

	/// The page payload could not be encoded.
	#[error("Failed to encode initial page data: {0}")]
	AppData(#[from] AppDataError),

	/// The template is unusable.
	#[error(transparent)]
	Template(#[from] TemplateError),
}
