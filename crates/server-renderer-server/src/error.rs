//! Server errors.

use server_renderer_conf::{SettingsError, SourceError};
use server_renderer_ssr::TemplateError;

/// Errors raised while setting up or running the server.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// Binding or accepting failed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// The HTML template could not be loaded.
	#[error(transparent)]
	Template(#[from] TemplateError),

	/// Settings could not be built.
	#[error(transparent)]
	Settings(#[from] SettingsError),

	/// The `.env` file could not be read.
	#[error(transparent)]
	Source(#[from] SourceError),

	/// A response could not be assembled.
	#[error("Invalid response: {0}")]
	Http(#[from] http::Error),
}
