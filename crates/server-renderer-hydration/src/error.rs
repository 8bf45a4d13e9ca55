//! Hydration errors.

use server_renderer_core::{AppDataError, SelectorError};

/// Errors raised while bootstrapping the client.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum HydrationError {
	/// The server payload is absent or was already consumed.
	#[error("Initial page data not found; was the page rendered by the server?")]
	MissingPayload,

	/// The server payload could not be decoded.
	#[error("Failed to decode initial page data: {0}")]
	Decode(#[from] AppDataError),

	/// No element matches the mount selector.
	#[error("Mount point '{0}' not found in document")]
	MountPointNotFound(String),

	/// The mount selector is invalid.
	#[error(transparent)]
	Selector(#[from] SelectorError),

	/// There is no global `window`.
	#[error("No global window available")]
	NoWindow,
}
