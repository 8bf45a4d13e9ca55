//! The router's current-position value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed URL position: `pathname`, `search` (with leading `?`) and
/// `hash` (with leading `#`).
///
/// Only the pathname takes part in route matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
	/// The path component, always starting with `/`.
	pub pathname: String,
	/// The query string including the leading `?`, or empty.
	pub search: String,
	/// The fragment including the leading `#`, or empty.
	pub hash: String,
}

impl Location {
	/// Parses a request target or an absolute URL into a location.
	///
	/// Scheme and authority are dropped when present; an empty path becomes
	/// `/`. A `://` after the first `/`, `?` or `#` belongs to the path or
	/// query and is left alone.
	///
	/// # Examples
	///
	/// ```
	/// use server_renderer_core::Location;
	///
	/// let loc = Location::parse("https://example.com/users/1?tab=posts#top");
	/// assert_eq!(loc.pathname, "/users/1");
	/// assert_eq!(loc.search, "?tab=posts");
	/// assert_eq!(loc.hash, "#top");
	/// ```
	pub fn parse(url: &str) -> Self {
		let first_delimiter = url.find(['/', '?', '#']).unwrap_or(url.len());
		let rest = match url.find("://") {
			Some(scheme_end) if scheme_end < first_delimiter => {
				let after = &url[scheme_end + 3..];
				match after.find(['/', '?', '#']) {
					Some(idx) => &after[idx..],
					None => "",
				}
			}
			_ => url,
		};

		let (before_hash, hash) = match rest.find('#') {
			Some(idx) => (&rest[..idx], &rest[idx..]),
			None => (rest, ""),
		};
		let (path, search) = match before_hash.find('?') {
			Some(idx) => (&before_hash[..idx], &before_hash[idx..]),
			None => (before_hash, ""),
		};

		let pathname = if path.is_empty() {
			"/".to_string()
		} else if path.starts_with('/') {
			path.to_string()
		} else {
			format!("/{}", path)
		};

		Self {
			pathname,
			search: if search == "?" { String::new() } else { search.to_string() },
			hash: if hash == "#" { String::new() } else { hash.to_string() },
		}
	}

	/// Rejoins the location into a path-absolute URL.
	pub fn href(&self) -> String {
		format!("{}{}{}", self.pathname, self.search, self.hash)
	}
}

impl Default for Location {
	fn default() -> Self {
		Self {
			pathname: "/".to_string(),
			search: String::new(),
			hash: String::new(),
		}
	}
}

impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}{}", self.pathname, self.search, self.hash)
	}
}

impl From<&str> for Location {
	fn from(url: &str) -> Self {
		Self::parse(url)
	}
}
