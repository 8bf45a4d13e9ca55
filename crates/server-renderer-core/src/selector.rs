//! Mount-point selector.
//!
//! The template and the live document are searched with the same compound
//! selector so that the server injects markup exactly where the client
//! later hydrates. Only a single compound selector is supported:
//! an optional tag name, an optional `#id` and any number of `.class`
//! parts (`#root`, `main`, `div.app`, `section#root.shell`).

use std::fmt;

/// Error returned for selectors outside the supported subset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
	/// The selector string is empty.
	#[error("Mount selector is empty")]
	Empty,
	/// The selector contains a combinator, attribute or pseudo selector.
	#[error("Unsupported mount selector '{0}': only tag, #id and .class parts are allowed")]
	Unsupported(String),
}

/// A parsed compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSelector {
	source: String,
	tag: Option<String>,
	id: Option<String>,
	classes: Vec<String>,
}

impl MountSelector {
	/// Parses a selector such as `#root` or `div.app`.
	///
	/// # Examples
	///
	/// ```
	/// use server_renderer_core::MountSelector;
	///
	/// let sel = MountSelector::parse("div#root.app").unwrap();
	/// assert!(sel.matches("div", [("id", "root"), ("class", "app shell")]));
	/// assert!(!sel.matches("span", [("id", "root"), ("class", "app")]));
	/// ```
	pub fn parse(selector: &str) -> Result<Self, SelectorError> {
		let source = selector.trim();
		if source.is_empty() {
			return Err(SelectorError::Empty);
		}

		let unsupported = || SelectorError::Unsupported(source.to_string());
		let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';

		let mut tag = None;
		let mut id = None;
		let mut classes = Vec::new();

		let mut rest = source;
		let tag_len = rest.find(['#', '.']).unwrap_or(rest.len());
		if tag_len > 0 {
			let name = &rest[..tag_len];
			if !name.chars().all(is_ident) {
				return Err(unsupported());
			}
			tag = Some(name.to_ascii_lowercase());
			rest = &rest[tag_len..];
		}

		while let Some(marker) = rest.chars().next() {
			let body = &rest[1..];
			let len = body.find(['#', '.']).unwrap_or(body.len());
			let name = &body[..len];
			if name.is_empty() || !name.chars().all(is_ident) {
				return Err(unsupported());
			}
			match marker {
				'#' if id.is_none() => id = Some(name.to_string()),
				'.' => classes.push(name.to_string()),
				_ => return Err(unsupported()),
			}
			rest = &body[len..];
		}

		Ok(Self {
			source: source.to_string(),
			tag,
			id,
			classes,
		})
	}

	/// Returns the selector as written.
	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Tests an element given its tag name and attributes.
	///
	/// Tag names compare case-insensitively; ids and classes are
	/// case-sensitive.
	pub fn matches<I, K, V>(&self, tag: &str, attrs: I) -> bool
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		if let Some(expected) = &self.tag
			&& !expected.eq_ignore_ascii_case(tag)
		{
			return false;
		}

		let mut id = None;
		let mut class = None;
		for (name, value) in attrs {
			match name.as_ref() {
				"id" if id.is_none() => id = Some(value.as_ref().to_string()),
				"class" if class.is_none() => class = Some(value.as_ref().to_string()),
				_ => {}
			}
		}

		if let Some(expected) = &self.id
			&& id.as_deref() != Some(expected.as_str())
		{
			return false;
		}

		let class = class.unwrap_or_default();
		self.classes
			.iter()
			.all(|wanted| class.split_ascii_whitespace().any(|c| c == wanted))
	}
}

impl fmt::Display for MountSelector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}

impl std::str::FromStr for MountSelector {
	type Err = SelectorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("#root", "div", &[("id", "root")], true)]
	#[case("#root", "div", &[("id", "other")], false)]
	#[case(".app", "main", &[("class", "shell app")], true)]
	#[case(".app", "main", &[("class", "application")], false)]
	#[case("main", "MAIN", &[], true)]
	#[case("div#root", "span", &[("id", "root")], false)]
	#[case("div.a.b", "div", &[("class", "b a")], true)]
	#[case("div.a.b", "div", &[("class", "a")], false)]
	fn test_matches(
		#[case] selector: &str,
		#[case] tag: &str,
		#[case] attrs: &[(&str, &str)],
		#[case] expected: bool,
	) {
		// Arrange
		let sel = MountSelector::parse(selector).unwrap();

		// Act
		let matched = sel.matches(tag, attrs.iter().copied());

		// Assert
		assert_eq!(matched, expected);
	}

	#[rstest]
	#[case("")]
	#[case("   ")]
	fn test_empty_selector(#[case] input: &str) {
		assert_eq!(MountSelector::parse(input), Err(SelectorError::Empty));
	}

	#[rstest]
	#[case("div > p")]
	#[case("[data-root]")]
	#[case("#a#b")]
	#[case("div:first-child")]
	#[case("#")]
	fn test_unsupported_selector(#[case] input: &str) {
		assert!(matches!(
			MountSelector::parse(input),
			Err(SelectorError::Unsupported(_))
		));
	}
}
