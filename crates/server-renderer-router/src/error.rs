//! Router error types.

/// Errors raised while compiling a route pattern.
///
/// These are configuration errors: they surface when the route table is
/// built, before any request is served.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
	/// Pattern does not start with `/`.
	#[error("Pattern '{0}' must start with '/'")]
	MissingLeadingSlash(String),
	/// Pattern exceeds the maximum length.
	#[error("Pattern length {len} exceeds maximum allowed length of {max} bytes")]
	TooLong {
		/// Actual length.
		len: usize,
		/// Allowed length.
		max: usize,
	},
	/// Pattern has too many path segments.
	#[error("Pattern has {count} path segments, exceeding maximum of {max}")]
	TooManySegments {
		/// Actual segment count.
		count: usize,
		/// Allowed segment count.
		max: usize,
	},
	/// A parameter has an empty or invalid name.
	#[error("Invalid parameter name '{name}' in pattern '{pattern}'")]
	InvalidParamName {
		/// The pattern.
		pattern: String,
		/// The offending name.
		name: String,
	},
	/// The same parameter name appears twice.
	#[error("Duplicate parameter '{name}' in pattern '{pattern}'")]
	DuplicateParam {
		/// The pattern.
		pattern: String,
		/// The repeated name.
		name: String,
	},
	/// A wildcard appears before the end of the pattern.
	#[error("Wildcard must be the last segment of pattern '{0}'")]
	WildcardNotLast(String),
	/// A `{` has no matching `}`.
	#[error("Unclosed '{{' in pattern '{0}'")]
	UnclosedBrace(String),
	/// The generated regex failed to compile.
	#[error("Failed to compile pattern regex: {0}")]
	Regex(String),
}
