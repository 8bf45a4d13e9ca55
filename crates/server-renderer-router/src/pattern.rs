//! Path pattern matching.
//!
//! Patterns are compiled once into anchored regexes and then tested against
//! concrete pathnames. The same compiled [`PathPattern`] values are used by
//! the server renderer and the client router, so both sides agree on which
//! route a URL selects and on its parameters.
//!
//! Supported syntax:
//! - `/users` - literal text, matched case-sensitively
//! - `/users/:id` or `/users/{id}` - a named segment (excludes `/`)
//! - `/files/:path*`, `/files/{path:*}` or `/files/*` - a trailing wildcard
//!   capturing the rest of the path, including `/` (a bare `*` is captured
//!   under the name `"*"`)

use crate::error::PatternError;
use std::collections::HashMap;
use std::fmt;

/// Maximum allowed length for a pattern string in bytes.
pub const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of path segments in a pattern.
pub const MAX_PATH_SEGMENTS: usize = 32;

/// Maximum allowed size for a compiled pattern regex (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// How a pattern treats a trailing slash on the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrailingSlash {
	/// A pattern without a trailing slash also matches a path with one
	/// (`/about` matches `/about/`), but not vice versa.
	#[default]
	Lenient,
	/// The path must reproduce the pattern's trailing slash exactly.
	Strict,
}

/// Options applied when compiling a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchOptions {
	/// Require the whole path to match. When `false` the pattern matches any
	/// path it is a prefix of, on a segment boundary (`/docs` matches
	/// `/docs/intro` but not `/docsify`).
	pub exact: bool,
	/// Trailing-slash policy.
	pub trailing_slash: TrailingSlash,
}

impl Default for MatchOptions {
	fn default() -> Self {
		Self {
			exact: true,
			trailing_slash: TrailingSlash::Lenient,
		}
	}
}

impl MatchOptions {
	/// Full-path matching with lenient trailing slashes.
	pub fn exact() -> Self {
		Self::default()
	}

	/// Prefix matching, as used by layout routes.
	pub fn prefix() -> Self {
		Self {
			exact: false,
			..Self::default()
		}
	}

	/// Sets the trailing-slash policy.
	pub fn with_trailing_slash(mut self, trailing_slash: TrailingSlash) -> Self {
		self.trailing_slash = trailing_slash;
		self
	}
}

/// Successful match of a path against a [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
	/// Named parameters.
	pub params: HashMap<String, String>,
	/// The portion of the path the pattern consumed.
	pub matched: String,
	/// Whether the pattern consumed the whole path.
	pub is_exact: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
	Literal(String),
	Param(String),
	Wildcard(String),
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
	pattern: String,
	regex: regex::Regex,
	param_names: Vec<String>,
	options: MatchOptions,
}

impl PathPattern {
	/// Compiles `pattern` with the given options.
	///
	/// # Errors
	///
	/// Returns a [`PatternError`] if the pattern:
	/// - does not start with `/`
	/// - exceeds 1024 bytes or 32 segments
	/// - has an empty, invalid or repeated parameter name
	/// - has a wildcard before its last segment or an unclosed `{`
	///
	/// # Examples
	///
	/// ```
	/// use server_renderer_router::{MatchOptions, PathPattern};
	///
	/// let pattern = PathPattern::compile("/user/:id", MatchOptions::exact()).unwrap();
	/// let m = pattern.matches("/user/42/").unwrap();
	/// assert_eq!(m.params["id"], "42");
	/// assert!(!pattern.test("/user"));
	/// ```
	pub fn compile(pattern: &str, options: MatchOptions) -> Result<Self, PatternError> {
		if !pattern.starts_with('/') {
			return Err(PatternError::MissingLeadingSlash(pattern.to_string()));
		}

		// Reject oversized patterns to bound regex compilation cost
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(PatternError::TooLong {
				len: pattern.len(),
				max: MAX_PATTERN_LENGTH,
			});
		}

		let segment_count = pattern.split('/').count();
		if segment_count > MAX_PATH_SEGMENTS {
			return Err(PatternError::TooManySegments {
				count: segment_count,
				max: MAX_PATH_SEGMENTS,
			});
		}

		let tokens = Self::tokenize(pattern)?;
		let (regex_str, param_names) = Self::build_regex(pattern, &tokens, options);

		let regex = regex::RegexBuilder::new(&regex_str)
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| PatternError::Regex(e.to_string()))?;

		Ok(Self {
			pattern: pattern.to_string(),
			regex,
			param_names,
			options,
		})
	}

	fn tokenize(pattern: &str) -> Result<Vec<Token>, PatternError> {
		let is_name_char = |c: char| c.is_ascii_alphanumeric() || c == '_';
		let invalid_name = |name: &str| PatternError::InvalidParamName {
			pattern: pattern.to_string(),
			name: name.to_string(),
		};

		let mut tokens: Vec<Token> = Vec::new();
		let mut literal = String::new();
		let mut chars = pattern.chars().peekable();

		while let Some(c) = chars.next() {
			let token = match c {
				':' => {
					let mut name = String::new();
					while let Some(&next) = chars.peek() {
						if !is_name_char(next) {
							break;
						}
						name.push(next);
						chars.next();
					}
					if name.is_empty() {
						return Err(invalid_name(&name));
					}
					if chars.peek() == Some(&'*') {
						chars.next(); // consume '*'
						Token::Wildcard(name)
					} else {
						Token::Param(name)
					}
				}
				'{' => {
					let mut body = String::new();
					let mut closed = false;
					for next in chars.by_ref() {
						if next == '}' {
							closed = true;
							break;
						}
						body.push(next);
					}
					if !closed {
						return Err(PatternError::UnclosedBrace(pattern.to_string()));
					}
					let (name, modifier) = match body.split_once(':') {
						Some((name, modifier)) => (name, Some(modifier)),
						None => (body.as_str(), None),
					};
					if name.is_empty() || !name.chars().all(is_name_char) {
						return Err(invalid_name(name));
					}
					match modifier {
						None => Token::Param(name.to_string()),
						Some("*") => Token::Wildcard(name.to_string()),
						Some(_) => return Err(invalid_name(&body)),
					}
				}
				'*' => Token::Wildcard("*".to_string()),
				_ => {
					literal.push(c);
					continue;
				}
			};

			if !literal.is_empty() {
				tokens.push(Token::Literal(std::mem::take(&mut literal)));
			}
			tokens.push(token);
		}
		if !literal.is_empty() {
			tokens.push(Token::Literal(literal));
		}

		let mut seen: Vec<&str> = Vec::new();
		for (idx, token) in tokens.iter().enumerate() {
			match token {
				Token::Wildcard(_) if idx + 1 != tokens.len() => {
					return Err(PatternError::WildcardNotLast(pattern.to_string()));
				}
				Token::Param(name) | Token::Wildcard(name) => {
					if seen.contains(&name.as_str()) {
						return Err(PatternError::DuplicateParam {
							pattern: pattern.to_string(),
							name: name.clone(),
						});
					}
					seen.push(name);
				}
				Token::Literal(_) => {}
			}
		}

		Ok(tokens)
	}

	/// Builds the anchored regex. Capture groups are named `p0`, `p1`, ...
	/// so that parameter names never have to be valid regex group names.
	fn build_regex(pattern: &str, tokens: &[Token], options: MatchOptions) -> (String, Vec<String>) {
		let mut regex_str = String::from("^");
		let mut param_names = Vec::new();

		for token in tokens {
			match token {
				Token::Literal(text) => regex_str.push_str(&regex::escape(text)),
				Token::Param(name) => {
					regex_str.push_str(&format!("(?P<p{}>[^/]+)", param_names.len()));
					param_names.push(name.clone());
				}
				Token::Wildcard(name) => {
					regex_str.push_str(&format!("(?P<p{}>.*)", param_names.len()));
					param_names.push(name.clone());
				}
			}
		}

		let has_wildcard = matches!(tokens.last(), Some(Token::Wildcard(_)));
		let ends_with_slash = pattern.ends_with('/');
		let lenient = options.trailing_slash == TrailingSlash::Lenient;

		if options.exact {
			if lenient && !ends_with_slash && !has_wildcard {
				regex_str.push_str("/?");
			}
			regex_str.push('$');
		} else if !ends_with_slash && !has_wildcard {
			// Prefix match on a segment boundary
			regex_str.push_str("(?:/|$)");
		}

		(regex_str, param_names)
	}

	/// Returns the original pattern string.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Returns the parameter names in declaration order.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Returns the options the pattern was compiled with.
	pub fn options(&self) -> MatchOptions {
		self.options
	}

	/// Checks whether `path` matches.
	pub fn test(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}

	/// Matches `path`, returning the extracted parameters.
	pub fn matches(&self, path: &str) -> Option<PathMatch> {
		let caps = self.regex.captures(path)?;

		let params = self
			.param_names
			.iter()
			.enumerate()
			.filter_map(|(idx, name)| {
				caps.name(&format!("p{}", idx))
					.map(|m| (name.clone(), m.as_str().to_string()))
			})
			.collect();

		let whole = caps.get(0).map_or("", |m| m.as_str());
		let matched = match whole.strip_suffix('/') {
			Some(stripped) if !self.options.exact && whole.len() > 1 && !self.pattern.ends_with('/') => {
				stripped
			}
			_ => whole,
		};
		let is_exact = whole.len() == path.len();

		Some(PathMatch {
			params,
			matched: matched.to_string(),
			is_exact,
		})
	}
}

impl PartialEq for PathPattern {
	fn eq(&self, other: &Self) -> bool {
		self.pattern == other.pattern && self.options == other.options
	}
}

impl Eq for PathPattern {}

impl fmt::Display for PathPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.pattern)
	}
}
