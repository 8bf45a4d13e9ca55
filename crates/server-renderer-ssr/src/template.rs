//! HTML template handling.
//!
//! The template (usually the client build's `index.html`) is scanned once
//! at start-up. Scanning records three byte offsets:
//! - the inner range of the mount-point element,
//! - the first `<script` tag outside the mount point,
//! - the first `</body>` outside the mount point.
//!
//! Rendering then splices the application markup and the data script into
//! the original source at those offsets. Every other byte of the template
//! is written back unchanged.

use crate::error::TemplateError;
use regex::{Captures, Regex};
use server_renderer_core::MountSelector;
use server_renderer_core::view::is_void_element;
use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r#"(?s)<!--.*?-->|<![^>]*>|<\?[^>]*>|</(?P<close>[A-Za-z][A-Za-z0-9:-]*)\s*>|<(?P<open>[A-Za-z][A-Za-z0-9:-]*)(?P<attrs>(?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)\s*/?>"#,
	)
	.unwrap()
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#).unwrap()
});

static PLACEHOLDER_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"%([A-Za-z_][A-Za-z0-9_]*)%").unwrap());

/// Elements whose content is raw text and never contains tags.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

enum MountScan {
	Searching,
	Inside {
		tag: String,
		inner_start: usize,
		depth: usize,
	},
	Found(Range<usize>),
}

/// A parsed, immutable HTML template.
#[derive(Debug, Clone)]
pub struct HtmlTemplate {
	source: String,
	selector: MountSelector,
	mount: Range<usize>,
	script_at: Option<usize>,
	body_close_at: Option<usize>,
}

impl HtmlTemplate {
	/// Parses `source`, locating the element matched by `selector`.
	///
	/// # Errors
	///
	/// Returns [`TemplateError`] when the mount point is missing, unclosed
	/// or a void element.
	///
	/// # Examples
	///
	/// ```
	/// use server_renderer_core::MountSelector;
	/// use server_renderer_ssr::HtmlTemplate;
	///
	/// let selector = MountSelector::parse("#root").unwrap();
	/// let template = HtmlTemplate::parse(
	///     r#"<body><div id="root">loading</div></body>"#,
	///     &selector,
	/// )
	/// .unwrap();
	/// let html = template.render("<p>hi</p>", "<script></script>");
	/// assert_eq!(html, r#"<body><div id="root"><p>hi</p></div><script></script></body>"#);
	/// ```
	pub fn parse(source: impl Into<String>, selector: &MountSelector) -> Result<Self, TemplateError> {
		let source = source.into();
		let lower = source.to_ascii_lowercase();

		let mut state = MountScan::Searching;
		let mut script_at = None;
		let mut body_close_at = None;
		let mut pos = 0;

		while let Some(caps) = TAG_RE.captures_at(&source, pos) {
			let Some(whole) = caps.get(0) else {
				break;
			};
			pos = whole.end();
			let inside = matches!(state, MountScan::Inside { .. });

			if let Some(close) = caps.name("close") {
				let name = close.as_str().to_ascii_lowercase();
				match &mut state {
					MountScan::Inside {
						tag,
						inner_start,
						depth,
					} if *tag == name => {
						*depth -= 1;
						if *depth == 0 {
							let range = *inner_start..whole.start();
							state = MountScan::Found(range);
						}
					}
					MountScan::Inside { .. } => {}
					_ if name == "body" && body_close_at.is_none() => {
						body_close_at = Some(whole.start());
					}
					_ => {}
				}
				continue;
			}

			let Some(open) = caps.name("open") else {
				// Comment, doctype or processing instruction.
				continue;
			};
			let name = open.as_str().to_ascii_lowercase();
			let void = is_void_element(&name);

			if matches!(state, MountScan::Searching) {
				let attrs = caps.name("attrs").map_or("", |m| m.as_str());
				if selector.matches(&name, parse_attributes(attrs)) {
					if void {
						return Err(TemplateError::VoidMountPoint {
							selector: selector.as_str().to_string(),
							tag: name,
						});
					}
					state = MountScan::Inside {
						tag: name.clone(),
						inner_start: whole.end(),
						depth: 1,
					};
				}
			} else if let MountScan::Inside { tag, depth, .. } = &mut state
				&& *tag == name
				&& !void
			{
				*depth += 1;
			}

			if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
				if name == "script" && !inside && script_at.is_none() {
					script_at = Some(whole.start());
				}
				pos = lower[pos..]
					.find(&format!("</{name}"))
					.map_or(source.len(), |offset| pos + offset);
			}
		}

		let mount = match state {
			MountScan::Found(range) => range,
			MountScan::Inside { .. } => {
				return Err(TemplateError::UnclosedMountPoint(
					selector.as_str().to_string(),
				));
			}
			MountScan::Searching => {
				return Err(TemplateError::MountPointNotFound(
					selector.as_str().to_string(),
				));
			}
		};

		tracing::debug!(
			selector = selector.as_str(),
			mount_start = mount.start,
			mount_end = mount.end,
			has_script = script_at.is_some(),
			has_body = body_close_at.is_some(),
			"Template parsed"
		);

		Ok(Self {
			source,
			selector: selector.clone(),
			mount,
			script_at,
			body_close_at,
		})
	}

	/// Parses `source` with a selector given as text.
	pub fn new(source: impl Into<String>, selector: &str) -> Result<Self, TemplateError> {
		let selector = MountSelector::parse(selector)?;
		Self::parse(source, &selector)
	}

	/// Replaces `%KEY%` placeholders with `vars`, then parses.
	///
	/// Placeholders without a value are left as they are.
	pub fn interpolated<I, K, V>(
		source: &str,
		selector: &MountSelector,
		vars: I,
	) -> Result<Self, TemplateError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let vars: HashMap<String, String> = vars
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect();
		let source = PLACEHOLDER_RE.replace_all(source, |caps: &Captures<'_>| {
			vars.get(&caps[1])
				.cloned()
				.unwrap_or_else(|| caps[0].to_string())
		});
		Self::parse(source.into_owned(), selector)
	}

	/// Reads and parses a template file.
	pub fn load(path: impl AsRef<Path>, selector: &MountSelector) -> Result<Self, TemplateError> {
		Self::parse(read_source(path.as_ref())?, selector)
	}

	/// Reads a template file and interpolates `%KEY%` placeholders.
	pub fn load_interpolated<I, K, V>(
		path: impl AsRef<Path>,
		selector: &MountSelector,
		vars: I,
	) -> Result<Self, TemplateError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self::interpolated(&read_source(path.as_ref())?, selector, vars)
	}

	/// The template source.
	pub fn source(&self) -> &str {
		&self.source
	}

	/// The mount selector.
	pub fn selector(&self) -> &MountSelector {
		&self.selector
	}

	/// Byte range of the mount point's content.
	pub fn mount_range(&self) -> Range<usize> {
		self.mount.clone()
	}

	/// Offset where the data script is injected, or `None` to append it.
	pub fn injection_point(&self) -> Option<usize> {
		self.script_at.or(self.body_close_at)
	}

	/// Splices `markup` into the mount point and injects `data_script`.
	///
	/// The script goes before the first script outside the mount point,
	/// otherwise before `</body>`, otherwise at the end of the document.
	pub fn render(&self, markup: &str, data_script: &str) -> String {
		let mut edits: Vec<(Range<usize>, &str)> = vec![(self.mount.clone(), markup)];
		let inject_at = self.injection_point();
		if let Some(at) = inject_at {
			edits.push((at..at, data_script));
		}
		edits.sort_by_key(|(range, _)| range.start);

		let mut out =
			String::with_capacity(self.source.len() + markup.len() + data_script.len());
		let mut cursor = 0;
		for (range, text) in edits {
			out.push_str(&self.source[cursor..range.start]);
			out.push_str(text);
			cursor = range.end;
		}
		out.push_str(&self.source[cursor..]);
		if inject_at.is_none() {
			out.push_str(data_script);
		}
		out
	}
}

fn parse_attributes(attrs: &str) -> Vec<(&str, &str)> {
	ATTR_RE
		.captures_iter(attrs)
		.filter_map(|caps| {
			let name = caps.get(1)?.as_str();
			let value = caps
				.get(2)
				.or_else(|| caps.get(3))
				.or_else(|| caps.get(4))
				.map_or("", |m| m.as_str());
			Some((name, value))
		})
		.collect()
}

fn read_source(path: &Path) -> Result<String, TemplateError> {
	let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
		path: path.to_path_buf(),
		source,
	})?;
	tracing::info!(path = %path.display(), "Loaded HTML template");
	Ok(source)
}
