//! Configuration sources for layered settings
//!
//! Sources are merged in priority order: environment variables > `.env`
//! files > TOML config file > defaults.

use indexmap::IndexMap;
use serde_json::Value;
use server_renderer_core::BuildProfile;
use std::fs;
use std::path::PathBuf;

/// Prefix of environment variables read as settings.
pub const ENV_PREFIX: &str = "SSR_";

/// Default name of the TOML config file.
pub const CONFIG_FILE_NAME: &str = "server-renderer.toml";

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// Error type for configuration sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error(".env error: {0}")]
	DotEnv(#[from] dotenv::Error),
}

/// Parses a raw string value the way environment values are typed:
/// integers and booleans become JSON scalars, `[...]` and `{...}` are read
/// as JSON, anything else stays a string.
pub fn parse_value(raw: &str) -> Value {
	let trimmed = raw.trim();
	if (trimmed.starts_with('[') || trimmed.starts_with('{'))
		&& let Ok(value) = serde_json::from_str::<Value>(trimmed)
	{
		return value;
	}
	if let Ok(num) = trimmed.parse::<i64>() {
		Value::Number(num.into())
	} else if let Ok(b) = trimmed.parse::<bool>() {
		Value::Bool(b)
	} else {
		Value::String(raw.to_string())
	}
}

fn prefixed_entries<I>(vars: I, prefix: &str) -> IndexMap<String, Value>
where
	I: IntoIterator<Item = (String, String)>,
{
	vars.into_iter()
		.filter_map(|(key, value)| {
			key.strip_prefix(prefix)
				.map(|clean| (clean.to_lowercase(), parse_value(&value)))
		})
		.collect()
}

/// Environment variable configuration source
///
/// `SSR_PORT=8080` sets `port`.
pub struct EnvSource {
	prefix: String,
}

impl EnvSource {
	/// Create a source reading `SSR_`-prefixed variables
	pub fn new() -> Self {
		Self {
			prefix: ENV_PREFIX.to_string(),
		}
	}

	/// Set the prefix filter for environment variables
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(prefixed_entries(std::env::vars(), &self.prefix))
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

/// `.env` file configuration source
///
/// The file is read, never exported into the process environment.
/// Prefixed entries become settings; every entry stays available through
/// [`DotEnvSource::variables`] for public env injection.
pub struct DotEnvSource {
	path: PathBuf,
	prefix: String,
}

impl DotEnvSource {
	/// Source for `.env.{profile}.local` inside `root_dir`
	pub fn for_profile(root_dir: impl Into<PathBuf>, profile: BuildProfile) -> Self {
		Self::new(root_dir.into().join(profile.env_file_name()))
	}

	/// Source for an explicit file
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			prefix: ENV_PREFIX.to_string(),
		}
	}

	/// Set the prefix of entries read as settings
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}

	/// The file path.
	pub fn path(&self) -> &PathBuf {
		&self.path
	}

	/// Every entry in the file, in file order. A missing file yields
	/// nothing.
	pub fn variables(&self) -> Result<IndexMap<String, String>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}
		let mut vars = IndexMap::new();
		for item in dotenv::from_path_iter(&self.path)? {
			let (key, value) = item?;
			vars.insert(key, value);
		}
		tracing::debug!(path = %self.path.display(), count = vars.len(), "Loaded .env file");
		Ok(vars)
	}
}

impl ConfigSource for DotEnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(prefixed_entries(self.variables()?, &self.prefix))
	}

	fn priority(&self) -> u8 {
		90
	}

	fn description(&self) -> String {
		format!(".env file: {}", self.path.display())
	}
}

/// TOML file configuration source
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	/// Create a new TOML file configuration source
	///
	/// # Examples
	///
	/// ```
	/// use server_renderer_conf::sources::TomlFileSource;
	///
	/// let source = TomlFileSource::new("server-renderer.toml");
	/// ```
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;
		let json_value = serde_json::to_value(&toml_value)?;

		let map = json_value
			.as_object()
			.ok_or_else(|| SourceError::Parse("Expected table at root".to_string()))?;

		Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Default values configuration source
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	/// Create an empty default source
	pub fn new() -> Self {
		Self {
			values: IndexMap::new(),
		}
	}

	/// Add a default value for a configuration key
	///
	/// # Examples
	///
	/// ```
	/// use server_renderer_conf::sources::DefaultSource;
	/// use serde_json::Value;
	///
	/// let source = DefaultSource::new()
	///     .with_value("port", Value::Number(3000.into()));
	/// ```
	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}

	/// Add every entry of a JSON object
	pub fn with_object(mut self, object: serde_json::Map<String, Value>) -> Self {
		self.values.extend(object);
		self
	}
}

impl Default for DefaultSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}
