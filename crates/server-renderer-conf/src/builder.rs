//! Merging configuration sources.

use crate::sources::{ConfigSource, SourceError};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use server_renderer_core::BuildProfile;

/// Errors raised while building settings.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	/// A source failed to load.
	#[error("Failed to load {description}: {source}")]
	Source {
		/// Description of the failing source.
		description: String,
		/// The underlying error.
		#[source]
		source: SourceError,
	},

	/// A required key is absent.
	#[error("Missing setting: {0}")]
	Missing(String),

	/// A value has the wrong shape.
	#[error("Invalid value for '{key}': {source}")]
	Invalid {
		/// Setting key, or `*` for the whole map.
		key: String,
		/// The deserialization error.
		#[source]
		source: serde_json::Error,
	},
}

/// Builder collecting configuration sources
///
/// # Examples
///
/// ```
/// use server_renderer_conf::builder::SettingsBuilder;
/// use server_renderer_conf::sources::DefaultSource;
/// use serde_json::json;
///
/// let merged = SettingsBuilder::new()
///     .add_source(DefaultSource::new().with_value("port", json!(3000)))
///     .build()
///     .unwrap();
/// assert_eq!(merged.get::<u16>("port").unwrap(), 3000);
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
	profile: BuildProfile,
}

impl SettingsBuilder {
	/// Create an empty builder
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the build profile recorded on the merged settings
	pub fn profile(mut self, profile: BuildProfile) -> Self {
		self.profile = profile;
		self
	}

	/// Add a configuration source
	pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Load every source and merge them, higher priority winning
	///
	/// Sources with equal priority are applied in insertion order. Tables
	/// are merged key by key; other values are replaced.
	pub fn build(mut self) -> Result<MergedSettings, SettingsError> {
		self.sources.sort_by_key(|source| source.priority());

		let mut values = IndexMap::new();
		for source in &self.sources {
			let loaded = source.load().map_err(|source_error| SettingsError::Source {
				description: source.description(),
				source: source_error,
			})?;
			tracing::debug!(
				source = %source.description(),
				keys = loaded.len(),
				"Configuration source loaded"
			);
			for (key, value) in loaded {
				match values.get_mut(&key) {
					Some(existing) => merge_value(existing, value),
					None => {
						values.insert(key, value);
					}
				}
			}
		}

		Ok(MergedSettings {
			values,
			profile: self.profile,
		})
	}
}

fn merge_value(existing: &mut Value, incoming: Value) {
	match (existing, incoming) {
		(Value::Object(current), Value::Object(next)) => {
			for (key, value) in next {
				match current.get_mut(&key) {
					Some(slot) => merge_value(slot, value),
					None => {
						current.insert(key, value);
					}
				}
			}
		}
		(slot, value) => *slot = value,
	}
}

/// Merged configuration values
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSettings {
	values: IndexMap<String, Value>,
	profile: BuildProfile,
}

impl MergedSettings {
	/// The build profile these settings were built for
	pub fn profile(&self) -> BuildProfile {
		self.profile
	}

	/// Get a typed value
	pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, SettingsError> {
		let value = self
			.values
			.get(key)
			.ok_or_else(|| SettingsError::Missing(key.to_string()))?;
		serde_json::from_value(value.clone()).map_err(|source| SettingsError::Invalid {
			key: key.to_string(),
			source,
		})
	}

	/// Get a typed value or a fallback when absent
	pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, SettingsError> {
		match self.get(key) {
			Err(SettingsError::Missing(_)) => Ok(default),
			other => other,
		}
	}

	/// Returns `true` if `key` is set
	pub fn contains(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	/// The raw merged map
	pub fn as_map(&self) -> &IndexMap<String, Value> {
		&self.values
	}

	/// Deserialize the whole map into `T`
	pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, SettingsError> {
		let object: serde_json::Map<String, Value> = self.values.into_iter().collect();
		serde_json::from_value(Value::Object(object)).map_err(|source| SettingsError::Invalid {
			key: "*".to_string(),
			source,
		})
	}
}
