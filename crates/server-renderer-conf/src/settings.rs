//! Application settings.

use crate::builder::{SettingsBuilder, SettingsError};
use crate::sources::{CONFIG_FILE_NAME, DefaultSource, DotEnvSource, EnvSource, TomlFileSource};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use server_renderer_core::BuildProfile;
use std::path::{Path, PathBuf};

/// Settings for rendering and serving an application.
///
/// Relative paths are resolved against `root_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Project root.
	pub root_dir: PathBuf,
	/// Build output directory.
	pub dist_dir: PathBuf,
	/// URL prefix under which built assets are served.
	pub public_path: String,
	/// The built HTML page the server renders into.
	pub built_html_path: PathBuf,
	/// The source HTML template, used when no built page exists.
	pub html_template_path: PathBuf,
	/// Mount point selector.
	pub container: String,
	/// HTTP port.
	pub port: u16,
	/// Build profile.
	pub profile: BuildProfile,
	/// Extra public variables.
	pub env: IndexMap<String, String>,
	/// Extra attributes for injected script tags.
	pub html_attributes: IndexMap<String, String>,
	/// Accepted for config compatibility; template bytes are never
	/// entity-decoded.
	pub decode_entities: bool,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			root_dir: PathBuf::from("."),
			dist_dir: PathBuf::from("dist"),
			public_path: "/".to_string(),
			built_html_path: PathBuf::from("dist/client/index.html"),
			html_template_path: PathBuf::from("src/index.html"),
			container: "#root".to_string(),
			port: 3000,
			profile: BuildProfile::default(),
			env: IndexMap::new(),
			html_attributes: IndexMap::new(),
			decode_entities: false,
		}
	}
}

impl Settings {
	/// Loads settings for `root_dir` from every standard source:
	/// defaults, `server-renderer.toml`, `.env.{profile}.local` and
	/// `SSR_`-prefixed environment variables.
	pub fn load(root_dir: impl AsRef<Path>, profile: BuildProfile) -> Result<Self, SettingsError> {
		let root_dir = root_dir.as_ref();
		Self::builder(root_dir, profile)
			.build()?
			.into_typed::<Settings>()
	}

	/// A builder pre-populated with the standard sources, ready for more.
	pub fn builder(root_dir: &Path, profile: BuildProfile) -> SettingsBuilder {
		let defaults = Settings {
			root_dir: root_dir.to_path_buf(),
			profile,
			..Settings::default()
		};
		let defaults = match serde_json::to_value(&defaults) {
			Ok(Value::Object(object)) => object,
			_ => serde_json::Map::new(),
		};

		SettingsBuilder::new()
			.profile(profile)
			.add_source(DefaultSource::new().with_object(defaults))
			.add_source(TomlFileSource::new(root_dir.join(CONFIG_FILE_NAME)))
			.add_source(DotEnvSource::for_profile(root_dir, profile))
			.add_source(EnvSource::new())
	}

	/// Joins a relative path onto `root_dir`.
	pub fn resolve(&self, path: &Path) -> PathBuf {
		if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.root_dir.join(path)
		}
	}

	/// The page to render into: the built page if it exists, otherwise the
	/// source template.
	pub fn template_path(&self) -> PathBuf {
		let built = self.resolve(&self.built_html_path);
		if built.exists() {
			built
		} else {
			self.resolve(&self.html_template_path)
		}
	}

	/// The profile's local env file.
	pub fn dotenv_source(&self) -> DotEnvSource {
		DotEnvSource::for_profile(&self.root_dir, self.profile)
	}
}
