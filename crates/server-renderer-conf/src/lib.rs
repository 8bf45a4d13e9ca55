//! Layered configuration for server-renderer.
//!
//! [`Settings`] are merged from several sources, highest priority last:
//!
//! | Source | Priority |
//! |--------|----------|
//! | [`DefaultSource`] | 0 |
//! | [`TomlFileSource`] (`server-renderer.toml`) | 50 |
//! | [`DotEnvSource`] (`.env.{profile}.local`) | 90 |
//! | [`EnvSource`] (`SSR_*`) | 100 |
//!
//! [`PublicEnv`] holds the variables templates may reference as `%KEY%`.
//!
//! ```no_run
//! use server_renderer_conf::{PublicEnv, Settings};
//! use server_renderer_core::BuildProfile;
//!
//! let settings = Settings::load(".", BuildProfile::Production)?;
//! let env = PublicEnv::from_environment(&settings)?;
//! println!("{:?}", env.get("PUBLIC_URL"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod public_env;
pub mod settings;
pub mod sources;

pub use builder::{MergedSettings, SettingsBuilder, SettingsError};
pub use public_env::{PUBLIC_PREFIX, PublicEnv};
pub use settings::Settings;
pub use sources::{
	CONFIG_FILE_NAME, ConfigSource, DefaultSource, DotEnvSource, ENV_PREFIX, EnvSource,
	SourceError, TomlFileSource, parse_value,
};
