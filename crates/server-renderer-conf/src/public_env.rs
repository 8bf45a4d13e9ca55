//! Public environment variables.
//!
//! Only variables explicitly marked public reach the template: those
//! prefixed with `APP_`, the ones listed in [`Settings::env`], and the
//! built-in `APP_ENV`, `PORT` and `PUBLIC_URL`.

use crate::settings::Settings;
use crate::sources::SourceError;
use indexmap::IndexMap;

/// Prefix marking an environment variable as public.
pub const PUBLIC_PREFIX: &str = "APP_";

/// Variables exposed to templates as `%KEY%` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicEnv {
	vars: IndexMap<String, String>,
}

impl PublicEnv {
	/// Builds the public variable set.
	///
	/// Later sources win: process variables, then the profile's `.env`
	/// file, then `settings.env`, then the built-ins.
	pub fn collect<P, D>(settings: &Settings, process_vars: P, dotenv_vars: D) -> Self
	where
		P: IntoIterator<Item = (String, String)>,
		D: IntoIterator<Item = (String, String)>,
	{
		let mut vars: IndexMap<String, String> = process_vars
			.into_iter()
			.chain(dotenv_vars)
			.filter(|(key, _)| key.starts_with(PUBLIC_PREFIX))
			.collect();
		vars.extend(
			settings
				.env
				.iter()
				.map(|(key, value)| (key.clone(), value.clone())),
		);
		vars.insert("APP_ENV".to_string(), settings.profile.to_string());
		vars.insert("PORT".to_string(), settings.port.to_string());
		vars.insert("PUBLIC_URL".to_string(), settings.public_path.clone());
		Self { vars }
	}

	/// Collects from the real process environment and the profile's
	/// `.env.{profile}.local` file.
	pub fn from_environment(settings: &Settings) -> Result<Self, SourceError> {
		let dotenv_vars = settings.dotenv_source().variables()?;
		Ok(Self::collect(settings, std::env::vars(), dotenv_vars))
	}

	/// Looks up a variable.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.vars.get(key).map(String::as_str)
	}

	/// Iterates over `(key, value)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Number of variables.
	pub fn len(&self) -> usize {
		self.vars.len()
	}

	/// Returns `true` if there are no variables.
	pub fn is_empty(&self) -> bool {
		self.vars.is_empty()
	}
}
