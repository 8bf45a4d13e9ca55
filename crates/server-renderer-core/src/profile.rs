//! Build profile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether the application runs as a development or a production build.
///
/// Development builds include stack traces in serialized loader errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
	/// Local development build.
	#[default]
	Development,
	/// Optimized production build.
	Production,
}

impl BuildProfile {
	/// Returns `true` for [`BuildProfile::Production`].
	pub fn is_production(self) -> bool {
		matches!(self, Self::Production)
	}

	/// Returns the lowercase profile name.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Development => "development",
			Self::Production => "production",
		}
	}

	/// Returns the name of the local env file for this profile,
	/// e.g. `.env.production.local`.
	pub fn env_file_name(self) -> String {
		format!(".env.{}.local", self.as_str())
	}
}

impl fmt::Display for BuildProfile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for BuildProfile {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"development" | "dev" => Ok(Self::Development),
			"production" | "prod" => Ok(Self::Production),
			other => Err(format!("Unknown build profile: {}", other)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("development", BuildProfile::Development)]
	#[case("dev", BuildProfile::Development)]
	#[case("PRODUCTION", BuildProfile::Production)]
	#[case(" prod ", BuildProfile::Production)]
	fn test_from_str(#[case] input: &str, #[case] expected: BuildProfile) {
		assert_eq!(input.parse::<BuildProfile>().unwrap(), expected);
	}

	#[rstest]
	fn test_from_str_rejects_unknown() {
		assert!("staging".parse::<BuildProfile>().is_err());
	}

	#[rstest]
	fn test_env_file_name() {
		assert_eq!(
			BuildProfile::Production.env_file_name(),
			".env.production.local"
		);
	}
}
