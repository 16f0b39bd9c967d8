//! Environment configuration.
//!
//! The integration flow and the auth store treat configuration differently:
//! a missing backend URL only fails the requests that need it (see
//! [`HttpBackend::from_env`](crate::HttpBackend::from_env)), while
//! [`AuthConfig::from_env`] fails fast when either hosted-database value is
//! absent.

use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Backend base URL for link-token issuance and exchange.
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";

/// Hosted database project URL.
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";

/// Hosted database public (anon) API key.
pub const SUPABASE_ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";

/// Global name the widget script defines.
pub const DEFAULT_WIDGET_GLOBAL: &str = "MergeLink";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote script that defines the widget global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
	pub url: String,
	/// Upper bound on waiting for the script's load or error event.
	pub timeout: Duration,
}

impl ScriptSource {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			timeout: DEFAULT_SCRIPT_TIMEOUT,
		}
	}
}

/// Tunables for [`LinkSessionController`](crate::LinkSessionController).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
	pub widget_global: String,
	/// Interval hosts should poll widget availability at.
	pub poll_interval: Duration,
	/// Script to bootstrap when the widget is missing at connect time.
	///
	/// With [`None`], a missing widget fails the attempt immediately.
	pub script: Option<ScriptSource>,
}

impl Default for LinkConfig {
	fn default() -> Self {
		Self {
			widget_global: DEFAULT_WIDGET_GLOBAL.to_string(),
			poll_interval: DEFAULT_POLL_INTERVAL,
			script: None,
		}
	}
}

/// Hosted database configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
	pub url: Url,
	pub anon_key: String,
}

impl AuthConfig {
	/// Reads [`SUPABASE_URL_ENV`] and [`SUPABASE_ANON_KEY_ENV`].
	///
	/// # Errors
	///
	/// Returns [`ConfigError::Missing`] naming the first absent variable, or
	/// [`ConfigError::Invalid`] if the URL does not parse.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Same as [`from_env`](Self::from_env) with a custom variable source.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let url = required(&lookup, SUPABASE_URL_ENV)?;
		let anon_key = required(&lookup, SUPABASE_ANON_KEY_ENV)?;
		let url = Url::parse(&url).map_err(|err| ConfigError::Invalid {
			name: SUPABASE_URL_ENV,
			message: err.to_string(),
		})?;
		Ok(Self {
			url: with_trailing_slash(url),
			anon_key,
		})
	}
}

/// Makes `url` a directory so relative joins keep its last path segment.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());
		url.set_path(&path);
	}
	url
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	lookup(name)
		.map(|value| value.trim().to_string())
		.filter(|value| !value.is_empty())
		.ok_or(ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |name| map.get(name).cloned()
	}

	#[test]
	fn auth_config_reads_both_values() {
		let config = AuthConfig::from_lookup(env(&[
			(SUPABASE_URL_ENV, "https://project.supabase.co"),
			(SUPABASE_ANON_KEY_ENV, "anon-key"),
		]))
		.unwrap();
		assert_eq!(config.url.host_str(), Some("project.supabase.co"));
		assert_eq!(config.anon_key, "anon-key");
	}

	#[test]
	fn auth_config_keeps_url_path_prefix() {
		let config = AuthConfig::from_lookup(env(&[
			(SUPABASE_URL_ENV, "https://proxy.example.com/supabase"),
			(SUPABASE_ANON_KEY_ENV, "anon-key"),
		]))
		.unwrap();
		assert_eq!(config.url.as_str(), "https://proxy.example.com/supabase/");
		assert_eq!(
			config.url.join("rest/v1/profiles").unwrap().as_str(),
			"https://proxy.example.com/supabase/rest/v1/profiles"
		);
	}

	#[test]
	fn auth_config_fails_fast_on_missing_key() {
		let err = AuthConfig::from_lookup(env(&[(SUPABASE_URL_ENV, "https://project.supabase.co")]))
			.unwrap_err();
		assert_eq!(err, ConfigError::Missing(SUPABASE_ANON_KEY_ENV));
	}

	#[test]
	fn auth_config_treats_blank_as_missing() {
		let err = AuthConfig::from_lookup(env(&[
			(SUPABASE_URL_ENV, "  "),
			(SUPABASE_ANON_KEY_ENV, "anon-key"),
		]))
		.unwrap_err();
		assert_eq!(err, ConfigError::Missing(SUPABASE_URL_ENV));
	}

	#[test]
	fn auth_config_rejects_unparsable_url() {
		let err = AuthConfig::from_lookup(env(&[
			(SUPABASE_URL_ENV, "not a url"),
			(SUPABASE_ANON_KEY_ENV, "anon-key"),
		]))
		.unwrap_err();
		assert!(matches!(err, ConfigError::Invalid { name: SUPABASE_URL_ENV, .. }));
	}

	#[test]
	fn link_config_defaults() {
		let config = LinkConfig::default();
		assert_eq!(config.widget_global, "MergeLink");
		assert_eq!(config.poll_interval, Duration::from_secs(1));
		assert!(config.script.is_none());
	}
}
