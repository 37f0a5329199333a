// std
use std::path::Path;
// self
use crate::{_prelude::*, error::ConfigError, obs};

const ENV_PREFIX: &str = "OAUTH_";

/// Ordered chain of settings layers consulted by [`CredentialConfig::load`].
///
/// Layers are consulted in insertion order, so add the highest-priority layer first
/// (typically explicit overrides, then environment, then a settings file). Keys absent from
/// every layer resolve to the built-in default.
///
/// [`CredentialConfig::load`]: crate::config::CredentialConfig::load
#[derive(Clone, Debug, Default)]
pub struct ConfigSources {
	layers: Vec<ConfigLayer>,
}
impl ConfigSources {
	/// Creates an empty chain (every key resolves to its default).
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a layer of explicit runtime overrides keyed by property name.
	pub fn with_overrides<I, K, V>(self, values: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.with_layer("overrides", values)
	}

	/// Appends a layer built from the process environment (`OAUTH_CLIENT_ID` → `oauth.client.id`).
	pub fn with_env(self) -> Self {
		self.with_env_vars(std::env::vars())
	}

	/// Appends an environment-style layer from the provided variables, ignoring names without
	/// the `OAUTH_` prefix.
	pub fn with_env_vars<I, K, V>(self, vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let values = vars
			.into_iter()
			.filter_map(|(name, value)| env_to_property(name.as_ref()).map(|key| (key, value)));

		self.with_layer("environment", values)
	}

	/// Appends a layer parsed from TOML; nested tables flatten into dotted keys.
	pub fn with_toml_str(self, raw: &str) -> Result<Self, ConfigError> {
		let table = raw.parse::<toml::Table>()?;
		let mut values = BTreeMap::new();

		flatten_toml(None, &table, &mut values);

		Ok(self.with_layer("settings", values))
	}

	/// Reads `path` and appends it as a TOML layer.
	pub fn with_toml_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SettingsRead {
			path: path.display().to_string(),
			source,
		})?;

		self.with_toml_str(&raw)
	}

	/// Appends a named layer of raw values.
	pub fn with_layer<I, K, V>(mut self, name: &'static str, values: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let values = values.into_iter().map(|(key, value)| (key.into(), value.into())).collect();

		self.layers.push(ConfigLayer { name, values });

		self
	}

	/// Returns the highest-priority raw value for `key`.
	pub fn resolve(&self, key: &str) -> Option<&str> {
		self.candidates(key).next().map(|(_, value)| value)
	}

	/// Returns the highest-priority value for `key` that `parse` accepts.
	///
	/// Rejected values are logged and skipped, so a malformed entry behaves as if it were absent.
	pub fn resolve_parsed<T, F>(&self, key: &str, parse: F) -> Option<T>
	where
		F: Fn(&str) -> Option<T>,
	{
		for (layer, value) in self.candidates(key) {
			match parse(value) {
				Some(parsed) => return Some(parsed),
				None => obs::warn_rejected_setting(layer, key),
			}
		}

		None
	}

	fn candidates<'a, 'k>(
		&'a self,
		key: &'k str,
	) -> impl Iterator<Item = (&'static str, &'a str)> + use<'a, 'k> {
		self.layers
			.iter()
			.filter_map(move |layer| layer.values.get(key).map(|value| (layer.name, value.as_str())))
	}
}

/// Single named layer of property values.
#[derive(Clone)]
pub struct ConfigLayer {
	name: &'static str,
	values: BTreeMap<String, String>,
}
impl Debug for ConfigLayer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConfigLayer")
			.field("name", &self.name)
			.field("keys", &self.values.keys().collect::<Vec<_>>())
			.finish()
	}
}

fn env_to_property(name: &str) -> Option<String> {
	name.starts_with(ENV_PREFIX).then(|| name.to_ascii_lowercase().replace('_', "."))
}

fn flatten_toml(prefix: Option<&str>, table: &toml::Table, out: &mut BTreeMap<String, String>) {
	for (key, value) in table {
		let path = match prefix {
			Some(prefix) => format!("{prefix}.{key}"),
			None => key.clone(),
		};
		let scalar = match value {
			toml::Value::Table(nested) => {
				flatten_toml(Some(&path), nested, out);

				continue;
			},
			toml::Value::String(text) => text.clone(),
			toml::Value::Integer(number) => number.to_string(),
			toml::Value::Float(number) => number.to_string(),
			toml::Value::Boolean(flag) => flag.to_string(),
			toml::Value::Datetime(moment) => moment.to_string(),
			toml::Value::Array(_) => continue,
		};

		out.insert(path, scalar);
	}
}
