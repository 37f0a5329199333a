// self
use crate::{_prelude::*, error::ConfigError};

/// OAuth 2.0 grant types the broker can perform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Client Credentials grant; client authenticates with form parameters.
	#[default]
	ClientCredentials,
	/// Resource Owner Password Credentials grant; client authenticates with HTTP Basic.
	Password,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::ClientCredentials => "client_credentials",
			GrantType::Password => "password",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for GrantType {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();

		if trimmed.eq_ignore_ascii_case("client_credentials") {
			Ok(GrantType::ClientCredentials)
		} else if trimmed.eq_ignore_ascii_case("password") {
			Ok(GrantType::Password)
		} else {
			Err(ConfigError::UnsupportedGrantType { value: s.to_owned() })
		}
	}
}
