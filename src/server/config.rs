//! TOML configuration of the gateway binary.

// std
use std::path::{Path, PathBuf};
// self
use crate::{
	_prelude::*,
	partner::{PartnerCredentials, PartnerDescriptor, PartnerDescriptorError, SuccessCodes},
};

/// Environment variable overriding `partner.client_secret`.
pub const CLIENT_SECRET_ENV: &str = "BANK_GATEWAY_CLIENT_SECRET";
/// Environment variable overriding `jwt.secret`.
pub const JWT_SECRET_ENV: &str = "BANK_GATEWAY_JWT_SECRET";

/// Longest accepted session lifetime (30 days).
pub const MAX_SESSION_SECS: u64 = 30 * 24 * 3_600;

/// Errors raised while loading or validating the configuration file.
#[derive(Debug, ThisError)]
pub enum ConfigFileError {
	/// The file could not be read.
	#[error("Failed to read config file {path}: {source}.")]
	Read {
		/// Path that was read.
		path: PathBuf,
		/// IO failure.
		#[source]
		source: std::io::Error,
	},
	/// The file is not valid TOML for [`GatewayConfig`].
	#[error("Failed to parse config file: {0}")]
	Parse(#[from] toml::de::Error),
	/// A setting holds an unusable value.
	#[error("Invalid setting `{key}`: {reason}.")]
	Invalid {
		/// Dotted setting name.
		key: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// The partner settings do not form a valid descriptor.
	#[error(transparent)]
	Descriptor(#[from] PartnerDescriptorError),
}

/// Root configuration document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
	/// Listener settings.
	#[serde(default)]
	pub server: ServerSettings,
	/// Partner bank settings.
	pub partner: PartnerSettings,
	/// Local session token settings.
	pub jwt: JwtSettings,
	/// Local ledger settings.
	#[serde(default)]
	pub ledger: LedgerSettings,
}
impl GatewayConfig {
	/// Reads and validates the configuration at `path`, applying environment overrides.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path)
			.map_err(|source| ConfigFileError::Read { path: path.to_path_buf(), source })?;
		let mut config = Self::from_toml(&content)?;

		config.apply_env_overrides();
		config.validate()?;

		Ok(config)
	}

	/// Parses a TOML document without touching the environment.
	pub fn from_toml(content: &str) -> Result<Self, ConfigFileError> {
		Ok(toml::from_str(content)?)
	}

	/// Replaces secrets with their environment overrides when set.
	pub fn apply_env_overrides(&mut self) {
		if let Some(secret) = env_value(CLIENT_SECRET_ENV) {
			self.partner.client_secret = secret;
		}
		if let Some(secret) = env_value(JWT_SECRET_ENV) {
			self.jwt.secret = secret;
		}
	}

	/// Checks the settings that cannot be validated by serde.
	pub fn validate(&self) -> Result<(), ConfigFileError> {
		if self.jwt.secret.len() < 32 {
			return Err(ConfigFileError::Invalid {
				key: "jwt.secret",
				reason: "must be at least 32 bytes".into(),
			});
		}
		if !(1..=MAX_SESSION_SECS).contains(&self.jwt.expire_secs) {
			return Err(ConfigFileError::Invalid {
				key: "jwt.expire_secs",
				reason: format!("must be between 1 and {MAX_SESSION_SECS}"),
			});
		}
		if self.partner.client_secret.trim().is_empty() {
			return Err(ConfigFileError::Invalid {
				key: "partner.client_secret",
				reason: format!("must be set in the file or through {CLIENT_SECRET_ENV}"),
			});
		}

		self.partner_descriptor()?;

		Ok(())
	}

	/// Builds the partner descriptor described by `[partner]`.
	pub fn partner_descriptor(&self) -> Result<PartnerDescriptor, ConfigFileError> {
		let partner = &self.partner;
		let mut credentials =
			PartnerCredentials::new(partner.client_id.clone(), partner.client_secret.clone());

		if let Some(consent_id) = &partner.consent_id {
			credentials = credentials.with_consent_id(consent_id.clone());
		}
		if let Some(scope) = &partner.scope {
			credentials = credentials.with_scope(scope.clone());
		}
		if let Some(resource) = &partner.resource {
			credentials = credentials.with_resource(resource.clone());
		}

		let descriptor = PartnerDescriptor::builder(partner.id.clone())
			.token_endpoint(parse_url("partner.token_url", &partner.token_url)?)
			.base_endpoint(parse_url("partner.base_url", &partner.base_url)?)
			.credentials(credentials)
			.success_codes(partner.success_codes.clone())
			.timeout(StdDuration::from_secs(partner.timeout_secs))
			.refresh_margin(Duration::seconds(partner.refresh_margin_secs))
			.require_https(!partner.allow_insecure_http)
			.build()?;

		Ok(descriptor)
	}
}

/// `[server]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
	/// Socket address to bind.
	pub listen: String,
	/// Front-end origin allowed by CORS.
	pub cors_origin: String,
	/// Default `tracing` filter when `RUST_LOG` is unset.
	pub log_filter: String,
}
impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			listen: "127.0.0.1:8080".into(),
			cors_origin: "http://localhost:4200".into(),
			log_filter: "info".into(),
		}
	}
}

/// `[partner]` section.
#[derive(Clone, Serialize, Deserialize)]
pub struct PartnerSettings {
	/// Descriptor identifier used in logs.
	#[serde(default = "default_partner_id")]
	pub id: String,
	/// Token endpoint URL.
	pub token_url: String,
	/// Base URL the operation paths are joined onto.
	pub base_url: String,
	/// Client identifier.
	pub client_id: String,
	/// Client secret; usually supplied through [`CLIENT_SECRET_ENV`].
	#[serde(default)]
	pub client_secret: String,
	/// Consent identifier.
	#[serde(default)]
	pub consent_id: Option<String>,
	/// Requested scope.
	#[serde(default)]
	pub scope: Option<String>,
	/// Resource indicator.
	#[serde(default)]
	pub resource: Option<String>,
	/// Outbound timeout in seconds.
	#[serde(default = "default_timeout_secs")]
	pub timeout_secs: u64,
	/// Seconds before expiry at which the token is refreshed.
	#[serde(default = "default_refresh_margin_secs")]
	pub refresh_margin_secs: i64,
	/// Accept plain-HTTP endpoints.
	#[serde(default)]
	pub allow_insecure_http: bool,
	/// Per-operation success codes.
	#[serde(default)]
	pub success_codes: SuccessCodes,
}
impl Debug for PartnerSettings {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PartnerSettings")
			.field("id", &self.id)
			.field("token_url", &self.token_url)
			.field("base_url", &self.base_url)
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("consent_id", &self.consent_id)
			.field("timeout_secs", &self.timeout_secs)
			.field("refresh_margin_secs", &self.refresh_margin_secs)
			.finish_non_exhaustive()
	}
}

/// `[jwt]` section.
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtSettings {
	/// HMAC signing secret; usually supplied through [`JWT_SECRET_ENV`].
	#[serde(default)]
	pub secret: String,
	/// `iss` claim.
	pub issuer: String,
	/// `aud` claim.
	pub audience: String,
	/// Session lifetime in seconds.
	#[serde(default = "default_expire_secs")]
	pub expire_secs: u64,
}
impl Debug for JwtSettings {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JwtSettings")
			.field("secret", &"<redacted>")
			.field("issuer", &self.issuer)
			.field("audience", &self.audience)
			.field("expire_secs", &self.expire_secs)
			.finish()
	}
}

/// `[ledger]` section.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
	/// JSON snapshot file; the ledger stays in memory when unset.
	pub path: Option<PathBuf>,
	/// Seed the demo user and accounts into an empty ledger.
	pub seed_demo: bool,
}

fn default_partner_id() -> String {
	"vakifbank".into()
}

fn default_timeout_secs() -> u64 {
	30
}

fn default_refresh_margin_secs() -> i64 {
	300
}

fn default_expire_secs() -> u64 {
	3_600
}

fn env_value(key: &str) -> Option<String> {
	std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigFileError> {
	Url::parse(raw).map_err(|e| ConfigFileError::Invalid { key, reason: e.to_string() })
}
