//! Partner descriptor data structures shared by the token exchange and the executor.

/// Builder API for assembling partner descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	partner::{PartnerOperation, SuccessCodes},
	token::TokenSecret,
};

/// Default timeout applied to every outbound partner call.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);
/// Default margin before expiry at which the cached token is refreshed.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::minutes(5);

/// Endpoint set declared by a partner descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartnerEndpoints {
	/// Token endpoint used for the `b2b_credentials` exchange.
	pub token: Url,
	/// Base URL the operation paths are resolved against. Always ends with `/`.
	pub base: Url,
}

/// Client credentials sent with every token exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartnerCredentials {
	/// Partner-issued client identifier.
	pub client_id: String,
	/// Partner-issued client secret.
	pub client_secret: TokenSecret,
	/// Consent identifier granted by the account holder.
	pub consent_id: Option<String>,
	/// Requested scope.
	pub scope: Option<String>,
	/// Resource indicator (e.g. `sandbox`).
	pub resource: Option<String>,
}
impl PartnerCredentials {
	/// Creates credentials from the client identifier and secret.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			consent_id: None,
			scope: None,
			resource: None,
		}
	}

	/// Sets the consent identifier.
	pub fn with_consent_id(mut self, consent_id: impl Into<String>) -> Self {
		self.consent_id = Some(consent_id.into());

		self
	}

	/// Sets the requested scope.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the resource indicator.
	pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
		self.resource = Some(resource.into());

		self
	}

	/// Form fields of the token exchange, in wire order.
	pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
		let mut fields = vec![
			("client_id", self.client_id.as_str()),
			("client_secret", self.client_secret.expose()),
			("grant_type", "b2b_credentials"),
		];

		if let Some(scope) = &self.scope {
			fields.push(("scope", scope));
		}
		if let Some(consent_id) = &self.consent_id {
			fields.push(("consentId", consent_id));
		}
		if let Some(resource) = &self.resource {
			fields.push(("resource", resource));
		}

		fields
	}
}

/// Immutable partner descriptor consumed by the token exchange and executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartnerDescriptor {
	/// Descriptor identifier, used in log fields.
	pub id: String,
	/// Endpoint definitions exposed by the partner.
	pub endpoints: PartnerEndpoints,
	/// Client credentials for the token exchange.
	pub credentials: PartnerCredentials,
	/// Per-operation success codes.
	pub success_codes: SuccessCodes,
	/// Timeout applied to every outbound call.
	pub timeout: StdDuration,
	/// Remaining lifetime under which the cached token is refreshed.
	pub refresh_margin: Duration,
}
impl PartnerDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: impl Into<String>) -> PartnerDescriptorBuilder {
		PartnerDescriptorBuilder::new(id)
	}

	/// Resolves the absolute URL of `operation`.
	pub fn operation_url(&self, operation: PartnerOperation) -> Result<Url, ConfigError> {
		self.endpoints
			.base
			.join(operation.path())
			.map_err(|source| ConfigError::InvalidOperationUrl { operation, source })
	}

	/// Success code the partner reports for `operation`.
	pub fn success_code(&self, operation: PartnerOperation) -> &str {
		self.success_codes.for_operation(operation)
	}
}
