// self
use crate::{
	_prelude::*,
	partner::{
		DEFAULT_REFRESH_MARGIN, DEFAULT_TIMEOUT, PartnerCredentials, PartnerDescriptor,
		PartnerEndpoints, PartnerOperation, SuccessCodes,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum PartnerDescriptorError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Operation base endpoint is mandatory.
	#[error("Missing base endpoint.")]
	MissingBaseEndpoint,
	/// Client credentials are mandatory.
	#[error("Missing client credentials.")]
	MissingCredentials,
	/// Client identifier must not be blank.
	#[error("Client identifier must not be empty.")]
	EmptyClientId,
	/// Endpoints must be absolute HTTP(S) URLs.
	#[error("The {endpoint} endpoint must be an absolute HTTP(S) URL: {url}.")]
	UnsupportedEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Endpoints must use HTTPS unless explicitly relaxed.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Outbound timeout must be finite and non-zero.
	#[error("Timeout must be greater than zero.")]
	ZeroTimeout,
	/// Refresh margin must not be negative.
	#[error("Refresh margin must not be negative.")]
	NegativeRefreshMargin,
	/// Every operation needs a success code.
	#[error("Success code for `{operation}` must not be empty.")]
	EmptySuccessCode {
		/// Operation missing a success code.
		operation: PartnerOperation,
	},
}

/// Builder for [`PartnerDescriptor`] values.
#[derive(Debug)]
pub struct PartnerDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: String,
	/// Token endpoint used for the exchange.
	pub token_endpoint: Option<Url>,
	/// Base endpoint the operation paths are joined onto.
	pub base_endpoint: Option<Url>,
	/// Client credentials.
	pub credentials: Option<PartnerCredentials>,
	/// Per-operation success codes.
	pub success_codes: SuccessCodes,
	/// Outbound timeout.
	pub timeout: StdDuration,
	/// Refresh margin.
	pub refresh_margin: Duration,
	/// Whether plain-HTTP endpoints are rejected.
	pub require_https: bool,
}
impl PartnerDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			token_endpoint: None,
			base_endpoint: None,
			credentials: None,
			success_codes: SuccessCodes::default(),
			timeout: DEFAULT_TIMEOUT,
			refresh_margin: DEFAULT_REFRESH_MARGIN,
			require_https: true,
		}
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the operation base endpoint.
	pub fn base_endpoint(mut self, url: Url) -> Self {
		self.base_endpoint = Some(url);

		self
	}

	/// Sets the client credentials.
	pub fn credentials(mut self, credentials: PartnerCredentials) -> Self {
		self.credentials = Some(credentials);

		self
	}

	/// Overrides the per-operation success codes.
	pub fn success_codes(mut self, codes: SuccessCodes) -> Self {
		self.success_codes = codes;

		self
	}

	/// Overrides the outbound timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the refresh margin.
	pub fn refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = margin;

		self
	}

	/// Toggles rejection of plain-HTTP endpoints.
	pub fn require_https(mut self, require: bool) -> Self {
		self.require_https = require;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<PartnerDescriptor, PartnerDescriptorError> {
		let token = self.token_endpoint.ok_or(PartnerDescriptorError::MissingTokenEndpoint)?;
		let base = self.base_endpoint.ok_or(PartnerDescriptorError::MissingBaseEndpoint)?;
		let credentials = self.credentials.ok_or(PartnerDescriptorError::MissingCredentials)?;

		validate_endpoint("token", &token, self.require_https)?;
		validate_endpoint("base", &base, self.require_https)?;

		if credentials.client_id.trim().is_empty() {
			return Err(PartnerDescriptorError::EmptyClientId);
		}
		if self.timeout.is_zero() {
			return Err(PartnerDescriptorError::ZeroTimeout);
		}
		if self.refresh_margin.is_negative() {
			return Err(PartnerDescriptorError::NegativeRefreshMargin);
		}
		if let Some((operation, _)) =
			self.success_codes.iter().find(|(_, code)| code.trim().is_empty())
		{
			return Err(PartnerDescriptorError::EmptySuccessCode { operation });
		}

		Ok(PartnerDescriptor {
			id: self.id,
			endpoints: PartnerEndpoints { token, base: with_trailing_slash(base) },
			credentials,
			success_codes: self.success_codes,
			timeout: self.timeout,
			refresh_margin: self.refresh_margin,
		})
	}
}

fn validate_endpoint(
	name: &'static str,
	url: &Url,
	require_https: bool,
) -> Result<(), PartnerDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if !require_https => Ok(()),
		"http" =>
			Err(PartnerDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
		_ => Err(PartnerDescriptorError::UnsupportedEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn with_trailing_slash(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn builder() -> PartnerDescriptorBuilder {
		PartnerDescriptor::builder("vakifbank")
			.token_endpoint(
				Url::parse("https://apigw.vakifbank.com.tr:8443/auth/oauth/v2/token")
					.expect("Token URL should parse."),
			)
			.base_endpoint(
				Url::parse("https://apigw.vakifbank.com.tr:8443").expect("Base URL should parse."),
			)
			.credentials(PartnerCredentials::new("client", "secret"))
	}

	#[test]
	fn operation_urls_resolve_under_base() {
		let descriptor = builder().build().expect("Descriptor should build.");

		assert_eq!(
			descriptor
				.operation_url(PartnerOperation::AccountTransactions)
				.expect("Operation URL should resolve.")
				.as_str(),
			"https://apigw.vakifbank.com.tr:8443/accountTransactions"
		);
	}

	#[test]
	fn base_path_gains_trailing_slash() {
		let descriptor = builder()
			.base_endpoint(
				Url::parse("https://partner.example/api/v1").expect("Base URL should parse."),
			)
			.build()
			.expect("Descriptor should build.");

		assert_eq!(
			descriptor
				.operation_url(PartnerOperation::Accounts)
				.expect("Operation URL should resolve.")
				.as_str(),
			"https://partner.example/api/v1/accountList"
		);
	}

	#[test]
	fn plain_http_requires_opt_out() {
		let insecure = builder()
			.token_endpoint(Url::parse("http://127.0.0.1/token").expect("Token URL should parse."));

		assert!(matches!(
			insecure.build(),
			Err(PartnerDescriptorError::InsecureEndpoint { endpoint: "token", .. })
		));

		let relaxed = builder()
			.token_endpoint(Url::parse("http://127.0.0.1/token").expect("Token URL should parse."))
			.require_https(false);

		assert!(relaxed.build().is_ok());
	}

	#[test]
	fn rejects_non_http_schemes_zero_timeout_and_blank_codes() {
		let ftp = builder().base_endpoint(Url::parse("ftp://partner/").expect("URL should parse."));

		assert!(matches!(
			ftp.build(),
			Err(PartnerDescriptorError::UnsupportedEndpoint { endpoint: "base", .. })
		));
		assert_eq!(
			builder().timeout(StdDuration::ZERO).build(),
			Err(PartnerDescriptorError::ZeroTimeout)
		);

		let codes = SuccessCodes { account_detail: " ".into(), ..SuccessCodes::default() };

		assert_eq!(
			builder().success_codes(codes).build(),
			Err(PartnerDescriptorError::EmptySuccessCode {
				operation: PartnerOperation::AccountDetail
			})
		);
	}

	#[test]
	fn credentials_render_b2b_form_fields() {
		let credentials = PartnerCredentials::new("id", "secret")
			.with_consent_id("consent")
			.with_scope("account")
			.with_resource("sandbox");
		let fields = credentials.form_fields();

		assert_eq!(fields[2], ("grant_type", "b2b_credentials"));
		assert!(fields.contains(&("consentId", "consent")));
		assert!(fields.contains(&("resource", "sandbox")));
		assert!(format!("{credentials:?}").contains("<redacted>"));
		assert!(!format!("{credentials:?}").contains("\"secret\""));
	}
}
