//! Gateway-level error types shared across the token cache, executor, normalizer, and ledger.

// self
use crate::{_prelude::*, partner::PartnerOperation};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The partner token endpoint could not produce a usable token.
	#[error(transparent)]
	TokenAcquisition(#[from] TokenAcquisitionError),
	/// A partner operation failed at the transport level.
	#[error(transparent)]
	Transport(#[from] PartnerTransportError),
	/// A partner response violated the envelope contract or reported a business failure.
	#[error(transparent)]
	Normalization(#[from] crate::normalize::NormalizationError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Ledger storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::ledger::StoreError,
	),
}
impl Error {
	/// Classifies the error into the tag surfaced by the aggregation facade.
	pub fn kind(&self) -> FailureKind {
		match self {
			Self::TokenAcquisition(_) | Self::Transport(_) => FailureKind::PartnerUnavailable,
			Self::Normalization(e) => e.kind(),
			Self::Config(_) | Self::Storage(_) => FailureKind::Internal,
		}
	}

	/// Raw partner text attached to token or transport failures.
	pub fn diagnostic(&self) -> Option<&str> {
		match self {
			Self::TokenAcquisition(e) => e.diagnostic(),
			Self::Transport(e) => e.body(),
			_ => None,
		}
	}

	/// Returns `true` when the failure was caused by an elapsed outbound timeout.
	pub fn is_timeout(&self) -> bool {
		match self {
			Self::TokenAcquisition(TokenAcquisitionError::Transport(fault)) => fault.is_timeout(),
			Self::Transport(PartnerTransportError::Transport { source, .. }) => source.is_timeout(),
			_ => false,
		}
	}
}

/// Failure tags returned by the aggregation facade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
	/// Caller has no valid local session; raised by the HTTP layer before the facade runs.
	Unauthenticated,
	/// Token endpoint or partner operation unreachable, timed out, or returned non-2xx/non-JSON.
	PartnerUnavailable,
	/// Partner answered with a status code other than the configured success code.
	PartnerBusinessError,
	/// Partner response broke its documented envelope or field contract.
	MalformedResponse,
	/// Local misconfiguration or storage failure.
	Internal,
}
impl FailureKind {
	/// Returns a stable label suitable for log fields and problem types.
	pub const fn as_str(self) -> &'static str {
		match self {
			FailureKind::Unauthenticated => "unauthenticated",
			FailureKind::PartnerUnavailable => "partner_unavailable",
			FailureKind::PartnerBusinessError => "partner_business_error",
			FailureKind::MalformedResponse => "malformed_response",
			FailureKind::Internal => "internal",
		}
	}
}
impl Display for FailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Partner descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::partner::PartnerDescriptorError),
	/// Operation path could not be joined onto the partner base URL.
	#[error("Operation URL for `{operation}` is invalid.")]
	InvalidOperationUrl {
		/// Operation whose path failed to join.
		operation: PartnerOperation,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body for `{operation}` could not be serialized.")]
	RequestBody {
		/// Operation whose body failed to serialize.
		operation: PartnerOperation,
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Date could not be rendered in the partner's date format.
	#[error("Date could not be formatted for the partner API.")]
	DateFormat(#[from] time::error::Format),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level faults raised before a usable HTTP response exists.
#[derive(Debug, ThisError)]
pub enum TransportFault {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error: {source}.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error: {0}.")]
	Io(#[from] std::io::Error),
	/// The request could not be handed to the transport.
	#[error("Request could not be dispatched: {source}.")]
	Request {
		/// Request conversion failure.
		#[source]
		source: BoxError,
	},
	/// The call did not complete within the configured timeout.
	#[error("Request timed out after {after:?}.")]
	TimedOut {
		/// Configured timeout that elapsed.
		after: StdDuration,
	},
	/// Transport reported a failure without further structure.
	#[error("HTTP client error: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportFault {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns `true` for elapsed timeouts.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::TimedOut { .. })
	}
}

/// Failures raised while obtaining a partner access token.
///
/// No variant ever leaves a token in the cache.
#[derive(Debug, ThisError)]
pub enum TokenAcquisitionError {
	/// Token request could not be constructed.
	#[error("Token request could not be constructed.")]
	Request(#[from] oauth2::http::Error),
	/// Token endpoint could not be reached.
	#[error("Token endpoint is unreachable: {0}")]
	Transport(#[from] TransportFault),
	/// Token endpoint answered with a non-2xx status.
	#[error("Token endpoint returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body: String,
	},
	/// Token endpoint responded with a body that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// Truncated response body.
		body: String,
	},
	/// Token endpoint omitted the access token or returned an empty one.
	#[error("Token endpoint returned no access token.")]
	EmptyAccessToken {
		/// Truncated response body.
		body: String,
	},
	/// Token endpoint omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn {
		/// Truncated response body.
		body: String,
	},
	/// Token endpoint returned a non-positive lifetime.
	#[error("The expires_in value must be positive, got {expires_in}.")]
	NonPositiveExpiresIn {
		/// Lifetime reported by the partner.
		expires_in: i64,
	},
	/// Token endpoint returned a lifetime whose expiry instant is not representable.
	#[error("The expires_in value {expires_in} is out of range.")]
	ExpiresInOutOfRange {
		/// Lifetime reported by the partner.
		expires_in: i64,
	},
}
impl TokenAcquisitionError {
	/// Raw diagnostic text supplied by the partner, if any.
	pub fn diagnostic(&self) -> Option<&str> {
		match self {
			Self::Status { body, .. }
			| Self::Parse { body, .. }
			| Self::EmptyAccessToken { body }
			| Self::MissingExpiresIn { body } => Some(body.as_str()).filter(|body| !body.is_empty()),
			_ => None,
		}
	}
}

/// Transport failures raised by partner operations.
#[derive(Debug, ThisError)]
pub enum PartnerTransportError {
	/// Partner operation could not be reached.
	#[error("Partner `{operation}` call failed: {source}")]
	Transport {
		/// Operation being executed.
		operation: PartnerOperation,
		/// Underlying transport fault.
		#[source]
		source: TransportFault,
	},
	/// Partner operation answered with a non-2xx status.
	#[error("Partner `{operation}` call returned HTTP {status}.")]
	Status {
		/// Operation being executed.
		operation: PartnerOperation,
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body: String,
	},
	/// Partner operation answered with a body that is not JSON.
	#[error("Partner `{operation}` call returned a body that is not valid JSON.")]
	InvalidBody {
		/// Operation being executed.
		operation: PartnerOperation,
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body: String,
		/// JSON parsing failure.
		#[source]
		source: serde_json::Error,
	},
}
impl PartnerTransportError {
	/// Operation that failed.
	pub fn operation(&self) -> PartnerOperation {
		match self {
			Self::Transport { operation, .. }
			| Self::Status { operation, .. }
			| Self::InvalidBody { operation, .. } => *operation,
		}
	}

	/// HTTP status returned by the partner, when a response arrived.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Transport { .. } => None,
			Self::Status { status, .. } | Self::InvalidBody { status, .. } => Some(*status),
		}
	}

	/// Truncated body returned by the partner, if any.
	pub fn body(&self) -> Option<&str> {
		match self {
			Self::Transport { .. } => None,
			Self::Status { body, .. } | Self::InvalidBody { body, .. } =>
				Some(body.as_str()).filter(|body| !body.is_empty()),
		}
	}
}
