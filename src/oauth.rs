//! `b2b_credentials` token exchange and transport error mapping.
//!
//! The partner's token endpoint speaks a client-credentials dialect with a custom grant type
//! and extra form fields, so the request is assembled by hand while the `oauth2` crate still
//! provides the transport seam ([`AsyncHttpClient`](oauth2::AsyncHttpClient)).

pub use oauth2;

// crates.io
use oauth2::{
	HttpClientError,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	error::{TokenAcquisitionError, TransportFault},
	http::{self, PartnerHttpClient},
	obs::{self, CallKind, CallOutcome, CallSpan},
	partner::PartnerDescriptor,
	token::{AccessToken, TokenFuture, TokenSecret, TokenSource},
};

/// Maps HTTP transport failures into gateway [`TransportFault`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a transport fault.
	fn map_transport_error(
		&self,
		call: CallKind,
		timeout: StdDuration,
		error: HttpClientError<E>,
	) -> TransportFault;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		call: CallKind,
		timeout: StdDuration,
		err: HttpClientError<ReqwestError>,
	) -> TransportFault {
		match err {
			HttpClientError::Reqwest(inner) if inner.is_timeout() => {
				tracing::debug!(call = call.as_str(), "Reqwest reported a timeout.");

				TransportFault::TimedOut { after: timeout }
			},
			HttpClientError::Reqwest(inner) if inner.is_builder() =>
				TransportFault::Request { source: inner },
			HttpClientError::Reqwest(inner) => TransportFault::network(*inner),
			HttpClientError::Http(inner) => TransportFault::Request { source: Box::new(inner) },
			HttpClientError::Io(inner) => TransportFault::Io(inner),
			HttpClientError::Other(message) => TransportFault::Other { message },
			_ => TransportFault::Other { message: format!("Unhandled {call} transport failure") },
		}
	}
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
	access_token: Option<String>,
	token_type: Option<String>,
	expires_in: Option<i64>,
	scope: Option<String>,
}

/// [`TokenSource`] performing the partner's `b2b_credentials` exchange.
pub struct ClientCredentialsExchange<C, M>
where
	C: ?Sized + PartnerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	descriptor: Arc<PartnerDescriptor>,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> ClientCredentialsExchange<C, M>
where
	C: ?Sized + PartnerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an exchange against the descriptor's token endpoint.
	pub fn new(
		descriptor: Arc<PartnerDescriptor>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Self {
		Self { descriptor, http_client: http_client.into(), error_mapper: error_mapper.into() }
	}

	async fn request_token(
		&self,
		issued_at: OffsetDateTime,
	) -> Result<AccessToken, TokenAcquisitionError> {
		let form = url::form_urlencoded::Serializer::new(String::new())
			.extend_pairs(self.descriptor.credentials.form_fields())
			.finish();
		let request = Request::builder()
			.method(Method::POST)
			.uri(self.descriptor.endpoints.token.as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json")
			.body(form.into_bytes())?;
		let response = http::dispatch(
			self.http_client.as_ref(),
			self.error_mapper.as_ref(),
			CallKind::Token,
			self.descriptor.timeout,
			request,
		)
		.await?;
		let status = response.status();
		let body = response.body();

		if !status.is_success() {
			return Err(TokenAcquisitionError::Status {
				status: status.as_u16(),
				body: http::body_preview(body),
			});
		}

		parse_token_response(body, issued_at)
	}
}
impl<C, M> TokenSource for ClientCredentialsExchange<C, M>
where
	C: ?Sized + PartnerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange(&self, issued_at: OffsetDateTime) -> TokenFuture<'_> {
		const KIND: CallKind = CallKind::Token;

		Box::pin(async move {
			let span = CallSpan::new(KIND, "exchange");

			obs::record_call_outcome(KIND, CallOutcome::Attempt);

			let result = span.instrument(self.request_token(issued_at)).await;

			match &result {
				Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
				Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
			}

			result
		})
	}
}

fn parse_token_response(
	body: &[u8],
	issued_at: OffsetDateTime,
) -> Result<AccessToken, TokenAcquisitionError> {
	let mut de = serde_json::Deserializer::from_slice(body);
	let response: TokenResponse = serde_path_to_error::deserialize(&mut de).map_err(|source| {
		TokenAcquisitionError::Parse { source, body: http::body_preview(body) }
	})?;
	let value = response
		.access_token
		.map(TokenSecret::new)
		.filter(|token| !token.is_blank())
		.ok_or_else(|| TokenAcquisitionError::EmptyAccessToken { body: http::body_preview(body) })?;
	let expires_in = response
		.expires_in
		.ok_or_else(|| TokenAcquisitionError::MissingExpiresIn { body: http::body_preview(body) })?;

	if expires_in <= 0 {
		return Err(TokenAcquisitionError::NonPositiveExpiresIn { expires_in });
	}

	let mut token = AccessToken::new(value, issued_at, Duration::seconds(expires_in))
		.ok_or(TokenAcquisitionError::ExpiresInOutOfRange { expires_in })?;

	if let Some(token_type) = response.token_type.filter(|kind| !kind.is_empty()) {
		token.token_type = token_type;
	}

	token.scope = response.scope;

	Ok(token)
}
