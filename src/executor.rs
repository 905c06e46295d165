//! Authenticated POST calls to the partner operations.

// crates.io
use oauth2::http::{
	Method, Request,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, PartnerTransportError},
	http::{self, PartnerHttpClient},
	oauth::TransportErrorMapper,
	obs::CallKind,
	partner::{PartnerDescriptor, PartnerOperation},
	token::TokenCache,
};

const PARTNER_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
	"[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
);

/// Formats `instant` as `yyyy-MM-ddTHH:mm:ss±HH:mm`, keeping its offset.
pub fn format_partner_date(instant: OffsetDateTime) -> Result<String, ConfigError> {
	Ok(instant.format(PARTNER_DATE_FORMAT)?)
}

/// Body of the account list call.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct AccountsBody {}

/// Body of the account detail call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountDetailBody {
	/// Partner account number.
	pub account_number: String,
}

/// Body of the account transactions call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountTransactionsBody {
	/// Partner account number.
	pub account_number: String,
	/// Range start in the partner date format.
	pub start_date: String,
	/// Range end in the partner date format.
	pub end_date: String,
}
impl AccountTransactionsBody {
	/// Builds the body, rendering both range bounds in the partner date format.
	pub fn new(
		account_number: impl Into<String>,
		start: OffsetDateTime,
		end: OffsetDateTime,
	) -> Result<Self, ConfigError> {
		Ok(Self {
			account_number: account_number.into(),
			start_date: format_partner_date(start)?,
			end_date: format_partner_date(end)?,
		})
	}
}

/// Raw partner answer: HTTP status plus the parsed JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Parsed JSON body.
	pub body: JsonValue,
}

/// Issues authenticated calls against the partner operations.
pub struct PartnerExecutor<C, M>
where
	C: ?Sized + PartnerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	descriptor: Arc<PartnerDescriptor>,
	tokens: Arc<TokenCache>,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> PartnerExecutor<C, M>
where
	C: ?Sized + PartnerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an executor sharing `tokens` with the rest of the gateway.
	pub fn new(
		descriptor: Arc<PartnerDescriptor>,
		tokens: Arc<TokenCache>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			descriptor,
			tokens,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		}
	}

	/// POSTs `body` to `operation`, authenticating with the cached token first.
	pub async fn execute<B>(&self, operation: PartnerOperation, body: &B) -> Result<RawResponse>
	where
		B: ?Sized + Serialize,
	{
		let payload = serde_json::to_vec(body)
			.map_err(|source| ConfigError::RequestBody { operation, source })?;
		let url = self.descriptor.operation_url(operation)?;
		let token = self.tokens.get_valid_token().await?;
		let request = Request::builder()
			.method(Method::POST)
			.uri(url.as_str())
			.header(AUTHORIZATION, token.bearer_header())
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json")
			.body(payload)
			.map_err(ConfigError::from)?;
		let response = http::dispatch(
			self.http_client.as_ref(),
			self.error_mapper.as_ref(),
			CallKind::from(operation),
			self.descriptor.timeout,
			request,
		)
		.await
		.map_err(|source| PartnerTransportError::Transport { operation, source })?;
		let status = response.status().as_u16();
		let bytes = response.body();

		tracing::debug!(
			operation = operation.as_str(),
			status,
			body = %http::body_preview(bytes),
			"Partner answered."
		);

		if !response.status().is_success() {
			return Err(PartnerTransportError::Status {
				operation,
				status,
				body: http::body_preview(bytes),
			}
			.into());
		}

		let body = serde_json::from_slice(bytes).map_err(|source| {
			PartnerTransportError::InvalidBody {
				operation,
				status,
				body: http::body_preview(bytes),
				source,
			}
		})?;

		Ok(RawResponse { status, body })
	}
}
