//! Aggregation facade consumed by the HTTP layer.
//!
//! [`PartnerGateway`] composes the token cache, the executor, and the normalizer into the
//! three partner operations. Its only mutable state is the shared [`TokenCache`]; within one
//! operation the token fetch strictly precedes the data call, and failures are never retried.

// self
use crate::{
	_prelude::*,
	error::FailureKind,
	executor::{AccountDetailBody, AccountTransactionsBody, AccountsBody, PartnerExecutor},
	http::PartnerHttpClient,
	normalize::{self, AccountInfo, AccountList, Normalized, PartnerPayload, TransactionList},
	oauth::{ClientCredentialsExchange, TransportErrorMapper},
	obs::{self, CallKind, CallOutcome, CallSpan},
	partner::PartnerDescriptor,
	token::TokenCache,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Gateway specialized for the crate's default reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ReqwestGateway = PartnerGateway<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Single entry point for partner data.
pub struct PartnerGateway<C, M>
where
	C: ?Sized + PartnerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	descriptor: Arc<PartnerDescriptor>,
	tokens: Arc<TokenCache>,
	executor: PartnerExecutor<C, M>,
}
impl<C, M> PartnerGateway<C, M>
where
	C: ?Sized + PartnerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a gateway whose token cache refreshes through the `b2b_credentials` exchange.
	pub fn with_http_client(
		descriptor: PartnerDescriptor,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let descriptor = Arc::new(descriptor);
		let http_client = http_client.into();
		let mapper = mapper.into();
		let exchange = <ClientCredentialsExchange<C, M>>::new(
			Arc::clone(&descriptor),
			Arc::clone(&http_client),
			Arc::clone(&mapper),
		);
		let tokens = Arc::new(
			TokenCache::new(Arc::new(exchange)).with_refresh_margin(descriptor.refresh_margin),
		);

		Self::with_token_cache(descriptor, tokens, http_client, mapper)
	}

	/// Creates a gateway around an existing token cache.
	pub fn with_token_cache(
		descriptor: Arc<PartnerDescriptor>,
		tokens: Arc<TokenCache>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let executor =
			PartnerExecutor::new(Arc::clone(&descriptor), Arc::clone(&tokens), http_client, mapper);

		Self { descriptor, tokens, executor }
	}

	/// Descriptor the gateway talks to.
	pub fn descriptor(&self) -> &PartnerDescriptor {
		&self.descriptor
	}

	/// Shared token cache.
	pub fn token_cache(&self) -> &Arc<TokenCache> {
		&self.tokens
	}

	/// Lists every account visible to the consent.
	pub async fn list_accounts(&self) -> Result<Normalized<AccountList>> {
		self.call(&AccountsBody::default()).await
	}

	/// Returns the detail of `account_number`.
	pub async fn get_account_detail(&self, account_number: &str) -> Result<Normalized<AccountInfo>> {
		self.call(&AccountDetailBody { account_number: account_number.to_owned() }).await
	}

	/// Lists the transactions of `account_number` between `start` and `end`.
	pub async fn list_transactions(
		&self,
		account_number: &str,
		start: OffsetDateTime,
		end: OffsetDateTime,
	) -> Result<Normalized<TransactionList>> {
		let body = AccountTransactionsBody::new(account_number, start, end)?;

		self.call(&body).await
	}

	async fn call<P, B>(&self, body: &B) -> Result<Normalized<P>>
	where
		P: PartnerPayload,
		B: Serialize + Sync,
	{
		let kind = CallKind::from(P::OPERATION);
		let span = CallSpan::new(kind, "gateway");

		obs::record_call_outcome(kind, CallOutcome::Attempt);

		let result = span
			.instrument(async {
				let raw = self.executor.execute(P::OPERATION, body).await?;

				normalize::normalize::<P>(&raw.body, self.descriptor.success_code(P::OPERATION))
					.map_err(Error::from)
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(kind, CallOutcome::Success),
			Err(err) => {
				obs::record_call_outcome(kind, CallOutcome::Failure);

				match err.kind() {
					FailureKind::MalformedResponse => tracing::error!(
						call = kind.as_str(),
						partner = %self.descriptor.id,
						error = %err,
						body = err.diagnostic(),
						"Partner response contract drift."
					),
					FailureKind::PartnerBusinessError => tracing::warn!(
						call = kind.as_str(),
						error = %err,
						"Partner reported a business failure."
					),
					_ => tracing::warn!(
						call = kind.as_str(),
						error = %err,
						body = err.diagnostic(),
						"Partner call failed."
					),
				}
			},
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl PartnerGateway<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a gateway with its own reqwest transport bounded by the descriptor timeout.
	pub fn new(descriptor: PartnerDescriptor) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(descriptor.timeout)?;

		Ok(Self::with_http_client(descriptor, http_client, Arc::new(ReqwestTransportErrorMapper)))
	}
}
impl<C, M> Debug for PartnerGateway<C, M>
where
	C: ?Sized + PartnerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PartnerGateway")
			.field("descriptor", &self.descriptor)
			.field("tokens", &self.tokens)
			.finish()
	}
}
