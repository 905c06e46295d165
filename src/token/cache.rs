//! Single-slot token cache with singleflight refresh.

// self
use crate::{
	_prelude::*,
	error::TokenAcquisitionError,
	partner::DEFAULT_REFRESH_MARGIN,
	token::{AccessToken, RefreshMetrics, TokenState},
};

/// Boxed future returned by [`TokenSource::exchange`].
pub type TokenFuture<'a> =
	Pin<Box<dyn Future<Output = Result<AccessToken, TokenAcquisitionError>> + 'a + Send>>;

/// Producer of fresh access tokens.
///
/// Implementations perform one exchange per call and never cache; caching belongs to
/// [`TokenCache`].
pub trait TokenSource
where
	Self: 'static + Send + Sync,
{
	/// Exchanges credentials for a new token issued at `issued_at`.
	fn exchange(&self, issued_at: OffsetDateTime) -> TokenFuture<'_>;
}

/// Holds the current partner token and refreshes it on demand.
pub struct TokenCache {
	source: Arc<dyn TokenSource>,
	current: RwLock<Option<AccessToken>>,
	refresh_guard: AsyncMutex<()>,
	refresh_margin: Duration,
	metrics: Arc<RefreshMetrics>,
}
impl TokenCache {
	/// Creates an empty cache backed by `source` with the default five minute margin.
	pub fn new(source: Arc<dyn TokenSource>) -> Self {
		Self {
			source,
			current: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
			refresh_margin: DEFAULT_REFRESH_MARGIN,
			metrics: Default::default(),
		}
	}

	/// Overrides the remaining lifetime under which the token is refreshed.
	pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = margin;

		self
	}

	/// Counters describing cache activity.
	pub fn refresh_metrics(&self) -> Arc<RefreshMetrics> {
		Arc::clone(&self.metrics)
	}

	/// Snapshot of the cached token, if any.
	pub fn current(&self) -> Option<AccessToken> {
		self.current.read().clone()
	}

	/// Validity of the cached token at `now`.
	pub fn state_at(&self, now: OffsetDateTime) -> TokenState {
		TokenState::of(self.current.read().as_ref(), now, self.refresh_margin)
	}

	/// Returns a token valid for at least the refresh margin, refreshing when needed.
	pub async fn get_valid_token(&self) -> Result<AccessToken, TokenAcquisitionError> {
		self.resolve(OffsetDateTime::now_utc).await
	}

	/// Same as [`get_valid_token`](Self::get_valid_token) with a caller-supplied clock reading.
	pub async fn get_valid_token_at(
		&self,
		now: OffsetDateTime,
	) -> Result<AccessToken, TokenAcquisitionError> {
		self.resolve(|| now).await
	}

	async fn resolve<F>(&self, clock: F) -> Result<AccessToken, TokenAcquisitionError>
	where
		F: Fn() -> OffsetDateTime,
	{
		if let Some(token) = self.fresh(clock()) {
			self.metrics.record_cache_hit();

			return Ok(token);
		}

		let _singleflight = self.refresh_guard.lock().await;
		let now = clock();

		// Another caller may have refreshed while this one waited on the guard.
		if let Some(token) = self.fresh(now) {
			self.metrics.record_cache_hit();

			return Ok(token);
		}

		self.metrics.record_attempt();

		match self.source.exchange(now).await {
			Ok(token) => {
				self.metrics.record_success();
				tracing::debug!(expires_at = %token.expires_at, "Partner token refreshed.");

				*self.current.write() = Some(token.clone());

				Ok(token)
			},
			Err(err) => {
				self.metrics.record_failure();

				match self.current().filter(|token| token.is_unexpired_at(now)) {
					Some(stale) => {
						self.metrics.record_stale_fallback();
						tracing::warn!(
							error = %err,
							body = err.diagnostic(),
							expires_at = %stale.expires_at,
							"Token refresh failed; serving the still-unexpired token."
						);

						Ok(stale)
					},
					None => {
						tracing::error!(
							error = %err,
							body = err.diagnostic(),
							"Token refresh failed."
						);

						Err(err)
					},
				}
			},
		}
	}

	fn fresh(&self, now: OffsetDateTime) -> Option<AccessToken> {
		let guard = self.current.read();
		let token = guard.as_ref()?;

		(!token.state_at(now, self.refresh_margin).needs_refresh()).then(|| token.clone())
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("current", &*self.current.read())
			.field("refresh_margin", &self.refresh_margin)
			.finish_non_exhaustive()
	}
}
