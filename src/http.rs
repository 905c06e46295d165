//! Transport primitives for partner calls.
//!
//! The module exposes [`PartnerHttpClient`], the gateway's only dependency on an HTTP stack.
//! Both the token exchange and the partner operations go through [`dispatch`], which bounds
//! every call by the descriptor's timeout and classifies transport failures with a
//! [`TransportErrorMapper`].

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{_prelude::*, error::TransportFault, oauth::TransportErrorMapper, obs::CallKind};

/// Longest body excerpt kept in errors and logs.
pub const BODY_PREVIEW_LIMIT: usize = 512;

/// Abstraction over HTTP transports capable of executing partner calls.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared across gateway
/// instances, and the handles they return must own whatever state is required so their
/// request futures remain `Send` for the lifetime of the in-flight call.
pub trait PartnerHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single call.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle for one outbound call.
	fn handle(&self) -> Self::Handle;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Partner endpoints answer directly, so clients built by [`with_timeout`](Self::with_timeout)
/// never follow redirects. Configure any custom [`ReqwestClient`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with redirects disabled and the provided request timeout.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.timeout(timeout)
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl PartnerHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`PartnerHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Sends `request` through `client`, bounded by `timeout`.
pub(crate) async fn dispatch<C, M>(
	client: &C,
	mapper: &M,
	call: CallKind,
	timeout: StdDuration,
	request: HttpRequest,
) -> Result<HttpResponse, TransportFault>
where
	C: ?Sized + PartnerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let handle = client.handle();

	match tokio::time::timeout(timeout, handle.call(request)).await {
		Ok(Ok(response)) => Ok(response),
		Ok(Err(err)) => Err(mapper.map_transport_error(call, timeout, err)),
		Err(_) => Err(TransportFault::TimedOut { after: timeout }),
	}
}

/// Lossy UTF-8 excerpt of `body`, bounded by [`BODY_PREVIEW_LIMIT`] characters.
pub fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	if text.chars().count() <= BODY_PREVIEW_LIMIT {
		text.into_owned()
	} else {
		let mut preview = text.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

		preview.push_str("...");

		preview
	}
}
