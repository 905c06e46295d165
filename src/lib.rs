//! Banking aggregation gateway: cached partner bank tokens, normalized partner envelopes, and a
//! local ledger served behind one REST surface.
//!
//! The partner side is built bottom-up:
//!
//! - [`token`] owns the single cached bearer token and refreshes it through a
//!   [`token::TokenSource`] (the `b2b_credentials` exchange in [`oauth`]).
//! - [`executor`] issues authenticated POST calls to the partner operations.
//! - [`normalize`] validates partner envelopes and converts loose payloads into typed records.
//! - [`gateway`] composes the three into the operations consumed by the HTTP layer.
//!
//! The local side lives in [`ledger`], and the `server` feature wires everything into an axum
//! router.

#![deny(clippy::all)]
#![warn(missing_docs, unused_crate_dependencies)]

pub mod error;
pub mod executor;
pub mod gateway;
pub mod http;
pub mod ledger;
pub mod normalize;
pub mod oauth;
pub mod obs;
pub mod partner;
#[cfg(feature = "server")] pub mod server;
pub mod token;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		gateway::PartnerGateway,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		partner::{PartnerCredentials, PartnerDescriptor},
	};

	/// Gateway type alias used by reqwest-backed integration tests.
	pub type ReqwestTestGateway = PartnerGateway<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.timeout(std::time::Duration::from_secs(5))
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Credentials used by every test descriptor.
	pub fn test_credentials() -> PartnerCredentials {
		PartnerCredentials::new("gateway-client", "gateway-secret")
			.with_consent_id("consent-1")
			.with_scope("account")
			.with_resource("sandbox")
	}

	/// Builds a descriptor whose token endpoint and operation base point at the provided URLs.
	pub fn test_descriptor(token_url: &str, base_url: &str) -> PartnerDescriptor {
		PartnerDescriptor::builder("vakifbank-test")
			.token_endpoint(Url::parse(token_url).expect("Mock token endpoint should parse."))
			.base_endpoint(Url::parse(base_url).expect("Mock base endpoint should parse."))
			.credentials(test_credentials())
			.require_https(false)
			.build()
			.expect("Test descriptor should build successfully.")
	}

	/// Constructs a [`PartnerGateway`] backed by the insecure reqwest transport.
	pub fn build_reqwest_test_gateway(descriptor: PartnerDescriptor) -> ReqwestTestGateway {
		PartnerGateway::with_http_client(
			descriptor,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use rust_decimal::Decimal;
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use rust_decimal;
pub use url;
#[cfg(feature = "server")] use {anyhow as _, clap as _, tracing_subscriber as _};
#[cfg(test)] use {httpmock as _, tower as _};
