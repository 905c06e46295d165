//! axum surface of the gateway: partner routes, MyBank routes, local sessions, and CORS.

pub mod auth;
pub mod config;
pub mod ledger;
pub mod partner;
pub mod problem;

pub use auth::{Claims, JwtKeys};
pub use config::GatewayConfig;
pub use problem::{ApiError, ProblemDetails};

// crates.io
use axum::{
	Json, Router,
	extract::rejection::JsonRejection,
	http::{HeaderValue, Method, header},
	middleware,
	routing::{get, post},
};
use time::format_description::well_known::Rfc3339;
use tower_http::cors::CorsLayer;
// self
use crate::{
	_prelude::*,
	gateway::ReqwestGateway,
	ledger::{FileLedger, LedgerService, LedgerStore, MemoryLedger, StoreError},
	server::config::ConfigFileError,
};

/// Failures raised while assembling the application from its configuration.
#[derive(Debug, ThisError)]
pub enum StartupError {
	/// Configuration is unusable.
	#[error(transparent)]
	Config(#[from] ConfigFileError),
	/// Partner gateway could not be constructed.
	#[error(transparent)]
	Gateway(#[from] Error),
	/// Ledger could not be opened or seeded.
	#[error(transparent)]
	Ledger(#[from] StoreError),
}

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
	/// Partner aggregation facade.
	pub gateway: Arc<ReqwestGateway>,
	/// Local ledger.
	pub ledger: LedgerService,
	/// Session token keys.
	pub jwt: Arc<JwtKeys>,
}
impl AppState {
	/// Builds the gateway, opens the ledger, and seeds demo data when configured.
	pub async fn from_config(config: &GatewayConfig) -> Result<Self, StartupError> {
		let gateway = ReqwestGateway::new(config.partner_descriptor()?)?;
		let store: Arc<dyn LedgerStore> = match &config.ledger.path {
			Some(path) => {
				tracing::info!(path = %path.display(), "Opening file-backed ledger.");

				Arc::new(FileLedger::open(path)?)
			},
			None => {
				tracing::info!("Using in-memory ledger.");

				Arc::new(MemoryLedger::default())
			},
		};

		if config.ledger.seed_demo
			&& crate::ledger::seed_demo(&*store, OffsetDateTime::now_utc()).await?
		{
			tracing::info!("Demo user and accounts seeded.");
		}

		Ok(Self {
			gateway: Arc::new(gateway),
			ledger: LedgerService::new(store),
			jwt: Arc::new(JwtKeys::new(&config.jwt)),
		})
	}
}

/// CORS policy admitting the configured front-end origin.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, ConfigFileError> {
	let origin = HeaderValue::from_str(origin).map_err(|e| ConfigFileError::Invalid {
		key: "server.cors_origin",
		reason: e.to_string(),
	})?;

	Ok(CorsLayer::new()
		.allow_origin(origin)
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

/// Builds the complete router.
///
/// Partner routes are mounted under `/api/vakifbank` and aliased under `/partner`. Every route
/// except [`auth::PUBLIC_PATHS`] requires a bearer session token.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
	let partner_routes = Router::new()
		.route("/accounts", post(partner::accounts))
		.route("/accountDetail", post(partner::account_detail))
		.route("/transactions", post(partner::transactions));

	Router::new()
		.route("/health", get(health))
		.route("/api/mybank/login", post(auth::login))
		.route("/api/mybank/register", post(auth::register))
		.route("/api/mybank/accounts", get(ledger::accounts))
		.route("/api/mybank/AccountDetail/{iban}", get(ledger::account_detail))
		.route("/api/mybank/transactions", post(ledger::transactions))
		.nest("/api/vakifbank", partner_routes.clone())
		.nest("/partner", partner_routes)
		.layer(middleware::from_fn_with_state(state.clone(), auth::auth_middleware))
		.layer(cors)
		.with_state(state)
}

async fn health() -> Json<JsonValue> {
	Json(serde_json::json!({ "status": "ok" }))
}

/// Unwraps a JSON body, turning extractor rejections into `400` problems.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
	payload.map(|Json(body)| body).map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Parses an RFC 3339 instant; the offset is mandatory and kept as sent.
pub(crate) fn parse_instant(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
	OffsetDateTime::parse(raw, &Rfc3339)
}
