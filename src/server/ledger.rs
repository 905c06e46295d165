//! MyBank routes backed by the local ledger.

// crates.io
use axum::{
	Extension, Json,
	extract::{Path, State, rejection::JsonRejection},
};
// self
use crate::{
	_prelude::*,
	ledger::{DateRange, LocalAccount, LocalTransaction},
	server::{AppState, auth::Claims, json_body, parse_instant, problem::ApiError},
};

/// Body of the local transactions route.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LedgerTransactionsRequest {
	/// Local account id.
	#[serde(alias = "BankAccountId")]
	pub bank_account_id: i64,
	/// Optional inclusive lower bound (RFC 3339).
	#[serde(alias = "StartDate")]
	pub start_date: Option<String>,
	/// Optional inclusive upper bound (RFC 3339).
	#[serde(alias = "EndDate")]
	pub end_date: Option<String>,
}

/// `GET /api/mybank/accounts`.
pub async fn accounts(
	State(state): State<AppState>,
	Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<LocalAccount>>, ApiError> {
	Ok(Json(state.ledger.accounts(claims.user_id()?).await?))
}

/// `GET /api/mybank/AccountDetail/{iban}`.
pub async fn account_detail(
	State(state): State<AppState>,
	Extension(claims): Extension<Claims>,
	Path(iban): Path<String>,
) -> Result<Json<LocalAccount>, ApiError> {
	state.ledger.account_by_iban(claims.user_id()?, &iban).await?.map(Json).ok_or_else(|| {
		ApiError::NotFound("Hesap bulunamadı veya bu kullanıcıya ait değil.".into())
	})
}

/// `POST /api/mybank/transactions`.
pub async fn transactions(
	State(state): State<AppState>,
	Extension(claims): Extension<Claims>,
	payload: Result<Json<LedgerTransactionsRequest>, JsonRejection>,
) -> Result<Json<Vec<LocalTransaction>>, ApiError> {
	let body = json_body(payload)?;

	if body.bank_account_id <= 0 {
		return Err(ApiError::BadRequest("BankAccountId zorunludur.".into()));
	}

	let range = DateRange {
		start: optional_instant("StartDate", body.start_date.as_deref())?,
		end: optional_instant("EndDate", body.end_date.as_deref())?,
	};

	Ok(Json(state.ledger.transactions(claims.user_id()?, body.bank_account_id, range).await?))
}

fn optional_instant(field: &str, raw: Option<&str>) -> Result<Option<OffsetDateTime>, ApiError> {
	match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
		None => Ok(None),
		Some(raw) => parse_instant(raw)
			.map(Some)
			.map_err(|_| ApiError::invalid_field(field, "Geçerli bir ISO 8601 tarih olmalıdır.")),
	}
}
