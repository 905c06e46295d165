//! Partner routes: thin adapters from validated JSON bodies to [`PartnerGateway`] operations.
//!
//! [`PartnerGateway`]: crate::gateway::PartnerGateway

// crates.io
use axum::{
	Json,
	extract::{State, rejection::JsonRejection},
};
// self
use crate::{
	_prelude::*,
	normalize::{AccountInfo, AccountList, Normalized, TransactionList},
	partner::PartnerOperation,
	server::{AppState, parse_instant, problem::ApiError},
};

const ACCOUNT_NUMBER_REQUIRED: &str = "Hesap numarası zorunludur.";
const START_DATE_REQUIRED: &str =
	"Başlangıç tarihi zorunludur ve 'yyyy-MM-ddTHH:mm:ss+03:00' formatında olmalıdır.";
const END_DATE_REQUIRED: &str =
	"Bitiş tarihi zorunludur ve 'yyyy-MM-ddTHH:mm:ss+03:00' formatında olmalıdır.";
const RANGE_REVERSED: &str = "Başlangıç tarihi bitiş tarihinden sonra olamaz.";

/// Body of the account detail route.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountDetailRequest {
	/// Partner account number.
	#[serde(alias = "AccountNumber")]
	pub account_number: Option<String>,
}

/// Body of the account transactions route.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountTransactionsRequest {
	/// Partner account number.
	#[serde(alias = "AccountNumber")]
	pub account_number: Option<String>,
	/// RFC 3339 start instant with an explicit offset.
	#[serde(alias = "StartDate")]
	pub start_date: Option<String>,
	/// RFC 3339 end instant with an explicit offset.
	#[serde(alias = "EndDate")]
	pub end_date: Option<String>,
}

/// `POST /api/vakifbank/accounts`.
pub async fn accounts(
	State(state): State<AppState>,
) -> Result<Json<Normalized<AccountList>>, ApiError> {
	state
		.gateway
		.list_accounts()
		.await
		.map(Json)
		.map_err(|e| ApiError::partner(PartnerOperation::Accounts, e))
}

/// `POST /api/vakifbank/accountDetail`.
pub async fn account_detail(
	State(state): State<AppState>,
	payload: Result<Json<AccountDetailRequest>, JsonRejection>,
) -> Result<Json<Normalized<AccountInfo>>, ApiError> {
	let body = body_or_default(payload);
	let account_number = required(body.account_number.as_deref())
		.ok_or_else(|| ApiError::invalid_field("AccountNumber", ACCOUNT_NUMBER_REQUIRED))?;

	state
		.gateway
		.get_account_detail(account_number)
		.await
		.map(Json)
		.map_err(|e| ApiError::partner(PartnerOperation::AccountDetail, e))
}

/// `POST /api/vakifbank/transactions`.
pub async fn transactions(
	State(state): State<AppState>,
	payload: Result<Json<AccountTransactionsRequest>, JsonRejection>,
) -> Result<Json<Normalized<TransactionList>>, ApiError> {
	let body = body_or_default(payload);
	let mut errors = BTreeMap::new();
	let account_number = required(body.account_number.as_deref());

	if account_number.is_none() {
		errors.insert("AccountNumber".to_owned(), vec![ACCOUNT_NUMBER_REQUIRED.to_owned()]);
	}

	let start = required(body.start_date.as_deref()).and_then(|raw| parse_instant(raw).ok());
	let end = required(body.end_date.as_deref()).and_then(|raw| parse_instant(raw).ok());

	if start.is_none() {
		errors.insert("StartDate".to_owned(), vec![START_DATE_REQUIRED.to_owned()]);
	}
	if end.is_none() {
		errors.insert("EndDate".to_owned(), vec![END_DATE_REQUIRED.to_owned()]);
	}

	let (Some(account_number), Some(start), Some(end)) = (account_number, start, end) else {
		return Err(ApiError::Validation(errors));
	};

	if start > end {
		return Err(ApiError::invalid_field("StartDate", RANGE_REVERSED));
	}

	state
		.gateway
		.list_transactions(account_number, start, end)
		.await
		.map(Json)
		.map_err(|e| ApiError::partner(PartnerOperation::AccountTransactions, e))
}

fn body_or_default<T>(payload: Result<Json<T>, JsonRejection>) -> T
where
	T: Default,
{
	match payload {
		Ok(Json(body)) => body,
		Err(rejection) => {
			tracing::debug!(error = %rejection, "Partner route body rejected; validating as empty.");

			T::default()
		},
	}
}

fn required(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}
