//! Partner envelope validation and payload normalization.
//!
//! Every partner operation answers `{ Header: { StatusCode, ... }, Data: { <key>: ... } }` with
//! inconsistent key casing, per-operation success codes, and string-typed numerics.
//! [`normalize`] folds keys to lowercase, checks the header against the expected success code,
//! and converts the payload through fallible parsers. It is a pure function of its input.
//!
//! Two sibling keys that differ only in casing (`Header` and `header`) are ambiguous and make the
//! envelope malformed.

mod model;
mod numeric;

pub use model::*;
pub use numeric::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::FailureKind, partner::PartnerOperation};

/// Envelope-level and field-level contract violations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum NormalizationError {
	/// The response carries no `header` object.
	#[error("Partner response is missing its header.")]
	MissingHeader,
	/// The partner reported a status code other than the expected success code.
	#[error(
		"Partner reported status {}: {}.",
		.status_code.as_deref().unwrap_or("<none>"),
		.status_description.as_deref().unwrap_or("no description")
	)]
	PartnerBusiness {
		/// Status code returned by the partner.
		status_code: Option<String>,
		/// Partner-supplied description, passed through verbatim.
		status_description: Option<String>,
	},
	/// The payload is missing or has the wrong shape.
	#[error("Partner response data is malformed: {detail}.")]
	MalformedData {
		/// What was wrong and where.
		detail: String,
	},
	/// A numeric string could not be parsed as an exact decimal.
	#[error("Field `{field}` is not a valid decimal: {raw_value:?}.")]
	NumericParse {
		/// Path of the offending field.
		field: String,
		/// Raw text as received.
		raw_value: String,
	},
}
impl NormalizationError {
	/// Facade-level classification.
	pub fn kind(&self) -> FailureKind {
		match self {
			Self::PartnerBusiness { .. } => FailureKind::PartnerBusinessError,
			Self::MissingHeader | Self::MalformedData { .. } | Self::NumericParse { .. } =>
				FailureKind::MalformedResponse,
		}
	}
}

/// Normalized partner header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeHeader {
	/// Partner status code.
	pub status_code: Option<String>,
	/// Status description (Turkish).
	pub status_description: Option<String>,
	/// Status description (English).
	pub status_description_en: Option<String>,
	/// Partner correlation identifier.
	pub object_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHeader {
	#[serde(rename = "statuscode")]
	status_code: Option<LooseScalar>,
	#[serde(rename = "statusdescription")]
	status_description: Option<LooseScalar>,
	#[serde(rename = "statusdescriptionen")]
	status_description_en: Option<LooseScalar>,
	#[serde(rename = "objectid")]
	object_id: Option<LooseScalar>,
}
impl From<RawHeader> for EnvelopeHeader {
	fn from(raw: RawHeader) -> Self {
		Self {
			status_code: numeric::text(raw.status_code.as_ref()),
			status_description: numeric::text(raw.status_description.as_ref()),
			status_description_en: numeric::text(raw.status_description_en.as_ref()),
			object_id: numeric::text(raw.object_id.as_ref()),
		}
	}
}

/// Normalized envelope handed to the HTTP layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Normalized<T> {
	/// Partner header.
	pub header: EnvelopeHeader,
	/// Typed payload.
	pub data: T,
}

/// Typed payload of one partner operation.
pub trait PartnerPayload
where
	Self: Sized,
{
	/// Operation producing this payload.
	const OPERATION: PartnerOperation;
	/// Lowercased key of the payload under `data`.
	const DATA_KEY: &'static str;

	/// Wire shape of the value under [`DATA_KEY`](Self::DATA_KEY).
	type Raw: DeserializeOwned;

	/// Converts the wire shape into the typed payload.
	fn convert(raw: Self::Raw) -> Result<Self, NormalizationError>;
}

/// Payload of the account list operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountList {
	/// Accounts visible to the consent.
	pub accounts: Vec<AccountSummary>,
}
impl PartnerPayload for AccountList {
	type Raw = Vec<RawAccount>;

	const DATA_KEY: &'static str = "accounts";
	const OPERATION: PartnerOperation = PartnerOperation::Accounts;

	fn convert(raw: Self::Raw) -> Result<Self, NormalizationError> {
		let accounts = raw
			.iter()
			.enumerate()
			.map(|(i, account)| AccountSummary::from_raw(account, &format!("accounts[{i}]")))
			.collect::<Result<_, _>>()?;

		Ok(Self { accounts })
	}
}

/// Payload of the account detail operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
	/// Account detail.
	pub account_info: AccountDetail,
}
impl PartnerPayload for AccountInfo {
	type Raw = RawAccount;

	const DATA_KEY: &'static str = "accountinfo";
	const OPERATION: PartnerOperation = PartnerOperation::AccountDetail;

	fn convert(raw: Self::Raw) -> Result<Self, NormalizationError> {
		Ok(Self { account_info: AccountDetail::from_raw(&raw)? })
	}
}

/// Payload of the account transactions operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionList {
	/// Transactions within the requested range.
	pub account_transactions: Vec<TransactionRecord>,
}
impl PartnerPayload for TransactionList {
	type Raw = Vec<RawTransaction>;

	const DATA_KEY: &'static str = "accounttransactions";
	const OPERATION: PartnerOperation = PartnerOperation::AccountTransactions;

	fn convert(raw: Self::Raw) -> Result<Self, NormalizationError> {
		let account_transactions = raw
			.iter()
			.enumerate()
			.map(|(i, transaction)| {
				TransactionRecord::from_raw(transaction, &format!("accountTransactions[{i}]"))
			})
			.collect::<Result<_, _>>()?;

		Ok(Self { account_transactions })
	}
}

/// Validates a raw partner body and converts it into `P`.
pub fn normalize<P>(
	raw: &JsonValue,
	expected_success_code: &str,
) -> Result<Normalized<P>, NormalizationError>
where
	P: PartnerPayload,
{
	let folded = fold_keys(raw.clone())?;
	let JsonValue::Object(mut envelope) = folded else {
		return Err(NormalizationError::MalformedData {
			detail: "response body is not a JSON object".into(),
		});
	};
	let header = match envelope.remove("header") {
		None | Some(JsonValue::Null) => return Err(NormalizationError::MissingHeader),
		Some(value) => decode::<RawHeader>("header", value)?,
	};
	let header = EnvelopeHeader::from(header);

	if header.status_code.as_deref() != Some(expected_success_code) {
		return Err(NormalizationError::PartnerBusiness {
			status_code: header.status_code,
			status_description: header.status_description.or(header.status_description_en),
		});
	}

	let payload = envelope
		.remove("data")
		.and_then(|data| match data {
			JsonValue::Object(mut data) => data.remove(P::DATA_KEY),
			_ => None,
		})
		.filter(|value| !value.is_null())
		.ok_or_else(|| NormalizationError::MalformedData {
			detail: format!("data.{} is missing", P::DATA_KEY),
		})?;
	let data = P::convert(decode::<P::Raw>(P::DATA_KEY, payload)?)?;

	Ok(Normalized { header, data })
}

/// Recursively lowercases every object key.
///
/// Fails with [`NormalizationError::MalformedData`] when two keys of one object fold to the same
/// name.
pub fn fold_keys(value: JsonValue) -> Result<JsonValue, NormalizationError> {
	match value {
		JsonValue::Object(map) => {
			let mut folded = serde_json::Map::with_capacity(map.len());

			for (key, value) in map {
				let lowered = key.to_lowercase();

				if folded.contains_key(&lowered) {
					return Err(NormalizationError::MalformedData {
						detail: format!(
							"key `{lowered}` appears more than once when case is ignored"
						),
					});
				}

				folded.insert(lowered, fold_keys(value)?);
			}

			Ok(JsonValue::Object(folded))
		},
		JsonValue::Array(items) =>
			items.into_iter().map(fold_keys).collect::<Result<_, _>>().map(JsonValue::Array),
		other => Ok(other),
	}
}

fn decode<T>(root: &str, value: JsonValue) -> Result<T, NormalizationError>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value).map_err(|err| NormalizationError::MalformedData {
		detail: format!("{root}.{}: {}", err.path(), err.inner()),
	})
}
