//! Wire-level partner records and the typed model they normalize into.

// self
use crate::{
	_prelude::*,
	normalize::{LooseScalar, NormalizationError, numeric},
};

/// Account record as delivered by the partner, after key folding.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawAccount {
	#[serde(rename = "accountnumber")]
	account_number: Option<LooseScalar>,
	iban: Option<LooseScalar>,
	balance: Option<LooseScalar>,
	#[serde(rename = "remainingbalance")]
	remaining_balance: Option<LooseScalar>,
	#[serde(rename = "currencycode")]
	currency_code: Option<LooseScalar>,
	#[serde(rename = "accounttype")]
	account_type: Option<LooseScalar>,
	#[serde(rename = "lasttransactiondate")]
	last_transaction_date: Option<LooseScalar>,
	#[serde(rename = "accountstatus")]
	account_status: Option<LooseScalar>,
	#[serde(rename = "branchcode")]
	branch_code: Option<LooseScalar>,
	#[serde(rename = "customernumber")]
	customer_number: Option<LooseScalar>,
	#[serde(rename = "openingdate")]
	opening_date: Option<LooseScalar>,
}

/// Transaction record as delivered by the partner, after key folding.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawTransaction {
	#[serde(rename = "transactionid")]
	transaction_id: Option<LooseScalar>,
	#[serde(rename = "transactiondate")]
	transaction_date: Option<LooseScalar>,
	amount: Option<LooseScalar>,
	#[serde(rename = "currencycode")]
	currency_code: Option<LooseScalar>,
	description: Option<LooseScalar>,
	#[serde(rename = "transactiontype")]
	transaction_type: Option<LooseScalar>,
	balance: Option<LooseScalar>,
	#[serde(rename = "transactioncode")]
	transaction_code: Option<LooseScalar>,
	#[serde(rename = "transactionname")]
	transaction_name: Option<LooseScalar>,
}

/// Normalized account row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
	/// Partner account number.
	pub account_number: Option<String>,
	/// IBAN of the account.
	pub iban: Option<String>,
	/// Ledger balance.
	pub balance: Option<Decimal>,
	/// Available balance.
	pub remaining_balance: Option<Decimal>,
	/// ISO-like currency code (`TL`, `USD`, ...).
	pub currency_code: Option<String>,
	/// Partner account type code.
	pub account_type: Option<String>,
	/// Date of the last movement, as reported.
	pub last_transaction_date: Option<String>,
	/// Partner account status code.
	pub account_status: Option<String>,
	/// Owning branch code.
	pub branch_code: Option<String>,
}
impl AccountSummary {
	/// Converts a wire record; `path` prefixes numeric field names in errors.
	pub fn from_raw(raw: &RawAccount, path: &str) -> Result<Self, NormalizationError> {
		Ok(Self {
			account_number: numeric::text(raw.account_number.as_ref()),
			iban: numeric::text(raw.iban.as_ref()),
			balance: numeric::parse_decimal(&format!("{path}.balance"), raw.balance.as_ref())?,
			remaining_balance: numeric::parse_decimal(
				&format!("{path}.remainingBalance"),
				raw.remaining_balance.as_ref(),
			)?,
			currency_code: numeric::text(raw.currency_code.as_ref()),
			account_type: numeric::text(raw.account_type.as_ref()),
			last_transaction_date: numeric::text(raw.last_transaction_date.as_ref()),
			account_status: numeric::text(raw.account_status.as_ref()),
			branch_code: numeric::text(raw.branch_code.as_ref()),
		})
	}
}

/// Normalized account detail: the summary plus ownership fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetail {
	/// Fields shared with [`AccountSummary`].
	#[serde(flatten)]
	pub summary: AccountSummary,
	/// Partner customer number of the owner.
	pub customer_number: Option<String>,
	/// Opening date, as reported.
	pub opening_date: Option<String>,
}
impl AccountDetail {
	/// Converts a wire record.
	pub fn from_raw(raw: &RawAccount) -> Result<Self, NormalizationError> {
		Ok(Self {
			summary: AccountSummary::from_raw(raw, "accountInfo")?,
			customer_number: numeric::text(raw.customer_number.as_ref()),
			opening_date: numeric::text(raw.opening_date.as_ref()),
		})
	}
}

/// Direction of a partner transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TransactionType {
	/// Incoming funds, wire code `1`.
	#[serde(rename = "1")]
	Credit,
	/// Outgoing funds, wire code `2`.
	#[serde(rename = "2")]
	Debit,
}
impl TransactionType {
	/// Wire code of the direction.
	pub const fn code(self) -> &'static str {
		match self {
			TransactionType::Credit => "1",
			TransactionType::Debit => "2",
		}
	}

	fn from_raw(path: &str, raw: Option<&LooseScalar>) -> Result<Self, NormalizationError> {
		match raw.map(LooseScalar::to_text).as_deref() {
			Some("1") => Ok(TransactionType::Credit),
			Some("2") => Ok(TransactionType::Debit),
			Some(other) => Err(NormalizationError::MalformedData {
				detail: format!("{path}.transactionType has unknown code {other:?}"),
			}),
			None => Err(NormalizationError::MalformedData {
				detail: format!("{path}.transactionType is missing"),
			}),
		}
	}
}

/// Normalized transaction row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
	/// Partner transaction identifier.
	pub transaction_id: Option<String>,
	/// Booking date, as reported.
	pub transaction_date: Option<String>,
	/// Transaction amount.
	pub amount: Option<Decimal>,
	/// ISO-like currency code (`TL`, `USD`, ...).
	pub currency_code: Option<String>,
	/// Free-text description.
	pub description: Option<String>,
	/// Direction of the transaction.
	pub transaction_type: TransactionType,
	/// Account balance after the transaction.
	pub balance: Option<Decimal>,
	/// Partner transaction code.
	pub transaction_code: Option<String>,
	/// Partner transaction name.
	pub transaction_name: Option<String>,
}
impl TransactionRecord {
	/// Converts a wire record; `path` prefixes field names in errors.
	pub fn from_raw(raw: &RawTransaction, path: &str) -> Result<Self, NormalizationError> {
		Ok(Self {
			transaction_id: numeric::text(raw.transaction_id.as_ref()),
			transaction_date: numeric::text(raw.transaction_date.as_ref()),
			amount: numeric::parse_decimal(&format!("{path}.amount"), raw.amount.as_ref())?,
			currency_code: numeric::text(raw.currency_code.as_ref()),
			description: numeric::text(raw.description.as_ref()),
			transaction_type: TransactionType::from_raw(path, raw.transaction_type.as_ref())?,
			balance: numeric::parse_decimal(&format!("{path}.balance"), raw.balance.as_ref())?,
			transaction_code: numeric::text(raw.transaction_code.as_ref()),
			transaction_name: numeric::text(raw.transaction_name.as_ref()),
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn raw_transaction(value: serde_json::Value) -> RawTransaction {
		serde_json::from_value(value).expect("Raw transaction should deserialize.")
	}

	#[test]
	fn transaction_codes_map_to_directions() {
		let credit = TransactionRecord::from_raw(
			&raw_transaction(serde_json::json!({ "transactiontype": "1", "amount": "10.00" })),
			"accountTransactions[0]",
		)
		.expect("Credit should normalize.");
		let debit = TransactionRecord::from_raw(
			&raw_transaction(serde_json::json!({ "transactiontype": 2 })),
			"accountTransactions[1]",
		)
		.expect("Numeric debit code should normalize.");

		assert_eq!(credit.transaction_type, TransactionType::Credit);
		assert_eq!(credit.amount, Some(Decimal::new(1000, 2)));
		assert_eq!(debit.transaction_type, TransactionType::Debit);
	}

	#[test]
	fn unknown_transaction_code_is_malformed() {
		let err = TransactionRecord::from_raw(
			&raw_transaction(serde_json::json!({ "transactiontype": "3" })),
			"accountTransactions[0]",
		)
		.expect_err("Unknown code must be rejected.");

		assert!(matches!(err, NormalizationError::MalformedData { .. }));
	}

	#[test]
	fn numeric_errors_name_the_field_path() {
		let raw: RawAccount = serde_json::from_value(serde_json::json!({ "balance": "1,00" }))
			.expect("Raw account should deserialize.");
		let err = AccountSummary::from_raw(&raw, "accounts[2]")
			.expect_err("Comma decimal must be rejected.");

		assert_eq!(
			err,
			NormalizationError::NumericParse {
				field: "accounts[2].balance".into(),
				raw_value: "1,00".into(),
			}
		);
	}

	#[test]
	fn detail_flattens_summary_fields() {
		let raw: RawAccount = serde_json::from_value(serde_json::json!({
			"iban": "TR1",
			"balance": "5.50",
			"customernumber": 42,
		}))
		.expect("Raw account should deserialize.");
		let detail = AccountDetail::from_raw(&raw).expect("Detail should normalize.");
		let rendered = serde_json::to_value(&detail).expect("Detail should serialize.");

		assert_eq!(rendered["iban"], "TR1");
		assert_eq!(rendered["balance"], "5.50");
		assert_eq!(rendered["customerNumber"], "42");
	}
}
