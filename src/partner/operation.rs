//! Partner operation catalog and the success codes each operation reports.

// self
use crate::_prelude::*;

/// Operations exposed by the partner API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerOperation {
	/// Lists every account visible to the consent.
	Accounts,
	/// Returns the detail of one account.
	AccountDetail,
	/// Lists the transactions of one account within a date range.
	AccountTransactions,
}
impl PartnerOperation {
	/// Returns a stable label suitable for log fields and error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			PartnerOperation::Accounts => "accounts",
			PartnerOperation::AccountDetail => "account_detail",
			PartnerOperation::AccountTransactions => "account_transactions",
		}
	}

	/// Path of the operation relative to the partner base URL.
	pub const fn path(self) -> &'static str {
		match self {
			PartnerOperation::Accounts => "accountList",
			PartnerOperation::AccountDetail => "accountDetail",
			PartnerOperation::AccountTransactions => "accountTransactions",
		}
	}
}
impl Display for PartnerOperation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Status codes the partner reports on success, one per operation.
///
/// The partner uses two schemes: the account list answers `00000` while the gateway-routed
/// operations answer `APIGW000000`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuccessCodes {
	/// Success code for [`PartnerOperation::Accounts`].
	pub accounts: String,
	/// Success code for [`PartnerOperation::AccountDetail`].
	pub account_detail: String,
	/// Success code for [`PartnerOperation::AccountTransactions`].
	pub account_transactions: String,
}
impl SuccessCodes {
	/// Returns the success code configured for `operation`.
	pub fn for_operation(&self, operation: PartnerOperation) -> &str {
		match operation {
			PartnerOperation::Accounts => &self.accounts,
			PartnerOperation::AccountDetail => &self.account_detail,
			PartnerOperation::AccountTransactions => &self.account_transactions,
		}
	}

	pub(crate) fn iter(&self) -> impl Iterator<Item = (PartnerOperation, &str)> {
		[
			PartnerOperation::Accounts,
			PartnerOperation::AccountDetail,
			PartnerOperation::AccountTransactions,
		]
		.into_iter()
		.map(|operation| (operation, self.for_operation(operation)))
	}
}
impl Default for SuccessCodes {
	fn default() -> Self {
		Self {
			accounts: "00000".into(),
			account_detail: "APIGW000000".into(),
			account_transactions: "APIGW000000".into(),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn default_success_codes_follow_partner_schemes() {
		let codes = SuccessCodes::default();

		assert_eq!(codes.for_operation(PartnerOperation::Accounts), "00000");
		assert_eq!(codes.for_operation(PartnerOperation::AccountDetail), "APIGW000000");
		assert_eq!(codes.for_operation(PartnerOperation::AccountTransactions), "APIGW000000");
	}

	#[test]
	fn partial_success_codes_keep_defaults() {
		let codes: SuccessCodes = serde_json::from_str(r#"{"accounts":"0"}"#)
			.expect("Partial success codes should deserialize.");

		assert_eq!(codes.accounts, "0");
		assert_eq!(codes.account_detail, "APIGW000000");
	}
}
