//! Observability helpers for partner calls.
//!
//! Every token exchange and partner operation runs inside a `bank_gateway.call` span carrying
//! the `call` and `stage` fields. With the `metrics` feature enabled the
//! `bank_gateway_call_total` counter is incremented for every attempt/success/failure,
//! labeled by `call` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, partner::PartnerOperation};

/// Outbound call kinds observed by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// `b2b_credentials` token exchange.
	Token,
	/// Account list operation.
	Accounts,
	/// Account detail operation.
	AccountDetail,
	/// Account transactions operation.
	AccountTransactions,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Token => "token",
			CallKind::Accounts => "accounts",
			CallKind::AccountDetail => "account_detail",
			CallKind::AccountTransactions => "account_transactions",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl From<PartnerOperation> for CallKind {
	fn from(operation: PartnerOperation) -> Self {
		match operation {
			PartnerOperation::Accounts => CallKind::Accounts,
			PartnerOperation::AccountDetail => CallKind::AccountDetail,
			PartnerOperation::AccountTransactions => CallKind::AccountTransactions,
		}
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a gateway call.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
