//! User-scoped ledger operations.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	ledger::{LedgerStore, LocalAccount, LocalTransaction, LocalUser, StoreError},
};

/// Exact password length accepted at registration.
pub const PASSWORD_LENGTH: usize = 6;

/// Result of a registration attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
	/// The user was created.
	Registered(LocalUser),
	/// The username is already in use.
	UsernameTaken,
	/// The password is not exactly [`PASSWORD_LENGTH`] characters long.
	PasswordLengthInvalid,
}

/// Optional inclusive bounds applied to transaction dates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
	/// Earliest instant to include.
	pub start: Option<OffsetDateTime>,
	/// Latest instant to include.
	pub end: Option<OffsetDateTime>,
}
impl DateRange {
	/// Returns `true` when `instant` falls within both bounds.
	pub fn contains(&self, instant: OffsetDateTime) -> bool {
		self.start.is_none_or(|start| instant >= start) && self.end.is_none_or(|end| instant <= end)
	}
}

/// Lowercase hex SHA-256 of `password`.
pub fn hash_password(password: &str) -> String {
	Sha256::digest(password.as_bytes()).iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Ledger operations scoped to the authenticated user.
#[derive(Clone)]
pub struct LedgerService {
	store: Arc<dyn LedgerStore>,
}
impl LedgerService {
	/// Wraps a store.
	pub fn new(store: Arc<dyn LedgerStore>) -> Self {
		Self { store }
	}

	/// Underlying store.
	pub fn store(&self) -> &Arc<dyn LedgerStore> {
		&self.store
	}

	/// Registers a new user.
	pub async fn register(&self, username: &str, password: &str) -> Result<RegisterOutcome> {
		if password.chars().count() != PASSWORD_LENGTH {
			tracing::warn!(username, "Registration rejected: invalid password length.");

			return Ok(RegisterOutcome::PasswordLengthInvalid);
		}
		if self.store.find_user(username).await?.is_some() {
			tracing::warn!(username, "Registration rejected: username taken.");

			return Ok(RegisterOutcome::UsernameTaken);
		}

		match self.store.insert_user(username.to_owned(), hash_password(password)).await {
			Ok(user) => {
				tracing::info!(username, user_id = user.id, "User registered.");

				Ok(RegisterOutcome::Registered(user))
			},
			Err(StoreError::Conflict { .. }) => Ok(RegisterOutcome::UsernameTaken),
			Err(e) => Err(e.into()),
		}
	}

	/// Returns the user when `password` matches the stored hash.
	pub async fn validate_user(&self, username: &str, password: &str) -> Result<Option<LocalUser>> {
		let Some(user) = self.store.find_user(username).await? else {
			tracing::warn!(username, "Login failed: unknown user.");

			return Ok(None);
		};

		if user.password_hash != hash_password(password) {
			tracing::warn!(username, "Login failed: wrong password.");

			return Ok(None);
		}

		Ok(Some(user))
	}

	/// Lists the accounts owned by `user_id`.
	pub async fn accounts(&self, user_id: i64) -> Result<Vec<LocalAccount>> {
		Ok(self.store.accounts_for_user(user_id).await?)
	}

	/// Finds the account with `iban` among those owned by `user_id`.
	pub async fn account_by_iban(&self, user_id: i64, iban: &str) -> Result<Option<LocalAccount>> {
		Ok(self.accounts(user_id).await?.into_iter().find(|account| account.iban == iban))
	}

	/// Lists transactions of `account_id` within `range`, newest first.
	///
	/// An account that does not exist or belongs to someone else yields an empty list.
	pub async fn transactions(
		&self,
		user_id: i64,
		account_id: i64,
		range: DateRange,
	) -> Result<Vec<LocalTransaction>> {
		let owned = self
			.store
			.find_account(account_id)
			.await?
			.is_some_and(|account| account.user_id == user_id);

		if !owned {
			tracing::warn!(user_id, account_id, "Transactions requested for a foreign account.");

			return Ok(Vec::new());
		}

		let mut transactions = self
			.store
			.transactions_for_account(account_id)
			.await?
			.into_iter()
			.filter(|transaction| range.contains(transaction.transaction_date))
			.collect::<Vec<_>>();

		transactions.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));

		Ok(transactions)
	}
}
impl Debug for LedgerService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("LedgerService(..)")
	}
}
