//! Local (MyBank) ledger: users, accounts, and transactions owned by this service.
//!
//! [`LedgerStore`] is the persistence contract; [`MemoryLedger`] and [`FileLedger`] implement it
//! over a shared [`LedgerSnapshot`] that enforces uniqueness and foreign keys. [`LedgerService`]
//! layers user scoping, password hashing, and date filtering on top.

pub mod file;
pub mod memory;
pub mod seed;
pub mod service;

pub use file::FileLedger;
pub use memory::MemoryLedger;
pub use seed::seed_demo;
pub use service::*;

// self
use crate::_prelude::*;

/// Boxed future returned by [`LedgerStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Error type produced by [`LedgerStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// A uniqueness constraint was violated.
	#[error("{entity} `{key}` already exists.")]
	Conflict {
		/// Entity kind.
		entity: &'static str,
		/// Conflicting key.
		key: String,
	},
	/// A foreign key points at a missing row.
	#[error("{entity} references missing {target} #{id}.")]
	Constraint {
		/// Entity being inserted.
		entity: &'static str,
		/// Referenced entity kind.
		target: &'static str,
		/// Missing identifier.
		id: i64,
	},
}

/// Registered local user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalUser {
	/// Primary key.
	pub id: i64,
	/// Unique login name.
	pub username: String,
	/// Lowercase hex SHA-256 of the password.
	pub password_hash: String,
}

/// Local bank account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAccount {
	/// Primary key.
	pub id: i64,
	/// Unique account number.
	pub account_number: String,
	/// IBAN.
	pub iban: String,
	/// Current balance.
	pub balance: Decimal,
	/// Currency code (`TL`, `USD`, ...).
	pub currency_code: String,
	/// Display name.
	pub account_name: String,
	/// Owning user.
	pub user_id: i64,
}

/// Movement on a local account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTransaction {
	/// Primary key.
	pub id: i64,
	/// Account the movement belongs to.
	pub bank_account_id: i64,
	/// Signed amount; withdrawals are negative.
	pub amount: Decimal,
	/// Free-form type label.
	pub transaction_type: String,
	/// Description.
	pub description: String,
	/// Booking instant (UTC).
	#[serde(with = "time::serde::rfc3339")]
	pub transaction_date: OffsetDateTime,
}

/// Account fields supplied on insert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAccount {
	/// Unique account number.
	pub account_number: String,
	/// IBAN.
	pub iban: String,
	/// Opening balance.
	pub balance: Decimal,
	/// Currency code.
	pub currency_code: String,
	/// Display name.
	pub account_name: String,
	/// Owning user.
	pub user_id: i64,
}

/// Transaction fields supplied on insert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTransaction {
	/// Account the movement belongs to.
	pub bank_account_id: i64,
	/// Signed amount.
	pub amount: Decimal,
	/// Type label.
	pub transaction_type: String,
	/// Description.
	pub description: String,
	/// Booking instant.
	pub transaction_date: OffsetDateTime,
}

/// Persistence contract for the local ledger.
pub trait LedgerStore
where
	Self: Send + Sync,
{
	/// Inserts a user; fails with [`StoreError::Conflict`] when the username is taken.
	fn insert_user(&self, username: String, password_hash: String) -> StoreFuture<'_, LocalUser>;

	/// Looks a user up by exact username.
	fn find_user<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<LocalUser>>;

	/// Inserts an account for an existing user with a unique account number.
	fn insert_account(&self, account: NewAccount) -> StoreFuture<'_, LocalAccount>;

	/// Lists the accounts owned by `user_id`.
	fn accounts_for_user(&self, user_id: i64) -> StoreFuture<'_, Vec<LocalAccount>>;

	/// Looks an account up by primary key.
	fn find_account(&self, account_id: i64) -> StoreFuture<'_, Option<LocalAccount>>;

	/// Inserts a transaction on an existing account.
	fn insert_transaction(&self, transaction: NewTransaction)
	-> StoreFuture<'_, LocalTransaction>;

	/// Lists every transaction of `account_id`.
	fn transactions_for_account(&self, account_id: i64) -> StoreFuture<'_, Vec<LocalTransaction>>;
}

/// In-memory image of the whole ledger, shared by the built-in stores.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSnapshot {
	/// Users by insertion order.
	pub users: Vec<LocalUser>,
	/// Accounts by insertion order.
	pub accounts: Vec<LocalAccount>,
	/// Transactions by insertion order.
	pub transactions: Vec<LocalTransaction>,
}
impl LedgerSnapshot {
	pub(crate) fn insert_user(
		&mut self,
		username: String,
		password_hash: String,
	) -> Result<LocalUser, StoreError> {
		if self.users.iter().any(|user| user.username == username) {
			return Err(StoreError::Conflict { entity: "User", key: username });
		}

		let user = LocalUser {
			id: next_id(self.users.iter().map(|user| user.id)),
			username,
			password_hash,
		};

		self.users.push(user.clone());

		Ok(user)
	}

	pub(crate) fn find_user(&self, username: &str) -> Option<LocalUser> {
		self.users.iter().find(|user| user.username == username).cloned()
	}

	pub(crate) fn insert_account(&mut self, new: NewAccount) -> Result<LocalAccount, StoreError> {
		if !self.users.iter().any(|user| user.id == new.user_id) {
			return Err(StoreError::Constraint { entity: "Account", target: "user", id: new.user_id });
		}
		if self.accounts.iter().any(|account| account.account_number == new.account_number) {
			return Err(StoreError::Conflict { entity: "Account", key: new.account_number });
		}

		let account = LocalAccount {
			id: next_id(self.accounts.iter().map(|account| account.id)),
			account_number: new.account_number,
			iban: new.iban,
			balance: new.balance,
			currency_code: new.currency_code,
			account_name: new.account_name,
			user_id: new.user_id,
		};

		self.accounts.push(account.clone());

		Ok(account)
	}

	pub(crate) fn accounts_for_user(&self, user_id: i64) -> Vec<LocalAccount> {
		self.accounts.iter().filter(|account| account.user_id == user_id).cloned().collect()
	}

	pub(crate) fn find_account(&self, account_id: i64) -> Option<LocalAccount> {
		self.accounts.iter().find(|account| account.id == account_id).cloned()
	}

	pub(crate) fn insert_transaction(
		&mut self,
		new: NewTransaction,
	) -> Result<LocalTransaction, StoreError> {
		if !self.accounts.iter().any(|account| account.id == new.bank_account_id) {
			return Err(StoreError::Constraint {
				entity: "Transaction",
				target: "account",
				id: new.bank_account_id,
			});
		}

		let transaction = LocalTransaction {
			id: next_id(self.transactions.iter().map(|transaction| transaction.id)),
			bank_account_id: new.bank_account_id,
			amount: new.amount,
			transaction_type: new.transaction_type,
			description: new.description,
			transaction_date: new.transaction_date,
		};

		self.transactions.push(transaction.clone());

		Ok(transaction)
	}

	pub(crate) fn transactions_for_account(&self, account_id: i64) -> Vec<LocalTransaction> {
		self.transactions
			.iter()
			.filter(|transaction| transaction.bank_account_id == account_id)
			.cloned()
			.collect()
	}
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
	ids.max().unwrap_or(0) + 1
}
