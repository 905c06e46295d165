//! In-memory [`LedgerStore`] for tests and demo deployments.

// self
use crate::{
	_prelude::*,
	ledger::{
		LedgerSnapshot, LedgerStore, LocalAccount, LocalTransaction, LocalUser, NewAccount,
		NewTransaction, StoreFuture,
	},
};

/// Keeps the whole ledger in a process-local snapshot.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger(Arc<RwLock<LedgerSnapshot>>);
impl MemoryLedger {
	/// Creates a ledger pre-populated with `snapshot`.
	pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
		Self(Arc::new(RwLock::new(snapshot)))
	}

	/// Copy of the current contents.
	pub fn snapshot(&self) -> LedgerSnapshot {
		self.0.read().clone()
	}
}
impl LedgerStore for MemoryLedger {
	fn insert_user(&self, username: String, password_hash: String) -> StoreFuture<'_, LocalUser> {
		Box::pin(async move { self.0.write().insert_user(username, password_hash) })
	}

	fn find_user<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<LocalUser>> {
		Box::pin(async move { Ok(self.0.read().find_user(username)) })
	}

	fn insert_account(&self, account: NewAccount) -> StoreFuture<'_, LocalAccount> {
		Box::pin(async move { self.0.write().insert_account(account) })
	}

	fn accounts_for_user(&self, user_id: i64) -> StoreFuture<'_, Vec<LocalAccount>> {
		Box::pin(async move { Ok(self.0.read().accounts_for_user(user_id)) })
	}

	fn find_account(&self, account_id: i64) -> StoreFuture<'_, Option<LocalAccount>> {
		Box::pin(async move { Ok(self.0.read().find_account(account_id)) })
	}

	fn insert_transaction(
		&self,
		transaction: NewTransaction,
	) -> StoreFuture<'_, LocalTransaction> {
		Box::pin(async move { self.0.write().insert_transaction(transaction) })
	}

	fn transactions_for_account(&self, account_id: i64) -> StoreFuture<'_, Vec<LocalTransaction>> {
		Box::pin(async move { Ok(self.0.read().transactions_for_account(account_id)) })
	}
}
