//! JSON-file-backed [`LedgerStore`] for single-node deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	ledger::{
		LedgerSnapshot, LedgerStore, LocalAccount, LocalTransaction, LocalUser, NewAccount,
		NewTransaction, StoreError, StoreFuture,
	},
};

/// Persists the ledger snapshot to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileLedger {
	path: PathBuf,
	inner: Arc<RwLock<LedgerSnapshot>>,
}
impl FileLedger {
	/// Opens (or creates) a ledger at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<LedgerSnapshot, StoreError> {
		if !path.exists() {
			return Ok(LedgerSnapshot::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(LedgerSnapshot::default());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create ledger directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &LedgerSnapshot) -> Result<(), StoreError> {
		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize ledger snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	/// Applies `mutation` and persists the snapshot; the in-memory copy is rolled back when
	/// persisting fails.
	fn mutate<T>(
		&self,
		mutation: impl FnOnce(&mut LedgerSnapshot) -> Result<T, StoreError>,
	) -> Result<T, StoreError> {
		let mut guard = self.inner.write();
		let before = guard.clone();
		let value = mutation(&mut *guard)?;

		if let Err(e) = self.persist_locked(&guard) {
			*guard = before;

			return Err(e);
		}

		Ok(value)
	}
}
impl LedgerStore for FileLedger {
	fn insert_user(&self, username: String, password_hash: String) -> StoreFuture<'_, LocalUser> {
		Box::pin(async move {
			self.mutate(|snapshot| snapshot.insert_user(username, password_hash))
		})
	}

	fn find_user<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<LocalUser>> {
		Box::pin(async move { Ok(self.inner.read().find_user(username)) })
	}

	fn insert_account(&self, account: NewAccount) -> StoreFuture<'_, LocalAccount> {
		Box::pin(async move { self.mutate(|snapshot| snapshot.insert_account(account)) })
	}

	fn accounts_for_user(&self, user_id: i64) -> StoreFuture<'_, Vec<LocalAccount>> {
		Box::pin(async move { Ok(self.inner.read().accounts_for_user(user_id)) })
	}

	fn find_account(&self, account_id: i64) -> StoreFuture<'_, Option<LocalAccount>> {
		Box::pin(async move { Ok(self.inner.read().find_account(account_id)) })
	}

	fn insert_transaction(
		&self,
		transaction: NewTransaction,
	) -> StoreFuture<'_, LocalTransaction> {
		Box::pin(async move { self.mutate(|snapshot| snapshot.insert_transaction(transaction)) })
	}

	fn transactions_for_account(&self, account_id: i64) -> StoreFuture<'_, Vec<LocalTransaction>> {
		Box::pin(async move { Ok(self.inner.read().transactions_for_account(account_id)) })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_path(label: &str) -> PathBuf {
		let unique = format!(
			"bank-gateway-ledger-{label}-{}-{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos()
		);

		env::temp_dir().join(unique)
	}

	#[tokio::test]
	async fn persists_across_reopen() {
		let path = temp_path("reopen");
		let ledger = FileLedger::open(&path).expect("Ledger should open.");
		let user = ledger
			.insert_user("zeynep".into(), "hash".into())
			.await
			.expect("User should insert.");

		ledger
			.insert_account(NewAccount {
				account_number: "MYB9".into(),
				iban: "TR9".into(),
				balance: Decimal::new(1_050, 2),
				currency_code: "TL".into(),
				account_name: "Vadesiz".into(),
				user_id: user.id,
			})
			.await
			.expect("Account should insert.");

		let reopened = FileLedger::open(&path).expect("Ledger should reopen.");
		let accounts =
			reopened.accounts_for_user(user.id).await.expect("Accounts should be listed.");

		assert_eq!(accounts.len(), 1);
		assert_eq!(accounts[0].balance, Decimal::new(1_050, 2));

		let _ = fs::remove_file(&path);
	}

	#[tokio::test]
	async fn rejected_mutations_leave_file_untouched() {
		let path = temp_path("reject");
		let ledger = FileLedger::open(&path).expect("Ledger should open.");

		ledger.insert_user("ali".into(), "hash".into()).await.expect("User should insert.");

		let err = ledger
			.insert_user("ali".into(), "hash".into())
			.await
			.expect_err("Duplicate user must be rejected.");

		assert!(matches!(err, StoreError::Conflict { .. }));
		assert_eq!(
			FileLedger::open(&path).expect("Ledger should reopen.").inner.read().users.len(),
			1
		);

		let _ = fs::remove_file(&path);
	}
}
