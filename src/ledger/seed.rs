//! Demo data for local development.

// self
use crate::{
	_prelude::*,
	ledger::{LedgerStore, NewAccount, NewTransaction, StoreError, hash_password},
};

/// Demo login name.
pub const DEMO_USERNAME: &str = "testuser";
/// Demo password.
pub const DEMO_PASSWORD: &str = "testpass";

const DEPOSIT: &str = "Yatırım";
const WITHDRAWAL: &str = "Çekim";

/// (account number, balance in cents, currency, name)
const ACCOUNTS: [(&str, i64, &str, &str); 5] = [
	("MYB1001", 150_075, "TL", "Ana Hesap"),
	("MYB2002", 50_000, "USD", "Dolar Hesabı"),
	("MYB3003", 75_050, "EUR", "Euro Hesabı"),
	("MYB4004", 2_500_000, "TL", "Birikim Hesabı"),
	("MYB5005", 12_345, "GBP", "Sterlin Hesabı"),
];

/// (account index, amount in cents, description, days ago)
const TRANSACTIONS: [(usize, i64, &str, i64); 9] = [
	(0, 200_000, "Maaş Ödemesi", 5),
	(0, -49_925, "Market Harcaması", 2),
	(1, 50_000, "Dolar Alımı", 1),
	(2, 100_000, "Euro Hesabına Havale", 7),
	(2, -25_000, "Online Alışveriş", 3),
	(3, 1_000_000, "Ek Gelir Aktarımı", 10),
	(3, -500_000, "Ev Peşinatı", 6),
	(4, 15_000, "Sterlin Transferi", 4),
	(4, -2_655, "Uygulama Aboneliği", 1),
];

/// Seeds the demo user, five accounts, and nine transactions relative to `now`.
///
/// Returns `false` without touching the store when the demo user already exists.
pub async fn seed_demo(store: &dyn LedgerStore, now: OffsetDateTime) -> Result<bool, StoreError> {
	if store.find_user(DEMO_USERNAME).await?.is_some() {
		return Ok(false);
	}

	let user = store.insert_user(DEMO_USERNAME.into(), hash_password(DEMO_PASSWORD)).await?;
	let mut account_ids = Vec::with_capacity(ACCOUNTS.len());

	for (number, cents, currency, name) in ACCOUNTS {
		let account = store
			.insert_account(NewAccount {
				account_number: number.into(),
				iban: format!("TR100000000000{number}"),
				balance: Decimal::new(cents, 2),
				currency_code: currency.into(),
				account_name: name.into(),
				user_id: user.id,
			})
			.await?;

		account_ids.push(account.id);
	}
	for (index, cents, description, days_ago) in TRANSACTIONS {
		store
			.insert_transaction(NewTransaction {
				bank_account_id: account_ids[index],
				amount: Decimal::new(cents, 2),
				transaction_type: (if cents >= 0 { DEPOSIT } else { WITHDRAWAL }).into(),
				description: description.into(),
				transaction_date: now - Duration::days(days_ago),
			})
			.await?;
	}

	tracing::info!(user_id = user.id, "Demo ledger seeded.");

	Ok(true)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::ledger::MemoryLedger;

	#[tokio::test]
	async fn seeds_once() {
		let ledger = MemoryLedger::default();
		let now = OffsetDateTime::now_utc();

		assert!(seed_demo(&ledger, now).await.expect("Seed should succeed."));
		assert!(!seed_demo(&ledger, now).await.expect("Reseed should be skipped."));

		let snapshot = ledger.snapshot();

		assert_eq!(snapshot.users.len(), 1);
		assert_eq!(snapshot.accounts.len(), 5);
		assert_eq!(snapshot.transactions.len(), 9);
		assert_eq!(snapshot.accounts[0].iban, "TR100000000000MYB1001");
		assert_eq!(snapshot.accounts[0].balance.to_string(), "1500.75");
		assert_eq!(snapshot.transactions[1].transaction_type, "Çekim");
	}
}
