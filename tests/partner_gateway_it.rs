// crates.io
use httpmock::prelude::*;
// self
use bank_gateway::{
	_preludet::*,
	error::{FailureKind, PartnerTransportError, TokenAcquisitionError},
	normalize::{NormalizationError, TransactionType},
	partner::PartnerOperation,
};

const TOKEN_BODY: &str = r#"{"access_token":"partner-token","token_type":"Bearer","expires_in":3600,"scope":"account"}"#;

fn gateway_for(server: &MockServer) -> ReqwestTestGateway {
	build_reqwest_test_gateway(test_descriptor(&server.url("/auth/oauth/v2/token"), &server.url("/")))
}

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/oauth/v2/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.body_includes("grant_type=b2b_credentials")
				.body_includes("consentId=consent-1");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await
}

#[tokio::test]
async fn accounts_normalize_with_bearer_token() {
	let server = MockServer::start_async().await;
	let gateway = gateway_for(&server);
	let token = mock_token(&server).await;
	let accounts = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/accountList")
				.header("authorization", "Bearer partner-token")
				.header("content-type", "application/json");
			then.status(200).header("content-type", "application/json").body(
				r#"{"Header":{"StatusCode":"00000","StatusDescription":"Başarılı"},
				"Data":{"Accounts":[{"IBAN":"TR1","Balance":"100.00","CurrencyCode":"TL"}]}}"#,
			);
		})
		.await;
	let normalized = gateway.list_accounts().await.expect("Account list should normalize.");

	token.assert_calls_async(1).await;
	accounts.assert_calls_async(1).await;

	assert_eq!(normalized.header.status_code.as_deref(), Some("00000"));
	assert_eq!(normalized.data.accounts.len(), 1);

	let account = &normalized.data.accounts[0];

	assert_eq!(account.iban.as_deref(), Some("TR1"));
	assert_eq!(account.currency_code.as_deref(), Some("TL"));
	assert_eq!(
		account.balance,
		Some(Decimal::from_str_exact("100.00").expect("Decimal should parse."))
	);

	let json = serde_json::to_value(&normalized).expect("Envelope should serialize.");

	assert_eq!(json["data"]["accounts"][0]["balance"], "100.00");
}

#[tokio::test]
async fn token_is_reused_across_operations() {
	let server = MockServer::start_async().await;
	let gateway = gateway_for(&server);
	let token = mock_token(&server).await;
	let _accounts = server
		.mock_async(|when, then| {
			when.method(POST).path("/accountList");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"Header":{"StatusCode":"00000"},"Data":{"Accounts":[]}}"#);
		})
		.await;

	gateway.list_accounts().await.expect("First account list should succeed.");
	gateway.list_accounts().await.expect("Second account list should succeed.");

	token.assert_calls_async(1).await;

	let metrics = gateway.token_cache().refresh_metrics();

	assert_eq!(metrics.attempts(), 1);
	assert_eq!(metrics.cache_hits(), 1);
}

#[tokio::test]
async fn account_detail_business_failure_carries_partner_code() {
	let server = MockServer::start_async().await;
	let gateway = gateway_for(&server);
	let _token = mock_token(&server).await;
	let detail = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/accountDetail")
				.body_includes("\"AccountNumber\":\"00158007295329645\"");
			then.status(200).header("content-type", "application/json").body(
				r#"{"Header":{"StatusCode":"APIGW999999","StatusDescription":"Hesap bulunamadı."}}"#,
			);
		})
		.await;
	let err = gateway
		.get_account_detail("00158007295329645")
		.await
		.expect_err("Business failure should surface as an error.");

	detail.assert_calls_async(1).await;

	assert_eq!(err.kind(), FailureKind::PartnerBusinessError);
	assert!(matches!(
		err,
		Error::Normalization(NormalizationError::PartnerBusiness {
			status_code: Some(ref code),
			status_description: Some(ref description),
		}) if code == "APIGW999999" && description == "Hesap bulunamadı."
	));
}

#[tokio::test]
async fn transactions_with_non_json_body_are_transport_failures() {
	let server = MockServer::start_async().await;
	let gateway = gateway_for(&server);
	let _token = mock_token(&server).await;
	let _transactions = server
		.mock_async(|when, then| {
			when.method(POST).path("/accountTransactions");
			then.status(200).header("content-type", "text/html").body("<html>maintenance</html>");
		})
		.await;
	let start = OffsetDateTime::UNIX_EPOCH;
	let err = gateway
		.list_transactions("0001", start, start + Duration::days(1))
		.await
		.expect_err("Non-JSON body should fail.");

	assert_eq!(err.kind(), FailureKind::PartnerUnavailable);
	assert!(matches!(
		err,
		Error::Transport(PartnerTransportError::InvalidBody {
			operation: PartnerOperation::AccountTransactions,
			status: 200,
			..
		})
	));
}

#[tokio::test]
async fn transactions_normalize_types_and_amounts() {
	let server = MockServer::start_async().await;
	let gateway = gateway_for(&server);
	let _token = mock_token(&server).await;
	let transactions = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/accountTransactions")
				.body_includes("\"StartDate\":\"2024-01-01T00:00:00+03:00\"")
				.body_includes("\"EndDate\":\"2024-01-31T23:59:59+03:00\"");
			then.status(200).header("content-type", "application/json").body(
				r#"{"Header":{"StatusCode":"APIGW000000"},"Data":{"AccountTransactions":[
					{"TransactionId":"1","Amount":"4957.61","TransactionType":"1","Balance":12000.5},
					{"TransactionId":"2","Amount":"-12.30","TransactionType":"2"}
				]}}"#,
			);
		})
		.await;
	let offset = time::UtcOffset::from_hms(3, 0, 0).expect("Offset should be valid.");
	let start = time::macros::datetime!(2024-01-01 00:00:00).assume_offset(offset);
	let end = time::macros::datetime!(2024-01-31 23:59:59).assume_offset(offset);
	let normalized = gateway
		.list_transactions("0001", start, end)
		.await
		.expect("Transactions should normalize.");

	transactions.assert_calls_async(1).await;

	let records = &normalized.data.account_transactions;

	assert_eq!(records.len(), 2);
	assert_eq!(records[0].transaction_type, TransactionType::Credit);
	assert_eq!(records[0].amount.map(|amount| amount.to_string()).as_deref(), Some("4957.61"));
	assert_eq!(records[1].transaction_type, TransactionType::Debit);
	assert_eq!(records[1].balance, None);
}

#[tokio::test]
async fn empty_access_token_is_not_cached_and_retried() {
	let server = MockServer::start_async().await;
	let gateway = gateway_for(&server);
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/oauth/v2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"\",\"expires_in\":3600}");
		})
		.await;
	let accounts = server
		.mock_async(|when, then| {
			when.method(POST).path("/accountList");
			then.status(200).body("{}");
		})
		.await;

	for _ in 0..2 {
		let err = gateway.list_accounts().await.expect_err("Empty token should fail.");

		assert!(matches!(
			err,
			Error::TokenAcquisition(TokenAcquisitionError::EmptyAccessToken { .. })
		));
	}

	token.assert_calls_async(2).await;
	accounts.assert_calls_async(0).await;

	assert!(gateway.token_cache().current().is_none());
	assert_eq!(gateway.token_cache().refresh_metrics().failures(), 2);
}

#[tokio::test]
async fn token_endpoint_rejection_reports_status() {
	let server = MockServer::start_async().await;
	let gateway = gateway_for(&server);
	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/oauth/v2/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;
	let err = gateway.list_accounts().await.expect_err("Rejected exchange should fail.");

	assert_eq!(err.kind(), FailureKind::PartnerUnavailable);
	assert!(matches!(
		err,
		Error::TokenAcquisition(TokenAcquisitionError::Status { status: 401, ref body })
			if body.contains("invalid_client")
	));
}

#[tokio::test]
async fn partner_error_status_is_a_transport_failure() {
	let server = MockServer::start_async().await;
	let gateway = gateway_for(&server);
	let _token = mock_token(&server).await;
	let _detail = server
		.mock_async(|when, then| {
			when.method(POST).path("/accountDetail");
			then.status(503).body("upstream unavailable");
		})
		.await;
	let err = gateway.get_account_detail("0001").await.expect_err("HTTP 503 should fail.");

	assert!(!err.is_timeout());
	assert!(matches!(
		err,
		Error::Transport(PartnerTransportError::Status { status: 503, ref body, .. })
			if body == "upstream unavailable"
	));
}
