// crates.io
use axum::{
	Router,
	body::{self, Body},
	http::{Request, Response, StatusCode, header},
};
use httpmock::prelude::*;
use tower::ServiceExt;
// self
use bank_gateway::{
	_preludet::*,
	ledger::{
		LedgerService, MemoryLedger,
		seed::{DEMO_PASSWORD, DEMO_USERNAME},
		seed_demo,
	},
	server::{self, AppState, JwtKeys, ProblemDetails, config::JwtSettings},
};

const FRONTEND_ORIGIN: &str = "http://localhost:4200";

async fn build_app(server: &MockServer) -> Router {
	let store = Arc::new(MemoryLedger::default());

	seed_demo(&*store, OffsetDateTime::now_utc()).await.expect("Demo seed should succeed.");

	let descriptor = test_descriptor(&server.url("/auth/oauth/v2/token"), &server.url("/"));
	let state = AppState {
		gateway: Arc::new(build_reqwest_test_gateway(descriptor)),
		ledger: LedgerService::new(store),
		jwt: Arc::new(JwtKeys::new(&JwtSettings {
			secret: "0123456789abcdef0123456789abcdef".into(),
			issuer: "bank-gateway".into(),
			audience: "bank-gateway-ui".into(),
			expire_secs: 3_600,
		})),
	};
	let cors = server::cors_layer(FRONTEND_ORIGIN).expect("CORS origin should parse.");

	server::build_router(state, cors)
}

async fn send(
	app: &Router,
	method: &str,
	uri: &str,
	token: Option<&str>,
	body: Option<JsonValue>,
) -> Response<Body> {
	let mut request = Request::builder().method(method).uri(uri);

	if let Some(token) = token {
		request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}

	let request = match body {
		Some(body) => request
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string())),
		None => request.body(Body::empty()),
	}
	.expect("Request should build.");

	app.clone().oneshot(request).await.expect("Router should answer.")
}

async fn json(response: Response<Body>) -> JsonValue {
	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.");

	serde_json::from_slice(&bytes).expect("Body should be JSON.")
}

async fn problem(response: Response<Body>) -> ProblemDetails {
	assert_eq!(
		response.headers().get(header::CONTENT_TYPE).and_then(|value| value.to_str().ok()),
		Some("application/problem+json")
	);

	serde_json::from_value(json(response).await).expect("Body should be a problem document.")
}

async fn login(app: &Router, username: &str, password: &str) -> Response<Body> {
	send(
		app,
		"POST",
		"/api/mybank/login",
		None,
		Some(serde_json::json!({ "username": username, "password": password })),
	)
	.await
}

async fn demo_token(app: &Router) -> String {
	let response = login(app, DEMO_USERNAME, DEMO_PASSWORD).await;

	assert_eq!(response.status(), StatusCode::OK);

	json(response).await["token"].as_str().expect("Login should return a token.").to_owned()
}

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/oauth/v2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"partner-token\",\"expires_in\":3600}");
		})
		.await
}

#[tokio::test]
async fn health_is_public_and_other_routes_need_a_session() {
	let server = MockServer::start_async().await;
	let app = build_app(&server).await;
	let health = send(&app, "GET", "/health", None, None).await;

	assert_eq!(health.status(), StatusCode::OK);
	assert_eq!(json(health).await["status"], "ok");

	let anonymous = send(&app, "GET", "/api/mybank/accounts", None, None).await;

	assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(problem(anonymous).await.status, 401);

	let forged = send(&app, "POST", "/api/vakifbank/accounts", Some("not-a-jwt"), None).await;

	assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_issues_session_for_demo_user() {
	let server = MockServer::start_async().await;
	let app = build_app(&server).await;
	let response = login(&app, DEMO_USERNAME, DEMO_PASSWORD).await;

	assert_eq!(response.status(), StatusCode::OK);

	let body = json(response).await;

	assert_eq!(body["username"], DEMO_USERNAME);
	assert_eq!(body["userId"], 1);
	assert!(body["token"].as_str().is_some_and(|token| token.split('.').count() == 3));

	let rejected = login(&app, DEMO_USERNAME, "wrong!").await;

	assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_validates_then_creates_user() {
	let server = MockServer::start_async().await;
	let app = build_app(&server).await;
	let register = |username: &'static str, password: &'static str| {
		let app = app.clone();

		async move {
			send(
				&app,
				"POST",
				"/api/mybank/register",
				None,
				Some(serde_json::json!({ "username": username, "password": password })),
			)
			.await
		}
	};
	let blank = register("", "123456").await;

	assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
	assert_eq!(problem(blank).await.detail.as_deref(), Some("Kullanıcı adı ve şifre gereklidir."));

	let short = register("ayse", "12345").await;

	assert_eq!(short.status(), StatusCode::BAD_REQUEST);

	let taken = register(DEMO_USERNAME, "123456").await;

	assert_eq!(taken.status(), StatusCode::CONFLICT);

	let created = register("ayse", "123456").await;

	assert_eq!(created.status(), StatusCode::OK);
	assert!(json(created).await["message"].is_string());
	assert_eq!(login(&app, "ayse", "123456").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn mybank_routes_are_scoped_to_the_session_user() {
	let server = MockServer::start_async().await;
	let app = build_app(&server).await;
	let token = demo_token(&app).await;
	let accounts = json(send(&app, "GET", "/api/mybank/accounts", Some(&token), None).await).await;
	let accounts = accounts.as_array().expect("Accounts should be an array.");

	assert_eq!(accounts.len(), 5);

	let main = accounts
		.iter()
		.find(|account| account["accountNumber"] == "MYB1001")
		.expect("Main account should be listed.");

	assert_eq!(main["balance"], "1500.75");

	let detail = send(
		&app,
		"GET",
		"/api/mybank/AccountDetail/TR100000000000MYB1001",
		Some(&token),
		None,
	)
	.await;

	assert_eq!(detail.status(), StatusCode::OK);
	assert_eq!(json(detail).await["accountName"], "Ana Hesap");

	let missing =
		send(&app, "GET", "/api/mybank/AccountDetail/TR000", Some(&token), None).await;

	assert_eq!(missing.status(), StatusCode::NOT_FOUND);

	let transactions = send(
		&app,
		"POST",
		"/api/mybank/transactions",
		Some(&token),
		Some(serde_json::json!({ "bankAccountId": main["id"] })),
	)
	.await;

	assert_eq!(transactions.status(), StatusCode::OK);

	let transactions = json(transactions).await;

	assert_eq!(transactions.as_array().map(Vec::len), Some(2));
	assert_eq!(transactions[0]["amount"], "-499.25");
	assert_eq!(transactions[1]["amount"], "2000.00");

	let no_id = send(
		&app,
		"POST",
		"/api/mybank/transactions",
		Some(&token),
		Some(serde_json::json!({ "bankAccountId": 0 })),
	)
	.await;

	assert_eq!(no_id.status(), StatusCode::BAD_REQUEST);
	assert_eq!(problem(no_id).await.detail.as_deref(), Some("BankAccountId zorunludur."));

	let foreign = send(
		&app,
		"POST",
		"/api/mybank/transactions",
		Some(&token),
		Some(serde_json::json!({ "bankAccountId": 999 })),
	)
	.await;

	assert_eq!(foreign.status(), StatusCode::OK);
	assert_eq!(json(foreign).await, serde_json::json!([]));
}

#[tokio::test]
async fn partner_routes_validate_before_calling_the_partner() {
	let server = MockServer::start_async().await;
	let app = build_app(&server).await;
	let token = demo_token(&app).await;
	let partner_token = mock_token(&server).await;
	let detail = send(
		&app,
		"POST",
		"/api/vakifbank/accountDetail",
		Some(&token),
		Some(serde_json::json!({ "accountNumber": " " })),
	)
	.await;

	assert_eq!(detail.status(), StatusCode::BAD_REQUEST);

	let detail = problem(detail).await;

	assert_eq!(detail.title, "Geçersiz İstek Parametreleri");
	assert!(detail.errors.contains_key("AccountNumber"));

	let transactions = send(
		&app,
		"POST",
		"/partner/transactions",
		Some(&token),
		Some(serde_json::json!({ "AccountNumber": "0001", "StartDate": "2024-01-01T00:00:00" })),
	)
	.await;

	assert_eq!(transactions.status(), StatusCode::BAD_REQUEST);

	let transactions = problem(transactions).await;

	assert!(!transactions.errors.contains_key("AccountNumber"));
	assert!(transactions.errors.contains_key("StartDate"));
	assert!(transactions.errors.contains_key("EndDate"));

	partner_token.assert_calls_async(0).await;
}

#[tokio::test]
async fn partner_accounts_are_served_under_both_prefixes() {
	let server = MockServer::start_async().await;
	let app = build_app(&server).await;
	let token = demo_token(&app).await;
	let partner_token = mock_token(&server).await;
	let accounts = server
		.mock_async(|when, then| {
			when.method(POST).path("/accountList");
			then.status(200).header("content-type", "application/json").body(
				r#"{"Header":{"StatusCode":"00000"},
				"Data":{"Accounts":[{"IBAN":"TR1","Balance":"100.00","CurrencyCode":"TL"}]}}"#,
			);
		})
		.await;

	for uri in ["/api/vakifbank/accounts", "/partner/accounts"] {
		let response = send(&app, "POST", uri, Some(&token), None).await;

		assert_eq!(response.status(), StatusCode::OK);

		let body = json(response).await;

		assert_eq!(body["header"]["statusCode"], "00000");
		assert_eq!(body["data"]["accounts"][0]["iban"], "TR1");
		assert_eq!(body["data"]["accounts"][0]["balance"], "100.00");
	}

	partner_token.assert_calls_async(1).await;
	accounts.assert_calls_async(2).await;
}

#[tokio::test]
async fn partner_business_failure_becomes_problem() {
	let server = MockServer::start_async().await;
	let app = build_app(&server).await;
	let token = demo_token(&app).await;
	let _partner_token = mock_token(&server).await;
	let _detail = server
		.mock_async(|when, then| {
			when.method(POST).path("/accountDetail");
			then.status(200).header("content-type", "application/json").body(
				r#"{"Header":{"StatusCode":"APIGW999999","StatusDescription":"Hesap bulunamadı."}}"#,
			);
		})
		.await;
	let response = send(
		&app,
		"POST",
		"/api/vakifbank/accountDetail",
		Some(&token),
		Some(serde_json::json!({ "accountNumber": "0001" })),
	)
	.await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let problem = problem(response).await;

	assert_eq!(problem.kind, "https://tools.ietf.org/html/rfc7807");
	assert_eq!(problem.title, "VakıfBank Hesap Detayı Alım Hatası");
	assert_eq!(problem.detail.as_deref(), Some("Hesap bulunamadı."));
	assert_eq!(problem.partner_status_code.as_deref(), Some("APIGW999999"));
}

#[tokio::test]
async fn partner_outage_becomes_bad_gateway() {
	let server = MockServer::start_async().await;
	let app = build_app(&server).await;
	let token = demo_token(&app).await;
	let _partner_token = mock_token(&server).await;
	let _accounts = server
		.mock_async(|when, then| {
			when.method(POST).path("/accountList");
			then.status(500).body("internal error");
		})
		.await;
	let response = send(&app, "POST", "/api/vakifbank/accounts", Some(&token), None).await;

	assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
	assert_eq!(problem(response).await.title, "VakıfBank Hesap Listesi Alım Hatası");
}

#[tokio::test]
async fn cors_preflight_admits_frontend_origin() {
	let server = MockServer::start_async().await;
	let app = build_app(&server).await;
	let request = Request::builder()
		.method("OPTIONS")
		.uri("/api/mybank/accounts")
		.header(header::ORIGIN, FRONTEND_ORIGIN)
		.header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
		.header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
		.body(Body::empty())
		.expect("Preflight request should build.");
	let response = app.oneshot(request).await.expect("Router should answer.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		response
			.headers()
			.get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
			.and_then(|value| value.to_str().ok()),
		Some(FRONTEND_ORIGIN)
	);
}
