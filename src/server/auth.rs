//! Local session tokens: login, registration, and the bearer middleware guarding every other
//! route.

// crates.io
use axum::{
	Json,
	extract::{Request, State, rejection::JsonRejection},
	http::header,
	middleware::Next,
	response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
// self
use crate::{
	_prelude::*,
	ledger::{LocalUser, PASSWORD_LENGTH, RegisterOutcome},
	server::{AppState, config::JwtSettings, json_body, problem::ApiError},
};

/// Paths reachable without a session.
pub const PUBLIC_PATHS: [&str; 3] = ["/health", "/api/mybank/login", "/api/mybank/register"];

/// JWT claims issued at login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// Local user id.
	pub sub: String,
	/// Username.
	pub name: String,
	/// Issuer.
	pub iss: String,
	/// Audience.
	pub aud: String,
	/// Issued at (unix timestamp).
	pub iat: i64,
	/// Expiration (unix timestamp).
	pub exp: i64,
}
impl Claims {
	/// Numeric user id carried in `sub`.
	pub fn user_id(&self) -> Result<i64, ApiError> {
		self.sub
			.parse()
			.map_err(|_| ApiError::Unauthenticated("token subject is not a user id".into()))
	}
}

/// HS256 keys and validation rules for local session tokens.
pub struct JwtKeys {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
	issuer: String,
	audience: String,
	lifetime: Duration,
}
impl JwtKeys {
	/// Derives keys from the `[jwt]` settings.
	pub fn new(settings: &JwtSettings) -> Self {
		let mut validation = Validation::new(Algorithm::HS256);

		validation.set_issuer(&[settings.issuer.as_str()]);
		validation.set_audience(&[settings.audience.as_str()]);

		Self {
			encoding: EncodingKey::from_secret(settings.secret.as_bytes()),
			decoding: DecodingKey::from_secret(settings.secret.as_bytes()),
			validation,
			issuer: settings.issuer.clone(),
			audience: settings.audience.clone(),
			lifetime: Duration::seconds(settings.expire_secs.try_into().unwrap_or(i64::MAX)),
		}
	}

	/// Signs a session token for `user`.
	pub fn issue(&self, user: &LocalUser, now: OffsetDateTime) -> Result<String, ApiError> {
		let claims = Claims {
			sub: user.id.to_string(),
			name: user.username.clone(),
			iss: self.issuer.clone(),
			aud: self.audience.clone(),
			iat: now.unix_timestamp(),
			exp: (now + self.lifetime).unix_timestamp(),
		};

		jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
			.map_err(ApiError::Signing)
	}

	/// Verifies signature, issuer, audience, and expiry of `token`.
	pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
		jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
			.map(|data| data.claims)
			.map_err(|e| ApiError::Unauthenticated(format!("invalid token: {e}")))
	}
}
impl Debug for JwtKeys {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JwtKeys")
			.field("issuer", &self.issuer)
			.field("audience", &self.audience)
			.field("lifetime", &self.lifetime)
			.finish_non_exhaustive()
	}
}

/// Login and registration body.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CredentialsRequest {
	/// Username.
	#[serde(alias = "Username")]
	pub username: String,
	/// Plain-text password.
	#[serde(alias = "Password")]
	pub password: String,
}

/// Successful login.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
	/// Session token.
	pub token: String,
	/// Local user id.
	pub user_id: i64,
	/// Username.
	pub username: String,
}

/// Successful registration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
	/// Confirmation text.
	pub message: String,
}

/// Rejects requests to non-public paths that lack a valid bearer token and stores the
/// [`Claims`] in the request extensions.
pub async fn auth_middleware(
	State(state): State<AppState>,
	mut request: Request,
	next: Next,
) -> Result<Response, ApiError> {
	if PUBLIC_PATHS.contains(&request.uri().path()) {
		return Ok(next.run(request).await);
	}

	let token = request
		.headers()
		.get(header::AUTHORIZATION)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.strip_prefix("Bearer "))
		.ok_or_else(|| ApiError::Unauthenticated("missing authorization token".into()))?;
	let claims = state.jwt.verify(token)?;

	request.extensions_mut().insert(claims);

	Ok(next.run(request).await)
}

/// `POST /api/mybank/login`.
pub async fn login(
	State(state): State<AppState>,
	payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
	let body = json_body(payload)?;
	let user = state
		.ledger
		.validate_user(&body.username, &body.password)
		.await?
		.ok_or_else(|| ApiError::Unauthenticated("Kullanıcı adı veya şifre hatalı.".into()))?;
	let token = state.jwt.issue(&user, OffsetDateTime::now_utc())?;

	tracing::info!(user_id = user.id, "User logged in.");

	Ok(Json(LoginResponse { token, user_id: user.id, username: user.username }))
}

/// `POST /api/mybank/register`.
pub async fn register(
	State(state): State<AppState>,
	payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
	let body = json_body(payload)?;

	if body.username.trim().is_empty() || body.password.trim().is_empty() {
		return Err(ApiError::BadRequest("Kullanıcı adı ve şifre gereklidir.".into()));
	}

	match state.ledger.register(&body.username, &body.password).await? {
		RegisterOutcome::Registered(_) =>
			Ok(Json(RegisterResponse { message: "Kullanıcı başarıyla kayıt edildi.".into() })),
		RegisterOutcome::UsernameTaken =>
			Err(ApiError::Conflict("Bu kullanıcı adı zaten kullanılmaktadır.".into())),
		RegisterOutcome::PasswordLengthInvalid => Err(ApiError::BadRequest(format!(
			"Şifre tam olarak {PASSWORD_LENGTH} karakter uzunluğunda olmalıdır."
		))),
	}
}
