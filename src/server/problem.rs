//! Problem-details failures returned by every route.

// crates.io
use axum::{
	Json,
	http::{HeaderValue, StatusCode, header},
	response::{IntoResponse, Response},
};
// self
use crate::{
	_prelude::*, error::FailureKind, normalize::NormalizationError, partner::PartnerOperation,
};

/// `type` URI carried by every problem body.
pub const PROBLEM_TYPE: &str = "https://tools.ietf.org/html/rfc7807";
/// Detail used when the partner reports a failure without a description.
pub const UNEXPECTED_PARTNER_RESPONSE: &str =
	"Banka API'sından beklenmeyen veya hatalı yanıt alındı.";
/// Title of request validation problems.
pub const VALIDATION_TITLE: &str = "Geçersiz İstek Parametreleri";

/// JSON body of a failed request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
	/// Problem type URI.
	#[serde(rename = "type")]
	pub kind: String,
	/// Short summary.
	pub title: String,
	/// HTTP status.
	pub status: u16,
	/// Human-readable explanation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub detail: Option<String>,
	/// Status code reported by the partner, when one was received.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub partner_status_code: Option<String>,
	/// Offending request fields and their messages.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub errors: BTreeMap<String, Vec<String>>,
}
impl ProblemDetails {
	fn new(status: StatusCode, title: impl Into<String>, detail: Option<String>) -> Self {
		Self {
			kind: PROBLEM_TYPE.into(),
			title: title.into(),
			status: status.as_u16(),
			detail,
			partner_status_code: None,
			errors: BTreeMap::new(),
		}
	}
}

/// Failure raised by a route handler.
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// A partner operation failed.
	#[error("Partner `{operation}` failed: {source}")]
	Partner {
		/// Operation that failed.
		operation: PartnerOperation,
		/// Gateway failure.
		#[source]
		source: Error,
	},
	/// Request fields failed validation.
	#[error("Request validation failed.")]
	Validation(BTreeMap<String, Vec<String>>),
	/// No valid local session.
	#[error("Unauthenticated: {0}.")]
	Unauthenticated(String),
	/// Malformed request.
	#[error("{0}")]
	BadRequest(String),
	/// Resource already exists.
	#[error("{0}")]
	Conflict(String),
	/// Resource does not exist or is not visible to the caller.
	#[error("{0}")]
	NotFound(String),
	/// Session token could not be signed.
	#[error("Failed to sign session token: {0}.")]
	Signing(#[source] jsonwebtoken::errors::Error),
	/// Local failure.
	#[error(transparent)]
	Internal(#[from] Error),
}
impl ApiError {
	/// Wraps a gateway failure raised by `operation`.
	pub fn partner(operation: PartnerOperation, source: Error) -> Self {
		Self::Partner { operation, source }
	}

	/// Builds a validation failure for a single field.
	pub fn invalid_field(field: &str, message: &str) -> Self {
		Self::Validation(BTreeMap::from([(field.to_owned(), vec![message.to_owned()])]))
	}

	/// HTTP status for this failure.
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::Partner { source, .. } => partner_status(source),
			Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
			Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
			Self::Conflict(_) => StatusCode::CONFLICT,
			Self::NotFound(_) => StatusCode::NOT_FOUND,
			Self::Signing(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Renders the problem body.
	pub fn problem(&self) -> ProblemDetails {
		let status = self.status_code();

		match self {
			Self::Partner { operation, source } => partner_problem(status, *operation, source),
			Self::Validation(errors) => ProblemDetails {
				errors: errors.clone(),
				..ProblemDetails::new(status, VALIDATION_TITLE, None)
			},
			Self::Unauthenticated(reason) =>
				ProblemDetails::new(status, "Yetkisiz Erişim", Some(reason.clone())),
			Self::BadRequest(detail) =>
				ProblemDetails::new(status, "Geçersiz İstek", Some(detail.clone())),
			Self::Conflict(detail) => ProblemDetails::new(status, "Çakışma", Some(detail.clone())),
			Self::NotFound(detail) => ProblemDetails::new(status, "Bulunamadı", Some(detail.clone())),
			Self::Signing(_) | Self::Internal(_) => ProblemDetails::new(
				status,
				"Sunucu Hatası",
				Some("Bilinmeyen bir hata oluştu.".into()),
			),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status_code();

		if status.is_server_error() {
			tracing::error!(status = status.as_u16(), error = %self, "Request failed.");
		} else {
			tracing::debug!(status = status.as_u16(), error = %self, "Request rejected.");
		}

		let mut response = (status, Json(self.problem())).into_response();

		response
			.headers_mut()
			.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/problem+json"));

		response
	}
}

/// Title of the problem raised by a failed partner operation.
pub fn partner_title(operation: PartnerOperation) -> &'static str {
	match operation {
		PartnerOperation::Accounts => "VakıfBank Hesap Listesi Alım Hatası",
		PartnerOperation::AccountDetail => "VakıfBank Hesap Detayı Alım Hatası",
		PartnerOperation::AccountTransactions => "VakıfBank Hesap Hareketleri Alım Hatası",
	}
}

fn partner_status(error: &Error) -> StatusCode {
	match error.kind() {
		FailureKind::PartnerBusinessError => StatusCode::BAD_REQUEST,
		FailureKind::Unauthenticated => StatusCode::UNAUTHORIZED,
		FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
		FailureKind::PartnerUnavailable if error.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
		FailureKind::PartnerUnavailable | FailureKind::MalformedResponse => StatusCode::BAD_GATEWAY,
	}
}

fn partner_problem(
	status: StatusCode,
	operation: PartnerOperation,
	error: &Error,
) -> ProblemDetails {
	let title = partner_title(operation);

	match error {
		Error::Normalization(NormalizationError::PartnerBusiness {
			status_code,
			status_description,
		}) => ProblemDetails {
			partner_status_code: status_code.clone(),
			..ProblemDetails::new(
				status,
				title,
				Some(
					status_description
						.clone()
						.filter(|description| !description.trim().is_empty())
						.unwrap_or_else(|| UNEXPECTED_PARTNER_RESPONSE.into()),
				),
			)
		},
		Error::Config(_) | Error::Storage(_) =>
			ProblemDetails::new(status, title, Some("Bilinmeyen bir hata oluştu.".into())),
		_ => ProblemDetails::new(status, title, Some(error.to_string())),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::{PartnerTransportError, TransportFault};

	#[test]
	fn business_failures_pass_partner_text_through() {
		let error = ApiError::partner(
			PartnerOperation::AccountDetail,
			NormalizationError::PartnerBusiness {
				status_code: Some("APIGW999999".into()),
				status_description: Some("Hesap bulunamadı.".into()),
			}
			.into(),
		);
		let problem = error.problem();

		assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(problem.kind, PROBLEM_TYPE);
		assert_eq!(problem.title, "VakıfBank Hesap Detayı Alım Hatası");
		assert_eq!(problem.detail.as_deref(), Some("Hesap bulunamadı."));
		assert_eq!(problem.partner_status_code.as_deref(), Some("APIGW999999"));
	}

	#[test]
	fn business_failures_without_description_use_fallback_detail() {
		let error = ApiError::partner(
			PartnerOperation::Accounts,
			NormalizationError::PartnerBusiness { status_code: None, status_description: None }
				.into(),
		);

		assert_eq!(error.problem().detail.as_deref(), Some(UNEXPECTED_PARTNER_RESPONSE));
	}

	#[test]
	fn transport_failures_map_to_gateway_statuses() {
		let timeout = ApiError::partner(
			PartnerOperation::AccountTransactions,
			PartnerTransportError::Transport {
				operation: PartnerOperation::AccountTransactions,
				source: TransportFault::TimedOut { after: StdDuration::from_secs(30) },
			}
			.into(),
		);
		let status = ApiError::partner(
			PartnerOperation::Accounts,
			PartnerTransportError::Status {
				operation: PartnerOperation::Accounts,
				status: 503,
				body: String::new(),
			}
			.into(),
		);
		let drift =
			ApiError::partner(PartnerOperation::Accounts, NormalizationError::MissingHeader.into());

		assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
		assert_eq!(status.status_code(), StatusCode::BAD_GATEWAY);
		assert_eq!(drift.status_code(), StatusCode::BAD_GATEWAY);
		assert_eq!(drift.problem().partner_status_code, None);
	}

	#[test]
	fn validation_problems_list_fields() {
		let problem = ApiError::invalid_field("AccountNumber", "Hesap numarası zorunludur.").problem();

		assert_eq!(problem.status, 400);
		assert_eq!(problem.title, VALIDATION_TITLE);
		assert_eq!(problem.errors["AccountNumber"], vec!["Hesap numarası zorunludur.".to_owned()]);

		let json = serde_json::to_value(&problem).expect("Problem should serialize.");

		assert_eq!(json["type"], PROBLEM_TYPE);
		assert!(json.get("partnerStatusCode").is_none());
	}
}
