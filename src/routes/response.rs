use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;

use crate::delivery::DeliveryReport;

/// The only shape a client ever receives, on success and on failure alike
#[derive(Serialize, Debug)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    /// Only set when a contact inquiry was partially delivered
    #[serde(flatten)]
    pub delivery: Option<DeliveryReport>,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            delivery: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            delivery: None,
        }
    }

    pub fn with_delivery(
        mut self,
        report: DeliveryReport,
    ) -> Self {
        self.delivery = Some(report);
        self
    }

    pub fn respond(
        &self,
        status: StatusCode,
    ) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }
}

/// Upstream status codes are passed through, but only if they describe an
/// error; anything else (no usable code, a 1xx or 3xx) becomes a 500
pub fn upstream_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
