mod fields;
mod health_check;
mod newsletter_subscribe;
mod response;
mod send_mail;

use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::HttpResponse;
pub use fields::*;
pub use health_check::*;
pub use newsletter_subscribe::*;
pub use response::*;
pub use send_mail::*;

/// Walks the `source` chain of an error, so that a single `Debug` log line
/// carries every underlying cause
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

/// Default service for the POST-only form endpoints
pub async fn method_not_allowed() -> HttpResponse {
    let mut resp = ApiResponse::failure("Method Not Allowed").respond(StatusCode::METHOD_NOT_ALLOWED);
    resp.headers_mut().insert(
        header::ALLOW,
        header::HeaderValue::from_static("POST"),
    );
    resp
}

/// Form submissions are small; anything larger is refused before parsing
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Replaces actix's plain-text 413 (raised by the body extractor) with the
/// usual JSON envelope
pub fn payload_too_large<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let (req, _) = res.into_parts();
    let res = ApiResponse::failure("Request body is too large.")
        .respond(StatusCode::PAYLOAD_TOO_LARGE);
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, res).map_into_right_body(),
    ))
}
