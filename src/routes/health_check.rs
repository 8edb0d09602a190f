use actix_web::HttpResponse;

/// `GET /health_check`
///
/// Liveness probe; never touches the mail or list providers.
///
/// Note: viewing http response requires `curl -v`
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
