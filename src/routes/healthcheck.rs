use actix_web::HttpResponse;

/// Liveness probe: 200 with an empty body
pub async fn healthcheck() -> HttpResponse {
    HttpResponse::Ok().finish()
}
