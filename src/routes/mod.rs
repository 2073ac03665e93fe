pub mod health;
pub mod notifications;
pub mod settings;

use actix_cors::Cors;
use actix_web::{error, web, HttpResponse};

use crate::error::AppError;

/// Permissive CORS: the entrypoints are called from the storefront and the
/// admin console on other origins.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::ACCEPT,
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::HeaderName::from_static("x-client-info"),
            actix_web::http::header::HeaderName::from_static("apikey"),
        ])
        .max_age(3600)
}

/// JSON body errors use the same `{error}` shape as every other failure
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            error::JsonPayloadError::ContentType => "Expected a JSON body".to_string(),
            other => other.to_string(),
        };
        error::InternalError::from_response(
            err,
            HttpResponse::from_error(AppError::Validation(message)),
        )
        .into()
    })
}

/// Query string errors (e.g. an unknown `status` filter) as `{error}`
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid query string: {}", err);
        error::InternalError::from_response(
            err,
            HttpResponse::from_error(AppError::Validation(message)),
        )
        .into()
    })
}

/// Path segments that fail to parse (e.g. a malformed record id) are
/// reported as missing resources
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req| {
        let message = format!("{} not found", req.path());
        error::InternalError::from_response(
            err,
            HttpResponse::from_error(AppError::NotFound(message)),
        )
        .into()
    })
}

/// Configure every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(
            web::scope("/health")
                .route("", web::get().to(health::liveness))
                .route("/ready", web::get().to(health::readiness)),
        )
        .configure(notifications::configure)
        .configure(settings::configure);
}
