use actix_cors::Cors;
use actix_web::{
    http::StatusCode,
    middleware::ErrorHandlers,
    web, App, HttpServer,
};
use tracing::*;
use tracing_actix_web::TracingLogger;

use super::pages::{self, AppState};

// Start REST API server with the desired address
pub async fn run(server_address: &str, state: AppState) -> Result<(), std::io::Error> {
    let server_address = server_address.to_string();
    info!("Server running at {server_address}");

    HttpServer::new(move || {
        App::new()
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::INTERNAL_SERVER_ERROR, pages::internal_error),
            )
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .send_wildcard()
                    .max_age(3600),
            )
            .wrap(TracingLogger::default())
            .configure(configure_routes(state.clone()))
    })
    .bind(server_address)?
    .run()
    .await
}

/// The whole route table, shared by the server and the tests.
pub fn configure_routes(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(state))
            .route("/metrics", web::get().to(pages::metrics))
            .route("/api/metrics", web::get().to(pages::metrics))
            .route("/info", web::get().to(pages::info))
            // Dashboard assets, must be last so the API routes match first
            .route("/", web::get().to(pages::root))
            .route(r"/{filename:.+}", web::get().to(pages::root))
            .default_service(web::to(pages::not_found));
    }
}
