//! # nilgiri-server
//!
//! The proxy's HTTP surface: `POST /api/groq`, `POST /api/gemini` and
//! `GET /api/health`, served by actix-web with permissive CORS so the
//! browser widget can call it from any origin.

pub mod handlers;
pub mod state;

pub use handlers::configure;
pub use state::AppState;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use tracing::info;

use nilgiri_core::config::schema::ServerConfig;

/// Bind the listener and return the running server future.
pub fn start_server(state: AppState, config: &ServerConfig) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    info!(
        host = %config.host,
        port = config.port,
        deadline_secs = state.deadline().as_secs(),
        "starting proxy server"
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    Ok(server)
}
