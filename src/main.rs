use actix_cors::Cors;
use actix_web::{middleware::Compress, web, App, HttpServer};
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod envelope;
mod error;
mod guard;
mod media;
mod openapi;
mod relay;
mod routes;
mod session;
mod upstream;

use config::ProxyConfig;
use openapi::ApiDoc;
use routes::{config as route_config, AppState};
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use upstream::BackendClient;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Environment variables are set externally in production; load .env
    // automatically only in debug builds.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    // The backend base URL is the one hard requirement; refuse to start
    // without it rather than failing on the first proxied call.
    let cfg = match ProxyConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("configuration error: {e}");
            eprintln!("set BACKEND_URL to the content backend's base URL");
            std::process::exit(1);
        }
    };

    // Structured logging initialisation
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Bootstrapping medgate admin gateway");
    info!("Proxying to backend at {}", cfg.backend_base());

    let backend = BackendClient::new(cfg);
    let openapi = ApiDoc::openapi();
    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = HttpServer::new(move || {
        let cors = {
            let mut c = Cors::default()
                // local dashboard dev server
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allow_any_header()
                .allowed_methods(["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
                .supports_credentials()
                .max_age(3600);
            // Deployed dashboard origin, when it is not same-origin.
            if let Ok(front) = std::env::var("FRONTEND_URL") {
                c = c.allowed_origin(&front);
            }
            c
        };

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(cors)
            .app_data(web::Data::new(AppState {
                backend: backend.clone(),
            }))
            .configure(route_config)
            .service(SwaggerUi::new("/docs/{_:.*}").url("/docs/openapi.json", openapi.clone()))
    })
    .bind(&bind)?;

    info!("Listening on http://{bind}");

    server.run().await?;
    Ok(())
}
