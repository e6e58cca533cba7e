// Flood Detection API web server
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

// HTTP server using hyper
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};

use flood_detection::inference::{provision, DeploymentConfig};
use flood_detection::web::response_helpers::{cors_preflight, json_error, json_raw};
use flood_detection::web::routes;
use flood_detection::{log_info, log_warn};

async fn handle_request(
    req: Request<Body>,
    config: Arc<DeploymentConfig>,
) -> std::result::Result<Response<Body>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => json_raw(
            StatusCode::OK,
            r#"{"message":"Welcome to the Flood Detection API"}"#.to_string(),
        ),

        (&Method::GET, "/health") => routes::health::handle().await?,

        (&Method::POST, "/api/v1/predict/") | (&Method::POST, "/api/v1/predict") => {
            routes::predict::handle_predict(req, config).await?
        }

        (&Method::OPTIONS, _) => cors_preflight(),

        _ => json_error(StatusCode::NOT_FOUND, "Not found"),
    };
    Ok(response)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = Arc::new(DeploymentConfig::load());
    log_info!("Starting Flood Detection API");

    // Best-effort at startup: the checkpoint may also arrive via a volume
    // mount after boot, and the pipeline fails per-request if it is absent.
    if let Err(e) = provision::ensure_artifacts(&config) {
        log_warn!("Artifact provisioning failed: {}", e);
        eprintln!("Warning: artifact provisioning failed: {e}");
    }

    // Create HTTP service
    let make_svc = make_service_fn({
        let config = config.clone();
        move |_conn| {
            let config = config.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    handle_request(req, config.clone())
                }))
            }
        }
    });

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 8000));
    let server = Server::bind(&addr).serve(make_svc);

    println!("🌊 Flood Detection API starting on http://{}", addr);
    println!("Available endpoints:");
    println!("  GET  /                     - Welcome message");
    println!("  GET  /health               - Health check");
    println!("  POST /api/v1/predict/      - Run flood-detection inference on a TIFF upload");

    server.await.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    Ok(())
}
