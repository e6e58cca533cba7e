// MCP server exposing the flood-map generation tool over streamable HTTP.
//
// The tool transport has no structured error channel: failures are
// returned as strings prefixed with "Error:" and success is a base64
// encoded TIFF. The pipeline performs blocking filesystem work and a
// blocking subprocess wait, so every call is offloaded to the blocking
// pool instead of running on the serving loop.

use std::net::SocketAddr;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;

use flood_detection::inference::{acquire, pipeline, provision, DeploymentConfig};
use flood_detection::{log_error, log_info};

fn default_filename() -> String {
    acquire::CANONICAL_INPUT_NAME.to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateFloodMapRequest {
    /// Publicly accessible URL of the input TIFF file.
    pub input_file_url: String,
    /// Original filename of the input TIFF, used for logging only.
    #[serde(default = "default_filename")]
    pub filename: String,
}

#[derive(Clone)]
pub struct FloodDetectionServer {
    config: Arc<DeploymentConfig>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FloodDetectionServer {
    pub fn new(config: Arc<DeploymentConfig>) -> Self {
        Self {
            config,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Generates a flood map from an input TIFF image located at a URL. The server downloads the file and detects GPU usage automatically. Returns a base64 encoded string of the resulting flood map TIFF image, or an error message string starting with 'Error:'."
    )]
    async fn generate_flood_map(
        &self,
        Parameters(request): Parameters<GenerateFloodMapRequest>,
    ) -> String {
        log_info!(
            "Received request to generate flood map for file at URL: {} (original name: {})",
            request.input_file_url,
            request.filename
        );

        let config = self.config.clone();
        let result = tokio::task::spawn_blocking(move || {
            pipeline::generate_flood_map(&config, &request.input_file_url, &request.filename)
        })
        .await;

        match result {
            Ok(Ok(bytes)) => {
                log_info!("Inference successful, {} output bytes.", bytes.len());
                BASE64.encode(bytes)
            }
            Ok(Err(e)) => {
                log_error!("Flood map generation failed: {}", e);
                format!("Error: {e}")
            }
            Err(e) => {
                log_error!("Flood map task panicked or was cancelled: {}", e);
                format!("Error: internal server error - {e}")
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for FloodDetectionServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.instructions = Some(
            "Flood detection tools. Call generate_flood_map with the URL of a TIFF raster to receive a base64 encoded flood map."
                .to_string(),
        );
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = Arc::new(DeploymentConfig::load());
    println!("🚀 Starting Flood Detection MCP Server...");
    log_info!("Starting Flood Detection MCP server");

    // The tool server cannot do anything useful without the model.
    provision::ensure_artifacts(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let service = StreamableHttpService::new(
        {
            let config = config.clone();
            move || Ok(FloodDetectionServer::new(config.clone()))
        },
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);
    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("MCP server listening on http://{addr}/mcp");
    axum::serve(listener, router).await
}
