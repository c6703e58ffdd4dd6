//! REST API server example
//!
//! Runs icon-hunter with the REST API enabled, allowing control via HTTP.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:8000/swagger-ui
//! - Search apps via POST http://localhost:8000/search
//! - Launch download jobs via POST http://localhost:8000/download
//! - Poll jobs via GET http://localhost:8000/status/{job_id}
//! - Stream events via GET http://localhost:8000/events

use icon_hunter::api::start_api_server;
use icon_hunter::config::{ApiConfig, Config, DownloadConfig, ServerConfig};
use icon_hunter::IconHunter;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    // Configure API
    let api_config = ApiConfig {
        bind_address: "127.0.0.1:8000".parse::<SocketAddr>()?,
        cors_enabled: true,
        cors_origins: vec!["*".to_string()],
        swagger_ui: true,
    };

    // Build configuration
    let config = Config {
        download: DownloadConfig {
            output_dir: "icons".into(),
            ..Default::default()
        },
        server: ServerConfig { api: api_config },
        ..Default::default()
    };

    // Create engine instance
    let hunter = Arc::new(IconHunter::new(config.clone())?);
    let config_arc = Arc::new(config);

    println!("🚀 Starting icon-hunter REST API server");
    println!("📖 Swagger UI: http://localhost:8000/swagger-ui");
    println!("📡 API Base: http://localhost:8000");
    println!("🔄 Events stream: http://localhost:8000/events");
    println!();
    println!("Example commands:");
    println!("  # Search for apps");
    println!("  curl -X POST http://localhost:8000/search \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"term\": \"Signal\", \"store\": \"appstore\", \"country\": \"us\", \"limit\": 3}}'");
    println!();
    println!("  # Launch a download job (use records from the search response)");
    println!("  curl -X POST http://localhost:8000/download \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"apps\": [...], \"sizes\": [64, 128, 256], \"format\": \"zip\"}}'");
    println!();
    println!("  # Poll a job");
    println!("  curl http://localhost:8000/status/<job_id>");
    println!();
    println!("  # Fetch the finished archive");
    println!("  curl -o icons.zip http://localhost:8000/download/<job_id>");

    // Start the API server (runs indefinitely)
    start_api_server(hunter, config_arc).await?;

    Ok(())
}
