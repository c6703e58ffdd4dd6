//! Basic search-and-download example
//!
//! Demonstrates the core embedded workflow:
//! - Searching the App Store
//! - Launching a download job for the first hit
//! - Waiting for the job via the lifecycle events

use icon_hunter::types::{ArchiveFormat, DownloadRequest};
use icon_hunter::{Config, Event, IconHunter, StoreFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let hunter = IconHunter::new(Config::default())?;

    println!("🔍 Searching for 'Signal' in the App Store...");
    let apps = hunter
        .search("Signal", StoreFilter::Appstore, None, 5)
        .await?;

    if apps.is_empty() {
        println!("❌ No apps found");
        return Ok(());
    }

    println!("📱 Found {} apps:", apps.len());
    for (i, app) in apps.iter().enumerate() {
        let developer = app.developer.as_deref().unwrap_or("unknown developer");
        println!("{}. {} - {} (by {})", i + 1, app.name, app.price, developer);
        if let Some(rating) = app.rating {
            println!("   ⭐ Rating: {rating:.1}/5");
        }
    }

    // Download icons for the first result
    let first = apps.into_iter().take(1).collect::<Vec<_>>();
    println!("\n📥 Downloading icons for {}...", first[0].name);

    let mut events = hunter.subscribe();

    let job_id = hunter
        .start_download(DownloadRequest {
            apps: first,
            sizes: vec![128, 256, 512],
            format: ArchiveFormat::Zip,
        })
        .await?;
    println!("Job started: {job_id}");

    // Follow the job through its events
    while let Ok(event) = events.recv().await {
        match event {
            Event::IconFetched { app, size, .. } => {
                println!("  ✓ {app} at {size}x{size}");
            }
            Event::IconFailed { app, error, .. } => {
                println!("  ✗ {app}: {error}");
            }
            Event::JobCompleted { id, zip_path } if id == job_id => {
                println!("✅ Archive written to {}", zip_path.display());
                break;
            }
            Event::JobFailed { id, error } if id == job_id => {
                println!("❌ Job failed: {error}");
                break;
            }
            _ => {}
        }
    }

    Ok(())
}
