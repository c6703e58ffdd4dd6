//! Batch download example
//!
//! Searches for several apps across both stores, collects the top hit of
//! each search, and downloads all of their icons in a single job, polling
//! the job snapshot until it settles.

use icon_hunter::types::{ArchiveFormat, DownloadRequest};
use icon_hunter::{Config, IconHunter, JobStatus, StoreFilter};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let hunter = IconHunter::new(Config::default())?;

    let terms = ["WhatsApp", "Telegram", "Signal"];
    let mut selected = Vec::new();

    for term in terms {
        println!("🔍 Searching for '{term}'...");
        let apps = hunter.search(term, StoreFilter::Both, None, 3).await?;
        // Take the top hit per store
        if let Some(app) = apps.iter().find(|a| a.store == icon_hunter::Store::Appstore) {
            selected.push(app.clone());
        }
        if let Some(app) = apps.iter().find(|a| a.store == icon_hunter::Store::Googleplay) {
            selected.push(app.clone());
        }
    }

    if selected.is_empty() {
        println!("❌ No apps found");
        return Ok(());
    }

    println!("\n📱 Selected {} apps:", selected.len());
    for app in &selected {
        println!("  - {} ({})", app.name, app.store);
    }

    println!("\n📥 Starting batch download...");
    let job_id = hunter
        .start_download(DownloadRequest {
            apps: selected,
            sizes: vec![64, 128, 256],
            format: ArchiveFormat::Zip,
        })
        .await?;

    // Poll the job snapshot until it settles
    let snapshot = loop {
        let snapshot = hunter.job(&job_id).await?;
        println!(
            "Status: {} - Progress: {}/{}",
            snapshot.status, snapshot.progress, snapshot.total
        );
        if snapshot.status.is_terminal() {
            break snapshot;
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    };

    println!("\n📊 Download results:");
    match snapshot.status {
        JobStatus::Completed => {
            println!("✅ Batch download completed!");
            if let Some(zip_path) = &snapshot.zip_path {
                println!("📦 ZIP file: {}", zip_path.display());
            }

            println!("\n✅ Successfully downloaded:");
            for name in &snapshot.completed_apps {
                println!("  - {name}");
            }

            if !snapshot.failed_apps.is_empty() {
                println!("\n❌ Failed downloads:");
                for failure in &snapshot.failed_apps {
                    println!("  - {}: {}", failure.app, failure.error);
                }
            }
        }
        _ => {
            let reason = snapshot
                .error_message
                .unwrap_or_else(|| "unknown error".to_string());
            println!("❌ Batch download failed: {reason}");
        }
    }

    Ok(())
}
