use super::*;
use crate::config::RetryConfig;
use crate::types::{ArchiveFormat, Store};
use std::io::Read;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Engine wired to a mock upstream, with fast retries and a temp output dir
fn test_hunter(server: &MockServer) -> (IconHunter, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().expect("tempdir");

    let mut config = Config::default();
    config.stores.appstore.base_url = server.uri();
    config.stores.googleplay.base_url = server.uri();
    config.download.output_dir = temp_dir.path().to_path_buf();
    config.download.max_concurrent_fetches = 2;
    config.retry = RetryConfig {
        max_attempts: 1,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
        jitter: false,
    };

    let hunter = IconHunter::new(config).expect("engine must build");
    (hunter, temp_dir)
}

fn app(name: &str, icon_url: &str) -> AppRecord {
    AppRecord {
        name: name.to_string(),
        store: Store::Appstore,
        price: "Free".to_string(),
        rating: None,
        icon_url: icon_url.to_string(),
        developer: None,
        bundle_id: None,
    }
}

fn request(apps: Vec<AppRecord>, sizes: Vec<u32>) -> DownloadRequest {
    DownloadRequest {
        apps,
        sizes,
        format: ArchiveFormat::Zip,
    }
}

/// Poll the registry until the job settles (or the test times out)
async fn wait_terminal(hunter: &IconHunter, id: &JobId) -> JobSnapshot {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let snapshot = hunter.job(id).await.expect("job must exist");
            if snapshot.status.is_terminal() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job did not reach a terminal state in time")
}

#[tokio::test]
async fn empty_apps_fails_validation_without_network_calls() {
    let server = MockServer::start().await;
    let (hunter, _dir) = test_hunter(&server);

    let err = hunter
        .start_download(request(vec![], vec![64]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(
        requests.is_empty(),
        "validation failures must not touch the network"
    );
}

#[tokio::test]
async fn out_of_range_sizes_fail_validation() {
    let server = MockServer::start().await;
    let (hunter, _dir) = test_hunter(&server);

    let apps = vec![app("Signal", "https://example.com/sig/100x100bb.png")];

    let err = hunter
        .start_download(request(apps.clone(), vec![0]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = hunter
        .start_download(request(apps, vec![64, 4096]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn job_completes_and_archive_holds_every_icon() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/art/(sig|wa)/\d+x\d+bb\.png$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_MAGIC))
        .mount(&server)
        .await;

    let (hunter, _dir) = test_hunter(&server);

    let apps = vec![
        app("Signal", &format!("{}/art/sig/100x100bb.png", server.uri())),
        app("WhatsApp", &format!("{}/art/wa/100x100bb.png", server.uri())),
    ];
    let id = hunter
        .start_download(request(apps, vec![128, 64]))
        .await
        .unwrap();

    let snapshot = wait_terminal(&hunter, &id).await;

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.progress, 2);
    assert_eq!(snapshot.total, 2);
    assert_eq!(snapshot.completed_apps, vec!["Signal", "WhatsApp"]);
    assert!(snapshot.failed_apps.is_empty());
    assert!(snapshot.error_message.is_none());
    assert!(snapshot.finished_at.is_some());

    let zip_path = snapshot.zip_path.expect("completed job must have a path");
    let file = std::fs::File::open(&zip_path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 4, "2 apps x 2 sizes");

    let mut bytes = Vec::new();
    archive
        .by_name("Signal/Signal_64x64.png")
        .unwrap()
        .read_to_end(&mut bytes)
        .unwrap();
    assert_eq!(bytes, PNG_MAGIC);

    // Sizes were requested as [128, 64]; entries are normalized ascending
    assert!(archive.by_name("Signal/Signal_128x128.png").is_ok());
    assert!(archive.by_name("WhatsApp/WhatsApp_64x64.png").is_ok());
    assert!(archive.by_name("WhatsApp/WhatsApp_128x128.png").is_ok());
}

#[tokio::test]
async fn unreachable_icons_fail_the_job_with_a_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/art/ghost/.*$"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (hunter, _dir) = test_hunter(&server);

    let apps = vec![app(
        "Ghost App",
        &format!("{}/art/ghost/100x100bb.png", server.uri()),
    )];
    let id = hunter
        .start_download(request(apps, vec![64, 128]))
        .await
        .unwrap();

    let snapshot = wait_terminal(&hunter, &id).await;

    assert_eq!(snapshot.status, JobStatus::Failed);
    assert_eq!(snapshot.progress, 1, "the failed app still counts as processed");
    assert!(snapshot.completed_apps.is_empty());
    assert_eq!(snapshot.failed_apps.len(), 1);
    assert_eq!(snapshot.failed_apps[0].app, "Ghost App");
    let message = snapshot.error_message.expect("failed job must carry a message");
    assert!(!message.is_empty());
    assert!(snapshot.zip_path.is_none());
}

#[tokio::test]
async fn partial_failure_still_completes_with_failures_listed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/art/sig/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_MAGIC))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/art/ghost/.*$"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (hunter, _dir) = test_hunter(&server);

    let apps = vec![
        app("Signal", &format!("{}/art/sig/100x100bb.png", server.uri())),
        app("Ghost App", &format!("{}/art/ghost/100x100bb.png", server.uri())),
    ];
    let id = hunter.start_download(request(apps, vec![64])).await.unwrap();

    let snapshot = wait_terminal(&hunter, &id).await;

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.progress, 2);
    assert_eq!(snapshot.completed_apps, vec!["Signal"]);
    assert_eq!(snapshot.failed_apps.len(), 1);
    assert_eq!(snapshot.failed_apps[0].app, "Ghost App");
    assert!(snapshot.zip_path.is_some());
}

#[tokio::test]
async fn progress_never_decreases_while_polling() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/art/.*$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PNG_MAGIC)
                .set_delay(Duration::from_millis(30)),
        )
        .mount(&server)
        .await;

    let (hunter, _dir) = test_hunter(&server);

    let apps: Vec<AppRecord> = (0..4)
        .map(|i| app(&format!("App {i}"), &format!("{}/art/a{i}/100x100bb.png", server.uri())))
        .collect();
    let id = hunter.start_download(request(apps, vec![64])).await.unwrap();

    let mut last = 0;
    loop {
        let snapshot = hunter.job(&id).await.unwrap();
        assert!(
            snapshot.progress >= last,
            "progress went backwards: {} -> {}",
            last,
            snapshot.progress
        );
        assert!(snapshot.progress <= snapshot.total);
        last = snapshot.progress;
        if snapshot.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(last, 4);
}

#[tokio::test]
async fn archive_path_before_completion_is_not_ready() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/art/.*$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PNG_MAGIC)
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let (hunter, _dir) = test_hunter(&server);

    let apps = vec![app("Slow App", &format!("{}/art/slow/100x100bb.png", server.uri()))];
    let id = hunter.start_download(request(apps, vec![64])).await.unwrap();

    let err = hunter.archive_path(&id).await.unwrap_err();
    assert!(matches!(err, Error::Job(JobError::NotReady { .. })));

    // After completion the path resolves
    let snapshot = wait_terminal(&hunter, &id).await;
    assert_eq!(snapshot.status, JobStatus::Completed);
    let path = hunter.archive_path(&id).await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn archive_path_for_unknown_job_is_not_found() {
    let server = MockServer::start().await;
    let (hunter, _dir) = test_hunter(&server);

    let err = hunter
        .archive_path(&JobId::from("no-such-job"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Job(JobError::NotFound { .. })));
}

#[tokio::test]
async fn cancelled_job_settles_as_failed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/art/.*$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PNG_MAGIC)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let (hunter, _dir) = test_hunter(&server);

    let apps = vec![app("Slow App", &format!("{}/art/slow/100x100bb.png", server.uri()))];
    let id = hunter.start_download(request(apps, vec![64])).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    hunter.cancel(&id).await.unwrap();

    let snapshot = wait_terminal(&hunter, &id).await;
    assert_eq!(snapshot.status, JobStatus::Failed);
    let message = snapshot.error_message.unwrap();
    assert!(message.contains("cancelled"), "unexpected message: {message}");
}

#[tokio::test]
async fn cancelling_a_terminal_job_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/art/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_MAGIC))
        .mount(&server)
        .await;

    let (hunter, _dir) = test_hunter(&server);

    let apps = vec![app("Signal", &format!("{}/art/sig/100x100bb.png", server.uri()))];
    let id = hunter.start_download(request(apps, vec![64])).await.unwrap();
    wait_terminal(&hunter, &id).await;

    let err = hunter.cancel(&id).await.unwrap_err();
    assert!(matches!(err, Error::Job(JobError::InvalidTransition { .. })));
}

#[tokio::test]
async fn empty_sizes_fall_back_to_configured_defaults() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/art/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_MAGIC))
        .mount(&server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.stores.appstore.base_url = server.uri();
    config.download.output_dir = temp_dir.path().to_path_buf();
    config.download.default_sizes = vec![32];
    let hunter = IconHunter::new(config).unwrap();

    let apps = vec![app("Signal", &format!("{}/art/sig/100x100bb.png", server.uri()))];
    let id = hunter.start_download(request(apps, vec![])).await.unwrap();

    let snapshot = wait_terminal(&hunter, &id).await;
    assert_eq!(snapshot.status, JobStatus::Completed);

    let file = std::fs::File::open(snapshot.zip_path.unwrap()).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 1);
    assert!(archive.by_name("Signal/Signal_32x32.png").is_ok());
}

#[tokio::test]
async fn shutdown_rejects_new_jobs() {
    let server = MockServer::start().await;
    let (hunter, _dir) = test_hunter(&server);

    hunter.shutdown().await.unwrap();

    let apps = vec![app("Signal", "https://example.com/sig/100x100bb.png")];
    let err = hunter.start_download(request(apps, vec![64])).await.unwrap_err();
    assert!(matches!(err, Error::ShuttingDown));
}

#[tokio::test]
async fn search_validation_rejects_empty_term_and_zero_limit() {
    let server = MockServer::start().await;
    let (hunter, _dir) = test_hunter(&server);

    let err = hunter
        .search("  ", StoreFilter::Both, None, 5)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = hunter
        .search("Signal", StoreFilter::Both, None, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn both_store_search_puts_appstore_results_first() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string(
                    r#"{"resultCount":1,"results":[{
                        "trackName": "Signal - Private Messenger",
                        "formattedPrice": "Free",
                        "artworkUrl100": "https://is1-ssl.mzstatic.com/image/thumb/sig/100x100bb.jpg"
                    }]}"#,
                ),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/store/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/store/apps/details?id=org.thoughtcrime.securesms">
               <img src="https://play-lh.googleusercontent.com/abc=s64">
               <span>Signal Private Messenger</span></a>"#,
        ))
        .mount(&server)
        .await;

    let (hunter, _dir) = test_hunter(&server);

    let records = hunter
        .search("Signal", StoreFilter::Both, None, 3)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].store, Store::Appstore);
    assert_eq!(records[1].store, Store::Googleplay);
}

#[tokio::test]
async fn job_lifecycle_emits_events_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/art/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_MAGIC))
        .mount(&server)
        .await;

    let (hunter, _dir) = test_hunter(&server);
    let mut events = hunter.subscribe();

    let apps = vec![app("Signal", &format!("{}/art/sig/100x100bb.png", server.uri()))];
    let id = hunter.start_download(request(apps, vec![64])).await.unwrap();
    wait_terminal(&hunter, &id).await;

    // The terminal registry write lands just before the terminal event is
    // broadcast; give the worker a moment to finish sending
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    assert!(matches!(seen.first(), Some(Event::JobQueued { .. })));
    assert!(matches!(seen.get(1), Some(Event::JobStarted { .. })));
    assert!(
        seen.iter()
            .any(|e| matches!(e, Event::IconFetched { size: 64, .. }))
    );
    assert!(matches!(seen.last(), Some(Event::JobCompleted { .. })));
}
