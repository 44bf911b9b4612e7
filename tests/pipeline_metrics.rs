mod support;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use folio::application::imaging::ImageProcessor;
use folio::application::media::{MediaService, UploadMediaCommand};
use folio::application::views::ViewService;
use folio::domain::media::MediaPolicy;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use support::{CountingViewCounter, MemoryRepos, MemoryStorage, MemoryViewStore, jpeg_bytes};

/// Run `scenario` on a current-thread runtime with a recorder scoped to this
/// thread, returning counter values keyed by `name{label=value,...}`.
fn record<F, Fut>(scenario: F) -> HashMap<String, u64>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime");

    metrics::with_local_recorder(&recorder, || runtime.block_on(scenario()));

    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(composite_key, _, _, value)| {
            let key = composite_key.key();
            let labels: Vec<String> = key
                .labels()
                .map(|label| format!("{}={}", label.key(), label.value()))
                .collect();
            let name = if labels.is_empty() {
                key.name().to_string()
            } else {
                format!("{}{{{}}}", key.name(), labels.join(","))
            };
            match value {
                DebugValue::Counter(count) => Some((name, count)),
                _ => None,
            }
        })
        .collect()
}

fn media_service(storage: Arc<MemoryStorage>) -> MediaService {
    MediaService::new(
        Arc::new(MemoryRepos::default()),
        storage,
        MediaPolicy::default(),
        ImageProcessor::default(),
    )
}

fn upload(content_type: &str, body: Bytes) -> UploadMediaCommand {
    UploadMediaCommand {
        original_name: "fixture".to_string(),
        content_type: content_type.to_string(),
        declared_size: body.len() as u64,
        body,
    }
}

#[test]
fn uploads_are_counted_by_kind() {
    let counters = record(|| async {
        let media = media_service(Arc::new(MemoryStorage::default()));
        media
            .upload(upload("image/jpeg", jpeg_bytes(16, 16)))
            .await
            .expect("processed upload");
        media
            .upload(upload("image/gif", Bytes::from_static(b"GIF89a")))
            .await
            .expect("passthrough upload");
        media
            .upload(upload("application/pdf", Bytes::from_static(b"%PDF")))
            .await
            .expect_err("rejected upload");
    });

    assert_eq!(
        counters.get("folio_media_uploads_total{kind=processed}"),
        Some(&1)
    );
    assert_eq!(
        counters.get("folio_media_uploads_total{kind=passthrough}"),
        Some(&1)
    );
}

#[test]
fn failed_thumbnail_cleanup_is_counted() {
    let counters = record(|| async {
        let storage = Arc::new(MemoryStorage::default());
        let media = media_service(storage.clone());
        let asset = media
            .upload(upload("image/jpeg", jpeg_bytes(16, 16)))
            .await
            .expect("upload");
        storage
            .fail_delete_of(&asset.path.replace(".jpg", "_md.jpg"))
            .await;

        media.delete(asset.id).await.expect("delete succeeds");
    });

    assert_eq!(counters.get("folio_media_cleanup_failures_total"), Some(&1));
}

#[test]
fn view_outcomes_are_counted() {
    let counters = record(|| async {
        let store = Arc::new(MemoryViewStore::default());
        let counter = Arc::new(CountingViewCounter::default());
        let views = ViewService::new(store.clone(), counter.clone());

        views.record_view(1, "10.0.0.1").await.expect("recorded");
        views.record_view(1, "10.0.0.1").await.expect("repeat");
        counter.set_failing(true);
        views.record_view(2, "10.0.0.1").await.expect("recorded");
        store.set_unavailable(true);
        views.record_view(3, "10.0.0.1").await.expect_err("store down");
    });

    assert_eq!(counters.get("folio_views_recorded_total"), Some(&1));
    assert_eq!(
        counters.get("folio_view_counter_increment_failures_total"),
        Some(&1)
    );
    assert_eq!(counters.get("folio_view_store_errors_total"), Some(&1));
}
