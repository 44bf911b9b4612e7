mod support;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use folio::application::imaging::ImageProcessor;
use folio::application::media::{MediaError, MediaService, UploadMediaCommand};
use folio::domain::error::DomainError;
use folio::domain::media::{MAX_UPLOAD_BYTES, MediaPolicy};

use support::{MemoryRepos, MemoryStorage, decoded_dimensions, jpeg_bytes, png_with_alpha};

struct Harness {
    repos: Arc<MemoryRepos>,
    storage: Arc<MemoryStorage>,
    service: MediaService,
}

fn harness() -> Harness {
    let repos = Arc::new(MemoryRepos::default());
    let storage = Arc::new(MemoryStorage::default());
    let service = MediaService::new(
        repos.clone(),
        storage.clone(),
        MediaPolicy::default(),
        ImageProcessor::default(),
    );
    Harness {
        repos,
        storage,
        service,
    }
}

fn command(name: &str, content_type: &str, body: Bytes) -> UploadMediaCommand {
    UploadMediaCommand {
        original_name: name.to_string(),
        content_type: content_type.to_string(),
        declared_size: body.len() as u64,
        body,
    }
}

#[tokio::test]
async fn rejects_unsupported_type_without_touching_storage() {
    let h = harness();

    let err = h
        .service
        .upload(command("notes.pdf", "application/pdf", Bytes::from_static(b"%PDF")))
        .await
        .expect_err("pdf must be rejected");

    assert!(matches!(
        err,
        MediaError::Rejected(DomainError::InvalidFileType { .. })
    ));
    assert!(h.storage.puts().await.is_empty());
    assert_eq!(h.repos.media_count().await, 0);
}

#[tokio::test]
async fn rejects_oversized_upload_by_declared_size() {
    let h = harness();
    let mut upload = command("big.jpg", "image/jpeg", jpeg_bytes(8, 8));
    upload.declared_size = MAX_UPLOAD_BYTES + 1;

    let err = h.service.upload(upload).await.expect_err("too large");

    assert!(matches!(
        err,
        MediaError::Rejected(DomainError::FileTooLarge { .. })
    ));
    assert!(h.storage.puts().await.is_empty());
    assert_eq!(h.repos.media_count().await, 0);
}

#[tokio::test]
async fn body_length_wins_over_understated_declared_size() {
    let h = harness();
    let body = Bytes::from(vec![0u8; (MAX_UPLOAD_BYTES + 1) as usize]);
    let mut upload = command("big.gif", "image/gif", body);
    upload.declared_size = 10;

    let err = h.service.upload(upload).await.expect_err("too large");

    assert!(matches!(
        err,
        MediaError::Rejected(DomainError::FileTooLarge { .. })
    ));
    assert!(h.storage.puts().await.is_empty());
}

#[tokio::test]
async fn gif_is_stored_verbatim_without_thumbnails() {
    let h = harness();
    let body = Bytes::from_static(b"GIF89a\x01\x00\x01\x00\x00\x00\x00;");

    let asset = h
        .service
        .upload(command("spinner.gif", "image/gif", body.clone()))
        .await
        .expect("gif upload");

    assert_eq!(asset.mime_type, "image/gif");
    assert_eq!((asset.width, asset.height), (0, 0));
    assert!(asset.thumbnail_sm.is_none());
    assert!(asset.thumbnail_md.is_none());
    assert!(asset.path.ends_with(".gif"));
    assert_eq!(asset.size, body.len() as i64);

    let puts = h.storage.puts().await;
    assert_eq!(puts, vec![asset.path.clone()]);
    let stored = h.storage.object(&asset.path).await.expect("stored gif");
    assert_eq!(stored.body, body);
    assert_eq!(stored.content_type, "image/gif");
}

#[tokio::test]
async fn svg_with_charset_parameter_passes_through() {
    let h = harness();
    let body = Bytes::from_static(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>");

    let asset = h
        .service
        .upload(command("logo.svg", "image/svg+xml; charset=utf-8", body.clone()))
        .await
        .expect("svg upload");

    assert_eq!(asset.mime_type, "image/svg+xml");
    assert!(asset.path.ends_with(".svg"));
    let stored = h.storage.object(&asset.path).await.expect("stored svg");
    assert_eq!(stored.body, body);
}

#[tokio::test]
async fn jpeg_upload_produces_main_and_two_thumbnails() {
    let h = harness();

    let asset = h
        .service
        .upload(command("photo.jpg", "image/jpeg", jpeg_bytes(300, 200)))
        .await
        .expect("jpeg upload");

    assert_eq!(asset.mime_type, "image/jpeg");
    assert_eq!((asset.width, asset.height), (300, 200));
    assert_eq!(asset.original_name, "photo.jpg");
    assert!(asset.url.starts_with("http://localhost:9000/blog-images/"));
    assert!(asset.url.ends_with(&asset.path));

    let puts = h.storage.puts().await;
    assert_eq!(puts.len(), 3);
    assert_eq!(puts[0], asset.path);
    assert!(puts[1].ends_with("_sm.jpg"));
    assert!(puts[2].ends_with("_md.jpg"));

    let main = h.storage.object(&puts[0]).await.expect("main artifact");
    assert_eq!(main.content_type, "image/jpeg");
    assert_eq!(asset.size, main.body.len() as i64);
    assert_eq!(decoded_dimensions(&main.body), (300, 200));

    let small = h.storage.object(&puts[1]).await.expect("small thumbnail");
    assert_eq!(decoded_dimensions(&small.body), (150, 100));

    // Narrower than the medium target, so kept at source width.
    let medium = h.storage.object(&puts[2]).await.expect("medium thumbnail");
    assert_eq!(decoded_dimensions(&medium.body), (300, 200));

    assert_eq!(
        asset.thumbnail_sm.as_deref(),
        Some(format!("http://localhost:9000/blog-images/{}", puts[1]).as_str())
    );
}

#[tokio::test]
async fn thumbnails_keep_aspect_ratio_for_wide_images() {
    let h = harness();

    h.service
        .upload(command("wide.png", "image/png", png_with_alpha(1200, 300)))
        .await
        .expect("png upload");

    let puts = h.storage.puts().await;
    let small = h.storage.object(&puts[1]).await.expect("small");
    let medium = h.storage.object(&puts[2]).await.expect("medium");
    assert_eq!(decoded_dimensions(&small.body), (150, 38));
    assert_eq!(decoded_dimensions(&medium.body), (400, 100));
}

#[tokio::test]
async fn png_is_reencoded_as_jpeg() {
    let h = harness();

    let asset = h
        .service
        .upload(command("alpha.png", "image/png", png_with_alpha(40, 20)))
        .await
        .expect("png upload");

    assert_eq!(asset.mime_type, "image/jpeg");
    assert!(asset.path.ends_with(".jpg"));
    let main = h.storage.object(&asset.path).await.expect("main");
    assert_eq!(
        image::guess_format(&main.body).expect("format"),
        image::ImageFormat::Jpeg
    );
}

#[tokio::test]
async fn undecodable_image_is_a_processing_error() {
    let h = harness();

    let err = h
        .service
        .upload(command("broken.jpg", "image/jpeg", Bytes::from_static(b"not a jpeg")))
        .await
        .expect_err("garbage must fail");

    assert!(matches!(err, MediaError::Processing(_)));
    assert!(h.storage.puts().await.is_empty());
    assert_eq!(h.repos.media_count().await, 0);
}

#[tokio::test]
async fn failed_medium_thumbnail_rolls_back_earlier_artifacts() {
    let h = harness();
    h.storage.fail_puts_ending_with("_md.jpg").await;

    let err = h
        .service
        .upload(command("photo.jpg", "image/jpeg", jpeg_bytes(640, 480)))
        .await
        .expect_err("medium put fails");

    assert!(matches!(
        err,
        MediaError::Upload {
            artifact: "medium thumbnail",
            ..
        }
    ));
    assert!(h.storage.paths().await.is_empty());
    assert_eq!(h.storage.deletes().await.len(), 2);
    assert_eq!(h.repos.media_count().await, 0);
}

#[tokio::test]
async fn failed_metadata_write_removes_every_artifact() {
    let h = harness();
    h.repos.set_unavailable(true);

    let err = h
        .service
        .upload(command("photo.jpg", "image/jpeg", jpeg_bytes(64, 64)))
        .await
        .expect_err("metadata write fails");

    assert!(matches!(err, MediaError::Repo(_)));
    assert!(h.storage.paths().await.is_empty());
    assert_eq!(h.storage.deletes().await.len(), 3);
}

/// Abandoned uploads clean up on a spawned task; give it a moment to finish.
async fn wait_for_empty_storage(storage: &MemoryStorage) -> Vec<String> {
    for _ in 0..100 {
        let paths = storage.paths().await;
        if paths.is_empty() {
            return paths;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    storage.paths().await
}

#[tokio::test]
async fn cancelled_upload_removes_artifacts_already_written() {
    let h = harness();
    h.storage.hang_puts_ending_with("_md.jpg").await;

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        h.service
            .upload(command("photo.jpg", "image/jpeg", jpeg_bytes(64, 64))),
    )
    .await;
    assert!(outcome.is_err(), "upload should still be pending");
    tokio::task::yield_now().await;

    assert_eq!(h.storage.puts().await.len(), 3);
    assert!(wait_for_empty_storage(&h.storage).await.is_empty());
    assert_eq!(h.repos.media_count().await, 0);
}

#[tokio::test]
async fn cancel_during_rollback_still_removes_remaining_artifacts() {
    let h = harness();
    h.repos.set_unavailable(true);
    h.storage.hang_next_delete();

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        h.service
            .upload(command("photo.jpg", "image/jpeg", jpeg_bytes(64, 64))),
    )
    .await;
    assert!(outcome.is_err(), "rollback should still be pending");
    tokio::task::yield_now().await;

    assert!(wait_for_empty_storage(&h.storage).await.is_empty());
    assert_eq!(h.repos.media_count().await, 0);
}

#[tokio::test]
async fn delete_removes_all_artifacts_then_the_row() {
    let h = harness();
    let asset = h
        .service
        .upload(command("photo.jpg", "image/jpeg", jpeg_bytes(300, 200)))
        .await
        .expect("upload");

    h.service.delete(asset.id).await.expect("delete");

    let deletes = h.storage.deletes().await;
    assert_eq!(deletes.len(), 3);
    assert_eq!(deletes[0], asset.path);
    assert!(h.storage.paths().await.is_empty());
    assert_eq!(h.repos.media_count().await, 0);
    assert!(matches!(
        h.service.find(asset.id).await,
        Err(MediaError::NotFound)
    ));
}

#[tokio::test]
async fn failed_main_delete_keeps_the_row() {
    let h = harness();
    let asset = h
        .service
        .upload(command("photo.jpg", "image/jpeg", jpeg_bytes(32, 32)))
        .await
        .expect("upload");
    h.storage.fail_delete_of(&asset.path).await;

    let err = h.service.delete(asset.id).await.expect_err("main delete fails");

    assert!(matches!(err, MediaError::Storage(_)));
    assert_eq!(h.repos.media_count().await, 1);
    assert_eq!(h.storage.deletes().await, vec![asset.path.clone()]);
}

#[tokio::test]
async fn failed_thumbnail_delete_still_removes_the_row() {
    let h = harness();
    let asset = h
        .service
        .upload(command("photo.jpg", "image/jpeg", jpeg_bytes(32, 32)))
        .await
        .expect("upload");
    let small = asset.path.replace(".jpg", "_sm.jpg");
    h.storage.fail_delete_of(&small).await;

    h.service.delete(asset.id).await.expect("delete succeeds");

    assert_eq!(h.repos.media_count().await, 0);
    assert_eq!(h.storage.paths().await, vec![small]);
}

#[tokio::test]
async fn delete_of_unknown_asset_is_not_found() {
    let h = harness();
    assert!(matches!(
        h.service.delete(999).await,
        Err(MediaError::NotFound)
    ));
    assert!(h.storage.deletes().await.is_empty());
}

#[tokio::test]
async fn listing_is_newest_first_with_total() {
    let h = harness();
    for name in ["a.gif", "b.gif", "c.gif"] {
        h.service
            .upload(command(name, "image/gif", Bytes::from_static(b"GIF89a")))
            .await
            .expect("upload");
    }

    let listing = h.service.list(2, 0).await.expect("list");

    assert_eq!(listing.total, 3);
    let names: Vec<_> = listing
        .items
        .iter()
        .map(|asset| asset.original_name.as_str())
        .collect();
    assert_eq!(names, vec!["c.gif", "b.gif"]);
}
