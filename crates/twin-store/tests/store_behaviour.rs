//! End-to-end behaviour of the store façade over real backend implementations

use pretty_assertions::assert_eq;
use serde_yaml::Mapping;
use std::sync::Arc;
use twin_artifact::{
    frontmatter, ArtifactId, ArtifactKey, ArtifactKind, ContentHash, FragmentKind,
    FragmentVariant,
};
use twin_store::document::{DocStoreBackend, DocumentCollection, MemoryCollection};
use twin_store::drive::DriveBackend;
use twin_store::fragments::NoThumbnailer;
use twin_store::{ArtifactBackend, ShadowTwinStore, SourceRef, StoreError};
use twin_test_utils::{
    init_test_tracing, FailingThumbnailer, FixedThumbnailer, MemoryDriveProvider,
    RecordingBackend, MEMORY_ROOT_ID,
};

fn doc_backend(collection: Arc<MemoryCollection>) -> Arc<DocStoreBackend> {
    Arc::new(DocStoreBackend::new("notes", collection))
}

fn drive_backend() -> Arc<DriveBackend> {
    Arc::new(DriveBackend::new(
        Arc::new(MemoryDriveProvider::new()),
        MEMORY_ROOT_ID,
    ))
}

fn store_over(
    primary: Arc<dyn ArtifactBackend>,
    fallback: Option<Arc<dyn ArtifactBackend>>,
) -> ShadowTwinStore {
    ShadowTwinStore::new(
        SourceRef::new("doc1").with_name("Lecture 1"),
        primary,
        fallback,
        false,
        Arc::new(NoThumbnailer),
    )
}

#[tokio::test]
async fn full_lifecycle_over_document_store() {
    init_test_tracing();
    let collection = Arc::new(MemoryCollection::new());
    let store = store_over(doc_backend(collection.clone()), None);

    // Write a transcript and read it back.
    store
        .upsert_markdown(ArtifactKind::Transcript, "de", None, "hello")
        .await
        .unwrap();
    assert!(store
        .exists(ArtifactKind::Transcript, "de", None, false)
        .await
        .unwrap());
    let record = store
        .get_markdown(ArtifactKind::Transcript, "de", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.markdown, "hello");

    // Empty transformation content never reaches storage.
    let err = store
        .upsert_markdown(ArtifactKind::Transformation, "de", Some("report"), "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::EmptyContent(_)));

    // Write a transformation.
    store
        .upsert_markdown(ArtifactKind::Transformation, "de", Some("report"), "# Report")
        .await
        .unwrap();

    // Remove the transcript underneath the store; the superset check still
    // answers true because the transformation subsumes it.
    let transcript_id = ArtifactId::encode("notes", &ArtifactKey::transcript("doc1", "de"));
    assert!(collection.delete(transcript_id.as_str()).await.unwrap());
    assert!(!store
        .exists(ArtifactKind::Transcript, "de", None, false)
        .await
        .unwrap());
    assert!(store
        .exists(ArtifactKind::Transcript, "de", None, true)
        .await
        .unwrap());
    // Narrowed to a template the transformation actually has, still true.
    assert!(store
        .exists(ArtifactKind::Transcript, "de", Some("report"), true)
        .await
        .unwrap());
    // Narrowed to a template nobody wrote, false.
    assert!(!store
        .exists(ArtifactKind::Transcript, "de", Some("summary"), true)
        .await
        .unwrap());
}

#[tokio::test]
async fn full_lifecycle_over_drive() {
    init_test_tracing();
    let store = store_over(drive_backend(), None);

    store
        .upsert_markdown(ArtifactKind::Transcript, "de", None, "hello")
        .await
        .unwrap();
    let record = store
        .get_markdown(ArtifactKind::Transcript, "de", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.markdown, "hello");
    assert_eq!(record.name, "transcript.de.md");

    // Replace, not duplicate.
    store
        .upsert_markdown(ArtifactKind::Transcript, "de", None, "hello again")
        .await
        .unwrap();
    let record = store
        .get_markdown(ArtifactKind::Transcript, "de", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.markdown, "hello again");
}

#[tokio::test]
async fn transcript_lookup_ignores_template_argument_over_drive() {
    init_test_tracing();
    let store = store_over(drive_backend(), None);

    // A stray template on a transcript write must not leak into the file
    // name; the artifact stays resolvable under the plain transcript key.
    store
        .upsert_markdown(ArtifactKind::Transcript, "de", Some("report"), "hello")
        .await
        .unwrap();
    let record = store
        .get_markdown(ArtifactKind::Transcript, "de", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.name, "transcript.de.md");

    // And a live transcript is found even when the existence check names a
    // template, with or without the superset flag.
    assert!(store
        .exists(ArtifactKind::Transcript, "de", Some("report"), true)
        .await
        .unwrap());
    assert!(store
        .exists(ArtifactKind::Transcript, "de", Some("report"), false)
        .await
        .unwrap());
}

#[tokio::test]
async fn rejected_write_touches_no_backend() {
    init_test_tracing();
    let recorder = Arc::new(RecordingBackend::new(doc_backend(Arc::new(
        MemoryCollection::new(),
    ))));
    let store = store_over(recorder.clone(), None);

    let err = store
        .upsert_markdown(ArtifactKind::Transcript, "de", None, " \n\t ")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::EmptyContent(_)));
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn primary_is_consulted_before_fallback() {
    init_test_tracing();
    let primary = Arc::new(RecordingBackend::new(doc_backend(Arc::new(
        MemoryCollection::new(),
    ))));
    let fallback = Arc::new(RecordingBackend::new(drive_backend()));
    let store = store_over(primary.clone(), Some(fallback.clone()));

    // Only the fallback holds the artifact.
    fallback
        .write(
            &ArtifactKey::transcript("doc1", "de"),
            "from the drive",
            &twin_store::WriteContext::default(),
        )
        .await
        .unwrap();

    let record = store
        .get_markdown(ArtifactKind::Transcript, "de", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.markdown, "from the drive");

    // The primary saw the read first and missed; only then was the fallback
    // asked.
    assert_eq!(primary.call_count("read"), 1);
    assert_eq!(fallback.call_count("read"), 1);
    assert_eq!(fallback.call_count("write"), 1);
}

#[tokio::test]
async fn missing_everywhere_is_none() {
    init_test_tracing();
    let store = store_over(
        doc_backend(Arc::new(MemoryCollection::new())),
        Some(drive_backend()),
    );
    let record = store
        .get_markdown(ArtifactKind::Transformation, "en", Some("summary"))
        .await
        .unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn dual_persist_mirrors_to_fallback() {
    init_test_tracing();
    let collection = Arc::new(MemoryCollection::new());
    let drive = drive_backend();
    let store = ShadowTwinStore::new(
        SourceRef::new("doc1").with_name("Lecture 1"),
        doc_backend(collection),
        Some(drive.clone()),
        true,
        Arc::new(NoThumbnailer),
    );

    store
        .upsert_markdown(ArtifactKind::Transcript, "de", None, "mirrored")
        .await
        .unwrap();

    // The fallback received its own copy.
    let mirrored = drive
        .read(&ArtifactKey::transcript("doc1", "de"))
        .await
        .unwrap();
    assert_eq!(mirrored.markdown, "mirrored");
}

#[tokio::test]
async fn fragment_upload_deduplicates_by_hash() {
    init_test_tracing();
    let recorder = Arc::new(RecordingBackend::new(doc_backend(Arc::new(
        MemoryCollection::new(),
    ))));
    let store = store_over(recorder.clone(), None);

    let first = store
        .upload_fragment(
            b"the same bytes",
            "photo.jpg",
            "image/jpeg",
            FragmentKind::Image,
            FragmentVariant::Original,
            None,
        )
        .await
        .unwrap();
    let second = store
        .upload_fragment(
            b"the same bytes",
            "photo-copy.jpg",
            "image/jpeg",
            FragmentKind::Image,
            FragmentVariant::Original,
            None,
        )
        .await
        .unwrap();

    assert_eq!(first.hash, second.hash);
    assert_eq!(first.locator, second.locator);
    assert_eq!(recorder.call_count("put_binary_fragment"), 1);

    // Same bytes, different variant: stored separately.
    store
        .upload_fragment(
            b"the same bytes",
            "photo-thumb.jpg",
            "image/jpeg",
            FragmentKind::Image,
            FragmentVariant::Thumbnail,
            Some(ContentHash::compute(b"the same bytes")),
        )
        .await
        .unwrap();
    assert_eq!(recorder.call_count("put_binary_fragment"), 2);
}

#[tokio::test]
async fn cover_image_with_thumbnail_over_drive() {
    init_test_tracing();
    let store = ShadowTwinStore::new(
        SourceRef::new("doc1").with_name("Lecture 1"),
        drive_backend(),
        None,
        false,
        Arc::new(FixedThumbnailer::png(&b"tiny"[..])),
    );
    store
        .upsert_markdown(ArtifactKind::Transcript, "de", None, "body text")
        .await
        .unwrap();

    let outcome = store
        .upload_cover_image_and_patch(
            b"pixels",
            "cover.jpg",
            "image/jpeg",
            ArtifactKind::Transcript,
            "de",
            None,
        )
        .await
        .unwrap();

    let thumb = outcome.thumbnail.expect("thumbnail derived");
    assert_eq!(thumb.variant, FragmentVariant::Thumbnail);
    assert_eq!(thumb.source_hash, Some(outcome.original.hash));

    let record = store
        .get_markdown(ArtifactKind::Transcript, "de", None)
        .await
        .unwrap()
        .unwrap();
    assert!(record.frontmatter_value("cover_image").is_some());
    assert!(record.frontmatter_value("cover_image_thumbnail").is_some());
    let (_, body) = frontmatter::parse(&record.markdown);
    assert_eq!(body, "body text");
}

#[tokio::test]
async fn thumbnail_failure_is_not_fatal() {
    init_test_tracing();
    let store = ShadowTwinStore::new(
        SourceRef::new("doc1"),
        doc_backend(Arc::new(MemoryCollection::new())),
        None,
        false,
        Arc::new(FailingThumbnailer),
    );
    store
        .upsert_markdown(ArtifactKind::Transcript, "de", None, "body")
        .await
        .unwrap();

    let outcome = store
        .upload_cover_image_and_patch(
            b"pixels",
            "cover.png",
            "image/png",
            ArtifactKind::Transcript,
            "de",
            None,
        )
        .await
        .unwrap();
    assert!(outcome.thumbnail.is_none());

    let record = store
        .get_markdown(ArtifactKind::Transcript, "de", None)
        .await
        .unwrap()
        .unwrap();
    assert!(record.frontmatter_value("cover_image").is_some());
    assert!(record.frontmatter_value("cover_image_thumbnail").is_none());
}

#[tokio::test]
async fn patch_preserves_body_bytes_exactly() {
    init_test_tracing();
    let store = store_over(doc_backend(Arc::new(MemoryCollection::new())), None);
    let body = "Line one.\n\n  indented\ttabbed\nno trailing newline";
    let original = format!("---\nstatus: draft\n---\n{body}");
    store
        .upsert_markdown(ArtifactKind::Transcript, "de", None, &original)
        .await
        .unwrap();

    let mut patches = Mapping::new();
    patches.insert("status".into(), "final".into());
    patches.insert("reviewed".into(), true.into());
    let outcome = store
        .patch_frontmatter(ArtifactKind::Transcript, "de", None, &patches)
        .await
        .unwrap();

    let (meta, patched_body) = frontmatter::parse(&outcome.markdown);
    assert_eq!(patched_body, body);
    assert_eq!(
        meta.get(serde_yaml::Value::from("status")),
        Some(&serde_yaml::Value::from("final"))
    );
    assert_eq!(
        meta.get(serde_yaml::Value::from("reviewed")),
        Some(&serde_yaml::Value::from(true))
    );
}

#[tokio::test]
async fn templateless_read_picks_most_recent_on_both_backends() {
    init_test_tracing();
    for backend in [
        doc_backend(Arc::new(MemoryCollection::new())) as Arc<dyn ArtifactBackend>,
        drive_backend() as Arc<dyn ArtifactBackend>,
    ] {
        let store = store_over(backend, None);
        store
            .upsert_markdown(ArtifactKind::Transformation, "de", Some("summary"), "first")
            .await
            .unwrap();
        store
            .upsert_markdown(ArtifactKind::Transformation, "de", Some("report"), "second")
            .await
            .unwrap();

        let record = store
            .get_markdown(ArtifactKind::Transformation, "de", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.markdown, "second");
    }
}

#[tokio::test]
async fn resolve_saved_item_id_round_trips_through_codec() {
    init_test_tracing();
    let store = store_over(doc_backend(Arc::new(MemoryCollection::new())), None);
    store
        .upsert_markdown(
            ArtifactKind::Transformation,
            "en",
            Some("weekly-report"),
            "# W1",
        )
        .await
        .unwrap();

    let id = store
        .resolve_saved_item_id(ArtifactKind::Transformation, "en", Some("Weekly-Report"))
        .await
        .unwrap()
        .expect("id resolves case-insensitively");
    let (namespace, key) = id.decode().unwrap();
    assert_eq!(namespace, "notes");
    assert_eq!(key.source_id, "doc1");
    assert_eq!(key.template_name.as_deref(), Some("weekly-report"));
}
