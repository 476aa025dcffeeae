//! End-to-end enrichment through a mock GiantBomb API and a filesystem vault.

mod common;

use std::sync::Arc;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use loreforge::catalog::providers::GiantBombProvider;
use loreforge::catalog::ProviderRegistry;
use loreforge::covers::CoverFetcher;
use loreforge::enrich::{EnrichOptions, EnrichRequest, EnrichmentService};
use loreforge::vault::{Document, FsVault, VaultStore};
use loreforge_common::{Error, FieldValue, NotFoundReason};

fn search_json(server_uri: &str) -> serde_json::Value {
    serde_json::json!({
        "error": "OK",
        "results": [{
            "guid": "3030-52647",
            "name": "Celeste",
            "deck": "A platformer about climbing a mountain.",
            "original_release_date": "2018-01-25",
            "image": {"medium_url": format!("{server_uri}/covers/celeste.jpg")}
        }]
    })
}

fn detail_json(server_uri: &str) -> serde_json::Value {
    serde_json::json!({
        "error": "OK",
        "results": {
            "guid": "3030-52647",
            "name": "Celeste",
            "deck": "A platformer about climbing a mountain.",
            "original_release_date": "2018-01-25",
            "platforms": [{"name": "PC"}, {"name": "Nintendo Switch"}],
            "genres": [{"name": "Platformer"}],
            "image": {"medium_url": format!("{server_uri}/covers/celeste.jpg")}
        }
    })
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("api_key", "gb-key"))
        .and(query_param("query", "Celeste"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_json(&server.uri())))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/game/3030-52647/"))
        .and(query_param("api_key", "gb-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_json(&server.uri())))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/covers/celeste.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(common::jpeg_bytes(), "image/jpeg"),
        )
        .mount(server)
        .await;
}

struct Harness {
    service: EnrichmentService,
    vault: Arc<FsVault>,
    vault_dir: tempfile::TempDir,
    assets_dir: tempfile::TempDir,
}

fn harness(providers: Vec<GiantBombProvider>) -> Harness {
    let vault_dir = tempfile::tempdir().unwrap();
    let assets_dir = tempfile::tempdir().unwrap();
    let vault = Arc::new(FsVault::new(vault_dir.path()));

    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(Arc::new(provider));
    }
    let service = EnrichmentService::new(
        registry,
        CoverFetcher::new(assets_dir.path()),
        vault.clone(),
        EnrichOptions {
            notes_dir: "Gaming/Games".to_string(),
            cover_link_prefix: "Attachments/game_covers".to_string(),
        },
    );
    Harness {
        service,
        vault,
        vault_dir,
        assets_dir,
    }
}

#[tokio::test]
async fn enriches_new_title_end_to_end() {
    common::init_tracing();
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let provider = GiantBombProvider::new("gb-key".into()).with_base_url(server.uri());
    let h = harness(vec![provider]);

    let outcome = h
        .service
        .enrich(&EnrichRequest::by_title("Celeste"))
        .await
        .unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.path, "Gaming/Games/celeste.md");
    assert_eq!(outcome.slug.as_str(), "celeste");

    // The cover landed in the asset cache under the slug.
    let cover = outcome.cover.expect("cover cached");
    assert_eq!(cover.local_path, h.assets_dir.path().join("celeste.jpg"));
    assert!(cover.local_path.is_file());

    // The document is on disk with merged frontmatter and a rendered body.
    let text = std::fs::read_to_string(
        h.vault_dir.path().join("Gaming/Games/celeste.md"),
    )
    .unwrap();
    assert!(text.starts_with("---\n"));
    assert!(text.contains("game_title: Celeste"));
    assert!(text.contains("image_url: Attachments/game_covers/celeste.jpg"));
    assert!(text.contains("## Description"));

    let doc = h
        .vault
        .read("Gaming/Games/celeste.md")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        doc.frontmatter.get("platform"),
        Some(&FieldValue::List(vec![
            "PC".into(),
            "Nintendo Switch".into()
        ]))
    );
    assert_eq!(doc.frontmatter.get("enriched"), Some(&FieldValue::Bool(true)));
}

#[tokio::test]
async fn re_enrichment_keeps_user_edits() {
    common::init_tracing();
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let provider = GiantBombProvider::new("gb-key".into()).with_base_url(server.uri());
    let h = harness(vec![provider]);

    // Seed a document the user has already worked on.
    let mut existing = Document::default();
    existing
        .frontmatter
        .insert("play_status".into(), "Completed".into());
    existing
        .frontmatter
        .insert("star_rating".into(), FieldValue::Integer(5));
    existing.body = "# Celeste\n\nB-side notes.\n".to_string();
    h.vault
        .write("Gaming/Games/celeste.md", &existing)
        .await
        .unwrap();

    let outcome = h
        .service
        .enrich(&EnrichRequest::by_title("Celeste"))
        .await
        .unwrap();
    assert!(!outcome.created);

    let doc = h
        .vault
        .read("Gaming/Games/celeste.md")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        doc.frontmatter.get("play_status"),
        Some(&FieldValue::Text("Completed".into()))
    );
    assert_eq!(
        doc.frontmatter.get("star_rating"),
        Some(&FieldValue::Integer(5))
    );
    // Catalog facts were still refreshed onto the old document.
    assert_eq!(
        doc.frontmatter.get("release_date"),
        Some(&FieldValue::Text("2018-01-25".into()))
    );
    assert_eq!(doc.body, "# Celeste\n\nB-side notes.\n");
}

#[tokio::test]
async fn crlf_document_keeps_user_state_on_re_enrichment() {
    common::init_tracing();
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let provider = GiantBombProvider::new("gb-key".into()).with_base_url(server.uri());
    let h = harness(vec![provider]);

    // A Windows-edited note: CRLF line endings throughout.
    let notes_dir = h.vault_dir.path().join("Gaming/Games");
    std::fs::create_dir_all(&notes_dir).unwrap();
    std::fs::write(
        notes_dir.join("celeste.md"),
        "---\r\nplay_status: Completed\r\nstar_rating: 5\r\n---\r\n\r\n# Celeste\r\n",
    )
    .unwrap();

    let outcome = h
        .service
        .enrich(&EnrichRequest::by_title("Celeste"))
        .await
        .unwrap();
    assert!(!outcome.created);

    let doc = h
        .vault
        .read("Gaming/Games/celeste.md")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        doc.frontmatter.get("play_status"),
        Some(&FieldValue::Text("Completed".into()))
    );
    assert_eq!(
        doc.frontmatter.get("star_rating"),
        Some(&FieldValue::Integer(5))
    );
}

#[tokio::test]
async fn broken_primary_falls_back_to_working_catalog() {
    common::init_tracing();
    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;

    let working = MockServer::start().await;
    mount_catalog(&working).await;

    let primary = GiantBombProvider::new("gb-key".into()).with_base_url(broken.uri());
    let fallback = GiantBombProvider::new("gb-key".into()).with_base_url(working.uri());
    let h = harness(vec![primary, fallback]);

    let outcome = h
        .service
        .enrich(&EnrichRequest::by_title("Celeste"))
        .await
        .unwrap();
    assert_eq!(outcome.title, "Celeste");
}

#[tokio::test]
async fn unreachable_catalogs_surface_as_not_found() {
    common::init_tracing();
    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;

    let provider = GiantBombProvider::new("gb-key".into()).with_base_url(broken.uri());
    let h = harness(vec![provider]);

    let err = h
        .service
        .enrich(&EnrichRequest::by_title("Celeste"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::NotFound {
            reason: NotFoundReason::ProvidersUnavailable,
            ..
        }
    ));
    // Nothing was written.
    assert!(!h.vault_dir.path().join("Gaming/Games").exists());
}

#[tokio::test]
async fn missing_cover_endpoint_degrades_gracefully() {
    common::init_tracing();
    let server = MockServer::start().await;
    // Catalog works, but the image URL 404s.
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_json(&server.uri())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/game/3030-52647/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_json(&server.uri())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/covers/celeste.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let provider = GiantBombProvider::new("gb-key".into()).with_base_url(server.uri());
    let h = harness(vec![provider]);

    let outcome = h
        .service
        .enrich(&EnrichRequest::by_title("Celeste"))
        .await
        .unwrap();

    assert!(outcome.cover.is_none());
    let doc = h
        .vault
        .read("Gaming/Games/celeste.md")
        .await
        .unwrap()
        .unwrap();
    assert!(!doc.frontmatter.contains_key("image_url"));
}
