#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end ingestion and question answering against mock HTTP services

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use docs_qa::completion::AnswerClient;
use docs_qa::config::Config;
use docs_qa::database::{CredentialStore, Database};
use docs_qa::documents::{DocumentOutcome, UnavailableExtractor, source_for};
use docs_qa::embeddings::EmbeddingClient;
use docs_qa::indexer::{IndexOrigin, Indexer};
use docs_qa::progress::NoopProgress;
use docs_qa::session::{Answer, QaSession};
use std::sync::Arc;

const API_KEY: &str = "sk-integration";
const TERMS: [&str; 3] = ["attention", "diffusion", "recipe"];

/// Embeds text as counts of a few terms
struct TermCounts;

impl Respond for TermCounts {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).expect("JSON body");
        let data: Vec<Value> = body["input"]
            .as_array()
            .expect("input array")
            .iter()
            .map(|text| {
                let text = text.as_str().unwrap_or_default().to_lowercase();
                let embedding: Vec<f32> = TERMS
                    .iter()
                    .map(|term| text.matches(term).count() as f32)
                    .collect();
                json!({ "embedding": embedding })
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
    }
}

async fn mount_services(server: &MockServer, listing_status: u16) {
    let listing = r#"<html><body><ul>
        <li><a href="Test.txt">Test.txt</a></li>
        <li><a href="notes.md">notes.md</a></li>
        <li><a href="photo.png">photo.png</a></li>
    </ul></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/documents/"))
        .respond_with(ResponseTemplate::new(listing_status).set_body_string(listing))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents/Test.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "Cross attention mixes two sequences.\n\nAttention weights come from queries and keys.",
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents/notes.md"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("# Notes\n\nLatent diffusion runs in a compressed space."),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(TermCounts)
        .mount(server)
        .await;
}

async fn setup(server: &MockServer) -> anyhow::Result<(TempDir, Config, Database)> {
    let temp_dir = TempDir::new()?;
    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.service.base_url = format!("{}/v1/", server.uri());
    config.service.timeout_seconds = 5;
    config.documents.location = format!("{}/documents/", server.uri());
    config.save()?;

    let database = Database::initialize_from_config_dir(temp_dir.path()).await?;
    CredentialStore::new(database.clone()).save(API_KEY).await?;

    Ok((temp_dir, config, database))
}

fn indexer_for(config: &Config, database: &Database) -> anyhow::Result<Indexer> {
    Ok(Indexer::new(
        config,
        database.clone(),
        EmbeddingClient::new(config, API_KEY)?,
        source_for(config)?,
        Arc::new(UnavailableExtractor),
    ))
}

#[tokio::test]
async fn ingest_then_answer_from_documents() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_services(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "It mixes two sequences." } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_temp_dir, config, database) = setup(&server).await?;
    let cancel = CancellationToken::new();

    let indexer = indexer_for(&config, &database)?;
    let session = QaSession::open(
        &config,
        &indexer,
        AnswerClient::new(&config, API_KEY)?,
        &NoopProgress,
        &cancel,
    )
    .await?;

    let report = session.report().expect("session built the index");
    assert_eq!(report.origin, IndexOrigin::Built);
    let outcomes: Vec<&str> = report
        .documents
        .iter()
        .filter(|(_, outcome)| outcome.is_loaded())
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(outcomes, vec!["Test.txt", "notes.md"]);
    assert_eq!(session.index().sources(), vec!["Test.txt", "notes.md"]);
    assert_eq!(session.index().len(), report.chunk_count);

    let answer = session.ask("What does cross attention do?", &cancel).await?;
    assert_eq!(answer.text(), "It mixes two sequences.");

    let answer = session.ask("Share a recipe", &cancel).await?;
    assert_eq!(answer, Answer::NoRelevantContent);

    // A second session is served from the cache
    let reopened = QaSession::open(
        &config,
        &indexer_for(&config, &database)?,
        AnswerClient::new(&config, API_KEY)?,
        &NoopProgress,
        &cancel,
    )
    .await?;
    assert_eq!(reopened.report().map(|r| r.origin), Some(IndexOrigin::Cache));
    assert_eq!(reopened.index(), session.index());

    Ok(())
}

#[tokio::test]
async fn failed_listing_falls_back_to_known_files() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_services(&server, 500).await;

    let (_temp_dir, config, database) = setup(&server).await?;
    let indexer = indexer_for(&config, &database)?;

    let (index, report) = indexer
        .build(&NoopProgress, &CancellationToken::new())
        .await?;

    let names: Vec<&str> = report.documents.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Test.txt", "sample.pdf", "Cross Attention Model.pdf", "2112.10752v2.pdf"]
    );
    assert!(report.documents[0].1.is_loaded());
    assert!(
        report.documents[1..]
            .iter()
            .all(|(_, outcome)| matches!(outcome, DocumentOutcome::Failed { .. }))
    );
    assert_eq!(index.sources(), vec!["Test.txt"]);

    Ok(())
}

#[tokio::test]
async fn cleared_cache_forces_rebuild() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_services(&server, 200).await;

    let (_temp_dir, config, database) = setup(&server).await?;
    let indexer = indexer_for(&config, &database)?;
    let cancel = CancellationToken::new();

    indexer.load_or_build(false, &NoopProgress, &cancel).await?;
    assert!(indexer.store().clear().await?);

    let (_, report) = indexer.load_or_build(false, &NoopProgress, &cancel).await?;
    assert_eq!(report.origin, IndexOrigin::Built);

    let reloaded = Config::load(config.get_base_dir())?;
    assert_eq!(reloaded.documents.location, config.documents.location);

    Ok(())
}
