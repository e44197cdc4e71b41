//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl-index-search cycle end-to-end.

use spindex::config::{
    Config, CrawlerConfig, IndexConfig, OutputConfig, RecrawlPolicy, SearchConfig,
    UserAgentConfig,
};
use spindex::crawler::Coordinator;
use spindex::output::format_report;
use spindex::storage::{Field, IndexStore, RunStatus, SharedStore, SqliteStorage};
use spindex::{Normalizer, QueryEngine};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LAST_MODIFIED: &str = "Mon, 01 Jan 2024 00:00:00 GMT";

/// Creates a test configuration crawling from `seed_url`
fn create_test_config(seed_url: &str, db_path: &str, max_pages: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_url: seed_url.to_string(),
            max_pages,
            politeness_delay: 0,
            request_timeout: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        index: IndexConfig {
            database_path: db_path.to_string(),
            stopwords_path: None,
            recrawl_policy: RecrawlPolicy::Accumulate,
        },
        search: SearchConfig::default(),
        output: OutputConfig {
            report_path: "./spider_result.txt".to_string(),
        },
    }
}

fn open_store(dir: &TempDir) -> (SharedStore, String) {
    let db_path = dir.path().join("index.db");
    let storage = SqliteStorage::new(&db_path).expect("Failed to open database");
    (
        Arc::new(Mutex::new(storage)),
        db_path.to_string_lossy().into_owned(),
    )
}

fn html(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .insert_header("Last-Modified", LAST_MODIFIED)
                .set_body_string(html(title, body)),
        )
        .mount(server)
        .await;
}

/// Three pages: the seed links to both others, page1 links to page2 and back
async fn mount_small_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        "Home",
        r#"<p>Welcome to the crawler test site</p>
           <a href="/page1">Page 1</a>
           <a href="/page2">Page 2</a>"#,
    )
    .await;
    mount_page(
        server,
        "/page1",
        "Search Engines",
        r#"<p>the quick brown fox writes a search engine</p>
           <a href="/page2">Page 2</a>
           <a href="/">Home</a>"#,
    )
    .await;
    mount_page(
        server,
        "/page2",
        "Gardening",
        "<p>tomato compost soil</p><script>var search = 1;</script>",
    )
    .await;
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let base = server.uri();

    let dir = TempDir::new().unwrap();
    let (store, db_path) = open_store(&dir);
    let config = create_test_config(&format!("{}/", base), &db_path, 30);

    let mut coordinator = Coordinator::new(
        config,
        store.clone(),
        Arc::new(Normalizer::without_stopwords()),
    )
    .expect("Failed to create coordinator")
    .with_config_hash("integration");

    let summary = coordinator.run().await.expect("Crawl failed");
    assert_eq!(summary.pages_indexed, 3);
    assert_eq!(summary.fetch_failures, 0);
    assert!(!summary.cancelled);

    let storage = store.lock().unwrap();
    assert_eq!(storage.count_indexed_pages().unwrap(), 3);

    let home = storage.get_page_by_url(&format!("{}/", base)).unwrap().unwrap();
    let page1 = storage
        .get_page_by_url(&format!("{}/page1", base))
        .unwrap()
        .unwrap();
    let page2 = storage
        .get_page_by_url(&format!("{}/page2", base))
        .unwrap()
        .unwrap();

    assert_eq!(home.title.as_deref(), Some("Home"));
    assert_eq!(page1.last_modified.as_deref(), Some(LAST_MODIFIED));
    assert!(page1.size.unwrap() > 0);

    // The seed records its children through their parent edges only
    assert_eq!(
        storage.child_urls(home.id).unwrap(),
        vec![page1.url.clone(), page2.url.clone()]
    );
    let mut page2_parents = storage.parent_urls(page2.id).unwrap();
    page2_parents.sort();
    let mut expected = vec![home.url.clone(), page1.url.clone()];
    expected.sort();
    assert_eq!(page2_parents, expected);
    assert!(storage.parent_urls(home.id).unwrap().contains(&page1.url));

    // Script text is not indexed
    assert!(storage.pages_with_term("var", Field::Body).unwrap().is_empty());

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "integration");
}

#[tokio::test]
async fn test_search_after_crawl() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let base = server.uri();

    let dir = TempDir::new().unwrap();
    let (store, db_path) = open_store(&dir);
    let normalizer = Arc::new(Normalizer::new(["the", "a"]));
    let config = create_test_config(&format!("{}/", base), &db_path, 30);
    let search_config = config.search.clone();

    let mut coordinator = Coordinator::new(config, store.clone(), normalizer.clone()).unwrap();
    coordinator.run().await.unwrap();

    let engine = QueryEngine::new(store.clone(), normalizer.clone(), &search_config);
    let page1_id = store
        .lock()
        .unwrap()
        .get_page_by_url(&format!("{}/page1", base))
        .unwrap()
        .unwrap()
        .id;

    let results = engine.search("search engine").unwrap();
    assert_eq!(results.hits[0].page_id, page1_id);

    let phrase = engine.search(r#""quick brown fox""#).unwrap();
    assert_eq!(phrase.hits.len(), 1);
    assert_eq!(phrase.hits[0].page_id, page1_id);

    let similar = engine.find_similar(&format!("{}/page1", base));
    assert_eq!(similar.hits[0].page_id, page1_id);

    let report = format_report(&*store.lock().unwrap(), normalizer.stopwords()).unwrap();
    assert_eq!(report.matches("Page title: ").count(), 3);
    assert!(report.contains("Page title: Search Engines\n"));
}

#[tokio::test]
async fn test_recrawl_of_unchanged_site_leaves_index_unchanged() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Last-Modified", LAST_MODIFIED)
                .set_body_string(html("Home", "alpha beta alpha")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("Last-Modified", LAST_MODIFIED))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (store, db_path) = open_store(&dir);
    let normalizer = Arc::new(Normalizer::without_stopwords());
    let config = create_test_config(&format!("{}/", base), &db_path, 30);

    let mut first = Coordinator::new(config.clone(), store.clone(), normalizer.clone()).unwrap();
    assert_eq!(first.run().await.unwrap().pages_indexed, 1);
    let counts_before = store.lock().unwrap().counts().unwrap();

    let mut second = Coordinator::new(config, store.clone(), normalizer).unwrap();
    let summary = second.run().await.unwrap();
    assert_eq!(summary.pages_indexed, 0);
    assert_eq!(summary.pages_skipped, 1);

    let storage = store.lock().unwrap();
    assert_eq!(storage.counts().unwrap(), counts_before);
    let home = storage.get_page_by_url(&format!("{}/", base)).unwrap().unwrap();
    let posting = storage.posting("alpha", home.id, Field::Body).unwrap();
    assert_eq!(posting.frequency, 2);
    assert_eq!(storage.document_frequency("alpha", Field::Body).unwrap(), 1);
}

#[tokio::test]
async fn test_changed_page_is_refetched() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Last-Modified", LAST_MODIFIED)
                .set_body_string(html("Home", "alpha")),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Last-Modified", "Tue, 02 Jan 2024 00:00:00 GMT"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (store, db_path) = open_store(&dir);
    let normalizer = Arc::new(Normalizer::without_stopwords());
    let config = create_test_config(&format!("{}/", base), &db_path, 30);

    Coordinator::new(config.clone(), store.clone(), normalizer.clone())
        .unwrap()
        .run()
        .await
        .unwrap();
    let summary = Coordinator::new(config, store.clone(), normalizer)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.pages_indexed, 1);

    // Accumulate policy: frequencies add up, DF stays a distinct count
    let storage = store.lock().unwrap();
    let home = storage.get_page_by_url(&format!("{}/", base)).unwrap().unwrap();
    assert_eq!(storage.posting("alpha", home.id, Field::Body).unwrap().frequency, 2);
    assert_eq!(storage.document_frequency("alpha", Field::Body).unwrap(), 1);
    assert_eq!(storage.max_term_frequency(home.id, Field::Body).unwrap(), 2);
}

#[tokio::test]
async fn test_fetch_failure_is_not_fatal() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/missing">Missing</a><a href="/ok">Ok</a>"#,
    )
    .await;
    mount_page(&server, "/ok", "Ok", "fine").await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (store, db_path) = open_store(&dir);
    let config = create_test_config(&format!("{}/", base), &db_path, 30);

    let summary = Coordinator::new(config, store.clone(), Arc::new(Normalizer::without_stopwords()))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.pages_indexed, 2);
    assert_eq!(summary.fetch_failures, 1);

    let storage = store.lock().unwrap();
    let missing = storage
        .get_page_by_url(&format!("{}/missing", base))
        .unwrap();
    assert!(!missing.map(|p| p.is_indexed()).unwrap_or(false));
}

#[tokio::test]
async fn test_page_budget_respected() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>"#,
    )
    .await;
    for route in ["/a", "/b", "/c"] {
        mount_page(&server, route, route, "leaf").await;
    }

    let dir = TempDir::new().unwrap();
    let (store, db_path) = open_store(&dir);
    let config = create_test_config(&format!("{}/", base), &db_path, 2);

    let summary = Coordinator::new(config, store.clone(), Arc::new(Normalizer::without_stopwords()))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.pages_indexed, 2);
    assert_eq!(store.lock().unwrap().count_indexed_pages().unwrap(), 2);

    // Breadth-first: the seed, then its first link
    let storage = store.lock().unwrap();
    assert!(storage
        .get_page_by_url(&format!("{}/a", base))
        .unwrap()
        .unwrap()
        .is_indexed());
}

#[tokio::test]
async fn test_recrawl_without_head_support_leaves_index_unchanged() {
    let server = MockServer::start().await;
    let base = server.uri();

    // No HEAD mock: the server answers HEAD with 404
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Last-Modified", LAST_MODIFIED)
                .set_body_string(html("Home", "alpha beta alpha")),
        )
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (store, db_path) = open_store(&dir);
    let normalizer = Arc::new(Normalizer::without_stopwords());
    let config = create_test_config(&format!("{}/", base), &db_path, 30);

    Coordinator::new(config.clone(), store.clone(), normalizer.clone())
        .unwrap()
        .run()
        .await
        .unwrap();
    let counts_before = store.lock().unwrap().counts().unwrap();

    let summary = Coordinator::new(config, store.clone(), normalizer)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.pages_indexed, 0);
    assert_eq!(summary.pages_skipped, 1);

    let storage = store.lock().unwrap();
    assert_eq!(storage.counts().unwrap(), counts_before);
    let home = storage.get_page_by_url(&format!("{}/", base)).unwrap().unwrap();
    assert_eq!(storage.posting("alpha", home.id, Field::Body).unwrap().frequency, 2);
    assert_eq!(storage.max_term_frequency(home.id, Field::Body).unwrap(), 2);
}

#[tokio::test]
async fn test_changed_page_without_head_support_is_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Last-Modified", LAST_MODIFIED)
                .set_body_string(html("Home", "alpha")),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Last-Modified", "Tue, 02 Jan 2024 00:00:00 GMT")
                .set_body_string(html("Home", "alpha")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (store, db_path) = open_store(&dir);
    let normalizer = Arc::new(Normalizer::without_stopwords());
    let config = create_test_config(&format!("{}/", base), &db_path, 30);

    Coordinator::new(config.clone(), store.clone(), normalizer.clone())
        .unwrap()
        .run()
        .await
        .unwrap();
    let summary = Coordinator::new(config, store.clone(), normalizer)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.pages_indexed, 1);

    // The freshness GET is reused for indexing
    let storage = store.lock().unwrap();
    let home = storage.get_page_by_url(&format!("{}/", base)).unwrap().unwrap();
    assert_eq!(
        home.last_modified.as_deref(),
        Some("Tue, 02 Jan 2024 00:00:00 GMT")
    );
    assert_eq!(storage.posting("alpha", home.id, Field::Body).unwrap().frequency, 2);
}
