//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, including resume and reset.

use kennel_crawl::config::UserAgentConfig;
use kennel_crawl::crawler::FetchResponse;
use kennel_crawl::extract::ExtractError;
use kennel_crawl::sites::FciExtractor;
use kennel_crawl::{
    CrawlError, CrawlState, Crawler, CrawlerSettings, Extractor, ItemStub, JsonDirSink, Record,
    Sink, StateStore,
};
use serde_json::{json, Value};
use std::collections::{BTreeSet, VecDeque};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test extractor reading pages written as JSON:
/// `{"links": [...], "items": [{"refid": .., "url": ..}], "name": ..}`
struct JsonExtractor;

impl Extractor for JsonExtractor {
    type Page = Value;

    fn decode(&self, response: &FetchResponse) -> Result<Value, ExtractError> {
        serde_json::from_slice(&response.body).map_err(|e| ExtractError::Malformed(e.to_string()))
    }

    fn discover_links(&self, page: &Value) -> Result<Vec<String>, ExtractError> {
        Ok(page["links"]
            .as_array()
            .map(|links| {
                links
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn discover_items(&self, page: &Value) -> Result<Vec<ItemStub>, ExtractError> {
        Ok(page["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        Some(ItemStub::new(item["refid"].as_str()?, item["url"].as_str()?))
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn complete_item(&self, stub: ItemStub, detail: &Value) -> Result<Record, ExtractError> {
        let mut record = stub.into_record();
        record.set("name", detail["name"].as_str().map(String::from));
        Ok(record)
    }
}

/// Creates crawler settings pointing at a temporary output directory
fn create_test_settings(output_dir: &Path, root_url: String) -> CrawlerSettings {
    CrawlerSettings {
        name: "test".to_string(),
        output_dir: output_dir.to_path_buf(),
        root_url,
        delay: Duration::from_millis(1),
        user_agent: None,
        timeout: Some(Duration::from_secs(5)),
    }
}

fn create_crawler(output_dir: &Path, root_url: String) -> Crawler<JsonExtractor, JsonDirSink> {
    Crawler::new(
        create_test_settings(output_dir, root_url),
        JsonExtractor,
        JsonDirSink::new(output_dir),
    )
    .expect("Failed to create crawler")
}

/// Mounts a JSON page that must be requested exactly `times` times
async fn mount_page(server: &MockServer, page_path: &str, body: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Paths of all requests the server received, in order
async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_breadth_first_order() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        json!({"links": [format!("{}/l1", base_url), format!("{}/l2", base_url)]}),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/l1",
        json!({"links": [format!("{}/l3", base_url)]}),
        1,
    )
    .await;
    mount_page(&mock_server, "/l2", json!({}), 1).await;
    mount_page(&mock_server, "/l3", json!({}), 1).await;

    let dir = TempDir::new().unwrap();
    let mut crawler = create_crawler(dir.path(), format!("{}/", base_url));
    let stats = crawler.run().await.expect("Crawl failed");

    // FIFO: the second level is exhausted before /l3 is fetched
    assert_eq!(requested_paths(&mock_server).await, vec!["/", "/l1", "/l2", "/l3"]);
    assert_eq!(stats.pages_visited, 4);
    assert_eq!(stats.links_discovered, 3);
    assert!(crawler.state().is_exhausted());
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let root = format!("{}/", base_url);
    let a = format!("{}/a", base_url);
    let b = format!("{}/b", base_url);

    mount_page(&mock_server, "/", json!({"links": [a, b]}), 1).await;
    mount_page(
        &mock_server,
        "/a",
        json!({"links": [b, root, format!("{}#section", b)]}),
        1,
    )
    .await;
    mount_page(&mock_server, "/b", json!({"links": [a, format!("{}#top", a)]}), 1).await;

    let dir = TempDir::new().unwrap();
    let mut crawler = create_crawler(dir.path(), root.clone());
    let stats = crawler.run().await.expect("Crawl failed");

    assert_eq!(stats.fetches, 3);
    assert_eq!(stats.pages_visited, 3);
    assert_eq!(stats.duplicates_skipped, 5);

    let expected: BTreeSet<String> = [root, a, b].into_iter().collect();
    assert_eq!(crawler.state().visited, expected);
}

#[tokio::test]
async fn test_idempotent_resume_after_completion() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        json!({"links": [format!("{}/a", base_url)]}),
        1,
    )
    .await;
    mount_page(&mock_server, "/a", json!({}), 1).await;

    let dir = TempDir::new().unwrap();
    let root = format!("{}/", base_url);

    let mut first = create_crawler(dir.path(), root.clone());
    first.run().await.expect("First crawl failed");
    assert_eq!(requested_paths(&mock_server).await.len(), 2);

    let mut second = create_crawler(dir.path(), root);
    let stats = second.run().await.expect("Second crawl failed");

    assert_eq!(stats.fetches, 0);
    assert_eq!(stats.pages_visited, 0);
    assert_eq!(requested_paths(&mock_server).await.len(), 2);
}

#[tokio::test]
async fn test_resume_from_checkpoint() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let root = format!("{}/", base_url);

    mount_page(&mock_server, "/", json!({}), 0).await;
    mount_page(&mock_server, "/a", json!({}), 0).await;
    mount_page(&mock_server, "/b", json!({}), 1).await;
    mount_page(&mock_server, "/c", json!({}), 1).await;

    // Simulates a process killed after visiting the root and /a
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path(), "test");
    store
        .save(&CrawlState {
            root_url: root.clone(),
            fringe: VecDeque::from([
                format!("{}/a", base_url),
                format!("{}/b", base_url),
                format!("{}/c", base_url),
            ]),
            visited: BTreeSet::from([root.clone(), format!("{}/a", base_url)]),
        })
        .unwrap();

    let mut crawler = create_crawler(dir.path(), root);
    let stats = crawler.run().await.expect("Crawl failed");

    assert_eq!(requested_paths(&mock_server).await, vec!["/b", "/c"]);
    assert_eq!(stats.duplicates_skipped, 1);

    let saved = store.restore().unwrap().unwrap();
    assert!(saved.fringe.is_empty());
    assert_eq!(saved.visited.len(), 4);
}

#[tokio::test]
async fn test_non_200_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let missing = format!("{}/missing", base_url);

    mount_page(
        &mock_server,
        "/",
        json!({"links": [missing, format!("{}/ok", base_url)]}),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"links": [format!("{}/never", base_url)]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/ok", json!({}), 1).await;
    mount_page(&mock_server, "/never", json!({}), 0).await;

    let dir = TempDir::new().unwrap();
    let mut crawler = create_crawler(dir.path(), format!("{}/", base_url));
    let stats = crawler.run().await.expect("A 404 must not abort the crawl");

    assert_eq!(stats.pages_failed, 1);
    assert_eq!(stats.pages_visited, 3);
    assert!(crawler.state().is_visited(&missing));

    let saved = crawler.store().restore().unwrap().unwrap();
    assert!(saved.visited.contains(&missing));
}

#[tokio::test]
async fn test_item_fetched_once_across_listings() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let detail = format!("{}/breed/42", base_url);
    let item = json!({"refid": "42", "url": detail});

    mount_page(
        &mock_server,
        "/",
        json!({"links": [format!("{}/p1", base_url), format!("{}/p2", base_url)]}),
        1,
    )
    .await;
    mount_page(&mock_server, "/p1", json!({"items": [item]}), 1).await;
    mount_page(&mock_server, "/p2", json!({"items": [item, item]}), 1).await;
    mount_page(&mock_server, "/breed/42", json!({"name": "Briard"}), 1).await;

    let dir = TempDir::new().unwrap();
    let mut crawler = create_crawler(dir.path(), format!("{}/", base_url));
    let stats = crawler.run().await.expect("Crawl failed");

    assert_eq!(stats.items_discovered, 3);
    assert_eq!(stats.items_existing, 2);
    assert_eq!(stats.records_stored, 1);

    let record = crawler.sink().load("42").unwrap().expect("Record not stored");
    assert_eq!(record.url, detail);
    assert_eq!(record.get_str("name"), Some("Briard"));
}

#[tokio::test]
async fn test_existing_records_are_not_refetched() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        json!({"items": [
            {"refid": "1", "url": format!("{}/breed/1", base_url)},
            {"refid": "2", "url": format!("{}/breed/2", base_url)},
        ]}),
        1,
    )
    .await;
    mount_page(&mock_server, "/breed/1", json!({"name": "Old"}), 0).await;
    mount_page(&mock_server, "/breed/2", json!({"name": "New"}), 1).await;

    let dir = TempDir::new().unwrap();
    let mut sink = JsonDirSink::new(dir.path());
    sink.store(&ItemStub::new("1", format!("{}/breed/1", base_url)).into_record())
        .unwrap();

    let mut crawler = create_crawler(dir.path(), format!("{}/", base_url));
    let stats = crawler.run().await.expect("Crawl failed");

    assert_eq!(stats.items_existing, 1);
    assert_eq!(stats.records_stored, 1);
    assert_eq!(crawler.sink().count().unwrap(), 2);
}

#[tokio::test]
async fn test_detail_non_200_skips_item() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        json!({"items": [
            {"refid": "1", "url": format!("{}/breed/1", base_url)},
            {"refid": "2", "url": format!("{}/breed/2", base_url)},
        ]}),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/breed/1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/breed/2", json!({"name": "Two"}), 1).await;

    let dir = TempDir::new().unwrap();
    let mut crawler = create_crawler(dir.path(), format!("{}/", base_url));
    let stats = crawler.run().await.expect("Crawl failed");

    assert_eq!(stats.items_failed, 1);
    assert_eq!(stats.records_stored, 1);
    assert_eq!(crawler.sink().load("1").unwrap(), None);
    assert!(crawler.sink().load("2").unwrap().is_some());
}

#[tokio::test]
async fn test_reset_clears_everything() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let root = format!("{}/", base_url);

    mount_page(
        &mock_server,
        "/",
        json!({"items": [{"refid": "7", "url": format!("{}/breed/7", base_url)}]}),
        1,
    )
    .await;
    mount_page(&mock_server, "/breed/7", json!({"name": "Pointer"}), 1).await;

    let dir = TempDir::new().unwrap();
    let mut crawler = create_crawler(dir.path(), root.clone());
    crawler.run().await.expect("Crawl failed");
    assert!(crawler.store().exists());
    assert_eq!(crawler.sink().count().unwrap(), 1);

    crawler.reset().expect("Reset failed");

    assert_eq!(crawler.store().restore().unwrap(), None);
    assert_eq!(crawler.state().fringe, VecDeque::from([root]));
    assert!(crawler.state().visited.is_empty());
    assert_eq!(crawler.sink().count().unwrap(), 0);
}

#[tokio::test]
async fn test_transport_failure_aborts_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let root = format!("{}/", base_url);
    // Nothing listens on port 1
    let unreachable = "http://127.0.0.1:1/unreachable".to_string();

    mount_page(
        &mock_server,
        "/",
        json!({"links": [unreachable, format!("{}/after", base_url)]}),
        1,
    )
    .await;
    mount_page(&mock_server, "/after", json!({}), 0).await;

    let dir = TempDir::new().unwrap();
    let mut crawler = create_crawler(dir.path(), root.clone());
    let result = crawler.run().await;

    assert!(matches!(result, Err(CrawlError::Http { ref url, .. }) if *url == unreachable));

    // The checkpoint still holds the failed URL, ready for a rerun
    let saved = crawler.store().restore().unwrap().unwrap();
    assert!(saved.visited.contains(&root));
    assert_eq!(saved.fringe.front(), Some(&unreachable));
}

#[tokio::test]
async fn test_extraction_failure_aborts_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let root = format!("{}/", base_url);

    mount_page(
        &mock_server,
        "/",
        json!({"links": [format!("{}/broken", base_url)]}),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut crawler = create_crawler(dir.path(), root.clone());
    let result = crawler.run().await;

    assert!(matches!(result, Err(CrawlError::Extract { .. })));

    let saved = crawler.store().restore().unwrap().unwrap();
    assert_eq!(saved.visited, BTreeSet::from([root]));
    assert_eq!(saved.fringe.len(), 1);
}

#[tokio::test]
async fn test_rerun_after_failure_retries_failed_url() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let root = format!("{}/", base_url);
    let flaky = format!("{}/flaky", base_url);
    let after = format!("{}/after", base_url);

    mount_page(&mock_server, "/", json!({"links": [flaky, after]}), 1).await;
    // First answer is unreadable, the retry gets a proper page
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/flaky", json!({"links": [after]}), 1).await;
    mount_page(&mock_server, "/after", json!({}), 1).await;

    let dir = TempDir::new().unwrap();
    let mut crawler = create_crawler(dir.path(), root.clone());

    let result = crawler.run().await;
    assert!(matches!(result, Err(CrawlError::Extract { ref url, .. }) if *url == flaky));

    // In-memory state matches the checkpoint, failed URL still first
    assert_eq!(crawler.state().peek_next(), Some(flaky.as_str()));
    assert_eq!(
        crawler.state(),
        &crawler.store().restore().unwrap().unwrap()
    );

    let stats = crawler.run().await.expect("Retry failed");

    assert_eq!(stats.fetches, 2);
    assert_eq!(stats.pages_visited, 2);
    assert_eq!(stats.duplicates_skipped, 1);
    assert_eq!(
        requested_paths(&mock_server).await,
        vec!["/", "/flaky", "/flaky", "/after"]
    );

    let saved = crawler.store().restore().unwrap().unwrap();
    assert!(saved.fringe.is_empty());
    assert_eq!(saved.visited, BTreeSet::from([root, flaky, after]));
}

#[tokio::test]
async fn test_checkpoint_failure_aborts_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let root = format!("{}/", base_url);

    mount_page(
        &mock_server,
        "/",
        json!({"links": [format!("{}/next", base_url)]}),
        1,
    )
    .await;
    mount_page(&mock_server, "/next", json!({}), 0).await;

    // A directory where the temporary checkpoint file must go makes every save fail
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("test-crawler-state.json.tmp")).unwrap();

    let mut crawler = create_crawler(dir.path(), root.clone());
    let result = crawler.run().await;

    assert!(matches!(result, Err(CrawlError::State(_))));
    assert_eq!(requested_paths(&mock_server).await, vec!["/"]);
    assert!(!crawler.store().exists());

    // Nothing was committed in memory either
    assert_eq!(crawler.state(), &CrawlState::new(root));
}

#[tokio::test]
async fn test_reset_switches_to_configured_root() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let old_root = format!("{}/old/", base_url);
    let new_root = format!("{}/new/", base_url);

    mount_page(&mock_server, "/old/", json!({}), 0).await;
    mount_page(&mock_server, "/new/", json!({}), 1).await;

    let dir = TempDir::new().unwrap();
    StateStore::new(dir.path(), "test")
        .save(&CrawlState::new(old_root.clone()))
        .unwrap();

    let mut crawler = create_crawler(dir.path(), new_root.clone());

    // The checkpoint is kept until an explicit reset
    assert_eq!(crawler.state().root_url, old_root);

    crawler.reset().expect("Reset failed");

    assert_eq!(crawler.state().root_url, new_root);
    assert_eq!(crawler.state().fringe, VecDeque::from([new_root.clone()]));

    crawler.run().await.expect("Crawl failed");

    assert_eq!(requested_paths(&mock_server).await, vec!["/new/"]);
    let saved = crawler.store().restore().unwrap().unwrap();
    assert_eq!(saved.root_url, new_root);
    assert_eq!(saved.visited, BTreeSet::from([new_root]));
}

#[tokio::test]
async fn test_user_agent_header_sent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut settings = create_test_settings(dir.path(), format!("{}/", base_url));
    settings.user_agent = Some(UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    });

    let mut crawler = Crawler::new(settings, JsonExtractor, JsonDirSink::new(dir.path()))
        .expect("Failed to create crawler");
    let stats = crawler.run().await.expect("Crawl failed");

    // A header mismatch would fall through to wiremock's default 404
    assert_eq!(stats.pages_failed, 0);
}

#[tokio::test]
async fn test_fci_site_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/en/nomenclature/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
            <div class="group"><a href="/en/nomenclature/1.html">Group 1</a></div>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/en/nomenclature/1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
            <div class="group"><a href="/en/nomenclature/1.html">Group 1</a></div>
            <table><tr><td class="race">
              <a class="nom" href="BRIARD-113.html">BRIARD (113)</a>
            </td></tr></table>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/en/nomenclature/BRIARD-113.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
            <span id="ContentPlaceHolder1_NomEnLabel">BRIARD</span>
            <span id="ContentPlaceHolder1_SectionLabel">Sheepdogs</span>
            <span id="ContentPlaceHolder1_PaysOrigineLabel">FRANCE</span>
            <a id="ContentPlaceHolder1_StandardENHyperLink" href="/standards/113.pdf">EN</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut crawler = Crawler::new(
        create_test_settings(dir.path(), format!("{}/en/nomenclature/", base_url)),
        FciExtractor::new().unwrap(),
        JsonDirSink::new(dir.path()),
    )
    .expect("Failed to create crawler");
    let stats = crawler.run().await.expect("Crawl failed");

    assert_eq!(stats.pages_visited, 2);
    assert_eq!(stats.records_stored, 1);

    let record = crawler.sink().load("113").unwrap().expect("Record not stored");
    assert_eq!(
        record.url,
        format!("{}/en/nomenclature/BRIARD-113.html", base_url)
    );
    assert_eq!(record.get_str("name"), Some("BRIARD"));
    assert_eq!(record.get_str("country"), Some("FRANCE"));
    assert_eq!(
        record.get_str("pdf"),
        Some(format!("{}/standards/113.pdf", base_url).as_str())
    );

    assert!(dir.path().join("test-crawler-state.json").is_file());
    assert!(dir.path().join("dump/113/entry.json").is_file());
}
