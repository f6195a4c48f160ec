//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and drive full
//! harvests through the plain HTTP engine.

use site_harvest::config::{BrowserEngine, BrowserSettings, ChunkerSettings, CrawlerSettings};
use site_harvest::crawler::{Coordinator, Progress, RunOutput};
use site_harvest::{Chunker, CrawlTarget, StatusKind};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates fast crawl settings for local servers
fn test_settings() -> CrawlerSettings {
    CrawlerSettings {
        settle_delay_ms: 0,
        retry_delay_ms: 0,
        page_timeout_secs: 5,
        ..CrawlerSettings::default()
    }
}

fn http_browser() -> BrowserSettings {
    BrowserSettings {
        engine: BrowserEngine::Http,
        ..BrowserSettings::default()
    }
}

/// Builds an HTML page with `words` words of body text and the given links
fn page(words: usize, links: &[String]) -> String {
    let text: Vec<String> = (0..words).map(|i| format!("word{}", i)).collect();
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!(
        "<html><head><title>Test</title><script>var x = 1;</script></head>\
         <body><nav>Menu</nav><p>{}</p>{}<footer>Footer</footer></body></html>",
        text.join(" "),
        anchors
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn harvest(settings: CrawlerSettings, targets: &[CrawlTarget]) -> RunOutput {
    Coordinator::new(settings, http_browser())
        .crawl_all(targets, None)
        .await
        .expect("HTTP engine always launches")
}

async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}

#[tokio::test]
async fn test_root_with_three_links() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        page(
            60,
            &[
                "/about".to_string(),
                "/pricing/".to_string(),
                "/team?ref=home".to_string(),
            ],
        ),
    )
    .await;
    for route in ["/about", "/pricing", "/team"] {
        mount_page(&server, route, page(60, &["/".to_string()])).await;
    }

    let targets = vec![CrawlTarget::new("Acme", server.uri())];
    let output = harvest(test_settings(), &targets).await;

    assert_eq!(output.documents.len(), 4);
    assert!(output.failures.is_empty());
    assert_eq!(output.stats.pages_scraped, 4);
    assert_eq!(output.stats.total_pages_visited, 4);
    assert_eq!(requests_to(&server, "/").await, 1);

    let root = output
        .documents
        .iter()
        .find(|d| d.metadata.source_url == server.uri())
        .expect("root page is a document");
    assert_eq!(root.metadata.company_name, "Acme");
    assert_eq!(root.metadata.domain, "127.0.0.1");
    assert_eq!(root.metadata.word_count, 63);
    assert!(!root.text.contains("Menu"));
    assert!(!root.text.contains("var x"));
}

#[tokio::test]
async fn test_out_of_domain_links_not_followed() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        page(
            60,
            &[
                "https://other.example/page".to_string(),
                "/brochure.pdf".to_string(),
                "mailto:sales@acme.test".to_string(),
            ],
        ),
    )
    .await;

    let targets = vec![CrawlTarget::new("Acme", server.uri())];
    let output = harvest(test_settings(), &targets).await;

    assert_eq!(output.documents.len(), 1);
    assert_eq!(output.stats.total_pages_visited, 1);
    assert_eq!(requests_to(&server, "/brochure.pdf").await, 0);
}

#[tokio::test]
async fn test_blocked_site_is_not_retried() {
    let server = MockServer::start().await;

    let mut body = page(60, &["/more".to_string()]);
    body = body.replace("<p>", "<p>Access denied. Please complete the CAPTCHA. ");
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let targets = vec![CrawlTarget::new("Fortress", server.uri())];
    let output = harvest(test_settings(), &targets).await;

    assert!(output.documents.is_empty());
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].status, StatusKind::Blocked);
    assert_eq!(output.failures[0].company_name, "Fortress");
    assert_eq!(output.stats.status_count(StatusKind::Blocked), 1);
    assert_eq!(requests_to(&server, "/more").await, 0);
}

#[tokio::test]
async fn test_two_targets_in_one_batch() {
    let acme = MockServer::start().await;
    let globex = MockServer::start().await;

    mount_page(&acme, "/", page(60, &["/products".to_string()])).await;
    mount_page(&acme, "/products", page(60, &[])).await;
    mount_page(&globex, "/", page(60, &[])).await;

    let targets = vec![
        CrawlTarget::new("Acme", acme.uri()),
        CrawlTarget::new("Globex", globex.uri()),
    ];
    let reports = Mutex::new(Vec::new());
    let callback = |p: Progress| reports.lock().unwrap().push(p);

    let output = Coordinator::new(test_settings(), http_browser())
        .crawl_all(&targets, Some(&callback))
        .await
        .unwrap();

    assert_eq!(output.stats.company_stats.len(), 2);
    assert_eq!(output.stats.company_stats["Acme"].pages_scraped, 2);
    assert_eq!(output.stats.company_stats["Globex"].pages_scraped, 1);

    let reports = reports.into_inner().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].pages_visited, 3);
    assert_eq!(reports[0].expected_pages, 40);
    assert_eq!(reports[0].batches_total, 1);
}

#[tokio::test]
async fn test_page_budget_leaves_remaining_pages() {
    let server = MockServer::start().await;

    let links: Vec<String> = (0..25).map(|i| format!("/page{}", i)).collect();
    mount_page(&server, "/", page(60, &links)).await;
    for link in &links {
        mount_page(&server, link, page(60, &[])).await;
    }

    let targets = vec![CrawlTarget::new("Acme", server.uri())];
    let output = harvest(test_settings(), &targets).await;

    assert_eq!(output.stats.total_pages_visited, 20);
    assert_eq!(output.documents.len(), 20);

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 20);
    for i in 19..25 {
        assert_eq!(requests_to(&server, &format!("/page{}", i)).await, 0);
    }
}

#[tokio::test]
async fn test_failure_classification() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        page(
            60,
            &[
                "/error".to_string(),
                "/thin".to_string(),
                "/slow".to_string(),
                "/missing".to_string(),
            ],
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500).set_body_string(page(60, &[])))
        .mount(&server)
        .await;
    mount_page(&server, "/thin", page(10, &[])).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page(60, &[]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let settings = CrawlerSettings {
        page_timeout_secs: 1,
        ..test_settings()
    };
    let targets = vec![CrawlTarget::new("Acme", server.uri())];
    let output = harvest(settings, &targets).await;

    assert_eq!(output.documents.len(), 1);
    assert_eq!(output.failures.len(), 4);

    let status_of = |route: &str| {
        output
            .failures
            .iter()
            .find(|f| f.url.ends_with(route))
            .map(|f| f.status)
    };
    assert_eq!(status_of("/error"), Some(StatusKind::NetworkError));
    assert_eq!(status_of("/thin"), Some(StatusKind::ContentTooShort));
    assert_eq!(status_of("/slow"), Some(StatusKind::Timeout));
    assert_eq!(status_of("/missing"), Some(StatusKind::NetworkError));

    // Retryable failures use the whole attempt budget
    assert_eq!(requests_to(&server, "/error").await, 2);
    assert_eq!(requests_to(&server, "/thin").await, 2);

    let stats = &output.stats;
    assert_eq!(stats.pages_failed, 4);
    assert_eq!(stats.status_count(StatusKind::NetworkError), 2);
    assert_eq!(
        stats.pages_scraped + stats.pages_failed,
        stats.total_pages_visited
    );
}

#[tokio::test]
async fn test_harvest_then_chunk() {
    let server = MockServer::start().await;

    mount_page(&server, "/", page(400, &["/about".to_string()])).await;
    mount_page(&server, "/about", page(80, &[])).await;

    let targets = vec![CrawlTarget::new("Acme", server.uri())];
    let output = harvest(test_settings(), &targets).await;

    let chunker = Chunker::new(ChunkerSettings {
        chunk_size: 500,
        chunk_overlap: 100,
    });
    let chunks = chunker.chunk(&output.documents);

    assert!(chunks.len() > output.documents.len());
    for chunk in &chunks {
        assert!(chunk.text.chars().count() <= 500);
        assert!(output
            .documents
            .iter()
            .any(|d| d.metadata == chunk.metadata));
    }
}

#[tokio::test]
async fn test_links_follow_redirected_root() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/home/"))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/home/",
        page(60, &["team".to_string(), "/about".to_string()]),
    )
    .await;
    mount_page(&server, "/home/team", page(60, &[])).await;
    mount_page(&server, "/about", page(60, &[])).await;

    let targets = vec![CrawlTarget::new("Acme", server.uri())];
    let output = harvest(test_settings(), &targets).await;

    assert_eq!(output.documents.len(), 3);
    assert!(output.failures.is_empty());
    assert_eq!(requests_to(&server, "/home/team").await, 1);
    assert_eq!(requests_to(&server, "/team").await, 0);
}
