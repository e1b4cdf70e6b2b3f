//! Integration tests for the unfurler
//!
//! These tests use wiremock to create mock HTTP origins and exercise the
//! full resolve cycle end-to-end: scraping, oEmbed, caching, and
//! cancellation.

use kasumi::cache::{CacheStorage, MemoryCache, SqliteCache};
use kasumi::config::{Config, IdentityConfig};
use kasumi::fetch::{CachingFetcher, DirectFetcher, FetchCapability, FetchError};
use kasumi::oembed::{Endpoint, Provider};
use kasumi::pipeline::{UnfurlContext, Unfurler};
use kasumi::scrape::FieldValue;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_identity() -> IdentityConfig {
    IdentityConfig {
        client_name: "TestUnfurler".to_string(),
        client_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
    }
}

fn direct_fetcher() -> Arc<DirectFetcher> {
    Arc::new(
        DirectFetcher::new(&test_identity(), Duration::from_secs(5))
            .expect("Failed to build fetcher"),
    )
}

/// Creates a test configuration with the given provider table
fn create_test_config(providers: Vec<Provider>) -> Config {
    Config {
        identity: test_identity(),
        providers,
        ..Config::default()
    }
}

const OGP_PAGE: &str = r#"<html><head>
    <title>Fallback Title</title>
    <meta property="og:title" content="An Article">
    <meta property="og:description" content="All about things.">
    <meta property="og:image" content="/img/cover.png">
</head><body>Content</body></html>"#;

#[tokio::test]
async fn test_scrape_ogp_page_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(OGP_PAGE)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![]);
    let unfurler = Unfurler::new(&config);
    let ctx = UnfurlContext::new(direct_fetcher());

    let url = format!("{}/article", mock_server.uri());
    let metadata = unfurler.scrape(&url, &ctx).await.expect("scrape failed");

    assert_eq!(
        metadata.get("title").and_then(FieldValue::first),
        Some("An Article")
    );
    assert_eq!(
        metadata.get("description").and_then(FieldValue::first),
        Some("All about things.")
    );

    // The host backfills site_name, and url is always present
    assert_eq!(
        metadata.get("site_name").and_then(FieldValue::first),
        Some("127.0.0.1")
    );
    assert!(metadata
        .get("url")
        .and_then(FieldValue::first)
        .unwrap()
        .ends_with("/article"));

    // Relative og:image was resolved against the page URL
    let image = metadata.get("image").and_then(FieldValue::first).unwrap();
    assert_eq!(image, format!("{}/img/cover.png", mock_server.uri()));
}

#[tokio::test]
async fn test_scrape_renders_link_card_fragment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(OGP_PAGE)
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![]);
    let unfurler = Unfurler::new(&config);
    let ctx = UnfurlContext::new(direct_fetcher());

    let url = format!("{}/article", mock_server.uri());
    let fragment = unfurler.unfurl(&url, &ctx).await.expect("unfurl failed");

    assert!(fragment.contains("kasumi-card"));
    assert!(fragment.contains("An Article"));
    assert!(fragment.contains("All about things."));
    assert!(fragment.contains(r#"id="kasumi-embed-1""#));
}

#[tokio::test]
async fn test_second_scrape_within_ttl_stays_off_the_network() {
    let mock_server = MockServer::start().await;

    // expect(1) fails the test on teardown if a second request arrives
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(OGP_PAGE)
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher: Arc<dyn FetchCapability> = Arc::new(CachingFetcher::new(
        direct_fetcher(),
        Arc::new(MemoryCache::new()),
    ));

    let config = create_test_config(vec![]);
    let unfurler = Unfurler::new(&config);
    let ctx = UnfurlContext::new(fetcher);

    let url = format!("{}/article", mock_server.uri());
    let first = unfurler.scrape(&url, &ctx).await.expect("first scrape");
    let second = unfurler.scrape(&url, &ctx).await.expect("second scrape");

    assert_eq!(
        first.get("title").and_then(FieldValue::first),
        second.get("title").and_then(FieldValue::first)
    );
}

#[tokio::test]
async fn test_failed_fetch_is_negatively_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = CachingFetcher::new(direct_fetcher(), Arc::new(MemoryCache::new()));
    let cancel = CancellationToken::new();

    let url = format!("{}/gone", mock_server.uri());
    let first = fetcher.fetch(&url, "text/html", &cancel).await;
    assert!(matches!(first, Err(FetchError::Http { status: 404, .. })));

    // Second attempt fails from cache without a second request
    let second = fetcher.fetch(&url, "text/html", &cancel).await;
    assert!(matches!(second, Err(FetchError::Http { status: 404, .. })));
}

#[tokio::test]
async fn test_disabled_failure_caching_refetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = CachingFetcher::new(direct_fetcher(), Arc::new(MemoryCache::new()))
        .with_failure_caching(false);
    let cancel = CancellationToken::new();

    let url = format!("{}/flaky", mock_server.uri());
    for _ in 0..2 {
        let result = fetcher.fetch(&url, "text/html", &cancel).await;
        assert!(matches!(result, Err(FetchError::Http { status: 500, .. })));
    }
}

#[tokio::test]
async fn test_oembed_provider_end_to_end() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/oembed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"{
                        "type": "video",
                        "version": "1.0",
                        "title": "A Clip",
                        "html": "<iframe src=\"https://video.example/embed/1\"></iframe>"
                    }"#,
                )
                .insert_header("content-type", "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let providers = vec![Provider {
        name: "MockVideo".to_string(),
        base_url: base.clone(),
        endpoints: vec![Endpoint {
            schemes: vec![format!("{}/watch*", base)],
            url: format!("{}/oembed", base),
            discovery: false,
        }],
    }];

    let config = create_test_config(providers);
    let unfurler = Unfurler::new(&config);
    let ctx = UnfurlContext::new(direct_fetcher());

    let url = format!("{}/watch?v=abc", base);
    assert!(unfurler.resolver().has_static_endpoint(&url));

    let fragment = unfurler.unfurl(&url, &ctx).await.expect("unfurl failed");
    assert!(fragment.contains("kasumi-embed"));
    assert!(fragment.contains("<iframe"));
}

#[tokio::test]
async fn test_oembed_failure_renders_unavailable() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/oembed"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let providers = vec![Provider {
        name: "MockVideo".to_string(),
        base_url: base.clone(),
        endpoints: vec![Endpoint {
            schemes: vec![format!("{}/watch*", base)],
            url: format!("{}/oembed", base),
            discovery: false,
        }],
    }];

    let config = create_test_config(providers);
    let unfurler = Unfurler::new(&config);
    let ctx = UnfurlContext::new(direct_fetcher());

    let url = format!("{}/watch?v=abc", base);
    let fragment = unfurler.unfurl(&url, &ctx).await.expect("unfurl failed");
    assert!(fragment.contains("kasumi-unavailable"));
    assert!(fragment.contains(&url));
}

#[tokio::test]
async fn test_discovery_link_resolves_endpoint() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/post/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    r#"<html><head>
                    <link rel="alternate" type="application/json+oembed"
                          href="{}/services/oembed?url=post-1">
                    </head><body></body></html>"#,
                    base
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![]);
    let unfurler = Unfurler::new(&config);
    let fetcher = direct_fetcher();
    let cancel = CancellationToken::new();

    let url = format!("{}/post/1", base);
    let endpoint = unfurler
        .resolver()
        .resolve(&url, fetcher.as_ref(), &cancel)
        .await
        .expect("discovery failed");
    assert_eq!(endpoint, format!("{}/services/oembed?url=post-1", base));
}

#[tokio::test]
async fn test_cancellation_aborts_and_is_not_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(OGP_PAGE)
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;

    let cache = Arc::new(MemoryCache::new());
    let fetcher = CachingFetcher::new(direct_fetcher(), Arc::clone(&cache) as Arc<dyn CacheStorage>);

    let cancel = CancellationToken::new();
    let url = format!("{}/slow", mock_server.uri());

    let fetch = fetcher.fetch(&url, "text/html", &cancel);
    tokio::pin!(fetch);

    let result = tokio::select! {
        result = &mut fetch => result,
        _ = tokio::time::sleep(Duration::from_millis(100)) => {
            cancel.cancel();
            fetch.await
        }
    };

    assert!(matches!(result, Err(FetchError::Cancelled { .. })));
    assert_eq!(cache.size().await.unwrap(), 0);
}

#[tokio::test]
async fn test_sqlite_cache_survives_reopen() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(OGP_PAGE)
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("unfurl-cache.db");
    let url = format!("{}/article", mock_server.uri());
    let cancel = CancellationToken::new();

    {
        let cache = Arc::new(open_sqlite(&db_path));
        let fetcher = CachingFetcher::new(direct_fetcher(), cache);
        let response = fetcher.fetch(&url, "text/html", &cancel).await.unwrap();
        assert!(!response.from_cache);
    }

    // A fresh fetcher over the same database file serves from cache
    let cache = Arc::new(open_sqlite(&db_path));
    let fetcher = CachingFetcher::new(direct_fetcher(), cache);
    let response = fetcher.fetch(&url, "text/html", &cancel).await.unwrap();
    assert!(response.from_cache);
    assert!(response.body.contains("og:title"));
}

fn open_sqlite(path: &Path) -> SqliteCache {
    SqliteCache::new(path).expect("Failed to open cache database")
}
