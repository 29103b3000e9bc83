use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::Result;
use crate::config::FetchConfig;
use crate::domain::FeedDocument;
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;

pub struct HttpFetcher {
    client: Client,
    normalizer: Normalizer,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            normalizer: Normalizer::new(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, deadline: Duration) -> Result<FeedDocument> {
        let response = self.client.get(url).timeout(deadline).send().await?;
        response.error_for_status_ref()?;

        let body = response.bytes().await?;
        tracing::debug!("Fetched {} bytes from {}", body.len(), url);

        self.normalizer.normalize(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::GatorError;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;

    const USER_AGENT: &str = "gator-test/1.0";

    const RSS_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Local Feed</title>
    <link>http://localhost/</link>
    <description>Served by the test server</description>
    <item><title>One</title><link>http://localhost/1</link></item>
    <item><title>Two</title><link>http://localhost/2</link></item>
  </channel>
</rss>"#;

    async fn feed_handler(headers: HeaderMap) -> (StatusCode, String) {
        let agent = headers
            .get(reqwest::header::USER_AGENT)
            .and_then(|value| value.to_str().ok());
        if agent != Some(USER_AGENT) {
            return (StatusCode::FORBIDDEN, "missing user agent".to_string());
        }
        (StatusCode::OK, RSS_BODY.to_string())
    }

    async fn spawn_test_server() -> (String, tokio::task::JoinHandle<()>) {
        let app = Router::new()
            .route("/feed.xml", get(feed_handler))
            .route("/garbage", get(|| async { "this is not a feed" }))
            .route(
                "/missing",
                get(|| async { (StatusCode::NOT_FOUND, "gone".to_string()) }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    RSS_BODY.to_string()
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("local addr should exist");
        let join_handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server should run");
        });
        (format!("http://{address}"), join_handle)
    }

    fn fetcher() -> HttpFetcher {
        let config = FetchConfig {
            user_agent: USER_AGENT.to_string(),
            timeout_secs: 5,
        };
        HttpFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_parses_document_and_sends_user_agent() {
        let (base, server) = spawn_test_server().await;

        let doc = fetcher()
            .fetch(&format!("{base}/feed.xml"), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(doc.channel.title, Some("Local Feed".into()));
        assert_eq!(doc.titles().collect::<Vec<_>>(), vec!["One", "Two"]);
        server.abort();
    }

    #[tokio::test]
    async fn test_fetch_garbage_is_parse_error() {
        let (base, server) = spawn_test_server().await;

        let err = fetcher()
            .fetch(&format!("{base}/garbage"), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, GatorError::Parse(_)));
        server.abort();
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_network_error() {
        let (base, server) = spawn_test_server().await;

        let err = fetcher()
            .fetch(&format!("{base}/missing"), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, GatorError::Network(_)));
        server.abort();
    }

    #[tokio::test]
    async fn test_fetch_respects_deadline() {
        let (base, server) = spawn_test_server().await;

        let err = fetcher()
            .fetch(&format!("{base}/slow"), Duration::from_millis(100))
            .await
            .unwrap_err();

        match err {
            GatorError::Network(e) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
        server.abort();
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_network_error() {
        // Reserve a port, then free it so nothing is listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let err = fetcher()
            .fetch(&format!("http://{address}/feed.xml"), Duration::from_secs(2))
            .await
            .unwrap_err();

        assert!(err.is_fetch_failure());
        assert!(matches!(err, GatorError::Network(_)));
    }
}
