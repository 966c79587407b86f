//! Motivational quotes: two public providers, then a built-in pool.
//!
//! Fetching never fails. Provider errors are logged at debug level and the
//! next source is tried.

use std::future::Future;

use rand::Rng;
use reqwest::Client;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

pub const LOCAL_QUOTES: [&str; 8] = [
    "Today it doesn't need to be perfect: it needs to be done.",
    "Consistency beats talent when talent isn't consistent.",
    "One step at a time, every day.",
    "If it's hard, it's because it's changing you.",
    "You're not wasting time: you're building discipline.",
    "Train for the person you want to become.",
    "Motivation gets you started, habit takes you far.",
    "Small progress = big results.",
];

/// Anything that can hand out a quote.
pub trait QuoteSource: Send + Sync {
    /// A quote different from `previous` whenever possible.
    fn fetch_quote(&self, previous: Option<&str>) -> impl Future<Output = String> + Send;
}

#[derive(Clone, Debug)]
pub struct QuoteService {
    client: Client,
    quotable_url: String,
    zenquotes_url: String,
}

impl QuoteService {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.quote_timeout()).build()?;
        Ok(Self {
            client,
            quotable_url: config.quotable_url.clone(),
            zenquotes_url: config.zenquotes_url.clone(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Remote(format!(
                "quote provider returned HTTP {}",
                response.status().as_u16()
            )));
        }
        Ok(response.text().await?)
    }

    async fn from_provider(
        &self,
        name: &str,
        url: &str,
        parse: fn(&str) -> Option<String>,
        previous: Option<&str>,
    ) -> Option<String> {
        match self.get_text(url).await {
            Ok(body) => parse(&body).filter(|quote| Some(quote.as_str()) != previous),
            Err(error) => {
                tracing::debug!("Quote provider {} failed: {}", name, error);
                None
            }
        }
    }
}

impl QuoteSource for QuoteService {
    async fn fetch_quote(&self, previous: Option<&str>) -> String {
        if let Some(quote) = self
            .from_provider("quotable", &self.quotable_url, parse_quotable, previous)
            .await
        {
            return quote;
        }
        if let Some(quote) = self
            .from_provider("zenquotes", &self.zenquotes_url, parse_zenquotes, previous)
            .await
        {
            return quote;
        }
        pick_local(previous).to_string()
    }
}

/// `“text” — author`, or just `“text”` without an author.
#[must_use]
pub fn format_quote(text: &str, author: &str) -> String {
    let author = author.trim();
    if author.is_empty() {
        format!("\u{201c}{}\u{201d}", text.trim())
    } else {
        format!("\u{201c}{}\u{201d} \u{2014} {author}", text.trim())
    }
}

#[derive(Debug, Deserialize)]
struct QuotableBody {
    #[serde(default)]
    content: String,
    #[serde(default)]
    author: String,
}

#[derive(Debug, Deserialize)]
struct ZenQuote {
    #[serde(default)]
    q: String,
    #[serde(default)]
    a: String,
}

/// Quotable: `{"content": ..., "author": ...}`
pub fn parse_quotable(body: &str) -> Option<String> {
    let quote: QuotableBody = serde_json::from_str(body).ok()?;
    if quote.content.trim().is_empty() {
        return None;
    }
    Some(format_quote(&quote.content, &quote.author))
}

/// ZenQuotes: `[{"q": ..., "a": ...}]`
pub fn parse_zenquotes(body: &str) -> Option<String> {
    let quotes: Vec<ZenQuote> = serde_json::from_str(body).ok()?;
    let first = quotes.into_iter().next()?;
    if first.q.trim().is_empty() {
        return None;
    }
    Some(format_quote(&first.q, &first.a))
}

/// Random built-in quote, avoiding `previous` when another one exists.
#[must_use]
pub fn pick_local(previous: Option<&str>) -> &'static str {
    let pool: Vec<&'static str> = LOCAL_QUOTES
        .iter()
        .copied()
        .filter(|quote| Some(*quote) != previous)
        .collect();
    let pool = if pool.is_empty() {
        LOCAL_QUOTES.to_vec()
    } else {
        pool
    };
    let index = rand::rng().random_range(0..pool.len());
    pool[index]
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use pretty_assertions::assert_eq;

    fn service_for(server: &MockServer) -> QuoteService {
        let config = ClientConfig {
            quotable_url: server.url("/random"),
            zenquotes_url: server.url("/api/random"),
            quote_timeout_secs: 1,
            ..ClientConfig::default()
        };
        QuoteService::new(&config).unwrap()
    }

    #[test]
    fn formats_with_and_without_author() {
        assert_eq!(format_quote(" Keep going ", "Ada"), "“Keep going” — Ada");
        assert_eq!(format_quote("Keep going", "  "), "“Keep going”");
    }

    #[test]
    fn parses_quotable_payload() {
        let quote = parse_quotable(r#"{"_id": "x", "content": "Act.", "author": "Seneca"}"#);
        assert_eq!(quote.as_deref(), Some("“Act.” — Seneca"));
        assert_eq!(parse_quotable(r#"{"content": " "}"#), None);
        assert_eq!(parse_quotable("not json"), None);
    }

    #[test]
    fn parses_zenquotes_payload() {
        let quote = parse_zenquotes(r#"[{"q": "Begin.", "a": "", "h": "<b>"}]"#);
        assert_eq!(quote.as_deref(), Some("“Begin.”"));
        assert_eq!(parse_zenquotes("[]"), None);
    }

    #[test]
    fn local_pick_avoids_previous() {
        for _ in 0..50 {
            assert_ne!(pick_local(Some(LOCAL_QUOTES[0])), LOCAL_QUOTES[0]);
        }
    }

    #[tokio::test]
    async fn unreachable_providers_fall_back_to_local_pool() {
        let config = ClientConfig {
            quotable_url: "http://127.0.0.1:9/random".to_string(),
            zenquotes_url: "http://127.0.0.1:9/api/random".to_string(),
            quote_timeout_secs: 1,
            ..ClientConfig::default()
        };
        let service = QuoteService::new(&config).unwrap();
        let quote = service.fetch_quote(Some(LOCAL_QUOTES[3])).await;
        assert!(LOCAL_QUOTES.contains(&quote.as_str()));
        assert_ne!(quote, LOCAL_QUOTES[3]);
    }

    #[tokio::test]
    async fn quotable_answer_is_used_first() {
        let server = MockServer::start();
        let quotable = server.mock(|when, then| {
            when.method(GET)
                .path("/random")
                .header("accept", "application/json")
                .header("cache-control", "no-store");
            then.status(200)
                .json_body(json!({"content": "Act.", "author": "Seneca"}));
        });
        let zen = server.mock(|when, then| {
            when.method(GET).path("/api/random");
            then.status(200).json_body(json!([{"q": "Begin.", "a": "Zen"}]));
        });

        let quote = service_for(&server).fetch_quote(None).await;
        assert_eq!(quote, "“Act.” — Seneca");
        quotable.assert();
        assert_eq!(zen.calls(), 0);
    }

    #[tokio::test]
    async fn server_error_falls_through_to_zenquotes() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/random");
            then.status(500).body("boom");
        });
        let zen = server.mock(|when, then| {
            when.method(GET).path("/api/random");
            then.status(200).json_body(json!([{"q": "Begin.", "a": "Zen"}]));
        });

        let quote = service_for(&server).fetch_quote(None).await;
        assert_eq!(quote, "“Begin.” — Zen");
        zen.assert();
    }

    #[tokio::test]
    async fn slow_provider_times_out_to_next_source() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/random");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(json!({"content": "Too late.", "author": "Nobody"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/random");
            then.status(200).json_body(json!([{"q": "Begin.", "a": "Zen"}]));
        });

        let quote = service_for(&server).fetch_quote(None).await;
        assert_eq!(quote, "“Begin.” — Zen");
    }

    #[tokio::test]
    async fn repeated_quote_is_skipped_then_local_pool_answers() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/random");
            then.status(200)
                .json_body(json!({"content": "Act.", "author": "Seneca"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/random");
            then.status(200).body("not json");
        });

        let quote = service_for(&server).fetch_quote(Some("“Act.” — Seneca")).await;
        assert!(LOCAL_QUOTES.contains(&quote.as_str()));
    }
}
