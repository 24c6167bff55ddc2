use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::config::SourceConfig;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::source::{QuoteRequest, QuoteSource, SourceError};
use crate::{RawQuotePayload, RawQuoteRecord};

/// Quote feed reached over HTTP GET.
///
/// Every call asks for fresh data (`cache-control: no-store`); nothing is
/// cached on this side either.
pub struct HttpQuoteSource {
    endpoint: String,
    auth: HttpAuth,
    timeout_ms: u64,
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl HttpQuoteSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(config: &SourceConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let auth = match &config.api_key {
            Some(key) if !key.trim().is_empty() => HttpAuth::Header {
                name: config.api_key_header.clone(),
                value: key.clone(),
            },
            _ => HttpAuth::None,
        };
        Self {
            endpoint: config.endpoint.clone(),
            auth,
            timeout_ms: 10_000,
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::default()),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    fn request_url(&self, request: &QuoteRequest) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{separator}symbol={}",
            self.endpoint,
            urlencoding::encode(&request.symbols.join(","))
        )
    }

    async fn fetch_payload(&self, request: QuoteRequest) -> Result<RawQuotePayload, SourceError> {
        self.circuit_breaker.admit()?;
        let outcome = self.exchange(&request).await;
        self.circuit_breaker.record(outcome.as_ref().map(|_| ()));
        let payload = outcome?;
        debug!(
            requested = request.symbols.len(),
            received = payload.len(),
            "quote feed replied"
        );
        Ok(payload)
    }

    async fn exchange(&self, request: &QuoteRequest) -> Result<RawQuotePayload, SourceError> {
        let http_request = HttpRequest::get(self.request_url(request))
            .with_header("cache-control", "no-store")
            .with_header("accept", "application/json")
            .with_auth(&self.auth)
            .with_timeout_ms(self.timeout_ms);

        let response = self
            .http_client
            .execute(http_request)
            .await
            .map_err(|error| {
                if error.timed_out() {
                    SourceError::timed_out(format!(
                        "quote feed did not reply within {}ms",
                        self.timeout_ms
                    ))
                } else {
                    SourceError::unavailable(format!(
                        "quote feed transport error: {}",
                        error.message()
                    ))
                }
            })?;

        if response.status == 429 {
            return Err(SourceError::rate_limited("quote feed returned status 429"));
        }
        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "quote feed returned status {}",
                response.status
            )));
        }

        parse_quote_body(&response.body)
    }
}

impl QuoteSource for HttpQuoteSource {
    fn fetch<'a>(
        &'a self,
        request: QuoteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawQuotePayload, SourceError>> + Send + 'a>> {
        Box::pin(self.fetch_payload(request))
    }
}

/// List-shaped reply: `{"status": true, "response": [{"s": "EUR/USD", ...}]}`.
#[derive(Debug, Deserialize)]
struct ListReply {
    #[serde(default)]
    status: Option<bool>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    response: Option<Vec<Value>>,
}

/// Accepts either a bare `symbol -> record` map or the list-shaped reply.
///
/// Individual records that fail to parse are skipped; only a body that is
/// not a JSON object at all is an error.
pub fn parse_quote_body(body: &str) -> Result<RawQuotePayload, SourceError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse quote feed reply: {e}")))?;
    let Value::Object(object) = value else {
        return Err(SourceError::malformed(
            "quote feed reply must be a JSON object",
        ));
    };

    if !object.contains_key("response") && !object.contains_key("status") {
        return Ok(RawQuotePayload::from_json_object(object));
    }

    let reply: ListReply = serde_json::from_value(Value::Object(object))
        .map_err(|e| SourceError::malformed(format!("unexpected quote feed reply: {e}")))?;
    if reply.status == Some(false) {
        let message = reply.msg.unwrap_or_else(|| String::from("no reason given"));
        warn!(%message, "quote feed rejected the request");
        return Err(SourceError::unavailable(format!(
            "quote feed rejected the request: {message}"
        )));
    }

    Ok(reply
        .response
        .unwrap_or_default()
        .into_iter()
        .filter_map(list_record)
        .collect())
}

fn list_record(item: Value) -> Option<(String, RawQuoteRecord)> {
    let symbol = item.get("s")?.as_str()?.replace('/', "");
    let record = serde_json::from_value::<RawQuoteRecord>(item).ok()?;
    Some((symbol, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::CircuitBreakerConfig;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::source::SourceErrorKind;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug)]
    struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn replying(response: Result<HttpResponse, HttpError>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn request() -> QuoteRequest {
        QuoteRequest::new(vec![String::from("EURUSD"), String::from("USDJPY")])
            .expect("valid request")
    }

    fn config_with_key() -> SourceConfig {
        SourceConfig {
            endpoint: String::from("https://feed.test/latest"),
            api_key: Some(String::from("k-123")),
            ..SourceConfig::default()
        }
    }

    #[tokio::test]
    async fn request_is_uncached_and_carries_symbols_and_key() {
        let client = Arc::new(RecordingHttpClient::replying(Ok(HttpResponse::ok_json(
            "{}",
        ))));
        let source = HttpQuoteSource::with_http_client(&config_with_key(), client.clone())
            .with_timeout_ms(2_500);

        source.fetch(request()).await.expect("empty payload is fine");

        let sent = client.recorded_requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://feed.test/latest?symbol=EURUSD%2CUSDJPY");
        assert_eq!(
            sent[0].headers.get("cache-control").map(String::as_str),
            Some("no-store")
        );
        assert_eq!(
            sent[0].headers.get("x-api-key").map(String::as_str),
            Some("k-123")
        );
        assert_eq!(sent[0].timeout_ms, 2_500);
    }

    #[tokio::test]
    async fn status_429_maps_to_rate_limited() {
        let client = Arc::new(RecordingHttpClient::replying(Ok(HttpResponse::with_status(
            429, "",
        ))));
        let source = HttpQuoteSource::with_http_client(&SourceConfig::default(), client);

        let error = source.fetch(request()).await.expect_err("rate limited");
        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn server_error_maps_to_unavailable() {
        let client = Arc::new(RecordingHttpClient::replying(Ok(HttpResponse::with_status(
            503, "busy",
        ))));
        let source = HttpQuoteSource::with_http_client(&SourceConfig::default(), client);

        let error = source.fetch(request()).await.expect_err("unavailable");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(error.message().contains("503"));
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let client = Arc::new(RecordingHttpClient::replying(Ok(HttpResponse::ok_json(
            "<html>",
        ))));
        let source = HttpQuoteSource::with_http_client(&SourceConfig::default(), client);

        let error = source.fetch(request()).await.expect_err("malformed");
        assert_eq!(error.kind(), SourceErrorKind::Malformed);
    }

    #[tokio::test]
    async fn transport_timeout_maps_to_timed_out() {
        let client = Arc::new(RecordingHttpClient::replying(Err(HttpError::timeout(
            "operation timed out",
        ))));
        let source = HttpQuoteSource::with_http_client(&SourceConfig::default(), client)
            .with_timeout_ms(1_500);

        let error = source.fetch(request()).await.expect_err("timed out");
        assert_eq!(error.kind(), SourceErrorKind::TimedOut);
        assert!(error.message().contains("1500ms"), "{}", error.message());

        let refresh = crate::RefreshError::from(error);
        assert_eq!(refresh.user_message(), "quote feed timed out; retrying next cycle");
    }

    #[tokio::test(start_paused = true)]
    async fn open_breaker_skips_the_upstream_call() {
        let client = Arc::new(RecordingHttpClient::replying(Err(HttpError::new(
            "connection refused",
        ))));
        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            cool_down: Duration::from_secs(60),
        }));
        let source = HttpQuoteSource::with_http_client(&SourceConfig::default(), client.clone())
            .with_circuit_breaker(breaker);

        for _ in 0..2 {
            let error = source.fetch(request()).await.expect_err("transport failure");
            assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        }
        assert_eq!(source.circuit_state(), CircuitState::Open);

        let error = source.fetch(request()).await.expect_err("breaker open");
        assert!(error.message().contains("cooling down"), "{}", error.message());
        assert_eq!(client.recorded_requests().len(), 2);

        tokio::time::advance(Duration::from_secs(60)).await;
        source.fetch(request()).await.expect_err("trial still fails");
        assert_eq!(client.recorded_requests().len(), 3);
        assert_eq!(source.circuit_state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn rate_limited_feed_keeps_being_called() {
        let client = Arc::new(RecordingHttpClient::replying(Ok(HttpResponse::with_status(
            429, "",
        ))));
        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            cool_down: Duration::from_secs(60),
        }));
        let source = HttpQuoteSource::with_http_client(&SourceConfig::default(), client.clone())
            .with_circuit_breaker(breaker);

        for _ in 0..4 {
            let error = source.fetch(request()).await.expect_err("rate limited");
            assert_eq!(error.kind(), SourceErrorKind::RateLimited);
        }
        assert_eq!(source.circuit_state(), CircuitState::Closed);
        assert_eq!(client.recorded_requests().len(), 4);
    }

    #[test]
    fn list_reply_is_keyed_by_symbol_without_slash() {
        let body = r#"{
            "status": true,
            "response": [
                {"s": "EUR/USD", "b": "1.0912", "cp": "+0.40%", "h": "1.0950", "l": "1.0900"},
                {"s": "USD/JPY", "b": 149.5, "cp": -0.6, "h": 149.8, "l": 149.2},
                "not a record"
            ]
        }"#;
        let payload = parse_quote_body(body).expect("list reply");

        assert_eq!(payload.symbols().collect::<Vec<_>>(), ["EURUSD", "USDJPY"]);
        let eur = payload.get("EURUSD").expect("eur record");
        assert_eq!(eur.bid.as_ref().and_then(|v| v.as_f64()), Some(1.0912));
    }

    #[test]
    fn bare_map_reply_is_accepted() {
        let body = r#"{"EURUSD": {"bid": 1.09, "change_percent": 0.4, "high": 1.095, "low": 1.09}}"#;
        let payload = parse_quote_body(body).expect("map reply");
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn rejected_status_surfaces_the_feed_message() {
        let body = r#"{"status": false, "code": 101, "msg": "API key invalid"}"#;
        let error = parse_quote_body(body).expect_err("feed rejection");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(error.message().contains("API key invalid"));
    }
}
