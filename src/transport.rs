//! HTTP transport and the success/failure envelope.
//!
//! Every request goes through [`Transport::send`], which always resolves to an
//! [`Envelope`]: timeouts, refused connections, non-2xx statuses and bodies that
//! are not JSON all become [`Envelope::Failure`] instead of an `Err` or a panic.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::ApiError;

/// Uniform result of an API call.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Failure(ApiError),
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Envelope::Success(data) => Some(data),
            Envelope::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure(err) => Some(err),
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        match self {
            Envelope::Success(data) => Envelope::Success(f(data)),
            Envelope::Failure(err) => Envelope::Failure(err),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Envelope<U>) -> Envelope<U> {
        match self {
            Envelope::Success(data) => f(data),
            Envelope::Failure(err) => Envelope::Failure(err),
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            Envelope::Success(data) => Ok(data),
            Envelope::Failure(err) => Err(err),
        }
    }
}

impl<T> From<Result<T, ApiError>> for Envelope<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Envelope::Success(data),
            Err(err) => Envelope::Failure(err),
        }
    }
}

impl Envelope<Value> {
    /// Parses a single entity out of a raw JSON payload.
    pub fn decode<T: DeserializeOwned>(self) -> Envelope<T> {
        self.and_then(|value| {
            serde_json::from_value(value)
                .map_err(|e| ApiError::Shape(e.to_string()))
                .into()
        })
    }

    /// Parses a list payload. Anything other than a JSON array of well-formed
    /// entities is a shape violation.
    pub fn decode_list<T: DeserializeOwned>(self) -> Envelope<Vec<T>> {
        self.and_then(|value| match value {
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<T>, _>>()
                .map_err(|e| ApiError::Shape(e.to_string()))
                .into(),
            other => Envelope::Failure(ApiError::Shape(format!(
                "expected an array, got {}",
                json_kind(&other)
            ))),
        })
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Envelope::Success(data) => {
                let mut s = serializer.serialize_struct("Envelope", 2)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("data", data)?;
                s.end()
            }
            Envelope::Failure(err) => {
                let mut s = serializer.serialize_struct("Envelope", 3)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("data", &Value::Null)?;
                s.serialize_field("error", &err.to_string())?;
                s.end()
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A path-relative API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, endpoint).with_body(body)
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(String::from);
        self
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues the request. Must not panic; every failure is an envelope.
    async fn send(&self, request: ApiRequest) -> Envelope<Value>;
}

/// reqwest-backed transport against a configured base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: ApiConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Envelope<Value> {
        let url = self.config.url_for(&request.endpoint);
        debug!(method = %request.method, %url, "api request");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.config.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let envelope = match builder.send().await {
            Ok(response) => read_response(response).await,
            Err(err) => Envelope::Failure(classify(&err)),
        };

        if let Envelope::Failure(err) = &envelope {
            warn!(endpoint = %request.endpoint, error = %err, "api request failed");
        }
        envelope
    }
}

async fn read_response(response: reqwest::Response) -> Envelope<Value> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Envelope::Failure(ApiError::NotFound);
    }
    if !status.is_success() {
        return Envelope::Failure(ApiError::Http {
            status: status.as_u16(),
        });
    }

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => return Envelope::Failure(classify(&err)),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Envelope::Success(Value::Null);
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Decode(e.to_string()))
        .into()
}

fn classify(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_connect() {
        ApiError::Unreachable
    } else {
        ApiError::Network(err.to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).to_string()
    }

    /// Serves one canned response and hands back the raw request text.
    async fn serve_once(response: String) -> (ApiConfig, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });
        (ApiConfig::new(format!("http://{}", addr)), handle)
    }

    #[tokio::test]
    async fn test_success_wraps_json() {
        let (config, server) = serve_once(http_response("200 OK", r#"[{"id":1}]"#)).await;
        let transport = HttpTransport::new(config);

        let envelope = transport.send(ApiRequest::get("/jobs")).await;
        assert_eq!(envelope, Envelope::Success(json!([{"id": 1}])));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /jobs HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
    }

    #[tokio::test]
    async fn test_query_is_encoded() {
        let (config, server) = serve_once(http_response("200 OK", "[]")).await;
        let transport = HttpTransport::new(config);

        let envelope = transport
            .send(ApiRequest::get("/jobs").with_query("search", "data & ml"))
            .await;
        assert!(envelope.is_success());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /jobs?search=data+%26+ml HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_post_sends_body_and_token() {
        let (config, server) = serve_once(http_response("201 Created", r#"{"id":9}"#)).await;
        let transport = HttpTransport::new(config);

        let request = ApiRequest::post("/feedback", json!({"type": "bug", "message": "broken"}))
            .with_bearer(Some("tok"));
        let envelope = transport.send(request).await;
        assert_eq!(envelope.data(), Some(&json!({"id": 9})));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /feedback HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer tok"));
        assert!(raw.contains(r#""message":"broken""#));
    }

    #[tokio::test]
    async fn test_server_error_is_failure() {
        let (config, _server) = serve_once(http_response("500 Internal Server Error", "{}")).await;
        let envelope = HttpTransport::new(config).send(ApiRequest::get("/jobs")).await;
        assert_eq!(envelope, Envelope::Failure(ApiError::Http { status: 500 }));
        assert_eq!(envelope.error_message().unwrap(), "HTTP error! status: 500");
    }

    #[tokio::test]
    async fn test_not_found_is_distinguished() {
        let (config, _server) = serve_once(http_response("404 Not Found", "{}")).await;
        let envelope = HttpTransport::new(config).send(ApiRequest::get("/jobs/42")).await;
        assert_eq!(envelope, Envelope::Failure(ApiError::NotFound));
    }

    #[tokio::test]
    async fn test_malformed_json_is_failure() {
        let (config, _server) = serve_once(http_response("200 OK", "<html>oops</html>")).await;
        let envelope = HttpTransport::new(config).send(ApiRequest::get("/jobs")).await;
        assert!(matches!(envelope, Envelope::Failure(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_empty_body_is_null() {
        let (config, _server) = serve_once(http_response("200 OK", "")).await;
        let envelope = HttpTransport::new(config).send(ApiRequest::get("/feedback")).await;
        assert_eq!(envelope, Envelope::Success(Value::Null));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(ApiConfig::new(format!("http://{}", addr)));
        let envelope = transport.send(ApiRequest::get("/jobs")).await;
        assert_eq!(envelope, Envelope::Failure(ApiError::Unreachable));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let config = ApiConfig::new(format!("http://{}", addr)).with_timeout(Duration::from_millis(200));
        let envelope = HttpTransport::new(config).send(ApiRequest::get("/jobs")).await;
        assert_eq!(envelope, Envelope::Failure(ApiError::Timeout));
        assert_eq!(envelope.error_message().unwrap(), "Request timeout");
    }

    #[test]
    fn test_envelope_serializes_like_the_wire_contract() {
        let ok = serde_json::to_value(Envelope::Success(vec![1, 2])).unwrap();
        assert_eq!(ok, json!({"success": true, "data": [1, 2]}));

        let failed: Envelope<Vec<i32>> = Envelope::Failure(ApiError::Timeout);
        let failed = serde_json::to_value(failed).unwrap();
        assert_eq!(
            failed,
            json!({"success": false, "data": null, "error": "Request timeout"})
        );
    }

    #[test]
    fn test_decode_list_rejects_non_arrays() {
        let envelope: Envelope<Vec<i64>> = Envelope::Success(json!({"items": []})).decode_list();
        assert!(matches!(envelope, Envelope::Failure(ApiError::Shape(_))));

        let envelope: Envelope<Vec<i64>> = Envelope::Success(json!([1, "two"])).decode_list();
        assert!(matches!(envelope, Envelope::Failure(ApiError::Shape(_))));

        let envelope: Envelope<Vec<i64>> = Envelope::Success(json!([1, 2])).decode_list();
        assert_eq!(envelope, Envelope::Success(vec![1, 2]));
    }

    #[test]
    fn test_decode_list_keeps_transport_failure() {
        let envelope: Envelope<Vec<i64>> =
            Envelope::<Value>::Failure(ApiError::Unreachable).decode_list();
        assert_eq!(envelope, Envelope::Failure(ApiError::Unreachable));
    }
}
