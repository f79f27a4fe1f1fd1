// API client module: a small blocking HTTP client for the hosted QnA
// service. One request per call, no retries. Every endpoint is a URL
// template from the fixed table below; values are percent-encoded before
// they are substituted.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Connect timeout applied to every client instance.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Scheme used in the `Authorization` header in front of the API key.
const AUTH_SCHEME: &str = "SSWS";

pub const LIST_SYSTEMS: Endpoint = Endpoint::get("/api/qna/v1/systems");
pub const GET_SYSTEM: Endpoint = Endpoint::get("/api/qna/v1/systems/{systemId}");
pub const LIST_LLMS: Endpoint = Endpoint::get("/api/qna/v1/systems/{systemId}/llm-providers");
pub const ASK_QUESTION: Endpoint = Endpoint::get(
    "/api/qna/v1/systems/{systemId}/answer?questionText={questionText}&llmProviderId={llmProviderId}&filter={filter}&properties={properties}",
);
pub const LIST_QUESTIONS: Endpoint =
    Endpoint::get("/api/qna/v1/systems/{systemId}/questionshistory");
pub const GET_QUESTION: Endpoint =
    Endpoint::get("/api/qna/v1/systems/{systemId}/questions/{questionId}");
pub const SEMANTIC_SEARCH: Endpoint = Endpoint::get(
    "/api/qna/v1/systems/{systemId}/semantic-search?query={query}&filter={filter}&properties={properties}",
);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("service host must be provided (use --service or `service=` in the config file)")]
    MissingService,
    #[error("API key must be provided (use --api-key or `api-key=` in the config file)")]
    MissingApiKey,
    #[error("invalid service host `{0}`")]
    InvalidService(String),
    #[error("API key is not a valid header value")]
    InvalidApiKey,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("response body is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A URL template plus the method used when no request body is sent.
/// Supplying a body always sends a POST.
///
/// Placeholders are written `{name}`. Expansion replaces every placeholder,
/// using an empty value for names the caller did not supply, so an expanded
/// path never contains a `{name}` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub template: &'static str,
    pub method: Method,
}

impl Endpoint {
    pub const fn get(template: &'static str) -> Self {
        Endpoint {
            template,
            method: Method::GET,
        }
    }

    /// Names of the placeholders in template order.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.template;
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    names.push(&after[..close]);
                    rest = &after[close + 1..];
                }
                None => break,
            }
        }
        names
    }

    /// Substitute `params` into the template. Values are percent-encoded;
    /// missing or `None` values become the empty string.
    pub fn expand(&self, params: &[(&str, Option<&str>)]) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                // unterminated brace is literal text
                rest = &rest[open..];
                break;
            };
            let name = &after[..close];
            let value = params
                .iter()
                .find(|(key, _)| *key == name)
                .and_then(|(_, value)| *value)
                .unwrap_or("");
            out.push_str(&urlencoding::encode(value));
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }
}

/// Status line and body of an HTTP exchange, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl fmt::Display for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ==> {}", self.status, self.body)
    }
}

/// Outcome of one call. Only an HTTP 200 carries a parsed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceResponse {
    Success { payload: Value, raw: RawResponse },
    Failure { raw: RawResponse },
}

impl ServiceResponse {
    /// Classify a finished exchange. The body of a non-200 response is never
    /// parsed; a 200 whose body is not JSON is a decode error.
    pub fn from_parts(status: StatusCode, body: String) -> Result<Self, ApiError> {
        let raw = RawResponse { status, body };
        if status != StatusCode::OK {
            return Ok(ServiceResponse::Failure { raw });
        }
        let payload = serde_json::from_str(&raw.body).map_err(ApiError::Decode)?;
        Ok(ServiceResponse::Success { payload, raw })
    }

    pub fn has_payload(&self) -> bool {
        matches!(self, ServiceResponse::Success { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            ServiceResponse::Success { payload, .. } => Some(payload),
            ServiceResponse::Failure { .. } => None,
        }
    }

    pub fn raw(&self) -> &RawResponse {
        match self {
            ServiceResponse::Success { raw, .. } | ServiceResponse::Failure { raw } => raw,
        }
    }
}

/// Parameters for the "ask a question" call.
#[derive(Debug, Clone, Copy, Default)]
pub struct AskRequest<'a> {
    pub system_id: &'a str,
    pub llm_provider_id: &'a str,
    pub question: &'a str,
    pub filter: Option<&'a str>,
    pub query_plan: Option<&'a str>,
    pub properties: Option<&'a str>,
}

/// Parameters for a semantic search.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchRequest<'a> {
    pub system_id: &'a str,
    pub query: &'a str,
    pub filter: Option<&'a str>,
    pub query_plan: Option<&'a str>,
    pub properties: Option<&'a str>,
}

/// Blocking client bound to one service host and API key.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print the key
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client for `service`. A bare host gets `https://` in front;
    /// an explicit `http://` or `https://` prefix is kept.
    pub fn new(service: &str, api_key: &str) -> Result<Self, ApiError> {
        let service = service.trim();
        let api_key = api_key.trim();
        if service.is_empty() {
            return Err(ApiError::MissingService);
        }
        if api_key.is_empty() {
            return Err(ApiError::MissingApiKey);
        }
        let base_url = normalize_service(service);
        match Url::parse(&base_url) {
            Ok(url) if url.host_str().is_some() => {}
            _ => return Err(ApiError::InvalidService(service.to_string())),
        }
        HeaderValue::from_str(&format!("{AUTH_SCHEME} {api_key}"))
            .map_err(|_| ApiError::InvalidApiKey)?;

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            // the blocking client otherwise gives up after 30s in total
            .timeout(None::<Duration>)
            .build()?;
        Ok(ApiClient {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint with `params` substituted.
    pub fn url_for(&self, endpoint: &Endpoint, params: &[(&str, Option<&str>)]) -> String {
        format!("{}{}", self.base_url, endpoint.expand(params))
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        // validated in `new`
        if let Ok(value) = HeaderValue::from_str(&format!("{AUTH_SCHEME} {}", self.api_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    /// Issue one request and wait for the whole body. A body switches the
    /// method to POST.
    pub fn call(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, Option<&str>)],
        body: Option<&str>,
    ) -> Result<ServiceResponse, ApiError> {
        let url = self.url_for(endpoint, params);
        let method = match body {
            Some(_) => Method::POST,
            None => endpoint.method.clone(),
        };
        let unset: Vec<&str> = endpoint
            .placeholders()
            .into_iter()
            .filter(|name| !params.iter().any(|(key, value)| key == name && value.is_some()))
            .collect();
        debug!(%method, %url, ?unset, "sending request");

        let started = Instant::now();
        let mut request = self
            .client
            .request(method, &url)
            .headers(self.auth_headers());
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }
        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;
        debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response received"
        );
        ServiceResponse::from_parts(status, text)
    }

    pub fn list_systems(&self) -> Result<ServiceResponse, ApiError> {
        self.call(&LIST_SYSTEMS, &[], None)
    }

    pub fn get_system(&self, system_id: &str) -> Result<ServiceResponse, ApiError> {
        self.call(&GET_SYSTEM, &[("systemId", Some(system_id))], None)
    }

    pub fn list_llms(&self, system_id: &str) -> Result<ServiceResponse, ApiError> {
        self.call(&LIST_LLMS, &[("systemId", Some(system_id))], None)
    }

    pub fn ask_question(&self, req: &AskRequest<'_>) -> Result<ServiceResponse, ApiError> {
        self.call(
            &ASK_QUESTION,
            &[
                ("systemId", Some(req.system_id)),
                ("questionText", Some(req.question)),
                ("llmProviderId", Some(req.llm_provider_id)),
                ("filter", req.filter),
                ("properties", req.properties),
            ],
            req.query_plan,
        )
    }

    pub fn list_questions(&self, system_id: &str) -> Result<ServiceResponse, ApiError> {
        self.call(&LIST_QUESTIONS, &[("systemId", Some(system_id))], None)
    }

    pub fn get_question(
        &self,
        system_id: &str,
        question_id: &str,
    ) -> Result<ServiceResponse, ApiError> {
        self.call(
            &GET_QUESTION,
            &[
                ("systemId", Some(system_id)),
                ("questionId", Some(question_id)),
            ],
            None,
        )
    }

    pub fn search(&self, req: &SearchRequest<'_>) -> Result<ServiceResponse, ApiError> {
        self.call(
            &SEMANTIC_SEARCH,
            &[
                ("systemId", Some(req.system_id)),
                ("query", Some(req.query)),
                ("filter", req.filter),
                ("properties", req.properties),
            ],
            req.query_plan,
        )
    }
}

fn normalize_service(service: &str) -> String {
    let base = if service.starts_with("https://") || service.starts_with("http://") {
        service.to_string()
    } else {
        format!("https://{service}")
    };
    base.trim_end_matches('/').to_string()
}
