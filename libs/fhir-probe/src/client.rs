//! HTTP client for the FHIR server under test

use crate::config::Config;
use crate::error::Result;
use colored::Colorize;
use ferrum_inspect::HighlightSet;
use reqwest::header::{HeaderValue, CONTENT_TYPE, IF_MATCH};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

pub const FHIR_JSON: &str = "application/fhir+json";

/// Optional parts of a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    /// Query parameters; repeated names are sent repeatedly.
    pub params: Vec<(String, String)>,
    /// Response paths to emphasise in verbose output.
    pub highlight: Vec<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// `If-Match: W/"<version>"`
    pub fn if_match(self, version: &str) -> Self {
        self.header(IF_MATCH.as_str(), weak_etag(version))
    }

    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    pub fn params<'a>(mut self, params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self
    }

    pub fn highlight<'a>(mut self, paths: impl IntoIterator<Item = &'a str>) -> Self {
        self.highlight.extend(paths.into_iter().map(str::to_string));
        self
    }
}

/// Response with the body already read.
#[derive(Debug, Clone)]
pub struct FhirResponse {
    pub status: StatusCode,
    pub text: String,
    json: Option<Value>,
}

impl FhirResponse {
    pub fn new(status: StatusCode, text: String) -> Self {
        let json = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };
        Self { status, text, json }
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn is(&self, code: u16) -> bool {
        self.status.as_u16() == code
    }

    /// Parsed body, if it was JSON.
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    pub fn into_json(self) -> Option<Value> {
        self.json
    }
}

/// Client for the server under test.
pub struct FhirClient {
    client: Client,
    base_url: String,
    verbose: bool,
}

impl FhirClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            verbose: config.verbose,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request against `endpoint` (relative to the base URL).
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<FhirResponse> {
        let url = endpoint_url(&self.base_url, endpoint);
        let highlights = HighlightSet::parse(&options.highlight)?;

        if self.verbose {
            self.print_request(&method, &url, &options)?;
        }
        debug!(%method, %url, params = options.params.len(), "Sending request");

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON));
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !options.params.is_empty() {
            builder = builder.query(&options.params);
        }
        if let Some(body) = &options.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await.inspect_err(|e| {
            warn!(error = %e, %method, %url, "Request failed");
        })?;
        let status = response.status();
        let text = response.text().await?;
        let response = FhirResponse::new(status, text);

        debug!(%method, %url, status = status.as_u16(), "Received response");
        if self.verbose {
            print_response(&response, &highlights);
        }

        Ok(response)
    }

    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> Result<FhirResponse> {
        self.request(Method::GET, endpoint, options).await
    }

    pub async fn create(&self, resource_type: &str, resource: &Value) -> Result<FhirResponse> {
        self.request(
            Method::POST,
            resource_type,
            RequestOptions::new().body(resource.clone()),
        )
        .await
    }

    pub async fn read(&self, resource_type: &str, id: &str) -> Result<FhirResponse> {
        self.get(&format!("{resource_type}/{id}"), RequestOptions::new()).await
    }

    /// PUT; with `version` the update is conditional on `If-Match`.
    pub async fn update(
        &self,
        resource_type: &str,
        id: &str,
        resource: &Value,
        version: Option<&str>,
    ) -> Result<FhirResponse> {
        let mut options = RequestOptions::new().body(resource.clone());
        if let Some(version) = version {
            options = options.if_match(version);
        }
        self.request(Method::PUT, &format!("{resource_type}/{id}"), options)
            .await
    }

    pub async fn delete(&self, resource_type: &str, id: &str) -> Result<FhirResponse> {
        self.request(
            Method::DELETE,
            &format!("{resource_type}/{id}"),
            RequestOptions::new(),
        )
        .await
    }

    pub async fn search(
        &self,
        resource_type: &str,
        params: &[(&str, &str)],
    ) -> Result<FhirResponse> {
        self.get(
            resource_type,
            RequestOptions::new().params(params.iter().copied()),
        )
        .await
    }

    fn print_request(&self, method: &Method, url: &str, options: &RequestOptions) -> Result<()> {
        println!("\n{} {method} {url}", "→".blue());
        if !options.params.is_empty() {
            println!("  {} {:?}", "Params:".bold(), options.params);
        }
        if let Some(body) = &options.body {
            println!("  {}", "Request Data:".bold());
            println!("  {}", indent(&serde_json::to_string_pretty(body)?));
        }
        Ok(())
    }
}

fn print_response(response: &FhirResponse, highlights: &HighlightSet) {
    println!(
        "{} {} {}",
        "←".blue(),
        "Status:".bold(),
        response.status_code()
    );
    if response.text.is_empty() {
        return;
    }
    match response.json() {
        Some(json) => {
            println!("  {}", "Response:".bold());
            println!("  {}", indent(&ferrum_inspect::render(json, highlights)));
        }
        None => println!("  {} {}", "Response:".bold(), response.text),
    }
}

/// Continuation lines of a multi-line block get a two-space indent.
fn indent(text: &str) -> String {
    text.replace('\n', "\n  ")
}

/// Join the base URL and an endpoint with exactly one slash.
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// Weak ETag for a version id.
pub fn weak_etag(version: &str) -> String {
    format!("W/\"{version}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("https://playground.dhp.uz/fhir", "/Patient"),
            "https://playground.dhp.uz/fhir/Patient"
        );
        assert_eq!(
            endpoint_url("https://playground.dhp.uz/fhir/", "Patient/123"),
            "https://playground.dhp.uz/fhir/Patient/123"
        );
    }

    #[test]
    fn test_weak_etag() {
        assert_eq!(weak_etag("3"), "W/\"3\"");
    }

    #[test]
    fn test_request_options_builder() {
        let options = RequestOptions::new()
            .param("birthdate", "gt1980-01-01")
            .param("birthdate", "lt1990-12-31")
            .if_match("2")
            .highlight(["name", "identifier[0].value"]);

        assert_eq!(options.params.len(), 2);
        assert_eq!(
            options.headers,
            vec![("if-match".to_string(), "W/\"2\"".to_string())]
        );
        assert_eq!(options.highlight, vec!["name", "identifier[0].value"]);
    }

    #[test]
    fn test_response_parses_json_body() {
        let response = FhirResponse::new(
            StatusCode::CREATED,
            json!({"resourceType": "Patient", "id": "p1"}).to_string(),
        );
        assert!(response.is(201));
        assert_eq!(response.json().unwrap()["id"], "p1");
    }

    #[test]
    fn test_response_tolerates_empty_and_non_json_bodies() {
        assert!(FhirResponse::new(StatusCode::OK, String::new())
            .json()
            .is_none());
        assert!(FhirResponse::new(StatusCode::BAD_GATEWAY, "<html>".to_string())
            .json()
            .is_none());
    }

    #[test]
    fn test_client_from_config() {
        let client = FhirClient::new(&Config::default()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/fhir");
    }

    fn unreachable_client() -> FhirClient {
        let config = Config {
            base_url: "http://127.0.0.1:9/fhir".to_string(),
            request_timeout_seconds: 2,
            verbose: false,
            ..Config::default()
        };
        FhirClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_highlight_fails_before_sending() {
        let client = unreachable_client();
        let result = client
            .get("Patient", RequestOptions::new().highlight(["name[x]"]))
            .await;
        assert!(matches!(result, Err(crate::Error::Inspect(_))));
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        let client = unreachable_client();
        let result = client.read("Patient", "123").await;
        assert!(matches!(result, Err(crate::Error::Http(_))));
    }
}
