//! Endpoint to request translation.
//!
//! [`build`] is pure: it reads the endpoint and configuration and produces a
//! transport-ready [`Request`] without performing any I/O.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::Url;

use crate::error::BuildError;
use crate::{ClientConfig, Endpoint};

/// Characters escaped in endpoint paths. URL delimiters that would otherwise
/// start a fragment or be rewritten as a separator are included.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Transport-ready HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Get a header value as a string.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }
}

/// Build the request for one attempt of `endpoint`.
pub fn build(endpoint: &Endpoint, config: &ClientConfig) -> Result<Request, BuildError> {
    let url = build_url(endpoint, config)?;
    let mut headers = merge_headers(
        endpoint.headers(),
        &config.headers,
        endpoint.use_endpoint_headers_only(),
    )?;

    let method = endpoint.method().clone();
    if method == Method::GET {
        return Ok(Request {
            method,
            url,
            headers,
            body: None,
        });
    }

    let body = if let Some(body) = endpoint.body_ref() {
        headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(body.encoding().content_type()));
        Some(body.serialize(&config.body_parameters)?)
    } else if let Some(form) = endpoint.form_ref() {
        let content_type = HeaderValue::try_from(form.content_type())
            .map_err(|_| BuildError::InvalidFormData)?;
        headers.insert(CONTENT_TYPE, content_type);
        Some(form.to_bytes()?)
    } else if !config.body_parameters.is_empty() {
        headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));
        let data = serde_json::to_vec(&config.body_parameters)
            .map_err(|e| BuildError::Body(e.to_string()))?;
        Some(Bytes::from(data))
    } else {
        None
    };

    Ok(Request {
        method,
        url,
        headers,
        body,
    })
}

/// Compose the endpoint URL and append query parameters.
///
/// Endpoint parameters come first, configured parameters after; duplicate
/// keys are all kept.
pub fn build_url(endpoint: &Endpoint, config: &ClientConfig) -> Result<Url, BuildError> {
    let raw = if endpoint.is_full_path() {
        escape_full_url(endpoint.path())
    } else {
        let base = config
            .base_url
            .as_deref()
            .ok_or_else(|| BuildError::MissingBaseUrl(endpoint.path().to_string()))?;
        join_path(base, &escape(endpoint.path()))
    };

    let mut url = Url::parse(&raw).map_err(|e| BuildError::Components(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(BuildError::Components(raw));
    }

    let params = endpoint
        .query_parameters()
        .iter()
        .chain(config.query_parameters.iter());
    let mut params = params.peekable();
    if params.peek().is_some() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }

    Ok(url)
}

fn escape(path: &str) -> String {
    utf8_percent_encode(path, PATH_ESCAPE).to_string()
}

// The authority is left alone so IPv6 literals keep their brackets.
fn escape_full_url(raw: &str) -> String {
    let Some(scheme_end) = raw.find("://").map(|i| i + 3) else {
        return escape(raw);
    };
    let path_start = raw[scheme_end..]
        .find('/')
        .map_or(raw.len(), |i| scheme_end + i);
    format!("{}{}", &raw[..path_start], escape(&raw[path_start..]))
}

fn join_path(base: &str, path: &str) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    let path = path.strip_prefix('/').unwrap_or(path);
    format!("{base}/{path}")
}

/// Merge endpoint and configured headers.
///
/// Endpoint headers always apply. Configured headers are added only when
/// `endpoint_only` is false and never replace a name the endpoint already set.
pub fn merge_headers(
    endpoint: &[(String, String)],
    config: &[(String, String)],
    endpoint_only: bool,
) -> Result<HeaderMap, BuildError> {
    let mut headers = HeaderMap::new();

    for (name, value) in endpoint {
        let (name, value) = parse_header(name, value)?;
        headers.insert(name, value);
    }

    if !endpoint_only {
        for (name, value) in config {
            let (name, value) = parse_header(name, value)?;
            if !headers.contains_key(&name) {
                headers.insert(name, value);
            }
        }
    }

    Ok(headers)
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), BuildError> {
    let header_name = HeaderName::try_from(name).map_err(|e| BuildError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    let header_value = HeaderValue::try_from(value).map_err(|e| BuildError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Body, MultipartForm};
    use serde_json::{Value, json};

    fn config() -> ClientConfig {
        ClientConfig::builder()
            .base_url("https://api.example.com/v1/")
            .header("X-Client", "courier")
            .header("Accept", "application/json")
            .query_parameter("lang", "en")
            .build()
    }

    #[test]
    fn test_url_joins_with_single_slash() {
        let url = build_url(&Endpoint::get("/users/7"), &config()).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/users/7?lang=en");

        let config = ClientConfig::new("https://api.example.com/v1");
        let url = build_url(&Endpoint::get("users"), &config).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/users");
    }

    #[test]
    fn test_full_path_ignores_base_url() {
        let endpoint = Endpoint::get("https://cdn.example.com/file.json").full_path();
        let url = build_url(&endpoint, &config()).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/file.json?lang=en");
    }

    #[test]
    fn test_query_merge_is_additive() {
        let endpoint = Endpoint::get("/search").query("lang", "fr").query("q", "a b");
        let url = build_url(&endpoint, &config()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(
            pairs,
            vec![
                ("lang".into(), "fr".into()),
                ("q".into(), "a b".into()),
                ("lang".into(), "en".into()),
            ]
        );
    }

    #[test]
    fn test_path_is_escaped() {
        let config = ClientConfig::new("https://api.example.com");
        let url = build_url(&Endpoint::get("/files/my report"), &config).unwrap();
        assert_eq!(url.path(), "/files/my%20report");
    }

    #[test]
    fn test_path_hash_is_escaped() {
        let config = ClientConfig::new("https://api.example.com");

        let url = build_url(&Endpoint::get("/tags/c#sharp").query("page", 1), &config).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/tags/c%23sharp?page=1");
        assert!(url.fragment().is_none());

        let url = build_url(&Endpoint::get("/a\\b"), &config).unwrap();
        assert_eq!(url.path(), "/a%5Cb");
    }

    #[test]
    fn test_full_path_is_escaped() {
        let endpoint = Endpoint::get("http://[::1]:8080/notes/{id}|draft").full_path();
        let url = build_url(&endpoint, &ClientConfig::default()).unwrap();
        assert_eq!(url.host_str(), Some("[::1]"));
        assert_eq!(url.path(), "/notes/%7Bid%7D%7Cdraft");
    }

    #[test]
    fn test_invalid_url_is_components_error() {
        let endpoint = Endpoint::get("not a url").full_path();
        assert!(matches!(
            build_url(&endpoint, &config()),
            Err(BuildError::Components(_))
        ));

        let endpoint = Endpoint::get("/users");
        assert!(matches!(
            build_url(&endpoint, &ClientConfig::default()),
            Err(BuildError::MissingBaseUrl(_))
        ));
    }

    #[test]
    fn test_endpoint_headers_win() {
        let endpoint = Endpoint::get("/users").header("accept", "text/csv");
        let request = build(&endpoint, &config()).unwrap();

        assert_eq!(request.header("Accept"), Some("text/csv"));
        assert_eq!(request.header("X-Client"), Some("courier"));
        assert_eq!(request.headers().get_all("accept").iter().count(), 1);
    }

    #[test]
    fn test_endpoint_headers_only() {
        let endpoint = Endpoint::get("/users")
            .header("X-Only", "1")
            .endpoint_headers_only();
        let request = build(&endpoint, &config()).unwrap();

        assert_eq!(request.header("X-Only"), Some("1"));
        assert!(request.header("X-Client").is_none());
    }

    #[test]
    fn test_invalid_header_rejected() {
        let endpoint = Endpoint::get("/users").header("bad header", "x");
        assert!(matches!(
            build(&endpoint, &config()),
            Err(BuildError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_get_never_has_body() {
        let endpoint = Endpoint::get("/users")
            .body(Body::text("ignored"))
            .form(MultipartForm::new().text("a", "b"));
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .body_parameter("device", "cli")
            .build();
        let request = build(&endpoint, &config).unwrap();

        assert!(request.body().is_none());
        assert!(request.header("Content-Type").is_none());
    }

    #[test]
    fn test_json_body_merges_defaults() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .body_parameter("device", "cli")
            .body_parameter("item", "default")
            .build();
        let endpoint = Endpoint::post("/orders").body(Body::json(&json!({"item": "widget"})).unwrap());
        let request = build(&endpoint, &config).unwrap();

        assert_eq!(request.header("Content-Type"), Some("application/json"));
        let body: Value = serde_json::from_slice(request.body().unwrap()).unwrap();
        assert_eq!(body, json!({"item": "widget", "device": "cli"}));
    }

    #[test]
    fn test_explicit_content_type_kept_for_body() {
        let endpoint = Endpoint::post("/orders")
            .header("Content-Type", "application/vnd.api+json")
            .body(Body::json(&json!({"a": 1})).unwrap());
        let request = build(&endpoint, &config()).unwrap();
        assert_eq!(
            request.header("Content-Type"),
            Some("application/vnd.api+json")
        );
    }

    #[test]
    fn test_form_content_type_always_overrides() {
        let form = MultipartForm::new().text("name", "value");
        let boundary = form.boundary().to_string();
        let endpoint = Endpoint::post("/upload")
            .header("Content-Type", "application/json")
            .form(form);
        let request = build(&endpoint, &config()).unwrap();

        assert_eq!(
            request.header("Content-Type"),
            Some(format!("multipart/form-data; boundary={boundary}").as_str())
        );
        assert!(request.body().is_some());
    }

    #[test]
    fn test_body_takes_priority_over_form() {
        let endpoint = Endpoint::put("/doc")
            .body(Body::text("plain"))
            .form(MultipartForm::new().text("a", "b"));
        let request = build(&endpoint, &config()).unwrap();

        assert_eq!(request.header("Content-Type"), Some("text/plain"));
        assert_eq!(&request.body().unwrap()[..], b"plain");
    }

    #[test]
    fn test_default_body_parameters_sent_as_json() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .body_parameter("device", "cli")
            .build();
        let request = build(&Endpoint::delete("/session"), &config).unwrap();

        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(&request.body().unwrap()[..], br#"{"device":"cli"}"#);
    }

    #[test]
    fn test_empty_form_is_rejected() {
        let endpoint = Endpoint::multipart("/upload", MultipartForm::new());
        assert!(matches!(
            build(&endpoint, &config()),
            Err(BuildError::InvalidFormData)
        ));
    }
}
