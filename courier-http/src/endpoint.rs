//! Declarative endpoint descriptors.

use http::Method;

use crate::{Body, MultipartForm};

/// Description of one logical HTTP call.
///
/// An endpoint is a plain value: the client turns it into a fresh request for
/// every attempt, so the same endpoint can be sent any number of times.
///
/// ```
/// use courier_http::{Body, Endpoint};
///
/// let endpoint = Endpoint::post("/orders")
///     .header("X-Trace", "abc")
///     .query("dry_run", true)
///     .body(Body::json(&serde_json::json!({"item": "widget"})).unwrap());
///
/// assert_eq!(endpoint.path(), "/orders");
/// ```
#[derive(Debug, Clone)]
pub struct Endpoint {
    path: String,
    is_full_path: bool,
    method: Method,
    headers: Vec<(String, String)>,
    use_endpoint_headers_only: bool,
    query_parameters: Vec<(String, String)>,
    body: Option<Body>,
    form: Option<MultipartForm>,
    allow_middlewares: bool,
}

impl Endpoint {
    /// Create an endpoint for the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_full_path: false,
            method,
            headers: Vec::new(),
            use_endpoint_headers_only: false,
            query_parameters: Vec::new(),
            body: None,
            form: None,
            allow_middlewares: true,
        }
    }

    /// GET endpoint.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST endpoint.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT endpoint.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// PATCH endpoint.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// DELETE endpoint.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// HEAD endpoint.
    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Method::HEAD, path)
    }

    /// POST endpoint carrying a multipart form.
    pub fn multipart(path: impl Into<String>, form: MultipartForm) -> Self {
        Self::post(path).form(form)
    }

    /// Treat the path as a complete URL instead of appending it to the base URL.
    pub fn full_path(mut self) -> Self {
        self.is_full_path = true;
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Send only this endpoint's headers, skipping the configured ones.
    pub fn endpoint_headers_only(mut self) -> Self {
        self.use_endpoint_headers_only = true;
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query_parameters.push((key.into(), value.to_string()));
        self
    }

    /// Add multiple query parameters.
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (k, v) in params {
            self.query_parameters.push((k.into(), v.to_string()));
        }
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the multipart form.
    pub fn form(mut self, form: MultipartForm) -> Self {
        self.form = Some(form);
        self
    }

    /// Skip middlewares for this endpoint.
    pub fn without_middlewares(mut self) -> Self {
        self.allow_middlewares = false;
        self
    }

    /// Set bearer authentication.
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.into()))
    }

    /// Set basic authentication.
    pub fn basic_auth(
        self,
        username: impl Into<String>,
        password: Option<impl Into<String>>,
    ) -> Self {
        use base64::Engine;
        let credentials = match password {
            Some(p) => format!("{}:{}", username.into(), p.into()),
            None => format!("{}:", username.into()),
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        self.header("Authorization", format!("Basic {}", encoded))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_full_path(&self) -> bool {
        self.is_full_path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn use_endpoint_headers_only(&self) -> bool {
        self.use_endpoint_headers_only
    }

    pub fn query_parameters(&self) -> &[(String, String)] {
        &self.query_parameters
    }

    pub fn body_ref(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn form_ref(&self) -> Option<&MultipartForm> {
        self.form.as_ref()
    }

    pub fn allow_middlewares(&self) -> bool {
        self.allow_middlewares
    }
}
