//! Terminal results and payload decoding.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::{NetworkError, Request, Result};

/// Response metadata reported by the transport.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    status: StatusCode,
    headers: HeaderMap,
    url: url::Url,
}

impl ResponseHead {
    /// Create response metadata.
    pub fn new(status: StatusCode, headers: HeaderMap, url: url::Url) -> Self {
        Self {
            status,
            headers,
            url,
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the response URL.
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Get the content type if available.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

/// Terminal result of one logical request.
///
/// Carries the request and response metadata of the final attempt for
/// diagnostics. Either may be absent when the attempt never reached the
/// transport.
#[derive(Debug)]
pub struct Outcome<T> {
    /// Success payload or failure.
    pub result: Result<T>,
    /// Request of the final attempt.
    pub request: Option<Request>,
    /// Response metadata of the final attempt.
    pub response: Option<ResponseHead>,
}

impl<T> Outcome<T> {
    pub(crate) fn failure(
        error: NetworkError,
        request: Option<Request>,
        response: Option<ResponseHead>,
    ) -> Self {
        Self {
            result: Err(error),
            request,
            response,
        }
    }

    /// Check whether the request succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Transform the result, keeping the metadata.
    pub fn map_result<U>(self, f: impl FnOnce(Result<T>) -> Result<U>) -> Outcome<U> {
        Outcome {
            result: f(self.result),
            request: self.request,
            response: self.response,
        }
    }

    /// Consume the outcome and return the result.
    pub fn into_result(self) -> Result<T> {
        self.result
    }
}

impl Outcome<Bytes> {
    /// Decode the payload into `D`.
    pub fn decode<D: Decode>(self) -> Outcome<D> {
        self.map_result(D::decode)
    }
}

/// Conversion from the raw terminal result into a typed value.
pub trait Decode: Sized {
    /// Decode the payload of a terminal result.
    fn decode(payload: Result<Bytes>) -> Result<Self>;
}

/// Raw payload, passed through untouched.
impl Decode for Bytes {
    fn decode(payload: Result<Bytes>) -> Result<Self> {
        payload
    }
}

/// UTF-8 text payload.
impl Decode for String {
    fn decode(payload: Result<Bytes>) -> Result<Self> {
        let data = payload?;
        String::from_utf8(data.to_vec()).map_err(|_| NetworkError::DataToString { data })
    }
}

/// No payload expected: an empty response counts as success.
impl Decode for () {
    fn decode(payload: Result<Bytes>) -> Result<Self> {
        match payload {
            Ok(_) | Err(NetworkError::EmptyResponse) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// JSON payload decoded into `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwrap the decoded value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned> Decode for Json<T> {
    fn decode(payload: Result<Bytes>) -> Result<Self> {
        let data = payload?;
        serde_json::from_slice(&data).map(Json).map_err(|e| {
            tracing::debug!(error = %e, "Failed to decode JSON payload");
            NetworkError::ParsingFailed(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u32,
    }

    #[test]
    fn test_json_decode() {
        let user = Json::<User>::decode(Ok(Bytes::from_static(br#"{"id":7}"#))).unwrap();
        assert_eq!(user.into_inner(), User { id: 7 });

        let err = Json::<User>::decode(Ok(Bytes::from_static(b"nope"))).unwrap_err();
        assert!(matches!(err, NetworkError::ParsingFailed(_)));
    }

    #[test]
    fn test_string_decode() {
        assert_eq!(String::decode(Ok(Bytes::from_static(b"hi"))).unwrap(), "hi");

        let err = String::decode(Ok(Bytes::from_static(&[0xff, 0xfe]))).unwrap_err();
        match err {
            NetworkError::DataToString { data } => assert_eq!(&data[..], &[0xff, 0xfe]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unit_accepts_empty_response() {
        assert!(<()>::decode(Err(NetworkError::EmptyResponse)).is_ok());
        assert!(<()>::decode(Ok(Bytes::from_static(b"ignored"))).is_ok());
        assert!(matches!(
            <()>::decode(Err(NetworkError::Cancelled)),
            Err(NetworkError::Cancelled)
        ));
    }

    #[test]
    fn test_typed_decode_rejects_empty_response() {
        assert!(matches!(
            Json::<User>::decode(Err(NetworkError::EmptyResponse)),
            Err(NetworkError::EmptyResponse)
        ));
        assert!(matches!(
            String::decode(Err(NetworkError::EmptyResponse)),
            Err(NetworkError::EmptyResponse)
        ));
    }

    #[test]
    fn test_outcome_keeps_metadata() {
        let outcome: Outcome<Bytes> = Outcome {
            result: Ok(Bytes::from_static(b"42")),
            request: None,
            response: None,
        };
        let decoded = outcome.decode::<Json<u32>>();
        assert!(decoded.is_success());
        assert_eq!(decoded.into_result().unwrap(), Json(42));
    }
}
