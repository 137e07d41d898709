//! Multipart form bodies.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::error::BuildError;

#[derive(Debug, Clone, PartialEq)]
enum Field {
    Text {
        name: String,
        value: String,
    },
    Data {
        name: String,
        data: Bytes,
        file_name: Option<String>,
        mime_type: Option<String>,
    },
}

/// `multipart/form-data` body.
///
/// The boundary is chosen once when the form is created and used for every
/// field and the closing delimiter. Fields are written in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartForm {
    boundary: String,
    fields: Vec<Field>,
}

impl MultipartForm {
    /// Create an empty form with a fresh boundary.
    pub fn new() -> Self {
        Self {
            boundary: Uuid::new_v4().to_string(),
            fields: Vec::new(),
        }
    }

    /// Boundary separating the form fields.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Number of fields in the form.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the form has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Append a UTF-8 text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(Field::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a binary field.
    pub fn data(mut self, name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.fields.push(Field::Data {
            name: name.into(),
            data: data.into(),
            file_name: None,
            mime_type: None,
        });
        self
    }

    /// Append a file field with an optional MIME type.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Into<Bytes>,
        mime_type: Option<&str>,
    ) -> Self {
        self.fields.push(Field::Data {
            name: name.into(),
            data: data.into(),
            file_name: Some(file_name.into()),
            mime_type: mime_type.map(str::to_string),
        });
        self
    }

    /// `Content-Type` header value for this form.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Serialize the form into a request body.
    pub fn to_bytes(&self) -> Result<Bytes, BuildError> {
        if self.fields.is_empty() {
            return Err(BuildError::InvalidFormData);
        }

        let mut buf = BytesMut::new();
        for field in &self.fields {
            buf.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match field {
                Field::Text { name, value } => {
                    buf.put_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
                    );
                    buf.put_slice(b"Content-Type: text/plain; charset=UTF-8\r\n");
                    buf.put_slice(b"Content-Transfer-Encoding: 8bit\r\n\r\n");
                    buf.put_slice(value.as_bytes());
                }
                Field::Data {
                    name,
                    data,
                    file_name,
                    mime_type,
                } => {
                    let mut disposition = format!("form-data; name=\"{name}\"");
                    if let Some(file_name) = file_name {
                        disposition.push_str(&format!("; filename=\"{file_name}\""));
                    }
                    buf.put_slice(format!("Content-Disposition: {disposition}\r\n").as_bytes());
                    if let Some(mime_type) = mime_type {
                        buf.put_slice(format!("Content-Type: {mime_type}\r\n").as_bytes());
                    }
                    buf.put_slice(b"\r\n");
                    buf.put_slice(data);
                }
            }
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(format!("--{}--", self.boundary).as_bytes());

        Ok(buf.freeze())
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack
            .windows(needle.len())
            .filter(|window| *window == needle)
            .count()
    }

    #[test]
    fn test_boundary_is_unique_per_form() {
        assert_ne!(MultipartForm::new().boundary(), MultipartForm::new().boundary());
    }

    #[test]
    fn test_serialized_delimiters() {
        let form = MultipartForm::new()
            .text("title", "report")
            .data("blob", vec![0u8, 1, 2])
            .file("upload", "a.png", vec![0x89, b'P', b'N', b'G'], Some("image/png"));
        let bytes = form.to_bytes().unwrap();
        let delimiter = format!("--{}", form.boundary());

        // three field delimiters plus the terminator
        assert_eq!(count(&bytes, delimiter.as_bytes()), 4);
        assert!(bytes.ends_with(format!("--{}--", form.boundary()).as_bytes()));
    }

    #[test]
    fn test_field_order_is_preserved() {
        let form = MultipartForm::new()
            .text("first", "1")
            .text("second", "2")
            .text("third", "3");
        let bytes = form.to_bytes().unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        let first = text.find("name=\"first\"").unwrap();
        let second = text.find("name=\"second\"").unwrap();
        let third = text.find("name=\"third\"").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_file_field_headers() {
        let form = MultipartForm::new().file("doc", "notes.txt", "hi", Some("text/plain"));
        let text = String::from_utf8(form.to_bytes().unwrap().to_vec()).unwrap();

        assert!(text.contains("Content-Disposition: form-data; name=\"doc\"; filename=\"notes.txt\"\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n\r\nhi\r\n"));
    }

    #[test]
    fn test_empty_form_is_invalid() {
        assert!(matches!(
            MultipartForm::new().to_bytes(),
            Err(BuildError::InvalidFormData)
        ));
    }
}
