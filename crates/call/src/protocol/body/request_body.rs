use bytes::Bytes;
use mime::Mime;

/// An immutable, cheaply cloneable request payload.
///
/// The core never looks into the bytes: it only carries them, together with their media
/// type, from whoever built the request to the transport that writes it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    content_type: Option<Mime>,
    bytes: Bytes,
}

impl RequestBody {
    pub fn new(content_type: Option<Mime>, bytes: impl Into<Bytes>) -> Self {
        Self { content_type, bytes: bytes.into() }
    }

    pub fn empty() -> Self {
        Self { content_type: None, bytes: Bytes::new() }
    }

    pub fn json(bytes: impl Into<Bytes>) -> Self {
        Self::new(Some(mime::APPLICATION_JSON), bytes)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Some(mime::TEXT_PLAIN_UTF_8), Bytes::from(text.into()))
    }

    pub fn form(encoded: impl Into<String>) -> Self {
        Self::new(Some(mime::APPLICATION_WWW_FORM_URLENCODED), Bytes::from(encoded.into()))
    }

    /// Replaces the media type, keeping the payload.
    #[must_use]
    pub fn with_content_type(self, content_type: Mime) -> Self {
        Self { content_type: Some(content_type), ..self }
    }

    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}
