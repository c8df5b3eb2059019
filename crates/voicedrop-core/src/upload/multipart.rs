use uuid::Uuid;

/// Prefix of every boundary token.
pub const BOUNDARY_PREFIX: &str = "Boundary-";

/// An encoded `multipart/form-data` request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    /// Raw request body.
    pub body: Vec<u8>,
    /// Value for the `Content-Type` request header, carrying the boundary.
    pub content_type: String,
}

impl MultipartBody {
    /// The boundary token, as announced in [`Self::content_type`].
    pub fn boundary(&self) -> &str {
        self.content_type
            .split_once("boundary=")
            .map(|(_, boundary)| boundary)
            .unwrap_or_default()
    }
}

/// Serializes one file field into a `multipart/form-data` body.
///
/// The boundary is a fresh random token; the payload is not scanned for it.
pub fn encode(
    file_bytes: &[u8],
    file_name: &str,
    field_name: &str,
    content_type: &str,
) -> MultipartBody {
    let boundary = format!("{}{}", BOUNDARY_PREFIX, Uuid::new_v4().simple());

    encode_with_boundary(file_bytes, file_name, field_name, content_type, &boundary)
}

pub(crate) fn encode_with_boundary(
    file_bytes: &[u8],
    file_name: &str,
    field_name: &str,
    content_type: &str,
    boundary: &str,
) -> MultipartBody {
    let head = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{file_name}\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    );
    let tail = format!("\r\n--{boundary}--\r\n");

    let mut body = Vec::with_capacity(head.len() + file_bytes.len() + tail.len());
    body.extend_from_slice(head.as_bytes());
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(tail.as_bytes());

    MultipartBody {
        body,
        content_type: format!("multipart/form-data; boundary={}", boundary),
    }
}
