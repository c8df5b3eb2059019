mod client;
pub(crate) mod multipart;
mod outcome;

pub use {
    client::{DEFAULT_FIELD_NAME, UploadClient, UploadTarget, Uploader, parse_endpoint},
    multipart::{BOUNDARY_PREFIX, MultipartBody, encode},
    outcome::UploadOutcome,
};
