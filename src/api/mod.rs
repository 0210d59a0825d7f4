//! API client module: the encrypted request transport, the multipart upload
//! client, and the request/response types they carry.

pub mod blocking;
pub mod client;
pub mod envelope;
pub mod types;
pub mod upload;

pub use client::{outbound_headers, HttpOptions, TransportClient, SESSION_KEY_HEADER, USER_AGENT};
pub use envelope::{Envelope, FolderCategory, InitiateRequest, ProcessVariable};
pub use types::{session_key_from_login, UploadResponse, UploadedFileRef};
pub use upload::UploadClient;
