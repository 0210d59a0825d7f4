//! Blocking forms of the API clients.
//!
//! Each wrapper drives the async client on its own current-thread runtime,
//! so both forms share one implementation and put identical bytes on the
//! wire. Like `reqwest::blocking`, these must not be used from within an
//! async runtime.

use std::future::Future;
use std::path::Path;

use serde::Serialize;
use tokio::runtime::{Builder, Runtime};

use super::client::HttpOptions;
use super::types::UploadedFileRef;
use crate::crypto::PayloadCipher;
use crate::error::{Result, TransportError};
use crate::session::SessionState;

fn current_thread_runtime() -> Result<Runtime> {
    Ok(Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(TransportError::Runtime)?)
}

/// Blocking [`super::TransportClient`].
pub struct TransportClient {
    inner: super::TransportClient,
    runtime: Runtime,
}

impl TransportClient {
    pub fn new(
        endpoint: impl Into<String>,
        cipher: PayloadCipher,
        options: &HttpOptions,
    ) -> Result<Self> {
        let runtime = current_thread_runtime()?;
        let inner = super::TransportClient::new(endpoint, cipher, options)?;
        Ok(Self { inner, runtime })
    }

    /// Blocking [`super::TransportClient::send`].
    pub fn send<T: Serialize + ?Sized>(&self, envelope: &T) -> Result<String> {
        self.runtime.block_on(self.inner.send(envelope))
    }

    pub fn set_session_token(&self, token: impl Into<String>) {
        self.runtime.block_on(self.inner.set_session_token(token));
    }

    pub fn session(&self) -> SessionState {
        self.runtime.block_on(self.inner.session())
    }

    pub fn reset_session(&self) {
        self.runtime.block_on(self.inner.reset_session());
    }

    /// The async client this wrapper drives.
    pub fn get_ref(&self) -> &super::TransportClient {
        &self.inner
    }

    /// Run `future` to completion on this client's runtime.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Blocking [`super::UploadClient`].
pub struct UploadClient {
    inner: super::UploadClient,
    runtime: Runtime,
}

impl UploadClient {
    pub fn new(options: &HttpOptions) -> Result<Self> {
        let runtime = current_thread_runtime()?;
        let inner = super::UploadClient::new(options)?;
        Ok(Self { inner, runtime })
    }

    /// Blocking [`super::UploadClient::upload`].
    pub fn upload(
        &self,
        endpoint: &str,
        session_token: &str,
        path: &Path,
    ) -> Result<Vec<UploadedFileRef>> {
        self.runtime
            .block_on(self.inner.upload(endpoint, session_token, path))
    }

    pub fn get_ref(&self) -> &super::UploadClient {
        &self.inner
    }

    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
