//! Backend lifecycle
//!
//! Turns parsed URIs into opened backends. Every backend taking part in a
//! diff must be able to filter and sort its entries; a backend that cannot is
//! rejected before any stream is opened.

use crate::config::BackendUri;
use crate::db::SqliteBackend;
use crate::error::{BackendError, BackendResult};
use crate::source::Backend;
use std::path::Path;
use tracing::{debug, warn};

/// An opened backend together with the URI it was opened from
pub struct OpenedBackend {
    pub uri: BackendUri,
    pub backend: Box<dyn Backend>,
}

/// Open the backend named by `uri`
pub fn open_backend(uri: &BackendUri, page_size: usize) -> BackendResult<Box<dyn Backend>> {
    let path = Path::new(&uri.location);

    match uri.scheme.as_str() {
        "sqlite" => {
            let backend = SqliteBackend::open(path, page_size).map_err(|e| with_uri(e, uri))?;
            Ok(Box::new(backend))
        }
        #[cfg(feature = "rocksdb")]
        "rocksdb" => {
            let backend =
                crate::rocksdb::RocksBackend::open(path).map_err(|e| with_uri(e, uri))?;
            Ok(Box::new(backend))
        }
        other => Err(BackendError::UnknownScheme {
            uri: uri.raw.clone(),
            scheme: other.to_string(),
        }),
    }
}

/// Open every URI in order and check each backend can filter
///
/// Backends opened before a failure are dropped before the error is returned.
pub fn open_backends(uris: &[BackendUri], page_size: usize) -> BackendResult<Vec<OpenedBackend>> {
    let mut opened = Vec::with_capacity(uris.len());

    for uri in uris {
        let backend = open_backend(uri, page_size)?;
        ensure_filter_support(uri, backend.as_ref())?;

        debug!(uri = %uri, backend = backend.name(), "Opened backend");
        opened.push(OpenedBackend {
            uri: uri.clone(),
            backend,
        });
    }

    Ok(opened)
}

/// Reject a backend that cannot filter/sort its entries
pub fn ensure_filter_support(uri: &BackendUri, backend: &dyn Backend) -> BackendResult<()> {
    if !backend.capabilities().filter {
        warn!(uri = %uri, backend = backend.name(), "Backend does not support filtering");
        return Err(BackendError::NoFilterSupport {
            uri: uri.raw.clone(),
        });
    }
    Ok(())
}

/// Report open failures against the URI the user typed
fn with_uri(err: BackendError, uri: &BackendUri) -> BackendError {
    match err {
        BackendError::OpenFailed { reason, .. } => BackendError::OpenFailed {
            uri: uri.raw.clone(),
            reason,
        },
        other => other,
    }
}
