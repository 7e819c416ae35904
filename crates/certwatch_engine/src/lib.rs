//! Certwatch engine: certificate checkers, the background check runner and
//! the snapshot blob store.
mod cert;
mod checker;
mod endpoint;
mod engine;
mod persist;
mod tls;
mod types;

pub use cert::leaf_not_after;
pub use checker::{CheckSettings, Checker, DEFAULT_CHECK_TIMEOUT};
pub use endpoint::EndpointChecker;
pub use engine::{ChannelEventSink, EngineHandle, EventSink};
pub use persist::{ensure_state_dir, BlobStore, FileBlobStore, MemoryBlobStore, PersistError};
pub use tls::{install_crypto_provider, CertProbe, TlsChecker};
pub use types::{CheckError, EngineError, EngineEvent, FailureKind};
