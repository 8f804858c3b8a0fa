//! # Dispatcher Transport
//!
//! The seam between the action listener and the wire. The listener and the
//! dispatcher client only ever talk to a [`DispatcherTransport`]; the gRPC
//! implementation lives in [`grpc`], and tests script their own through
//! [`crate::testing::MockDispatcherTransport`].
//!
//! Every failure crossing this boundary is classified once, here, into a
//! closed [`TransportErrorKind`] so the listener state machine branches on a
//! value rather than inspecting transport-specific error types.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::error::Error;
use std::fmt;
use std::io;

use crate::types::{
    ActionEvent, AssignedAction, WorkerListenRequest, WorkerRegisterRequest, WorkerRegistration,
    WorkerUnsubscribeRequest,
};

pub mod conversions;
pub mod grpc;

pub use grpc::{AuthInterceptor, GrpcDispatcherTransport};

/// Live server stream of assigned actions
pub type ActionStream = BoxStream<'static, Result<AssignedAction, TransportError>>;

/// Closed classification of transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The call was cancelled (unregister or shutdown in flight)
    Cancelled,
    /// Transient connectivity loss
    Unavailable,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Cancelled => write!(f, "cancelled"),
            TransportErrorKind::Unavailable => write!(f, "unavailable"),
            TransportErrorKind::Other => write!(f, "other"),
        }
    }
}

/// A classified transport failure carrying the original message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Cancelled, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Unavailable, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Other, message)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl Error for TransportError {}

/// Map a gRPC status code onto the listener's classification
pub fn classify_code(code: tonic::Code) -> TransportErrorKind {
    match code {
        tonic::Code::Cancelled => TransportErrorKind::Cancelled,
        tonic::Code::Unavailable => TransportErrorKind::Unavailable,
        _ => TransportErrorKind::Other,
    }
}

/// Classify a status by its code and, failing that, by what caused it.
///
/// A connection lost mid-call surfaces as `Unknown` or `Internal` with the
/// underlying h2 or io error as the status source. Such a status is transient
/// and classifies as unavailable. `Cancelled` is never reclassified.
pub fn classify_status(status: &tonic::Status) -> TransportErrorKind {
    match classify_code(status.code()) {
        TransportErrorKind::Other if is_connection_loss(status) => TransportErrorKind::Unavailable,
        kind => kind,
    }
}

fn is_connection_loss(status: &tonic::Status) -> bool {
    let mut source = Error::source(status);
    while let Some(error) = source {
        if let Some(h2_error) = error.downcast_ref::<h2::Error>() {
            if h2_error.is_io() || h2_error.is_go_away() {
                return true;
            }
        }
        if let Some(io_error) = error.downcast_ref::<io::Error>() {
            if is_connection_io_error(io_error.kind()) {
                return true;
            }
        }
        source = error.source();
    }
    false
}

fn is_connection_io_error(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::TimedOut
    )
}

/// Convert tonic Status to TransportError
impl From<tonic::Status> for TransportError {
    fn from(status: tonic::Status) -> Self {
        Self::new(classify_status(&status), status.message())
    }
}

/// Duplex RPC surface of the remote dispatcher.
///
/// `listen` returns as soon as the call is open; it does not wait for the
/// first assigned action. An implementation may bound how long it waits for
/// the open to be acknowledged and report any later open failure as the
/// first stream item instead.
#[async_trait]
pub trait DispatcherTransport: Send + Sync {
    async fn register(
        &self,
        request: WorkerRegisterRequest,
    ) -> Result<WorkerRegistration, TransportError>;

    async fn listen(&self, request: WorkerListenRequest) -> Result<ActionStream, TransportError>;

    async fn unsubscribe(&self, request: WorkerUnsubscribeRequest) -> Result<(), TransportError>;

    async fn send_step_action_event(&self, event: ActionEvent) -> Result<(), TransportError>;
}
