#![allow(clippy::doc_markdown)] // Allow technical terms like gRPC, TLS in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Hatchet Dispatcher Client
//!
//! Worker-side client for the Hatchet dispatcher: the long-lived protocol by
//! which a worker announces itself, receives assigned actions over a server
//! stream, and reports the lifecycle of each action back.
//!
//! ## Overview
//!
//! A worker registers once, gets a durable worker id, and opens one action
//! subscription keyed by that id. The [`ActionListener`] wraps the live
//! subscription and keeps it alive across transient disconnects, while step
//! events travel over separate unary calls.
//!
//! ## Module Organization
//!
//! - [`client`] - `DispatcherClient` façade (registration, subscription, events)
//! - [`listener`] - Action listener and its resubscribe state machine
//! - [`transport`] - Transport seam, error classification, gRPC implementation
//! - [`proto`] - Wire types and generated-style tonic client
//! - [`types`] - Domain types (assigned actions, action events, registration)
//! - [`config`] - Configuration loading (file, environment, overrides)
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//! - [`testing`] - Scripted in-memory transport for tests
//!
//! ## Failure Semantics
//!
//! - Registration or initial subscription failure is returned to the caller
//! - A cancelled stream ends the action stream cleanly
//! - An unavailable stream is resubscribed with a fixed delay and bounded attempts
//! - Any other stream error ends the action stream after surfacing the error once
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit + integration tests against the mock transport
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod listener;
pub mod logging;
pub mod proto;
pub mod testing;
pub mod transport;
pub mod types;

pub use client::DispatcherClient;
pub use config::{ClientConfig, ClientConfigOverrides, ListenerConfig, TlsConfig, TlsStrategy};
pub use error::{DispatcherError, DispatcherResult};
pub use listener::{ActionListener, ListenerState, ListenerStats, UnregisterHandle};
pub use transport::{
    classify_code, classify_status, ActionStream, DispatcherTransport, GrpcDispatcherTransport,
    TransportError, TransportErrorKind,
};
pub use types::{
    ActionEvent, ActionEventType, ActionType, AssignedAction, ListenerOptions, WorkerRegistration,
};
