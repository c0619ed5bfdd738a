//! T.125 MCS - Multipoint Communication Service client layer for RDP
//!
//! This library implements the MCS connect sequence an RDP client runs after
//! X.224 negotiation: domain parameter negotiation, GCC conference creation,
//! user attachment and channel joins.
//!
//! # Quick Start
//!
//! ```rust
//! use bytes::Bytes;
//! use mcs::session::{ClientConfig, McsClient, McsEvent, Transport};
//!
//! struct Tpkt;
//!
//! impl Transport for Tpkt {
//!     fn write(&mut self, _data: Bytes) {}
//!     fn close(&mut self) {}
//! }
//!
//! let mut client = McsClient::new(ClientConfig::default(), Tpkt, |event: McsEvent| {
//!     if let McsEvent::Connected { user_id, channels } = event {
//!         println!("user {user_id} joined {} channels", channels.len());
//!     }
//! });
//!
//! // X.224 confirmed standard RDP security
//! client.on_connect(0);
//! ```
//!
//! # Features
//!
//! - **Zero-copy decoding** - inbound PDUs are sliced out of [`bytes::Bytes`]
//! - **Explicit state machine** - the session is advanced only by transport notifications
//! - **Closed capability set** - server data blocks decode into an exhaustive enum
//! - **Structured logging** - each session logs through `tracing` under its own id
//!
//! # Wire format
//!
//! BER for the connect PDUs, aligned PER for the domain PDUs and the T.124
//! GCC wrapper. See [`protocol`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;
pub mod session;

// Re-export commonly used types
pub use protocol::{ConnectInitial, ConnectResponse, DomainParameters, DomainPdu, Error, Result};
pub use session::{ClientConfig, McsChannelInfo, McsClient, McsEvent, SessionError, SessionState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
