//! MCS client session
//!
//! [`McsClient`] drives the connect sequence over a [`Transport`]:
//!
//! ```text
//! Connect-Initial        ->
//!                        <- Connect-Response
//! Erect Domain Request   ->
//! Attach User Request    ->
//!                        <- Attach User Confirm
//! Channel Join Request   ->   (once per channel)
//!                        <- Channel Join Confirm
//! ```
//!
//! and reports the outcome to an [`EventSink`].

mod channel;
mod client;
mod config;
mod error;
mod transport;

pub use channel::{ChannelRegistry, McsChannelInfo};
pub use client::{McsClient, SessionState};
pub use config::ClientConfig;
pub use error::{Result, SessionError};
pub use transport::{EventSink, McsEvent, Transport};
