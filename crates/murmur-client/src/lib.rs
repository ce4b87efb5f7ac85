//! Murmur client core
//!
//! The message synchronization and encryption pipeline: connection bootstrap,
//! the gate reconciling history replay with live traffic, per-message
//! encrypt/decrypt with failure isolation, and a generic runtime that runs
//! the same logic against a terminal in production and a scripted driver in
//! tests.
//!
//! # Components
//!
//! - [`IdentityStore`]: acquires the display name and shared secret
//! - [`CryptoGateway`]: encrypt/decrypt boundary ([`PskGateway`] ships)
//! - [`HistoryGate`]: single-fire latch opened by history or timeout
//! - [`MessagePipeline`]: outbound sends, inbound live and history receives
//! - [`SessionBootstrap`]: announce, wait, ready
//! - [`Driver`]: trait for platform-specific I/O
//! - [`Runtime`]: orchestration loop over a [`Driver`]
//!
//! # Flow
//!
//! ```text
//! IdentityStore ──► Session ──► Runtime ──newuser──► server
//!                                  │  ◄──history───
//!                                  │      │
//!                                  │  MessagePipeline ──► HistoryGate
//!                                  │                          │
//!                                  └──── ready ◄──────────────┘ (or timeout)
//! ```
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedClient`]: frame channels over one QUIC stream
//! - [`transport::connect`]: Connect to a server

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bootstrap;
mod driver;
pub mod env;
mod error;
mod gate;
mod gateway;
mod identity;
mod pipeline;
mod runtime;
mod session;

#[cfg(feature = "transport")]
pub mod transport;

pub use bootstrap::{BootstrapPhase, SessionBootstrap};
pub use driver::{Driver, DriverEvent, UserInput};
pub use env::{Environment, SystemEnv};
pub use error::{CryptoFailure, IdentityError};
pub use gate::{GateState, GateTrigger, HistoryGate};
pub use gateway::{CryptoGateway, PskGateway};
pub use identity::{Identity, IdentityStore, MemoryNameStore, NameStore, Prompter, SharedSecret};
pub use pipeline::{MessagePipeline, PipelineAction, RenderedMessageUnit};
pub use runtime::{Runtime, Shutdown};
pub use session::{Session, SessionConfig};
