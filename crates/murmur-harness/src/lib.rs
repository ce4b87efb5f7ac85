//! Deterministic simulation harness for murmur runtime testing.
//!
//! Drives the production [`murmur_client::Runtime`] against a scripted
//! [`SimDriver`], a seeded [`SimEnv`] and an in-memory relay ([`SimServer`]).
//! Combined with tokio's paused clock this makes timeout behavior exact and
//! every run reproducible.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_driver;
pub mod sim_env;
pub mod sim_server;

pub use sim_driver::{Output, SimDriver, SimDriverError, SimHandle, Transcript};
pub use sim_env::SimEnv;
pub use sim_server::{HistoryReply, SimServer};
