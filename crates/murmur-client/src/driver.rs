//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] decouples the runtime from the concrete terminal and
//! transport. Each frontend implements it; the generic
//! [`Runtime`](crate::Runtime) handles all orchestration.

use std::future::Future;

use murmur_proto::Frame;

use crate::pipeline::RenderedMessageUnit;

/// A line of user intent, already classified by the frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    /// Chat text or a command-trigger line.
    Text(String),
    /// Change the display name.
    Rename(String),
    /// Replace the shared secret.
    ChangeSecret(String),
    /// Leave the session.
    Quit,
}

/// Something the driver observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// User input.
    Input(UserInput),
    /// A frame from the server.
    Frame(Frame),
    /// The transport closed; no more frames will arrive.
    Disconnected,
}

/// Abstracts I/O operations for the runtime.
///
/// # Cancel safety
///
/// [`next_event`](Driver::next_event) is raced against the history gate and
/// may be dropped before completing. Implementations must not lose an event
/// when that happens (reading from an `mpsc` receiver or a line reader is
/// fine).
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input line or server frame, in arrival order.
    fn next_event(&mut self) -> impl Future<Output = Result<DriverEvent, Self::Error>> + Send;

    /// Send a frame to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the send fails.
    fn send_frame(&mut self, frame: Frame) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Append a rendered message.
    fn render(&mut self, unit: &RenderedMessageUnit) -> Result<(), Self::Error>;

    /// Remove all rendered messages.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Scroll the message list to the latest entry.
    fn scroll_to_end(&mut self) -> Result<(), Self::Error>;

    /// Show or hide the loading indicator.
    fn set_loading(&mut self, visible: bool) -> Result<(), Self::Error>;

    /// Show a notice to the user.
    fn notify(&mut self, notice: &str) -> Result<(), Self::Error>;

    /// Stop the connection and clean up resources.
    fn stop(&mut self);
}
