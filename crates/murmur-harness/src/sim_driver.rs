//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing, so the same [`murmur_client::Runtime`] code runs in
//! both production and simulation. Tests push input and frames through a
//! [`SimHandle`] and read back a [`Transcript`] of everything the runtime
//! asked the driver to do.

use std::sync::{Arc, Mutex, PoisonError};

use murmur_client::{Driver, DriverEvent, RenderedMessageUnit, UserInput};
use murmur_proto::{Frame, Payload};
use tokio::{sync::mpsc, time::Instant};

use crate::SimServer;

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// One thing the runtime asked the driver to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Frame sent to the server.
    Sent(Frame),
    /// Unit appended to the message list.
    Rendered(RenderedMessageUnit),
    /// Message list cleared.
    Cleared,
    /// Message list scrolled to the end.
    ScrolledToEnd,
    /// Loading indicator shown or hidden.
    Loading(bool),
    /// Notice shown to the user.
    Notice(String),
    /// Driver stopped.
    Stopped,
}

/// Timestamped record of driver outputs.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<(Instant, Output)>,
}

impl Transcript {
    /// All outputs in order.
    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.entries.iter().map(|(_, output)| output)
    }

    /// Frames sent to the server, in order.
    pub fn sent(&self) -> Vec<Frame> {
        self.outputs()
            .filter_map(|output| match output {
                Output::Sent(frame) => Some(frame.clone()),
                _ => None,
            })
            .collect()
    }

    /// Decoded payloads of sent frames, in order.
    pub fn sent_payloads(&self) -> Vec<Payload> {
        self.sent().iter().filter_map(|frame| Payload::from_frame(frame).ok()).collect()
    }

    /// Units currently on screen (everything rendered since the last clear).
    pub fn visible(&self) -> Vec<RenderedMessageUnit> {
        let mut visible = Vec::new();
        for output in self.outputs() {
            match output {
                Output::Rendered(unit) => visible.push(unit.clone()),
                Output::Cleared => visible.clear(),
                _ => {},
            }
        }
        visible
    }

    /// Loading indicator changes with the time they happened.
    pub fn loading_changes(&self) -> Vec<(Instant, bool)> {
        self.entries
            .iter()
            .filter_map(|(at, output)| match output {
                Output::Loading(visible) => Some((*at, *visible)),
                _ => None,
            })
            .collect()
    }

    /// Notices shown, in order.
    pub fn notices(&self) -> Vec<String> {
        self.outputs()
            .filter_map(|output| match output {
                Output::Notice(notice) => Some(notice.clone()),
                _ => None,
            })
            .collect()
    }

    /// True once the driver has been stopped.
    pub fn stopped(&self) -> bool {
        self.outputs().any(|output| *output == Output::Stopped)
    }

    fn record(&mut self, output: Output) {
        self.entries.push((Instant::now(), output));
    }
}

/// Test-side handle for injecting events and reading the transcript.
#[derive(Clone)]
pub struct SimHandle {
    events: mpsc::UnboundedSender<DriverEvent>,
    transcript: Arc<Mutex<Transcript>>,
}

impl SimHandle {
    /// Type a line of chat input.
    pub fn type_line(&self, text: &str) {
        self.inject(DriverEvent::Input(UserInput::Text(text.to_owned())));
    }

    /// Inject user input.
    pub fn input(&self, input: UserInput) {
        self.inject(DriverEvent::Input(input));
    }

    /// Inject a frame from the server.
    pub fn inject_frame(&self, frame: Frame) {
        self.inject(DriverEvent::Frame(frame));
    }

    /// Ask the runtime to leave.
    pub fn quit(&self) {
        self.input(UserInput::Quit);
    }

    /// Close the simulated transport.
    pub fn disconnect(&self) {
        self.inject(DriverEvent::Disconnected);
    }

    /// Snapshot of the transcript so far.
    pub fn transcript(&self) -> Transcript {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn inject(&self, event: DriverEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("runtime already finished, event dropped");
        }
    }
}

/// Simulation driver for deterministic testing.
///
/// With a [`SimServer`] attached, sent frames are handed to the relay and its
/// replies are queued as incoming frames behind anything already injected.
pub struct SimDriver {
    events: mpsc::UnboundedReceiver<DriverEvent>,
    loopback: mpsc::UnboundedSender<DriverEvent>,
    transcript: Arc<Mutex<Transcript>>,
    server: Option<SimServer>,
}

impl SimDriver {
    /// Driver with no server; frames only arrive by injection.
    pub fn new() -> (Self, SimHandle) {
        Self::build(None)
    }

    /// Driver connected to a simulated relay.
    pub fn with_server(server: SimServer) -> (Self, SimHandle) {
        Self::build(Some(server))
    }

    fn build(server: Option<SimServer>) -> (Self, SimHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transcript = Arc::new(Mutex::new(Transcript::default()));

        let driver =
            Self { events: rx, loopback: tx.clone(), transcript: Arc::clone(&transcript), server };
        (driver, SimHandle { events: tx, transcript })
    }

    fn record(&self, output: Output) {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner).record(output);
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn next_event(&mut self) -> Result<DriverEvent, Self::Error> {
        Ok(self.events.recv().await.unwrap_or(DriverEvent::Disconnected))
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        self.record(Output::Sent(frame.clone()));

        if let Some(server) = self.server.as_mut() {
            for reply in server.handle(&frame) {
                self.loopback
                    .send(DriverEvent::Frame(reply))
                    .map_err(|e| SimDriverError(format!("loopback closed: {e}")))?;
            }
        }
        Ok(())
    }

    fn render(&mut self, unit: &RenderedMessageUnit) -> Result<(), Self::Error> {
        self.record(Output::Rendered(unit.clone()));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.record(Output::Cleared);
        Ok(())
    }

    fn scroll_to_end(&mut self) -> Result<(), Self::Error> {
        self.record(Output::ScrolledToEnd);
        Ok(())
    }

    fn set_loading(&mut self, visible: bool) -> Result<(), Self::Error> {
        self.record(Output::Loading(visible));
        Ok(())
    }

    fn notify(&mut self, notice: &str) -> Result<(), Self::Error> {
        self.record(Output::Notice(notice.to_owned()));
        Ok(())
    }

    fn stop(&mut self) {
        self.record(Output::Stopped);
    }
}
