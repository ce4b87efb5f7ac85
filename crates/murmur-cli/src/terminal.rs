//! Line-based terminal I/O.
//!
//! [`TerminalPrompter`] asks for the identity before the session starts and
//! then becomes a [`TerminalDriver`], so both read the same buffered input.
//! The driver implements [`Driver`]: input lines and server frames in, plain
//! text lines out. Network uses the QUIC transport from `murmur-client`.

use std::io::Write;

use murmur_client::{
    Driver, DriverEvent, Prompter, RenderedMessageUnit, UserInput, transport::ConnectedClient,
};
use murmur_proto::Frame;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, Lines},
    sync::mpsc,
    task::AbortHandle,
};

use crate::{CliError, command::parse_line};

const LOADING_TEXT: &str = "Loading history...";
const READY_TEXT: &str = "Ready.";
const CLEARED_TEXT: &str = "-- history cleared --";

/// Identity prompts on a line-based terminal.
pub struct TerminalPrompter<R, W> {
    input: Lines<R>,
    out: W,
}

impl<R, W> TerminalPrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Prompt on `out`, read answers from `input`.
    pub fn new(input: R, out: W) -> Self {
        Self { input: input.lines(), out }
    }

    /// Hand the terminal over to the session driver.
    pub fn into_driver(self, client: ConnectedClient) -> TerminalDriver<R, W> {
        let (to_server, from_server, connection) = client.into_parts();
        TerminalDriver::with_channels(self.input, self.out, to_server, from_server)
            .with_connection(connection)
    }

    /// Print `prompt` and read one line. `None` on end of input.
    async fn ask(&mut self, prompt: &str) -> Option<String> {
        if let Err(error) = write!(self.out, "{prompt}").and_then(|()| self.out.flush()) {
            tracing::warn!(%error, "failed to write prompt");
        }

        match self.input.next_line().await {
            Ok(line) => line,
            Err(error) => {
                tracing::warn!(%error, "failed to read answer");
                None
            },
        }
    }
}

impl<R, W> Prompter for TerminalPrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    async fn prompt_secret(&mut self) -> Option<String> {
        self.ask("Shared secret: ").await
    }

    async fn prompt_name(&mut self) -> Option<String> {
        self.ask("Username: ").await
    }

    async fn confirm_change_name(&mut self, current: &str) -> bool {
        let prompt = format!("Your username is @{current}. Change it? [y/N] ");
        self.ask(&prompt).await.is_some_and(|answer| {
            let answer = answer.trim();
            answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
        })
    }

    fn alert(&mut self, message: &str) {
        if let Err(error) = writeln!(self.out, "{message}") {
            tracing::warn!(%error, "failed to write alert");
        }
    }
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// End of input counts as `/quit`.
pub struct TerminalDriver<R, W> {
    input: Lines<R>,
    out: W,
    to_server: mpsc::Sender<Frame>,
    from_server: mpsc::Receiver<Frame>,
    connection: Option<AbortHandle>,
}

impl<R, W> TerminalDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Driver over already-bridged frame channels.
    pub fn with_channels(
        input: Lines<R>,
        out: W,
        to_server: mpsc::Sender<Frame>,
        from_server: mpsc::Receiver<Frame>,
    ) -> Self {
        Self { input, out, to_server, from_server, connection: None }
    }

    /// Abort this connection task when the driver stops.
    #[must_use]
    pub fn with_connection(mut self, connection: AbortHandle) -> Self {
        self.connection = Some(connection);
        self
    }
}

impl<R, W> Driver for TerminalDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    type Error = CliError;

    async fn next_event(&mut self) -> Result<DriverEvent, Self::Error> {
        tokio::select! {
            biased;

            frame = self.from_server.recv() => {
                Ok(frame.map_or(DriverEvent::Disconnected, DriverEvent::Frame))
            }

            line = self.input.next_line() => {
                let input = line?.map_or(UserInput::Quit, |line| parse_line(&line));
                Ok(DriverEvent::Input(input))
            }
        }
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        self.to_server.send(frame).await.map_err(|_| CliError::ChannelSend)
    }

    fn render(&mut self, unit: &RenderedMessageUnit) -> Result<(), Self::Error> {
        writeln!(self.out, "{unit}")?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        writeln!(self.out, "{CLEARED_TEXT}")?;
        Ok(())
    }

    fn scroll_to_end(&mut self) -> Result<(), Self::Error> {
        self.out.flush()?;
        Ok(())
    }

    fn set_loading(&mut self, visible: bool) -> Result<(), Self::Error> {
        writeln!(self.out, "{}", if visible { LOADING_TEXT } else { READY_TEXT })?;
        self.out.flush()?;
        Ok(())
    }

    fn notify(&mut self, notice: &str) -> Result<(), Self::Error> {
        writeln!(self.out, "* {notice}")?;
        self.out.flush()?;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.abort();
        }
        let _ = self.out.flush();
    }
}

impl<R, W> Drop for TerminalDriver<R, W> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use murmur_client::{
        GateTrigger, HistoryGate, IdentityStore, MemoryNameStore, MessagePipeline, PskGateway,
        Runtime, SessionBootstrap, SessionConfig, Shutdown, SystemEnv,
    };
    use murmur_proto::{Opcode, Payload, PlaintextMessage};

    use super::*;

    type TestDriver = TerminalDriver<&'static [u8], Vec<u8>>;

    fn driver(input: &'static str) -> (TestDriver, mpsc::Sender<Frame>, mpsc::Receiver<Frame>) {
        let (to_server, sent) = mpsc::channel(16);
        let (inject, from_server) = mpsc::channel(16);
        let driver = TerminalDriver::with_channels(input.as_bytes().lines(), Vec::new(), to_server, from_server);
        (driver, inject, sent)
    }

    fn output(driver: &TestDriver) -> String {
        String::from_utf8(driver.out.clone()).unwrap()
    }

    #[tokio::test]
    async fn prompts_read_one_line_each() {
        let mut prompter = TerminalPrompter::new("s1 \nalice\n".as_bytes(), Vec::new());

        assert_eq!(prompter.prompt_secret().await, Some("s1 ".into()));
        assert_eq!(prompter.prompt_name().await, Some("alice".into()));
        assert_eq!(prompter.prompt_name().await, None);

        let shown = String::from_utf8(prompter.out).unwrap();
        assert!(shown.starts_with("Shared secret: Username: "));
    }

    #[tokio::test]
    async fn confirm_accepts_yes_only() {
        let mut prompter = TerminalPrompter::new("Y\nno\n\n".as_bytes(), Vec::new());

        assert!(prompter.confirm_change_name("alice").await);
        assert!(!prompter.confirm_change_name("alice").await);
        assert!(!prompter.confirm_change_name("alice").await);
        assert!(!prompter.confirm_change_name("alice").await);
    }

    #[tokio::test]
    async fn acquire_over_the_terminal() {
        let mut identities = IdentityStore::new(MemoryNameStore::with_name("alice"));
        let mut prompter = TerminalPrompter::new("s1\ny\nbob\n".as_bytes(), Vec::new());

        let session =
            SessionBootstrap::acquire(&mut identities, &mut prompter, SessionConfig::default())
                .await
                .unwrap();

        assert_eq!(session.identity().name(), "bob");
    }

    #[tokio::test]
    async fn blank_secret_alerts() {
        let mut identities = IdentityStore::new(MemoryNameStore::default());
        let mut prompter = TerminalPrompter::new("\n".as_bytes(), Vec::new());

        let result =
            SessionBootstrap::acquire(&mut identities, &mut prompter, SessionConfig::default())
                .await;

        assert!(result.is_err());
        let shown = String::from_utf8(prompter.out).unwrap();
        assert!(shown.contains("NO PASSWORD IS SET!"));
    }

    #[tokio::test]
    async fn server_frames_come_before_pending_input() {
        let (mut driver, inject, _sent) = driver("hello\n/name bob\n");
        inject.send(Frame::bare(Opcode::HistoryCleared)).await.unwrap();

        assert_eq!(
            driver.next_event().await.unwrap(),
            DriverEvent::Frame(Frame::bare(Opcode::HistoryCleared))
        );
        assert_eq!(
            driver.next_event().await.unwrap(),
            DriverEvent::Input(UserInput::Text("hello".into()))
        );
        assert_eq!(
            driver.next_event().await.unwrap(),
            DriverEvent::Input(UserInput::Rename("bob".into()))
        );
    }

    #[tokio::test]
    async fn end_of_input_quits() {
        let (mut driver, _inject, _sent) = driver("");

        assert_eq!(driver.next_event().await.unwrap(), DriverEvent::Input(UserInput::Quit));
    }

    #[tokio::test]
    async fn closed_transport_disconnects() {
        let (mut driver, inject, _sent) = driver("hello\n");
        drop(inject);

        assert_eq!(driver.next_event().await.unwrap(), DriverEvent::Disconnected);
    }

    #[tokio::test]
    async fn send_fails_once_transport_is_gone() {
        let (mut driver, _inject, sent) = driver("");
        drop(sent);

        let result = driver.send_frame(Frame::bare(Opcode::NewUser)).await;
        assert!(matches!(result, Err(CliError::ChannelSend)));
    }

    #[test]
    fn output_lines() {
        let (mut driver, _inject, _sent) = driver("");

        driver.set_loading(true).unwrap();
        driver.render(&RenderedMessageUnit::from_plaintext(PlaintextMessage::new("alice", "hi"))).unwrap();
        driver.render(&RenderedMessageUnit::placeholder()).unwrap();
        driver.clear().unwrap();
        driver.set_loading(false).unwrap();
        driver.notify("Password changed").unwrap();

        assert_eq!(
            output(&driver),
            "Loading history...\nalice : hi\nUSER : Encrypted Message\n-- history cleared --\nReady.\n* Password changed\n"
        );
    }

    #[tokio::test]
    async fn session_ends_when_transport_closes() {
        let (driver, inject, mut sent) = driver("hello\n!help\n");
        let identity = murmur_client::Identity::new(
            "alice",
            murmur_client::SharedSecret::new("s1").unwrap(),
        )
        .unwrap();
        let session = murmur_client::Session::new(identity, SessionConfig::default());
        let pipeline =
            MessagePipeline::new(session, PskGateway::new(SystemEnv::new()), HistoryGate::new());
        assert!(pipeline.gate().fire(GateTrigger::HistoryDelivered));
        drop(inject);

        let runtime = Runtime::new(
            driver,
            pipeline,
            IdentityStore::new(MemoryNameStore::default()),
            SystemEnv::new(),
        );
        let shutdown = runtime.run().await.unwrap();

        assert_eq!(shutdown, Shutdown::Disconnected);
        assert_eq!(Payload::from_frame(&sent.recv().await.unwrap()).unwrap(), Payload::NewUser);
    }
}
