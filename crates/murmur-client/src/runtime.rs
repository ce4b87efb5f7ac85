//! Generic runtime for session orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`SessionBootstrap`]: announcement and readiness
//! - [`MessagePipeline`]: sends and receives
//! - [`Driver`]: platform-specific I/O
//!
//! The history gate wait and the driver's event stream are raced in one
//! `select!`, so live traffic and user input keep flowing while bootstrap is
//! still waiting for history. Frames are handled one at a time, to
//! completion, in arrival order.

use crate::{
    bootstrap::SessionBootstrap,
    driver::{Driver, DriverEvent, UserInput},
    env::Environment,
    gate::GateTrigger,
    gateway::CryptoGateway,
    identity::IdentityStore,
    pipeline::{MessagePipeline, PipelineAction},
};

/// Why the runtime stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// The user asked to leave.
    Quit,
    /// The transport closed.
    Disconnected,
}

/// Generic runtime that orchestrates bootstrap, pipeline, and driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `G`: Crypto gateway used by the pipeline
/// - `E`: Environment providing the history timer
pub struct Runtime<D, G, E> {
    driver: D,
    pipeline: MessagePipeline<G>,
    identities: IdentityStore,
    bootstrap: SessionBootstrap,
    env: E,
    loading: bool,
}

impl<D, G, E> Runtime<D, G, E>
where
    D: Driver,
    G: CryptoGateway,
    E: Environment,
{
    /// Create a runtime for an already-acquired session.
    pub fn new(
        driver: D,
        pipeline: MessagePipeline<G>,
        identities: IdentityStore,
        env: E,
    ) -> Self {
        Self {
            driver,
            pipeline,
            identities,
            bootstrap: SessionBootstrap::new(),
            env,
            loading: false,
        }
    }

    /// Run the session until the user quits or the transport closes.
    ///
    /// 1. Announce presence (`newuser`) and show the loading indicator
    /// 2. Race the history gate against driver events until the gate fires
    /// 3. Hide the loading indicator and keep processing events
    ///
    /// The driver is stopped on every exit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<Shutdown, D::Error> {
        let result = self.drive().await;
        self.driver.stop();
        result
    }

    async fn drive(&mut self) -> Result<Shutdown, D::Error> {
        let started = self.env.now();
        let announce = self.bootstrap.announce();
        self.execute(announce).await?;
        tracing::info!(name = self.pipeline.session().identity().name(), "joined, awaiting history");

        // The timer borrows its environment for as long as the loop runs.
        let env = self.env.clone();
        let gate = self.pipeline.gate().clone();
        let timer = env.sleep(self.pipeline.session().config().history_timeout);
        let ready = async move { gate.wait(timer).await };
        tokio::pin!(ready);

        loop {
            tokio::select! {
                biased;
                trigger = &mut ready, if !self.bootstrap.is_ready() => {
                    self.complete_bootstrap(trigger, started).await?;
                },
                event = self.driver.next_event() => match event? {
                    DriverEvent::Frame(frame) => {
                        let actions = self.pipeline.handle_frame(&frame).await;
                        self.execute(actions).await?;
                    },
                    DriverEvent::Input(UserInput::Quit) => {
                        tracing::info!("leaving session");
                        return Ok(Shutdown::Quit);
                    },
                    DriverEvent::Input(input) => self.handle_input(input).await?,
                    DriverEvent::Disconnected => {
                        tracing::info!("transport closed");
                        if !self.bootstrap.is_ready() {
                            let trigger = (&mut ready).await;
                            self.complete_bootstrap(trigger, started).await?;
                        }
                        return Ok(Shutdown::Disconnected);
                    },
                },
            }
        }
    }

    async fn complete_bootstrap(
        &mut self,
        trigger: GateTrigger,
        started: E::Instant,
    ) -> Result<(), D::Error> {
        let elapsed = self.env.now() - started;
        tracing::info!(?trigger, ?elapsed, "session ready");

        let actions = self.bootstrap.complete(trigger);
        self.execute(actions).await
    }

    async fn handle_input(&mut self, input: UserInput) -> Result<(), D::Error> {
        match input {
            UserInput::Text(raw) => {
                let actions = self.pipeline.send_text(&raw).await;
                self.execute(actions).await
            },
            UserInput::Rename(raw) => {
                let identity = self.pipeline.session_mut().identity_mut();
                match self.identities.set_name(identity, &raw) {
                    Ok(()) => {
                        let notice = format!("Username set to @{}", identity.name());
                        self.driver.notify(&notice)
                    },
                    Err(err) => {
                        tracing::warn!(%err, "rename rejected");
                        self.driver.notify(&format!("Username unchanged: {err}"))
                    },
                }
            },
            UserInput::ChangeSecret(raw) => {
                let identity = self.pipeline.session_mut().identity_mut();
                match self.identities.change_secret(identity, &raw) {
                    Ok(()) => self.driver.notify("Password changed"),
                    Err(err) => {
                        tracing::warn!(%err, "secret change rejected");
                        self.driver.notify(&format!("Password unchanged: {err}"))
                    },
                }
            },
            UserInput::Quit => Ok(()),
        }
    }

    async fn execute(&mut self, actions: Vec<PipelineAction>) -> Result<(), D::Error> {
        for action in actions {
            match action {
                PipelineAction::Send(frame) => self.driver.send_frame(frame).await?,
                PipelineAction::Render(unit) => self.driver.render(&unit)?,
                PipelineAction::ScrollToEnd => self.driver.scroll_to_end()?,
                PipelineAction::ClearMessages => self.driver.clear()?,
                PipelineAction::SetLoading(visible) => self.set_loading(visible)?,
                PipelineAction::Notify(notice) => self.driver.notify(&notice)?,
            }
        }
        Ok(())
    }

    /// Forward loading changes to the driver only on transitions.
    fn set_loading(&mut self, visible: bool) -> Result<(), D::Error> {
        if self.loading != visible {
            self.loading = visible;
            self.driver.set_loading(visible)?;
        }
        Ok(())
    }
}
