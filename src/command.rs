//! One-shot commands triggered by the user.
//!
//! Setting the alarm, toggling a light and taking a photo are single
//! requests, not subscriptions.  They run on the poll runtime and report back
//! to the UI thread over an [`mpsc`] channel, which the main loop drains
//! every frame alongside the cell changes.
//!
//! Duplicate submissions are prevented on the UI side by a [`CommandGate`]
//! per control: while a control's request is outstanding, pressing it again
//! does nothing.

use std::collections::HashSet;
use std::sync::mpsc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{AlarmTime, ApiClient, Capture};
use crate::error::FetchOutcome;

/// A user action that maps to exactly one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    SetTimer(AlarmTime),
    TakeImage,
    Toggle(String),
}

/// What a successful command returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    TimerSet(AlarmTime),
    Captured(Capture),
    Toggled(String),
}

/// Sent back to the UI thread when a command finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub command: Command,
    pub outcome: FetchOutcome<Reply>,
}

impl CommandResult {
    /// Text for the card that issued the command.
    pub fn message(&self) -> String {
        match (&self.command, &self.outcome) {
            (_, Ok(Reply::TimerSet(time))) => format!("alarm set: {time}"),
            (_, Ok(Reply::Captured(capture))) => capture.message.clone(),
            (_, Ok(Reply::Toggled(device))) => format!("toggled {device}"),
            (Command::SetTimer(_), Err(e)) => format!("failed to set alarm: {e}"),
            (Command::TakeImage, Err(e)) => format!("failed to take image: {e}"),
            (Command::Toggle(device), Err(e)) => format!("failed to toggle {device}: {e}"),
        }
    }
}

/// Issues commands on the poll runtime.
#[derive(Clone)]
pub struct CommandRunner {
    api: ApiClient,
    runtime: Handle,
    results: mpsc::Sender<CommandResult>,
}

impl CommandRunner {
    pub fn new(api: ApiClient, runtime: Handle) -> (Self, mpsc::Receiver<CommandResult>) {
        let (results, rx) = mpsc::channel();
        (
            Self {
                api,
                runtime,
                results,
            },
            rx,
        )
    }

    /// Send `command`; its [`CommandResult`] arrives on the receiver.
    pub fn dispatch(&self, command: Command) -> JoinHandle<()> {
        let api = self.api.clone();
        let results = self.results.clone();
        self.runtime.spawn(async move {
            let outcome = execute(&api, &command).await;
            match &outcome {
                Ok(_) => info!(?command, "command ok"),
                Err(e) => warn!(?command, error = %e, "command failed"),
            }
            // The UI has gone away; nobody is waiting for the answer.
            let _ = results.send(CommandResult { command, outcome });
        })
    }
}

async fn execute(api: &ApiClient, command: &Command) -> FetchOutcome<Reply> {
    match command {
        Command::SetTimer(time) => {
            api.ack(&api.set_timer(*time)).await?;
            Ok(Reply::TimerSet(*time))
        }
        Command::TakeImage => {
            let body = api.fetch(&api.take_image()).await?;
            Ok(Reply::Captured(Capture::decode(body)?))
        }
        Command::Toggle(device) => {
            api.ack(&api.send_toggle(device)).await?;
            Ok(Reply::Toggled(device.clone()))
        }
    }
}

/// Tracks which controls have a request outstanding.
#[derive(Debug, Default)]
pub struct CommandGate {
    busy: HashSet<Command>,
}

impl CommandGate {
    /// Claim the control for `command`.  `false` if it is already busy.
    ///
    /// Toggles are gated per device; the timer submit ignores which time was
    /// entered, so a second submit waits for the first either way.
    pub fn try_begin(&mut self, command: &Command) -> bool {
        self.busy.insert(Self::control(command))
    }

    pub fn finish(&mut self, command: &Command) {
        self.busy.remove(&Self::control(command));
    }

    pub fn is_busy(&self, command: &Command) -> bool {
        self.busy.contains(&Self::control(command))
    }

    fn control(command: &Command) -> Command {
        match command {
            Command::SetTimer(_) => Command::SetTimer(AlarmTime::default()),
            other => other.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
