use tracing::debug;

use crate::cards::Cards;
use crate::command::{Command, CommandGate, CommandResult, Reply};

/// Card that receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Timer,
    Camera,
    Iot,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Timer => Focus::Camera,
            Focus::Camera => Focus::Iot,
            Focus::Iot => Focus::Timer,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Focus::Timer => Focus::Iot,
            Focus::Camera => Focus::Timer,
            Focus::Iot => Focus::Camera,
        }
    }
}

pub struct App {
    pub cards: Cards,
    pub focus: Focus,
    /// Controls with a command outstanding.
    pub gate: CommandGate,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last command outcome, for the status bar.
    pub status: String,
}

impl App {
    pub fn new(cards: Cards) -> Self {
        Self {
            cards,
            focus: Focus::default(),
            gate: CommandGate::default(),
            quit: false,
            status: "Starting…".into(),
        }
    }

    /// Take new snapshots from every feed.
    pub fn refresh(&mut self) -> bool {
        self.cards.refresh()
    }

    // -- focus ---------------------------------------------------------------

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    // -- commands ------------------------------------------------------------

    /// The command behind `Enter` on the focused card, if its control is
    /// free.  Claims the control; [`App::apply_result`] releases it.
    pub fn activate(&mut self) -> Option<Command> {
        let command = match self.focus {
            Focus::Timer => self.cards.timer.submit(),
            Focus::Camera => Command::TakeImage,
            Focus::Iot => self.cards.iot.toggle()?,
        };
        if !self.gate.try_begin(&command) {
            debug!(?command, "control busy, ignoring");
            return None;
        }
        Some(command)
    }

    pub fn is_busy(&self, command: &Command) -> bool {
        self.gate.is_busy(command)
    }

    /// Release the control and show the outcome on the card that issued it.
    pub fn apply_result(&mut self, result: CommandResult) {
        self.gate.finish(&result.command);
        let message = result.message();
        match &result.command {
            Command::SetTimer(_) => self.cards.timer.message = Some(message.clone()),
            Command::TakeImage => {
                if let Ok(Reply::Captured(capture)) = &result.outcome {
                    self.cards.camera.last_capture = Some(capture.clone());
                }
                self.cards.camera.message = Some(message.clone());
            }
            Command::Toggle(_) => self.cards.iot.message = Some(message.clone()),
        }
        self.status = message;
    }
}
