//! Serialized operator feedback: display, buzzer, and LEDs behind one task.
//!
//! Several control loops want to present output at once (the card poller, the
//! combination capture, the lock controller). Instead of sharing the devices
//! behind a mutex, all feedback flows through a single [`FeedbackWorker`]
//! task that owns them; producers hold a cheap cloneable [`FeedbackHandle`]
//! and send fire-and-forget commands. Partial display writes can therefore
//! never interleave.
//!
//! The worker also owns presentation policy that is not the control plane's
//! business: the idle prompt returns after a few seconds without activity,
//! and temporary splashes (e.g. `LOCKING...`) revert on their own.
//!
//! # Examples
//!
//! ```no_run
//! use latchkey_hardware::mock::{MockBuzzer, MockDisplay, MockLeds};
//! use latchkey_hardware::panel::FeedbackWorker;
//! use latchkey_hardware::types::BeepPattern;
//!
//! # async fn example() {
//! let (display, _) = MockDisplay::new();
//! let (buzzer, _) = MockBuzzer::new();
//! let (leds, _) = MockLeds::new();
//!
//! let (worker, feedback) =
//!     FeedbackWorker::new(display, buzzer, leds, "WELCOME, INPUT", "PASSWORD OR RFID");
//! tokio::spawn(worker.run());
//!
//! feedback.show("CURRENT PASS:", "3 # #").await;
//! feedback.beep(BeepPattern::Tick).await;
//! # }
//! ```

use crate::traits::{Buzzer, Display, StatusLeds};
use crate::types::{BeepPattern, INTER_TONE_GAP, Led};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, warn};

/// Character width of the panel display.
pub const DISPLAY_COLUMNS: usize = 16;

/// Inactivity interval after which the idle prompt is restored.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Queue depth for pending feedback commands.
const COMMAND_QUEUE_DEPTH: usize = 32;

/// A single fire-and-forget feedback request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FeedbackCommand {
    /// Replace both display lines; the idle prompt returns after
    /// [`IDLE_TIMEOUT`] without further activity.
    Show { line1: String, line2: String },

    /// Replace both display lines, reverting to the idle prompt after
    /// `duration`.
    ShowTemporary {
        line1: String,
        line2: String,
        duration: Duration,
    },

    /// Play a beep pattern.
    Beep(BeepPattern),

    /// Switch an LED on or off.
    Led { led: Led, on: bool },

    /// Pulse an LED on for `duration`, then off.
    FlashLed { led: Led, duration: Duration },
}

/// Cloneable sender half used by the control loops.
///
/// All methods are fire-and-forget: a closed or saturated worker drops the
/// command, the caller never observes feedback failures.
#[derive(Debug, Clone)]
pub struct FeedbackHandle {
    tx: mpsc::Sender<FeedbackCommand>,
}

impl FeedbackHandle {
    /// Show two display lines.
    pub async fn show(&self, line1: impl Into<String>, line2: impl Into<String>) {
        self.send(FeedbackCommand::Show {
            line1: line1.into(),
            line2: line2.into(),
        })
        .await;
    }

    /// Show two display lines, reverting to idle after `duration`.
    pub async fn show_temporary(
        &self,
        line1: impl Into<String>,
        line2: impl Into<String>,
        duration: Duration,
    ) {
        self.send(FeedbackCommand::ShowTemporary {
            line1: line1.into(),
            line2: line2.into(),
            duration,
        })
        .await;
    }

    /// Play a beep pattern.
    pub async fn beep(&self, pattern: BeepPattern) {
        self.send(FeedbackCommand::Beep(pattern)).await;
    }

    /// Switch an LED on or off.
    pub async fn led(&self, led: Led, on: bool) {
        self.send(FeedbackCommand::Led { led, on }).await;
    }

    /// Pulse an LED for `duration`.
    pub async fn flash_led(&self, led: Led, duration: Duration) {
        self.send(FeedbackCommand::FlashLed { led, duration }).await;
    }

    async fn send(&self, command: FeedbackCommand) {
        if self.tx.send(command).await.is_err() {
            debug!("feedback worker gone, command dropped");
        }
    }
}

/// Task that owns the feedback devices and drains the command queue.
pub struct FeedbackWorker<D, B, L> {
    display: D,
    buzzer: B,
    leds: L,
    rx: mpsc::Receiver<FeedbackCommand>,
    idle_line1: String,
    idle_line2: String,
    /// When to revert the display to the idle prompt, if a non-idle
    /// message is currently shown.
    revert_at: Option<Instant>,
}

impl<D, B, L> FeedbackWorker<D, B, L>
where
    D: Display,
    B: Buzzer,
    L: StatusLeds,
{
    /// Create a worker owning the three feedback devices, plus the handle
    /// the control loops use to reach it.
    pub fn new(
        display: D,
        buzzer: B,
        leds: L,
        idle_line1: impl Into<String>,
        idle_line2: impl Into<String>,
    ) -> (Self, FeedbackHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let worker = Self {
            display,
            buzzer,
            leds,
            rx,
            idle_line1: idle_line1.into(),
            idle_line2: idle_line2.into(),
            revert_at: None,
        };
        (worker, FeedbackHandle { tx })
    }

    /// Drain commands until every handle is dropped.
    ///
    /// Lights the status LED, shows the idle prompt, then serves commands,
    /// restoring the idle prompt whenever the revert deadline passes.
    pub async fn run(mut self) {
        if let Err(e) = self.leds.set(Led::Status, true).await {
            warn!(error = %e, "status LED unavailable");
        }
        self.show_idle().await;

        loop {
            let received = match self.revert_at {
                Some(at) => match timeout_at(at, self.rx.recv()).await {
                    Ok(received) => received,
                    Err(_) => {
                        self.show_idle().await;
                        continue;
                    }
                },
                None => self.rx.recv().await,
            };
            let Some(command) = received else { break };
            self.apply(command).await;
        }
    }

    async fn apply(&mut self, command: FeedbackCommand) {
        match command {
            FeedbackCommand::Show { line1, line2 } => {
                self.show_lines(&line1, &line2).await;
                self.revert_at = Some(Instant::now() + IDLE_TIMEOUT);
            }
            FeedbackCommand::ShowTemporary {
                line1,
                line2,
                duration,
            } => {
                self.show_lines(&line1, &line2).await;
                self.revert_at = Some(Instant::now() + duration);
            }
            FeedbackCommand::Beep(pattern) => self.play(pattern).await,
            FeedbackCommand::Led { led, on } => {
                if let Err(e) = self.leds.set(led, on).await {
                    warn!(%led, error = %e, "LED write failed");
                }
            }
            FeedbackCommand::FlashLed { led, duration } => {
                if let Err(e) = self.leds.set(led, true).await {
                    warn!(%led, error = %e, "LED write failed");
                    return;
                }
                sleep(duration).await;
                if let Err(e) = self.leds.set(led, false).await {
                    warn!(%led, error = %e, "LED write failed");
                }
            }
        }
    }

    async fn show_idle(&mut self) {
        let line1 = self.idle_line1.clone();
        let line2 = self.idle_line2.clone();
        self.show_lines(&line1, &line2).await;
        self.revert_at = None;
    }

    async fn show_lines(&mut self, line1: &str, line2: &str) {
        let line1 = pad_line(line1);
        let line2 = pad_line(line2);
        if let Err(e) = self.display.show(&line1, &line2).await {
            warn!(error = %e, "display write failed");
        }
    }

    async fn play(&mut self, pattern: BeepPattern) {
        for (i, (duration, intensity)) in pattern.tones().iter().enumerate() {
            if i > 0 {
                sleep(INTER_TONE_GAP).await;
            }
            if let Err(e) = self.buzzer.beep(*duration, *intensity).await {
                warn!(?pattern, error = %e, "buzzer write failed");
                return;
            }
        }
    }
}

/// Truncate or right-pad a line to the panel width.
fn pad_line(line: &str) -> String {
    format!("{line:<width$.width$}", width = DISPLAY_COLUMNS)
}
