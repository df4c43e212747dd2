//! Combination capture: quantization, settle detection, and sequencing.
//!
//! The dial produces a continuously varying raw reading. [`quantize`] maps
//! it onto discrete digits; [`ComboCapture`] is the pure state machine that
//! turns digit observations into committed entries (a digit must hold still
//! for the settle duration, and the dial must move between captures);
//! [`ComboCaptureLoop`] is the polling task that feeds it and drives
//! feedback.

use crate::audit::{AccessEventKind, AccessLog};
use crate::signals::CredentialSignals;
use crate::state::SharedState;
use latchkey_core::constants::{
    DIAL_LOG_INTERVAL, DIAL_POLL_INTERVAL, MAX_DIGIT, MAX_RAW_POSITION, MSG_COMBO_PROGRESS,
    MSG_DENIED, MSG_GRANTED,
};
use latchkey_core::{AccessConfig, Channel};
use latchkey_hardware::{BeepPattern, FeedbackHandle, Led, PositionDial};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// How long the deny indicator stays lit after a rejected combination.
const DENY_FLASH: Duration = Duration::from_millis(300);

/// Quantize a raw dial reading into one of `MAX_DIGIT + 1` equal buckets by
/// nearest-rounding.
#[must_use]
pub fn quantize(raw: u16) -> u8 {
    let raw = u32::from(raw.min(MAX_RAW_POSITION));
    let digit = (raw * u32::from(MAX_DIGIT) + u32::from(MAX_RAW_POSITION) / 2)
        / u32::from(MAX_RAW_POSITION);
    digit.min(u32::from(MAX_DIGIT)) as u8
}

/// Observable outcome of feeding one digit sample to [`ComboCapture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComboEvent {
    /// A digit settled and was appended to the buffer.
    DigitCaptured {
        digit: u8,
        entered: usize,
        total: usize,
    },
    /// The buffer reached the target length and matched.
    Accepted,
    /// The buffer reached the target length and did not match.
    Rejected,
}

/// Settle-and-sequence state machine for the combination buffer.
///
/// Rules, in order:
/// - a bucket change is movement: it restamps the settle window and re-arms
///   capture;
/// - a digit is captured when it has been stable for the settle duration,
///   the dial has moved since the previous capture, and nothing has been
///   captured in this settle window yet;
/// - a full buffer is compared element-wise against the target and cleared
///   on both outcomes.
#[derive(Debug)]
pub struct ComboCapture {
    target: Vec<u8>,
    entered: Vec<u8>,
    current_digit: u8,
    last_move_at: Instant,
    settle: Duration,
    captured_this_settle: bool,
    moved_since_capture: bool,
}

impl ComboCapture {
    /// Create an empty buffer targeting `target`, with the dial assumed at
    /// rest on digit 0.
    pub fn new(target: Vec<u8>, settle: Duration, now: Instant) -> Self {
        Self {
            target,
            entered: Vec::new(),
            current_digit: 0,
            last_move_at: now,
            settle,
            captured_this_settle: false,
            moved_since_capture: false,
        }
    }

    /// Drop any partial entry and require fresh movement before the next
    /// capture.
    pub fn reset(&mut self) {
        self.entered.clear();
        self.captured_this_settle = false;
        self.moved_since_capture = false;
    }

    /// Digits captured so far.
    pub fn entered(&self) -> &[u8] {
        &self.entered
    }

    /// Progress line for the display: captured digits followed by `#`
    /// placeholders, e.g. `3 6 #`.
    pub fn progress_line(&self) -> String {
        (0..self.target.len())
            .map(|i| match self.entered.get(i) {
                Some(d) => d.to_string(),
                None => "#".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Feed one quantized sample taken at `now`.
    pub fn observe(&mut self, digit: u8, now: Instant) -> Option<ComboEvent> {
        if digit != self.current_digit {
            // Movement: restart the settle window and allow a new capture.
            self.current_digit = digit;
            self.last_move_at = now;
            self.captured_this_settle = false;
            self.moved_since_capture = true;
            return None;
        }

        let settled = now.duration_since(self.last_move_at) >= self.settle;
        if !(self.moved_since_capture && !self.captured_this_settle && settled) {
            return None;
        }

        self.captured_this_settle = true;
        self.moved_since_capture = false;
        self.entered.push(self.current_digit);

        if self.entered.len() == self.target.len() {
            let accepted = self.entered == self.target;
            self.entered.clear();
            return Some(if accepted {
                ComboEvent::Accepted
            } else {
                ComboEvent::Rejected
            });
        }

        Some(ComboEvent::DigitCaptured {
            digit: self.current_digit,
            entered: self.entered.len(),
            total: self.target.len(),
        })
    }
}

/// Polling task around [`ComboCapture`].
pub struct ComboCaptureLoop<P> {
    dial: P,
    capture: ComboCapture,
    state: Arc<SharedState>,
    signals: Arc<CredentialSignals>,
    feedback: FeedbackHandle,
    audit: AccessLog,
}

impl<P: PositionDial> ComboCaptureLoop<P> {
    /// Wire the loop to its dial and shared groups.
    pub fn new(
        dial: P,
        config: &AccessConfig,
        state: Arc<SharedState>,
        signals: Arc<CredentialSignals>,
        feedback: FeedbackHandle,
        audit: AccessLog,
    ) -> Self {
        Self {
            dial,
            capture: ComboCapture::new(config.combo_target.clone(), config.settle, Instant::now()),
            state,
            signals,
            feedback,
            audit,
        }
    }

    /// Poll the dial forever.
    pub async fn run(mut self) {
        let mut last_logged_digit: Option<u8> = None;
        let mut last_log_at: Option<Instant> = None;

        loop {
            if self.state.take_combo_reset() {
                debug!("combination buffer reset on lock engagement");
                self.capture.reset();
            }

            match self.dial.read_raw().await {
                Ok(raw) => {
                    let digit = quantize(raw);
                    let now = Instant::now();

                    if Some(digit) != last_logged_digit
                        && last_log_at.is_none_or(|at| now.duration_since(at) >= DIAL_LOG_INTERVAL)
                    {
                        debug!(digit, raw, "dial position");
                        last_logged_digit = Some(digit);
                        last_log_at = Some(now);
                    }

                    if let Some(event) = self.capture.observe(digit, now) {
                        self.handle_event(event).await;
                    }
                }
                Err(e) => debug!(error = %e, "dial read failed, skipping cycle"),
            }

            sleep(DIAL_POLL_INTERVAL).await;
        }
    }

    async fn handle_event(&mut self, event: ComboEvent) {
        match event {
            ComboEvent::DigitCaptured {
                digit,
                entered,
                total,
            } => {
                info!(digit, entered, total, "combination digit captured");
                self.feedback.beep(BeepPattern::Tick).await;
                self.feedback
                    .show(MSG_COMBO_PROGRESS, self.capture.progress_line())
                    .await;
            }
            ComboEvent::Accepted => {
                info!("combination accepted");
                self.feedback.beep(BeepPattern::Granted).await;
                self.feedback.show(MSG_GRANTED.0, MSG_GRANTED.1).await;
                self.audit.record(AccessEventKind::ComboAccepted);
                self.signals.raise(Channel::Combo);
            }
            ComboEvent::Rejected => {
                warn!("combination rejected");
                self.feedback.beep(BeepPattern::Denied).await;
                self.feedback.flash_led(Led::Denied, DENY_FLASH).await;
                self.feedback.show(MSG_DENIED.0, MSG_DENIED.1).await;
                self.audit.record(AccessEventKind::ComboRejected);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SETTLE: Duration = Duration::from_millis(1200);

    /// Drive a settled capture of `digit`: move to it, then hold past the
    /// settle window.
    fn settle_digit(capture: &mut ComboCapture, digit: u8, now: &mut Instant) -> Option<ComboEvent> {
        assert!(capture.observe(digit, *now).is_none());
        *now += SETTLE;
        capture.observe(digit, *now)
    }

    #[rstest]
    #[case(0, 0)]
    #[case(4095, 10)]
    #[case(2048, 5)]
    #[case(205, 1)]
    #[case(180, 0)]
    fn test_quantize_nearest_rounding(#[case] raw: u16, #[case] digit: u8) {
        assert_eq!(quantize(raw), digit);
    }

    #[test]
    fn test_quantize_clamps_out_of_range() {
        assert_eq!(quantize(u16::MAX), 10);
    }

    #[test]
    fn test_quantize_bucket_centers_round_trip() {
        for digit in 0..=MAX_DIGIT {
            let raw =
                (u32::from(digit) * u32::from(MAX_RAW_POSITION) / u32::from(MAX_DIGIT)) as u16;
            assert_eq!(quantize(raw), digit);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_digit_captured_only_after_settle() {
        let mut now = Instant::now();
        let mut capture = ComboCapture::new(vec![3, 6, 4], SETTLE, now);

        assert!(capture.observe(3, now).is_none());
        now += Duration::from_millis(600);
        // Still inside the settle window.
        assert!(capture.observe(3, now).is_none());
        now += Duration::from_millis(600);
        assert_eq!(
            capture.observe(3, now),
            Some(ComboEvent::DigitCaptured {
                digit: 3,
                entered: 1,
                total: 3
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_duplicate_capture_within_one_settle_window() {
        let mut now = Instant::now();
        let mut capture = ComboCapture::new(vec![3, 6, 4], SETTLE, now);

        assert!(settle_digit(&mut capture, 3, &mut now).is_some());

        // Holding still much longer must not capture the digit again.
        now += SETTLE * 4;
        assert!(capture.observe(3, now).is_none());
        assert_eq!(capture.entered(), &[3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_movement_restarts_settle_window() {
        let mut now = Instant::now();
        let mut capture = ComboCapture::new(vec![3, 6, 4], SETTLE, now);

        assert!(capture.observe(3, now).is_none());
        now += Duration::from_millis(1000);
        // Bump to another bucket just before settling.
        assert!(capture.observe(4, now).is_none());
        now += Duration::from_millis(1000);
        // 3 never settled; 4 is not settled yet either at 1000ms.
        assert!(capture.entered().is_empty());
        now += Duration::from_millis(200);
        assert_eq!(
            capture.observe(4, now),
            Some(ComboEvent::DigitCaptured {
                digit: 4,
                entered: 1,
                total: 3
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_correct_sequence_accepts_and_clears() {
        let mut now = Instant::now();
        let mut capture = ComboCapture::new(vec![3, 6, 4], SETTLE, now);

        assert!(matches!(
            settle_digit(&mut capture, 3, &mut now),
            Some(ComboEvent::DigitCaptured { .. })
        ));
        assert!(matches!(
            settle_digit(&mut capture, 6, &mut now),
            Some(ComboEvent::DigitCaptured { .. })
        ));
        assert_eq!(settle_digit(&mut capture, 4, &mut now), Some(ComboEvent::Accepted));
        assert!(capture.entered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_sequence_rejects_and_clears() {
        let mut now = Instant::now();
        let mut capture = ComboCapture::new(vec![3, 6, 4], SETTLE, now);

        assert!(settle_digit(&mut capture, 3, &mut now).is_some());
        assert!(settle_digit(&mut capture, 6, &mut now).is_some());
        assert_eq!(settle_digit(&mut capture, 5, &mut now), Some(ComboEvent::Rejected));
        assert!(capture.entered().is_empty());

        // A fresh, correct entry still works afterwards.
        assert!(settle_digit(&mut capture, 3, &mut now).is_some());
        assert!(settle_digit(&mut capture, 6, &mut now).is_some());
        assert_eq!(settle_digit(&mut capture, 4, &mut now), Some(ComboEvent::Accepted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_digit_requires_leaving_the_bucket() {
        let mut now = Instant::now();
        let mut capture = ComboCapture::new(vec![6, 6], SETTLE, now);

        assert!(settle_digit(&mut capture, 6, &mut now).is_some());
        assert_eq!(capture.entered(), &[6]);

        // Leave and come back to enter the same digit again.
        assert!(capture.observe(5, now).is_none());
        now += Duration::from_millis(100);
        assert!(capture.observe(6, now).is_none());
        now += SETTLE;
        assert_eq!(capture.observe(6, now), Some(ComboEvent::Accepted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_drops_partial_entry() {
        let mut now = Instant::now();
        let mut capture = ComboCapture::new(vec![3, 6, 4], SETTLE, now);

        assert!(settle_digit(&mut capture, 3, &mut now).is_some());
        assert_eq!(capture.entered(), &[3]);

        capture.reset();
        assert!(capture.entered().is_empty());

        // After reset the held position must not re-capture without
        // movement.
        now += SETTLE * 2;
        assert!(capture.observe(3, now).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_line_masks_remaining_digits() {
        let mut now = Instant::now();
        let mut capture = ComboCapture::new(vec![3, 6, 4], SETTLE, now);
        assert_eq!(capture.progress_line(), "# # #");

        assert!(settle_digit(&mut capture, 3, &mut now).is_some());
        assert_eq!(capture.progress_line(), "3 # #");

        assert!(settle_digit(&mut capture, 6, &mut now).is_some());
        assert_eq!(capture.progress_line(), "3 6 #");
    }
}
