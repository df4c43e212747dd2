//! Card channel: polling loop over the reader driver plus the allow-list.
//!
//! Every poll cycle runs request then anti-collision. Any driver failure —
//! bus error, timeout, short frame, protocol flags — means "no card this
//! cycle" and is retried on the next poll; nothing on this path is fatal.
//! If the reader chip cannot even be configured at startup, the channel
//! degrades to permanently reporting no card while the rest of the system
//! keeps running.

use crate::audit::{AccessEventKind, AccessLog};
use crate::signals::CredentialSignals;
use latchkey_core::constants::{CARD_POLL_INTERVAL, MSG_DENIED, MSG_GRANTED};
use latchkey_core::{CardUid, Channel};
use latchkey_hardware::{BeepPattern, FeedbackHandle, Led};
use latchkey_rfid::{Mfrc522, RegisterBus};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

/// How long the deny indicator stays lit after an unauthorized card.
const DENY_FLASH: Duration = Duration::from_millis(300);

/// Polling task owning the reader driver.
pub struct CardPoller<B> {
    reader: Mfrc522<B>,
    allowlist: HashSet<CardUid>,
    signals: Arc<CredentialSignals>,
    feedback: FeedbackHandle,
    audit: AccessLog,
}

impl<B: RegisterBus> CardPoller<B> {
    /// Wire the poller to its reader and shared groups.
    pub fn new(
        reader: Mfrc522<B>,
        allowlist: HashSet<CardUid>,
        signals: Arc<CredentialSignals>,
        feedback: FeedbackHandle,
        audit: AccessLog,
    ) -> Self {
        Self {
            reader,
            allowlist,
            signals,
            feedback,
            audit,
        }
    }

    /// Configure the chip and poll forever.
    pub async fn run(mut self) {
        match self.reader.reset_and_configure().await {
            Ok(version) => {
                info!(version = %format_args!("0x{version:02X}"), "card reader configured");
            }
            Err(e) => {
                // Degraded but not dead: polls against a broken bus fail
                // fast and keep reporting "no card".
                warn!(error = %e, "card reader init failed, card channel degraded");
            }
        }

        // Last UID seen while a card stayed in the field, to keep one
        // presentation from registering on every poll.
        let mut last_uid: Option<CardUid> = None;

        loop {
            self.poll_once(&mut last_uid).await;
            sleep(CARD_POLL_INTERVAL).await;
        }
    }

    async fn poll_once(&mut self, last_uid: &mut Option<CardUid>) {
        if let Err(e) = self.reader.request_a().await {
            trace!(error = %e, "no card");
            *last_uid = None;
            return;
        }

        let raw = match self.reader.anticollision_cl1().await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "anti-collision failed, treating as no card");
                *last_uid = None;
                return;
            }
        };
        if !raw.bcc_ok() {
            debug!("anti-collision checksum mismatch, discarding read");
            *last_uid = None;
            return;
        }

        let uid = CardUid::new(raw.uid);
        if *last_uid == Some(uid) {
            return;
        }
        *last_uid = Some(uid);

        info!(%uid, "card presented");
        self.feedback.beep(BeepPattern::Tick).await;

        if self.allowlist.contains(&uid) {
            info!(%uid, "card authorized");
            self.feedback.show(MSG_GRANTED.0, MSG_GRANTED.1).await;
            self.audit.record(AccessEventKind::CardAccepted { uid });
            self.signals.raise(Channel::Card);
        } else {
            warn!(%uid, "card not authorized");
            self.feedback.flash_led(Led::Denied, DENY_FLASH).await;
            self.feedback.show(MSG_DENIED.0, MSG_DENIED.1).await;
            self.audit.record(AccessEventKind::CardRejected { uid });
        }
    }
}
