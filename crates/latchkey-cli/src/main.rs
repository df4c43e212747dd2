//! Latchkey simulator: runs the full controller against mock hardware and
//! scripts one access cycle so the behavior can be watched in the logs.
//!
//! The access policy can be switched with `LATCHKEY_POLICY=and|or`; log
//! verbosity with `RUST_LOG` (e.g. `RUST_LOG=latchkey_access=debug`).

use anyhow::{Context, Result};
use latchkey_access::spawn_system;
use latchkey_core::{AccessConfig, AccessPolicy};
use latchkey_hardware::mock::{MockBuzzer, MockDial, MockDisplay, MockDoorContact, MockLeds, MockLock};
use latchkey_rfid::mock::MockChipBus;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AUTHORIZED: [u8; 4] = [0xEA, 0xE8, 0xD2, 0x84];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut config = AccessConfig::default();
    if let Ok(policy) = std::env::var("LATCHKEY_POLICY") {
        config.policy = policy
            .parse::<AccessPolicy>()
            .context("LATCHKEY_POLICY must be 'and' or 'or'")?;
    }
    info!(policy = %config.policy, version = latchkey_core::VERSION, "latchkey simulator starting");

    let (contact, door) = MockDoorContact::new(true);
    let (dial_device, _dial) = MockDial::new();
    let (bus, chip) = MockChipBus::new();
    let (display_device, display) = MockDisplay::new();
    let (buzzer, _) = MockBuzzer::new();
    let (leds, _) = MockLeds::new();
    let (actuator, _lock) = MockLock::new();

    let system = spawn_system(
        config,
        contact,
        dial_device,
        bus,
        display_device,
        buzzer,
        leds,
        actuator,
    )?;

    // Scripted cycle: badge in, walk through, door closes behind.
    sleep(Duration::from_secs(2)).await;
    info!("presenting authorized card {:02X?}", AUTHORIZED);
    chip.present_card(AUTHORIZED);
    sleep(Duration::from_secs(1)).await;
    chip.remove_card();

    sleep(Duration::from_secs(1)).await;
    info!("opening the door");
    door.set_closed(false);
    sleep(Duration::from_secs(2)).await;
    info!("closing the door");
    door.set_closed(true);

    // Give the deferred re-lock time to land, then report.
    sleep(Duration::from_secs(2)).await;
    info!(
        door = %system.state.door_state(),
        lock = %system.state.lock_state(),
        "final state"
    );
    let (line1, line2) = (display.line(0), display.line(1));
    info!("display: [{}] [{}]", line1, line2);
    for event in system.audit.events() {
        info!(at = %event.timestamp.format("%H:%M:%S%.3f"), "event: {:?}", event.kind);
    }

    system.shutdown().await;
    Ok(())
}
