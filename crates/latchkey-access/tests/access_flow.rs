//! End-to-end access flows over the full task set with mock hardware.
//!
//! Every test runs the real loops (door monitor, combination capture, card
//! poller, dispatcher, feedback worker) under a paused tokio clock and
//! scripts the physical world through the mock handles.

use latchkey_access::audit::AccessEventKind;
use latchkey_access::{AccessSystem, spawn_system};
use latchkey_core::{AccessConfig, AccessPolicy, CardUid, DoorState, LockState};
use latchkey_hardware::mock::{
    MockBuzzer, MockDial, MockDialHandle, MockDisplay, MockDisplayHandle, MockDoorContact,
    MockDoorHandle, MockLeds, MockLock, MockLockHandle,
};
use latchkey_rfid::mock::{MockChipBus, MockChipHandle};
use std::time::Duration;
use tokio::time::sleep;

const AUTHORIZED: [u8; 4] = [0xEA, 0xE8, 0xD2, 0x84];

struct World {
    system: AccessSystem,
    door: MockDoorHandle,
    dial: MockDialHandle,
    chip: MockChipHandle,
    lock: MockLockHandle,
    display: MockDisplayHandle,
}

fn boot(policy: AccessPolicy, door_closed: bool) -> World {
    boot_with(
        AccessConfig {
            policy,
            ..AccessConfig::default()
        },
        door_closed,
    )
}

fn boot_with(config: AccessConfig, door_closed: bool) -> World {
    let (contact, door) = MockDoorContact::new(door_closed);
    let (dial_device, dial) = MockDial::new();
    let (bus, chip) = MockChipBus::new();
    let (display_device, display) = MockDisplay::new();
    let (buzzer, _) = MockBuzzer::new();
    let (leds, _) = MockLeds::new();
    let (actuator, lock) = MockLock::new();

    let system = spawn_system(
        config,
        contact,
        dial_device,
        bus,
        display_device,
        buzzer,
        leds,
        actuator,
    )
    .expect("default config is valid");

    World {
        system,
        door,
        dial,
        chip,
        lock,
        display,
    }
}

/// Let the loops come up: boot lock, first door sample, reader init.
async fn settle_boot() {
    sleep(Duration::from_millis(400)).await;
}

/// Turn the dial to a digit and hold it through the settle window.
async fn enter_digit(dial: &MockDialHandle, digit: u8) {
    dial.turn_to_digit(digit);
    sleep(Duration::from_millis(1600)).await;
}

#[tokio::test(start_paused = true)]
async fn or_policy_card_unlocks_then_relocks_after_door_cycle() {
    let world = boot(AccessPolicy::Or, true);
    settle_boot().await;
    assert_eq!(world.system.state.lock_state(), LockState::Locked);
    assert_eq!(world.lock.is_locked(), Some(true));

    // Card alone unlocks immediately under OR.
    world.chip.present_card(AUTHORIZED);
    sleep(Duration::from_millis(500)).await;
    assert_eq!(world.system.state.lock_state(), LockState::Unlocked);
    assert_eq!(world.lock.is_locked(), Some(false));
    assert!(world.system.state.pending_relock());
    world.chip.remove_card();

    // Walk through: open, close, and the deferred re-lock lands 1s later.
    world.door.set_closed(false);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(world.system.state.door_state(), DoorState::Open);

    world.door.set_closed(true);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(world.system.state.lock_state(), LockState::Unlocked);

    sleep(Duration::from_millis(1200)).await;
    assert_eq!(world.system.state.lock_state(), LockState::Locked);
    assert_eq!(world.lock.is_locked(), Some(true));
    assert!(!world.system.state.pending_relock());

    let kinds = world.system.audit.kinds();
    let uid = CardUid::new(AUTHORIZED);
    assert!(kinds.contains(&AccessEventKind::CardAccepted { uid }));
    assert!(kinds.contains(&AccessEventKind::AccessGranted {
        via_card: true,
        via_combo: false,
    }));

    world.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn or_policy_combination_alone_unlocks() {
    let world = boot(AccessPolicy::Or, true);
    settle_boot().await;

    enter_digit(&world.dial, 3).await;
    enter_digit(&world.dial, 6).await;
    assert_eq!(world.system.state.lock_state(), LockState::Locked);

    enter_digit(&world.dial, 4).await;
    assert_eq!(world.system.state.lock_state(), LockState::Unlocked);

    assert!(
        world
            .system
            .audit
            .kinds()
            .contains(&AccessEventKind::ComboAccepted)
    );

    world.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn and_policy_needs_both_channels_and_unlocks_once() {
    let world = boot(AccessPolicy::And, true);
    settle_boot().await;

    // Card first: not sufficient.
    world.chip.present_card(AUTHORIZED);
    sleep(Duration::from_millis(600)).await;
    assert_eq!(world.system.state.lock_state(), LockState::Locked);

    // Combination second: the pair drains atomically and unlocks once.
    enter_digit(&world.dial, 3).await;
    enter_digit(&world.dial, 6).await;
    enter_digit(&world.dial, 4).await;
    assert_eq!(world.system.state.lock_state(), LockState::Unlocked);

    let grants = world
        .system
        .audit
        .kinds()
        .into_iter()
        .filter(|k| matches!(k, AccessEventKind::AccessGranted { .. }))
        .count();
    assert_eq!(grants, 1);

    world.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn wrong_combination_denies_then_fresh_entry_succeeds() {
    let world = boot(AccessPolicy::Or, true);
    settle_boot().await;

    enter_digit(&world.dial, 3).await;
    enter_digit(&world.dial, 6).await;
    enter_digit(&world.dial, 5).await;
    assert_eq!(world.system.state.lock_state(), LockState::Locked);
    assert!(
        world
            .system
            .audit
            .kinds()
            .contains(&AccessEventKind::ComboRejected)
    );

    // The buffer reset to empty: a full correct sequence is required and
    // suffices.
    enter_digit(&world.dial, 3).await;
    enter_digit(&world.dial, 6).await;
    enter_digit(&world.dial, 4).await;
    assert_eq!(world.system.state.lock_state(), LockState::Unlocked);

    world.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unauthorized_card_never_unlocks() {
    let world = boot(AccessPolicy::Or, true);
    settle_boot().await;

    world.chip.present_card([0x01, 0x02, 0x03, 0x04]);
    sleep(Duration::from_secs(2)).await;

    assert_eq!(world.system.state.lock_state(), LockState::Locked);
    let uid = CardUid::new([0x01, 0x02, 0x03, 0x04]);
    assert!(
        world
            .system
            .audit
            .kinds()
            .contains(&AccessEventKind::CardRejected { uid })
    );

    world.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unlock_deferred_while_door_open() {
    let world = boot(AccessPolicy::Or, false);
    settle_boot().await;
    // Fail-secure boot: bolt driven home even though the door reads open.
    assert_eq!(world.lock.is_locked(), Some(true));

    world.chip.present_card(AUTHORIZED);
    sleep(Duration::from_secs(1)).await;
    // Credential accepted, unlock deferred.
    assert_eq!(world.system.state.lock_state(), LockState::Locked);

    world.door.set_closed(true);
    sleep(Duration::from_millis(300)).await;
    assert_eq!(world.system.state.lock_state(), LockState::Unlocked);

    world.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn max_open_ceiling_relocks_with_door_closed_throughout() {
    let world = boot_with(
        AccessConfig {
            policy: AccessPolicy::Or,
            max_unlock_open: Duration::from_secs(10),
            ..AccessConfig::default()
        },
        true,
    );
    settle_boot().await;

    world.chip.present_card(AUTHORIZED);
    sleep(Duration::from_millis(500)).await;
    assert_eq!(world.system.state.lock_state(), LockState::Unlocked);
    world.chip.remove_card();

    // Door never opens; just before the ceiling nothing has changed.
    sleep(Duration::from_millis(9000)).await;
    assert_eq!(world.system.state.lock_state(), LockState::Unlocked);

    // At the ceiling the system re-engages without further credentials.
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(world.system.state.lock_state(), LockState::Locked);
    assert_eq!(world.lock.is_locked(), Some(true));

    world.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn display_shows_combination_progress() {
    let world = boot(AccessPolicy::Or, true);
    settle_boot().await;

    enter_digit(&world.dial, 3).await;
    assert_eq!(world.display.line(0).trim_end(), "CURRENT PASS:");
    assert_eq!(world.display.line(1).trim_end(), "3 # #");

    enter_digit(&world.dial, 6).await;
    assert_eq!(world.display.line(1).trim_end(), "3 6 #");

    world.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn lock_is_never_engaged_while_door_open() {
    let world = boot_with(
        AccessConfig {
            policy: AccessPolicy::Or,
            max_unlock_open: Duration::from_secs(2),
            ..AccessConfig::default()
        },
        true,
    );
    settle_boot().await;

    world.chip.present_card(AUTHORIZED);
    sleep(Duration::from_millis(500)).await;
    assert_eq!(world.system.state.lock_state(), LockState::Unlocked);
    world.chip.remove_card();

    // Door opens and stays open well past the max-open ceiling.
    world.door.set_closed(false);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(world.system.state.lock_state(), LockState::Unlocked);
    // The last actuation is still the release; nothing drove the bolt while
    // the door was open.
    assert_eq!(world.lock.is_locked(), Some(false));

    // Close: the overdue ceiling engages promptly.
    world.door.set_closed(true);
    sleep(Duration::from_millis(300)).await;
    assert_eq!(world.system.state.lock_state(), LockState::Locked);

    world.system.shutdown().await;
}
