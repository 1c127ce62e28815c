//! Integration tests for the encoder session timers and lifecycle
//!
//! All tests run on tokio's paused clock, so timer windows elapse
//! deterministically as the test sleeps.

use arcade_encoder::backend::MockHost;
use arcade_encoder::session::{Session, SessionError};
use arcade_encoder::{Axis, Button, InputEvent, Player, Timing};
use tokio::time::{sleep, Duration};

const SPECIAL: [u8; 2] = [0xE0, 0x00];
const FILLER: [u8; 2] = [0xFF, 0xFF];

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn attach(host: &mut MockHost) -> Session<arcade_encoder::backend::RecordingSink> {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    Session::attach(host, "test", Timing::default()).expect("attach succeeds")
}

#[tokio::test(start_paused = true)]
async fn test_filler_produces_no_events() {
    let mut host = MockHost::new();
    let session = attach(&mut host);

    for _ in 0..100 {
        session.receive(&FILLER);
    }
    sleep(ms(100)).await;

    assert!(host.events().is_empty());
    session.detach(&mut host).await;
}

#[tokio::test(start_paused = true)]
async fn test_filler_then_single_button() {
    let mut host = MockHost::new();
    let session = attach(&mut host);

    session.receive(&[0xFF, 0xFF, 0xC0, 0x80]);

    assert_eq!(host.events_for(Player::One), vec![InputEvent::press(Button::A)]);
    assert!(host.events_for(Player::Two).is_empty());
    session.detach(&mut host).await;
}

#[tokio::test(start_paused = true)]
async fn test_special_key_press_fires_once_and_releases_once() {
    let mut host = MockHost::new();
    let session = attach(&mut host);

    for _ in 0..40 {
        session.receive(&SPECIAL);
        sleep(ms(5)).await;
    }
    assert_eq!(host.events_for(Player::One), vec![InputEvent::press(Button::Mode)]);
    assert!(session.special_key_pressed());

    sleep(ms(13)).await;
    assert_eq!(
        host.events_for(Player::One),
        vec![InputEvent::press(Button::Mode), InputEvent::release(Button::Mode)]
    );
    assert!(!session.special_key_pressed());

    // Silence produces nothing further
    sleep(ms(200)).await;
    assert_eq!(host.events_for(Player::One).len(), 2);

    // A new special payload is a new press
    session.receive(&SPECIAL);
    assert_eq!(
        host.events_for(Player::One).last(),
        Some(&InputEvent::press(Button::Mode))
    );

    session.detach(&mut host).await;
}

#[tokio::test(start_paused = true)]
async fn test_idle_timeout_releases_everything() {
    let mut host = MockHost::new();
    let session = attach(&mut host);

    // P1: A + up, P2: B
    session.receive(&[0xC8, 0x80, 0xD0, 0x08]);
    host.clear_events();

    sleep(ms(25)).await;

    assert_eq!(
        host.events_for(Player::One),
        vec![
            InputEvent::Axis { axis: Axis::Vertical, value: 0 },
            InputEvent::release(Button::A),
        ]
    );
    assert_eq!(host.events_for(Player::Two), vec![InputEvent::release(Button::B)]);
    assert_eq!(host.syncs_for(Player::One), 1);
    assert_eq!(host.syncs_for(Player::Two), 1);
    assert!(session.player_state(Player::One).is_neutral());
    assert!(!session.idle_timer_armed());

    session.detach(&mut host).await;
}

#[tokio::test(start_paused = true)]
async fn test_repeated_frames_keep_inputs_held() {
    let mut host = MockHost::new();
    let session = attach(&mut host);

    for _ in 0..20 {
        session.receive(&[0xC0, 0x80]);
        sleep(ms(10)).await;
    }
    assert_eq!(host.events_for(Player::One), vec![InputEvent::press(Button::A)]);

    sleep(ms(15)).await;
    assert_eq!(
        host.events_for(Player::One),
        vec![InputEvent::press(Button::A), InputEvent::release(Button::A)]
    );

    session.detach(&mut host).await;
}

#[tokio::test(start_paused = true)]
async fn test_special_frames_do_not_keep_idle_timer_alive() {
    let mut host = MockHost::new();
    let session = attach(&mut host);

    session.receive(&[0xC0, 0x80]);
    for _ in 0..8 {
        session.receive(&SPECIAL);
        sleep(ms(5)).await;
    }

    // Idle fired at 20ms; the mode key is still refreshed so it stays down
    assert_eq!(
        host.events_for(Player::One),
        vec![
            InputEvent::press(Button::A),
            InputEvent::press(Button::Mode),
            InputEvent::release(Button::A),
        ]
    );
    assert!(session.special_key_pressed());

    sleep(ms(20)).await;
    assert_eq!(
        host.events_for(Player::One).last(),
        Some(&InputEvent::release(Button::Mode))
    );

    session.detach(&mut host).await;
}

#[tokio::test(start_paused = true)]
async fn test_neutral_frames_from_other_player_do_not_keep_stale_hold() {
    let mut host = MockHost::new();
    let session = attach(&mut host);

    session.receive(&[0xC0, 0x80]);
    for _ in 0..50 {
        session.receive(&[0xD0, 0x00]);
        sleep(ms(10)).await;
    }

    // P1 stopped confirming A after the first frame; idle releases it
    assert_eq!(
        host.events_for(Player::One),
        vec![InputEvent::press(Button::A), InputEvent::release(Button::A)]
    );
    assert!(session.player_state(Player::One).is_neutral());
    assert!(!session.idle_timer_armed());
    assert!(host.events_for(Player::Two).is_empty());

    session.detach(&mut host).await;
}

#[tokio::test(start_paused = true)]
async fn test_confirmed_hold_survives_other_player_traffic() {
    let mut host = MockHost::new();
    let session = attach(&mut host);

    for _ in 0..10 {
        session.receive(&[0xC0, 0x80, 0xD0, 0x00]);
        sleep(ms(10)).await;
    }
    assert_eq!(host.events_for(Player::One), vec![InputEvent::press(Button::A)]);

    sleep(ms(25)).await;
    assert_eq!(
        host.events_for(Player::One).last(),
        Some(&InputEvent::release(Button::A))
    );

    session.detach(&mut host).await;
}

#[tokio::test(start_paused = true)]
async fn test_up_to_down_flips_vertical_axis() {
    let mut host = MockHost::new();
    let session = attach(&mut host);

    session.receive(&[0xD8, 0x00]);
    session.receive(&[0xD4, 0x00]);

    assert_eq!(
        host.events_for(Player::Two),
        vec![
            InputEvent::Axis { axis: Axis::Vertical, value: -1 },
            InputEvent::Axis { axis: Axis::Vertical, value: 1 },
        ]
    );
    session.detach(&mut host).await;
}

#[tokio::test(start_paused = true)]
async fn test_unknown_tags_are_ignored() {
    let mut host = MockHost::new();
    let session = attach(&mut host);

    session.receive(&[0x0C, 0x81, 0xA5, 0xFF, 0xF0, 0x01]);
    sleep(ms(50)).await;

    assert!(host.events().is_empty());
    assert!(!session.idle_timer_armed());
    session.detach(&mut host).await;
}

#[tokio::test(start_paused = true)]
async fn test_detach_is_idempotent_and_stops_timers() {
    let mut host = MockHost::new();
    let session = attach(&mut host);
    assert_eq!(host.registered().len(), 2);

    session.receive(&[0xC0, 0x80]);
    session.receive(&SPECIAL);
    host.clear_events();

    session.detach(&mut host).await;
    assert!(host.registered().is_empty());

    // No timer reports after detach
    sleep(ms(100)).await;
    assert!(host.events().is_empty());

    session.detach(&mut host).await;
    assert!(!session.is_attached());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_session_releases_devices() {
    let mut host = MockHost::new();
    let session = attach(&mut host);
    assert_eq!(host.live_devices(), 2);

    session.detach(&mut host).await;
    drop(session);
    assert_eq!(host.live_devices(), 0);
}

#[tokio::test]
async fn test_allocation_failure_rolls_back() {
    let mut host = MockHost::new().with_allocation_failure(Player::Two);

    let result = Session::attach(&mut host, "test", Timing::default());
    match result {
        Err(SessionError::Allocation { device, .. }) => {
            assert_eq!(device, "PandoraClone Arcade encoder Player 2");
        }
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("attach should fail"),
    }

    assert_eq!(host.live_devices(), 0);
    assert!(host.registered().is_empty());
}

#[tokio::test]
async fn test_registration_failure_rolls_back() {
    let mut host = MockHost::new().with_registration_failure(Player::Two);

    let result = Session::attach(&mut host, "test", Timing::default());
    assert!(matches!(result, Err(SessionError::Registration { .. })));

    drop(result);
    assert_eq!(host.live_devices(), 0);
    assert!(host.registered().is_empty());
}
