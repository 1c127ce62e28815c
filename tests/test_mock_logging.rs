//! Test to verify the session logs through the mock backend correctly

use arcade_encoder::backend::MockHost;
use arcade_encoder::{Button, InputEvent, Player, Session, Timing};
use tokio::time::{sleep, Duration};

#[tokio::test(start_paused = true)]
async fn test_session_logs() {
    // Initialize a simple logger for testing
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();

    let mut host = MockHost::new();
    let session = Session::attach(&mut host, "test", Timing::default()).expect("attach succeeds");

    // These should log at debug/trace level (visible with RUST_LOG=trace)
    session.receive(&[0xFF, 0xFF, 0x30, 0x00, 0xC0, 0x40, 0xE0, 0x00]);
    sleep(Duration::from_millis(50)).await;

    assert_eq!(
        host.events_for(Player::One),
        vec![
            InputEvent::press(Button::X),
            InputEvent::press(Button::Mode),
            InputEvent::release(Button::Mode),
            InputEvent::release(Button::X),
        ]
    );

    session.detach(&mut host).await;
}
