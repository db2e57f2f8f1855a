// Unit tests for the update lifecycle controller.
// Transitions, Busy vs IllegalTransition, progress coalescing, event order.

use super::support::{FakeUpdateSource, drain};
use crate::channel::EventChannel;
use crate::error::HandlerError;
use crate::events::EventBus;
use crate::model::UpdateState;
use crate::update::UpdateController;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::Notify;

fn controller(source: FakeUpdateSource) -> (UpdateController, EventBus, Arc<FakeUpdateSource>) {
    let bus = EventBus::new();
    let source = Arc::new(source);
    let controller = UpdateController::new(source.clone(), bus.clone(), "1.0.0");
    (controller, bus, source)
}

fn states(payloads: Vec<serde_json::Value>) -> Vec<UpdateState> {
    payloads
        .into_iter()
        .map(|payload| serde_json::from_value(payload).unwrap())
        .collect()
}

/// **VALUE**: Walks the whole happy path and checks the exact broadcast sequence.
///
/// **WHY THIS MATTERS**: The UI renders the update banner purely from
/// `event:update:statusChanged`; a missing or reordered transition leaves it stuck.
///
/// **BUG THIS CATCHES**: Would catch progress events sneaking in after
/// ReadyToInstall, or sub-1% progress noise being broadcast.
#[tokio::test]
async fn given_newer_release_when_check_download_install_then_broadcasts_in_order() {
    // GIVEN: A feed with a newer release and a chunky download
    let (controller, bus, source) = controller(FakeUpdateSource {
        progress_steps: vec![0.005, 0.25, 0.255, 0.5, 0.4, 1.0],
        ..FakeUpdateSource::with_release("2.0.0")
    });
    let mut rx = bus.subscribe();

    // WHEN: Running check → download → install
    let checked = controller.check().await.unwrap();
    let (downloading, task) = controller.start_download().unwrap();
    task.await.unwrap();
    let installed = controller.install().await.unwrap();

    // THEN: Each call reports its own resulting state
    assert_eq!(checked, UpdateState::Available { version: "2.0.0".into() });
    assert_eq!(downloading, UpdateState::Downloading { progress: 0.0 });
    assert_eq!(installed, UpdateState::Idle);
    assert_eq!(source.install_calls.load(Ordering::SeqCst), 1);

    // AND: Subscribers saw every transition, once, in order
    let events = states(drain(&mut rx, EventChannel::UpdateStatusChanged));
    assert_eq!(
        events,
        vec![
            UpdateState::Checking,
            UpdateState::Available { version: "2.0.0".into() },
            UpdateState::Downloading { progress: 0.0 },
            UpdateState::Downloading { progress: 0.25 },
            UpdateState::Downloading { progress: 0.5 },
            UpdateState::ReadyToInstall,
            UpdateState::Installing,
            UpdateState::Idle,
        ]
    );
}

/// **VALUE**: Pins the happy-path event count when the source reports no
/// progress at all: five lifecycle events plus the single `Downloading`
/// entry at 0.0, which counts as the first progress report.
///
/// **BUG THIS CATCHES**: Would catch an extra lifecycle broadcast (say a
/// second `Idle` before `Checking`) or a lost `Installing`.
#[tokio::test]
async fn given_zero_progress_source_when_happy_path_then_five_status_events_and_one_progress_event() {
    // GIVEN: A newer release whose download reports no progress
    let (controller, bus, _source) = controller(FakeUpdateSource::with_release("2.0.0"));
    let mut rx = bus.subscribe();

    // WHEN: Running check → download → install
    controller.check().await.unwrap();
    let (_, task) = controller.start_download().unwrap();
    task.await.unwrap();
    controller.install().await.unwrap();

    // THEN: Exactly six frames: five status events around one progress event
    let events = states(drain(&mut rx, EventChannel::UpdateStatusChanged));
    let (progress, status): (Vec<UpdateState>, Vec<UpdateState>) = events
        .iter()
        .cloned()
        .partition(|state| matches!(state, UpdateState::Downloading { .. }));
    assert_eq!(events.len(), 6, "{events:?}");
    assert_eq!(
        status,
        vec![
            UpdateState::Checking,
            UpdateState::Available { version: "2.0.0".into() },
            UpdateState::ReadyToInstall,
            UpdateState::Installing,
            UpdateState::Idle,
        ]
    );
    assert_eq!(progress, vec![UpdateState::Downloading { progress: 0.0 }]);
    assert_eq!(events[2], UpdateState::Downloading { progress: 0.0 });
}

#[tokio::test]
async fn given_no_newer_release_when_check_then_up_to_date() {
    let (controller, _bus, _source) = controller(FakeUpdateSource::default());

    let state = controller.check().await.unwrap();

    assert_eq!(state, UpdateState::UpToDate);
    assert_eq!(controller.status(), UpdateState::UpToDate);
    assert!(controller.available().is_none());
}

/// **VALUE**: Verifies out-of-order requests are refused without touching state.
///
/// **BUG THIS CATCHES**: Would catch install being allowed from Idle, which
/// would hand a stale (or missing) artifact to the installer.
#[tokio::test]
async fn given_idle_when_download_or_install_then_illegal_transition() {
    // GIVEN: A fresh controller
    let (controller, bus, _source) = controller(FakeUpdateSource::with_release("2.0.0"));
    let mut rx = bus.subscribe();

    // WHEN: Skipping the check
    let download = controller.download();
    let install = controller.install().await;

    // THEN: Both are illegal and nothing was broadcast
    assert!(matches!(download, Err(HandlerError::IllegalTransition { .. })));
    assert!(matches!(install, Err(HandlerError::IllegalTransition { .. })));
    assert_eq!(controller.status(), UpdateState::Idle);
    assert!(drain(&mut rx, EventChannel::UpdateStatusChanged).is_empty());
}

#[tokio::test]
async fn given_available_when_check_again_then_illegal_transition() {
    let (controller, _bus, _source) = controller(FakeUpdateSource::with_release("2.0.0"));
    controller.check().await.unwrap();

    let result = controller.check().await;

    assert!(matches!(result, Err(HandlerError::IllegalTransition { .. })));
    assert_eq!(controller.status(), UpdateState::Available { version: "2.0.0".into() });
}

/// **VALUE**: A second check while one is running is Busy, not a second feed request.
///
/// **WHY THIS MATTERS**: Busy tells the UI to wait; IllegalTransition tells it
/// the action makes no sense. Mixing them up produces the wrong message.
#[tokio::test]
async fn given_check_in_flight_when_check_again_then_busy() {
    // GIVEN: A check parked inside the feed request
    let gate = Arc::new(Notify::new());
    let (controller, _bus, _source) = controller(FakeUpdateSource {
        check_gate: Some(gate.clone()),
        ..FakeUpdateSource::with_release("2.0.0")
    });
    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.check().await }
    });
    while controller.status() != UpdateState::Checking {
        tokio::task::yield_now().await;
    }

    // WHEN: Checking again
    let second = controller.check().await;

    // THEN: Rejected as Busy; the first check still completes
    assert!(matches!(second, Err(HandlerError::Busy { .. })));
    gate.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first, UpdateState::Available { version: "2.0.0".into() });
}

/// **VALUE**: Collaborator failures land in Failed with a user-facing reason.
///
/// **BUG THIS CATCHES**: Would catch internal error text ("feed unreachable",
/// file paths) leaking into the reason shown to the user.
#[tokio::test]
async fn given_feed_error_when_check_then_failed_with_generic_reason() {
    // GIVEN: A feed that errors
    let (controller, _bus, _source) = controller(FakeUpdateSource {
        fail_check: true,
        ..FakeUpdateSource::default()
    });

    // WHEN: Checking
    let result = controller.check().await;

    // THEN: The call fails and the state carries a sanitized reason
    assert!(matches!(result, Err(HandlerError::Collaborator(_))));
    let UpdateState::Failed { reason } = controller.status() else {
        panic!("expected Failed, got {}", controller.status());
    };
    assert!(reason.starts_with("Update check failed"));
    assert!(!reason.contains("feed unreachable"));
}

#[tokio::test]
async fn given_failed_when_check_then_passes_through_idle() {
    let (controller, bus, _source) = controller(FakeUpdateSource {
        fail_download: true,
        ..FakeUpdateSource::with_release("2.0.0")
    });
    controller.check().await.unwrap();
    let (_, task) = controller.start_download().unwrap();
    task.await.unwrap();
    assert!(matches!(controller.status(), UpdateState::Failed { .. }));
    let mut rx = bus.subscribe();

    controller.check().await.unwrap();

    let events = states(drain(&mut rx, EventChannel::UpdateStatusChanged));
    assert_eq!(events[0], UpdateState::Idle);
    assert_eq!(events[1], UpdateState::Checking);
}

#[tokio::test]
async fn given_up_to_date_when_reset_then_idle_and_reset_in_available_is_illegal() {
    let (idle, _bus, _source) = controller(FakeUpdateSource::default());
    idle.check().await.unwrap();
    assert_eq!(idle.reset().unwrap(), UpdateState::Idle);
    assert_eq!(idle.status(), UpdateState::Idle);

    let (available, _bus, _source) = controller(FakeUpdateSource::with_release("2.0.0"));
    available.check().await.unwrap();
    assert!(matches!(available.reset(), Err(HandlerError::IllegalTransition { .. })));
}

/// **VALUE**: A second install while the installer is running is Busy.
///
/// **BUG THIS CATCHES**: Would catch a double click launching the installer
/// twice, or the second request being misreported as IllegalTransition.
#[tokio::test]
async fn given_install_in_flight_when_install_again_then_busy() {
    // GIVEN: A downloaded release whose installer is parked
    let gate = Arc::new(Notify::new());
    let (controller, _bus, source) = controller(FakeUpdateSource {
        install_gate: Some(gate.clone()),
        ..FakeUpdateSource::with_release("2.0.0")
    });
    controller.check().await.unwrap();
    let (_, task) = controller.start_download().unwrap();
    task.await.unwrap();
    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.install().await }
    });
    while controller.status() != UpdateState::Installing {
        tokio::task::yield_now().await;
    }

    // WHEN: Installing (and checking) again
    let second = controller.install().await;
    let check = controller.check().await;

    // THEN: Both are Busy, and the installer ran once
    assert!(matches!(second, Err(HandlerError::Busy { .. })));
    assert!(matches!(check, Err(HandlerError::Busy { .. })));
    assert_eq!(controller.status(), UpdateState::Installing);

    // AND: The first install completes normally
    gate.notify_one();
    assert_eq!(first.await.unwrap().unwrap(), UpdateState::Idle);
    assert_eq!(source.install_calls.load(Ordering::SeqCst), 1);
}
