use super::*;
use crate::state::test_helpers::{MeReply, MockSessionClient, RecordingNavigator};
use std::time::Duration;

fn session_with(client: MockSessionClient) -> (SessionState, Arc<MockSessionClient>, Arc<RecordingNavigator>) {
    let client = Arc::new(client);
    let navigator = Arc::new(RecordingNavigator::default());
    let state = SessionState::new(client.clone(), navigator.clone());
    (state, client, navigator)
}

// =============================================================
// Defaults
// =============================================================

#[test]
fn new_session_is_unknown_and_unauthenticated() {
    let (state, client, _) = session_with(MockSessionClient::signed_out());
    assert!(!state.is_authenticated());
    assert!(!state.is_restoring());
    assert_eq!(state.status(), AuthStatus::Unknown);
    assert_eq!(state.identity(), None);
    assert_eq!(state.last_probe(), None);
    assert_eq!(client.probes(), 0);
}

#[test]
fn set_user_sets_both_fields() {
    let (state, _, _) = session_with(MockSessionClient::signed_out());
    state.set_user(Identity::new("u9", "Zed"));
    assert!(state.is_authenticated());
    assert_eq!(state.status(), AuthStatus::Authenticated);
    assert_eq!(state.identity(), Some(Identity::new("u9", "Zed")));
}

#[test]
fn clones_share_state() {
    let (state, _, _) = session_with(MockSessionClient::signed_out());
    let other = state.clone();
    other.set_user(Identity::new("u1", "Ann"));
    assert!(state.is_authenticated());
}

// =============================================================
// restore_session
// =============================================================

#[tokio::test]
async fn restore_with_valid_cookie_sets_identity() {
    let (state, client, _) = session_with(MockSessionClient::signed_in("u1", "Ann"));
    state.restore_session().await;

    assert!(state.is_authenticated());
    assert_eq!(state.identity(), Some(Identity::new("u1", "Ann")));
    assert_eq!(state.last_probe(), Some(ProbeOutcome::Authenticated));
    assert!(!state.is_restoring());
    assert_eq!(client.probes(), 1);
}

#[tokio::test]
async fn restore_with_401_stays_unauthenticated() {
    let (state, _, _) = session_with(MockSessionClient::signed_out());
    state.restore_session().await;

    assert!(!state.is_authenticated());
    assert_eq!(state.status(), AuthStatus::Unauthenticated);
    assert_eq!(state.last_probe(), Some(ProbeOutcome::NoSession));
}

#[tokio::test]
async fn restore_when_unreachable_is_classified() {
    let (state, _, _) = session_with(MockSessionClient::new(MeReply::Unreachable));
    state.restore_session().await;

    assert_eq!(state.status(), AuthStatus::Unauthenticated);
    assert_eq!(state.last_probe(), Some(ProbeOutcome::Unreachable));
}

#[tokio::test]
async fn restore_with_server_error_is_unreachable() {
    let (state, _, _) = session_with(MockSessionClient::new(MeReply::Status(502)));
    state.restore_session().await;
    assert_eq!(state.last_probe(), Some(ProbeOutcome::Unreachable));
}

#[tokio::test]
async fn restore_is_noop_once_authenticated() {
    let (state, client, _) = session_with(MockSessionClient::signed_in("u1", "Ann"));
    state.restore_session().await;
    state.restore_session().await;
    state.restore_session().await;
    assert_eq!(client.probes(), 1);
}

#[tokio::test]
async fn restore_after_set_user_never_probes() {
    let (state, client, _) = session_with(MockSessionClient::signed_out());
    state.set_user(Identity::new("u1", "Ann"));
    state.restore_session().await;
    assert_eq!(client.probes(), 0);
    assert!(state.is_authenticated());
}

#[tokio::test]
async fn restore_retries_after_a_failed_probe() {
    let (state, client, _) = session_with(MockSessionClient::signed_out());
    state.restore_session().await;
    assert!(!state.is_authenticated());

    client.set_me(MeReply::User(Identity::new("u1", "Ann")));
    state.restore_session().await;
    assert!(state.is_authenticated());
    assert_eq!(client.probes(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_restores_share_one_probe() {
    let (state, client, _) = session_with(
        MockSessionClient::signed_in("u1", "Ann").with_delay(Duration::from_millis(500)),
    );

    let observed = async {
        tokio::task::yield_now().await;
        (state.is_restoring(), state.status())
    };
    let (_, _, _, (restoring, status)) = tokio::join!(
        state.restore_session(),
        state.restore_session(),
        state.restore_session(),
        observed,
    );

    assert!(restoring);
    assert_eq!(status, AuthStatus::Unknown);
    assert_eq!(client.probes(), 1);
    assert!(state.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn probe_resolving_after_logout_is_discarded() {
    let (state, client, navigator) = session_with(
        MockSessionClient::signed_in("u1", "Ann").with_delay(Duration::from_millis(500)),
    );

    let logout_soon = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        state.logout().await;
    };
    tokio::join!(state.restore_session(), logout_soon);

    assert_eq!(client.probes(), 1);
    assert!(!state.is_authenticated());
    assert_eq!(state.identity(), None);
    assert_eq!(state.status(), AuthStatus::Unauthenticated);
    assert_eq!(navigator.pushed(), vec![HOME_PATH.to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn probe_resolving_after_set_user_does_not_overwrite() {
    let (state, _, _) = session_with(
        MockSessionClient::signed_in("stale", "Old").with_delay(Duration::from_millis(500)),
    );

    let login_soon = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        state.set_user(Identity::new("fresh", "New"));
    };
    tokio::join!(state.restore_session(), login_soon);

    assert_eq!(state.identity(), Some(Identity::new("fresh", "New")));
}

// =============================================================
// logout
// =============================================================

#[tokio::test]
async fn logout_clears_identity_and_redirects_home() {
    let (state, client, navigator) = session_with(MockSessionClient::signed_in("u1", "Ann"));
    state.restore_session().await;
    assert!(state.is_authenticated());

    state.logout().await;

    assert_eq!(client.logouts(), 1);
    assert!(!state.is_authenticated());
    assert_eq!(state.status(), AuthStatus::Unauthenticated);
    assert_eq!(navigator.pushed(), vec![HOME_PATH.to_owned()]);
}

#[tokio::test]
async fn logout_server_error_still_clears_and_redirects() {
    let (state, client, navigator) =
        session_with(MockSessionClient::signed_in("u1", "Ann").with_logout_status(500));
    state.restore_session().await;

    state.logout().await;

    assert_eq!(client.logouts(), 1);
    assert!(!state.is_authenticated());
    assert_eq!(navigator.pushed(), vec![HOME_PATH.to_owned()]);
}

#[tokio::test]
async fn logout_when_signed_out_still_calls_server() {
    let (state, client, navigator) = session_with(MockSessionClient::signed_out());
    state.logout().await;
    assert_eq!(client.logouts(), 1);
    assert_eq!(navigator.pushed().len(), 1);
}

#[tokio::test]
async fn identity_is_all_or_nothing_across_lifecycle() {
    let (state, _, _) = session_with(MockSessionClient::signed_in("u1", "Ann"));
    let check = |state: &SessionState| {
        if let Some(identity) = state.identity() {
            assert!(!identity.id.is_empty());
            assert!(!identity.display_name.is_empty());
        }
    };

    check(&state);
    state.restore_session().await;
    check(&state);
    state.logout().await;
    check(&state);
    state.set_user(Identity::new("u2", "Bo"));
    check(&state);
}

#[tokio::test(start_paused = true)]
async fn logout_dropped_mid_request_still_clears() {
    let (state, client, navigator) = session_with(
        MockSessionClient::signed_in("u1", "Ann").with_logout_delay(Duration::from_millis(500)),
    );
    state.restore_session().await;
    assert!(state.is_authenticated());

    let timed_out = tokio::time::timeout(Duration::from_millis(100), state.logout()).await;

    assert!(timed_out.is_err());
    assert_eq!(client.logouts(), 1);
    assert!(!state.is_authenticated());
    assert_eq!(state.status(), AuthStatus::Unauthenticated);
    assert!(navigator.pushed().is_empty());
}

#[tokio::test]
async fn restore_with_other_client_error_is_no_session() {
    let (state, _, _) = session_with(MockSessionClient::new(MeReply::Status(404)));
    state.restore_session().await;

    assert_eq!(state.status(), AuthStatus::Unauthenticated);
    assert_eq!(state.last_probe(), Some(ProbeOutcome::NoSession));
}

#[tokio::test]
async fn restore_with_403_is_no_session() {
    let (state, _, _) = session_with(MockSessionClient::new(MeReply::Status(403)));
    state.restore_session().await;
    assert_eq!(state.last_probe(), Some(ProbeOutcome::NoSession));
}
