use super::*;
use crate::net::types::{User, UserType};
use crate::test_helpers::{Harness, RecordingNavigator, Reply, ScriptedTransport, admin, caretaker, elder};

fn settled(user: Option<User>) -> Session {
    let mut session = Session::anonymous();
    if let Some(user) = user {
        session.install(user, "tok".to_owned());
    }
    session
}

#[test]
fn loading_session_is_pending_everywhere() {
    let session = Session::hydrating();
    for path in ["/", "/login", "/elder", "/admin"] {
        assert_eq!(evaluate(&session, &Route::parse(path)), GuardDecision::Pending);
    }
}

#[test]
fn anonymous_visitor_is_sent_to_login() {
    let session = settled(None);
    assert_eq!(evaluate(&session, &Route::CaretakerDashboard), GuardDecision::Redirect(Route::Login));
    assert_eq!(evaluate(&session, &Route::Profile), GuardDecision::Redirect(Route::Login));
    assert_eq!(evaluate(&session, &Route::Root), GuardDecision::Redirect(Route::Login));
    assert!(should_redirect_unauth(&session, &Route::Bookings));
}

#[test]
fn public_routes_render_for_anyone() {
    for user in [None, Some(elder())] {
        let session = settled(user);
        assert_eq!(evaluate(&session, &Route::Login), GuardDecision::Render(Route::Login));
        assert_eq!(evaluate(&session, &Route::ResetPassword), GuardDecision::Render(Route::ResetPassword));
        assert!(!should_redirect_unauth(&session, &Route::Register));
    }
}

#[test]
fn matching_role_renders() {
    assert_eq!(
        evaluate(&settled(Some(elder())), &Route::ElderDashboard),
        GuardDecision::Render(Route::ElderDashboard)
    );
    assert_eq!(
        evaluate(&settled(Some(admin())), &Route::Appointments),
        GuardDecision::Render(Route::Appointments)
    );
}

#[test]
fn role_mismatch_goes_to_own_landing() {
    assert_eq!(
        evaluate(&settled(Some(elder())), &Route::AdminDashboard),
        GuardDecision::Redirect(Route::ElderDashboard)
    );
    assert_eq!(
        evaluate(&settled(Some(caretaker())), &Route::ElderDashboard),
        GuardDecision::Redirect(Route::CaretakerDashboard)
    );
    assert!(!should_redirect_unauth(&settled(Some(caretaker())), &Route::ElderDashboard));
}

#[test]
fn any_authenticated_user_may_open_shared_views() {
    for user in [elder(), caretaker(), admin()] {
        assert_eq!(evaluate(&settled(Some(user)), &Route::Payment), GuardDecision::Render(Route::Payment));
    }
}

#[test]
fn root_sends_users_to_their_dashboard() {
    assert_eq!(evaluate(&settled(Some(admin())), &Route::Root), GuardDecision::Redirect(Route::AdminDashboard));

    let family = User::new("9", "Kin", "kin@example.com", UserType::Other("Family".into()));
    let session = settled(Some(family));
    assert_eq!(evaluate(&session, &Route::Root), GuardDecision::Render(Route::Root));
    assert_eq!(evaluate(&session, &Route::ElderDashboard), GuardDecision::Redirect(Route::Root));
}

#[tokio::test]
async fn watched_route_redirects_after_logout() {
    let h = Harness::new(ScriptedTransport::new(|_, _| Reply::status(500)));
    h.manager.login(elder(), "tok-1".into()).unwrap();
    let navigator = Arc::new(RecordingNavigator::default());

    let handle = watch_route(h.manager.subscribe(), Route::ElderDashboard, navigator.clone());
    tokio::task::yield_now().await;
    assert!(navigator.paths().is_empty());

    h.manager.logout();
    handle.await.unwrap();

    let visits = navigator.visits();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].0, "/login");
    assert!(visits[0].1.replace);
}

#[tokio::test]
async fn watched_route_waits_for_hydration() {
    let h = Harness::new(ScriptedTransport::new(|_, _| Reply::status(500)));
    let navigator = Arc::new(RecordingNavigator::default());

    let handle = watch_route(h.manager.subscribe(), Route::Bookings, navigator.clone());
    tokio::task::yield_now().await;
    assert!(navigator.paths().is_empty());

    h.manager.hydrate().await;
    handle.await.unwrap();

    assert_eq!(navigator.paths(), vec!["/login".to_owned()]);
}
