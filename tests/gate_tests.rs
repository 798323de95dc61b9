use portal_gate::{
    gate::{self, Destination, GateEffect, GateRender, GateState, LiveGate, RedirectTargets},
    models::{DenialReason, GateDecision, GateRequirement, Role, Session},
    session::{SessionSnapshot, SessionStore},
};
use uuid::Uuid;

const ADMIN_ID: Uuid = Uuid::from_u128(1);
const USER_ID: Uuid = Uuid::from_u128(2);

const ALL_REQUIREMENTS: [GateRequirement; 3] = [
    GateRequirement::None,
    GateRequirement::Authenticated,
    GateRequirement::Admin,
];

fn resolved(session: Session) -> SessionSnapshot {
    SessionSnapshot::Resolved(session)
}

// --- Pure Evaluation ---

#[test]
fn test_guest_is_sent_to_sign_in_for_every_gated_page() {
    for requirement in [GateRequirement::Authenticated, GateRequirement::Admin] {
        let outcome = gate::evaluate(requirement, &resolved(Session::guest()), "/chat");

        assert_eq!(outcome.state, GateState::Denied(DenialReason::Unauthenticated));
        assert_eq!(
            outcome.effect,
            Some(GateEffect::Redirect(Destination::SignIn {
                return_to: "/chat".to_string()
            }))
        );
        assert_eq!(
            outcome.decision(),
            Some(GateDecision::denied(DenialReason::Unauthenticated))
        );
    }
}

#[test]
fn test_user_is_forbidden_from_admin_pages_only() {
    let snapshot = resolved(Session::user(USER_ID));

    let admin = gate::evaluate(GateRequirement::Admin, &snapshot, "/admin/security");
    assert_eq!(admin.state, GateState::Denied(DenialReason::Forbidden));
    assert_eq!(
        admin.effect,
        Some(GateEffect::Redirect(Destination::Forbidden {
            attempted: "/admin/security".to_string()
        }))
    );

    for requirement in [GateRequirement::None, GateRequirement::Authenticated] {
        let outcome = gate::evaluate(requirement, &snapshot, "/matching");
        assert!(outcome.is_allowed());
        assert_eq!(outcome.effect, None);
    }
}

#[test]
fn test_admin_passes_every_gate() {
    let snapshot = resolved(Session::admin(ADMIN_ID));
    for requirement in ALL_REQUIREMENTS {
        let outcome = gate::evaluate(requirement, &snapshot, "/admin/system");
        assert_eq!(outcome.decision(), Some(GateDecision::allowed()));
    }
}

#[test]
fn test_ungated_pages_render_for_guests() {
    let outcome = gate::evaluate(GateRequirement::None, &resolved(Session::guest()), "/");
    assert!(outcome.is_allowed());
}

#[test]
fn test_resolving_session_neither_allows_nor_redirects() {
    for requirement in ALL_REQUIREMENTS {
        let first = gate::evaluate(requirement, &SessionSnapshot::Resolving, "/payments");
        let second = gate::evaluate(requirement, &SessionSnapshot::Resolving, "/payments");

        assert_eq!(first.state, GateState::Resolving);
        assert_eq!(first.effect, None);
        assert_eq!(first.decision(), None);
        assert_eq!(first, second);
    }
}

#[test]
fn test_inconsistent_session_never_passes_admin_gate() {
    // Hand-built: claims admin without being signed in.
    let session = Session {
        is_authenticated: false,
        role: Role::Admin,
        user_id: Some(ADMIN_ID),
        email: None,
        expires_at: None,
    };

    let decision = gate::decide(GateRequirement::Admin, &session);
    assert_eq!(decision, GateDecision::denied(DenialReason::Unauthenticated));
}

#[test]
fn test_identity_constructors_never_produce_authenticated_guests() {
    let session = Session::from_identity(USER_ID, Role::Guest);
    assert!(session.is_authenticated);
    assert_eq!(session.role, Role::User);

    let guest = Session::guest();
    assert!(!guest.is_authenticated);
    assert_eq!(guest.role, Role::Guest);
}

#[test]
fn test_directory_roles_never_infer_admin() {
    assert_eq!(Role::from_directory("admin"), Role::Admin);
    assert_eq!(Role::from_directory(" ADMIN "), Role::Admin);
    assert_eq!(Role::from_directory("student"), Role::User);
    assert_eq!(Role::from_directory("guest"), Role::User);
    assert_eq!(Role::from_directory(""), Role::User);
}

// --- Live Gates ---

#[tokio::test]
async fn test_live_gate_shows_only_loading_while_resolving() {
    let store = SessionStore::resolving();
    let mut gate = LiveGate::new(GateRequirement::Admin, "/admin/security", store.provider());

    assert_eq!(gate.render(), GateRender::Loading);
    assert_eq!(gate.render(), GateRender::Loading);
    assert_eq!(gate.state(), Some(GateState::Resolving));
}

#[tokio::test]
async fn test_resolving_then_admin_renders_loading_once_then_content_once() {
    let store = SessionStore::resolving();
    let mut gate = LiveGate::new(GateRequirement::Admin, "/admin/security", store.provider());

    let mut renders = vec![gate.render()];
    assert!(store.resolve(Session::admin(ADMIN_ID)));
    renders.push(gate.next_render().await.expect("store still alive"));

    assert_eq!(renders, vec![GateRender::Loading, GateRender::Content]);
    assert_eq!(gate.state(), Some(GateState::Allowed));
}

#[tokio::test]
async fn test_sign_out_while_displayed_transitions_to_denied() {
    let store = SessionStore::resolved(Session::admin(ADMIN_ID));
    let mut gate = LiveGate::new(GateRequirement::Admin, "/admin/system", store.provider());
    assert_eq!(gate.render(), GateRender::Content);

    assert!(store.sign_out());
    let render = gate.next_render().await.expect("store still alive");

    assert_eq!(
        render,
        GateRender::Redirect(Destination::SignIn {
            return_to: "/admin/system".to_string()
        })
    );
    assert_eq!(
        gate.state(),
        Some(GateState::Denied(DenialReason::Unauthenticated))
    );
}

#[tokio::test]
async fn test_demotion_while_displayed_redirects_to_forbidden() {
    let store = SessionStore::resolved(Session::admin(ADMIN_ID));
    let mut gate = LiveGate::new(GateRequirement::Admin, "/admin/system", store.provider());
    gate.render();

    store.resolve(Session::user(ADMIN_ID));

    assert_eq!(
        gate.next_render().await,
        Some(GateRender::Redirect(Destination::Forbidden {
            attempted: "/admin/system".to_string()
        }))
    );
}

#[tokio::test]
async fn test_unchanged_session_publishes_nothing() {
    let store = SessionStore::resolved(Session::guest());
    assert!(!store.sign_out());
    assert!(!store.resolve(Session::guest()));
    assert!(store.sign_in(Session::user(USER_ID)));
    assert!(!store.sign_in(Session::user(USER_ID)));
}

#[tokio::test]
async fn test_live_gate_ends_when_session_authority_is_dropped() {
    let store = SessionStore::resolving();
    let mut gate = LiveGate::new(GateRequirement::Authenticated, "/chat", store.provider());
    gate.render();

    drop(store);

    assert_eq!(gate.next_render().await, None);
}

#[tokio::test]
async fn test_providers_observe_without_mutating() {
    let store = SessionStore::resolving();
    let mut provider = store.provider();

    assert_eq!(provider.observe(), SessionSnapshot::Resolving);
    store.resolve(Session::user(USER_ID));

    assert!(provider.changed().await);
    assert_eq!(provider.snapshot(), resolved(Session::user(USER_ID)));
    assert_eq!(store.snapshot(), resolved(Session::user(USER_ID)));
}

// --- Redirect Locations ---

fn next_param(location: &str) -> String {
    let (_, query) = location.split_once('?').unwrap();
    let value = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("next="))
        .unwrap();
    urlencoding::decode(value).unwrap().into_owned()
}

#[test]
fn test_sign_in_location_round_trips_reserved_characters() {
    let targets = RedirectTargets::default();

    for return_to in ["/reports/q&a", "/docs#section", "/search?term=a b", "/admin/security"] {
        let location = targets.location(&Destination::SignIn {
            return_to: return_to.to_string(),
        });

        assert_eq!(location.matches('?').count(), 1, "{location}");
        assert!(!location.contains('#'), "{location}");
        assert_eq!(next_param(&location), return_to);
    }
}

#[test]
fn test_sign_in_location_extends_existing_query() {
    let targets = RedirectTargets::new("/sign-in?provider=sso", "/forbidden");

    let location = targets.location(&Destination::SignIn {
        return_to: "/chat".to_string(),
    });

    assert_eq!(location, "/sign-in?provider=sso&next=%2Fchat");
    assert_eq!(next_param(&location), "/chat");
}
