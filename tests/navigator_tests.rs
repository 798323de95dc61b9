use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use portal_gate::{
    features::FeatureSlot,
    gate::RedirectTargets,
    models::{Chrome, GateRequirement, Session},
    navigator::{NavigationError, Navigator, ScreenView},
    pages::{PageDescriptor, PageRegistry},
    session::SessionStore,
};
use uuid::Uuid;

const ADMIN_ID: Uuid = Uuid::from_u128(10);
const USER_ID: Uuid = Uuid::from_u128(20);

/// Slot that counts how often it was rendered.
struct CountingSlot {
    renders: AtomicUsize,
}

impl CountingSlot {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            renders: AtomicUsize::new(0),
        })
    }

    fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl FeatureSlot for CountingSlot {
    fn name(&self) -> &str {
        "counting"
    }

    fn render(&self) -> String {
        self.renders.fetch_add(1, Ordering::SeqCst);
        "<p>secret dashboard</p>".to_string()
    }
}

struct Fixture {
    registry: Arc<PageRegistry>,
    admin_slot: Arc<CountingSlot>,
    member_slot: Arc<CountingSlot>,
}

fn fixture() -> Fixture {
    let admin_slot = CountingSlot::new();
    let member_slot = CountingSlot::new();
    let mut registry = PageRegistry::portal(&RedirectTargets::default()).unwrap();
    registry
        .register(PageDescriptor::new(
            "audit",
            "/admin/audit",
            "Audit",
            GateRequirement::Admin,
            Chrome::Navigation,
            admin_slot.clone(),
        ))
        .unwrap();
    registry
        .register(PageDescriptor::new(
            "inbox",
            "/inbox",
            "Inbox",
            GateRequirement::Authenticated,
            Chrome::Header,
            member_slot.clone(),
        ))
        .unwrap();

    Fixture {
        registry: Arc::new(registry),
        admin_slot,
        member_slot,
    }
}

fn navigator(fixture: &Fixture, store: &SessionStore) -> Navigator {
    Navigator::new(
        fixture.registry.clone(),
        store.provider(),
        RedirectTargets::default(),
    )
}

fn is_page(view: &ScreenView) -> bool {
    matches!(view, ScreenView::Page(_))
}

#[test]
fn test_guest_on_admin_page_is_redirected_and_slot_never_renders() {
    let fixture = fixture();
    let store = SessionStore::resolved(Session::guest());
    let mut nav = navigator(&fixture, &store);

    let screen = nav.navigate("/admin/audit").unwrap();

    assert_eq!(screen.path, "/sign-in?next=%2Fadmin%2Faudit");
    assert_eq!(screen.page, "sign-in");
    assert_eq!(screen.redirected_from.as_deref(), Some("/admin/audit"));
    assert!(is_page(&screen.view));
    assert_eq!(fixture.admin_slot.renders(), 0);
    assert_eq!(nav.history(), ["/admin/audit", "/sign-in?next=%2Fadmin%2Faudit"]);
}

#[test]
fn test_user_on_authenticated_page_renders_without_redirect() {
    let fixture = fixture();
    let store = SessionStore::resolved(Session::user(USER_ID));
    let mut nav = navigator(&fixture, &store);

    let screen = nav.navigate("/inbox").unwrap();

    assert_eq!(screen.page, "inbox");
    assert_eq!(screen.redirected_from, None);
    match screen.view {
        ScreenView::Page(html) => assert!(html.contains("secret dashboard")),
        other => panic!("expected page, got {other:?}"),
    }
    assert_eq!(fixture.member_slot.renders(), 1);
}

#[test]
fn test_user_on_admin_page_lands_on_forbidden() {
    let fixture = fixture();
    let store = SessionStore::resolved(Session::user(USER_ID));
    let mut nav = navigator(&fixture, &store);

    let screen = nav.navigate("/admin/audit").unwrap();

    assert_eq!(screen.path, "/forbidden");
    assert_eq!(screen.page, "forbidden");
    assert_eq!(fixture.admin_slot.renders(), 0);
}

#[tokio::test]
async fn test_sign_out_on_admin_page_redirects_without_reload() {
    let fixture = fixture();
    let store = SessionStore::resolved(Session::admin(ADMIN_ID));
    let mut nav = navigator(&fixture, &store);

    let shown = nav.navigate("/admin/audit").unwrap();
    assert!(is_page(&shown.view));
    assert_eq!(fixture.admin_slot.renders(), 1);

    store.sign_out();
    let screen = nav.next().await.unwrap().unwrap();

    assert_eq!(screen.page, "sign-in");
    assert_eq!(screen.path, "/sign-in?next=%2Fadmin%2Faudit");
    assert_eq!(screen.redirected_from.as_deref(), Some("/admin/audit"));
    assert_eq!(fixture.admin_slot.renders(), 1);
    assert_eq!(nav.current_page(), Some("sign-in"));
}

#[tokio::test]
async fn test_resolution_shows_one_loading_then_one_page() {
    let fixture = fixture();
    let store = SessionStore::resolving();
    let mut nav = navigator(&fixture, &store);

    let first = nav.navigate("/admin/audit").unwrap();
    assert!(matches!(first.view, ScreenView::Loading(_)));
    assert_eq!(fixture.admin_slot.renders(), 0);

    store.resolve(Session::admin(ADMIN_ID));
    let second = nav.next().await.unwrap().unwrap();

    assert_eq!(second.page, "audit");
    assert!(is_page(&second.view));
    assert_eq!(fixture.admin_slot.renders(), 1);
    assert_eq!(nav.history(), ["/admin/audit"]);
}

#[test]
fn test_unknown_location_is_not_found() {
    let fixture = fixture();
    let store = SessionStore::resolved(Session::guest());
    let mut nav = navigator(&fixture, &store);

    assert_eq!(
        nav.navigate("/nowhere"),
        Err(NavigationError::NotFound("/nowhere".to_string()))
    );
}

fn looping_navigator(store: &SessionStore) -> Navigator {
    let mut registry = PageRegistry::new();
    for (name, path) in [("login", "/login"), ("chat", "/chat")] {
        registry
            .register(PageDescriptor::new(
                name,
                path,
                name,
                GateRequirement::Authenticated,
                Chrome::None,
                CountingSlot::new(),
            ))
            .unwrap();
    }
    Navigator::new(
        Arc::new(registry),
        store.provider(),
        RedirectTargets::new("/login", "/forbidden"),
    )
}

#[test]
fn test_gated_sign_in_page_is_a_redirect_loop() {
    let store = SessionStore::resolved(Session::guest());
    let mut nav = looping_navigator(&store);

    assert!(matches!(
        nav.navigate("/chat"),
        Err(NavigationError::RedirectLoop(_))
    ));
}

#[tokio::test]
async fn test_redirect_loop_leaves_nothing_displayed() {
    let store = SessionStore::resolved(Session::guest());
    let mut nav = looping_navigator(&store);

    assert!(nav.navigate("/chat").is_err());
    assert_eq!(nav.current_page(), None);

    // No half-followed gate keeps reacting to the session.
    store.sign_in(Session::user(USER_ID));
    assert!(nav.next().await.is_none());
}

#[tokio::test]
async fn test_navigator_without_page_has_nothing_to_wait_for() {
    let fixture = fixture();
    let store = SessionStore::resolved(Session::guest());
    let mut nav = navigator(&fixture, &store);

    assert!(nav.next().await.is_none());
}
