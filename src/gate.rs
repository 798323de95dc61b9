use crate::{
    models::{DenialReason, GateDecision, GateRequirement, Session},
    session::{SessionProvider, SessionSnapshot},
};

/// GateState
///
/// `Resolving` until the first session snapshot arrives; `Allowed`/`Denied` hold
/// until the session changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Resolving,
    Allowed,
    Denied(DenialReason),
}

/// Destination
///
/// Where a denied gate wants the viewer to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Sign in, then come back to `return_to`.
    SignIn { return_to: String },
    /// Signed in but lacking the role; `attempted` is the refused page.
    Forbidden { attempted: String },
}

/// GateEffect
///
/// Side effect requested by an evaluation. Returned, never performed inline, so the
/// caller (navigator or HTTP handler) decides how to carry it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEffect {
    Redirect(Destination),
}

/// GateOutcome
///
/// Result of one pure evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub state: GateState,
    pub effect: Option<GateEffect>,
}

impl GateOutcome {
    /// The allow/deny verdict, or `None` while the session is still resolving.
    pub fn decision(&self) -> Option<GateDecision> {
        match self.state {
            GateState::Resolving => None,
            GateState::Allowed => Some(GateDecision::allowed()),
            GateState::Denied(reason) => Some(GateDecision::denied(reason)),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.state == GateState::Allowed
    }
}

/// evaluate
///
/// Decides whether a page at `path` guarded by `requirement` may render for `snapshot`.
/// Pure: the same inputs always give the same outcome.
pub fn evaluate(requirement: GateRequirement, snapshot: &SessionSnapshot, path: &str) -> GateOutcome {
    let session = match snapshot {
        SessionSnapshot::Resolving => {
            return GateOutcome {
                state: GateState::Resolving,
                effect: None,
            };
        }
        SessionSnapshot::Resolved(session) => session,
    };

    match check(requirement, session) {
        DenialReason::Ok => GateOutcome {
            state: GateState::Allowed,
            effect: None,
        },
        DenialReason::Unauthenticated => GateOutcome {
            state: GateState::Denied(DenialReason::Unauthenticated),
            effect: Some(GateEffect::Redirect(Destination::SignIn {
                return_to: path.to_string(),
            })),
        },
        DenialReason::Forbidden => GateOutcome {
            state: GateState::Denied(DenialReason::Forbidden),
            effect: Some(GateEffect::Redirect(Destination::Forbidden {
                attempted: path.to_string(),
            })),
        },
    }
}

/// The decision for a resolved session, without any effect attached.
pub fn decide(requirement: GateRequirement, session: &Session) -> GateDecision {
    match check(requirement, session) {
        DenialReason::Ok => GateDecision::allowed(),
        reason => GateDecision::denied(reason),
    }
}

// `is_authenticated` is checked before `role`, so an inconsistent session never passes.
fn check(requirement: GateRequirement, session: &Session) -> DenialReason {
    match requirement {
        GateRequirement::None => DenialReason::Ok,
        GateRequirement::Authenticated if session.is_authenticated => DenialReason::Ok,
        GateRequirement::Authenticated => DenialReason::Unauthenticated,
        GateRequirement::Admin if !session.is_authenticated => DenialReason::Unauthenticated,
        GateRequirement::Admin if session.is_admin() => DenialReason::Ok,
        GateRequirement::Admin => DenialReason::Forbidden,
    }
}

/// RedirectTargets
///
/// Concrete paths for the two redirect destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTargets {
    pub sign_in: String,
    pub forbidden: String,
}

impl RedirectTargets {
    pub fn new(sign_in: &str, forbidden: &str) -> Self {
        Self {
            sign_in: sign_in.to_string(),
            forbidden: forbidden.to_string(),
        }
    }

    /// The location a redirect effect resolves to. Sign-in carries the percent-encoded
    /// return path as `next`, appended to any query the sign-in path already has.
    pub fn location(&self, destination: &Destination) -> String {
        match destination {
            Destination::SignIn { return_to } => format!(
                "{}{}next={}",
                self.sign_in,
                if self.sign_in.contains('?') { "&" } else { "?" },
                urlencoding::encode(return_to)
            ),
            Destination::Forbidden { .. } => self.forbidden.clone(),
        }
    }
}

impl Default for RedirectTargets {
    fn default() -> Self {
        Self::new("/sign-in", "/forbidden")
    }
}

/// GateRender
///
/// What a live gate shows for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRender {
    Loading,
    Content,
    Redirect(Destination),
}

impl From<GateOutcome> for GateRender {
    fn from(outcome: GateOutcome) -> Self {
        match (outcome.effect, outcome.state) {
            (Some(GateEffect::Redirect(destination)), _) => GateRender::Redirect(destination),
            (None, GateState::Allowed) => GateRender::Content,
            (None, _) => GateRender::Loading,
        }
    }
}

/// LiveGate
///
/// One gate instance bound to the session provider for as long as its page is
/// displayed. It re-evaluates on every session change and never writes the session.
/// Dropping it is the teardown: pending session changes are then ignored.
#[derive(Debug)]
pub struct LiveGate {
    requirement: GateRequirement,
    path: String,
    provider: SessionProvider,
    state: Option<GateState>,
}

impl LiveGate {
    pub fn new(requirement: GateRequirement, path: impl Into<String>, provider: SessionProvider) -> Self {
        Self {
            requirement,
            path: path.into(),
            provider,
            state: None,
        }
    }

    pub fn requirement(&self) -> GateRequirement {
        self.requirement
    }

    /// The state produced by the last render, if any.
    pub fn state(&self) -> Option<GateState> {
        self.state
    }

    /// Evaluates the latest session snapshot.
    pub fn render(&mut self) -> GateRender {
        let snapshot = self.provider.observe();
        self.apply(&snapshot)
    }

    /// Waits for the session to change and renders again. `None` once the session
    /// authority is gone.
    pub async fn next_render(&mut self) -> Option<GateRender> {
        if !self.provider.changed().await {
            tracing::debug!(path = %self.path, "session authority closed; gate torn down");
            return None;
        }
        Some(self.render())
    }

    fn apply(&mut self, snapshot: &SessionSnapshot) -> GateRender {
        let outcome = evaluate(self.requirement, snapshot, &self.path);
        if self.state != Some(outcome.state) {
            tracing::debug!(
                path = %self.path,
                from = ?self.state,
                to = ?outcome.state,
                "gate transition"
            );
            if let GateState::Denied(reason) = outcome.state {
                tracing::info!(path = %self.path, ?reason, "access denied");
            }
            self.state = Some(outcome.state);
        }
        outcome.into()
    }
}
