use std::sync::Arc;

/// FeatureSlot
///
/// The opaque content component a page renders. Constructible and renderable with no
/// input from the shell; whatever state it keeps is its own.
pub trait FeatureSlot: Send + Sync {
    /// Stable identifier of the feature bundle.
    fn name(&self) -> &str;

    /// The markup placed in the shell's content region.
    fn render(&self) -> String;
}

/// FeatureState
///
/// Shared handle to a slot, as held by page descriptors.
pub type FeatureState = Arc<dyn FeatureSlot>;

/// MountPoint
///
/// A slot whose dashboard is delivered as a client-side bundle. The server only emits
/// the element the bundle attaches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    feature: &'static str,
}

impl MountPoint {
    pub const fn new(feature: &'static str) -> Self {
        Self { feature }
    }

    pub fn shared(feature: &'static str) -> FeatureState {
        Arc::new(Self::new(feature))
    }
}

impl FeatureSlot for MountPoint {
    fn name(&self) -> &str {
        self.feature
    }

    fn render(&self) -> String {
        format!(
            r#"<div id="feature-root" data-feature="{0}"><script type="module" src="/assets/{0}.js"></script></div>"#,
            self.feature
        )
    }
}

// Feature bundles shipped with the portal.
pub const HOME: &str = "home";
pub const SIGN_IN: &str = "sign-in";
pub const FORBIDDEN: &str = "forbidden";
pub const AI_MATCHING: &str = "ai-matching";
pub const CHAT: &str = "chat";
pub const PAYMENTS: &str = "payments";
pub const GENERATIVE_AI_HUB: &str = "generative-ai-hub";
pub const SECURITY_DASHBOARD: &str = "security-dashboard";
pub const SYSTEM_MONITORING: &str = "system-monitoring";
pub const CONSOLIDATION_DASHBOARD: &str = "consolidation-dashboard";
