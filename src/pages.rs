use std::{collections::HashMap, sync::Arc};

use thiserror::Error;

use crate::{
    features::{self, FeatureState, MountPoint},
    gate::{self, RedirectTargets},
    models::{Chrome, GateRequirement, NavLink, PageSummary, Session},
    shell::PageShell,
};

/// PageDescriptor
///
/// A routable page: its gate requirement, its chrome, and the slot it renders.
/// Immutable once registered.
#[derive(Clone)]
pub struct PageDescriptor {
    pub name: String,
    pub path: String,
    pub title: String,
    pub gate: GateRequirement,
    pub chrome: Chrome,
    pub content: FeatureState,
}

impl PageDescriptor {
    pub fn new(
        name: &str,
        path: &str,
        title: &str,
        gate: GateRequirement,
        chrome: Chrome,
        content: FeatureState,
    ) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            title: title.to_string(),
            gate,
            chrome,
            content,
        }
    }

    pub fn shell(&self) -> PageShell {
        PageShell::new(self.chrome, self.content.clone())
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary {
            name: self.name.clone(),
            path: self.path.clone(),
            title: self.title.clone(),
            gate: self.gate,
            chrome: self.chrome,
            feature: self.content.name().to_string(),
        }
    }
}

impl std::fmt::Debug for PageDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageDescriptor")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("gate", &self.gate)
            .field("chrome", &self.chrome)
            .field("feature", &self.content.name())
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("page name '{0}' is already registered")]
    DuplicateName(String),
    #[error("page path '{0}' is already registered")]
    DuplicatePath(String),
    #[error("page path '{0}' must start with '/' and contain no route syntax")]
    InvalidPath(String),
    #[error("page path '{0}' is reserved for the portal API")]
    ReservedPath(String),
}

// Paths served by the fixed routes; pages may not shadow them or live beneath them.
const RESERVED_PREFIXES: [&str; 4] = ["/health", "/api", "/api-docs", "/swagger-ui"];

fn is_reserved(path: &str) -> bool {
    RESERVED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

// Rejects what axum would read as captures or wildcards, and query/fragment markers.
fn is_routable(path: &str) -> bool {
    path.starts_with('/')
        && !path.contains(['{', '}', '*', '?', '#'])
        && !path.split('/').any(|segment| segment.starts_with(':'))
}

/// PageRegistry
///
/// The page registration surface: stable names and paths mapped to descriptors.
#[derive(Debug, Default)]
pub struct PageRegistry {
    pages: Vec<Arc<PageDescriptor>>,
    by_name: HashMap<String, usize>,
    by_path: HashMap<String, usize>,
}

/// RegistryState
///
/// Shared, read-only registry handle held by the application state.
pub type RegistryState = Arc<PageRegistry>;

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, page: PageDescriptor) -> Result<(), RegistryError> {
        if !is_routable(&page.path) {
            return Err(RegistryError::InvalidPath(page.path));
        }
        if is_reserved(&page.path) {
            return Err(RegistryError::ReservedPath(page.path));
        }
        if self.by_name.contains_key(&page.name) {
            return Err(RegistryError::DuplicateName(page.name));
        }
        if self.by_path.contains_key(&page.path) {
            return Err(RegistryError::DuplicatePath(page.path));
        }

        let index = self.pages.len();
        self.by_name.insert(page.name.clone(), index);
        self.by_path.insert(page.path.clone(), index);
        tracing::debug!(name = %page.name, path = %page.path, gate = ?page.gate, "page registered");
        self.pages.push(Arc::new(page));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<PageDescriptor>> {
        self.by_name.get(name).map(|&i| self.pages[i].clone())
    }

    /// Looks a page up by path; any query string is ignored.
    pub fn resolve(&self, path: &str) -> Option<Arc<PageDescriptor>> {
        let path = path.split_once('?').map_or(path, |(path, _)| path);
        self.by_path.get(path).map(|&i| self.pages[i].clone())
    }

    /// Pages in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PageDescriptor>> {
        self.pages.iter()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn summaries(&self) -> Vec<PageSummary> {
        self.pages.iter().map(|page| page.summary()).collect()
    }

    /// Navigation entries for the pages `session` may open.
    pub fn nav_links(&self, session: &Session) -> Vec<NavLink> {
        self.pages
            .iter()
            .filter(|page| gate::decide(page.gate, session).allow)
            .map(|page| NavLink {
                title: page.title.clone(),
                path: page.path.clone(),
            })
            .collect()
    }

    /// portal
    ///
    /// The portal's sitemap. The sign-in and forbidden pages sit wherever `targets`
    /// points so that redirects always land on a registered page. A target that
    /// collides with another page or with the API routes is an error.
    pub fn portal(targets: &RedirectTargets) -> Result<Self, RegistryError> {
        use Chrome::{Header, Navigation};
        use GateRequirement::{Admin, Authenticated};

        let without_query = |target: &str| {
            target
                .split_once('?')
                .map_or(target, |(path, _)| path)
                .to_string()
        };
        let sign_in = without_query(&targets.sign_in);
        let forbidden = without_query(&targets.forbidden);

        let pages = [
            ("home", "/", "Home", GateRequirement::None, Header, features::HOME),
            ("sign-in", sign_in.as_str(), "Sign in", GateRequirement::None, Chrome::None, features::SIGN_IN),
            ("forbidden", forbidden.as_str(), "Access denied", GateRequirement::None, Navigation, features::FORBIDDEN),
            ("ai-matching", "/matching", "AI Matching", Authenticated, Header, features::AI_MATCHING),
            ("chat", "/chat", "Chat", Authenticated, Header, features::CHAT),
            ("payments", "/payments", "Payments", Authenticated, Header, features::PAYMENTS),
            ("generative-ai", "/generative-ai", "Generative AI Hub", Authenticated, Header, features::GENERATIVE_AI_HUB),
            ("security", "/admin/security", "Security", Admin, Navigation, features::SECURITY_DASHBOARD),
            ("system-monitor", "/admin/system", "System Monitor", Admin, Navigation, features::SYSTEM_MONITORING),
            ("consolidation", "/admin/consolidation", "Consolidation", Admin, Navigation, features::CONSOLIDATION_DASHBOARD),
        ];

        let mut registry = Self::new();
        for (name, path, title, gate, chrome, feature) in pages {
            registry.register(PageDescriptor::new(
                name,
                path,
                title,
                gate,
                chrome,
                MountPoint::shared(feature),
            ))?;
        }
        Ok(registry)
    }
}
