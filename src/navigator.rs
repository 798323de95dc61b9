use std::sync::Arc;

use thiserror::Error;

use crate::{
    gate::{GateRender, LiveGate, RedirectTargets},
    models::Session,
    pages::{PageDescriptor, RegistryState},
    session::SessionProvider,
    shell,
};

// Longest redirect chain followed before giving up.
const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("no page registered at '{0}'")]
    NotFound(String),
    #[error("redirect chain too long at '{0}'")]
    RedirectLoop(String),
}

/// ScreenView
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenView {
    Loading(String),
    Page(String),
}

/// Screen
///
/// What the viewer currently sees after a navigation or a session change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    /// Location shown, including any query string.
    pub path: String,
    /// Registered name of the displayed page.
    pub page: String,
    pub view: ScreenView,
    /// Set when a gate redirect brought the viewer here.
    pub redirected_from: Option<String>,
}

struct Displayed {
    page: Arc<PageDescriptor>,
    gate: LiveGate,
}

/// Navigator
///
/// In-process router. Resolves locations through the registry, keeps one live gate for
/// the displayed page, and carries out the redirect effects gates return.
pub struct Navigator {
    registry: RegistryState,
    provider: SessionProvider,
    targets: RedirectTargets,
    displayed: Option<Displayed>,
    history: Vec<String>,
}

impl Navigator {
    pub fn new(registry: RegistryState, provider: SessionProvider, targets: RedirectTargets) -> Self {
        Self {
            registry,
            provider,
            targets,
            displayed: None,
            history: Vec::new(),
        }
    }

    /// Every location visited, redirects included.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn current_page(&self) -> Option<&str> {
        self.displayed.as_ref().map(|d| d.page.name.as_str())
    }

    /// Opens `location`, following gate redirects.
    pub fn navigate(&mut self, location: &str) -> Result<Screen, NavigationError> {
        self.follow(location.to_string(), None)
    }

    /// Waits for the session to change and re-renders the displayed page. `None` when
    /// nothing is displayed or the session authority is gone.
    pub async fn next(&mut self) -> Option<Result<Screen, NavigationError>> {
        let displayed = self.displayed.as_mut()?;
        let render = displayed.gate.next_render().await?;
        let page = displayed.page.clone();

        match render {
            GateRender::Redirect(destination) => {
                let location = self.targets.location(&destination);
                tracing::info!(from = %page.path, to = %location, "session change redirected viewer");
                Some(self.follow(location, Some(page.path.clone())))
            }
            render => Some(Ok(self.screen(&page, page.path.clone(), render, None))),
        }
    }

    fn follow(
        &mut self,
        mut location: String,
        mut redirected_from: Option<String>,
    ) -> Result<Screen, NavigationError> {
        for hop in 0..=MAX_REDIRECTS {
            let Some(page) = self.registry.resolve(&location) else {
                // A redirect into nowhere must not leave the denied page's gate live.
                if hop > 0 {
                    self.displayed = None;
                }
                return Err(NavigationError::NotFound(location));
            };

            // Replacing the displayed gate tears the previous one down.
            let mut gate = LiveGate::new(page.gate, page.path.clone(), self.provider.clone());
            let render = gate.render();
            self.history.push(location.clone());
            self.displayed = Some(Displayed {
                page: page.clone(),
                gate,
            });

            match render {
                GateRender::Redirect(destination) => {
                    let next = self.targets.location(&destination);
                    tracing::info!(from = %location, to = %next, "following gate redirect");
                    redirected_from.get_or_insert_with(|| page.path.clone());
                    location = next;
                }
                render => return Ok(self.screen(&page, location, render, redirected_from)),
            }
        }
        tracing::warn!(at = %location, "redirect chain abandoned");
        self.displayed = None;
        Err(NavigationError::RedirectLoop(location))
    }

    fn screen(
        &self,
        page: &PageDescriptor,
        path: String,
        render: GateRender,
        redirected_from: Option<String>,
    ) -> Screen {
        let view = match render {
            GateRender::Content => {
                let session = self
                    .provider
                    .snapshot()
                    .session()
                    .cloned()
                    .unwrap_or_else(Session::guest);
                let links = self.registry.nav_links(&session);
                ScreenView::Page(page.shell().render(&page.title, &links))
            }
            GateRender::Loading | GateRender::Redirect(_) => {
                ScreenView::Loading(shell::loading_placeholder())
            }
        };

        Screen {
            path,
            page: page.name.clone(),
            view,
            redirected_from,
        }
    }
}
