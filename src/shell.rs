use crate::{
    features::FeatureState,
    models::{Chrome, NavLink},
};

/// PageShell
///
/// Composes optional chrome with exactly one content region. Pure layout: it has no
/// error conditions of its own, and a failing slot is the slot's problem.
#[derive(Clone)]
pub struct PageShell {
    chrome: Chrome,
    content: FeatureState,
}

impl PageShell {
    pub fn new(chrome: Chrome, content: FeatureState) -> Self {
        Self { chrome, content }
    }

    pub fn chrome(&self) -> Chrome {
        self.chrome
    }

    /// Renders the full document for the page.
    pub fn render(&self, title: &str, links: &[NavLink]) -> String {
        let chrome = match self.chrome {
            Chrome::None => String::new(),
            Chrome::Navigation => render_nav(links),
            Chrome::Header => format!(
                r#"<header class="portal-header"><a class="brand" href="/">Portal</a>{}</header>"#,
                render_nav(links)
            ),
        };

        document(
            title,
            &format!(
                r#"{chrome}<main class="portal-content">{}</main>"#,
                self.content.render()
            ),
        )
    }
}

/// The neutral markup a gate shows while the session is unresolved.
pub fn loading_placeholder() -> String {
    document(
        "Loading",
        r#"<div class="gate-loading" role="status" aria-busy="true"></div>"#,
    )
}

fn render_nav(links: &[NavLink]) -> String {
    let items: String = links
        .iter()
        .map(|link| {
            format!(
                r#"<li><a href="{}">{}</a></li>"#,
                escape(&link.path),
                escape(&link.title)
            )
        })
        .collect();
    format!(r#"<nav class="portal-nav"><ul>{items}</ul></nav>"#)
}

fn document(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html><html lang="en"><head><meta charset="utf-8"><title>{}</title></head><body>{body}</body></html>"#,
        escape(title)
    )
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
