use std::env;

use crate::gate::RedirectTargets;

/// AppConfig
///
/// Holds the portal's entire configuration state. Loaded once at startup and shared
/// immutably with every request handler through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string for the profile directory. `None` in local runs
    // falls back to the in-memory directory.
    pub db_url: Option<String>,
    // Runtime environment marker. Controls the local `x-user-id` bypass.
    pub env: Env,
    // HS256 secret used to validate incoming session tokens.
    pub jwt_secret: String,
    // Socket address the HTTP page host binds to.
    pub bind_addr: String,
    // Page path a denied gate sends unauthenticated viewers to.
    pub sign_in_path: String,
    // Page path a denied gate sends under-privileged viewers to.
    pub forbidden_path: String,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (identity bypass, in-memory directory) and the hardened production setup.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "local-dev-session-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SIGN_IN_PATH: &str = "/sign-in";
const DEFAULT_FORBIDDEN_PATH: &str = "/forbidden";

impl Default for AppConfig {
    /// Safe, non-panicking values for test state scaffolding.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            forbidden_path: DEFAULT_FORBIDDEN_PATH.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables, failing fast.
    ///
    /// # Panics
    /// Panics if `DATABASE_URL` or `SESSION_JWT_SECRET` is missing under
    /// `APP_ENV=production`.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod")),
                env::var("SESSION_JWT_SECRET")
                    .expect("FATAL: SESSION_JWT_SECRET must be set in production."),
            ),
            Env::Local => (
                env::var("DATABASE_URL").ok(),
                env::var("SESSION_JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
            ),
        };

        Self {
            db_url,
            env,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            sign_in_path: env::var("SIGN_IN_PATH")
                .unwrap_or_else(|_| DEFAULT_SIGN_IN_PATH.to_string()),
            forbidden_path: env::var("FORBIDDEN_PATH")
                .unwrap_or_else(|_| DEFAULT_FORBIDDEN_PATH.to_string()),
        }
    }

    /// The redirect destinations denied gates resolve to.
    pub fn redirect_targets(&self) -> RedirectTargets {
        RedirectTargets::new(&self.sign_in_path, &self.forbidden_path)
    }
}
