use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Viewer Identity ---

/// Role
///
/// The viewer's access level. Serialized in lowercase for the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    Guest,
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Maps a directory `role` column onto an authenticated role.
    ///
    /// Unknown values degrade to `User`; admin rights are never inferred.
    pub fn from_directory(value: &str) -> Self {
        match value.parse() {
            Ok(Role::Admin) => Role::Admin,
            _ => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Role::Guest),
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Session
///
/// The current viewer's authentication and role state. Built only through the
/// constructors below, which keep `is_authenticated == false` paired with `Role::Guest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Session {
    pub is_authenticated: bool,
    pub role: Role,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    #[ts(type = "string | null")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A signed-out viewer.
    pub fn guest() -> Self {
        Self {
            is_authenticated: false,
            role: Role::Guest,
            user_id: None,
            email: None,
            expires_at: None,
        }
    }

    pub fn user(id: Uuid) -> Self {
        Self::from_identity(id, Role::User)
    }

    pub fn admin(id: Uuid) -> Self {
        Self::from_identity(id, Role::Admin)
    }

    /// An authenticated viewer. A `Guest` role is promoted to `User`, since a
    /// resolved identity is by definition signed in.
    pub fn from_identity(id: Uuid, role: Role) -> Self {
        let role = match role {
            Role::Guest => Role::User,
            other => other,
        };
        Self {
            is_authenticated: true,
            role,
            user_id: Some(id),
            email: None,
            expires_at: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated && self.role == Role::Admin
    }
}

// --- Page Declarations ---

/// GateRequirement
///
/// The capability a page demands before its content may render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum GateRequirement {
    #[default]
    None,
    Authenticated,
    Admin,
}

/// Chrome
///
/// Layout elements wrapped around a page's content region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Chrome {
    #[default]
    None,
    Navigation,
    Header,
}

/// DenialReason
///
/// Why a gate evaluation came out the way it did. `Ok` accompanies an allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DenialReason {
    Ok,
    Unauthenticated,
    Forbidden,
}

/// GateDecision
///
/// The transient allow/deny verdict for one evaluation. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct GateDecision {
    pub allow: bool,
    pub reason: DenialReason,
}

impl GateDecision {
    pub fn allowed() -> Self {
        Self {
            allow: true,
            reason: DenialReason::Ok,
        }
    }

    pub fn denied(reason: DenialReason) -> Self {
        Self {
            allow: false,
            reason,
        }
    }
}

/// PageSummary
///
/// Serializable view of a registered page, served by `GET /api/pages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageSummary {
    pub name: String,
    pub path: String,
    pub title: String,
    pub gate: GateRequirement,
    pub chrome: Chrome,
    pub feature: String,
}

/// NavLink
///
/// One entry of the navigation chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavLink {
    pub title: String,
    pub path: String,
}

// --- Directory Rows ---

/// UserRecord
///
/// A row of the `public.profiles` table: the identity a session token resolves to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    // Raw RBAC column, mapped through `Role::from_directory`.
    pub role: String,
}

impl UserRecord {
    pub fn session(&self) -> Session {
        Session::from_identity(self.id, Role::from_directory(&self.role)).with_email(&self.email)
    }
}
