//! Data models for the Canopy API
//!
//! Defines Rust types that map to the JSON payloads of the MLM platform:
//! placement tree nodes, the session user, referral links and the request
//! bodies sent by the auth and referral endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placement slot under a tree parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    Left,
    Right,
}

impl Position {
    /// Returns the string representation used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Left => "LEFT",
            Position::Right => "RIGHT",
        }
    }

    /// Parse a position case-insensitively (`left`, `LEFT`, `Right`...)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LEFT" => Some(Position::Left),
            "RIGHT" => Some(Position::Right),
            _ => None,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Platform role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// Returns the string representation used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One platform user occupying a placement slot in the binary tree
///
/// Aggregate counts are computed upstream and are informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique user identifier (e.g. `AL00000001`)
    pub id: String,

    /// Display name
    pub name: String,

    /// Identifier of the left child, if the slot is filled
    #[serde(default)]
    pub left_user: Option<String>,

    /// Identifier of the right child, if the slot is filled
    #[serde(default)]
    pub right_user: Option<String>,

    /// Identifier of the referring user (not necessarily the tree parent)
    #[serde(default)]
    pub sponsor: String,

    /// Number of product redemptions
    #[serde(default)]
    pub redeemed_times: u64,

    /// Number of users below this one
    #[serde(default)]
    pub associated_users_count: u64,

    /// Number of active users below this one
    #[serde(default)]
    pub associated_active_users_count: u64,

    #[serde(default)]
    pub is_blocked: bool,

    #[serde(default)]
    pub is_active: bool,

    /// Slot this node occupies under its tree parent
    pub position: Position,

    #[serde(default)]
    pub role: Role,
}

impl Node {
    /// Create a node with no children and zeroed aggregates.
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            left_user: None,
            right_user: None,
            sponsor: String::new(),
            redeemed_times: 0,
            associated_users_count: 0,
            associated_active_users_count: 0,
            is_blocked: false,
            is_active: false,
            position,
            role: Role::User,
        }
    }

    /// Set the left child reference
    pub fn with_left(mut self, id: impl Into<String>) -> Self {
        self.left_user = Some(id.into());
        self
    }

    /// Set the right child reference
    pub fn with_right(mut self, id: impl Into<String>) -> Self {
        self.right_user = Some(id.into());
        self
    }

    /// Set the role
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set the sponsor reference
    pub fn with_sponsor(mut self, sponsor: impl Into<String>) -> Self {
        self.sponsor = sponsor.into();
        self
    }

    /// Set the active flag
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Set the blocked flag
    pub fn with_blocked(mut self, blocked: bool) -> Self {
        self.is_blocked = blocked;
        self
    }

    /// Set the aggregate counts
    pub fn with_counts(mut self, associated: u64, active: u64) -> Self {
        self.associated_users_count = associated;
        self.associated_active_users_count = active;
        self
    }

    /// Child reference for the given slot
    pub fn child(&self, slot: Position) -> Option<&str> {
        match slot {
            Position::Left => self.left_user.as_deref(),
            Position::Right => self.right_user.as_deref(),
        }
    }

    /// Whether at least one child slot is referenced
    pub fn has_children(&self) -> bool {
        self.left_user.is_some() || self.right_user.is_some()
    }

    /// "Active" or "Inactive"
    pub fn status_label(&self) -> &'static str {
        if self.is_active { "Active" } else { "Inactive" }
    }
}

/// The logged-in user as returned by `GET /user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_blocked: Option<bool>,
}

/// A referral link owned by the current user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralLink {
    pub id: String,
    pub code: String,
    pub position: Position,
    pub created_at: DateTime<Utc>,
    /// Name of the user who registered through this link
    #[serde(default)]
    pub used_by: Option<String>,
}

/// Response of `POST /ref`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReferral {
    pub code: String,
    pub position: Position,
    pub created_at: DateTime<Utc>,
}

/// Generic acknowledgement body of mutation endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// A payload that may or may not be wrapped in `{ "data": ... }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    /// Unwrap the payload regardless of shape
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(data) => data,
        }
    }
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub id: String,
    pub password: String,
}

/// Body of `POST /auth/signup`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub dial_code: String,
    pub position: Position,
    pub sponsor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

/// Body of `POST /auth/forgot-password`
#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Body of `POST /auth/reset-password`
#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Body of `POST /ref`
#[derive(Debug, Clone, Serialize)]
pub struct CreateReferralRequest {
    pub position: Position,
}

/// Build the public registration link for a sponsor code.
pub fn registration_link(site_url: &str, code: &str) -> String {
    format!("{}/register?sponsor={}", site_url.trim_end_matches('/'), code)
}

/// Extract the sponsor code from a registration link.
///
/// Returns `None` if the link has no `sponsor` query parameter.
pub fn sponsor_from_link(link: &str) -> Option<String> {
    let url = url::Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "sponsor")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
