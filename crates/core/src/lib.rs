//! Core library for Canopy
//!
//! Provides the REST client for the MLM platform API, client-side validation,
//! the resource cache and notification context shared by the command line and
//! terminal front ends, and the placement tree renderer.

pub mod actions;
pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod notify;
pub mod session;
pub mod tree;
pub mod validation;

pub use cache::{ResourceCache, ResourceKey, Versioned};
pub use client::ApiClient;
pub use config::Config;
pub use context::AppContext;
pub use error::{ApiError, ApiResult, FALLBACK_MESSAGE, FieldError};
pub use models::{
    Ack, CreatedReferral, Node, Position, ReferralLink, Role, SessionUser, registration_link,
    sponsor_from_link,
};
pub use notify::{Notification, NotificationSink, Notifier, QueueSink, Variant};
pub use session::SessionStore;
pub use tree::{Affordance, DanglingRef, RenderedNode, RenderedTree, TreeState};
pub use validation::{ForgotPasswordForm, LoginForm, ResetPasswordForm, SignupForm};

static_assertions::assert_impl_all!(ApiClient: Send, Sync, Clone);
static_assertions::assert_impl_all!(AppContext: Send, Sync);
