#![doc = include_str!("../README.md")]

pub mod error;
pub mod gate;
pub mod instance;
pub mod magic;
#[cfg(feature = "middleware")]
pub mod middleware;
pub mod redirect;
pub mod types;

// Re-exports for convenient access
pub use error::Error;
pub use gate::{
    Decision, GateInputs, PageAccess, ProfileSnapshot, SessionSnapshot, SettingsSnapshot,
    WorkspaceSnapshot, evaluate, workspace_target,
};
pub use instance::{InstanceConfig, InstanceConfigPatch, InstanceStatus};
pub use magic::{MagicCodeRecord, MagicKey, MagicToken};
pub use redirect::{is_safe_next_path, sanitize_next_path};
pub use types::{Email, RedirectTarget, SessionId, UserId, Workspace, WorkspaceSlug};
