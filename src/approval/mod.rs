pub mod format;
pub mod lifecycle;
pub mod types;

pub use lifecycle::{can_cancel, LifecycleError};
pub use types::{
    ActionContext, ApprovalRequest, ApprovalStatus, Arguments, DeferredAction, DeferredStats,
    DeferredStatus,
};
