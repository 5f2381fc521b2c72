//! Shared domain types for the ad-sales gateway: tenants, principals,
//! products, media buys, packages, creatives, tasks, conversation context,
//! and the audit log. Every other crate in the workspace depends on this
//! one; it depends on nothing in the workspace.

pub mod audit;
pub mod context;
pub mod creative;
pub mod media_buy;
pub mod package;
pub mod principal;
pub mod product;
pub mod result;
pub mod task;
pub mod tenant;

pub use audit::AuditRecord;
pub use context::{ContextRecord, Message, MessageRole};
pub use creative::{Creative, CreativeStatus};
pub use media_buy::{MediaBuy, MediaBuyStatus};
pub use package::Package;
pub use principal::PrincipalContext;
pub use product::{DeliveryType, NonGuaranteedAutomation, Product};
pub use result::{TaskResult, TaskResultStatus};
pub use task::{Task, TaskStatus};
pub use tenant::{Tenant, TenantContext};

/// Protocol version of the normalized AdCP surface this workspace speaks.
pub const CONTRACT_VERSION: &str = "adcp/v1";

#[cfg(test)]
mod tests {
    #[test]
    fn contract_version_is_stable() {
        assert_eq!(super::CONTRACT_VERSION, "adcp/v1");
    }
}
