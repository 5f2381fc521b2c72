//! Tenant & Principal registry resolution (C2). Implements the precedence
//! chain from SPEC_FULL §4.2: explicit header wins, then host (subdomain or
//! virtual_host, both handled by `Storage::find_tenant_by_host`), then the
//! literal tenant `"default"`. The "ambient tenant context" this produces is
//! an explicit [`adcp_core::tenant::TenantContext`] value the caller threads
//! through every executor call — never a thread-local.

use adcp_core::principal::{Principal, PrincipalContext, Protocol};
use adcp_core::tenant::TenantContext;
use adcp_error::{AdcpError, ErrorCode};
use adcp_storage::Storage;

/// Resolves the caller's tenant and principal from the inbound request.
///
/// `tenant_hint` is the explicit `x-adcp-tenant` header, if present.
/// `host` is the request's Host/subdomain, used only when no explicit hint
/// is given. `token` is the `x-adcp-auth` bearer value.
pub async fn resolve(
    storage: &dyn Storage,
    token: Option<&str>,
    tenant_hint: Option<&str>,
    host: Option<&str>,
    protocol: Protocol,
) -> Result<(TenantContext, PrincipalContext), AdcpError> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AdcpError::new(ErrorCode::NotAuthenticated, "missing x-adcp-auth token"))?;

    let tenant = resolve_tenant(storage, tenant_hint, host).await?;

    if !tenant.is_active {
        return Err(AdcpError::new(
            ErrorCode::TenantInactive,
            format!("tenant '{}' is inactive", tenant.tenant_id),
        ));
    }

    let principal = match storage.find_principal_by_token(&tenant.tenant_id, token).await? {
        Some(principal) => principal,
        None if !tenant.settings.admin_token.is_empty() && tenant.settings.admin_token == token => {
            Principal::synthetic_admin(&tenant.tenant_id)
        }
        None => {
            return Err(AdcpError::new(ErrorCode::NotAuthenticated, "no principal matches the supplied token"));
        }
    };

    let tenant_id = tenant.tenant_id.clone();
    let tenant_ctx = TenantContext::new(tenant);
    let principal_ctx = PrincipalContext { tenant_id, principal, protocol };
    Ok((tenant_ctx, principal_ctx))
}

async fn resolve_tenant(storage: &dyn Storage, tenant_hint: Option<&str>, host: Option<&str>) -> Result<adcp_core::Tenant, AdcpError> {
    if let Some(explicit) = tenant_hint.filter(|t| !t.is_empty()) {
        return storage
            .get_tenant(explicit)
            .await?
            .ok_or_else(|| AdcpError::new(ErrorCode::NotAuthenticated, format!("unknown tenant '{explicit}'")));
    }

    if let Some(host) = host.filter(|h| !h.is_empty()) {
        if let Some(tenant) = storage.find_tenant_by_host(host).await? {
            return Ok(tenant);
        }
    }

    storage
        .get_tenant("default")
        .await?
        .ok_or_else(|| AdcpError::new(ErrorCode::NotAuthenticated, "no default tenant configured"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_core::tenant::{PolicySettings, Tenant, TenantSettings};
    use adcp_storage::InMemoryStore;
    use std::collections::BTreeMap;

    fn tenant(tenant_id: &str, admin_token: &str) -> Tenant {
        Tenant {
            tenant_id: tenant_id.into(),
            name: tenant_id.into(),
            subdomain: tenant_id.into(),
            virtual_host: None,
            is_active: true,
            settings: TenantSettings {
                ad_server: "mock".into(),
                max_daily_budget: None,
                auto_approve_formats: vec![],
                human_review_required: false,
                authorized_emails: vec![],
                authorized_domains: vec![],
                webhook_urls: vec![],
                policy_settings: PolicySettings::default(),
                admin_token: admin_token.into(),
                adapter_config: BTreeMap::new(),
            },
        }
    }

    #[tokio::test]
    async fn missing_token_is_not_authenticated() {
        let store = InMemoryStore::new();
        let err = resolve(&store, None, None, None, Protocol::A2a).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAuthenticated);
    }

    #[tokio::test]
    async fn explicit_tenant_header_wins_and_admin_token_mints_synthetic_admin() {
        let store = InMemoryStore::new();
        store.upsert_tenant(tenant("acme", "admin-secret")).await.unwrap();
        store.upsert_tenant(tenant("default", "default-secret")).await.unwrap();

        let (tenant_ctx, principal_ctx) = resolve(&store, Some("admin-secret"), Some("acme"), None, Protocol::A2a).await.unwrap();
        assert_eq!(tenant_ctx.tenant_id(), "acme");
        assert_eq!(principal_ctx.principal.principal_id, "acme_admin");
        assert!(principal_ctx.principal.has_admin_privilege());
    }

    #[tokio::test]
    async fn falls_back_to_default_tenant_when_no_hint_or_host_matches() {
        let store = InMemoryStore::new();
        store.upsert_tenant(tenant("default", "default-secret")).await.unwrap();

        let (tenant_ctx, _) = resolve(&store, Some("default-secret"), None, None, Protocol::Mcp).await.unwrap();
        assert_eq!(tenant_ctx.tenant_id(), "default");
    }

    #[tokio::test]
    async fn inactive_tenant_is_rejected() {
        let store = InMemoryStore::new();
        let mut t = tenant("acme", "admin-secret");
        t.is_active = false;
        store.upsert_tenant(t).await.unwrap();

        let err = resolve(&store, Some("admin-secret"), Some("acme"), None, Protocol::A2a).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::TenantInactive);
    }

    #[tokio::test]
    async fn unknown_token_is_not_authenticated() {
        let store = InMemoryStore::new();
        store.upsert_tenant(tenant("acme", "admin-secret")).await.unwrap();

        let err = resolve(&store, Some("garbage"), Some("acme"), None, Protocol::A2a).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAuthenticated);
    }
}
