use tracing::info;

use super::repo_types::Admin;
use crate::{auth::password::hash_password, config::BootstrapAdmin, state::AppState};

pub const DEFAULT_ROLE: &str = "admin";
const ROLES: [&str; 2] = ["admin", "super_admin"];

pub fn normalize_role(role: Option<&str>) -> Option<&'static str> {
    match role.map(str::trim).filter(|r| !r.is_empty()) {
        None => Some(DEFAULT_ROLE),
        Some(r) => ROLES.iter().copied().find(|known| *known == r),
    }
}

/// Makes sure the configured admin exists and its password matches the environment.
pub async fn ensure_bootstrap_admin(st: &AppState) -> anyhow::Result<()> {
    let Some(BootstrapAdmin { name, email, password }) = st.config.bootstrap_admin.clone() else {
        return Ok(());
    };
    let email = email.trim().to_lowercase();
    let hash = hash_password(&password)?;
    let admin = Admin::upsert(&st.db, &name, &email, &hash).await?;
    info!(admin_id = %admin.id, email = %admin.email, "bootstrap admin ready");
    Ok(())
}
