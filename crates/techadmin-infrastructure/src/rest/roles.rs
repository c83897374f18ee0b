use async_trait::async_trait;
use reqwest::Method;
use techadmin_core::auth::{RoleRecord, RoleRepository};
use techadmin_core::error::Result;

use super::client::{RestBackend, send_json};

#[async_trait]
impl RoleRepository for RestBackend {
    async fn list_roles(&self, user_id: &str) -> Result<Vec<RoleRecord>> {
        let bearer = self.bearer().await?;
        let path = format!("rest/v1/{}", self.settings.catalogue.roles_table);
        let request = self
            .request(Method::GET, &path, bearer.as_deref())
            .query(&[("select", "role".to_string()), ("user_id", format!("eq.{}", user_id))]);

        let records: Vec<RoleRecord> = send_json(request).await?;
        tracing::debug!("[RestBackend] {} role rows for {}", records.len(), user_id);
        Ok(records)
    }
}
