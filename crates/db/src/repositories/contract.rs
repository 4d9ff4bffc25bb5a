use async_trait::async_trait;
use sqlx::Row;

use ticketroute_core::domain::contract::{ContractVersion, ContractVersionId};
use ticketroute_core::routing::ports::{ContractCategoryQuery, ContractQuery, PortError};

use super::{decode_err, RepositoryError};
use crate::DbPool;

/// Reads contract versions and their category coverage. A category with no
/// `contract_category` row is not covered.
pub struct SqlContractQuery {
    pool: DbPool,
}

impl SqlContractQuery {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_version(
        &self,
        id: &ContractVersionId,
    ) -> Result<Option<ContractVersion>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, company_id, site_id, label FROM contract_version WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(ContractVersion {
            id: ContractVersionId(row.try_get("id").map_err(decode_err)?),
            company_id: row.try_get("company_id").map_err(decode_err)?,
            site_id: row.try_get("site_id").map_err(decode_err)?,
            label: row.try_get("label").map_err(decode_err)?,
        }))
    }

    async fn fetch_included(
        &self,
        contract_version_id: &ContractVersionId,
        category_id: &str,
    ) -> Result<bool, RepositoryError> {
        let included: Option<i64> = sqlx::query_scalar(
            "SELECT included FROM contract_category
             WHERE contract_version_id = ? AND category_id = ?",
        )
        .bind(&contract_version_id.0)
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(included == Some(1))
    }
}

#[async_trait]
impl ContractQuery for SqlContractQuery {
    async fn get_contract_version(
        &self,
        id: &ContractVersionId,
    ) -> Result<Option<ContractVersion>, PortError> {
        Ok(self.fetch_version(id).await?)
    }
}

#[async_trait]
impl ContractCategoryQuery for SqlContractQuery {
    async fn is_category_included(
        &self,
        contract_version_id: &ContractVersionId,
        category_id: &str,
    ) -> Result<bool, PortError> {
        Ok(self.fetch_included(contract_version_id, category_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use ticketroute_core::domain::contract::ContractVersionId;
    use ticketroute_core::routing::ports::{ContractCategoryQuery, ContractQuery};

    use super::SqlContractQuery;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlContractQuery {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        sqlx::query(
            "INSERT INTO contract_version (id, company_id, site_id, label)
             VALUES ('cv-1', 'co-1', 'site-1', 'Tower A');
             INSERT INTO contract_category (contract_version_id, category_id, included)
             VALUES ('cv-1', 'cat-hvac', 1), ('cv-1', 'cat-lift', 0);",
        )
        .execute(&pool)
        .await
        .expect("seed");
        SqlContractQuery::new(pool)
    }

    #[tokio::test]
    async fn loads_contract_version_or_none() {
        let query = setup().await;

        let found = query
            .get_contract_version(&ContractVersionId("cv-1".to_string()))
            .await
            .expect("query")
            .expect("contract version exists");
        assert_eq!(found.company_id, "co-1");
        assert_eq!(found.site_id.as_deref(), Some("site-1"));

        let missing = query
            .get_contract_version(&ContractVersionId("cv-9".to_string()))
            .await
            .expect("query");
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn category_inclusion_requires_an_included_row() {
        let query = setup().await;
        let cv = ContractVersionId("cv-1".to_string());

        assert!(query.is_category_included(&cv, "cat-hvac").await.expect("hvac"));
        assert!(!query.is_category_included(&cv, "cat-lift").await.expect("lift"));
        assert!(!query.is_category_included(&cv, "cat-unknown").await.expect("unknown"));
    }
}
