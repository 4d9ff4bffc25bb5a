use serde::{Deserialize, Serialize};

pub const DEFAULT_SUPER_ADMIN_SCOPE: &str = "super_admin";

/// Caller identity, passed explicitly into every use case.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub company_id: Option<String>,
    #[serde(default)]
    pub scope_strings: Vec<String>,
    #[serde(default)]
    pub company_scope_ids: Vec<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, company_id: Option<&str>) -> Self {
        Self { id: id.into(), company_id: company_id.map(str::to_owned), ..Self::default() }
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scope_strings = scopes.iter().map(|scope| (*scope).to_owned()).collect();
        self
    }

    pub fn with_company_scopes(mut self, company_ids: &[&str]) -> Self {
        self.company_scope_ids = company_ids.iter().map(|id| (*id).to_owned()).collect();
        self
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope_strings.iter().any(|held| held == scope)
    }

    /// Super admins, members of the company, and holders of an explicit
    /// company-scope grant may act on the company's records.
    pub fn can_access_company(&self, company_id: &str, super_admin_scope: &str) -> bool {
        self.has_scope(super_admin_scope)
            || self.company_id.as_deref() == Some(company_id)
            || self.company_scope_ids.iter().any(|granted| granted == company_id)
    }
}
