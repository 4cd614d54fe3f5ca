//! Authorization snapshots supplied by the identity provider.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::value::FilterValue;

/// Which rows a role may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum DataScope {
    /// No restriction.
    All = 1,
    /// The acting user's department and every descendant department.
    DeptAndChild = 2,
    /// The acting user's department only.
    Dept = 3,
    /// Rows owned by the acting user.
    #[serde(rename = "SELF")]
    Owner = 4,
    /// Departments listed on the role.
    Custom = 5,
}

impl DataScope {
    /// Every scope, in code order.
    pub const ALL: [DataScope; 5] = [
        Self::All,
        Self::DeptAndChild,
        Self::Dept,
        Self::Owner,
        Self::Custom,
    ];

    /// The numeric code of this scope.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a scope by its numeric code.
    pub fn from_code(code: u8) -> QueryResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.code() == code)
            .ok_or_else(|| QueryError::invalid_parameter("data_scope", format!("unknown code {}", code)))
    }

    /// The canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::DeptAndChild => "DEPT_AND_CHILD",
            Self::Dept => "DEPT",
            Self::Owner => "SELF",
            Self::Custom => "CUSTOM",
        }
    }

    /// Human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            Self::All => "all data",
            Self::DeptAndChild => "own department and below",
            Self::Dept => "own department",
            Self::Owner => "own data only",
            Self::Custom => "custom departments",
        }
    }
}

impl fmt::Display for DataScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataScope {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|scope| scope.as_str() == normalized)
            .ok_or_else(|| QueryError::invalid_parameter("data_scope", format!("unknown scope {}", s)))
    }
}

/// A user or department identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeId {
    /// Numeric id.
    Int(i64),
    /// String id (UUIDs, external keys).
    Str(String),
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ScopeId {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for ScopeId {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<&str> for ScopeId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ScopeId {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<uuid::Uuid> for ScopeId {
    fn from(u: uuid::Uuid) -> Self {
        Self::Str(u.to_string())
    }
}

impl From<ScopeId> for FilterValue {
    fn from(id: ScopeId) -> Self {
        match id {
            ScopeId::Int(i) => FilterValue::Int(i),
            ScopeId::Str(s) => FilterValue::String(s),
        }
    }
}

impl From<&ScopeId> for FilterValue {
    fn from(id: &ScopeId) -> Self {
        id.clone().into()
    }
}

/// One role's authorization grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleContext {
    /// Role identifier.
    pub role_id: String,
    /// Rows the role may see.
    pub data_scope: DataScope,
    /// Departments for a [`DataScope::Custom`] grant.
    #[serde(default)]
    pub custom_dept_ids: Vec<ScopeId>,
}

impl RoleContext {
    /// Create a role grant.
    pub fn new(role_id: impl Into<String>, data_scope: DataScope) -> Self {
        Self {
            role_id: role_id.into(),
            data_scope,
            custom_dept_ids: Vec::new(),
        }
    }

    /// A [`DataScope::Custom`] grant over the given departments.
    pub fn custom<I, D>(role_id: impl Into<String>, dept_ids: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<ScopeId>,
    {
        Self::new(role_id, DataScope::Custom).with_custom_depts(dept_ids)
    }

    /// Attach custom department ids.
    pub fn with_custom_depts<I, D>(mut self, dept_ids: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<ScopeId>,
    {
        self.custom_dept_ids.extend(dept_ids.into_iter().map(Into::into));
        self
    }
}

/// The acting user and their role grants for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Acting user id.
    pub user_id: ScopeId,
    /// Acting user's department, if any.
    #[serde(default)]
    pub dept_id: Option<ScopeId>,
    /// Role grants.
    #[serde(default)]
    pub roles: Vec<RoleContext>,
}

impl AuthContext {
    /// A context for `user_id` without department or roles.
    pub fn new(user_id: impl Into<ScopeId>) -> Self {
        Self {
            user_id: user_id.into(),
            dept_id: None,
            roles: Vec::new(),
        }
    }

    /// Set the acting user's department.
    pub fn with_dept(mut self, dept_id: impl Into<ScopeId>) -> Self {
        self.dept_id = Some(dept_id.into());
        self
    }

    /// Add a role grant.
    pub fn with_role(mut self, role: RoleContext) -> Self {
        self.roles.push(role);
        self
    }

    /// Add several role grants.
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = RoleContext>) -> Self {
        self.roles.extend(roles);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_data_scope_codes() {
        assert_eq!(DataScope::All.code(), 1);
        assert_eq!(DataScope::DeptAndChild.code(), 2);
        assert_eq!(DataScope::Dept.code(), 3);
        assert_eq!(DataScope::Owner.code(), 4);
        assert_eq!(DataScope::Custom.code(), 5);
        assert_eq!(DataScope::from_code(4).unwrap(), DataScope::Owner);
        assert_eq!(
            DataScope::from_code(9).unwrap_err().code,
            ErrorCode::InvalidParameter
        );
    }

    #[test]
    fn test_data_scope_names() {
        assert_eq!("self".parse::<DataScope>().unwrap(), DataScope::Owner);
        assert_eq!("DEPT_AND_CHILD".parse::<DataScope>().unwrap(), DataScope::DeptAndChild);
        assert!("EVERYTHING".parse::<DataScope>().is_err());

        let json = serde_json::to_string(&DataScope::Owner).unwrap();
        assert_eq!(json, "\"SELF\"");
    }

    #[test]
    fn test_scope_id_conversions() {
        assert_eq!(ScopeId::from(7), ScopeId::Int(7));
        assert_eq!(ScopeId::from("u1").to_string(), "u1");
        assert_eq!(FilterValue::from(ScopeId::Int(3)), FilterValue::Int(3));
    }

    #[test]
    fn test_auth_context_from_json() {
        let ctx: AuthContext = serde_json::from_value(serde_json::json!({
            "user_id": "u1",
            "dept_id": 10,
            "roles": [
                { "role_id": "auditor", "data_scope": "CUSTOM", "custom_dept_ids": [1, 2] },
                { "role_id": "staff", "data_scope": "SELF" }
            ]
        }))
        .unwrap();

        assert_eq!(ctx.user_id, ScopeId::from("u1"));
        assert_eq!(ctx.dept_id, Some(ScopeId::Int(10)));
        assert_eq!(ctx.roles[0], RoleContext::custom("auditor", [1, 2]));
        assert_eq!(ctx.roles[1], RoleContext::new("staff", DataScope::Owner));
    }
}
