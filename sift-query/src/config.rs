//! Configuration file parsing for `sift.toml`.
//!
//! ```toml
//! [data_permission]
//! owner_column = "create_user"
//! dept_column = "dept_id"
//! table_alias = "t"
//!
//! [pagination]
//! default_size = 10
//! max_limit = 500
//! overflow = false
//!
//! [sql]
//! dialect = "postgresql"
//!
//! [environments.test.pagination]
//! max_limit = 50
//! ```
//!
//! Values may reference environment variables as `${VAR_NAME}`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use miette::Diagnostic;
use regex_lite::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::error::QueryError;
use crate::scope::{ScopeColumns, ScopeResolver};
use crate::sql::{DatabaseType, SqlRenderer, validate_identifier};

/// Errors raised while loading configuration.
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    /// Error reading the config file.
    #[error("failed to read config file: {path}")]
    #[diagnostic(code(sift::config::io_error))]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(sift::config::toml_error))]
    Toml {
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(sift::config::invalid),
        help("column names may only contain letters, digits and underscores")
    )]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for QueryError {
    fn from(err: ConfigError) -> Self {
        QueryError::invalid_configuration(err.to_string()).with_source(err)
    }
}

/// Main configuration structure for `sift.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiftConfig {
    /// Data permission columns.
    #[serde(default)]
    pub data_permission: DataPermissionConfig,

    /// Paging defaults and limits.
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// SQL rendering.
    #[serde(default)]
    pub sql: SqlConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl SiftConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> ConfigResult<Self> {
        let expanded = expand_env_vars(content);

        let config: Self =
            toml::from_str(&expanded).map_err(|e| ConfigError::Toml { source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-specific overrides and validate the result.
    ///
    /// An unknown environment leaves the configuration unchanged.
    pub fn with_environment(mut self, env: &str) -> ConfigResult<Self> {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(dp) = overrides.data_permission {
                if let Some(owner) = dp.owner_column {
                    self.data_permission.owner_column = owner;
                }
                if let Some(dept) = dp.dept_column {
                    self.data_permission.dept_column = dept;
                }
                if let Some(alias) = dp.table_alias {
                    self.data_permission.table_alias = Some(alias);
                }
            }
            if let Some(pagination) = overrides.pagination {
                if let Some(size) = pagination.default_size {
                    self.pagination.default_size = size;
                }
                if let Some(limit) = pagination.max_limit {
                    self.pagination.max_limit =
                        page_limit(limit).map_err(|message| ConfigError::Invalid { message })?;
                }
                if let Some(overflow) = pagination.overflow {
                    self.pagination.overflow = overflow;
                }
            }
            if let Some(sql) = overrides.sql {
                self.sql = sql;
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Check column names and paging limits.
    pub fn validate(&self) -> ConfigResult<()> {
        let dp = &self.data_permission;
        for (key, value) in [
            ("data_permission.owner_column", Some(&dp.owner_column)),
            ("data_permission.dept_column", Some(&dp.dept_column)),
            ("data_permission.table_alias", dp.table_alias.as_ref()),
        ] {
            if let Some(value) = value {
                validate_identifier(value).map_err(|_| ConfigError::Invalid {
                    message: format!("{} = \"{}\" is not a safe SQL identifier", key, value),
                })?;
            }
        }

        if self.pagination.default_size == 0 {
            return Err(ConfigError::Invalid {
                message: "pagination.default_size must be at least 1".to_string(),
            });
        }
        if self.pagination.max_limit == Some(0) {
            return Err(ConfigError::Invalid {
                message: "pagination.max_limit must be positive, or -1 for no limit".to_string(),
            });
        }
        Ok(())
    }

    /// A scope resolver over the configured columns.
    pub fn scope_resolver(&self) -> ScopeResolver {
        ScopeResolver::new(self.data_permission.columns())
    }

    /// A renderer for the configured dialect.
    pub fn renderer(&self) -> SqlRenderer {
        SqlRenderer::new(self.sql.dialect)
    }
}

/// Columns used by the data scope predicates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DataPermissionConfig {
    /// Column holding the owning user id.
    #[serde(default = "default_owner_column")]
    pub owner_column: String,

    /// Column holding the owning department id.
    #[serde(default = "default_dept_column")]
    pub dept_column: String,

    /// Table alias qualifying both columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_alias: Option<String>,
}

impl Default for DataPermissionConfig {
    fn default() -> Self {
        Self {
            owner_column: default_owner_column(),
            dept_column: default_dept_column(),
            table_alias: None,
        }
    }
}

impl DataPermissionConfig {
    /// The scope columns, qualified by the alias when one is set.
    pub fn columns(&self) -> ScopeColumns {
        let columns = ScopeColumns::new(&self.owner_column, &self.dept_column);
        match &self.table_alias {
            Some(alias) => columns.with_alias(alias),
            None => columns,
        }
    }
}

fn default_owner_column() -> String { "create_user".to_string() }
fn default_dept_column() -> String { "dept_id".to_string() }

/// Paging defaults and limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// Page size when the request gives none.
    #[serde(default = "default_page_size")]
    pub default_size: u64,

    /// Largest page size a request may ask for. `-1` or absent means no
    /// limit.
    #[serde(
        default,
        deserialize_with = "deserialize_limit",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_limit: Option<u64>,

    /// Wrap a page past the last one back to page 1.
    #[serde(default)]
    pub overflow: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_size: default_page_size(),
            max_limit: None,
            overflow: false,
        }
    }
}

fn default_page_size() -> u64 { 10 }

/// `-1` means no limit. Any other negative value is rejected.
fn page_limit(raw: i64) -> Result<Option<u64>, String> {
    match raw {
        -1 => Ok(None),
        limit => u64::try_from(limit).map(Some).map_err(|_| {
            format!("pagination.max_limit must be positive, or -1 for no limit, found {}", limit)
        }),
    }
}

fn deserialize_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<i64>::deserialize(deserializer)? {
        Some(raw) => page_limit(raw).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// SQL rendering settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SqlConfig {
    /// Target dialect.
    #[serde(default)]
    pub dialect: DatabaseType,
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Data permission overrides.
    pub data_permission: Option<DataPermissionOverride>,

    /// Pagination overrides.
    pub pagination: Option<PaginationOverride>,

    /// SQL overrides.
    pub sql: Option<SqlConfig>,
}

/// Data permission overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DataPermissionOverride {
    /// Override owner_column.
    pub owner_column: Option<String>,

    /// Override dept_column.
    pub dept_column: Option<String>,

    /// Override table_alias.
    pub table_alias: Option<String>,
}

/// Pagination overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationOverride {
    /// Override default_size.
    pub default_size: Option<u64>,

    /// Override max_limit; `-1` removes the limit.
    pub max_limit: Option<i64>,

    /// Override overflow.
    pub overflow: Option<bool>,
}

static ENV_VAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").ok());

/// Expand environment variables in the format `${VAR_NAME}`.
///
/// Unset variables are left as written.
fn expand_env_vars(content: &str) -> String {
    match ENV_VAR.as_ref() {
        Some(re) => re
            .replace_all(content, |caps: &Captures<'_>| {
                std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
            })
            .into_owned(),
        None => content.to_string(),
    }
}
