//! Integration tests for `sift.toml` parsing and handling.
//!
//! These tests verify that the configuration system correctly handles
//! various configuration scenarios.

use std::io::Write;

use sift::SiftConfig;
use tempfile::NamedTempFile;
use sift_query::{
    AuthContext, ConfigError, DataScope, DatabaseType, ErrorCode, PageQuery, QueryError,
    RoleContext,
};

/// Test that an empty file yields the defaults
#[test]
fn test_config_empty() {
    let config = SiftConfig::from_str("").expect("Failed to parse config");
    assert_eq!(config.data_permission.owner_column, "create_user");
    assert_eq!(config.data_permission.dept_column, "dept_id");
    assert_eq!(config.data_permission.table_alias, None);
    assert_eq!(config.pagination.default_size, 10);
    assert_eq!(config.sql.dialect, DatabaseType::PostgreSQL);
}

/// Test full configuration with all options
#[test]
fn test_config_full() {
    let config_str = r#"
        [data_permission]
        owner_column = "creator_id"
        dept_column = "org_id"
        table_alias = "u"

        [pagination]
        default_size = 20
        max_limit = 200
        overflow = true

        [sql]
        dialect = "sqlserver"
    "#;

    let config = SiftConfig::from_str(config_str).expect("Failed to parse config");
    let columns = config.data_permission.columns();
    assert_eq!(columns.owner, "u.creator_id");
    assert_eq!(columns.dept, "u.org_id");
    assert_eq!(config.renderer().db_type(), DatabaseType::MSSQL);

    let page = PageQuery::new(1, 1000).paginate(&config.pagination).unwrap();
    assert_eq!(page.limit(), 200);
}

/// Test that the configured columns flow into the resolver
#[tokio::test]
async fn test_config_scope_resolver() {
    let config = SiftConfig::from_str(
        r#"
        [data_permission]
        owner_column = "author"
        "#,
    )
    .unwrap();

    let ctx = AuthContext::new(7).with_role(RoleContext::new("writer", DataScope::Owner));
    let scope = config.scope_resolver().resolve(&ctx).await.unwrap();
    let rendered = config.renderer().render(&scope).unwrap();
    assert_eq!(rendered.sql, "author = $1");
}

/// Test loading from disk
#[test]
fn test_config_from_file() {
    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    writeln!(file, "[sql]\ndialect = \"mysql\"").unwrap();

    let config = SiftConfig::from_file(file.path()).unwrap();
    assert_eq!(config.sql.dialect, DatabaseType::MySQL);
}

/// Test a missing file
#[test]
fn test_config_missing_file() {
    let err = SiftConfig::from_file("/definitely/not/here/sift.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("/definitely/not/here/sift.toml"));
}

/// Test environment variable expansion
#[test]
fn test_config_env_expansion() {
    // SAFETY: no other test reads this variable
    unsafe {
        std::env::set_var("SIFT_IT_DEPT_COLUMN", "branch_id");
    }

    let config = SiftConfig::from_str(
        r#"
        [data_permission]
        dept_column = "${SIFT_IT_DEPT_COLUMN}"
        "#,
    )
    .unwrap();
    assert_eq!(config.data_permission.dept_column, "branch_id");

    unsafe {
        std::env::remove_var("SIFT_IT_DEPT_COLUMN");
    }
}

/// Test environment overrides
#[test]
fn test_config_environment_override() {
    let config_str = r#"
        [sql]
        dialect = "postgresql"

        [environments.local.sql]
        dialect = "sqlite"

        [environments.local.pagination]
        default_size = 5
    "#;

    let config = SiftConfig::from_str(config_str)
        .unwrap()
        .with_environment("local")
        .unwrap();
    assert_eq!(config.sql.dialect, DatabaseType::SQLite);
    assert_eq!(config.pagination.default_size, 5);
}

/// Test that an override cannot sneak in an unsafe identifier
#[test]
fn test_config_override_is_validated() {
    let config_str = r#"
        [environments.bad.data_permission]
        owner_column = "1; DROP TABLE users"
    "#;

    let err = SiftConfig::from_str(config_str)
        .unwrap()
        .with_environment("bad")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}

/// Test conversion into the query error type
#[test]
fn test_config_error_as_query_error() {
    let err = SiftConfig::from_str("[pagination]\ndefault_size = 0\n").unwrap_err();
    let err: QueryError = err.into();
    assert_eq!(err.code, ErrorCode::InvalidConfiguration);
    assert!(!err.is_client_error());
}
