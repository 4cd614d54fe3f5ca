//! Error types for criteria compilation and scope resolution.
//!
//! Every failure in this crate is a pure-computation failure: nothing is
//! retried and no partial predicate is ever returned. A half-built filter or a
//! half-built scope would silently widen or narrow what a caller can see, so
//! every error aborts the whole call.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: S{category}{number}
//! - 1xxx: Criteria errors (reflection, malformed operands, unsupported operators)
//! - 2xxx: Scope errors (misconfigured roles, failing collaborators)
//! - 5xxx: Request parameter errors (paging, sorting)
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use sift_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::invalid_range("createTime");
//! assert_eq!(err.code, ErrorCode::InvalidRange);
//! assert!(err.is_client_error());
//! assert!(err.to_string().contains("createTime"));
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for compile, resolve and assemble operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Criteria errors (1xxx)
    /// The criteria value's shape cannot be introspected (S1001).
    Reflection = 1001,
    /// A BETWEEN operand is not a two-element range (S1002).
    InvalidRange = 1002,
    /// An IN / NOT_IN operand is an empty sequence (S1003).
    EmptyCollection = 1003,
    /// The operator is unknown or not enabled in the registry (S1004).
    UnsupportedOperator = 1004,

    // Scope errors (2xxx)
    /// A role grant lacks the data its scope needs (S2001).
    MissingScopeData = 2001,
    /// An external collaborator (org hierarchy, identity provider) failed (S2002).
    CollaboratorFailed = 2002,

    // Parameter errors (5xxx)
    /// Invalid request parameter (S5003).
    InvalidParameter = 5003,

    // Configuration errors (7xxx)
    /// Invalid configuration (S7001).
    InvalidConfiguration = 7001,

    // Internal errors (9xxx)
    /// Internal error (S9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "S1002").
    pub fn code(&self) -> String {
        format!("S{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Reflection => "Criteria cannot be introspected",
            Self::InvalidRange => "Invalid range operand",
            Self::EmptyCollection => "Empty collection operand",
            Self::UnsupportedOperator => "Unsupported operator",
            Self::MissingScopeData => "Missing data scope data",
            Self::CollaboratorFailed => "Collaborator failed",
            Self::InvalidParameter => "Invalid parameter",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The criteria field involved.
    pub field: Option<String>,
    /// The role involved.
    pub role: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while compiling criteria or resolving data scopes.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.context.role = Some(role.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// The criteria value could not be introspected.
    pub fn reflection(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::Reflection,
            format!("Cannot introspect criteria: {}", message),
        )
        .with_help("Criteria must be a struct deriving Criteria or a JSON object matching its schema")
    }

    /// A BETWEEN field did not hold exactly two values.
    pub fn invalid_range(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::InvalidRange,
            format!("[{}] must be a range of exactly two values", field),
        )
        .with_field(&field)
        .with_suggestion("Send the lower and upper bound, in that order")
    }

    /// An IN / NOT_IN field held an empty sequence.
    pub fn empty_collection(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::EmptyCollection,
            format!("[{}] must not be empty", field),
        )
        .with_field(&field)
    }

    /// The operator is not supported by the registry in use.
    pub fn unsupported_operator(operator: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::UnsupportedOperator,
            format!("Operator [{}] is not supported", operator),
        )
        .with_help("Check the operator name against OperatorKind or enable it in the registry")
    }

    /// A role grant is missing the data its scope needs.
    pub fn missing_scope_data(role: impl Into<String>, message: impl Into<String>) -> Self {
        let role = role.into();
        let message = message.into();
        Self::new(
            ErrorCode::MissingScopeData,
            format!("Role [{}] is misconfigured: {}", role, message),
        )
        .with_role(&role)
        .with_help("Validate data scope settings when the role is assigned")
    }

    /// An external collaborator failed.
    pub fn collaborator(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::CollaboratorFailed,
            format!("{} failed: {}", name.into(), message.into()),
        )
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidParameter,
            format!("Invalid parameter {}: {}", field, message),
        )
        .with_field(&field)
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Invalid configuration: {}", message.into()),
        )
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message.into()))
    }

    // ============== Error Checks ==============

    /// Whether the error was caused by malformed client input.
    ///
    /// Only operand errors qualify; reflection, operator and scope errors are
    /// server-side faults even when a request triggered them.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InvalidRange | ErrorCode::EmptyCollection | ErrorCode::InvalidParameter
        )
    }

    /// Whether the error is a scope (authorization) failure.
    pub fn is_scope_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::MissingScopeData | ErrorCode::CollaboratorFailed
        )
    }

    /// Check if this error is retryable. Always false.
    pub fn is_retryable(&self) -> bool {
        false
    }

    // ============== Display Functions ==============

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(ref role) = self.context.role {
            output.push_str(&format!("  → Role: {}\n", role));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

/// Helper for creating errors with context.
#[macro_export]
macro_rules! query_error {
    ($code:expr, $msg:expr) => {
        $crate::error::QueryError::new($code, $msg)
    };
    ($code:expr, $msg:expr, $($key:ident = $value:expr),+ $(,)?) => {{
        let mut err = $crate::error::QueryError::new($code, $msg);
        $(
            err = err.$key($value);
        )+
        err
    }};
}
