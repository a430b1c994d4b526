//! Fabricated server errors.
//!
//! Code under test usually branches on the number, class or state of a
//! server error (retry on deadlock, surface constraint violations). These
//! types let tests build such errors directly and raise them from an
//! [`ObjectSet`](crate::ObjectSet) or return them from their own fakes.
//!
//! ```
//! use sql_testkit::{SqlError, SqlException};
//!
//! let exception = SqlException::new(SqlError::deadlock());
//! assert_eq!(exception.number(), 1205);
//! ```

use thiserror::Error;
use uuid::Uuid;

/// Default server name reported by fabricated errors.
pub const DEFAULT_SERVER: &str = "testkit";

/// A single error or informational message, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlError {
    /// Error number.
    pub number: i32,
    /// Error state.
    pub state: u8,
    /// Error severity class.
    pub class: u8,
    /// Error message text.
    pub message: String,
    /// Server name.
    pub server: String,
    /// Procedure name.
    pub procedure: String,
    /// Line number.
    pub line: i32,
}

impl SqlError {
    /// Create an error with severity 16 and state 1.
    #[must_use]
    pub fn new(number: i32, message: impl Into<String>) -> Self {
        Self {
            number,
            state: 1,
            class: 16,
            message: message.into(),
            server: DEFAULT_SERVER.to_string(),
            procedure: String::new(),
            line: 0,
        }
    }

    /// Set the error state.
    #[must_use]
    pub fn with_state(mut self, state: u8) -> Self {
        self.state = state;
        self
    }

    /// Set the severity class.
    #[must_use]
    pub fn with_class(mut self, class: u8) -> Self {
        self.class = class;
        self
    }

    /// Set the server name.
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Set the procedure name and line number.
    #[must_use]
    pub fn with_procedure(mut self, procedure: impl Into<String>, line: i32) -> Self {
        self.procedure = procedure.into();
        self.line = line;
        self
    }

    /// Deadlock victim (1205).
    #[must_use]
    pub fn deadlock() -> Self {
        Self::new(
            1205,
            "Transaction was deadlocked on lock resources with another process \
             and has been chosen as the deadlock victim. Rerun the transaction.",
        )
        .with_class(13)
        .with_state(51)
    }

    /// Client-side timeout (-2).
    #[must_use]
    pub fn timeout() -> Self {
        Self::new(
            -2,
            "Execution Timeout Expired. The timeout period elapsed prior to \
             completion of the operation or the server is not responding.",
        )
        .with_class(11)
        .with_state(0)
    }

    /// Foreign key or check constraint conflict (547).
    #[must_use]
    pub fn constraint_violation(constraint: &str) -> Self {
        Self::new(
            547,
            format!("The statement conflicted with the constraint \"{constraint}\"."),
        )
        .with_state(0)
    }

    /// Duplicate key in a unique constraint (2627).
    #[must_use]
    pub fn unique_key_violation(constraint: &str, table: &str) -> Self {
        Self::new(
            2627,
            format!(
                "Violation of UNIQUE KEY constraint '{constraint}'. \
                 Cannot insert duplicate key in object '{table}'."
            ),
        )
        .with_class(14)
    }

    /// Whether this message is informational (class 10 or lower).
    #[must_use]
    pub const fn is_informational(&self) -> bool {
        self.class <= 10
    }
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// An exception carrying one or more [`SqlError`]s.
///
/// The collection is never empty; number, class and state come from the
/// first error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct SqlException {
    errors: Vec<SqlError>,
    client_connection_id: Uuid,
}

impl SqlException {
    /// Create an exception from a single error.
    #[must_use]
    pub fn new(error: SqlError) -> Self {
        Self {
            errors: vec![error],
            client_connection_id: Uuid::nil(),
        }
    }

    /// Create an exception from several errors, `None` if there are none.
    pub fn from_errors(errors: impl IntoIterator<Item = SqlError>) -> Option<Self> {
        let errors: Vec<_> = errors.into_iter().collect();
        if errors.is_empty() {
            return None;
        }
        Some(Self {
            errors,
            client_connection_id: Uuid::nil(),
        })
    }

    /// Set the client connection id reported by the exception.
    #[must_use]
    pub fn with_connection_id(mut self, id: Uuid) -> Self {
        self.client_connection_id = id;
        self
    }

    /// Append another error.
    #[must_use]
    pub fn with_error(mut self, error: SqlError) -> Self {
        self.errors.push(error);
        self
    }

    /// The errors in the order the server reported them.
    #[must_use]
    pub fn errors(&self) -> &[SqlError] {
        &self.errors
    }

    fn first(&self) -> &SqlError {
        // Constructors guarantee at least one error.
        &self.errors[0]
    }

    /// Number of the first error.
    #[must_use]
    pub fn number(&self) -> i32 {
        self.first().number
    }

    /// Severity class of the first error.
    #[must_use]
    pub fn class(&self) -> u8 {
        self.first().class
    }

    /// State of the first error.
    #[must_use]
    pub fn state(&self) -> u8 {
        self.first().state
    }

    /// Client connection id.
    #[must_use]
    pub fn client_connection_id(&self) -> Uuid {
        self.client_connection_id
    }

    /// All messages joined by newlines.
    #[must_use]
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Display for SqlException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl From<SqlError> for SqlException {
    fn from(error: SqlError) -> Self {
        Self::new(error)
    }
}
