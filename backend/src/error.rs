use shared::{ErrorKind, FieldError};
use thiserror::Error;

/// Failures signalled by the bank service
#[derive(Debug, Error)]
pub enum BankError {
    #[error("{}", join_field_errors(.0))]
    InvalidInput(Vec<FieldError>),

    #[error("Bank with id {0} not found")]
    NotFound(i64),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

fn join_field_errors(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl BankError {
    pub fn invalid(field: &str, reason: &str) -> Self {
        BankError::InvalidInput(vec![FieldError::new(field, reason)])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BankError::InvalidInput(_) => ErrorKind::InvalidInput,
            BankError::NotFound(_) => ErrorKind::NotFound,
            BankError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            BankError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message that is safe to show to a client
    pub fn public_message(&self) -> String {
        match self {
            BankError::InvalidInput(_) | BankError::NotFound(_) => self.to_string(),
            BankError::StorageUnavailable(_) => "Storage backend is unavailable".to_string(),
            BankError::Internal(_) => "Internal server error".to_string(),
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            BankError::InvalidInput(fields) => fields,
            _ => &[],
        }
    }
}

impl From<sqlx::Error> for BankError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                BankError::StorageUnavailable(err)
            }
            other => BankError::Internal(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message_lists_every_field() {
        let err = BankError::InvalidInput(vec![
            FieldError::new("name", "is required"),
            FieldError::new("location", "is required"),
        ]);

        assert_eq!(err.to_string(), "name is required; location is required");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.field_errors().len(), 2);
    }

    #[test]
    fn test_not_found_message() {
        let err = BankError::NotFound(9999);
        assert_eq!(err.public_message(), "Bank with id 9999 not found");
        assert!(err.field_errors().is_empty());
    }

    #[test]
    fn test_sqlx_errors_are_classified() {
        let unavailable: BankError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(unavailable.kind(), ErrorKind::StorageUnavailable);
        assert_eq!(unavailable.public_message(), "Storage backend is unavailable");

        let internal: BankError = sqlx::Error::RowNotFound.into();
        assert_eq!(internal.kind(), ErrorKind::Internal);
        assert_eq!(internal.public_message(), "Internal server error");
    }
}
