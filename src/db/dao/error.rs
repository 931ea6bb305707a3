use std::fmt;

use sea_orm::{DbErr, SqlErr};

use crate::auth::password::PasswordError;

#[derive(Debug)]
pub enum DaoLayerError {
    Db(DbErr),
    NotFound { entity: &'static str, id: i32 },
    Conflict { entity: &'static str, detail: String },
    InvalidPagination { page: u64, page_size: u64 },
    Password(PasswordError),
}

pub type DaoResult<T> = Result<T, DaoLayerError>;

impl DaoLayerError {
    /// Splits constraint violations out of generic database errors.
    pub fn from_db(entity: &'static str, err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail))
            | Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                DaoLayerError::Conflict { entity, detail }
            }
            _ => DaoLayerError::Db(err),
        }
    }
}

impl fmt::Display for DaoLayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaoLayerError::Db(err) => write!(f, "Database error: {err}"),
            DaoLayerError::NotFound { entity, id } => {
                write!(f, "{entity} not found (id={id})")
            }
            DaoLayerError::Conflict { entity, detail } => {
                write!(f, "{entity} violates a constraint: {detail}")
            }
            DaoLayerError::InvalidPagination { page, page_size } => write!(
                f,
                "Invalid pagination: page={page} page_size={page_size}"
            ),
            DaoLayerError::Password(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DaoLayerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DaoLayerError::Db(err) => Some(err),
            DaoLayerError::Password(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PasswordError> for DaoLayerError {
    fn from(err: PasswordError) -> Self {
        DaoLayerError::Password(err)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbErr, RuntimeErr};

    use super::DaoLayerError;

    #[test]
    fn driverless_errors_stay_generic() {
        let custom = DaoLayerError::from_db("user", DbErr::Custom("duplicate key value".into()));
        let exec = DaoLayerError::from_db(
            "user",
            DbErr::Exec(RuntimeErr::Internal("connection reset".into())),
        );

        assert!(matches!(custom, DaoLayerError::Db(DbErr::Custom(_))));
        assert!(matches!(exec, DaoLayerError::Db(DbErr::Exec(_))));
    }

    #[test]
    fn conflict_names_the_entity() {
        let err = DaoLayerError::Conflict {
            entity: "user",
            detail: "users_email_key".to_string(),
        };

        assert_eq!(err.to_string(), "user violates a constraint: users_email_key");
    }
}
