use crate::application::repos::RepoError;

/// SQLSTATEs for values the store cannot hold as given.
const CHECK_VIOLATION: &str = "23514";
const INVALID_TEXT_REPRESENTATION: &str = "22P02";
const UNTRANSLATABLE_CHARACTER: &str = "22P05";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::Database(db) if is_invalid_input(db.as_ref()) => RepoError::InvalidInput {
            message: db.message().to_string(),
        },
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to user request") =>
        {
            RepoError::Timeout
        }
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        other => RepoError::from_persistence(other),
    }
}

fn is_invalid_input(db: &dyn sqlx::error::DatabaseError) -> bool {
    if let Some(code) = db.code()
        && matches!(
            code.as_ref(),
            CHECK_VIOLATION | INVALID_TEXT_REPRESENTATION | UNTRANSLATABLE_CHARACTER
        )
    {
        return true;
    }

    let message = db.message();
    message.contains("violates check constraint")
        || message.contains("invalid input syntax")
        // jsonb refuses `\u0000` inside strings
        || message.contains("unsupported Unicode escape sequence")
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct FakeDbError {
        message: &'static str,
        code: Option<&'static str>,
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn db_error(message: &'static str, code: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { message, code }))
    }

    #[test]
    fn nul_escape_in_jsonb_is_invalid_input() {
        let err = map_sqlx_error(db_error(
            "unsupported Unicode escape sequence",
            Some(UNTRANSLATABLE_CHARACTER),
        ));
        assert!(matches!(err, RepoError::InvalidInput { .. }));

        let err = map_sqlx_error(db_error("unsupported Unicode escape sequence", None));
        assert!(matches!(err, RepoError::InvalidInput { .. }));
    }

    #[test]
    fn check_violation_is_invalid_input() {
        let err = map_sqlx_error(db_error(
            "new row for relation \"records\" violates check constraint \"records_body_is_object\"",
            Some(CHECK_VIOLATION),
        ));
        assert!(matches!(err, RepoError::InvalidInput { .. }));
    }

    #[test]
    fn cancellation_and_pool_timeout_are_timeouts() {
        let err = map_sqlx_error(db_error("canceling statement due to user request", Some("57014")));
        assert!(matches!(err, RepoError::Timeout));
        assert!(matches!(map_sqlx_error(sqlx::Error::PoolTimedOut), RepoError::Timeout));
    }

    #[test]
    fn other_database_errors_are_persistence_failures() {
        let err = map_sqlx_error(db_error("relation \"records\" does not exist", Some("42P01")));
        assert!(matches!(err, RepoError::Persistence(_)));
    }
}
