#[derive(Debug)]
pub enum StoreError {
    NotFound(String),
    Conflict(String),
    AlreadyExists(String),
    InvalidInput(String),
    Sqlite(rusqlite::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::AlreadyExists(_) => "already_exists",
            Self::InvalidInput(_) => "invalid_input",
            Self::Sqlite(_) => "sqlite_error",
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "document `{path}` not found"),
            Self::Conflict(path) => write!(
                f,
                "document `{path}` was modified concurrently; reload and retry"
            ),
            Self::AlreadyExists(path) => write!(f, "document `{path}` already exists"),
            Self::InvalidInput(message) => write!(f, "{message}"),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
