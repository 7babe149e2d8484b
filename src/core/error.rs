use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,          // Index or document absent
    InvalidSchema,     // Malformed or conflicting schema
    InvalidDocument,   // Document does not match its schema
    DimensionMismatch, // Vector length differs from the declared dimensions
    InvalidQuery,
    FieldNotFound,     // Strict mode only
    Parse,
}

#[derive(Debug, Error)]
#[error("{kind:?}: {context}")]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error {
            kind,
            context: context.into(),
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_context() {
        let err = Error::new(ErrorKind::NotFound, "index 'users' not found");
        assert_eq!(err.to_string(), "NotFound: index 'users' not found");
        assert!(err.is(ErrorKind::NotFound));
    }

    #[test]
    fn json_errors_become_parse_errors() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(json_err);
        assert_eq!(err.kind, ErrorKind::Parse);
    }
}
