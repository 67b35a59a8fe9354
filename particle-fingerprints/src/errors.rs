#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Got an invalid parameter value in a function, or inputs with
    /// inconsistent sizes
    InvalidParameter(String),
    /// Got an orientation mode name which does not correspond to any known
    /// mode
    UnsupportedMode(String),
    /// Error while serializing/deserializing data
    Json(serde_json::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::UnsupportedMode(e) => write!(f, "unsupported orientation mode: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::UnsupportedMode(_) => None,
            Error::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let error = Error::InvalidParameter("expected 3 orientations, got 2".into());
        assert_eq!(error.to_string(), "invalid parameter: expected 3 orientations, got 2");

        let error = Error::UnsupportedMode("'body'".into());
        assert_eq!(error.to_string(), "unsupported orientation mode: 'body'");

        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = Error::from(json);
        assert!(error.to_string().starts_with("json error: "));
        assert!(std::error::Error::source(&error).is_some());
    }
}
