use std::{fmt, io};

/// Broad category of a failure, so callers can tell a dead endpoint from a
/// query that simply matched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Remote endpoint or external downloader failed.
    Network,
    /// Upstream payload or input file did not have the expected shape.
    DataFormat,
    /// Processing succeeded but produced no valid geometries.
    EmptyResult,
    Io,
    Config,
    /// One or more jobs of a run failed; each was logged as it happened.
    JobsFailed,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Network, message)
    }

    pub fn data_format(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::DataFormat, message)
    }

    pub fn empty_result(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::EmptyResult, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Config, message)
    }

    pub fn jobs_failed(count: usize) -> Self {
        Error::new(ErrorKind::JobsFailed, format!("{} job(s) failed", count))
    }

    pub fn is_empty_result(&self) -> bool {
        self.kind == ErrorKind::EmptyResult
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            message: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::DataFormat,
            message: value.to_string(),
        }
    }
}

impl From<geojson::Error> for Error {
    fn from(value: geojson::Error) -> Self {
        Error {
            kind: ErrorKind::DataFormat,
            message: value.to_string(),
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(value: ureq::Error) -> Self {
        Error {
            kind: ErrorKind::Network,
            message: value.to_string(),
        }
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error {
            kind: ErrorKind::Config,
            message: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_are_data_format() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind, ErrorKind::DataFormat);
    }

    #[test]
    fn empty_result_is_flagged() {
        let err = Error::empty_result("No valid geometries found");
        assert!(err.is_empty_result());
        assert_eq!(err.to_string(), "EmptyResult: No valid geometries found");
    }

    #[test]
    fn failed_jobs_have_their_own_kind() {
        let err = Error::jobs_failed(2);
        assert_eq!(err.kind, ErrorKind::JobsFailed);
        assert_eq!(err.to_string(), "JobsFailed: 2 job(s) failed");
    }
}
