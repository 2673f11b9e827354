use std::fmt::{Debug, Display, Formatter};

/// Platform error code, as returned by `GetLastError`.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    /// `ERROR_GEN_FAILURE`: a device attached to the system is not functioning.
    pub const GEN_FAILURE: Self = Self(31);

    /// Some calls report failure without setting the last error;
    /// a zero code would render as "The operation completed successfully".
    pub fn or_gen_failure(self) -> Self {
        if self.0 == 0 {
            Self::GEN_FAILURE
        } else {
            self
        }
    }
}

impl Debug for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ErrorCode(0x{:08X})", self.0)
    }
}

impl Display for ErrorCode {
    #[cfg(windows)]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use windows::Win32::Foundation::WIN32_ERROR;
        Display::fmt(&windows::core::Error::from(WIN32_ERROR(self.0)), f)
    }

    #[cfg(not(windows))]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "error code 0x{:08X}", self.0)
    }
}

/// Which way a power state change was heading when it failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PowerRequest {
    Enable,
    Disable,
}

#[derive(Clone, PartialEq)]
pub enum Error {
    /// Another instance holds the singleton mutex.
    AlreadyRunning,
    /// The singleton mutex could not be created at all.
    LockUnavailable(ErrorCode),
    PowerStateChangeFailed {
        request: PowerRequest,
        code: ErrorCode,
    },
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "Another instance is already running"),
            Self::LockUnavailable(code) => {
                write!(f, "Failed to create the single instance lock: {code}")
            }
            Self::PowerStateChangeFailed {
                request: PowerRequest::Enable,
                code,
            } => write!(f, "Failed to prevent sleep: {code}"),
            Self::PowerStateChangeFailed {
                request: PowerRequest::Disable,
                code,
            } => write!(f, "Failed to allow sleep: {code}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_last_error_becomes_gen_failure() {
        assert_eq!(ErrorCode(0).or_gen_failure(), ErrorCode::GEN_FAILURE);
        assert_eq!(ErrorCode(5).or_gen_failure(), ErrorCode(5));
    }

    #[test]
    fn power_failure_never_reports_success() {
        let err = Error::PowerStateChangeFailed {
            request: PowerRequest::Enable,
            code: ErrorCode(0).or_gen_failure(),
        };
        assert_eq!(
            err,
            Error::PowerStateChangeFailed {
                request: PowerRequest::Enable,
                code: ErrorCode(31),
            }
        );
        assert!(err.to_string().starts_with("Failed to prevent sleep: "));
    }
}
