use std::collections::TryReserveError;
use std::error::Error;
use std::fmt;

/// AvlError enumerates over all errors that the fallible set operations
/// shall return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvlError {
    /// Growing the node storage failed. The set is left exactly as it was
    /// before the call.
    AllocationFailed(TryReserveError),
}

impl fmt::Display for AvlError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AvlError::AllocationFailed(err) => write!(f, "node allocation failed: {}", err),
        }
    }
}

impl Error for AvlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AvlError::AllocationFailed(err) => Some(err),
        }
    }
}

impl From<TryReserveError> for AvlError {
    fn from(err: TryReserveError) -> Self {
        AvlError::AllocationFailed(err)
    }
}
