//! Status code conversion utilities for FFI.

use super::raw::{
    ErrCode, LIBRARY_DIMENSIONS_ERROR, LIBRARY_FUNCTION_ERROR, LIBRARY_MEMORY_ERROR,
    LIBRARY_NO_ERROR, LIBRARY_NUMERICAL_ERROR, LIBRARY_RANK_ERROR, LIBRARY_TYPE_ERROR,
    LIBRARY_VERSION_ERROR,
};
use crate::error::Error;

/// Check a host status code and convert it to a Result.
///
/// `on_error` builds the error from the non-zero code.
pub fn check_error(code: ErrCode, on_error: impl FnOnce(ErrCode) -> Error) -> crate::Result<()> {
    if code == LIBRARY_NO_ERROR {
        Ok(())
    } else {
        Err(on_error(code))
    }
}

/// Symbolic name of a host status code.
pub fn error_name(code: ErrCode) -> &'static str {
    match code {
        LIBRARY_NO_ERROR => "NoError",
        LIBRARY_TYPE_ERROR => "TypeError",
        LIBRARY_RANK_ERROR => "RankError",
        LIBRARY_DIMENSIONS_ERROR => "DimensionsError",
        LIBRARY_NUMERICAL_ERROR => "NumericalError",
        LIBRARY_MEMORY_ERROR => "MemoryError",
        LIBRARY_FUNCTION_ERROR => "FunctionError",
        LIBRARY_VERSION_ERROR => "VersionError",
        _ => "UnknownError",
    }
}
