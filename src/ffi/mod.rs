//! FFI layer for the host runtime.
//!
//! This module contains the raw handle types and the C layout of the host
//! function tables. Users should prefer the safe container wrappers in the
//! parent modules.

pub mod error;
pub mod handles;
pub mod raw;

pub use error::{check_error, error_name};
pub use handles::*;
pub use raw::*;
