//! Ownership-safe wrappers for containers allocated by a host runtime.
//!
//! A host runtime hands containers (tensors, numeric arrays, images, sparse
//! arrays and data stores) to a loaded library as raw handles, under one of
//! several passing conventions. This crate wraps each handle in a
//! [`GenericContainer`] that records who is responsible for releasing it and
//! runs the matching cleanup exactly once.
//!
//! # Example
//!
//! ```no_run
//! use llink::ffi::{LibraryFunctions, MArgument, MTensor};
//! use llink::{GenericTensor, HostContext, PassingMode, TensorType};
//!
//! # fn entry(raw_table: *const LibraryFunctions, arg: MTensor, res: MArgument) -> llink::Result<()> {
//! // Built once, when the host initializes the library
//! let host = unsafe { HostContext::from_raw(raw_table)? };
//!
//! // A tensor passed in "Manual" mode belongs to the library
//! let input = unsafe { GenericTensor::from_argument(&host, arg, PassingMode::Manual)? };
//! println!("input has {} elements", input.flattened_length());
//!
//! // A fresh tensor handed back to the host is not freed on this side
//! let mut output = GenericTensor::new(&host, TensorType::Real, &[2, 2])?;
//! unsafe { output.pass_to_host(res) };
//!
//! // `input` is freed here, `output` is left to the host
//! # Ok(())
//! # }
//! ```

pub mod container;
pub mod context;
pub mod data_store;
pub mod error;
pub mod ffi;
pub mod image;
pub mod kind;
pub mod numeric_array;
pub mod ownership;
pub mod sparse_array;
pub mod tensor;
pub mod types;

// Re-export main types at the crate root
pub use container::{Borrowed, GenericContainer};
pub use context::{HostContext, HostFunctions};
pub use data_store::{DataStoreValue, GenericDataStore};
pub use error::{Error, Result};
pub use image::GenericImage;
pub use kind::{ContainerKind, VariantKind};
pub use numeric_array::GenericNumericArray;
pub use ownership::{Ownership, PassingMode};
pub use sparse_array::GenericSparseArray;
pub use tensor::GenericTensor;
pub use types::{
    ColorSpace, ConversionMethod, ConversionOptions, ImageDataType, ImageOptions,
    NumericArrayType, TensorType,
};

/// API version constants.
pub mod version {
    /// API major version.
    pub const MAJOR: i32 = 0;
    /// API minor version.
    pub const MINOR: i32 = 1;
    /// API patch version.
    pub const PATCH: i32 = 0;
    /// Layout version of the host function tables.
    pub const LIBRARY_VERSION: crate::ffi::MInt = 1;
}

/// Get the API version string (e.g., "0.1.0").
pub fn api_version() -> String {
    format!("{}.{}.{}", version::MAJOR, version::MINOR, version::PATCH)
}

/// Check if this crate is compatible with code written against the given
/// major.minor version.
pub fn api_version_compatible(major: i32, minor: i32) -> bool {
    major == version::MAJOR && minor <= version::MINOR
}
