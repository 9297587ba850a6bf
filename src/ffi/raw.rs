//! Raw C layout of the host function tables.
//!
//! The host shim fills a [`LibraryFunctions`] table once, at library
//! initialization, and hands a pointer to it to
//! [`HostContext::from_raw`](crate::HostContext::from_raw). Every entry is
//! optional; a missing entry is reported when the operation that needs it is
//! attempted. Users should prefer the safe wrappers in the parent modules.

use std::os::raw::{c_char, c_double, c_int};

use super::handles::*;

/// Machine integer used for sizes, ranks and type codes.
pub type MInt = i64;

/// Machine real.
pub type MReal = c_double;

/// Host boolean (0 is false, everything else is true).
pub type MBool = c_int;

/// Status code returned by fallible host functions.
pub type ErrCode = c_int;

/// Host complex number, laid out as `{re, im}`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MComplex {
    pub re: MReal,
    pub im: MReal,
}

// Error codes
pub const LIBRARY_NO_ERROR: ErrCode = 0;
pub const LIBRARY_TYPE_ERROR: ErrCode = 1;
pub const LIBRARY_RANK_ERROR: ErrCode = 2;
pub const LIBRARY_DIMENSIONS_ERROR: ErrCode = 3;
pub const LIBRARY_NUMERICAL_ERROR: ErrCode = 4;
pub const LIBRARY_MEMORY_ERROR: ErrCode = 5;
pub const LIBRARY_FUNCTION_ERROR: ErrCode = 6;
pub const LIBRARY_VERSION_ERROR: ErrCode = 7;

// Tensor element types
pub const MTYPE_INTEGER: MInt = 2;
pub const MTYPE_REAL: MInt = 3;
pub const MTYPE_COMPLEX: MInt = 4;

// Numeric array element types
pub const MNUMERICARRAY_TYPE_UNDEF: c_int = 0;
pub const MNUMERICARRAY_TYPE_BIT8: c_int = 1;
pub const MNUMERICARRAY_TYPE_UBIT8: c_int = 2;
pub const MNUMERICARRAY_TYPE_BIT16: c_int = 3;
pub const MNUMERICARRAY_TYPE_UBIT16: c_int = 4;
pub const MNUMERICARRAY_TYPE_BIT32: c_int = 5;
pub const MNUMERICARRAY_TYPE_UBIT32: c_int = 6;
pub const MNUMERICARRAY_TYPE_BIT64: c_int = 7;
pub const MNUMERICARRAY_TYPE_UBIT64: c_int = 8;
pub const MNUMERICARRAY_TYPE_REAL32: c_int = 9;
pub const MNUMERICARRAY_TYPE_REAL64: c_int = 10;
pub const MNUMERICARRAY_TYPE_COMPLEX_REAL32: c_int = 11;
pub const MNUMERICARRAY_TYPE_COMPLEX_REAL64: c_int = 12;

// Numeric array conversion methods
pub const MNUMERICARRAY_CONVERT_CHECK: c_int = 1;
pub const MNUMERICARRAY_CONVERT_CLIP_CHECK: c_int = 2;
pub const MNUMERICARRAY_CONVERT_COERCE: c_int = 3;
pub const MNUMERICARRAY_CONVERT_CLIP_COERCE: c_int = 4;
pub const MNUMERICARRAY_CONVERT_ROUND: c_int = 5;
pub const MNUMERICARRAY_CONVERT_CLIP_ROUND: c_int = 6;
pub const MNUMERICARRAY_CONVERT_SCALE: c_int = 7;
pub const MNUMERICARRAY_CONVERT_CLIP_SCALE: c_int = 8;

// Image data types
pub const MIMAGE_TYPE_UNDEF: c_int = -1;
pub const MIMAGE_TYPE_BIT: c_int = 1;
pub const MIMAGE_TYPE_BIT8: c_int = 2;
pub const MIMAGE_TYPE_BIT16: c_int = 3;
pub const MIMAGE_TYPE_REAL32: c_int = 4;
pub const MIMAGE_TYPE_REAL: c_int = 5;

// Image color spaces
pub const MIMAGE_CS_UNDEFINED: c_int = -1;
pub const MIMAGE_CS_GRAY: c_int = 0;
pub const MIMAGE_CS_RGB: c_int = 1;
pub const MIMAGE_CS_HSB: c_int = 2;
pub const MIMAGE_CS_CMYK: c_int = 3;
pub const MIMAGE_CS_XYZ: c_int = 4;
pub const MIMAGE_CS_LUV: c_int = 5;
pub const MIMAGE_CS_LAB: c_int = 6;
pub const MIMAGE_CS_LCH: c_int = 7;
pub const MIMAGE_CS_AUTOMATIC: c_int = 8;

/// Tensor functions exported by the host.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct TensorFunctions {
    pub new: Option<unsafe extern "C" fn(MInt, MInt, *const MInt, *mut MTensor) -> ErrCode>,
    pub clone: Option<unsafe extern "C" fn(MTensor, *mut MTensor) -> ErrCode>,
    pub free: Option<unsafe extern "C" fn(MTensor)>,
    pub disown: Option<unsafe extern "C" fn(MTensor)>,
    pub share_count: Option<unsafe extern "C" fn(MTensor) -> MInt>,
    pub get_type: Option<unsafe extern "C" fn(MTensor) -> MInt>,
    pub get_rank: Option<unsafe extern "C" fn(MTensor) -> MInt>,
    pub get_dimensions: Option<unsafe extern "C" fn(MTensor) -> *const MInt>,
    pub get_flattened_length: Option<unsafe extern "C" fn(MTensor) -> MInt>,
}

/// Numeric array functions exported by the host.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct NumericArrayFunctions {
    pub new: Option<unsafe extern "C" fn(c_int, MInt, *const MInt, *mut MNumericArray) -> ErrCode>,
    pub clone: Option<unsafe extern "C" fn(MNumericArray, *mut MNumericArray) -> ErrCode>,
    pub free: Option<unsafe extern "C" fn(MNumericArray)>,
    pub disown: Option<unsafe extern "C" fn(MNumericArray)>,
    pub share_count: Option<unsafe extern "C" fn(MNumericArray) -> MInt>,
    pub get_type: Option<unsafe extern "C" fn(MNumericArray) -> c_int>,
    pub get_rank: Option<unsafe extern "C" fn(MNumericArray) -> MInt>,
    pub get_dimensions: Option<unsafe extern "C" fn(MNumericArray) -> *const MInt>,
    pub get_flattened_length: Option<unsafe extern "C" fn(MNumericArray) -> MInt>,
    pub convert_type: Option<
        unsafe extern "C" fn(*mut MNumericArray, MNumericArray, c_int, c_int, MReal) -> ErrCode,
    >,
}

/// Image functions exported by the host.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct ImageFunctions {
    pub new_2d: Option<
        unsafe extern "C" fn(MInt, MInt, MInt, c_int, c_int, MBool, *mut MImage) -> ErrCode,
    >,
    pub new_3d: Option<
        unsafe extern "C" fn(MInt, MInt, MInt, MInt, c_int, c_int, MBool, *mut MImage) -> ErrCode,
    >,
    pub clone: Option<unsafe extern "C" fn(MImage, *mut MImage) -> ErrCode>,
    pub free: Option<unsafe extern "C" fn(MImage)>,
    pub disown: Option<unsafe extern "C" fn(MImage)>,
    pub share_count: Option<unsafe extern "C" fn(MImage) -> MInt>,
    pub get_data_type: Option<unsafe extern "C" fn(MImage) -> c_int>,
    pub get_rank: Option<unsafe extern "C" fn(MImage) -> MInt>,
    pub get_row_count: Option<unsafe extern "C" fn(MImage) -> MInt>,
    pub get_column_count: Option<unsafe extern "C" fn(MImage) -> MInt>,
    pub get_slice_count: Option<unsafe extern "C" fn(MImage) -> MInt>,
    pub get_channels: Option<unsafe extern "C" fn(MImage) -> MInt>,
    pub alpha_channel_q: Option<unsafe extern "C" fn(MImage) -> MBool>,
    pub interleaved_q: Option<unsafe extern "C" fn(MImage) -> MBool>,
    pub get_color_space: Option<unsafe extern "C" fn(MImage) -> c_int>,
    pub get_flattened_length: Option<unsafe extern "C" fn(MImage) -> MInt>,
    pub convert_type: Option<unsafe extern "C" fn(MImage, c_int, MBool) -> MImage>,
}

/// Sparse array functions exported by the host.
///
/// `get_implicit_value` and `get_explicit_values` return tensors owned by the
/// sparse array itself.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct SparseArrayFunctions {
    pub from_explicit_positions: Option<
        unsafe extern "C" fn(MTensor, MTensor, MTensor, MTensor, *mut MSparseArray) -> ErrCode,
    >,
    pub from_tensor: Option<unsafe extern "C" fn(MTensor, MTensor, *mut MSparseArray) -> ErrCode>,
    pub reset_implicit_value:
        Option<unsafe extern "C" fn(MSparseArray, MTensor, *mut MSparseArray) -> ErrCode>,
    pub clone: Option<unsafe extern "C" fn(MSparseArray, *mut MSparseArray) -> ErrCode>,
    pub free: Option<unsafe extern "C" fn(MSparseArray)>,
    pub disown: Option<unsafe extern "C" fn(MSparseArray)>,
    pub share_count: Option<unsafe extern "C" fn(MSparseArray) -> MInt>,
    pub get_implicit_value: Option<unsafe extern "C" fn(MSparseArray) -> *mut MTensor>,
    pub get_explicit_values: Option<unsafe extern "C" fn(MSparseArray) -> *mut MTensor>,
    pub get_explicit_positions: Option<unsafe extern "C" fn(MSparseArray, *mut MTensor) -> ErrCode>,
    pub to_tensor: Option<unsafe extern "C" fn(MSparseArray, *mut MTensor) -> ErrCode>,
    pub get_rank: Option<unsafe extern "C" fn(MSparseArray) -> MInt>,
    pub get_dimensions: Option<unsafe extern "C" fn(MSparseArray) -> *const MInt>,
}

/// Data store functions exported by the host.
///
/// Data stores are never shared with the host, so there is no `disown` or
/// `share_count` entry. The `add_*` entries for containers hand the handle
/// over to the store; strings are copied. The `add_named_*` entries take a
/// NUL-terminated entry name.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct DataStoreFunctions {
    pub create: Option<unsafe extern "C" fn() -> MDataStore>,
    pub copy: Option<unsafe extern "C" fn(MDataStore) -> MDataStore>,
    pub delete: Option<unsafe extern "C" fn(MDataStore)>,
    pub get_length: Option<unsafe extern "C" fn(MDataStore) -> MInt>,
    pub add_integer: Option<unsafe extern "C" fn(MDataStore, MInt)>,
    pub add_real: Option<unsafe extern "C" fn(MDataStore, MReal)>,
    pub add_boolean: Option<unsafe extern "C" fn(MDataStore, MBool)>,
    pub add_complex: Option<unsafe extern "C" fn(MDataStore, MComplex)>,
    pub add_string: Option<unsafe extern "C" fn(MDataStore, *mut c_char)>,
    pub add_tensor: Option<unsafe extern "C" fn(MDataStore, MTensor)>,
    pub add_sparse_array: Option<unsafe extern "C" fn(MDataStore, MSparseArray)>,
    pub add_numeric_array: Option<unsafe extern "C" fn(MDataStore, MNumericArray)>,
    pub add_image: Option<unsafe extern "C" fn(MDataStore, MImage)>,
    pub add_data_store: Option<unsafe extern "C" fn(MDataStore, MDataStore)>,
    pub add_named_integer: Option<unsafe extern "C" fn(MDataStore, *mut c_char, MInt)>,
    pub add_named_real: Option<unsafe extern "C" fn(MDataStore, *mut c_char, MReal)>,
    pub add_named_boolean: Option<unsafe extern "C" fn(MDataStore, *mut c_char, MBool)>,
    pub add_named_complex: Option<unsafe extern "C" fn(MDataStore, *mut c_char, MComplex)>,
    pub add_named_string: Option<unsafe extern "C" fn(MDataStore, *mut c_char, *mut c_char)>,
    pub add_named_tensor: Option<unsafe extern "C" fn(MDataStore, *mut c_char, MTensor)>,
    pub add_named_sparse_array: Option<unsafe extern "C" fn(MDataStore, *mut c_char, MSparseArray)>,
    pub add_named_numeric_array: Option<unsafe extern "C" fn(MDataStore, *mut c_char, MNumericArray)>,
    pub add_named_image: Option<unsafe extern "C" fn(MDataStore, *mut c_char, MImage)>,
    pub add_named_data_store: Option<unsafe extern "C" fn(MDataStore, *mut c_char, MDataStore)>,
}

/// Root table handed over by the host shim at initialization.
///
/// Any per-kind pointer may be null when the host does not support that
/// container kind.
#[repr(C)]
pub struct LibraryFunctions {
    pub version: MInt,
    pub tensor: *const TensorFunctions,
    pub numeric_array: *const NumericArrayFunctions,
    pub image: *const ImageFunctions,
    pub sparse_array: *const SparseArrayFunctions,
    pub data_store: *const DataStoreFunctions,
}

impl Default for LibraryFunctions {
    fn default() -> Self {
        Self {
            version: 0,
            tensor: std::ptr::null(),
            numeric_array: std::ptr::null(),
            image: std::ptr::null(),
            sparse_array: std::ptr::null(),
            data_store: std::ptr::null(),
        }
    }
}

/// Result slot of a library function call.
///
/// Only the field matching the declared return type of the function is
/// valid; it points at storage owned by the host.
#[repr(C)]
#[derive(Clone, Copy)]
pub union MArgument {
    pub boolean: *mut MBool,
    pub integer: *mut MInt,
    pub real: *mut MReal,
    pub tensor: *mut MTensor,
    pub sparse: *mut MSparseArray,
    pub numeric: *mut MNumericArray,
    pub image: *mut MImage,
    pub data_store: *mut MDataStore,
    pub utf8string: *mut *mut c_char,
}
