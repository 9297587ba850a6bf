//! Typed numeric buffers.

use std::os::raw::c_int;

use tracing::debug;

use crate::container::{checked_rank, copy_dimensions, GenericContainer};
use crate::context::{require, HostContext};
use crate::error::{Error, Result};
use crate::ffi::{
    check_error, error_name, MInt, MNumericArray, NumericArrayFunctions,
    LIBRARY_MEMORY_ERROR,
};
use crate::kind::{ContainerKind, NumericArray};
use crate::types::{ConversionOptions, NumericArrayType};

/// A numeric array handle with its ownership tag.
pub type GenericNumericArray<'h> = GenericContainer<'h, NumericArray>;

impl<'h> GenericContainer<'h, NumericArray> {
    /// Allocate a new numeric array with the given element type and
    /// dimensions.
    ///
    /// The new array is `CallerOwned`.
    pub fn new(host: &'h HostContext, ty: NumericArrayType, dims: &[MInt]) -> Result<Self> {
        let rank = checked_rank(NumericArray::KIND, dims)?;
        let new = require(host.numeric_array()?.new, NumericArray::KIND, "new")?;

        let mut raw = MNumericArray::null();
        let code = unsafe { new(c_int::from(ty), rank, dims.as_ptr(), &mut raw) };
        check_error(code, |code| Error::NewFailed {
            kind: NumericArray::KIND,
            code,
        })?;
        if raw.is_null() {
            return Err(Error::NewFailed {
                kind: NumericArray::KIND,
                code: LIBRARY_MEMORY_ERROR,
            });
        }

        debug!(?raw, ?ty, ?dims, "allocated numeric array");
        Ok(Self::from_fresh(host, raw))
    }

    /// Number of dimensions.
    pub fn rank(&self) -> MInt {
        self.read(|t| t.get_rank)
    }

    /// Size of every dimension.
    pub fn dimensions(&self) -> Vec<MInt> {
        if self.is_null() {
            return Vec::new();
        }
        match self.host().numeric_array().ok().and_then(|t| t.get_dimensions) {
            Some(get_dimensions) => unsafe {
                copy_dimensions(get_dimensions(self.raw()), self.rank())
            },
            None => Vec::new(),
        }
    }

    /// Total number of elements.
    pub fn flattened_length(&self) -> MInt {
        self.read(|t| t.get_flattened_length)
    }

    /// Element type, if the host reports a known one.
    pub fn data_type(&self) -> Option<NumericArrayType> {
        let code = self.query_type()?;
        c_int::try_from(code)
            .ok()
            .and_then(|code| NumericArrayType::try_from(code).ok())
    }

    /// Convert to a new array with element type `ty`.
    ///
    /// The source is left untouched. The result is `CallerOwned`.
    pub fn convert(&self, ty: NumericArrayType, options: ConversionOptions) -> Result<Self> {
        if self.is_null() {
            return Err(Error::InvalidArgument(
                "cannot convert an empty NumericArray".to_string(),
            ));
        }
        let convert_type = require(
            self.host().numeric_array()?.convert_type,
            NumericArray::KIND,
            "convert_type",
        )?;

        let mut raw = MNumericArray::null();
        let code = unsafe {
            convert_type(
                &mut raw,
                self.raw(),
                c_int::from(ty),
                c_int::from(options.method),
                options.tolerance,
            )
        };
        check_error(code, |code| Error::ConversionFailed {
            kind: NumericArray::KIND,
            reason: format!("to {:?} using {:?} ({})", ty, options.method, error_name(code)),
        })?;
        if raw.is_null() {
            return Err(Error::ConversionFailed {
                kind: NumericArray::KIND,
                reason: format!("to {:?}: host returned no array", ty),
            });
        }

        debug!(source = ?self.raw(), ?raw, ?ty, method = ?options.method, "converted numeric array");
        Ok(Self::from_fresh(self.host(), raw))
    }

    fn read<T: Default>(
        &self,
        entry: impl FnOnce(&NumericArrayFunctions) -> Option<unsafe extern "C" fn(MNumericArray) -> T>,
    ) -> T {
        if self.is_null() {
            return T::default();
        }
        match self.host().numeric_array().ok().and_then(entry) {
            Some(f) => unsafe { f(self.raw()) },
            None => T::default(),
        }
    }
}
