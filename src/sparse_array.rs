//! Sparse arrays.
//!
//! A sparse array owns two tensors, its implicit value and its explicit
//! values. They are exposed as [`Borrowed`] views that cannot outlive the
//! array. Positions and the dense form are computed on demand and returned
//! as fresh `CallerOwned` tensors.

use tracing::debug;

use crate::container::{copy_dimensions, Borrowed, GenericContainer};
use crate::context::{require, HostContext};
use crate::error::{Error, Result};
use crate::ffi::{
    check_error, ErrCode, MInt, MSparseArray, MTensor, SparseArrayFunctions,
    LIBRARY_FUNCTION_ERROR, LIBRARY_MEMORY_ERROR,
};
use crate::kind::{ContainerKind, SparseArray};
use crate::ownership::Ownership;
use crate::tensor::GenericTensor;

/// A sparse array handle with its ownership tag.
pub type GenericSparseArray<'h> = GenericContainer<'h, SparseArray>;

fn raw_or_null(tensor: Option<&GenericTensor<'_>>) -> MTensor {
    tensor.map_or(MTensor::null(), |t| t.raw())
}

impl<'h> GenericContainer<'h, SparseArray> {
    /// Build a sparse array from a dense tensor.
    ///
    /// Elements equal to `implicit` are left out. Without an implicit value
    /// the host picks the most common element. The tensors are only read;
    /// the new array is `CallerOwned`.
    pub fn from_tensor(
        host: &'h HostContext,
        data: &GenericTensor<'_>,
        implicit: Option<&GenericTensor<'_>>,
    ) -> Result<Self> {
        let from_tensor = require(host.sparse_array()?.from_tensor, SparseArray::KIND, "from_tensor")?;

        let mut raw = MSparseArray::null();
        let code = unsafe { from_tensor(data.raw(), raw_or_null(implicit), &mut raw) };
        let sa = Self::created(host, "from_tensor", code, raw)?;
        debug!(?raw, source = ?data.raw(), "built sparse array from tensor");
        Ok(sa)
    }

    /// Build a sparse array from explicit positions and values.
    ///
    /// `positions` is a rank 2 integer tensor with one row per explicit
    /// element, `values` holds the matching values, and `dimensions` the
    /// size of the array. The new array is `CallerOwned`.
    pub fn from_positions(
        host: &'h HostContext,
        positions: &GenericTensor<'_>,
        values: &GenericTensor<'_>,
        dimensions: &GenericTensor<'_>,
        implicit: Option<&GenericTensor<'_>>,
    ) -> Result<Self> {
        let from_explicit_positions = require(
            host.sparse_array()?.from_explicit_positions,
            SparseArray::KIND,
            "from_explicit_positions",
        )?;

        let mut raw = MSparseArray::null();
        let code = unsafe {
            from_explicit_positions(
                positions.raw(),
                values.raw(),
                dimensions.raw(),
                raw_or_null(implicit),
                &mut raw,
            )
        };
        let sa = Self::created(host, "from_positions", code, raw)?;
        debug!(?raw, "built sparse array from explicit positions");
        Ok(sa)
    }

    fn created(host: &'h HostContext, op: &'static str, code: ErrCode, raw: MSparseArray) -> Result<Self> {
        check_error(code, |code| Error::SparseArrayFailed { op, code })?;
        if raw.is_null() {
            return Err(Error::SparseArrayFailed {
                op,
                code: LIBRARY_MEMORY_ERROR,
            });
        }
        Ok(Self::from_fresh(host, raw))
    }

    /// Number of dimensions.
    pub fn rank(&self) -> MInt {
        if self.is_null() {
            return 0;
        }
        match self.table().and_then(|t| t.get_rank) {
            Some(get_rank) => unsafe { get_rank(self.raw()) },
            None => 0,
        }
    }

    /// Size of every dimension.
    pub fn dimensions(&self) -> Vec<MInt> {
        if self.is_null() {
            return Vec::new();
        }
        match self.table().and_then(|t| t.get_dimensions) {
            Some(get_dimensions) => unsafe {
                copy_dimensions(get_dimensions(self.raw()), self.rank())
            },
            None => Vec::new(),
        }
    }

    /// The implicit value, as a tensor owned by this array.
    pub fn implicit_value(&self) -> Result<Borrowed<'_, GenericTensor<'h>>> {
        let get_implicit_value = require(
            self.host().sparse_array()?.get_implicit_value,
            SparseArray::KIND,
            "get_implicit_value",
        )?;
        self.member("implicit_value", |raw| unsafe { get_implicit_value(raw) })
    }

    /// The explicit values, as a tensor owned by this array.
    pub fn explicit_values(&self) -> Result<Borrowed<'_, GenericTensor<'h>>> {
        let get_explicit_values = require(
            self.host().sparse_array()?.get_explicit_values,
            SparseArray::KIND,
            "get_explicit_values",
        )?;
        self.member("explicit_values", |raw| unsafe { get_explicit_values(raw) })
    }

    fn member(
        &self,
        op: &'static str,
        get: impl FnOnce(MSparseArray) -> *mut MTensor,
    ) -> Result<Borrowed<'_, GenericTensor<'h>>> {
        let failed = Error::SparseArrayFailed {
            op,
            code: LIBRARY_FUNCTION_ERROR,
        };
        if self.is_null() {
            return Err(failed);
        }
        let slot = get(self.raw());
        if slot.is_null() {
            return Err(failed);
        }
        let tensor = unsafe { GenericTensor::from_raw(self.host(), *slot, Ownership::HostManaged) }
            .map_err(|_| failed)?;
        Ok(Borrowed::new(tensor))
    }

    /// Positions of the explicit elements, one row per element.
    ///
    /// The tensor is `CallerOwned`.
    pub fn explicit_positions(&self) -> Result<GenericTensor<'h>> {
        let get_explicit_positions = require(
            self.host().sparse_array()?.get_explicit_positions,
            SparseArray::KIND,
            "get_explicit_positions",
        )?;
        self.computed("explicit_positions", |raw, out| unsafe {
            get_explicit_positions(raw, out)
        })
    }

    /// Dense form of the array.
    ///
    /// The tensor is `CallerOwned`.
    pub fn to_tensor(&self) -> Result<GenericTensor<'h>> {
        let to_tensor = require(self.host().sparse_array()?.to_tensor, SparseArray::KIND, "to_tensor")?;
        self.computed("to_tensor", |raw, out| unsafe { to_tensor(raw, out) })
    }

    fn computed(
        &self,
        op: &'static str,
        compute: impl FnOnce(MSparseArray, *mut MTensor) -> ErrCode,
    ) -> Result<GenericTensor<'h>> {
        if self.is_null() {
            return Err(Error::SparseArrayFailed {
                op,
                code: LIBRARY_FUNCTION_ERROR,
            });
        }
        let mut out = MTensor::null();
        let code = compute(self.raw(), &mut out);
        check_error(code, |code| Error::SparseArrayFailed { op, code })?;
        if out.is_null() {
            return Err(Error::SparseArrayFailed {
                op,
                code: LIBRARY_MEMORY_ERROR,
            });
        }
        debug!(op, sparse = ?self.raw(), tensor = ?out, "computed tensor from sparse array");
        Ok(GenericTensor::from_fresh(self.host(), out))
    }

    /// Change the implicit value, recomputing the explicit elements.
    ///
    /// `None` keeps the current implicit value and only drops explicit
    /// elements equal to it. When the host hands back a new array, the old
    /// one is released according to its tag and the new one is
    /// `CallerOwned`; an array updated in place keeps its tag.
    pub fn set_implicit_value(&mut self, implicit: Option<&GenericTensor<'_>>) -> Result<()> {
        if self.is_null() {
            return Err(Error::InvalidArgument(
                "cannot set the implicit value of an empty SparseArray".to_string(),
            ));
        }
        let reset_implicit_value = require(
            self.host().sparse_array()?.reset_implicit_value,
            SparseArray::KIND,
            "reset_implicit_value",
        )?;

        let mut raw = self.raw();
        let code = unsafe { reset_implicit_value(self.raw(), raw_or_null(implicit), &mut raw) };
        check_error(code, |code| Error::SparseArrayFailed {
            op: "set_implicit_value",
            code,
        })?;
        if raw.is_null() {
            return Err(Error::SparseArrayFailed {
                op: "set_implicit_value",
                code: LIBRARY_MEMORY_ERROR,
            });
        }

        let ownership = if raw == self.raw() {
            self.ownership()
        } else {
            Ownership::CallerOwned
        };
        debug!(old = ?self.raw(), new = ?raw, %ownership, "reset sparse array implicit value");
        unsafe { self.reset(raw, ownership) };
        Ok(())
    }

    /// Drop explicit elements that equal the implicit value.
    pub fn resparsify(&mut self) -> Result<()> {
        self.set_implicit_value(None)
    }

    fn table(&self) -> Option<&'h SparseArrayFunctions> {
        self.host().sparse_array().ok()
    }
}
