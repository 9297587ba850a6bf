//! Dense numeric arrays.

use tracing::debug;

use crate::container::{checked_rank, copy_dimensions, GenericContainer};
use crate::context::{require, HostContext};
use crate::error::{Error, Result};
use crate::ffi::{check_error, MInt, MTensor, TensorFunctions, LIBRARY_MEMORY_ERROR};
use crate::kind::{ContainerKind, Tensor};
use crate::types::TensorType;

/// A tensor handle with its ownership tag.
pub type GenericTensor<'h> = GenericContainer<'h, Tensor>;

impl<'h> GenericContainer<'h, Tensor> {
    /// Allocate a new tensor with the given element type and dimensions.
    ///
    /// The new tensor is `CallerOwned`.
    pub fn new(host: &'h HostContext, ty: TensorType, dims: &[MInt]) -> Result<Self> {
        let rank = checked_rank(Tensor::KIND, dims)?;
        let new = require(host.tensor()?.new, Tensor::KIND, "new")?;

        let mut raw = MTensor::null();
        let code = unsafe { new(MInt::from(ty), rank, dims.as_ptr(), &mut raw) };
        check_error(code, |code| Error::NewFailed {
            kind: Tensor::KIND,
            code,
        })?;
        if raw.is_null() {
            return Err(Error::NewFailed {
                kind: Tensor::KIND,
                code: LIBRARY_MEMORY_ERROR,
            });
        }

        debug!(?raw, ?ty, ?dims, "allocated tensor");
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
        match self.host().tensor().ok().and_then(|t| t.get_dimensions) {
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
    pub fn data_type(&self) -> Option<TensorType> {
        self.query_type()
            .and_then(|code| TensorType::try_from(code).ok())
    }

    fn read<T: Default>(
        &self,
        entry: impl FnOnce(&TensorFunctions) -> Option<unsafe extern "C" fn(MTensor) -> T>,
    ) -> T {
        if self.is_null() {
            return T::default();
        }
        match self.host().tensor().ok().and_then(entry) {
            Some(f) => unsafe { f(self.raw()) },
            None => T::default(),
        }
    }
}
