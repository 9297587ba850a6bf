//! Host context: the function tables injected by the host runtime.

use std::fmt;

use crate::error::{Error, Result};
use crate::ffi::{
    DataStoreFunctions, ImageFunctions, LibraryFunctions, MInt, NumericArrayFunctions,
    SparseArrayFunctions, TensorFunctions,
};
use crate::kind::VariantKind;
use crate::version;

/// Per-kind host function tables, as supplied by the host runtime.
///
/// A kind whose table is `None` is unsupported; constructing or cloning a
/// container of that kind fails with [`Error::HostContextUnavailable`].
#[derive(Clone, Copy, Default)]
pub struct HostFunctions {
    /// Tensor table.
    pub tensor: Option<TensorFunctions>,
    /// Numeric array table.
    pub numeric_array: Option<NumericArrayFunctions>,
    /// Image table.
    pub image: Option<ImageFunctions>,
    /// Sparse array table.
    pub sparse_array: Option<SparseArrayFunctions>,
    /// Data store table.
    pub data_store: Option<DataStoreFunctions>,
}

/// Initialized connection to the host runtime.
///
/// Every container borrows the context it was created with, so the context
/// necessarily outlives all of its containers. Create one in the library's
/// initialization entry point and drop it at teardown.
///
/// # Example
///
/// ```no_run
/// use llink::{GenericTensor, HostContext, TensorType};
/// # fn example(raw: *const llink::ffi::LibraryFunctions) -> llink::Result<()> {
/// let host = unsafe { HostContext::from_raw(raw)? };
///
/// let tensor = GenericTensor::new(&host, TensorType::Real, &[2, 3])?;
/// assert_eq!(tensor.flattened_length(), 6);
/// # Ok(())
/// # }
/// ```
pub struct HostContext {
    functions: HostFunctions,
    version: MInt,
}

impl HostContext {
    /// Build a context from the table the host shim passed at initialization.
    ///
    /// A null pointer yields [`Error::HostContextUnavailable`]; a table built
    /// for another layout yields [`Error::VersionMismatch`]. Null per-kind
    /// pointers leave that kind unsupported.
    ///
    /// # Safety
    ///
    /// `raw` must be null or point to a valid [`LibraryFunctions`] table whose
    /// function pointers honor the host's container contracts for as long as
    /// any container created from this context is alive.
    pub unsafe fn from_raw(raw: *const LibraryFunctions) -> Result<Self> {
        if raw.is_null() {
            return Err(Error::HostContextUnavailable);
        }

        let table = &*raw;
        if table.version != version::LIBRARY_VERSION {
            return Err(Error::VersionMismatch {
                expected: version::LIBRARY_VERSION,
                found: table.version,
            });
        }

        let functions = HostFunctions {
            tensor: table.tensor.as_ref().copied(),
            numeric_array: table.numeric_array.as_ref().copied(),
            image: table.image.as_ref().copied(),
            sparse_array: table.sparse_array.as_ref().copied(),
            data_store: table.data_store.as_ref().copied(),
        };

        Ok(Self {
            version: table.version,
            ..Self::new(functions)
        })
    }

    /// Build a context from already collected tables.
    ///
    /// # Safety
    ///
    /// Every function pointer in `functions` must honor the host's container
    /// contracts for as long as any container created from this context is
    /// alive.
    pub unsafe fn new(functions: HostFunctions) -> Self {
        tracing::debug!(
            tensor = functions.tensor.is_some(),
            numeric_array = functions.numeric_array.is_some(),
            image = functions.image.is_some(),
            sparse_array = functions.sparse_array.is_some(),
            data_store = functions.data_store.is_some(),
            "host context initialized"
        );
        Self {
            functions,
            version: version::LIBRARY_VERSION,
        }
    }

    /// Check if the host supports containers of the given kind.
    pub fn is_available(&self, kind: VariantKind) -> bool {
        match kind {
            VariantKind::Tensor => self.functions.tensor.is_some(),
            VariantKind::NumericArray => self.functions.numeric_array.is_some(),
            VariantKind::Image => self.functions.image.is_some(),
            VariantKind::SparseArray => self.functions.sparse_array.is_some(),
            VariantKind::DataStore => self.functions.data_store.is_some(),
        }
    }

    /// Table layout version reported by the host.
    ///
    /// Contexts built with [`new`](Self::new) have no host table and report
    /// [`version::LIBRARY_VERSION`], the layout this crate expects.
    pub fn version(&self) -> MInt {
        self.version
    }

    pub(crate) fn tensor(&self) -> Result<&TensorFunctions> {
        self.functions
            .tensor
            .as_ref()
            .ok_or(Error::HostContextUnavailable)
    }

    pub(crate) fn numeric_array(&self) -> Result<&NumericArrayFunctions> {
        self.functions
            .numeric_array
            .as_ref()
            .ok_or(Error::HostContextUnavailable)
    }

    pub(crate) fn image(&self) -> Result<&ImageFunctions> {
        self.functions
            .image
            .as_ref()
            .ok_or(Error::HostContextUnavailable)
    }

    pub(crate) fn sparse_array(&self) -> Result<&SparseArrayFunctions> {
        self.functions
            .sparse_array
            .as_ref()
            .ok_or(Error::HostContextUnavailable)
    }

    pub(crate) fn data_store(&self) -> Result<&DataStoreFunctions> {
        self.functions
            .data_store
            .as_ref()
            .ok_or(Error::HostContextUnavailable)
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let supported: Vec<VariantKind> = VariantKind::ALL
            .into_iter()
            .filter(|kind| self.is_available(*kind))
            .collect();
        f.debug_struct("HostContext")
            .field("version", &self.version())
            .field("supported", &supported)
            .finish()
    }
}

/// Unwrap an optional host table entry.
pub(crate) fn require<F>(entry: Option<F>, kind: VariantKind, function: &'static str) -> Result<F> {
    entry.ok_or(Error::MissingHostFunction { kind, function })
}
