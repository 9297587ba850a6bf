//! Container kinds and the per-kind cleanup dispatch.
//!
//! Each kind is a zero-sized marker implementing [`ContainerKind`]. The
//! implementation is that kind's row of the routing table: it maps deep copy,
//! destroy, relinquish-share, share count, type query and result passing
//! onto the host function table for the kind. The trait is sealed, so the
//! five rows below are the whole table.

use std::fmt;

use tracing::{trace, warn};

use crate::context::{require, HostContext};
use crate::error::{Error, Result};
use crate::ffi::{
    check_error, MArgument, MDataStore, MImage, MInt, MNumericArray, MSparseArray, MTensor,
    RawHandle, LIBRARY_MEMORY_ERROR,
};

/// Runtime tag naming a container kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// Dense numeric array.
    Tensor,
    /// Typed numeric buffer.
    NumericArray,
    /// 2D or 3D image.
    Image,
    /// Sparse array.
    SparseArray,
    /// Keyed record list.
    DataStore,
}

impl VariantKind {
    /// All kinds, in declaration order.
    pub const ALL: [VariantKind; 5] = [
        VariantKind::Tensor,
        VariantKind::NumericArray,
        VariantKind::Image,
        VariantKind::SparseArray,
        VariantKind::DataStore,
    ];

    /// Check if containers of this kind can be shared with the host.
    pub const fn supports_sharing(self) -> bool {
        !matches!(self, VariantKind::DataStore)
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VariantKind::Tensor => "Tensor",
            VariantKind::NumericArray => "NumericArray",
            VariantKind::Image => "Image",
            VariantKind::SparseArray => "SparseArray",
            VariantKind::DataStore => "DataStore",
        };
        f.write_str(s)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A container kind together with its row of the host dispatch table.
///
/// The dispatch functions are used by [`GenericContainer`](crate::GenericContainer)
/// and are not meant to be called directly.
pub trait ContainerKind: sealed::Sealed + 'static {
    /// Runtime tag of this kind.
    const KIND: VariantKind;

    /// Raw handle type of this kind.
    type Raw: RawHandle;

    /// Ask the host for a deep copy of `raw`.
    ///
    /// # Safety
    ///
    /// `raw` must be a live, non-null handle of this kind.
    #[doc(hidden)]
    unsafe fn deep_copy(host: &HostContext, raw: Self::Raw) -> Result<Self::Raw>;

    /// Destroy `raw`. Missing host functions are logged and skipped.
    ///
    /// # Safety
    ///
    /// `raw` must be a live, non-null handle of this kind owned by the caller.
    #[doc(hidden)]
    unsafe fn destroy(host: &HostContext, raw: Self::Raw);

    /// Give up one share of `raw`.
    ///
    /// # Safety
    ///
    /// `raw` must be a live, non-null handle of this kind shared with the host.
    #[doc(hidden)]
    unsafe fn relinquish_share(host: &HostContext, raw: Self::Raw);

    /// Host-maintained share count of `raw`, 0 when unknown.
    ///
    /// # Safety
    ///
    /// `raw` must be a live, non-null handle of this kind.
    #[doc(hidden)]
    unsafe fn share_count(host: &HostContext, raw: Self::Raw) -> MInt;

    /// Host element type code of `raw`, if the kind has one.
    ///
    /// # Safety
    ///
    /// `raw` must be a live, non-null handle of this kind.
    #[doc(hidden)]
    unsafe fn query_type(host: &HostContext, raw: Self::Raw) -> Option<MInt>;

    /// Store `raw` in the matching field of a result slot.
    ///
    /// Returns `false` without writing when the slot pointer is null.
    ///
    /// # Safety
    ///
    /// `res` must be a result slot declared for this kind whose pointer is
    /// null or valid for writes.
    #[doc(hidden)]
    unsafe fn write_result(res: MArgument, raw: Self::Raw) -> bool;
}

/// Log a cleanup entry the host did not provide.
fn missing_cleanup(kind: VariantKind, function: &'static str) {
    warn!(%kind, function, "host cleanup function unavailable, resource left to the host");
}

/// Implements the dispatch row of a kind that can be shared with the host.
///
/// These kinds expose the same `clone`/`free`/`disown`/`share_count` entries
/// and differ only in their handle type, table accessor, type query and
/// result slot.
macro_rules! shareable_kind {
    ($(#[$doc:meta])* $marker:ident, $raw:ident, $table:ident, $query:path, $slot:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $marker {}

        impl sealed::Sealed for $marker {}

        impl ContainerKind for $marker {
            const KIND: VariantKind = VariantKind::$marker;
            type Raw = $raw;

            unsafe fn deep_copy(host: &HostContext, raw: $raw) -> Result<$raw> {
                let table = host.$table()?;
                let clone = require(table.clone, Self::KIND, "clone")?;

                let mut copy = $raw::null();
                let code = clone(raw, &mut copy);
                check_error(code, |code| Error::CloneFailed {
                    kind: Self::KIND,
                    code,
                })?;
                if copy.is_null() {
                    return Err(Error::CloneFailed {
                        kind: Self::KIND,
                        code: LIBRARY_MEMORY_ERROR,
                    });
                }
                Ok(copy)
            }

            unsafe fn destroy(host: &HostContext, raw: $raw) {
                match host.$table().ok().and_then(|t| t.free) {
                    Some(free) => free(raw),
                    None => missing_cleanup(Self::KIND, "free"),
                }
            }

            unsafe fn relinquish_share(host: &HostContext, raw: $raw) {
                match host.$table().ok().and_then(|t| t.disown) {
                    Some(disown) => disown(raw),
                    None => missing_cleanup(Self::KIND, "disown"),
                }
            }

            unsafe fn share_count(host: &HostContext, raw: $raw) -> MInt {
                host.$table()
                    .ok()
                    .and_then(|t| t.share_count)
                    .map_or(0, |share_count| share_count(raw))
            }

            unsafe fn query_type(host: &HostContext, raw: $raw) -> Option<MInt> {
                $query(host, raw)
            }

            unsafe fn write_result(res: MArgument, raw: $raw) -> bool {
                if res.$slot.is_null() {
                    return false;
                }
                *res.$slot = raw;
                true
            }
        }
    };
}

unsafe fn tensor_type(host: &HostContext, raw: MTensor) -> Option<MInt> {
    let get_type = host.tensor().ok()?.get_type?;
    Some(get_type(raw))
}

unsafe fn numeric_array_type(host: &HostContext, raw: MNumericArray) -> Option<MInt> {
    let get_type = host.numeric_array().ok()?.get_type?;
    Some(MInt::from(get_type(raw)))
}

unsafe fn image_type(host: &HostContext, raw: MImage) -> Option<MInt> {
    let get_data_type = host.image().ok()?.get_data_type?;
    Some(MInt::from(get_data_type(raw)))
}

// The element type of a sparse array is the type of its implicit value.
unsafe fn sparse_array_type(host: &HostContext, raw: MSparseArray) -> Option<MInt> {
    let get_implicit_value = host.sparse_array().ok()?.get_implicit_value?;
    let implicit = get_implicit_value(raw);
    if implicit.is_null() || (*implicit).is_null() {
        return None;
    }
    tensor_type(host, *implicit)
}

shareable_kind!(
    /// Dense numeric array kind.
    Tensor, MTensor, tensor, tensor_type, tensor
);
shareable_kind!(
    /// Typed numeric buffer kind.
    NumericArray, MNumericArray, numeric_array, numeric_array_type, numeric
);
shareable_kind!(
    /// Image kind.
    Image, MImage, image, image_type, image
);
shareable_kind!(
    /// Sparse array kind.
    SparseArray, MSparseArray, sparse_array, sparse_array_type, sparse
);

/// Keyed record list kind.
///
/// Data stores cannot be shared with the host: relinquishing a share is a
/// no-op and the share count is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStore {}

impl sealed::Sealed for DataStore {}

impl ContainerKind for DataStore {
    const KIND: VariantKind = VariantKind::DataStore;
    type Raw = MDataStore;

    unsafe fn deep_copy(host: &HostContext, raw: MDataStore) -> Result<MDataStore> {
        let table = host.data_store()?;
        let copy = require(table.copy, Self::KIND, "copy")?;

        let duplicate = copy(raw);
        if duplicate.is_null() {
            return Err(Error::CloneFailed {
                kind: Self::KIND,
                code: LIBRARY_MEMORY_ERROR,
            });
        }
        Ok(duplicate)
    }

    unsafe fn destroy(host: &HostContext, raw: MDataStore) {
        match host.data_store().ok().and_then(|t| t.delete) {
            Some(delete) => delete(raw),
            None => missing_cleanup(Self::KIND, "delete"),
        }
    }

    unsafe fn relinquish_share(_host: &HostContext, raw: MDataStore) {
        trace!(?raw, "data stores are never shared, nothing to relinquish");
    }

    unsafe fn share_count(_host: &HostContext, _raw: MDataStore) -> MInt {
        0
    }

    unsafe fn query_type(_host: &HostContext, _raw: MDataStore) -> Option<MInt> {
        None
    }

    unsafe fn write_result(res: MArgument, raw: MDataStore) -> bool {
        if res.data_store.is_null() {
            return false;
        }
        *res.data_store = raw;
        true
    }
}
