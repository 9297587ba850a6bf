//! Generic container wrapper and its ownership state machine.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use tracing::{debug, trace};

use crate::context::HostContext;
use crate::error::{Error, Result};
use crate::ffi::{MArgument, MInt, RawHandle};
use crate::kind::{ContainerKind, VariantKind};
use crate::ownership::{Ownership, PassingMode};

/// A host-allocated container handle together with its ownership tag.
///
/// The wrapper guarantees that the cleanup action selected by the tag runs
/// exactly once: `CallerOwned` containers are destroyed, `SharedWithHost`
/// containers give up their share, and `HostManaged` containers are left
/// alone. The tag only changes through explicit operations
/// ([`relinquish`](Self::relinquish), [`pass_to_host`](Self::pass_to_host),
/// [`reset`](Self::reset), [`take`](Self::take)).
///
/// The type is neither `Clone` nor `Copy`: duplicating the handle without
/// duplicating the resource would create two owners. Use
/// [`try_clone`](Self::try_clone) for a deep copy.
///
/// # Example
///
/// ```no_run
/// use llink::{GenericTensor, Ownership, TensorType};
/// # fn example(host: &llink::HostContext) -> llink::Result<()> {
/// let original = GenericTensor::new(host, TensorType::Integer, &[4])?;
/// let copy = original.try_clone()?;
/// assert_ne!(original.raw(), copy.raw());
/// assert_eq!(copy.ownership(), Ownership::CallerOwned);
///
/// // Both tensors are freed when they go out of scope.
/// # Ok(())
/// # }
/// ```
pub struct GenericContainer<'h, K: ContainerKind> {
    host: &'h HostContext,
    raw: K::Raw,
    ownership: Ownership,
}

impl<'h, K: ContainerKind> GenericContainer<'h, K> {
    /// Create a container that holds no resource.
    pub fn empty(host: &'h HostContext) -> Self {
        Self {
            host,
            raw: K::Raw::null(),
            ownership: Ownership::HostManaged,
        }
    }

    /// Wrap a handle with an explicit ownership tag.
    ///
    /// Fails with [`Error::CreateFromNull`] if `raw` is null.
    ///
    /// # Safety
    ///
    /// `raw` must be a live handle of this kind, and `ownership` must
    /// describe it truthfully: no other wrapper may be responsible for
    /// releasing a `CallerOwned` handle, and a `SharedWithHost` handle must
    /// carry a share that belongs to this wrapper.
    pub unsafe fn from_raw(host: &'h HostContext, raw: K::Raw, ownership: Ownership) -> Result<Self> {
        if raw.is_null() {
            return Err(Error::CreateFromNull(K::KIND));
        }
        trace!(kind = %K::KIND, ?raw, %ownership, "wrapping container");
        Ok(Self {
            host,
            raw,
            ownership,
        })
    }

    /// Wrap a handle received from the host under `mode`.
    ///
    /// # Safety
    ///
    /// `raw` must be a live handle of this kind that was really passed in
    /// `mode`. See [`from_raw`](Self::from_raw).
    pub unsafe fn from_argument(host: &'h HostContext, raw: K::Raw, mode: PassingMode) -> Result<Self> {
        Self::from_raw(host, raw, mode.initial_ownership())
    }

    /// Wrap a handle the host just allocated for this side.
    pub(crate) fn from_fresh(host: &'h HostContext, raw: K::Raw) -> Self {
        debug_assert!(!raw.is_null());
        Self {
            host,
            raw,
            ownership: Ownership::CallerOwned,
        }
    }

    /// Get the raw handle.
    pub fn raw(&self) -> K::Raw {
        self.raw
    }

    /// Get the container kind.
    pub fn kind(&self) -> VariantKind {
        K::KIND
    }

    /// Get the current ownership tag.
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Check if this wrapper has a cleanup action to run on drop.
    pub fn is_owner(&self) -> bool {
        !self.raw.is_null() && self.ownership.is_owner()
    }

    /// Check if this wrapper holds no resource.
    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    /// Get the host context this container was created with.
    pub fn host(&self) -> &'h HostContext {
        self.host
    }

    /// Host-maintained share count of the container.
    ///
    /// Returns 0 for an empty wrapper and for kinds that cannot be shared.
    pub fn share_count(&self) -> MInt {
        if self.raw.is_null() {
            return 0;
        }
        unsafe { K::share_count(self.host, self.raw) }
    }

    /// Host element type code of the container, if the kind has one.
    pub fn query_type(&self) -> Option<MInt> {
        if self.raw.is_null() {
            return None;
        }
        unsafe { K::query_type(self.host, self.raw) }
    }

    /// Deep copy the underlying resource.
    ///
    /// The copy is always `CallerOwned`, whatever the tag of `self`: the host
    /// does not know the copy exists. Cloning an empty wrapper yields an empty
    /// wrapper.
    pub fn try_clone(&self) -> Result<Self> {
        if self.raw.is_null() {
            return Ok(Self::empty(self.host));
        }

        let copy = unsafe { K::deep_copy(self.host, self.raw)? };
        debug!(kind = %K::KIND, source = ?self.raw, ?copy, "cloned container");
        Ok(Self::from_fresh(self.host, copy))
    }

    /// Give up all responsibility for the handle and return it.
    ///
    /// No cleanup runs, now or on drop. The handle stays readable through
    /// this wrapper, but whoever receives it must release it.
    pub fn relinquish(&mut self) -> K::Raw {
        trace!(kind = %K::KIND, raw = ?self.raw, from = %self.ownership, "relinquishing container");
        self.ownership = Ownership::HostManaged;
        self.raw
    }

    /// Consume the wrapper and return the handle without any cleanup.
    pub fn into_raw(mut self) -> K::Raw {
        self.relinquish()
    }

    /// Store the handle in the result slot of a library function.
    ///
    /// A `CallerOwned` container becomes `HostManaged`: the host takes over
    /// returned containers. A `SharedWithHost` container keeps its tag, since
    /// returning a shared container does not change the sharing arrangement.
    /// An empty wrapper writes nothing.
    ///
    /// Returns `false` if nothing was written, either because the wrapper is
    /// empty or because the slot pointer is null. The tag is then unchanged,
    /// so the wrapper still releases the container on drop.
    ///
    /// Passing the same handle to more than one result slot is not supported.
    ///
    /// # Safety
    ///
    /// `res` must be the result slot of a function declared to return this
    /// kind, with a pointer that is null or valid for writes.
    pub unsafe fn pass_to_host(&mut self, res: MArgument) -> bool {
        if self.raw.is_null() {
            return false;
        }

        if !K::write_result(res, self.raw) {
            debug!(kind = %K::KIND, raw = ?self.raw, "result slot is null, container kept");
            return false;
        }
        if self.ownership == Ownership::CallerOwned {
            self.ownership = Ownership::HostManaged;
        }
        trace!(kind = %K::KIND, raw = ?self.raw, ownership = %self.ownership, "passed container to host");
        true
    }

    /// Release the current resource as drop would, then hold `raw` instead.
    ///
    /// Used when a host operation hands back a new handle that replaces the
    /// current one.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live handle of this kind described truthfully
    /// by `ownership`, as for [`from_raw`](Self::from_raw).
    pub unsafe fn reset(&mut self, raw: K::Raw, ownership: Ownership) {
        // Operations that work in place may hand back the handle we hold.
        if raw != self.raw {
            self.cleanup();
        }
        self.raw = raw;
        self.ownership = if raw.is_null() {
            Ownership::HostManaged
        } else {
            ownership
        };
    }

    /// Move the container out, leaving an empty wrapper behind.
    ///
    /// No cleanup runs; the returned wrapper carries the handle and the tag.
    pub fn take(&mut self) -> Self {
        let host = self.host;
        std::mem::replace(self, Self::empty(host))
    }

    /// Borrow the container as a host-managed view tied to `self`.
    pub fn view(&self) -> Borrowed<'_, Self> {
        Borrowed::new(Self {
            host: self.host,
            raw: self.raw,
            ownership: Ownership::HostManaged,
        })
    }

    /// Run the cleanup action selected by the tag, exactly once.
    fn cleanup(&mut self) {
        if self.raw.is_null() {
            return;
        }

        match self.ownership {
            Ownership::HostManaged => {}
            Ownership::CallerOwned => {
                debug!(kind = %K::KIND, raw = ?self.raw, "destroying container");
                unsafe { K::destroy(self.host, self.raw) };
            }
            Ownership::SharedWithHost => {
                debug!(kind = %K::KIND, raw = ?self.raw, "relinquishing shared container");
                unsafe { K::relinquish_share(self.host, self.raw) };
            }
        }
        self.ownership = Ownership::HostManaged;
    }
}

impl<K: ContainerKind> Drop for GenericContainer<'_, K> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl<K: ContainerKind> fmt::Debug for GenericContainer<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericContainer")
            .field("kind", &K::KIND)
            .field("raw", &self.raw)
            .field("ownership", &self.ownership)
            .finish()
    }
}

// GenericContainer holds raw host pointers and is neither Send nor Sync:
// the host invokes library functions on one thread at a time.

/// A host-managed container that must not outlive the object it was
/// borrowed from.
///
/// Used for containers owned by another container, such as the implicit
/// value of a sparse array. Dropping it runs no cleanup.
pub struct Borrowed<'a, T> {
    inner: T,
    _owner: PhantomData<&'a ()>,
}

impl<T> Borrowed<'_, T> {
    pub(crate) fn new(inner: T) -> Self {
        Self {
            inner,
            _owner: PhantomData,
        }
    }
}

impl<T> Deref for Borrowed<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for Borrowed<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Borrowed").field(&self.inner).finish()
    }
}

/// Validate a dimension list and return its rank.
pub(crate) fn checked_rank(kind: VariantKind, dims: &[MInt]) -> Result<MInt> {
    if let Some(bad) = dims.iter().find(|d| **d < 0) {
        return Err(Error::InvalidArgument(format!(
            "{kind} dimension must not be negative, got {bad}"
        )));
    }
    Ok(dims.len() as MInt)
}

/// Copy a host-owned array of `rank` dimensions.
///
/// # Safety
///
/// `ptr` must be null or valid for reads of `rank` elements.
pub(crate) unsafe fn copy_dimensions(ptr: *const MInt, rank: MInt) -> Vec<MInt> {
    if ptr.is_null() || rank <= 0 {
        return Vec::new();
    }
    std::slice::from_raw_parts(ptr, rank as usize).to_vec()
}
