//! Handle types for opaque references to host-allocated containers.
//!
//! Each handle type is a transparent newtype over the host's pointer, so it
//! can travel through the `#[repr(C)]` function tables and result slots
//! unchanged while keeping the container kinds apart at compile time.

use std::fmt;
use std::os::raw::c_void;

/// Behaviour shared by every raw container handle.
///
/// Equality is identity: two handles are equal when they name the same host
/// object.
pub trait RawHandle: Copy + Eq + fmt::Debug {
    /// The handle that refers to no resource.
    fn null() -> Self;

    /// Check if this handle refers to no resource.
    fn is_null(&self) -> bool;

    /// Get the raw host pointer.
    fn as_ptr(&self) -> *mut c_void;
}

/// Macro to define a handle type.
macro_rules! define_handle {
    ($name:ident, $what:literal) => {
        #[doc = concat!("Opaque handle to a host-allocated ", $what, ".")]
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            ptr: *mut c_void,
        }

        impl $name {
            /// Create a null handle.
            #[inline]
            pub const fn null() -> Self {
                Self {
                    ptr: std::ptr::null_mut(),
                }
            }

            /// Wrap a pointer received from the host.
            #[inline]
            pub const fn from_ptr(ptr: *mut c_void) -> Self {
                Self { ptr }
            }

            /// Check if this handle is null.
            #[inline]
            pub fn is_null(&self) -> bool {
                self.ptr.is_null()
            }

            /// Get the underlying host pointer.
            #[inline]
            pub const fn as_ptr(&self) -> *mut c_void {
                self.ptr
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::null()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:p})", stringify!($name), self.ptr)
            }
        }

        impl RawHandle for $name {
            #[inline]
            fn null() -> Self {
                $name::null()
            }

            #[inline]
            fn is_null(&self) -> bool {
                $name::is_null(self)
            }

            #[inline]
            fn as_ptr(&self) -> *mut c_void {
                self.ptr
            }
        }
    };
}

define_handle!(MTensor, "dense tensor");
define_handle!(MNumericArray, "typed numeric array");
define_handle!(MImage, "image");
define_handle!(MSparseArray, "sparse array");
define_handle!(MDataStore, "keyed data store");
