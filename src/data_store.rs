//! Data stores: ordered lists of host values.
//!
//! Data stores are never shared with the host. Wrapping one as
//! `SharedWithHost` is accepted, but its cleanup does nothing, so the host
//! remains responsible for it.
//!
//! Containers pushed to a data store are moved into it. The store owns them
//! from then on, so the pushing wrapper is consumed and never releases the
//! handle.

use std::ffi::CString;
use std::os::raw::c_char;

use tracing::{debug, trace};

use crate::container::GenericContainer;
use crate::context::{require, HostContext};
use crate::error::{Error, Result};
use crate::ffi::{MBool, MComplex, MInt, MReal, LIBRARY_MEMORY_ERROR};
use crate::image::GenericImage;
use crate::kind::{ContainerKind, DataStore};
use crate::numeric_array::GenericNumericArray;
use crate::ownership::Ownership;
use crate::sparse_array::GenericSparseArray;
use crate::tensor::GenericTensor;

/// A data store handle with its ownership tag.
pub type GenericDataStore<'h> = GenericContainer<'h, DataStore>;

/// A value that can be appended to a data store.
///
/// Strings are copied by the host. Containers are handed over to the store.
#[derive(Debug)]
pub enum DataStoreValue<'a, 'h> {
    Boolean(bool),
    Integer(MInt),
    Real(MReal),
    Complex(MComplex),
    String(&'a str),
    Tensor(GenericTensor<'h>),
    SparseArray(GenericSparseArray<'h>),
    NumericArray(GenericNumericArray<'h>),
    Image(GenericImage<'h>),
    DataStore(GenericDataStore<'h>),
}

impl DataStoreValue<'_, '_> {
    /// Short name of the value type, as used in logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataStoreValue::Boolean(_) => "Boolean",
            DataStoreValue::Integer(_) => "Integer",
            DataStoreValue::Real(_) => "Real",
            DataStoreValue::Complex(_) => "Complex",
            DataStoreValue::String(_) => "String",
            DataStoreValue::Tensor(_) => "Tensor",
            DataStoreValue::SparseArray(_) => "SparseArray",
            DataStoreValue::NumericArray(_) => "NumericArray",
            DataStoreValue::Image(_) => "Image",
            DataStoreValue::DataStore(_) => "DataStore",
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'a, 'h> From<$ty> for DataStoreValue<'a, 'h> {
                fn from(value: $ty) -> Self {
                    DataStoreValue::$variant(value)
                }
            }
        )*
    };
}

value_from! {
    bool => Boolean,
    MInt => Integer,
    MReal => Real,
    MComplex => Complex,
    &'a str => String,
    GenericTensor<'h> => Tensor,
    GenericSparseArray<'h> => SparseArray,
    GenericNumericArray<'h> => NumericArray,
    GenericImage<'h> => Image,
    GenericDataStore<'h> => DataStore,
}

impl<'h> GenericContainer<'h, DataStore> {
    /// Create an empty data store.
    ///
    /// The new data store is `CallerOwned`.
    pub fn new(host: &'h HostContext) -> Result<Self> {
        let create = require(host.data_store()?.create, DataStore::KIND, "create")?;

        let raw = unsafe { create() };
        if raw.is_null() {
            return Err(Error::NewFailed {
                kind: DataStore::KIND,
                code: LIBRARY_MEMORY_ERROR,
            });
        }

        debug!(?raw, "created data store");
        Ok(Self::from_fresh(host, raw))
    }

    /// Number of entries.
    pub fn len(&self) -> MInt {
        if self.is_null() {
            return 0;
        }
        match self.host().data_store().ok().and_then(|t| t.get_length) {
            Some(get_length) => unsafe { get_length(self.raw()) },
            None => 0,
        }
    }

    /// Check if the data store has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an unnamed value.
    ///
    /// A container value is moved into the store. If it is not `CallerOwned`
    /// the store receives a deep copy, since the store must own what it holds;
    /// the original is then released as its tag requires. Empty containers
    /// and strings containing NUL bytes are rejected.
    pub fn push<'a>(&mut self, value: impl Into<DataStoreValue<'a, 'h>>) -> Result<()> {
        self.add(None, value.into())
    }

    /// Append a value under `name`. See [`push`](Self::push).
    pub fn push_named<'a>(&mut self, name: &str, value: impl Into<DataStoreValue<'a, 'h>>) -> Result<()> {
        self.add(Some(name), value.into())
    }

    /// Append an integer.
    pub fn push_integer(&mut self, value: MInt) -> Result<()> {
        self.push(value)
    }

    /// Append a real number.
    pub fn push_real(&mut self, value: MReal) -> Result<()> {
        self.push(value)
    }

    /// Append a complex number.
    pub fn push_complex(&mut self, value: MComplex) -> Result<()> {
        self.push(value)
    }

    /// Append a boolean.
    pub fn push_boolean(&mut self, value: bool) -> Result<()> {
        self.push(value)
    }

    /// Append a string. The host copies it.
    ///
    /// Strings containing NUL bytes are rejected.
    pub fn push_string(&mut self, value: &str) -> Result<()> {
        self.push(value)
    }

    /// Move a tensor into the store.
    pub fn push_tensor(&mut self, value: GenericTensor<'h>) -> Result<()> {
        self.push(value)
    }

    /// Move a sparse array into the store.
    pub fn push_sparse_array(&mut self, value: GenericSparseArray<'h>) -> Result<()> {
        self.push(value)
    }

    /// Move a numeric array into the store.
    pub fn push_numeric_array(&mut self, value: GenericNumericArray<'h>) -> Result<()> {
        self.push(value)
    }

    /// Move an image into the store.
    pub fn push_image(&mut self, value: GenericImage<'h>) -> Result<()> {
        self.push(value)
    }

    /// Move another data store into this one.
    pub fn push_data_store(&mut self, value: GenericDataStore<'h>) -> Result<()> {
        self.push(value)
    }

    fn add(&mut self, name: Option<&str>, value: DataStoreValue<'_, 'h>) -> Result<()> {
        if self.is_null() {
            return Err(Error::InvalidArgument(
                "cannot push to an empty DataStore".to_string(),
            ));
        }
        let c_name = name.map(c_string).transpose()?;
        let table = self.host().data_store()?;
        let ds = self.raw();
        let type_name = value.type_name();

        // `$value` is evaluated only once the host entry is known to exist,
        // so a container is never handed over to a missing function.
        macro_rules! add {
            ($plain:ident, $named:ident, $value:expr) => {
                match &c_name {
                    None => {
                        let add = require(table.$plain, DataStore::KIND, stringify!($plain))?;
                        unsafe { add(ds, $value) }
                    }
                    Some(n) => {
                        let add = require(table.$named, DataStore::KIND, stringify!($named))?;
                        unsafe { add(ds, n.as_ptr() as *mut c_char, $value) }
                    }
                }
            };
        }

        match value {
            DataStoreValue::Boolean(v) => add!(add_boolean, add_named_boolean, MBool::from(v)),
            DataStoreValue::Integer(v) => add!(add_integer, add_named_integer, v),
            DataStoreValue::Real(v) => add!(add_real, add_named_real, v),
            DataStoreValue::Complex(v) => add!(add_complex, add_named_complex, v),
            DataStoreValue::String(v) => {
                let v = c_string(v)?;
                add!(add_string, add_named_string, v.as_ptr() as *mut c_char)
            }
            DataStoreValue::Tensor(c) => {
                let c = transferable(c)?;
                add!(add_tensor, add_named_tensor, c.into_raw())
            }
            DataStoreValue::SparseArray(c) => {
                let c = transferable(c)?;
                add!(add_sparse_array, add_named_sparse_array, c.into_raw())
            }
            DataStoreValue::NumericArray(c) => {
                let c = transferable(c)?;
                add!(add_numeric_array, add_named_numeric_array, c.into_raw())
            }
            DataStoreValue::Image(c) => {
                let c = transferable(c)?;
                add!(add_image, add_named_image, c.into_raw())
            }
            DataStoreValue::DataStore(c) => {
                let c = transferable(c)?;
                add!(add_data_store, add_named_data_store, c.into_raw())
            }
        }

        trace!(raw = ?ds, ?name, kind = type_name, "pushed value");
        Ok(())
    }
}

fn c_string(value: &str) -> Result<CString> {
    CString::new(value)
        .map_err(|e| Error::InvalidArgument(format!("string contains a NUL byte: {}", e)))
}

/// A container the store can take over: the wrapper itself when it owns the
/// resource, otherwise a deep copy.
fn transferable<'h, K: ContainerKind>(container: GenericContainer<'h, K>) -> Result<GenericContainer<'h, K>> {
    if container.is_null() {
        return Err(Error::InvalidArgument(format!(
            "cannot push an empty {} to a DataStore",
            K::KIND
        )));
    }
    if container.ownership() == Ownership::CallerOwned {
        return Ok(container);
    }
    trace!(kind = %K::KIND, raw = ?container.raw(), "pushing a copy of a container the caller does not own");
    container.try_clone()
}
