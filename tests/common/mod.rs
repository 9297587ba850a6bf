//! In-process fake of the host runtime.
//!
//! Every table entry records its call and tracks the resources it handed
//! out, so tests can check which cleanup ran and that nothing was released
//! twice. State is per thread; [`host`] starts from a clean slate.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};

use llink::ffi::*;
use llink::{HostContext, HostFunctions};

/// Kind of a fake host resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Tensor,
    NumericArray,
    Image,
    SparseArray,
    DataStore,
}

#[derive(Debug, Clone)]
struct Resource {
    kind: Kind,
    alive: bool,
    share_count: MInt,
    type_code: MInt,
    dims: Vec<MInt>,
    channels: MInt,
    color_space: c_int,
    interleaved: bool,
    entries: Vec<String>,
    // Containers handed over to a data store.
    children: Vec<usize>,
    // Tensors owned by a sparse array, in stable slots the host hands out.
    implicit: Option<Box<MTensor>>,
    explicit: Option<Box<MTensor>>,
}

impl Resource {
    fn new(kind: Kind, type_code: MInt, dims: Vec<MInt>) -> Self {
        Self {
            kind,
            alive: true,
            share_count: 0,
            type_code,
            dims,
            channels: 1,
            color_space: MIMAGE_CS_AUTOMATIC,
            interleaved: true,
            entries: Vec::new(),
            children: Vec::new(),
            implicit: None,
            explicit: None,
        }
    }

    fn flattened_length(&self) -> MInt {
        self.dims.iter().product::<MInt>() * self.channels
    }
}

#[derive(Default)]
struct State {
    next_id: usize,
    resources: HashMap<usize, Resource>,
    calls: Vec<(&'static str, usize)>,
    violations: Vec<String>,
    fail_new: Option<ErrCode>,
    fail_clone: Option<ErrCode>,
    fail_convert: Option<ErrCode>,
    reset_in_place: bool,
}

thread_local! {
    static STATE: RefCell<State> = RefCell::new(State::default());
}

fn with<R>(f: impl FnOnce(&mut State) -> R) -> R {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

fn handle_ptr(id: usize) -> *mut c_void {
    (id << 4) as *mut c_void
}

/// Fake host id of a handle.
pub fn id<H: RawHandle>(handle: H) -> usize {
    handle.as_ptr() as usize >> 4
}

impl State {
    fn alloc(&mut self, resource: Resource) -> usize {
        self.next_id += 1;
        let id = self.next_id;
        self.resources.insert(id, resource);
        id
    }

    fn alloc_sparse(&mut self, type_code: MInt, dims: Vec<MInt>) -> usize {
        let implicit = self.alloc(Resource::new(Kind::Tensor, type_code, Vec::new()));
        let explicit = self.alloc(Resource::new(Kind::Tensor, type_code, vec![1]));
        let mut sparse = Resource::new(Kind::SparseArray, type_code, dims);
        sparse.implicit = Some(Box::new(MTensor::from_ptr(handle_ptr(implicit))));
        sparse.explicit = Some(Box::new(MTensor::from_ptr(handle_ptr(explicit))));
        self.alloc(sparse)
    }

    fn live(&mut self, op: &'static str, id: usize) -> Option<&mut Resource> {
        match self.resources.get(&id).map(|r| r.alive) {
            Some(true) => self.resources.get_mut(&id),
            Some(false) => {
                self.violations.push(format!("{op} on released handle {id}"));
                None
            }
            None => {
                self.violations.push(format!("{op} on unknown handle {id}"));
                None
            }
        }
    }

    fn release(&mut self, op: &'static str, id: usize) {
        self.calls.push((op, id));
        self.retire(op, id);
    }

    fn retire(&mut self, op: &'static str, id: usize) {
        let (members, children) = match self.live(op, id) {
            Some(r) => {
                r.alive = false;
                (
                    [r.implicit.as_deref().copied(), r.explicit.as_deref().copied()],
                    std::mem::take(&mut r.children),
                )
            }
            None => return,
        };
        for member in members.into_iter().flatten() {
            if let Some(r) = self.resources.get_mut(&id_of_tensor(member)) {
                r.alive = false;
            }
        }
        // A data store releases what was pushed into it; a value already
        // released by someone else shows up as a violation here.
        for child in children {
            self.retire("delete with store", child);
        }
    }

    fn duplicate(&mut self, op: &'static str, src: usize) -> Option<usize> {
        let resource = self.live(op, src)?.clone();
        if resource.kind == Kind::SparseArray {
            return Some(self.alloc_sparse(resource.type_code, resource.dims));
        }
        let children = resource.children.clone();
        let mut copy = Resource {
            share_count: 0,
            children: Vec::new(),
            ..resource
        };
        for child in children {
            copy.children.extend(self.duplicate(op, child));
        }
        Some(self.alloc(copy))
    }
}

fn id_of_tensor(t: MTensor) -> usize {
    id(t)
}

fn read<T: Default>(op: &'static str, id: usize, f: impl FnOnce(&Resource) -> T) -> T {
    with(|s| s.live(op, id).map(|r| f(r)).unwrap_or_default())
}

unsafe fn read_dims(dims: *const MInt, rank: MInt) -> Vec<MInt> {
    if dims.is_null() || rank <= 0 {
        return Vec::new();
    }
    std::slice::from_raw_parts(dims, rank as usize).to_vec()
}

fn release(op: &'static str, id: usize) {
    with(|s| s.release(op, id));
}

fn disown(id: usize) {
    with(|s| {
        s.calls.push(("disown", id));
        let was_shared = s.live("disown", id).map(|r| {
            let shared = r.share_count > 0;
            if shared {
                r.share_count -= 1;
            }
            shared
        });
        if was_shared == Some(false) {
            s.violations.push(format!("disown of unshared handle {id}"));
        }
    });
}

fn clone_resource(src: usize) -> Result<usize, ErrCode> {
    with(|s| {
        s.calls.push(("clone", src));
        if let Some(code) = s.fail_clone.take() {
            return Err(code);
        }
        s.duplicate("clone", src).ok_or(LIBRARY_FUNCTION_ERROR)
    })
}

fn allocate(resource: Resource) -> Result<usize, ErrCode> {
    with(|s| {
        if let Some(code) = s.fail_new.take() {
            s.calls.push(("new", 0));
            return Err(code);
        }
        let id = s.alloc(resource);
        s.calls.push(("new", id));
        Ok(id)
    })
}

/// Generates the clone, free, disown and share count entries of a kind
/// that can be shared.
macro_rules! shared_entries {
    ($raw:ident, $clone:ident, $free:ident, $disown:ident, $share_count:ident) => {
        unsafe extern "C" fn $clone(src: $raw, out: *mut $raw) -> ErrCode {
            match clone_resource(id(src)) {
                Ok(new) => {
                    *out = $raw::from_ptr(handle_ptr(new));
                    LIBRARY_NO_ERROR
                }
                Err(code) => code,
            }
        }

        unsafe extern "C" fn $free(handle: $raw) {
            release("free", id(handle));
        }

        unsafe extern "C" fn $disown(handle: $raw) {
            disown(id(handle));
        }

        unsafe extern "C" fn $share_count(handle: $raw) -> MInt {
            read("share_count", id(handle), |r| r.share_count)
        }
    };
}

shared_entries!(MTensor, tensor_clone, tensor_free, tensor_disown, tensor_share_count);
shared_entries!(
    MNumericArray,
    numeric_array_clone,
    numeric_array_free,
    numeric_array_disown,
    numeric_array_share_count
);
shared_entries!(MImage, image_clone, image_free, image_disown, image_share_count);
shared_entries!(
    MSparseArray,
    sparse_array_clone,
    sparse_array_free,
    sparse_array_disown,
    sparse_array_share_count
);

// Tensor

unsafe extern "C" fn tensor_new(ty: MInt, rank: MInt, dims: *const MInt, out: *mut MTensor) -> ErrCode {
    let dims = read_dims(dims, rank);
    match allocate(Resource::new(Kind::Tensor, ty, dims)) {
        Ok(id) => {
            *out = MTensor::from_ptr(handle_ptr(id));
            LIBRARY_NO_ERROR
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn tensor_get_type(t: MTensor) -> MInt {
    read("get_type", id(t), |r| r.type_code)
}

unsafe extern "C" fn tensor_get_rank(t: MTensor) -> MInt {
    read("get_rank", id(t), |r| r.dims.len() as MInt)
}

unsafe extern "C" fn tensor_get_dimensions(t: MTensor) -> *const MInt {
    with(|s| {
        s.live("get_dimensions", id(t))
            .map_or(std::ptr::null(), |r| r.dims.as_ptr())
    })
}

unsafe extern "C" fn tensor_get_flattened_length(t: MTensor) -> MInt {
    read("get_flattened_length", id(t), |r| r.flattened_length())
}

// Numeric array

unsafe extern "C" fn numeric_array_new(
    ty: c_int,
    rank: MInt,
    dims: *const MInt,
    out: *mut MNumericArray,
) -> ErrCode {
    let dims = read_dims(dims, rank);
    match allocate(Resource::new(Kind::NumericArray, MInt::from(ty), dims)) {
        Ok(id) => {
            *out = MNumericArray::from_ptr(handle_ptr(id));
            LIBRARY_NO_ERROR
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn numeric_array_get_type(na: MNumericArray) -> c_int {
    read("get_type", id(na), |r| r.type_code as c_int)
}

unsafe extern "C" fn numeric_array_get_rank(na: MNumericArray) -> MInt {
    read("get_rank", id(na), |r| r.dims.len() as MInt)
}

unsafe extern "C" fn numeric_array_get_dimensions(na: MNumericArray) -> *const MInt {
    with(|s| {
        s.live("get_dimensions", id(na))
            .map_or(std::ptr::null(), |r| r.dims.as_ptr())
    })
}

unsafe extern "C" fn numeric_array_get_flattened_length(na: MNumericArray) -> MInt {
    read("get_flattened_length", id(na), |r| r.flattened_length())
}

unsafe extern "C" fn numeric_array_convert_type(
    out: *mut MNumericArray,
    src: MNumericArray,
    ty: c_int,
    _method: c_int,
    _tolerance: MReal,
) -> ErrCode {
    let converted = with(|s| {
        s.calls.push(("convert", id(src)));
        if let Some(code) = s.fail_convert.take() {
            return Err(code);
        }
        let new = s.duplicate("convert", id(src)).ok_or(LIBRARY_FUNCTION_ERROR)?;
        if let Some(r) = s.resources.get_mut(&new) {
            r.type_code = MInt::from(ty);
        }
        Ok(new)
    });
    match converted {
        Ok(new) => {
            *out = MNumericArray::from_ptr(handle_ptr(new));
            LIBRARY_NO_ERROR
        }
        Err(code) => code,
    }
}

// Image

fn image_resource(dims: Vec<MInt>, channels: MInt, ty: c_int, cs: c_int, interleaved: MBool) -> Resource {
    let mut image = Resource::new(Kind::Image, MInt::from(ty), dims);
    image.channels = channels;
    image.color_space = cs;
    image.interleaved = interleaved != 0;
    image
}

unsafe extern "C" fn image_new_2d(
    width: MInt,
    height: MInt,
    channels: MInt,
    ty: c_int,
    cs: c_int,
    interleaved: MBool,
    out: *mut MImage,
) -> ErrCode {
    match allocate(image_resource(vec![height, width], channels, ty, cs, interleaved)) {
        Ok(id) => {
            *out = MImage::from_ptr(handle_ptr(id));
            LIBRARY_NO_ERROR
        }
        Err(code) => code,
    }
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn image_new_3d(
    slices: MInt,
    width: MInt,
    height: MInt,
    channels: MInt,
    ty: c_int,
    cs: c_int,
    interleaved: MBool,
    out: *mut MImage,
) -> ErrCode {
    match allocate(image_resource(vec![slices, height, width], channels, ty, cs, interleaved)) {
        Ok(id) => {
            *out = MImage::from_ptr(handle_ptr(id));
            LIBRARY_NO_ERROR
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn image_get_data_type(img: MImage) -> c_int {
    read("get_data_type", id(img), |r| r.type_code as c_int)
}

unsafe extern "C" fn image_get_rank(img: MImage) -> MInt {
    read("get_rank", id(img), |r| r.dims.len() as MInt)
}

unsafe extern "C" fn image_get_row_count(img: MImage) -> MInt {
    read("get_row_count", id(img), |r| r.dims[r.dims.len() - 2])
}

unsafe extern "C" fn image_get_column_count(img: MImage) -> MInt {
    read("get_column_count", id(img), |r| r.dims[r.dims.len() - 1])
}

unsafe extern "C" fn image_get_slice_count(img: MImage) -> MInt {
    read("get_slice_count", id(img), |r| if r.dims.len() == 3 { r.dims[0] } else { 0 })
}

unsafe extern "C" fn image_get_channels(img: MImage) -> MInt {
    read("get_channels", id(img), |r| r.channels)
}

unsafe extern "C" fn image_alpha_channel_q(img: MImage) -> MBool {
    // Gray plus alpha, or RGB plus alpha.
    read("alpha_channel_q", id(img), |r| MBool::from(r.channels == 2 || r.channels == 4))
}

unsafe extern "C" fn image_interleaved_q(img: MImage) -> MBool {
    read("interleaved_q", id(img), |r| MBool::from(r.interleaved))
}

unsafe extern "C" fn image_get_color_space(img: MImage) -> c_int {
    read("get_color_space", id(img), |r| r.color_space)
}

unsafe extern "C" fn image_get_flattened_length(img: MImage) -> MInt {
    read("get_flattened_length", id(img), |r| r.flattened_length())
}

unsafe extern "C" fn image_convert_type(img: MImage, ty: c_int, interleaved: MBool) -> MImage {
    let converted = with(|s| {
        s.calls.push(("convert", id(img)));
        if s.fail_convert.take().is_some() {
            return None;
        }
        let new = s.duplicate("convert", id(img))?;
        if let Some(r) = s.resources.get_mut(&new) {
            r.type_code = MInt::from(ty);
            r.interleaved = interleaved != 0;
        }
        Some(new)
    });
    converted.map_or(MImage::null(), |new| MImage::from_ptr(handle_ptr(new)))
}

// Sparse array

fn new_sparse(op: &'static str, source: Option<usize>, dims: Vec<MInt>, implicit: MTensor) -> Result<usize, ErrCode> {
    with(|s| {
        if let Some(code) = s.fail_new.take() {
            s.calls.push((op, 0));
            return Err(code);
        }
        let type_code = match source {
            Some(src) => s.live(op, src).ok_or(LIBRARY_FUNCTION_ERROR)?.type_code,
            None => MTYPE_REAL,
        };
        let type_code = if implicit.is_null() {
            type_code
        } else {
            s.live(op, id(implicit)).ok_or(LIBRARY_FUNCTION_ERROR)?.type_code
        };
        let id = s.alloc_sparse(type_code, dims);
        s.calls.push((op, id));
        Ok(id)
    })
}

unsafe extern "C" fn sparse_array_from_tensor(data: MTensor, implicit: MTensor, out: *mut MSparseArray) -> ErrCode {
    let dims = read("from_tensor", id(data), |r| r.dims.clone());
    match new_sparse("from_tensor", Some(id(data)), dims, implicit) {
        Ok(id) => {
            *out = MSparseArray::from_ptr(handle_ptr(id));
            LIBRARY_NO_ERROR
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn sparse_array_from_explicit_positions(
    _positions: MTensor,
    values: MTensor,
    dimensions: MTensor,
    implicit: MTensor,
    out: *mut MSparseArray,
) -> ErrCode {
    // The fake keeps no tensor data, so every dimension is 1.
    let rank = read("from_explicit_positions", id(dimensions), |r| r.flattened_length());
    let dims = vec![1; rank as usize];
    match new_sparse("from_explicit_positions", Some(id(values)), dims, implicit) {
        Ok(id) => {
            *out = MSparseArray::from_ptr(handle_ptr(id));
            LIBRARY_NO_ERROR
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn sparse_array_reset_implicit_value(
    sa: MSparseArray,
    implicit: MTensor,
    out: *mut MSparseArray,
) -> ErrCode {
    let result = with(|s| {
        s.calls.push(("reset_implicit_value", id(sa)));
        let in_place = s.reset_in_place;
        let type_code = if implicit.is_null() {
            None
        } else {
            Some(s.live("reset_implicit_value", id(implicit)).ok_or(LIBRARY_FUNCTION_ERROR)?.type_code)
        };
        let target = if in_place {
            s.live("reset_implicit_value", id(sa)).ok_or(LIBRARY_FUNCTION_ERROR)?;
            id(sa)
        } else {
            s.duplicate("reset_implicit_value", id(sa)).ok_or(LIBRARY_FUNCTION_ERROR)?
        };
        if let Some(type_code) = type_code {
            if let Some(r) = s.resources.get_mut(&target) {
                r.type_code = type_code;
                let member = r.implicit.as_deref().copied();
                if let Some(m) = member.and_then(|m| s.resources.get_mut(&id(m))) {
                    m.type_code = type_code;
                }
            }
        }
        Ok(target)
    });
    match result {
        Ok(target) => {
            *out = MSparseArray::from_ptr(handle_ptr(target));
            LIBRARY_NO_ERROR
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn sparse_array_get_implicit_value(sa: MSparseArray) -> *mut MTensor {
    with(|s| {
        s.live("get_implicit_value", id(sa))
            .and_then(|r| r.implicit.as_deref_mut())
            .map_or(std::ptr::null_mut(), |slot| slot as *mut MTensor)
    })
}

unsafe extern "C" fn sparse_array_get_explicit_values(sa: MSparseArray) -> *mut MTensor {
    with(|s| {
        s.live("get_explicit_values", id(sa))
            .and_then(|r| r.explicit.as_deref_mut())
            .map_or(std::ptr::null_mut(), |slot| slot as *mut MTensor)
    })
}

fn sparse_to_tensor(op: &'static str, sa: MSparseArray, positions: bool) -> Result<usize, ErrCode> {
    with(|s| {
        s.calls.push((op, id(sa)));
        let r = s.live(op, id(sa)).ok_or(LIBRARY_FUNCTION_ERROR)?;
        let tensor = if positions {
            Resource::new(Kind::Tensor, MTYPE_INTEGER, vec![1, r.dims.len() as MInt])
        } else {
            Resource::new(Kind::Tensor, r.type_code, r.dims.clone())
        };
        Ok(s.alloc(tensor))
    })
}

unsafe extern "C" fn sparse_array_get_explicit_positions(sa: MSparseArray, out: *mut MTensor) -> ErrCode {
    match sparse_to_tensor("get_explicit_positions", sa, true) {
        Ok(id) => {
            *out = MTensor::from_ptr(handle_ptr(id));
            LIBRARY_NO_ERROR
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn sparse_array_to_tensor(sa: MSparseArray, out: *mut MTensor) -> ErrCode {
    match sparse_to_tensor("to_tensor", sa, false) {
        Ok(id) => {
            *out = MTensor::from_ptr(handle_ptr(id));
            LIBRARY_NO_ERROR
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn sparse_array_get_rank(sa: MSparseArray) -> MInt {
    read("get_rank", id(sa), |r| r.dims.len() as MInt)
}

unsafe extern "C" fn sparse_array_get_dimensions(sa: MSparseArray) -> *const MInt {
    with(|s| {
        s.live("get_dimensions", id(sa))
            .map_or(std::ptr::null(), |r| r.dims.as_ptr())
    })
}

// Data store

unsafe extern "C" fn data_store_create() -> MDataStore {
    match allocate(Resource::new(Kind::DataStore, 0, Vec::new())) {
        Ok(id) => MDataStore::from_ptr(handle_ptr(id)),
        Err(_) => MDataStore::null(),
    }
}

unsafe extern "C" fn data_store_copy(ds: MDataStore) -> MDataStore {
    clone_resource(id(ds)).map_or(MDataStore::null(), |new| MDataStore::from_ptr(handle_ptr(new)))
}

unsafe extern "C" fn data_store_delete(ds: MDataStore) {
    release("delete", id(ds));
}

unsafe extern "C" fn data_store_get_length(ds: MDataStore) -> MInt {
    read("get_length", id(ds), |r| r.entries.len() as MInt)
}

fn entry_text(name: Option<String>, value: String) -> String {
    match name {
        Some(name) => format!("{name}={value}"),
        None => value,
    }
}

unsafe fn c_text(ptr: *mut c_char) -> String {
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

fn push_entry(ds: MDataStore, name: Option<String>, value: String) {
    with(|s| {
        if let Some(r) = s.live("add", id(ds)) {
            r.entries.push(entry_text(name, value));
        }
    });
}

// The store takes over `child`; it is released when the store is deleted.
fn push_child(ds: MDataStore, name: Option<String>, label: &str, child: usize) {
    with(|s| {
        s.calls.push(("add", child));
        if s.live("add", child).is_none() {
            return;
        }
        if let Some(r) = s.live("add", id(ds)) {
            r.entries.push(entry_text(name, format!("{label}:{child}")));
            r.children.push(child);
        }
    });
}

/// Generates the plain and named entries that add a plain value to a data
/// store.
macro_rules! store_entries {
    ($add:ident, $add_named:ident, $ty:ty, |$value:ident| $text:expr) => {
        unsafe extern "C" fn $add(ds: MDataStore, $value: $ty) {
            push_entry(ds, None, $text);
        }

        unsafe extern "C" fn $add_named(ds: MDataStore, name: *mut c_char, $value: $ty) {
            push_entry(ds, Some(c_text(name)), $text);
        }
    };
}

/// Generates the plain and named entries that hand a container to a data
/// store.
macro_rules! store_containers {
    ($add:ident, $add_named:ident, $raw:ident, $label:literal) => {
        unsafe extern "C" fn $add(ds: MDataStore, value: $raw) {
            push_child(ds, None, $label, id(value));
        }

        unsafe extern "C" fn $add_named(ds: MDataStore, name: *mut c_char, value: $raw) {
            push_child(ds, Some(c_text(name)), $label, id(value));
        }
    };
}

store_entries!(data_store_add_integer, data_store_add_named_integer, MInt, |value| format!("integer:{}", value));
store_entries!(data_store_add_real, data_store_add_named_real, MReal, |value| format!("real:{}", value));
store_entries!(data_store_add_boolean, data_store_add_named_boolean, MBool, |value| format!(
    "boolean:{}",
    value != 0
));
store_entries!(data_store_add_complex, data_store_add_named_complex, MComplex, |value| format!(
    "complex:{}+{}i",
    value.re, value.im
));
store_entries!(data_store_add_string, data_store_add_named_string, *mut c_char, |value| format!(
    "string:{}",
    c_text(value)
));
store_containers!(data_store_add_tensor, data_store_add_named_tensor, MTensor, "tensor");
store_containers!(data_store_add_sparse_array, data_store_add_named_sparse_array, MSparseArray, "sparse_array");
store_containers!(data_store_add_numeric_array, data_store_add_named_numeric_array, MNumericArray, "numeric_array");
store_containers!(data_store_add_image, data_store_add_named_image, MImage, "image");
store_containers!(data_store_add_data_store, data_store_add_named_data_store, MDataStore, "data_store");

/// Function tables of the fake host, with every entry filled in.
pub fn functions() -> HostFunctions {
    HostFunctions {
        tensor: Some(TensorFunctions {
            new: Some(tensor_new),
            clone: Some(tensor_clone),
            free: Some(tensor_free),
            disown: Some(tensor_disown),
            share_count: Some(tensor_share_count),
            get_type: Some(tensor_get_type),
            get_rank: Some(tensor_get_rank),
            get_dimensions: Some(tensor_get_dimensions),
            get_flattened_length: Some(tensor_get_flattened_length),
        }),
        numeric_array: Some(NumericArrayFunctions {
            new: Some(numeric_array_new),
            clone: Some(numeric_array_clone),
            free: Some(numeric_array_free),
            disown: Some(numeric_array_disown),
            share_count: Some(numeric_array_share_count),
            get_type: Some(numeric_array_get_type),
            get_rank: Some(numeric_array_get_rank),
            get_dimensions: Some(numeric_array_get_dimensions),
            get_flattened_length: Some(numeric_array_get_flattened_length),
            convert_type: Some(numeric_array_convert_type),
        }),
        image: Some(ImageFunctions {
            new_2d: Some(image_new_2d),
            new_3d: Some(image_new_3d),
            clone: Some(image_clone),
            free: Some(image_free),
            disown: Some(image_disown),
            share_count: Some(image_share_count),
            get_data_type: Some(image_get_data_type),
            get_rank: Some(image_get_rank),
            get_row_count: Some(image_get_row_count),
            get_column_count: Some(image_get_column_count),
            get_slice_count: Some(image_get_slice_count),
            get_channels: Some(image_get_channels),
            alpha_channel_q: Some(image_alpha_channel_q),
            interleaved_q: Some(image_interleaved_q),
            get_color_space: Some(image_get_color_space),
            get_flattened_length: Some(image_get_flattened_length),
            convert_type: Some(image_convert_type),
        }),
        sparse_array: Some(SparseArrayFunctions {
            from_explicit_positions: Some(sparse_array_from_explicit_positions),
            from_tensor: Some(sparse_array_from_tensor),
            reset_implicit_value: Some(sparse_array_reset_implicit_value),
            clone: Some(sparse_array_clone),
            free: Some(sparse_array_free),
            disown: Some(sparse_array_disown),
            share_count: Some(sparse_array_share_count),
            get_implicit_value: Some(sparse_array_get_implicit_value),
            get_explicit_values: Some(sparse_array_get_explicit_values),
            get_explicit_positions: Some(sparse_array_get_explicit_positions),
            to_tensor: Some(sparse_array_to_tensor),
            get_rank: Some(sparse_array_get_rank),
            get_dimensions: Some(sparse_array_get_dimensions),
        }),
        data_store: Some(DataStoreFunctions {
            create: Some(data_store_create),
            copy: Some(data_store_copy),
            delete: Some(data_store_delete),
            get_length: Some(data_store_get_length),
            add_integer: Some(data_store_add_integer),
            add_real: Some(data_store_add_real),
            add_boolean: Some(data_store_add_boolean),
            add_complex: Some(data_store_add_complex),
            add_string: Some(data_store_add_string),
            add_tensor: Some(data_store_add_tensor),
            add_sparse_array: Some(data_store_add_sparse_array),
            add_numeric_array: Some(data_store_add_numeric_array),
            add_image: Some(data_store_add_image),
            add_data_store: Some(data_store_add_data_store),
            add_named_integer: Some(data_store_add_named_integer),
            add_named_real: Some(data_store_add_named_real),
            add_named_boolean: Some(data_store_add_named_boolean),
            add_named_complex: Some(data_store_add_named_complex),
            add_named_string: Some(data_store_add_named_string),
            add_named_tensor: Some(data_store_add_named_tensor),
            add_named_sparse_array: Some(data_store_add_named_sparse_array),
            add_named_numeric_array: Some(data_store_add_named_numeric_array),
            add_named_image: Some(data_store_add_named_image),
            add_named_data_store: Some(data_store_add_named_data_store),
        }),
    }
}

/// Reset the fake host and build a context over it.
pub fn host() -> HostContext {
    reset();
    unsafe { HostContext::new(functions()) }
}

/// Forget every resource, call and injected failure.
pub fn reset() {
    with(|s| *s = State::default());
}

// Resources the host allocates on its own, as if passed in by a caller.

pub fn host_tensor(ty: MInt, dims: &[MInt]) -> MTensor {
    let id = with(|s| s.alloc(Resource::new(Kind::Tensor, ty, dims.to_vec())));
    MTensor::from_ptr(handle_ptr(id))
}

pub fn host_numeric_array(ty: c_int, dims: &[MInt]) -> MNumericArray {
    let id = with(|s| s.alloc(Resource::new(Kind::NumericArray, MInt::from(ty), dims.to_vec())));
    MNumericArray::from_ptr(handle_ptr(id))
}

pub fn host_image(width: MInt, height: MInt, channels: MInt) -> MImage {
    let image = image_resource(vec![height, width], channels, MIMAGE_TYPE_BIT8, MIMAGE_CS_RGB, 1);
    let id = with(|s| s.alloc(image));
    MImage::from_ptr(handle_ptr(id))
}

pub fn host_sparse_array(ty: MInt, dims: &[MInt]) -> MSparseArray {
    let id = with(|s| s.alloc_sparse(ty, dims.to_vec()));
    MSparseArray::from_ptr(handle_ptr(id))
}

pub fn host_data_store() -> MDataStore {
    let id = with(|s| s.alloc(Resource::new(Kind::DataStore, 0, Vec::new())));
    MDataStore::from_ptr(handle_ptr(id))
}

/// Set the share count the host reports for `handle`.
pub fn share<H: RawHandle>(handle: H, count: MInt) {
    with(|s| {
        if let Some(r) = s.resources.get_mut(&id(handle)) {
            r.share_count = count;
        }
    });
}

/// Share count of `handle` as the host tracks it, whether or not alive.
pub fn share_count<H: RawHandle>(handle: H) -> MInt {
    with(|s| s.resources.get(&id(handle)).map_or(0, |r| r.share_count))
}

/// Check if the host still considers `handle` allocated.
pub fn is_alive<H: RawHandle>(handle: H) -> bool {
    with(|s| s.resources.get(&id(handle)).is_some_and(|r| r.alive))
}

/// Number of live resources of a kind.
pub fn live_count(kind: Kind) -> usize {
    with(|s| {
        s.resources
            .values()
            .filter(|r| r.kind == kind && r.alive)
            .count()
    })
}

/// Every recorded call, in order, as (operation, handle id).
pub fn calls() -> Vec<(&'static str, usize)> {
    with(|s| s.calls.clone())
}

/// Number of times `op` was called on `handle`.
pub fn count<H: RawHandle>(op: &str, handle: H) -> usize {
    let target = id(handle);
    with(|s| {
        s.calls
            .iter()
            .filter(|(o, i)| *o == op && *i == target)
            .count()
    })
}

/// Number of times `op` was called on any handle.
pub fn count_all(op: &str) -> usize {
    with(|s| s.calls.iter().filter(|(o, _)| *o == op).count())
}

/// Misuse the host detected: double release, use after release, and so on.
pub fn violations() -> Vec<String> {
    with(|s| s.violations.clone())
}

/// Entries pushed to a data store.
pub fn entries(ds: MDataStore) -> Vec<String> {
    with(|s| s.resources.get(&id(ds)).map_or_else(Vec::new, |r| r.entries.clone()))
}

/// Make the next allocation fail with `code`.
pub fn fail_next_new(code: ErrCode) {
    with(|s| s.fail_new = Some(code));
}

/// Make the next clone fail with `code`.
pub fn fail_next_clone(code: ErrCode) {
    with(|s| s.fail_clone = Some(code));
}

/// Make the next type conversion fail with `code`.
pub fn fail_next_convert(code: ErrCode) {
    with(|s| s.fail_convert = Some(code));
}

/// Update sparse arrays in place instead of returning a new array.
pub fn set_reset_in_place(in_place: bool) {
    with(|s| s.reset_in_place = in_place);
}

/// Assert that the host saw no misuse.
pub fn assert_clean() {
    let violations = violations();
    assert!(violations.is_empty(), "host detected misuse: {:?}", violations);
}
