//! FFI utilities and the named object registry

use std::{
    collections::HashMap,
    ffi::{c_char, CStr, CString},
    ptr::NonNull,
    sync::{Mutex, MutexGuard, PoisonError},
};

use log::warn;

use crate::{
    error::{PktError, Result},
    mbuf::MbufPool,
    pool::Pool,
    ring::Ring,
};

use super::types::ObjPtr;

// Global name registry, touched only by create/lookup/free calls
lazy_static::lazy_static! {
    pub static ref OBJECT_REGISTRY: Mutex<ObjectRegistry> = Mutex::new(ObjectRegistry::new());
}

/// Heap object owned by the registry and handed to C as a raw pointer
struct Registered<T>(NonNull<T>);

// The registry only stores the pointer; objects are themselves Sync
unsafe impl<T: Send + Sync> Send for Registered<T> {}

/// Objects of one kind, keyed by name
pub struct NamedTable<T> {
    entries: HashMap<String, Registered<T>>,
}

impl<T: Send + Sync> NamedTable<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Take ownership of `object` under `name` and return its address
    pub fn register(&mut self, name: &str, object: T) -> Result<*mut T> {
        if self.entries.contains_key(name) {
            return Err(PktError::name_exists(name));
        }

        let ptr = NonNull::from(Box::leak(Box::new(object)));
        self.entries.insert(name.to_owned(), Registered(ptr));
        Ok(ptr.as_ptr())
    }

    pub fn lookup(&self, name: &str) -> Option<*mut T> {
        self.entries.get(name).map(|entry| entry.0.as_ptr())
    }

    /// Borrow the object registered at address `ptr`
    pub fn get(&self, ptr: *mut T) -> Option<&T> {
        self.entries
            .values()
            .find(|entry| entry.0.as_ptr() == ptr)
            // SAFETY: registered objects stay alive until `unregister`,
            // which needs `&mut self`
            .map(|entry| unsafe { entry.0.as_ref() })
    }

    /// Remove the object at `ptr` and hand ownership back
    pub fn unregister(&mut self, ptr: *mut T) -> Option<Box<T>> {
        let name = self
            .entries
            .iter()
            .find(|(_, entry)| entry.0.as_ptr() == ptr)
            .map(|(name, _)| name.clone())?;

        self.entries
            .remove(&name)
            // SAFETY: the pointer came from Box::leak in `register`
            .map(|entry| unsafe { Box::from_raw(entry.0.as_ptr()) })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every ring and pool created through the C API
pub struct ObjectRegistry {
    pub rings: NamedTable<Ring<ObjPtr>>,
    pub mempools: NamedTable<Pool>,
    pub mbuf_pools: NamedTable<MbufPool>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            rings: NamedTable::new(),
            mempools: NamedTable::new(),
            mbuf_pools: NamedTable::new(),
        }
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock the registry, ignoring poisoning from a panicked holder
pub fn registry() -> MutexGuard<'static, ObjectRegistry> {
    OBJECT_REGISTRY
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Convert C string to Rust String
pub fn c_str_to_string(c_str: *const c_char) -> Result<String> {
    if c_str.is_null() {
        return Err(PktError::invalid_parameter("name", "Name is null"));
    }

    unsafe {
        CStr::from_ptr(c_str)
            .to_str()
            .map(|s| s.to_owned())
            .map_err(|_| PktError::invalid_parameter("name", "Name is not valid UTF-8"))
    }
}

/// Convert Rust String to C string (caller must free with pktcore_free_string)
pub fn string_to_c_str(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_string) => c_string.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Reborrow a C handle, logging when it is null
///
/// # Safety
/// A non-null `handle` must point at a live `T`.
pub unsafe fn handle_ref<'a, T>(handle: *mut std::ffi::c_void, what: &str) -> Option<&'a T> {
    let object = handle.cast::<T>().as_ref();
    if object.is_none() {
        warn!("null {} handle passed to C API", what);
    }
    object
}

/// Free a C string allocated by this library
#[no_mangle]
pub extern "C" fn pktcore_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
