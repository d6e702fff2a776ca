//! Typed flat storage backing both data list variants.

use std::any::Any;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// Opaque payload stored in an object-typed data list.
#[derive(Clone)]
pub struct ObjectRef(pub Rc<dyn Any>);

impl ObjectRef {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:p})", Rc::as_ptr(&self.0))
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Flat scalar buffer of one of the supported element types.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Text(Vec<String>),
    Object(Vec<ObjectRef>),
}

impl Storage {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Storage::Int(v) => v.len(),
            Storage::Float(v) => v.len(),
            Storage::Double(v) => v.len(),
            Storage::Text(v) => v.len(),
            Storage::Object(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human readable name of the element type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Storage::Int(_) => "int",
            Storage::Float(_) => "float",
            Storage::Double(_) => "double",
            Storage::Text(_) => "string",
            Storage::Object(_) => "object",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Storage::Int(_) | Storage::Float(_) | Storage::Double(_))
    }

    pub fn slice(&self, range: Range<usize>) -> StorageSlice<'_> {
        match self {
            Storage::Int(v) => StorageSlice::Int(&v[range]),
            Storage::Float(v) => StorageSlice::Float(&v[range]),
            Storage::Double(v) => StorageSlice::Double(&v[range]),
            Storage::Text(v) => StorageSlice::Text(&v[range]),
            Storage::Object(v) => StorageSlice::Object(&v[range]),
        }
    }

    pub fn as_slice(&self) -> StorageSlice<'_> {
        self.slice(0..self.len())
    }
}

/// Borrowed view into a [`Storage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StorageSlice<'a> {
    Int(&'a [i32]),
    Float(&'a [f32]),
    Double(&'a [f64]),
    Text(&'a [String]),
    Object(&'a [ObjectRef]),
}

impl<'a> StorageSlice<'a> {
    pub fn len(&self) -> usize {
        match self {
            StorageSlice::Int(v) => v.len(),
            StorageSlice::Float(v) => v.len(),
            StorageSlice::Double(v) => v.len(),
            StorageSlice::Text(v) => v.len(),
            StorageSlice::Object(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric values widened to `f64`, `None` for text and object data.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            StorageSlice::Int(v) => Some(v.iter().map(|&x| f64::from(x)).collect()),
            StorageSlice::Float(v) => Some(v.iter().map(|&x| f64::from(x)).collect()),
            StorageSlice::Double(v) => Some(v.to_vec()),
            StorageSlice::Text(_) | StorageSlice::Object(_) => None,
        }
    }

    /// Integer values; floating data is truncated toward zero.
    pub fn to_i32_vec(&self) -> Option<Vec<i32>> {
        match self {
            StorageSlice::Int(v) => Some(v.to_vec()),
            StorageSlice::Float(v) => Some(v.iter().map(|&x| x as i32).collect()),
            StorageSlice::Double(v) => Some(v.iter().map(|&x| x as i32).collect()),
            StorageSlice::Text(_) | StorageSlice::Object(_) => None,
        }
    }

    pub fn to_string_vec(&self) -> Option<Vec<String>> {
        match self {
            StorageSlice::Text(v) => Some(v.to_vec()),
            _ => None,
        }
    }
}

/// Element types that can be stored in a data list.
pub trait Scalar: Clone {
    fn into_storage(values: Vec<Self>) -> Storage;
}

impl Scalar for i32 {
    fn into_storage(values: Vec<Self>) -> Storage {
        Storage::Int(values)
    }
}

impl Scalar for f32 {
    fn into_storage(values: Vec<Self>) -> Storage {
        Storage::Float(values)
    }
}

impl Scalar for f64 {
    fn into_storage(values: Vec<Self>) -> Storage {
        Storage::Double(values)
    }
}

impl Scalar for String {
    fn into_storage(values: Vec<Self>) -> Storage {
        Storage::Text(values)
    }
}

impl Scalar for ObjectRef {
    fn into_storage(values: Vec<Self>) -> Storage {
        Storage::Object(values)
    }
}
