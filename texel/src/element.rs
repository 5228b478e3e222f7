// Distributed under The MIT License (MIT)
//
// Copyright (c) 2024 The `arrayview` developers
//! Scalar element kinds that may back a shared buffer.
use core::fmt;

/// The numeric kind of a single buffer element.
///
/// This is the untyped counterpart of [`Element`]. A descriptor stores one of these to say how
/// its bytes are to be interpreted, without committing to a Rust type. All kinds have an
/// alignment equal to their size and a size of at most eight bytes, which is what allows the
/// shared buffer to load and store each element with a single atomic access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

/// A plain old data scalar that may be stored in a shared buffer.
///
/// Implemented for the primitive integer and float types, and sealed: the kind reported by
/// [`Element::KIND`] must agree with the in-memory size of the type.
pub trait Element: bytemuck::Pod + PartialEq + fmt::Debug + Send + Sync + sealed::Sealed {
    /// The untyped kind of this element.
    const KIND: ElementKind;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! elements {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Element for $ty {
                const KIND: ElementKind = ElementKind::$kind;
            }
        )*
    };
}

elements! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

impl ElementKind {
    /// Every element kind, ordered by size and then signedness.
    pub const ALL: [ElementKind; 10] = [
        ElementKind::U8,
        ElementKind::I8,
        ElementKind::U16,
        ElementKind::I16,
        ElementKind::U32,
        ElementKind::I32,
        ElementKind::U64,
        ElementKind::I64,
        ElementKind::F32,
        ElementKind::F64,
    ];

    /// The number of bytes of one element.
    pub const fn size(self) -> usize {
        match self {
            ElementKind::U8 | ElementKind::I8 => 1,
            ElementKind::U16 | ElementKind::I16 => 2,
            ElementKind::U32 | ElementKind::I32 | ElementKind::F32 => 4,
            ElementKind::U64 | ElementKind::I64 | ElementKind::F64 => 8,
        }
    }

    /// The conventional dense-array name of this kind, such as `int32` or `float64`.
    pub const fn name(self) -> &'static str {
        match self {
            ElementKind::U8 => "uint8",
            ElementKind::I8 => "int8",
            ElementKind::U16 => "uint16",
            ElementKind::I16 => "int16",
            ElementKind::U32 => "uint32",
            ElementKind::I32 => "int32",
            ElementKind::U64 => "uint64",
            ElementKind::I64 => "int64",
            ElementKind::F32 => "float32",
            ElementKind::F64 => "float64",
        }
    }

    /// Check if values of `T` are elements of this kind.
    pub fn is<T: Element>(self) -> bool {
        T::KIND == self
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[test]
fn kinds_agree_with_types() {
    fn check<T: Element>() {
        assert_eq!(T::KIND.size(), core::mem::size_of::<T>());
        assert!(T::KIND.is::<T>());
    }

    check::<u8>();
    check::<i8>();
    check::<u16>();
    check::<i16>();
    check::<u32>();
    check::<i32>();
    check::<u64>();
    check::<i64>();
    check::<f32>();
    check::<f64>();
}
