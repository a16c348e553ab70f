//! `Reflect` for std and common ecosystem types.

use super::{Reflect, TypeDescriptor};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

macro_rules! reflect_as {
    ($ctor:ident => $($ty:ty),+ $(,)?) => {
        $(
            impl Reflect for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::$ctor()
                }
            }
        )+
    };
}

reflect_as!(string => String, str, char);
reflect_as!(integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
reflect_as!(number => f32, f64);
reflect_as!(boolean => bool);

impl<'a> Reflect for Cow<'a, str> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::string()
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(T::descriptor())
    }
}

macro_rules! reflect_sequence {
    ($($ty:ident),+) => {
        $(
            impl<T: Reflect> Reflect for $ty<T> {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::sequence(T::descriptor())
                }
            }
        )+
    };
}

reflect_sequence!(Vec, VecDeque, BTreeSet);

impl<T: Reflect, S> Reflect for HashSet<T, S> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence(T::descriptor())
    }
}

impl<T: Reflect> Reflect for [T] {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence(T::descriptor())
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence(T::descriptor())
    }
}

// Keys are never described
impl<K, V: Reflect, S> Reflect for HashMap<K, V, S> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::mapping(V::descriptor())
    }
}

impl<K, V: Reflect> Reflect for BTreeMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::mapping(V::descriptor())
    }
}

macro_rules! reflect_transparent {
    ($($ty:ident),+) => {
        $(
            impl<T: Reflect + ?Sized> Reflect for $ty<T> {
                fn descriptor() -> TypeDescriptor {
                    T::descriptor()
                }
            }
        )+
    };
}

reflect_transparent!(Box, Rc, Arc);

impl<'a, T: Reflect + ?Sized> Reflect for &'a T {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }
}

impl Reflect for serde_json::Value {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Opaque
    }
}

impl Reflect for () {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Opaque
    }
}

#[cfg(feature = "chrono")]
mod chrono_impls {
    use super::{Reflect, TypeDescriptor};
    use crate::schema::SchemaKind;

    impl<Tz: chrono::TimeZone> Reflect for chrono::DateTime<Tz> {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::formatted(SchemaKind::String, "date-time")
        }
    }

    impl Reflect for chrono::NaiveDateTime {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::formatted(SchemaKind::String, "date-time")
        }
    }

    impl Reflect for chrono::NaiveDate {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::formatted(SchemaKind::String, "date")
        }
    }
}

#[cfg(feature = "uuid")]
impl Reflect for uuid::Uuid {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::formatted(crate::schema::SchemaKind::String, "uuid")
    }
}
