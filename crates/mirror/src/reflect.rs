// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The `Reflect` trait and its implementations for standard types.

use crate::error::Result;
use crate::flags::TypeFlags;
use crate::dsl::Mirror;

/// A type that can describe itself to a [`Registry`](crate::Registry).
///
/// `reflect` is the static registration function: it runs at most once per
/// registry, the first time the type is queried, and declares the type's
/// name, members and base classes through the [`Mirror`].
///
/// # Example
///
/// ```rust
/// use mirror::{member, Accessibility, Mirror, Reflect, Registry, Result};
///
/// struct Sensor {
///     id: u32,
///     reading: f64,
/// }
///
/// impl Reflect for Sensor {
///     fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
///         mirror.declare("Sensor")?.describe("A single temperature sensor");
///         mirror.member(member!(Sensor, id), 0)?;
///         mirror
///             .property(member!(Sensor, reading), 1)
///             .name("reading")
///             .accessibility(Accessibility::Protected)
///             .register()?;
///         Ok(())
///     }
/// }
///
/// let registry = Registry::new();
/// let desc = registry.get_type::<Sensor>().unwrap();
/// assert_eq!(desc.name(), Some("Sensor"));
/// assert_eq!(desc.properties().map(|p| p.len()), Some(2));
/// ```
pub trait Reflect: Sized + 'static {
    /// Declared static traits. Structs are class types by default.
    const FLAGS: TypeFlags = TypeFlags::STRUCT;

    fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()>;
}

macro_rules! reflect_scalar {
    ($flags:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Reflect for $ty {
                const FLAGS: TypeFlags = $flags;

                fn reflect(_mirror: &mut Mirror<'_, Self>) -> Result<()> {
                    Ok(())
                }
            }
        )+
    };
}

reflect_scalar!(TypeFlags::SIGNED_INTEGER => i8, i16, i32, i64, i128, isize);
reflect_scalar!(TypeFlags::UNSIGNED_INTEGER => u8, u16, u32, u64, u128, usize);
reflect_scalar!(TypeFlags::FLOAT => f32, f64);
reflect_scalar!(
    TypeFlags::INTEGRAL
        .union(TypeFlags::ARITHMETIC)
        .union(TypeFlags::FUNDAMENTAL)
        .union(TypeFlags::SCALAR)
        => bool, char
);
reflect_scalar!(TypeFlags::FUNDAMENTAL => ());
reflect_scalar!(TypeFlags::COMPOUND => String);

impl<T: Reflect> Reflect for Vec<T> {
    const FLAGS: TypeFlags = TypeFlags::COMPOUND;

    fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
        mirror.reflect_type::<T>().map(drop)
    }
}

impl<T: Reflect> Reflect for Option<T> {
    const FLAGS: TypeFlags = TypeFlags::COMPOUND;

    fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
        mirror.reflect_type::<T>().map(drop)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    const FLAGS: TypeFlags = TypeFlags::POINTER.union(TypeFlags::SCALAR);

    fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
        mirror.reflect_type::<T>().map(drop)
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    const FLAGS: TypeFlags = TypeFlags::ARRAY.union(TypeFlags::COMPOUND);

    fn reflect(mirror: &mut Mirror<'_, Self>) -> Result<()> {
        mirror.reflect_type::<T>().map(drop)
    }
}
