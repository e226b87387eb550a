// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static type traits summarised as bit flags.

use bitflags::bitflags;

bitflags! {
    /// Static traits of a reflected type.
    ///
    /// Declared through [`Reflect::FLAGS`](crate::Reflect::FLAGS) and completed
    /// with measured traits ([`TypeFlags::EMPTY`], [`TypeFlags::TRIVIAL`]) when
    /// the descriptor is created.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u32 {
        const ARRAY          = 1 << 0;
        const CLASS          = 1 << 1;
        const ENUM           = 1 << 2;
        const FLOATING_POINT = 1 << 3;
        const INTEGRAL       = 1 << 4;
        const POINTER        = 1 << 5;
        const UNION          = 1 << 6;
        const ARITHMETIC     = 1 << 7;
        const COMPOUND       = 1 << 8;
        const FUNDAMENTAL    = 1 << 9;
        const REFERENCE      = 1 << 10;
        const SCALAR         = 1 << 11;
        const CONST          = 1 << 12;
        /// Zero-sized class type.
        const EMPTY          = 1 << 13;
        const SIGNED         = 1 << 14;
        const UNSIGNED       = 1 << 15;
        /// No drop glue.
        const TRIVIAL        = 1 << 16;
    }
}

impl TypeFlags {
    /// Struct-like type with reflectable members.
    pub const STRUCT: Self = Self::CLASS.union(Self::COMPOUND);
    /// C-like enumeration.
    pub const ENUMERATION: Self = Self::ENUM.union(Self::COMPOUND).union(Self::SCALAR);
    pub const SIGNED_INTEGER: Self = Self::INTEGRAL
        .union(Self::SIGNED)
        .union(Self::ARITHMETIC)
        .union(Self::FUNDAMENTAL)
        .union(Self::SCALAR);
    pub const UNSIGNED_INTEGER: Self = Self::INTEGRAL
        .union(Self::UNSIGNED)
        .union(Self::ARITHMETIC)
        .union(Self::FUNDAMENTAL)
        .union(Self::SCALAR);
    pub const FLOAT: Self = Self::FLOATING_POINT
        .union(Self::SIGNED)
        .union(Self::ARITHMETIC)
        .union(Self::FUNDAMENTAL)
        .union(Self::SCALAR);

    /// Complete declared flags with the traits measured from `T`.
    pub fn measure<T>(declared: Self) -> Self {
        let mut flags = declared;
        if declared.contains(Self::CLASS) && std::mem::size_of::<T>() == 0 {
            flags |= Self::EMPTY;
        }
        if !std::mem::needs_drop::<T>() {
            flags |= Self::TRIVIAL;
        }
        flags
    }

    pub fn is_class(self) -> bool {
        self.contains(Self::CLASS)
    }

    pub fn is_arithmetic(self) -> bool {
        self.contains(Self::ARITHMETIC)
    }
}
