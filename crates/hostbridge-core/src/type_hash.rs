//! Deterministic hash-based type identity system.
//!
//! This module provides [`TypeHash`], a 64-bit hash that identifies host types,
//! function shapes and procedure signatures. Hashes are computed deterministically
//! from names and component hashes, so the same descriptor built twice (or by two
//! independent engines) always carries the same identity.
//!
//! # Hash Computation
//!
//! Uses XXHash64 with domain-specific mixing constants to prevent collisions
//! between different entity kinds (types vs signatures vs composite types).
//!
//! # Examples
//!
//! ```
//! use hostbridge_core::{TypeHash, primitives};
//!
//! let int_hash = TypeHash::from_name("int32");
//! assert_eq!(int_hash, primitives::INT32);
//!
//! // Signature hash includes parameter types
//! let a = TypeHash::from_function("print", &[primitives::INT32]);
//! let b = TypeHash::from_function("print", &[primitives::STRING]);
//! assert_ne!(a, b);
//! ```

use std::fmt;

use xxhash_rust::const_xxh64;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for composite components
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for procedure signature hashes
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Parameter position mixing constants.
    /// Each position gets a unique constant so that component order matters.
    pub const PARAM_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x123456789abcdef0,
    ];
}

/// A deterministic 64-bit hash identifying a host type or signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a qualified type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Const-evaluable twin of [`TypeHash::from_name`], used for the
    /// well-known constants in [`primitives`].
    #[inline]
    pub const fn from_name_const(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ const_xxh64::xxh64(name.as_bytes(), 0))
    }

    /// Create a signature hash from a procedure name and parameter type hashes.
    ///
    /// Parameter order matters - `(int, string)` differs from `(string, int)`.
    #[inline]
    pub fn from_function(name: &str, param_hashes: &[TypeHash]) -> Self {
        let seed = hash_constants::FUNCTION ^ xxh64(name.as_bytes(), 0);
        TypeHash(mix(seed, param_hashes))
    }

    /// Create a composite type hash from a template hash and its arguments.
    ///
    /// Used for arrays, nullable wrappers and generic function shapes, e.g.
    /// `func<int32, int32, float64>`.
    #[inline]
    pub fn from_template_instance(template: TypeHash, args: &[TypeHash]) -> Self {
        TypeHash(mix(template.0, args))
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

fn mix(seed: u64, parts: &[TypeHash]) -> u64 {
    let mut hash = seed;
    for (i, part) in parts.iter().enumerate() {
        let marker = hash_constants::PARAM_MARKERS
            .get(i)
            .copied()
            .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
        // wrapping_mul keeps the mix order-sensitive (XOR alone is commutative)
        hash = hash
            .wrapping_mul(hash_constants::SEP)
            .wrapping_add(marker ^ part.0);
    }
    hash
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Well-known hashes for built-in host types and runtime markers.
pub mod primitives {
    use super::TypeHash;

    /// `void` (no value)
    pub const VOID: TypeHash = TypeHash::from_name_const("void");
    /// `bool`
    pub const BOOL: TypeHash = TypeHash::from_name_const("bool");
    /// `char`
    pub const CHAR: TypeHash = TypeHash::from_name_const("char");
    /// `int8`
    pub const INT8: TypeHash = TypeHash::from_name_const("int8");
    /// `int16`
    pub const INT16: TypeHash = TypeHash::from_name_const("int16");
    /// `int32`
    pub const INT32: TypeHash = TypeHash::from_name_const("int32");
    /// `int64`
    pub const INT64: TypeHash = TypeHash::from_name_const("int64");
    /// `uint8`
    pub const UINT8: TypeHash = TypeHash::from_name_const("uint8");
    /// `uint16`
    pub const UINT16: TypeHash = TypeHash::from_name_const("uint16");
    /// `uint32`
    pub const UINT32: TypeHash = TypeHash::from_name_const("uint32");
    /// `uint64`
    pub const UINT64: TypeHash = TypeHash::from_name_const("uint64");
    /// `float32`
    pub const FLOAT32: TypeHash = TypeHash::from_name_const("float32");
    /// `float64`
    pub const FLOAT64: TypeHash = TypeHash::from_name_const("float64");
    /// `string`
    pub const STRING: TypeHash = TypeHash::from_name_const("string");

    /// `object` - the top type, every value satisfies it
    pub const OBJECT: TypeHash = TypeHash::from_name_const("object");
    /// Runtime marker for the null value (the `Null->T` cache key)
    pub const NULL: TypeHash = TypeHash::from_name_const("null");
    /// Opaque guest value passed through unconverted
    pub const GUEST: TypeHash = TypeHash::from_name_const("guest");
    /// Raw guest argument array
    pub const GUEST_ARGS: TypeHash = TypeHash::from_name_const("guest[]");
    /// Untyped host value array (`object[]`)
    pub const VALUES: TypeHash = TypeHash::from_name_const("object[]");
    /// A guest callable that has not been adapted to a shape yet
    pub const CALLABLE: TypeHash = TypeHash::from_name_const("callable");
    /// Injected engine/context handle
    pub const CONTEXT: TypeHash = TypeHash::from_name_const("context");

    /// Template marker for `T[]`
    pub const ARRAY_TEMPLATE: TypeHash = TypeHash::from_name_const("array");
    /// Template marker for `T?`
    pub const NULLABLE_TEMPLATE: TypeHash = TypeHash::from_name_const("nullable");
    /// Bare zero-argument action
    pub const ACTION: TypeHash = TypeHash::from_name_const("action");
    /// Template marker for `action<T1..Tn>`
    pub const ACTION_TEMPLATE: TypeHash = TypeHash::from_name_const("action<>");
    /// Template marker for `func<T1..Tn, R>`
    pub const FUNC_TEMPLATE: TypeHash = TypeHash::from_name_const("func<>");
}
