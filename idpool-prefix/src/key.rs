//! Key trait for bounded integer key-spaces.
//!
//! The [`Key`] trait abstracts over the unsigned integer widths the prefix
//! machinery supports (`u16`, `u32`, `u64`). It provides the left-mask
//! table, hardware leading-zero counts, and the handful of shift/carry
//! primitives that prefix arithmetic needs. All operations are branch-light
//! and `#[inline]`.

use core::fmt;
use core::hash::Hash;
use core::ops::{BitAnd, BitOr, BitXor, Not};

/// Trait for unsigned integer keys used by prefix IDs, ranges and trees.
///
/// Implemented for `u16`, `u32` and `u64`. Keys wider than 64 bits are not
/// supported.
///
/// # Example
///
/// ```
/// use idpool_prefix::Key;
///
/// assert_eq!(u16::BITS_U8, 16);
/// assert_eq!(u16::left_mask(4), 0xF000);
/// assert_eq!(0x8000u16.leading_zero_bits(), 0);
/// ```
pub trait Key:
    Copy
    + Eq
    + Ord
    + Hash
    + fmt::Debug
    + fmt::Display
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Key width in bits.
    const BITS_U8: u8;

    /// The all-zero key.
    const ZERO: Self;

    /// The all-one key.
    const ONES: Self;

    /// Mask with the top `len` bits set.
    ///
    /// `left_mask(0)` is all-zero, `left_mask(BITS_U8)` is all-one.
    fn left_mask(len: u8) -> Self;

    /// Number of leading zero bits.
    fn leading_zero_bits(self) -> u8;

    /// Whether the most significant bit is set.
    fn high_bit_set(self) -> bool;

    /// Left shift that yields zero when `n >= BITS_U8`.
    fn wide_shl(self, n: u8) -> Self;

    /// Right shift that yields zero when `n >= BITS_U8`.
    fn wide_shr(self, n: u8) -> Self;

    /// `self + 1`, or `None` on overflow.
    fn checked_add_one(self) -> Option<Self>;

    /// `self - 1`, or `None` on underflow.
    fn checked_sub_one(self) -> Option<Self>;

    /// Copy of `self` with bit `bit` and all lower bits set.
    fn bits_set_from(self, bit: u8) -> Self;

    /// Copy of `self` with bit `bit` and all lower bits cleared.
    fn bits_cleared_from(self, bit: u8) -> Self;

    /// Widening conversion for display and bounds arithmetic.
    fn to_u64(self) -> u64;

    /// Narrowing conversion; returns `None` if `v` does not fit.
    fn from_u64(v: u64) -> Option<Self>;
}

macro_rules! impl_key_for_uint {
    ($($ty:ty),+) => {
        $(
            impl Key for $ty {
                const BITS_U8: u8 = <$ty>::BITS as u8;
                const ZERO: Self = 0;
                const ONES: Self = <$ty>::MAX;

                #[inline]
                fn left_mask(len: u8) -> Self {
                    debug_assert!(len <= Self::BITS_U8, "mask length out of range");
                    if len == 0 {
                        0
                    } else {
                        <$ty>::MAX << (Self::BITS_U8 - len)
                    }
                }

                #[inline]
                fn leading_zero_bits(self) -> u8 {
                    self.leading_zeros() as u8
                }

                #[inline]
                fn high_bit_set(self) -> bool {
                    self >= 1 << (Self::BITS_U8 - 1)
                }

                #[inline]
                fn wide_shl(self, n: u8) -> Self {
                    if n >= Self::BITS_U8 { 0 } else { self << n }
                }

                #[inline]
                fn wide_shr(self, n: u8) -> Self {
                    if n >= Self::BITS_U8 { 0 } else { self >> n }
                }

                #[inline]
                fn checked_add_one(self) -> Option<Self> {
                    self.checked_add(1)
                }

                #[inline]
                fn checked_sub_one(self) -> Option<Self> {
                    self.checked_sub(1)
                }

                #[inline]
                fn bits_set_from(self, bit: u8) -> Self {
                    self | !Self::left_mask(bit)
                }

                #[inline]
                fn bits_cleared_from(self, bit: u8) -> Self {
                    self & Self::left_mask(bit)
                }

                #[inline]
                fn to_u64(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn from_u64(v: u64) -> Option<Self> {
                    <$ty>::try_from(v).ok()
                }
            }
        )+
    };
}

impl_key_for_uint!(u16, u32, u64);
