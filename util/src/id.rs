//! Typed ids for use with [`crate::IdVec`].

/// Define a copyable newtype id over an unsigned int,
/// convertible to and from `usize` so it can index an `IdVec`.
///
/// `From<usize>` is for indices already known to fit; use `try_new`
/// for anything counted from outside input.
#[macro_export]
macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $ty:ty) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name($ty);

        impl $name {
            /// Largest index this id can hold.
            pub const MAX: usize = <$ty>::MAX as usize;

            pub fn try_new(val: usize) -> Result<Self, $crate::IdOverflow> {
                <$ty>::try_from(val)
                    .map(Self)
                    .map_err(|_| $crate::IdOverflow { val, max: Self::MAX })
            }
        }

        impl From<$name> for usize {
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl From<usize> for $name {
            fn from(val: usize) -> $name {
                debug_assert!(val <= Self::MAX, "id {val} overflows {}", stringify!($name));
                Self(val as $ty)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
