use core::{borrow::Borrow, fmt::Display, ops::Deref};

/// String of exactly `N` characters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExactSizeString<const N: usize>(Box<str>);

impl<const N: usize> ExactSizeString<N> {
    /// Returns `None` unless the input has exactly `N` characters.
    pub fn new(val: impl Into<Box<str>>) -> Option<Self> {
        let val = val.into();

        if val.chars().count() == N {
            Some(Self(val))
        } else {
            None
        }
    }

    /// Skips the size check.
    ///
    /// The size is still asserted in debug builds.
    pub fn new_unchecked(val: impl Into<Box<str>>) -> Self {
        let val = val.into();

        debug_assert_eq!(val.chars().count(), N);
        Self(val)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> Display for ExactSizeString<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

impl<const N: usize> Deref for ExactSizeString<N> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> Borrow<str> for ExactSizeString<N> {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// String of at most `N` characters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaxSizeString<const N: usize>(Box<str>);

impl<const N: usize> MaxSizeString<N> {
    /// Returns `None` if the input has more than `N` characters.
    pub fn new(val: impl Into<Box<str>>) -> Option<Self> {
        let val = val.into();
        if val.chars().count() <= N {
            Some(Self(val))
        } else {
            None
        }
    }

    /// Number of characters, which never exceeds `N`.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> Display for MaxSizeString<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

impl<const N: usize> Deref for MaxSizeString<N> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub trait StringExt {
    fn to_exact_size<const N: usize>(self) -> Option<ExactSizeString<N>>;
    fn to_max_size<const N: usize>(self) -> Option<MaxSizeString<N>>;
}

impl StringExt for &str {
    fn to_exact_size<const N: usize>(self) -> Option<ExactSizeString<N>> {
        ExactSizeString::new(self)
    }

    fn to_max_size<const N: usize>(self) -> Option<MaxSizeString<N>> {
        MaxSizeString::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_counted_in_chars() {
        assert!("é1".to_exact_size::<2>().is_some());
        assert!("ab".to_exact_size::<3>().is_none());
        assert!("ééé".to_max_size::<3>().is_some());
        assert!("abcd".to_max_size::<3>().is_none());
        assert_eq!("".to_max_size::<3>().map(|s| s.char_len()), Some(0));
    }

    #[test]
    fn exact_size_borrows_as_str() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(ExactSizeString::<2>::new_unchecked("05"), 1);
        assert_eq!(map.get("05"), Some(&1));
    }
}
