// Copyright (c) 2023 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::{borrow::Cow, convert::TryFrom, fmt, marker::PhantomData};

/// Wrapper for a raw value of a constant, as it came off the wire.
///
/// `U` is the parsed representation; use [`RawConst::get`] to obtain it.
/// Keeping the raw value around means an unrecognized byte doesn't fail the
/// surrounding structure — it fails only the caller that insists on the
/// parsed form.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct RawConst<T, U>(pub T, PhantomData<U>);

impl<T, U> RawConst<T, U> {
    /// Wraps the given value.
    pub fn new(t: T) -> Self {
        Self(t, PhantomData)
    }
}

impl<T: Copy, U: TryFrom<T>> RawConst<T, U> {
    /// Returns the parsed value.
    pub fn get(&self) -> Result<U, U::Error> {
        U::try_from(self.0)
    }
}

impl<T, U> fmt::Debug for RawConst<T, U>
where
    T: Copy + fmt::Debug,
    U: TryFrom<T> + fmt::Debug,
    U::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Ok(u) => u.fmt(f),
            Err(t) => t.fmt(f),
        }
    }
}

/// Wrapper for raw text, that came from a server.
///
/// Bytes are not required to be valid UTF-8.
#[derive(Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct RawText(pub Vec<u8>);

impl RawText {
    /// Returns the value as a UTF-8 string (lossy converted).
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<Vec<u8>> for RawText {
    fn from(text: Vec<u8>) -> Self {
        Self(text)
    }
}

impl From<&[u8]> for RawText {
    fn from(text: &[u8]) -> Self {
        Self(text.to_vec())
    }
}

impl fmt::Debug for RawText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EventType;

    #[test]
    fn raw_const_keeps_unknown_values() {
        let known: RawConst<u8, EventType> = RawConst::new(0x0f);
        assert_eq!(known.get(), Ok(EventType::FORMAT_DESCRIPTION_EVENT));

        let unknown: RawConst<u8, EventType> = RawConst::new(0x77);
        assert_eq!(unknown.0, 0x77);
        assert!(unknown.get().is_err());
    }

    #[test]
    fn raw_text_lossy() {
        assert_eq!(RawText(b"BEGIN".to_vec()).as_str(), "BEGIN");
        assert_eq!(RawText(vec![0xff, 0xfe]).as_str(), "\u{fffd}\u{fffd}");
    }
}
