//! Error type for line and bus failures

use core::convert::Infallible;
use core::fmt;

/// Failure reported by a digital line or the segment bus.
///
/// Degenerate inputs (0 Hz, no key, clamped delays) are not errors; only a
/// collaborator refusing a read or write ends up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// A line or bus operation failed
    Line(E),
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Error::Line(error)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Line(e) => write!(f, "line error: {:?}", e),
        }
    }
}

impl<E: ufmt::uDebug> ufmt::uDebug for Error<E> {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        match self {
            Error::Line(e) => ufmt::uwrite!(f, "line error: {:?}", e),
        }
    }
}

/// Unwraps a result whose error can never be constructed.
#[inline]
pub fn discharge<T>(result: Result<T, Error<Infallible>>) -> T {
    match result {
        Ok(value) => value,
        Err(Error::Line(never)) => match never {},
    }
}
