use std::fmt;

/// Failures reported by the combinators.
///
/// Errors from producers are never inspected; they come back unchanged in
/// [`Error::Rejected`] or collected, in input order, in
/// [`Error::Aggregate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error<E> {
    #[error("no promises were given")]
    EmptyInput,
    #[error("promise rejected: {0}")]
    Rejected(E),
    #[error("every promise was rejected: {0}")]
    Aggregate(Rejections<E>),
}

impl<E> Error<E> {
    /// The producer error, when a single promise rejected.
    pub fn rejected(&self) -> Option<&E> {
        match self {
            Error::Rejected(err) => Some(err),
            _ => None,
        }
    }

    /// Every producer error, when all promises rejected.
    pub fn rejections(&self) -> Option<&Rejections<E>> {
        match self {
            Error::Aggregate(errs) => Some(errs),
            _ => None,
        }
    }
}

/// The errors of a set of promises that all rejected, in the order the
/// promises were given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejections<E>(Vec<E>);

impl<E> Rejections<E> {
    pub(crate) fn new(errs: Vec<E>) -> Self {
        Self(errs)
    }

    pub fn as_slice(&self) -> &[E] {
        &self.0
    }
}

impl<E: fmt::Display> fmt::Display for Rejections<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}
