//! Captured result of a single attempt.
//!
//! An [`Outcome`] is what the retry loop holds between invoking the operation and asking the
//! continuation policy what to do next. Failures are carried as data so that policies see a
//! returned value and a returned error through the same signature.

/// Either the value an attempt produced or the error it failed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome<T, E> {
    /// The attempt completed normally.
    Success(T),
    /// The attempt failed; the error is kept untouched.
    Failure(E),
}

impl<T, E> Outcome<T, E> {
    /// True if the attempt completed normally.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// True if the attempt failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Borrow both sides.
    pub fn as_ref(&self) -> Outcome<&T, &E> {
        match self {
            Self::Success(value) => Outcome::Success(value),
            Self::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Unwrapped view handed to continuation policies.
    pub fn as_result(&self) -> Result<&T, &E> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(error) => Err(error),
        }
    }

    /// Borrow the success value, if any.
    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Borrow the captured error, if any.
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    /// Terminate: return the value, or hand back the exact error that was captured.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(error) => Err(error),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Failure(error),
        }
    }
}

impl<T, E> From<Outcome<T, E>> for Result<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        outcome.into_result()
    }
}
