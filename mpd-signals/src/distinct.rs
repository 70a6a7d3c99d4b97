//! Distinct-until-changed stage shared by the de-duplicated signals.

use crate::model::Track;

/// Passes a value only when it differs from the previously passed one under
/// the equality `F`.
pub struct DistinctUntilChanged<T, F> {
    last: Option<T>,
    same: F,
}

impl<T, F> DistinctUntilChanged<T, F>
where
    T: Clone,
    F: FnMut(&T, &T) -> bool,
{
    /// Stage comparing values with `same`.
    pub fn new(same: F) -> Self {
        Self { last: None, same }
    }

    /// Returns true if `value` differs from the last passed value, and
    /// remembers it in that case. The first value always passes.
    pub fn check(&mut self, value: &T) -> bool {
        let changed = match &self.last {
            Some(last) => !(self.same)(last, value),
            None => true,
        };
        if changed {
            self.last = Some(value.clone());
        }
        changed
    }

    /// Forget the last passed value.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Stage comparing values with `PartialEq`.
pub fn by_eq<T: Clone + PartialEq>() -> DistinctUntilChanged<T, fn(&T, &T) -> bool> {
    DistinctUntilChanged::new(|a: &T, b: &T| a == b)
}

/// Stage comparing a projected key.
pub fn by_key<T, K, P>(mut key: P) -> DistinctUntilChanged<T, impl FnMut(&T, &T) -> bool>
where
    T: Clone,
    K: PartialEq,
    P: FnMut(&T) -> K,
{
    DistinctUntilChanged::new(move |a: &T, b: &T| key(a) == key(b))
}

/// Identity equality of two optional tracks.
///
/// Two present tracks are the same when they play the same file, whatever
/// their queue ids. Otherwise the values are compared structurally, so "no
/// track" equals "no track" and differs from any track.
pub fn same_file(a: &Option<Track>, b: &Option<Track>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.file == b.file,
        _ => a == b,
    }
}
