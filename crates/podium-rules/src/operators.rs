//! Operator overloading for specification combinators.
//!
//! `Spec` wraps a specification so clauses can be joined with `&`:
//!
//! ```ignore
//! let fallback = Spec(IsActive) & Spec(IsDefault);
//! ```

use crate::specification::{And, Specification};
use std::ops::BitAnd;

/// Wrapper struct to enable operator overloading on specifications.
#[derive(Clone)]
pub struct Spec<S>(pub S);

impl<A, B> BitAnd<Spec<B>> for Spec<A> {
    type Output = Spec<And<A, B>>;

    fn bitand(self, rhs: Spec<B>) -> Self::Output {
        Spec(And(self.0, rhs.0))
    }
}

impl<Ctx, S> Specification<Ctx> for Spec<S>
where
    S: Specification<Ctx>,
{
    fn is_satisfied_by(&self, candidate: &Ctx) -> bool {
        self.0.is_satisfied_by(candidate)
    }
}
