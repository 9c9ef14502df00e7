//! Core Specification trait and combinators.

use std::marker::PhantomData;
use std::sync::Arc;

/// Core specification trait for composable business rules.
///
/// Evaluation is synchronous and side-effect free, so a composed
/// specification can be evaluated from any thread without coordination.
pub trait Specification<Ctx>: Send + Sync {
    /// Check if the specification is satisfied by the given candidate.
    fn is_satisfied_by(&self, candidate: &Ctx) -> bool;

    /// Combine this specification with another using AND logic.
    fn and<S: Specification<Ctx>>(self, other: S) -> And<Self, S>
    where
        Self: Sized,
    {
        And(self, other)
    }
}

/// AND combinator for specifications.
#[derive(Clone)]
pub struct And<A, B>(pub A, pub B);

impl<Ctx, A, B> Specification<Ctx> for And<A, B>
where
    A: Specification<Ctx>,
    B: Specification<Ctx>,
{
    fn is_satisfied_by(&self, candidate: &Ctx) -> bool {
        self.0.is_satisfied_by(candidate) && self.1.is_satisfied_by(candidate)
    }
}

/// A boxed specification for dynamic dispatch.
pub type BoxedSpec<Ctx> = Arc<dyn Specification<Ctx>>;

impl<Ctx> Specification<Ctx> for BoxedSpec<Ctx> {
    fn is_satisfied_by(&self, candidate: &Ctx) -> bool {
        self.as_ref().is_satisfied_by(candidate)
    }
}

/// All specifications in the collection must be satisfied.
///
/// Each member is evaluated on its own; members never share state, so adding
/// a clause can only narrow the result.
pub struct AllOf<Ctx> {
    specs: Vec<BoxedSpec<Ctx>>,
    _phantom: PhantomData<fn(&Ctx)>,
}

impl<Ctx> AllOf<Ctx> {
    pub fn new(specs: Vec<BoxedSpec<Ctx>>) -> Self {
        AllOf {
            specs,
            _phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<Ctx> Specification<Ctx> for AllOf<Ctx> {
    fn is_satisfied_by(&self, candidate: &Ctx) -> bool {
        self.specs.iter().all(|spec| spec.is_satisfied_by(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Even;

    impl Specification<u32> for Even {
        fn is_satisfied_by(&self, candidate: &u32) -> bool {
            candidate % 2 == 0
        }
    }

    struct Below(u32);

    impl Specification<u32> for Below {
        fn is_satisfied_by(&self, candidate: &u32) -> bool {
            *candidate < self.0
        }
    }

    #[test]
    fn test_and_combinator() {
        let rule = Even.and(Below(10));
        assert!(rule.is_satisfied_by(&4));
        assert!(!rule.is_satisfied_by(&12));
        assert!(!rule.is_satisfied_by(&3));
    }

    #[test]
    fn test_all_of_requires_every_clause() {
        let all: AllOf<u32> = AllOf::new(vec![Arc::new(Even), Arc::new(Below(10))]);
        assert_eq!(all.len(), 2);
        assert!(all.is_satisfied_by(&8));
        assert!(!all.is_satisfied_by(&9));
        assert!(!all.is_satisfied_by(&14));
    }

    #[test]
    fn test_empty_all_of_admits_everything() {
        let all: AllOf<u32> = AllOf::new(Vec::new());
        assert!(all.is_empty());
        assert!(all.is_satisfied_by(&1));
    }

    #[test]
    fn test_boxed_specs_compose() {
        let even: BoxedSpec<u32> = Arc::new(Even);
        let small: BoxedSpec<u32> = Arc::new(Below(5));
        let rule = even.and(small);
        assert!(rule.is_satisfied_by(&2));
        assert!(!rule.is_satisfied_by(&3));
        assert!(!rule.is_satisfied_by(&6));
    }
}
