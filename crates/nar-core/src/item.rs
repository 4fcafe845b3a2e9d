use crate::budget::{self, Budget};

/// Anything a [`Bag`](crate::bag::Bag) can hold: a unique string key and a
/// mutable budget.
pub trait Item {
    fn key(&self) -> &str;

    fn budget(&self) -> &Budget;

    fn budget_mut(&mut self) -> &mut Budget;

    fn priority(&self) -> f32 {
        self.budget().priority()
    }

    fn durability(&self) -> f32 {
        self.budget().durability()
    }

    fn quality(&self) -> f32 {
        self.budget().quality()
    }

    /// Fold a duplicate's budget into this item.
    fn merge(&mut self, other: &Budget) {
        budget::merge(self.budget_mut(), other);
    }
}
