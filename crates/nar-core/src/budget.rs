//! Budget values and the arithmetic that governs them.
//!
//! A budget is the (priority, durability, quality) triple that decides how
//! often an item is selected from its bag, how fast it loses priority while
//! unprocessed, and the floor it is merged against. Every function here
//! keeps all three components inside `[0, 1]`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[inline]
fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Probabilistic "or": `1 - (1-a)(1-b)`.
pub fn or(a: f32, b: f32) -> f32 {
    1.0 - (1.0 - a) * (1.0 - b)
}

/// Probabilistic "and": `a * b`.
pub fn and(a: f32, b: f32) -> f32 {
    a * b
}

/// Arithmetic mean.
pub fn ave_ari(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Geometric mean.
pub fn ave_geo(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let product: f32 = values.iter().product();
    product.powf(1.0 / values.len() as f32)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    priority: f32,
    durability: f32,
    quality: f32,
}

impl Budget {
    pub fn new(priority: f32, durability: f32, quality: f32) -> Self {
        Self {
            priority: clamp_unit(priority),
            durability: clamp_unit(durability),
            quality: clamp_unit(quality),
        }
    }

    pub fn priority(&self) -> f32 {
        self.priority
    }

    pub fn durability(&self) -> f32 {
        self.durability
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    pub fn set_priority(&mut self, v: f32) {
        self.priority = clamp_unit(v);
    }

    pub fn set_durability(&mut self, v: f32) {
        self.durability = clamp_unit(v);
    }

    pub fn set_quality(&mut self, v: f32) {
        self.quality = clamp_unit(v);
    }

    /// Geometric mean of the three components.
    pub fn summary(&self) -> f32 {
        ave_geo(&[self.priority, self.durability, self.quality])
    }

    pub fn above_threshold(&self, threshold: f32) -> bool {
        self.summary() >= threshold
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${:.2};{:.2};{:.2}$",
            self.priority, self.durability, self.quality
        )
    }
}

/// Decay applied when an item goes back into a bag after being processed.
///
/// Priority shrinks by `durability^(1/forget_rate)`; higher durability or a
/// larger forget rate decays slower. The result is floored at
/// `relative_threshold` so decay alone never drives an item to zero.
///
/// The floor is `min(priority, relative_threshold)`, so it never raises a
/// priority. An item whose priority is already below `relative_threshold`
/// keeps that priority unchanged, whatever its durability; it is neither
/// decayed further nor lifted to the threshold.
pub fn forget(budget: &mut Budget, forget_rate: f32, relative_threshold: f32) {
    let p = budget.priority();
    let rate = if forget_rate > 0.0 { forget_rate } else { 1.0 };
    let decayed = p * budget.durability().powf(1.0 / rate);
    let floor = p.min(relative_threshold);
    budget.set_priority(decayed.max(floor));
}

/// Combine the budget of a duplicate into the surviving one.
///
/// Re-observing something already held never lowers its standing, so every
/// component takes the larger of the two.
pub fn merge(existing: &mut Budget, incoming: &Budget) {
    existing.set_priority(existing.priority().max(incoming.priority()));
    existing.set_durability(existing.durability().max(incoming.durability()));
    existing.set_quality(existing.quality().max(incoming.quality()));
}

/// Split a budget across `n_targets` outgoing links.
///
/// Priority is divided evenly so the summed priority handed out stays at the
/// source priority whatever the fan-out.
pub fn distribute(budget: &Budget, n_targets: usize) -> Budget {
    let n = n_targets.max(1) as f32;
    Budget::new(budget.priority() / n, budget.durability(), budget.quality())
}

/// Raise a concept's budget in response to a task reaching it.
pub fn activate(concept: &mut Budget, incoming: &Budget) {
    let priority = or(concept.priority(), incoming.priority());
    let durability = ave_ari(&[concept.durability(), incoming.durability()]);
    concept.set_priority(priority);
    concept.set_durability(durability);
}
