//! The attention currency: a (priority, durability, quality) triple and the
//! functions that decay, merge, dilute and reward it.
//!
//! Priority decides how soon an item is serviced, durability how slowly its
//! priority decays, and quality the floor that decay approaches.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::CONCEPT_INITIAL_LEVEL;
use crate::context::StepContext;
use crate::memory::Memory;
use crate::sentence::{Sentence, Task};
use crate::term::Term;
use crate::truth::{TruthValue, w2c};

// ---------------------------------------------------------------------------
// Fuzzy combinators
// ---------------------------------------------------------------------------

/// Fuzzy conjunction: the product of all arguments.
pub fn and(xs: &[f32]) -> f32 {
    xs.iter().product()
}

/// Fuzzy disjunction: `1 − Π(1 − x)`.
pub fn or(xs: &[f32]) -> f32 {
    1.0 - xs.iter().map(|x| 1.0 - x).product::<f32>()
}

pub fn ave_ari(xs: &[f32]) -> f32 {
    xs.iter().sum::<f32>() / xs.len() as f32
}

pub fn ave_geo(xs: &[f32]) -> f32 {
    xs.iter().product::<f32>().powf(1.0 / xs.len() as f32)
}

// ---------------------------------------------------------------------------
// Budget value
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    priority: f32,
    durability: f32,
    quality: f32,
}

impl Default for Budget {
    fn default() -> Self {
        Self::new(
            CONCEPT_INITIAL_LEVEL,
            CONCEPT_INITIAL_LEVEL,
            CONCEPT_INITIAL_LEVEL,
        )
    }
}

impl Budget {
    /// All three components are clamped to [0, 1].
    pub fn new(priority: f32, durability: f32, quality: f32) -> Self {
        Self {
            priority: unit(priority),
            durability: unit(durability),
            quality: unit(quality),
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
        self.priority = unit(v);
    }

    pub fn set_durability(&mut self, v: f32) {
        self.durability = unit(v);
    }

    pub fn set_quality(&mut self, v: f32) {
        self.quality = unit(v);
    }

    /// Raise priority by fuzzy `or` with `v`.
    pub fn inc_priority(&mut self, v: f32) {
        self.set_priority(or(&[self.priority, v]));
    }

    /// Lower priority by fuzzy `and` with `v`.
    pub fn dec_priority(&mut self, v: f32) {
        self.set_priority(and(&[self.priority, v]));
    }

    pub fn inc_durability(&mut self, v: f32) {
        self.set_durability(or(&[self.durability, v]));
    }

    pub fn dec_durability(&mut self, v: f32) {
        self.set_durability(and(&[self.durability, v]));
    }

    /// Geometric mean of the three components.
    pub fn summary(&self) -> f32 {
        ave_geo(&[self.priority, self.durability, self.quality])
    }

    pub fn above_threshold(&self, threshold: f32) -> bool {
        self.summary() >= threshold
    }

    /// Componentwise max, in place.
    pub fn merge(&mut self, other: &Budget) {
        self.priority = self.priority.max(other.priority);
        self.durability = self.durability.max(other.durability);
        self.quality = self.quality.max(other.quality);
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${:.4};{:.4};{:.4}$",
            self.priority, self.durability, self.quality
        )
    }
}

fn unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

// ---------------------------------------------------------------------------
// Bag-level operations
// ---------------------------------------------------------------------------

/// Decay priority toward `quality · relative_threshold`.
///
/// A larger `forget_rate` or a higher durability slows the decay. When
/// priority is already at or under the floor it is set to the floor as is.
pub fn forget(budget: &mut Budget, forget_rate: f32, relative_threshold: f32) {
    let mut quality = budget.quality as f64 * relative_threshold as f64;
    let p = budget.priority as f64 - quality;
    if p > 0.0 {
        quality += p * (budget.durability as f64).powf(1.0 / (forget_rate as f64 * p));
    }
    budget.set_priority(quality as f32);
}

/// Dilute a budget across `n` structural links: priority / √n.
pub fn distribute_among_links(budget: &Budget, n: usize) -> Budget {
    let priority = budget.priority / (n.max(1) as f32).sqrt();
    Budget::new(priority, budget.durability, budget.quality)
}

/// Boost a concept's budget with an incoming task's budget.
pub fn activate(concept: &mut Budget, incoming: &Budget) {
    concept.set_priority(or(&[concept.priority, incoming.priority]));
    concept.set_durability(ave_ari(&[concept.durability, incoming.durability]));
}

/// How decisive a truth value is: high expectation, or confidently negative.
pub fn truth_to_quality(truth: &TruthValue) -> f32 {
    let exp = truth.expectation();
    exp.max((1.0 - exp) * 0.75)
}

/// Belief-table rank: confident or original (short evidential base) wins.
pub fn rank_belief(judgment: &Sentence) -> f32 {
    let confidence = judgment.truth().map(|t| t.confidence()).unwrap_or(0.0);
    let originality = 1.0 / (judgment.stamp().len() as f32 + 1.0);
    or(&[confidence, originality])
}

// ---------------------------------------------------------------------------
// Rule-layer budgets
// ---------------------------------------------------------------------------

/// Budget of a revision result. Penalizes the current task (and, with
/// feedback, the current links) by how far the revised truth moved.
pub fn revise(
    task_truth: &TruthValue,
    belief_truth: &TruthValue,
    truth: &TruthValue,
    feedback_to_links: bool,
    ctx: &mut StepContext,
) -> Budget {
    let dif_t = truth.expectation_distance(task_truth);
    let Some(task) = ctx.task.clone() else {
        return Budget::default();
    };
    task.update_budget(|b| {
        b.dec_priority(1.0 - dif_t);
        b.dec_durability(1.0 - dif_t);
    });

    if feedback_to_links {
        if let Some(link) = ctx.task_link.as_mut() {
            link.budget.dec_priority(1.0 - dif_t);
            link.budget.dec_durability(1.0 - dif_t);
        }
        if let Some(link) = ctx.term_link.as_mut() {
            let dif_b = truth.expectation_distance(belief_truth);
            link.budget.dec_priority(1.0 - dif_b);
            link.budget.dec_durability(1.0 - dif_b);
        }
    }

    let dif = truth.confidence() - task_truth.confidence().max(belief_truth.confidence());
    let current = task.budget();
    Budget::new(
        or(&[dif.max(0.0), current.priority]),
        ave_ari(&[dif.max(0.0), current.durability]),
        truth_to_quality(truth),
    )
}

/// Evaluate `solution` against a pending question or goal.
///
/// A judgment task is rewarded directly; a question or goal task is damped
/// by how well it is now answered and yields the budget for re-activating
/// the solution.
pub fn solution_eval(problem: &Sentence, solution: &Sentence, task: &Task) -> Option<Budget> {
    let quality = crate::inference::local::solution_quality(Some(problem), solution);
    if task.sentence().is_judgment() {
        task.update_budget(|b| b.inc_priority(quality));
        return None;
    }
    let current = task.budget();
    let truth_quality = solution.truth().map(truth_to_quality).unwrap_or(0.0);
    let budget = Budget::new(
        or(&[current.priority, quality]),
        current.durability,
        truth_quality,
    );
    task.update_budget(|b| b.set_priority((1.0 - quality).min(current.priority)));
    Some(budget)
}

pub fn forward(truth: &TruthValue, memory: &Memory, ctx: &mut StepContext) -> Budget {
    budget_inference(truth_to_quality(truth), 1, memory, ctx)
}

pub fn backward(truth: &TruthValue, memory: &Memory, ctx: &mut StepContext) -> Budget {
    budget_inference(truth_to_quality(truth), 1, memory, ctx)
}

pub fn backward_weak(truth: &TruthValue, memory: &Memory, ctx: &mut StepContext) -> Budget {
    budget_inference(w2c(1.0) * truth_to_quality(truth), 1, memory, ctx)
}

pub fn compound_forward(
    truth: &TruthValue,
    content: &Term,
    memory: &Memory,
    ctx: &mut StepContext,
) -> Budget {
    budget_inference(truth_to_quality(truth), content.complexity(), memory, ctx)
}

pub fn compound_backward(content: &Term, memory: &Memory, ctx: &mut StepContext) -> Budget {
    budget_inference(1.0, content.complexity(), memory, ctx)
}

pub fn compound_backward_weak(content: &Term, memory: &Memory, ctx: &mut StepContext) -> Budget {
    budget_inference(w2c(1.0), content.complexity(), memory, ctx)
}

/// Common core of the derived-task budgets. The current term-reference, if
/// any, is rewarded in proportion to the derived quality.
fn budget_inference(quality: f32, complexity: usize, memory: &Memory, ctx: &mut StepContext) -> Budget {
    let source = match (&ctx.task_link, &ctx.task) {
        (Some(link), _) => link.budget,
        (None, Some(task)) => task.budget(),
        (None, None) => Budget::default(),
    };
    let complexity = complexity.max(1) as f32;
    let mut priority = source.priority;
    let mut durability = source.durability / complexity;
    let quality = quality / complexity;

    if let Some(link) = ctx.term_link.as_mut() {
        priority = or(&[priority, link.budget.priority]);
        durability = and(&[durability, link.budget.durability]);
        let target_activation = memory.concept_activation(&link.target);
        link.budget.inc_priority(or(&[quality, target_activation]));
        link.budget.inc_durability(quality);
    }

    Budget::new(priority, durability, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_fuzzy_combinators() {
        assert_relative_eq!(and(&[0.5, 0.5]), 0.25);
        assert_relative_eq!(or(&[0.5, 0.5]), 0.75);
        assert_relative_eq!(ave_ari(&[0.2, 0.4]), 0.3, epsilon = 1e-6);
        assert_relative_eq!(ave_geo(&[0.25, 1.0]), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_forget_documented_case() {
        let mut b = Budget::new(0.8, 0.8, 0.3);
        forget(&mut b, 20.0, 0.1);

        let floor = 0.3f64 * 0.1;
        let p = 0.8f64 - floor;
        let expected = floor + p * 0.8f64.powf(1.0 / (20.0 * p));
        assert_relative_eq!(b.priority() as f64, expected, epsilon = 1e-5);
        assert!(b.priority() < 0.8);
        assert_relative_eq!(b.durability(), 0.8);
        assert_relative_eq!(b.quality(), 0.3);
    }

    #[test]
    fn test_forget_below_floor_sets_floor() {
        let mut b = Budget::new(0.01, 0.9, 0.5);
        forget(&mut b, 10.0, 0.1);
        assert_relative_eq!(b.priority(), 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_forget_durability_slows_decay() {
        let mut fragile = Budget::new(0.9, 0.2, 0.1);
        let mut durable = Budget::new(0.9, 0.9, 0.1);
        forget(&mut fragile, 10.0, 0.1);
        forget(&mut durable, 10.0, 0.1);
        assert!(durable.priority() > fragile.priority());
    }

    #[test]
    fn test_forget_rate_slows_decay() {
        let mut fast = Budget::new(0.9, 0.5, 0.1);
        let mut slow = Budget::new(0.9, 0.5, 0.1);
        forget(&mut fast, 5.0, 0.1);
        forget(&mut slow, 50.0, 0.1);
        assert!(slow.priority() > fast.priority());
    }

    #[test]
    fn test_distribute_among_links() {
        let b = distribute_among_links(&Budget::new(0.8, 0.5, 0.9), 4);
        assert_relative_eq!(b.priority(), 0.4, epsilon = 1e-6);
        assert_relative_eq!(b.durability(), 0.5);
        assert_relative_eq!(b.quality(), 0.9);
    }

    #[test]
    fn test_activate() {
        let mut concept = Budget::new(0.5, 0.2, 0.3);
        activate(&mut concept, &Budget::new(0.5, 0.8, 0.9));
        assert_relative_eq!(concept.priority(), 0.75, epsilon = 1e-6);
        assert_relative_eq!(concept.durability(), 0.5, epsilon = 1e-6);
        assert_relative_eq!(concept.quality(), 0.3);
    }

    #[test]
    fn test_truth_to_quality() {
        assert_relative_eq!(
            truth_to_quality(&TruthValue::new(1.0, 0.9)),
            0.95,
            epsilon = 1e-6
        );
        // Confident negatives still carry quality.
        let q = truth_to_quality(&TruthValue::new(0.0, 0.9));
        assert_relative_eq!(q, 0.95 * 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_components_clamped() {
        let mut b = Budget::new(1.7, -0.3, 0.5);
        assert_eq!(b.priority(), 1.0);
        assert_eq!(b.durability(), 0.0);
        b.inc_priority(0.9);
        assert!(b.priority() <= 1.0);
    }

    #[test]
    fn test_summary_threshold() {
        assert!(Budget::new(0.8, 0.5, 0.95).above_threshold(0.01));
        assert!(!Budget::new(0.0, 0.5, 0.95).above_threshold(0.01));
    }

    fn inference_context() -> (Memory, StepContext, Term) {
        use crate::config::Parameters;
        use crate::sentence::Punctuation;
        use crate::stamp::Stamp;

        let content = Term::inheritance(Term::atom("a"), Term::atom("b")).unwrap();
        let sentence = Sentence::new(
            content.clone(),
            Punctuation::Judgment,
            Some(TruthValue::new(1.0, 0.9)),
            Stamp::input(1, 0),
        );
        let task = std::rc::Rc::new(Task::input(sentence, Budget::new(0.8, 0.6, 0.9)));
        (Memory::new(Parameters::default()), StepContext::for_task(task), content)
    }

    #[test]
    fn test_inference_budgets_without_links() {
        let (memory, mut ctx, content) = inference_context();
        let truth = TruthValue::new(1.0, 0.9);

        let b = forward(&truth, &memory, &mut ctx);
        assert_relative_eq!(b.priority(), 0.8);
        assert_relative_eq!(b.durability(), 0.6);
        assert_relative_eq!(b.quality(), 0.95, epsilon = 1e-6);
        assert_relative_eq!(backward(&truth, &memory, &mut ctx).quality(), 0.95, epsilon = 1e-6);
        assert_relative_eq!(backward_weak(&truth, &memory, &mut ctx).quality(), 0.475, epsilon = 1e-6);

        // <a --> b> has complexity 3.
        let b = compound_forward(&truth, &content, &memory, &mut ctx);
        assert_relative_eq!(b.durability(), 0.2, epsilon = 1e-6);
        assert_relative_eq!(b.quality(), 0.95 / 3.0, epsilon = 1e-6);
        let b = compound_backward(&content, &memory, &mut ctx);
        assert_relative_eq!(b.quality(), 1.0 / 3.0, epsilon = 1e-6);
        let b = compound_backward_weak(&content, &memory, &mut ctx);
        assert_relative_eq!(b.quality(), 0.5 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_inference_budget_rewards_term_link() {
        use crate::link::{TermLink, prepare_templates};

        let (memory, mut ctx, content) = inference_context();
        let templates = prepare_templates(&content);
        let link = TermLink::new(Term::atom("a"), &templates[0], Budget::new(0.2, 0.2, 0.2));
        ctx.term_link = Some(link);

        let b = forward(&TruthValue::new(1.0, 0.9), &memory, &mut ctx);
        assert_relative_eq!(b.priority(), or(&[0.8, 0.2]), epsilon = 1e-6);
        assert_relative_eq!(b.durability(), 0.6 * 0.2, epsilon = 1e-6);
        let rewarded = ctx.term_link.as_ref().unwrap().budget;
        assert!(rewarded.priority() > 0.2);
        assert!(rewarded.durability() > 0.2);
    }

    fn unit_budget() -> impl Strategy<Value = Budget> {
        (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0).prop_map(|(p, d, q)| Budget::new(p, d, q))
    }

    proptest! {
        #[test]
        fn prop_merge_commutative(a in unit_budget(), b in unit_budget()) {
            let mut ab = a;
            ab.merge(&b);
            let mut ba = b;
            ba.merge(&a);
            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn prop_merge_idempotent(a in unit_budget()) {
            let mut aa = a;
            aa.merge(&a);
            prop_assert_eq!(aa, a);
        }

        #[test]
        fn prop_forget_stays_in_unit_range(
            b in unit_budget(),
            rate in 1.0f32..100.0,
        ) {
            let mut b = b;
            forget(&mut b, rate, 0.1);
            prop_assert!((0.0..=1.0).contains(&b.priority()));
            prop_assert!(b.priority() >= b.quality() * 0.1 - 1e-6);
        }
    }
}
