//! Rules on a task and a belief with the same content: revision for
//! judgments, answering for questions and goals.

use std::rc::Rc;

use crate::budget;
use crate::context::StepContext;
use crate::memory::Memory;
use crate::sentence::{Sentence, Task};
use crate::truth;

pub fn match_belief(task: &Rc<Task>, belief: &Sentence, memory: &mut Memory, ctx: &mut StepContext) {
    let sentence = task.sentence();
    if sentence.is_judgment() {
        if revisable(sentence, belief) {
            revision(sentence, belief, true, memory, ctx);
        }
    } else if sentence.content() == belief.content() {
        try_solution(belief, task, memory, ctx);
    }
}

pub fn revisable(s1: &Sentence, s2: &Sentence) -> bool {
    s1.content() == s2.content() && s1.is_revisable()
}

/// Pool the evidence of two judgments on the same content.
pub fn revision(
    new_belief: &Sentence,
    old_belief: &Sentence,
    feedback_to_links: bool,
    memory: &mut Memory,
    ctx: &mut StepContext,
) {
    let (Some(new_truth), Some(old_truth)) = (new_belief.truth(), old_belief.truth()) else {
        return;
    };
    let truth = truth::revision(new_truth, old_truth);
    let budget = budget::revise(new_truth, old_truth, &truth, feedback_to_links, ctx);
    memory.double_premise_task(new_belief.content().clone(), Some(truth), budget, ctx);
}

/// Offer `belief` as an answer to `task`. A better answer than the current
/// best replaces it, is reported for input tasks, and re-activates the
/// belief when the evaluation leaves budget for it.
pub fn try_solution(belief: &Sentence, task: &Rc<Task>, memory: &mut Memory, ctx: &mut StepContext) {
    let problem = task.sentence();
    let quality = solution_quality(Some(problem), belief);
    if let Some(old_best) = task.best_solution()
        && solution_quality(Some(problem), &old_best) >= quality
    {
        return;
    }
    task.set_best_solution(belief.clone());
    if task.is_input() {
        memory.report(belief, false);
    }
    let threshold = memory.params().budget_threshold;
    if let Some(budget) = budget::solution_eval(problem, belief, task)
        && budget.above_threshold(threshold)
    {
        memory.activated_task(budget, belief, task.parent_belief().cloned(), ctx);
    }
}

/// How well `solution` answers `problem`: confidence for a yes/no question,
/// expectation per unit of complexity otherwise. Without a problem, plain
/// expectation.
pub fn solution_quality(problem: Option<&Sentence>, solution: &Sentence) -> f32 {
    let Some(truth) = solution.truth() else {
        return 0.0;
    };
    match problem {
        None => truth.expectation(),
        Some(p) if p.content().is_constant() => truth.confidence(),
        Some(_) => truth.expectation() / solution.content().complexity().max(1) as f32,
    }
}
