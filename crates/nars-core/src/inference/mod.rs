//! Rule layer. Reads the step registers in [`StepContext`] and reports
//! conclusions only through the memory's emission methods.

pub mod local;
pub mod structural;
pub mod syllogistic;

use crate::context::StepContext;
use crate::link::LinkKind;
use crate::memory::Memory;
use crate::term::Operator;

/// Reason on the current task-reference and term-reference pair.
///
/// The belief comes from the term-reference's target concept: the first one
/// whose evidence does not overlap the task's. Local matching runs first; a
/// judgment task that already produced something stops there.
pub fn reason(memory: &mut Memory, ctx: &mut StepContext) {
    let Some(task) = ctx.task.clone() else {
        return;
    };
    let (Some(task_link), Some(term_link)) = (&ctx.task_link, &ctx.term_link) else {
        return;
    };
    let task_kind = task_link.kind();
    let task_index = task_link.index().first().copied().unwrap_or(0);
    let belief_kind = term_link.kind();
    let belief_index = term_link.index().first().copied().unwrap_or(0);
    let belief_term = term_link.target().clone();

    let time = memory.time();
    let max_length = memory.params().maximum_stamp_length;
    let found = memory
        .concept(belief_term.name())
        .and_then(|c| c.get_belief(task.sentence(), time, max_length));
    let (belief, stamp) = found.unzip();
    ctx.belief = belief;
    ctx.new_stamp = stamp;

    let Some(belief) = ctx.belief.clone() else {
        return;
    };
    tracing::debug!(belief = %belief, "selected belief");

    local::match_belief(&task, &belief, memory, ctx);
    if !memory.no_result() && task.sentence().is_judgment() {
        return;
    }
    if task.sentence().is_goal() {
        return;
    }

    match (task_kind, belief_kind) {
        (LinkKind::SelfLink, LinkKind::ComponentStatement) => {
            syllogistic::detachment(task.sentence(), &belief, belief_index, memory, ctx);
        }
        (LinkKind::SelfLink, LinkKind::CompoundStatement) => {
            syllogistic::detachment(&belief, task.sentence(), belief_index, memory, ctx);
        }
        (LinkKind::CompoundStatement, LinkKind::CompoundStatement) => {
            syllogistic::syllogisms(task_index, belief_index, task.sentence(), &belief, memory, ctx);
        }
        _ => {}
    }
}

/// Restructure the current task through a transform-tagged task-reference.
pub fn transform_task(memory: &mut Memory, ctx: &mut StepContext) {
    let Some(task) = ctx.task.clone() else {
        return;
    };
    let content = task.content();
    if content.is_operator(Operator::Inheritance) {
        structural::transform_product_image(content, memory, ctx);
    }
}
