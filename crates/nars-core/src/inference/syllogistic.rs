//! Two-premise rules on statements sharing a term.
//!
//! The figure is `(task index + 1)·10 + (belief index + 1)`: which side of
//! each premise the shared term sits on.

use crate::budget;
use crate::context::StepContext;
use crate::memory::Memory;
use crate::sentence::Sentence;
use crate::term::{Operator, Term, invalid_statement};
use crate::truth::{self, TruthValue};

fn figure(first: usize, second: usize) -> usize {
    (first + 1) * 10 + (second + 1)
}

/// Same copula as `like`.
fn make_statement(like: &Term, subject: &Term, predicate: &Term) -> Option<Term> {
    Term::statement(like.operator()?, subject.clone(), predicate.clone())
}

/// The symmetric copula of `like`'s order.
fn make_symmetric(like: &Term, subject: &Term, predicate: &Term) -> Option<Term> {
    Term::statement(like.operator()?.symmetric()?, subject.clone(), predicate.clone())
}

fn emit(
    content: Option<Term>,
    truth: Option<TruthValue>,
    budget: budget::Budget,
    memory: &mut Memory,
    ctx: &StepContext,
) {
    if let Some(content) = content {
        memory.double_premise_task(content, truth, budget, ctx);
    }
}

fn sides(term: &Term) -> Option<(&Term, &Term)> {
    Some((term.subject()?, term.predicate()?))
}

/// Dispatch on the copulas of two statements of the same order.
pub fn syllogisms(
    task_index: usize,
    belief_index: usize,
    task: &Sentence,
    belief: &Sentence,
    memory: &mut Memory,
    ctx: &mut StepContext,
) {
    use Operator::*;
    match (task.content().operator(), belief.content().operator()) {
        (Some(Inheritance), Some(Inheritance)) | (Some(Implication), Some(Implication)) => {
            asymmetric_asymmetric(task, belief, figure(task_index, belief_index), memory, ctx);
        }
        (Some(Inheritance), Some(Similarity)) | (Some(Implication), Some(Equivalence)) => {
            asymmetric_symmetric(task, belief, figure(task_index, belief_index), memory, ctx);
        }
        (Some(Similarity), Some(Inheritance)) | (Some(Equivalence), Some(Implication)) => {
            asymmetric_symmetric(belief, task, figure(belief_index, task_index), memory, ctx);
        }
        (Some(Similarity), Some(Similarity)) | (Some(Equivalence), Some(Equivalence)) => {
            symmetric_symmetric(belief, task, figure(belief_index, task_index), memory, ctx);
        }
        _ => {}
    }
}

fn asymmetric_asymmetric(
    sentence: &Sentence,
    belief: &Sentence,
    figure: usize,
    memory: &mut Memory,
    ctx: &mut StepContext,
) {
    let (s1, s2) = (sentence.content(), belief.content());
    if s1 == s2 {
        return;
    }
    let (Some((s1_subject, s1_predicate)), Some((s2_subject, s2_predicate))) = (sides(s1), sides(s2))
    else {
        return;
    };
    match figure {
        11 if s1_subject == s2_subject => {
            abd_ind_com(s2_predicate, s1_predicate, sentence, belief, memory, ctx);
        }
        12 if s1_subject == s2_predicate => {
            ded_exe(s2_subject, s1_predicate, sentence, belief, memory, ctx);
        }
        21 if s1_predicate == s2_subject => {
            ded_exe(s1_subject, s2_predicate, sentence, belief, memory, ctx);
        }
        22 if s1_predicate == s2_predicate => {
            abd_ind_com(s1_subject, s2_subject, sentence, belief, memory, ctx);
        }
        _ => {}
    }
}

fn asymmetric_symmetric(
    asym: &Sentence,
    sym: &Sentence,
    figure: usize,
    memory: &mut Memory,
    ctx: &mut StepContext,
) {
    let (Some((a_subject, a_predicate)), Some((s_subject, s_predicate))) =
        (sides(asym.content()), sides(sym.content()))
    else {
        return;
    };
    match figure {
        11 if a_subject == s_subject => analogy(s_predicate, a_predicate, asym, sym, memory, ctx),
        12 if a_subject == s_predicate => analogy(s_subject, a_predicate, asym, sym, memory, ctx),
        21 if a_predicate == s_subject => analogy(a_subject, s_predicate, asym, sym, memory, ctx),
        22 if a_predicate == s_predicate => analogy(a_subject, s_subject, asym, sym, memory, ctx),
        _ => {}
    }
}

fn symmetric_symmetric(
    belief: &Sentence,
    sentence: &Sentence,
    figure: usize,
    memory: &mut Memory,
    ctx: &mut StepContext,
) {
    let (Some((s1_subject, s1_predicate)), Some((s2_subject, s2_predicate))) =
        (sides(belief.content()), sides(sentence.content()))
    else {
        return;
    };
    match figure {
        11 if s1_subject == s2_subject => {
            resemblance(s1_predicate, s2_predicate, belief, sentence, memory, ctx);
        }
        12 if s1_subject == s2_predicate => {
            resemblance(s1_predicate, s2_subject, belief, sentence, memory, ctx);
        }
        21 if s1_predicate == s2_subject => {
            resemblance(s1_subject, s2_predicate, belief, sentence, memory, ctx);
        }
        22 if s1_predicate == s2_predicate => {
            resemblance(s1_subject, s2_subject, belief, sentence, memory, ctx);
        }
        _ => {}
    }
}

/// `{<M --> P>, <S --> M>} ⊢ {<S --> P>, <P --> S>}`: deduction and
/// exemplification.
fn ded_exe(
    term1: &Term,
    term2: &Term,
    sentence: &Sentence,
    belief: &Sentence,
    memory: &mut Memory,
    ctx: &mut StepContext,
) {
    if invalid_statement(term1, term2) {
        return;
    }
    let content = sentence.content();
    let content1 = make_statement(content, term1, term2);
    let content2 = make_statement(content, term2, term1);

    if sentence.is_question() {
        let Some(v2) = belief.truth() else {
            return;
        };
        let budget1 = budget::backward_weak(v2, memory, ctx);
        let budget2 = budget::backward_weak(v2, memory, ctx);
        emit(content1, None, budget1, memory, ctx);
        emit(content2, None, budget2, memory, ctx);
    } else {
        let (Some(v1), Some(v2)) = (sentence.truth(), belief.truth()) else {
            return;
        };
        let truth1 = truth::deduction(v1, v2);
        let truth2 = truth::exemplification(v1, v2);
        let budget1 = budget::forward(&truth1, memory, ctx);
        let budget2 = budget::forward(&truth2, memory, ctx);
        emit(content1, Some(truth1), budget1, memory, ctx);
        emit(content2, Some(truth2), budget2, memory, ctx);
    }
}

/// `{<M --> P>, <M --> S>} ⊢ {<S --> P>, <P --> S>, <S <-> P>}`: abduction,
/// induction and comparison.
fn abd_ind_com(
    term1: &Term,
    term2: &Term,
    sentence: &Sentence,
    belief: &Sentence,
    memory: &mut Memory,
    ctx: &mut StepContext,
) {
    if invalid_statement(term1, term2) {
        return;
    }
    let content = sentence.content();
    let statement1 = make_statement(content, term1, term2);
    let statement2 = make_statement(content, term2, term1);
    let statement3 = make_symmetric(content, term1, term2);

    if sentence.is_question() {
        let Some(v2) = belief.truth() else {
            return;
        };
        let budget1 = budget::backward(v2, memory, ctx);
        let budget2 = budget::backward_weak(v2, memory, ctx);
        let budget3 = budget::backward(v2, memory, ctx);
        emit(statement1, None, budget1, memory, ctx);
        emit(statement2, None, budget2, memory, ctx);
        emit(statement3, None, budget3, memory, ctx);
    } else {
        let (Some(v1), Some(v2)) = (sentence.truth(), belief.truth()) else {
            return;
        };
        let truth1 = truth::abduction(v1, v2);
        let truth2 = truth::induction(v1, v2);
        let truth3 = truth::comparison(v1, v2);
        let budget1 = budget::forward(&truth1, memory, ctx);
        let budget2 = budget::forward(&truth2, memory, ctx);
        let budget3 = budget::forward(&truth3, memory, ctx);
        emit(statement1, Some(truth1), budget1, memory, ctx);
        emit(statement2, Some(truth2), budget2, memory, ctx);
        emit(statement3, Some(truth3), budget3, memory, ctx);
    }
}

/// `{<S --> M>, <M <-> P>} ⊢ <S --> P>`
fn analogy(
    subject: &Term,
    predicate: &Term,
    asym: &Sentence,
    sym: &Sentence,
    memory: &mut Memory,
    ctx: &mut StepContext,
) {
    if invalid_statement(subject, predicate) {
        return;
    }
    let Some(task) = ctx.task.clone() else {
        return;
    };
    let content = make_statement(asym.content(), subject, predicate);

    if task.sentence().is_question() {
        let commutative = task.content().operator().is_some_and(|op| op.is_commutative());
        let premise = if commutative { asym.truth() } else { sym.truth() };
        let Some(premise) = premise else {
            return;
        };
        let budget = if commutative {
            budget::backward_weak(premise, memory, ctx)
        } else {
            budget::backward(premise, memory, ctx)
        };
        emit(content, None, budget, memory, ctx);
    } else {
        let (Some(v1), Some(v2)) = (asym.truth(), sym.truth()) else {
            return;
        };
        let truth = truth::analogy(v1, v2);
        let budget = budget::forward(&truth, memory, ctx);
        emit(content, Some(truth), budget, memory, ctx);
    }
}

/// `{<S <-> M>, <M <-> P>} ⊢ <S <-> P>`
fn resemblance(
    term1: &Term,
    term2: &Term,
    belief: &Sentence,
    sentence: &Sentence,
    memory: &mut Memory,
    ctx: &mut StepContext,
) {
    if invalid_statement(term1, term2) {
        return;
    }
    let content = make_statement(belief.content(), term1, term2);
    let Some(belief_truth) = belief.truth() else {
        return;
    };
    if sentence.is_question() {
        let budget = budget::backward(belief_truth, memory, ctx);
        emit(content, None, budget, memory, ctx);
    } else {
        let Some(task_truth) = sentence.truth() else {
            return;
        };
        let truth = truth::resemblance(belief_truth, task_truth);
        let budget = budget::forward(&truth, memory, ctx);
        emit(content, Some(truth), budget, memory, ctx);
    }
}

/// `{<A ==> B>, A} ⊢ B` through the subject (`side` 0), or abductively
/// `{<A ==> B>, B} ⊢ A` through the predicate (`side` 1). Equivalences use
/// analogy either way.
pub fn detachment(
    main: &Sentence,
    sub: &Sentence,
    side: usize,
    memory: &mut Memory,
    ctx: &mut StepContext,
) {
    let statement = main.content();
    let equivalence = statement.is_operator(Operator::Equivalence);
    if !(equivalence || statement.is_operator(Operator::Implication)) {
        return;
    }
    let Some((subject, predicate)) = sides(statement) else {
        return;
    };
    let term = sub.content();
    let content = if side == 0 && term == subject {
        predicate
    } else if side == 1 && term == predicate {
        subject
    } else {
        return;
    };

    let Some(task) = ctx.task.clone() else {
        return;
    };
    if task.sentence().is_question() {
        let Some(belief_truth) = ctx.belief.as_ref().and_then(|b| b.truth()).copied() else {
            return;
        };
        let budget = if !equivalence && side == 0 {
            budget::backward_weak(&belief_truth, memory, ctx)
        } else {
            budget::backward(&belief_truth, memory, ctx)
        };
        memory.double_premise_task(content.clone(), None, budget, ctx);
    } else {
        let (Some(t1), Some(t2)) = (main.truth(), sub.truth()) else {
            return;
        };
        let truth = if equivalence {
            truth::analogy(t2, t1)
        } else if side == 0 {
            truth::deduction(t1, t2)
        } else {
            truth::abduction(t2, t1)
        };
        let budget = budget::forward(&truth, memory, ctx);
        memory.double_premise_task(content.clone(), Some(truth), budget, ctx);
    }
}
