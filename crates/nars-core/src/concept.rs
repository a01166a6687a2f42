//! The per-term knowledge cell and its step functions.
//!
//! Concepts live in the memory's concept bag and refer to each other only by
//! key. The step functions (`direct_process`, `link_to_task`,
//! `build_term_links`, `fire`) take the memory plus the concept key and
//! re-resolve the concept after every call that may have changed the bag; a
//! concept evicted in between turns the rest of the step into a no-op.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::bag::{Bag, Item};
use crate::budget::{Budget, distribute_among_links, rank_belief};
use crate::config::Parameters;
use crate::context::StepContext;
use crate::inference::{self, local};
use crate::link::{LinkKind, TaskLink, TermLink, TermLinkTemplate, prepare_templates};
use crate::memory::Memory;
use crate::sentence::{Sentence, Task};
use crate::stamp::Stamp;
use crate::term::Term;

#[derive(Debug)]
pub struct Concept {
    term: Term,
    budget: Budget,
    beliefs: Vec<Sentence>,
    questions: VecDeque<Rc<Task>>,
    task_links: Bag<TaskLink>,
    term_links: Bag<TermLink>,
    templates: Rc<[TermLinkTemplate]>,
}

impl Concept {
    pub fn new(term: Term, params: &Parameters) -> Self {
        let templates: Rc<[TermLinkTemplate]> = prepare_templates(&term).into();
        Self {
            term,
            budget: Budget::default(),
            beliefs: Vec::new(),
            questions: VecDeque::new(),
            task_links: Bag::new(params.task_link_bag_size, params.task_link_forgetting_cycle),
            term_links: Bag::new(params.term_link_bag_size, params.term_link_forgetting_cycle),
            templates,
        }
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Ranked, best first.
    pub fn beliefs(&self) -> &[Sentence] {
        &self.beliefs
    }

    /// Pending questions and goals, oldest first.
    pub fn questions(&self) -> impl Iterator<Item = &Rc<Task>> {
        self.questions.iter()
    }

    pub fn task_links(&self) -> &Bag<TaskLink> {
        &self.task_links
    }

    pub fn term_links(&self) -> &Bag<TermLink> {
        &self.term_links
    }

    pub fn templates(&self) -> &[TermLinkTemplate] {
        &self.templates
    }

    /// Best belief for `query` by solution quality; none scores above zero
    /// means no candidate.
    pub fn evaluation(&self, query: &Sentence) -> Option<Sentence> {
        let mut best = 0.0;
        let mut candidate = None;
        for belief in &self.beliefs {
            let quality = local::solution_quality(Some(query), belief);
            if quality > best {
                best = quality;
                candidate = Some(belief);
            }
        }
        candidate.cloned()
    }

    /// Insert into the ranked belief table at the first entry it ranks at
    /// least as high as. An equivalent entry there makes this a no-op; the
    /// table is then cut back to `capacity`.
    pub fn add_to_table(&mut self, sentence: Sentence, capacity: usize) {
        let rank = rank_belief(&sentence);
        let mut inserted = false;
        for i in 0..self.beliefs.len() {
            if rank >= rank_belief(&self.beliefs[i]) {
                if sentence.equivalent_to(&self.beliefs[i]) {
                    return;
                }
                self.beliefs.insert(i, sentence.clone());
                inserted = true;
                break;
            }
        }
        if self.beliefs.len() >= capacity {
            self.beliefs.truncate(capacity);
        } else if !inserted {
            self.beliefs.push(sentence);
        }
    }

    /// First belief whose evidence can be combined with `task`'s, with the
    /// merged stamp for the conclusion.
    pub fn get_belief(&self, task: &Sentence, time: u64, max_length: usize) -> Option<(Sentence, Stamp)> {
        self.beliefs.iter().find_map(|belief| {
            tracing::trace!(belief = %belief, "candidate belief");
            Stamp::merge(task.stamp(), belief.stamp(), time, max_length)
                .map(|stamp| (belief.clone(), stamp))
        })
    }

    /// Queue a question unless one with the same content is pending; returns
    /// the sentence to answer.
    fn add_question(&mut self, task: &Rc<Task>, capacity: usize) -> Sentence {
        let pending = self
            .questions
            .iter()
            .find(|q| q.content() == task.content())
            .map(|q| q.sentence().clone());
        if let Some(question) = pending {
            return question;
        }
        self.questions.push_back(task.clone());
        while self.questions.len() > capacity {
            self.questions.pop_front();
        }
        task.sentence().clone()
    }

    /// Take out a term-reference the task-reference has not paired with
    /// recently, putting refused ones back.
    fn take_out_term_link(
        &mut self,
        task_link: &mut TaskLink,
        time: u64,
        max_matched: usize,
        record_length: usize,
    ) -> Option<TermLink> {
        for _ in 0..max_matched {
            let link = self.term_links.take_out()?;
            if task_link.novel(&link, time, record_length) {
                return Some(link);
            }
            self.term_links.put_back(link);
        }
        None
    }
}

impl Item for Concept {
    fn key(&self) -> &str {
        self.term.name()
    }

    fn budget(&self) -> Budget {
        self.budget
    }

    fn set_budget(&mut self, budget: Budget) {
        self.budget = budget;
    }
}

// ---------------------------------------------------------------------------
// Direct processing
// ---------------------------------------------------------------------------

/// Handle the context's task in the concept `key`: judgments revise and
/// answer, questions queue and get answered; a task still above threshold is
/// then linked into the concept network.
pub fn direct_process(memory: &mut Memory, key: &str, ctx: &mut StepContext) {
    let Some(task) = ctx.task.clone() else {
        return;
    };
    if task.sentence().is_judgment() {
        process_judgment(memory, key, &task, ctx);
    } else {
        process_question(memory, key, &task, ctx);
    }
    if task.budget().above_threshold(memory.params().budget_threshold) {
        link_to_task(memory, key, &task);
    }
}

fn process_judgment(memory: &mut Memory, key: &str, task: &Rc<Task>, ctx: &mut StepContext) {
    let judgment = task.sentence();
    let Some(old_belief) = memory.concept(key).and_then(|c| c.evaluation(judgment)) else {
        add_judgment(memory, key, task, ctx);
        return;
    };

    if judgment.stamp() == old_belief.stamp() {
        if task.parent().is_none_or(Sentence::is_judgment) {
            task.update_budget(|b| b.dec_priority(0.0));
        }
        tracing::debug!(task = %task, "duplicate judgment");
        return;
    }
    if local::revisable(judgment, &old_belief) {
        let max_length = memory.params().maximum_stamp_length;
        ctx.new_stamp = Stamp::merge(judgment.stamp(), old_belief.stamp(), memory.time(), max_length);
        if ctx.new_stamp.is_some() {
            ctx.belief = Some(old_belief.clone());
            local::revision(judgment, &old_belief, false, memory, ctx);
        }
    }
    add_judgment(memory, key, task, ctx);
}

fn add_judgment(memory: &mut Memory, key: &str, task: &Rc<Task>, ctx: &mut StepContext) {
    if !task.budget().above_threshold(memory.params().budget_threshold) {
        return;
    }
    let judgment = task.sentence();
    let questions: Vec<Rc<Task>> = memory
        .concept(key)
        .map(|c| c.questions().cloned().collect())
        .unwrap_or_default();
    for question in &questions {
        local::try_solution(judgment, question, memory, ctx);
    }
    let capacity = memory.params().maximum_belief_length;
    if let Some(concept) = memory.concept_mut(key) {
        concept.add_to_table(judgment.clone(), capacity);
    }
}

fn process_question(memory: &mut Memory, key: &str, task: &Rc<Task>, ctx: &mut StepContext) {
    let capacity = memory.params().maximum_question_length;
    let Some(concept) = memory.concept_mut(key) else {
        return;
    };
    let question = concept.add_question(task, capacity);
    if let Some(answer) = concept.evaluation(&question) {
        local::try_solution(&answer, task, memory, ctx);
    }
}

// ---------------------------------------------------------------------------
// Linking
// ---------------------------------------------------------------------------

/// Spread `task` from concept `key`: a self task-reference here, one
/// task-reference per template in each target concept, then reciprocal
/// term-references down through the structure.
pub fn link_to_task(memory: &mut Memory, key: &str, task: &Rc<Task>) {
    let threshold = memory.params().budget_threshold;
    let task_budget = task.budget();
    insert_task_link(memory, key, TaskLink::new(task.clone(), None, task_budget));

    let Some(templates) = memory.concept(key).map(|c| c.templates.clone()) else {
        return;
    };
    if templates.is_empty() {
        return;
    }
    let sub_budget = distribute_among_links(&task_budget, templates.len());
    if !sub_budget.above_threshold(threshold) {
        return;
    }
    for template in templates.iter() {
        if task.is_structural() && template.kind == LinkKind::Transform {
            continue;
        }
        if memory.get_concept(&template.target).is_some() {
            let link = TaskLink::new(task.clone(), Some(template), sub_budget);
            insert_task_link(memory, template.target.name(), link);
        }
    }
    build_term_links(memory, key, &task_budget);
}

/// Store a task-reference in concept `key` and let its budget activate the
/// concept.
fn insert_task_link(memory: &mut Memory, key: &str, link: TaskLink) {
    let budget = link.budget;
    let Some(concept) = memory.concept_mut(key) else {
        return;
    };
    concept.task_links.put_in(link);
    memory.activate_concept(key, &budget);
}

/// Link concept `key` and every existing concept its templates name, both
/// ways, recursing into compound targets with the diluted budget.
pub fn build_term_links(memory: &mut Memory, key: &str, budget: &Budget) {
    let threshold = memory.params().budget_threshold;
    let Some((term, templates)) = memory
        .concept(key)
        .map(|c| (c.term.clone(), c.templates.clone()))
    else {
        return;
    };
    if templates.is_empty() {
        return;
    }
    let sub_budget = distribute_among_links(budget, templates.len());
    if !sub_budget.above_threshold(threshold) {
        return;
    }
    for template in templates.iter() {
        if template.kind == LinkKind::Transform {
            continue;
        }
        let target = &template.target;
        if memory.get_concept(target).is_none() {
            continue;
        }
        if let Some(concept) = memory.concept_mut(key) {
            concept
                .term_links
                .put_in(TermLink::new(target.clone(), template, sub_budget));
        }
        if let Some(concept) = memory.concept_mut(target.name()) {
            concept
                .term_links
                .put_in(TermLink::new(term.clone(), template, sub_budget));
        }
        if target.is_compound() {
            build_term_links(memory, target.name(), &sub_budget);
        }
    }
}

// ---------------------------------------------------------------------------
// Firing
// ---------------------------------------------------------------------------

/// One reasoning step in concept `key`.
///
/// Takes out a task-reference; a transform reference goes to restructuring,
/// any other is paired with up to `term_link_max_reasoned` novel
/// term-references until the step reports something. Every link taken out
/// is put back (decayed) afterwards.
pub fn fire(memory: &mut Memory, key: &str, ctx: &mut StepContext) {
    let Some(task_link) = memory.concept_mut(key).and_then(|c| c.task_links.take_out()) else {
        return;
    };
    tracing::debug!(concept = key, task_link = task_link.key(), "selected task-reference");

    ctx.concept = Some(key.to_owned());
    ctx.task = Some(task_link.task().clone());
    ctx.term_link = None;
    let transform = task_link.kind() == LinkKind::Transform;
    ctx.task_link = Some(task_link);

    if transform {
        ctx.belief = None;
        inference::transform_task(memory, ctx);
    } else {
        let params = memory.params();
        let (mut remaining, max_matched, record_length) = (
            params.term_link_max_reasoned,
            params.term_link_max_matched,
            params.term_link_record_length,
        );
        while memory.no_result() && remaining > 0 {
            let time = memory.time();
            let Some(task_link) = ctx.task_link.as_mut() else {
                break;
            };
            let Some(term_link) = memory
                .concept_mut(key)
                .and_then(|c| c.take_out_term_link(task_link, time, max_matched, record_length))
            else {
                break;
            };
            tracing::debug!(concept = key, term_link = term_link.key(), "selected term-reference");
            ctx.term_link = Some(term_link);
            inference::reason(memory, ctx);
            if let Some(term_link) = ctx.term_link.take()
                && let Some(concept) = memory.concept_mut(key)
            {
                concept.term_links.put_back(term_link);
            }
            remaining -= 1;
        }
    }

    if let Some(task_link) = ctx.task_link.take()
        && let Some(concept) = memory.concept_mut(key)
    {
        concept.task_links.put_back(task_link);
    }
}
