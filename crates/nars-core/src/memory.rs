//! The orchestrator: concept and novel-task bags, the new-task queue, the
//! export buffer and the clock, driven one `work_cycle` per tick.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::bag::{Bag, Item};
use crate::budget::{Budget, activate};
use crate::concept::{self, Concept};
use crate::config::Parameters;
use crate::context::StepContext;
use crate::sentence::{Sentence, Task};
use crate::term::Term;
use crate::truth::TruthValue;

/// Not `Send`: tasks are shared through `Rc`. Run one memory per thread.
#[derive(Debug)]
pub struct Memory {
    params: Parameters,
    concepts: Bag<Concept>,
    novel_tasks: Bag<Rc<Task>>,
    new_tasks: VecDeque<Rc<Task>>,
    export: Vec<String>,
    /// Export length when the current cycle began; lines before it are
    /// input echoes and do not count as results.
    cycle_start: usize,
    clock: u64,
    serial: u64,
}

impl Memory {
    pub fn new(params: Parameters) -> Self {
        Self {
            concepts: Bag::new(params.concept_bag_size, params.concept_forgetting_cycle),
            novel_tasks: Bag::new(params.novel_task_bag_size, params.new_task_forgetting_cycle),
            new_tasks: VecDeque::new(),
            export: Vec::new(),
            cycle_start: 0,
            clock: 0,
            serial: 0,
            params,
        }
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Clock of the current (or last) work cycle.
    pub fn time(&self) -> u64 {
        self.clock
    }

    /// Serial number for a new input stamp.
    pub fn next_serial(&mut self) -> u64 {
        self.serial += 1;
        self.serial
    }

    /// Forget everything, keeping the parameters.
    pub fn reset(&mut self) {
        let params = std::mem::take(&mut self.params);
        *self = Memory::new(params);
    }

    // -----------------------------------------------------------------------
    // Concept access
    // -----------------------------------------------------------------------

    pub fn concepts(&self) -> &Bag<Concept> {
        &self.concepts
    }

    pub fn concept(&self, key: &str) -> Option<&Concept> {
        self.concepts.get(key)
    }

    pub fn concept_mut(&mut self, key: &str) -> Option<&mut Concept> {
        self.concepts.get_mut(key)
    }

    /// Priority of the concept for `term`, 0 when there is none.
    pub fn concept_activation(&self, term: &Term) -> f32 {
        self.concepts.get(term.name()).map_or(0.0, Item::priority)
    }

    /// Concept for `term`, created on first reference. `None` for terms with
    /// variables and when a full bag refuses the new concept.
    pub fn get_concept(&mut self, term: &Term) -> Option<&mut Concept> {
        if !term.is_constant() {
            return None;
        }
        if !self.concepts.contains(term.name()) {
            let concept = Concept::new(term.clone(), &self.params);
            if let Some(overflow) = self.concepts.put_in(concept) {
                if overflow.key() == term.name() {
                    tracing::trace!(concept = term.name(), "concept refused");
                    return None;
                }
                tracing::debug!(concept = overflow.key(), "concept forgotten");
            }
        }
        self.concepts.get_mut(term.name())
    }

    /// Raise a concept's priority with an incoming budget.
    pub fn activate_concept(&mut self, key: &str, budget: &Budget) {
        let Some(mut concept) = self.concepts.pick_out(key) else {
            return;
        };
        let mut current = concept.budget();
        activate(&mut current, budget);
        concept.set_budget(current);
        self.concepts.put_back(concept);
    }

    pub fn new_task_count(&self) -> usize {
        self.new_tasks.len()
    }

    pub fn novel_tasks(&self) -> &Bag<Rc<Task>> {
        &self.novel_tasks
    }

    // -----------------------------------------------------------------------
    // Work cycle
    // -----------------------------------------------------------------------

    /// Accept an input task for the next cycle if its budget clears the
    /// threshold.
    pub fn input_task(&mut self, task: Task) {
        if task.budget().above_threshold(self.params.budget_threshold) {
            tracing::debug!(task = %task, "perceived");
            self.report(task.sentence(), true);
            self.new_tasks.push_back(Rc::new(task));
        } else {
            tracing::debug!(task = %task, "neglected");
        }
    }

    /// One tick: new tasks, then a novel task, then one concept firing,
    /// each stage only while the tick has reported nothing.
    pub fn work_cycle(&mut self, clock: u64) {
        self.clock = clock;
        self.cycle_start = self.export.len();
        tracing::debug!(clock, "work cycle");
        self.process_new_tasks();
        if self.no_result() {
            self.process_novel_task();
        }
        if self.no_result() {
            self.process_concept();
        }
    }

    /// Drain only as many tasks as were queued on entry; tasks derived while
    /// draining wait for the next cycle.
    fn process_new_tasks(&mut self) {
        let count = self.new_tasks.len();
        for _ in 0..count {
            let Some(task) = self.new_tasks.pop_front() else {
                break;
            };
            if task.is_input() || self.concepts.contains(task.content().name()) {
                self.immediate_process(task);
                continue;
            }
            let sentence = task.sentence();
            if !sentence.is_judgment() {
                continue;
            }
            let expectation = sentence.truth().map_or(0.0, TruthValue::expectation);
            if expectation > self.params.default_creation_expectation {
                if let Some(overflow) = self.novel_tasks.put_in(task) {
                    tracing::trace!(task = %overflow, "novel task dropped");
                }
            } else {
                tracing::debug!(task = %task, "neglected");
            }
        }
    }

    fn process_novel_task(&mut self) {
        if let Some(task) = self.novel_tasks.take_out() {
            self.immediate_process(task);
        }
    }

    fn process_concept(&mut self) {
        let Some(concept) = self.concepts.take_out() else {
            return;
        };
        let key = concept.key().to_owned();
        let term = concept.term().clone();
        tracing::debug!(concept = %key, "selected concept");
        self.concepts.put_back(concept);

        let mut ctx = StepContext::new();
        ctx.term = Some(term);
        concept::fire(self, &key, &mut ctx);
    }

    fn immediate_process(&mut self, task: Rc<Task>) {
        tracing::debug!(task = %task, "immediate process");
        let Some(key) = self.get_concept(task.content()).map(|c| c.key().to_owned()) else {
            return;
        };
        self.activate_concept(&key, &task.budget());

        let mut ctx = StepContext::for_task(task);
        ctx.concept = Some(key.clone());
        concept::direct_process(self, &key, &mut ctx);
    }

    // -----------------------------------------------------------------------
    // Emission
    // -----------------------------------------------------------------------

    /// Queue a conclusion from the current task and belief, stamped with the
    /// merged evidence in `ctx`.
    pub fn double_premise_task(
        &mut self,
        content: Term,
        truth: Option<TruthValue>,
        budget: Budget,
        ctx: &StepContext,
    ) {
        let (Some(task), Some(stamp)) = (&ctx.task, &ctx.new_stamp) else {
            return;
        };
        let sentence = Sentence::new(content, task.sentence().punctuation(), truth, stamp.clone());
        let derived = Task::new(
            sentence,
            budget,
            Some(task.sentence().clone()),
            ctx.belief.clone(),
            None,
        );
        self.derived_task(derived);
    }

    /// Queue a conclusion from the current task alone. Restating the
    /// parent's content is skipped.
    pub fn single_premise_task(
        &mut self,
        content: Term,
        truth: Option<TruthValue>,
        budget: Budget,
        ctx: &StepContext,
    ) {
        let Some(task) = &ctx.task else {
            return;
        };
        if task.parent().is_some_and(|p| p.content() == &content) {
            return;
        }
        let sentence = task.sentence();
        let stamp = match &ctx.belief {
            Some(belief) if !sentence.is_judgment() => belief.stamp().with_time(self.clock),
            _ => sentence.stamp().with_time(self.clock),
        };
        let derived = Sentence::new(content, sentence.punctuation(), truth, stamp);
        self.derived_task(Task::new(
            derived,
            budget,
            Some(sentence.clone()),
            None,
            None,
        ));
    }

    /// Re-activate a belief that answered the current question. The task's
    /// sentence is always that belief, a judgment, so it is never reported.
    pub fn activated_task(
        &mut self,
        budget: Budget,
        sentence: &Sentence,
        candidate_belief: Option<Sentence>,
        ctx: &StepContext,
    ) {
        let task = Task::new(
            sentence.clone(),
            budget,
            ctx.task_sentence().cloned(),
            Some(sentence.clone()),
            candidate_belief,
        );
        tracing::debug!(task = %task, "activated");
        self.new_tasks.push_back(Rc::new(task));
    }

    fn derived_task(&mut self, task: Task) {
        let budget = task.budget();
        if !budget.above_threshold(self.params.budget_threshold) {
            tracing::debug!(task = %task, "ignored");
            return;
        }
        tracing::debug!(task = %task, "derived");
        if budget.summary() > self.params.silence_threshold() {
            self.report(task.sentence(), false);
        }
        self.new_tasks.push_back(Rc::new(task));
    }

    /// Append a report line: `"  IN: "` for input, `" OUT: "` otherwise.
    pub fn report(&mut self, sentence: &Sentence, input: bool) {
        let marker = if input { "  IN: " } else { " OUT: " };
        self.export.push(format!("{marker}{}", sentence.key()));
    }

    /// Nothing derived and reported since the current cycle began.
    pub fn no_result(&self) -> bool {
        self.export.len() <= self.cycle_start
    }

    pub fn drain_output(&mut self) -> Vec<String> {
        self.cycle_start = 0;
        std::mem::take(&mut self.export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::Punctuation;
    use crate::stamp::Stamp;

    fn judgment(memory: &mut Memory, s: &str, p: &str) -> Task {
        judgment_with(memory, s, p, 1.0)
    }

    fn judgment_with(memory: &mut Memory, s: &str, p: &str, frequency: f32) -> Task {
        let content = Term::inheritance(Term::atom(s), Term::atom(p)).unwrap();
        let stamp = Stamp::input(memory.next_serial(), memory.time());
        let sentence = Sentence::new(
            content,
            Punctuation::Judgment,
            Some(TruthValue::new(frequency, 0.9)),
            stamp,
        );
        Task::input(sentence, Budget::new(0.8, 0.5, 0.95))
    }

    /// A derived judgment with a parent, as the rule layer would queue it.
    fn derived(memory: &mut Memory, s: &str, p: &str, frequency: f32) -> Task {
        let parent = judgment(memory, "parent", "premise").sentence().clone();
        let content = Term::inheritance(Term::atom(s), Term::atom(p)).unwrap();
        let stamp = Stamp::input(memory.next_serial(), memory.time());
        let sentence = Sentence::new(
            content,
            Punctuation::Judgment,
            Some(TruthValue::new(frequency, 0.9)),
            stamp,
        );
        Task::new(sentence, Budget::new(0.8, 0.5, 0.9), Some(parent), None, None)
    }

    #[test]
    fn test_input_reports_and_queues() {
        let mut memory = Memory::new(Parameters::default());
        let task = judgment(&mut memory, "bird", "animal");
        memory.input_task(task);
        assert_eq!(memory.new_task_count(), 1);
        assert_eq!(
            memory.drain_output(),
            vec!["  IN: <bird --> animal>. %1.00;0.90%".to_owned()]
        );
        assert!(memory.no_result());
    }

    #[test]
    fn test_input_echo_is_not_a_result() {
        let mut memory = Memory::new(Parameters::default());
        let task = judgment(&mut memory, "bird", "animal");
        memory.input_task(task);
        memory.work_cycle(1);
        assert!(memory.no_result());
        assert_eq!(
            memory.drain_output(),
            vec!["  IN: <bird --> animal>. %1.00;0.90%".to_owned()]
        );
    }

    #[test]
    fn test_tasks_derived_while_draining_wait() {
        let mut memory = Memory::new(Parameters::default());
        let positive = judgment_with(&mut memory, "bird", "animal", 1.0);
        let negative = judgment_with(&mut memory, "bird", "animal", 0.0);
        memory.input_task(positive);
        memory.input_task(negative);
        memory.work_cycle(1);

        // The revision is reported but stays queued for the next cycle.
        let out = memory.drain_output();
        assert!(out.contains(&" OUT: <bird --> animal>. %0.50;0.95%".to_owned()), "{out:?}");
        assert_eq!(memory.new_task_count(), 1);
        assert_eq!(memory.concept("<bird --> animal>").unwrap().beliefs().len(), 2);
    }

    #[test]
    fn test_novel_task_admission_by_expectation() {
        let mut memory = Memory::new(Parameters::default());
        let confident = derived(&mut memory, "x", "y", 1.0);
        let undecided = derived(&mut memory, "u", "v", 0.5);
        memory.derived_task(confident);
        memory.derived_task(undecided);
        assert_eq!(memory.new_task_count(), 2);
        memory.drain_output();

        memory.work_cycle(1);
        // Admitted to the novel bag, then taken out by the same cycle.
        assert!(memory.concept("<x --> y>").is_some());
        assert!(memory.concept("<u --> v>").is_none());
        assert!(memory.concept("u").is_none());
        assert!(memory.novel_tasks().is_empty());
        assert_eq!(memory.new_task_count(), 0);
    }

    #[test]
    fn test_novel_task_waits_while_cycle_reports() {
        let mut memory = Memory::new(Parameters::default());
        let confident = derived(&mut memory, "x", "y", 1.0);
        memory.derived_task(confident);
        memory.drain_output();

        let positive = judgment_with(&mut memory, "bird", "animal", 1.0);
        let negative = judgment_with(&mut memory, "bird", "animal", 0.0);
        memory.input_task(positive);
        memory.input_task(negative);
        memory.work_cycle(1);

        assert!(!memory.no_result());
        assert_eq!(memory.novel_tasks().len(), 1);
        assert!(memory.concept("<x --> y>").is_none());
    }

    #[test]
    fn test_activated_task_queued_silently() {
        let mut memory = Memory::new(Parameters::default());
        let belief = judgment(&mut memory, "bird", "animal").sentence().clone();
        let ctx = StepContext::new();
        memory.activated_task(Budget::new(0.9, 0.8, 0.9), &belief, None, &ctx);
        assert!(memory.no_result());
        assert!(memory.drain_output().is_empty());
        assert_eq!(memory.new_task_count(), 1);
    }

    #[test]
    fn test_low_budget_input_neglected() {
        let mut memory = Memory::new(Parameters::default());
        let content = Term::atom("x");
        let sentence = Sentence::new(
            content,
            Punctuation::Judgment,
            Some(TruthValue::new(1.0, 0.9)),
            Stamp::input(1, 0),
        );
        memory.input_task(Task::input(sentence, Budget::new(0.0, 0.0, 0.0)));
        assert_eq!(memory.new_task_count(), 0);
        assert!(memory.no_result());
    }

    #[test]
    fn test_input_creates_concepts_and_links() {
        let mut memory = Memory::new(Parameters::default());
        let task = judgment(&mut memory, "bird", "animal");
        memory.input_task(task);
        memory.work_cycle(1);

        let statement = memory.concept("<bird --> animal>").unwrap();
        assert_eq!(statement.beliefs().len(), 1);
        assert_eq!(statement.task_links().len(), 1);
        assert_eq!(statement.term_links().len(), 2);

        let bird = memory.concept("bird").unwrap();
        assert_eq!(bird.task_links().len(), 1);
        assert_eq!(bird.term_links().len(), 1);
        assert!(memory.concept("animal").is_some());
        assert_eq!(memory.new_task_count(), 0);
    }

    #[test]
    fn test_activation_raises_priority() {
        let mut memory = Memory::new(Parameters::default());
        let term = Term::atom("x");
        memory.get_concept(&term);
        let before = memory.concept_activation(&term);
        memory.activate_concept("x", &Budget::new(0.9, 0.9, 0.9));
        assert!(memory.concept_activation(&term) > before);
        assert_eq!(memory.concept_activation(&Term::atom("missing")), 0.0);
    }

    #[test]
    fn test_variable_terms_get_no_concept() {
        let mut memory = Memory::new(Parameters::default());
        let term = Term::inheritance(
            Term::variable(crate::term::VarKind::Query, "x"),
            Term::atom("bird"),
        )
        .unwrap();
        assert!(memory.get_concept(&term).is_none());
        assert_eq!(memory.concepts().len(), 0);
    }

    #[test]
    fn test_concept_bag_bounded() {
        let params = Parameters {
            concept_bag_size: 5,
            ..Parameters::default()
        };
        let mut memory = Memory::new(params);
        for i in 0..50 {
            memory.get_concept(&Term::atom(&format!("t{i}")));
            assert!(memory.concepts().len() <= 5);
        }
    }

    #[test]
    fn test_reset_keeps_parameters() {
        let params = Parameters {
            silence: 40,
            ..Parameters::default()
        };
        let mut memory = Memory::new(params.clone());
        let task = judgment(&mut memory, "a", "b");
        memory.input_task(task);
        memory.work_cycle(1);
        memory.reset();
        assert_eq!(memory.params(), &params);
        assert_eq!(memory.concepts().len(), 0);
        assert_eq!(memory.new_task_count(), 0);
        assert_eq!(memory.next_serial(), 1);
    }
}
