//! Sentences (content + punctuation + truth + stamp) and the budgeted tasks
//! that carry them through memory.

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::bag::Item;
use crate::budget::Budget;
use crate::stamp::Stamp;
use crate::term::{Operator, Term};
use crate::truth::TruthValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Punctuation {
    Judgment,
    Question,
    Goal,
}

impl Punctuation {
    pub fn symbol(self) -> char {
        match self {
            Punctuation::Judgment => '.',
            Punctuation::Question => '?',
            Punctuation::Goal => '!',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '.' => Some(Punctuation::Judgment),
            '?' => Some(Punctuation::Question),
            '!' => Some(Punctuation::Goal),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sentence {
    content: Term,
    punctuation: Punctuation,
    truth: Option<TruthValue>,
    stamp: Stamp,
    revisable: bool,
}

impl Sentence {
    /// Questions carry no truth value; a truth passed with one is dropped.
    /// Conjunctions containing variables are not revisable.
    pub fn new(
        content: Term,
        punctuation: Punctuation,
        truth: Option<TruthValue>,
        stamp: Stamp,
    ) -> Self {
        let revisable = !(content.is_operator(Operator::Conjunction) && !content.is_constant());
        let truth = match punctuation {
            Punctuation::Question => None,
            _ => truth,
        };
        Self {
            content,
            punctuation,
            truth,
            stamp,
            revisable,
        }
    }

    pub fn content(&self) -> &Term {
        &self.content
    }

    pub fn punctuation(&self) -> Punctuation {
        self.punctuation
    }

    pub fn truth(&self) -> Option<&TruthValue> {
        self.truth.as_ref()
    }

    pub fn stamp(&self) -> &Stamp {
        &self.stamp
    }

    pub fn is_revisable(&self) -> bool {
        self.revisable
    }

    pub fn is_judgment(&self) -> bool {
        self.punctuation == Punctuation::Judgment
    }

    pub fn is_question(&self) -> bool {
        self.punctuation == Punctuation::Question
    }

    pub fn is_goal(&self) -> bool {
        self.punctuation == Punctuation::Goal
    }

    /// Same content, same truth and the same evidence.
    pub fn equivalent_to(&self, other: &Sentence) -> bool {
        self.content == other.content && self.truth == other.truth && self.stamp == other.stamp
    }

    /// `content` + punctuation + brief truth, e.g. `<a --> b>. %1.00;0.90%`.
    pub fn key(&self) -> String {
        match &self.truth {
            Some(truth) => format!(
                "{}{} {}",
                self.content,
                self.punctuation.symbol(),
                truth.brief()
            ),
            None => format!("{}{}", self.content, self.punctuation.symbol()),
        }
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key(), self.stamp)
    }
}

/// A sentence under processing. Shared between the new-task queue, question
/// tables and task-references, so the mutable parts sit behind cells.
#[derive(Debug)]
pub struct Task {
    sentence: Sentence,
    key: String,
    budget: Cell<Budget>,
    parent: Option<Sentence>,
    parent_belief: Option<Sentence>,
    best_solution: RefCell<Option<Sentence>>,
}

impl Task {
    pub fn new(
        sentence: Sentence,
        budget: Budget,
        parent: Option<Sentence>,
        parent_belief: Option<Sentence>,
        best_solution: Option<Sentence>,
    ) -> Self {
        let key = sentence.key();
        Self {
            sentence,
            key,
            budget: Cell::new(budget),
            parent,
            parent_belief,
            best_solution: RefCell::new(best_solution),
        }
    }

    /// A task read from input: no parent, no belief.
    pub fn input(sentence: Sentence, budget: Budget) -> Self {
        Self::new(sentence, budget, None, None, None)
    }

    pub fn sentence(&self) -> &Sentence {
        &self.sentence
    }

    pub fn content(&self) -> &Term {
        self.sentence.content()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn budget(&self) -> Budget {
        self.budget.get()
    }

    pub fn update_budget(&self, f: impl FnOnce(&mut Budget)) {
        let mut budget = self.budget.get();
        f(&mut budget);
        self.budget.set(budget);
    }

    /// Sentence of the task this one was derived from.
    pub fn parent(&self) -> Option<&Sentence> {
        self.parent.as_ref()
    }

    pub fn parent_belief(&self) -> Option<&Sentence> {
        self.parent_belief.as_ref()
    }

    pub fn best_solution(&self) -> Option<Sentence> {
        self.best_solution.borrow().clone()
    }

    pub fn set_best_solution(&self, solution: Sentence) {
        *self.best_solution.borrow_mut() = Some(solution);
    }

    pub fn is_input(&self) -> bool {
        self.parent.is_none()
    }

    /// Derived from a single premise (no belief involved).
    pub fn is_structural(&self) -> bool {
        self.parent.is_some() && self.parent_belief.is_none()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.budget.get(), self.sentence)
    }
}

impl Item for std::rc::Rc<Task> {
    fn key(&self) -> &str {
        &self.key
    }

    fn budget(&self) -> Budget {
        self.budget.get()
    }

    fn set_budget(&mut self, budget: Budget) {
        self.budget.set(budget);
    }
}
