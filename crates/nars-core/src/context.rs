use std::rc::Rc;

use crate::link::{TaskLink, TermLink};
use crate::sentence::{Sentence, Task};
use crate::stamp::Stamp;
use crate::term::Term;

/// Registers for one reasoning step, threaded through the rule layer.
///
/// The selected links are held here by value while they are out of their
/// bags, so rule budgets can reward them before they are put back.
#[derive(Debug, Default)]
pub struct StepContext {
    pub concept: Option<String>,
    pub term: Option<Term>,
    pub task: Option<Rc<Task>>,
    pub task_link: Option<TaskLink>,
    pub term_link: Option<TermLink>,
    pub belief: Option<Sentence>,
    pub new_stamp: Option<Stamp>,
}

impl StepContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for processing `task` directly, outside of any link pairing.
    pub fn for_task(task: Rc<Task>) -> Self {
        Self {
            term: Some(task.content().clone()),
            task: Some(task),
            ..Self::default()
        }
    }

    pub fn task_sentence(&self) -> Option<&Sentence> {
        self.task.as_ref().map(|t| t.sentence())
    }
}
