//! Budgeted references between concepts (term-references) and from concepts
//! to tasks (task-references), plus the structure walk that decides which
//! related terms a compound links to.

use std::collections::VecDeque;
use std::fmt::Write;
use std::rc::Rc;

use crate::bag::Item;
use crate::budget::Budget;
use crate::sentence::Task;
use crate::term::{Operator, Term};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// From a concept to its own task.
    SelfLink,
    Component,
    Compound,
    ComponentStatement,
    CompoundStatement,
    ComponentCondition,
    CompoundCondition,
    /// Product/image component reachable by restructuring.
    Transform,
}

impl LinkKind {
    pub fn code(self) -> u8 {
        match self {
            LinkKind::SelfLink => 0,
            LinkKind::Component => 1,
            LinkKind::Compound => 2,
            LinkKind::ComponentStatement => 3,
            LinkKind::CompoundStatement => 4,
            LinkKind::ComponentCondition => 5,
            LinkKind::CompoundCondition => 6,
            LinkKind::Transform => 8,
        }
    }

    /// The kind seen from the compound's side, pointing at the component.
    pub fn to_component(self) -> LinkKind {
        match self {
            LinkKind::Compound => LinkKind::Component,
            LinkKind::CompoundStatement => LinkKind::ComponentStatement,
            LinkKind::CompoundCondition => LinkKind::ComponentCondition,
            other => other,
        }
    }

    fn points_to_component(self) -> bool {
        self.code() % 2 == 1
    }
}

fn link_key(kind: LinkKind, index: &[usize]) -> String {
    let (open, close) = if kind.points_to_component() {
        (" @(", ")_ ")
    } else {
        (" _@(", ") ")
    };
    let mut key = format!("{open}T{}", kind.code());
    for i in index {
        let _ = write!(key, "-{}", i + 1);
    }
    key.push_str(close);
    key
}

/// Where a compound links to: target component, kind as seen from the
/// component, and the index path from the compound down to it.
#[derive(Clone, Debug, PartialEq)]
pub struct TermLinkTemplate {
    pub target: Term,
    pub kind: LinkKind,
    pub index: Vec<usize>,
}

impl TermLinkTemplate {
    /// Condition links get a leading 0 for the conjunction's slot.
    fn new(target: &Term, kind: LinkKind, mut index: Vec<usize>) -> Self {
        if kind == LinkKind::CompoundCondition {
            index.insert(0, 0);
        }
        Self {
            target: target.clone(),
            kind,
            index,
        }
    }

    fn transform(target: &Term, parent: LinkKind, path: &[usize]) -> Self {
        let mut index = Vec::with_capacity(path.len() + 1);
        if parent == LinkKind::CompoundCondition {
            index.push(0);
        }
        index.extend_from_slice(path);
        Self {
            target: target.clone(),
            kind: LinkKind::Transform,
            index,
        }
    }
}

/// Templates for every constant component a concept for `term` links to,
/// down to three levels for nested products and images.
pub fn prepare_templates(term: &Term) -> Vec<TermLinkTemplate> {
    let mut templates = Vec::new();
    if !term.is_compound() {
        return templates;
    }
    let kind = if term.is_statement() {
        LinkKind::CompoundStatement
    } else {
        LinkKind::Compound
    };
    walk(&mut templates, kind, term);
    templates
}

fn is_transformable(term: &Term) -> bool {
    term.operator().is_some_and(|op| op.is_transformable())
}

fn walk(out: &mut Vec<TermLinkTemplate>, kind: LinkKind, term: &Term) {
    for (i, t1) in term.components().iter().enumerate() {
        if t1.is_constant() {
            out.push(TermLinkTemplate::new(t1, kind, vec![i]));
        }

        // Only a conjunction counts as a condition; a negated antecedent
        // links like any other component.
        let condition = t1.is_operator(Operator::Conjunction)
            && (term.is_operator(Operator::Equivalence)
                || (term.is_operator(Operator::Implication) && i == 0));
        if condition {
            walk(out, LinkKind::CompoundCondition, t1);
            continue;
        }
        if !t1.is_compound() {
            continue;
        }

        for (j, t2) in t1.components().iter().enumerate() {
            if t2.is_constant() {
                if is_transformable(t1) {
                    out.push(TermLinkTemplate::transform(t2, kind, &[i, j]));
                } else {
                    out.push(TermLinkTemplate::new(t2, kind, vec![i, j]));
                }
            }
            if is_transformable(t2) {
                for (k, t3) in t2.components().iter().enumerate() {
                    if t3.is_constant() {
                        out.push(TermLinkTemplate::transform(t3, kind, &[i, j, k]));
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Term-reference
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct TermLink {
    pub(crate) budget: Budget,
    pub(crate) target: Term,
    kind: LinkKind,
    index: Vec<usize>,
    key: String,
}

impl TermLink {
    /// A link built from a compound's template. Pointing at the template's
    /// own target (compound to component) flips the kind to its component form.
    pub fn new(target: Term, template: &TermLinkTemplate, budget: Budget) -> Self {
        let kind = if template.target == target {
            template.kind.to_component()
        } else {
            template.kind
        };
        let key = format!("{}{}", link_key(kind, &template.index), target);
        Self {
            budget,
            target,
            kind,
            index: template.index.clone(),
            key,
        }
    }

    pub fn target(&self) -> &Term {
        &self.target
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    pub fn index(&self) -> &[usize] {
        &self.index
    }
}

impl Item for TermLink {
    fn key(&self) -> &str {
        &self.key
    }

    fn budget(&self) -> Budget {
        self.budget
    }

    fn set_budget(&mut self, budget: Budget) {
        self.budget = budget;
    }
}

// ---------------------------------------------------------------------------
// Task-reference
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct TaskLink {
    pub(crate) budget: Budget,
    task: Rc<Task>,
    kind: LinkKind,
    index: Vec<usize>,
    key: String,
    /// Recently paired term-references and when.
    records: VecDeque<(String, u64)>,
}

impl TaskLink {
    /// Without a template the link is the concept's own task link.
    pub fn new(task: Rc<Task>, template: Option<&TermLinkTemplate>, budget: Budget) -> Self {
        let (kind, index) = match template {
            Some(t) => (t.kind, t.index.clone()),
            None => (LinkKind::SelfLink, Vec::new()),
        };
        let key = format!("{}{}", link_key(kind, &index), task.key());
        Self {
            budget,
            task,
            kind,
            index,
            key,
            records: VecDeque::new(),
        }
    }

    pub fn task(&self) -> &Rc<Task> {
        &self.task
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Whether pairing with `term_link` at `time` is worth reasoning on.
    ///
    /// A term-reference to the task's own content never is. One seen within
    /// the last `record_length` ticks is refused; an older one has its record
    /// refreshed and is accepted. The record holds at most `record_length`
    /// entries, oldest dropped first.
    pub fn novel(&mut self, term_link: &TermLink, time: u64, record_length: usize) -> bool {
        if term_link.target() == self.task.content() {
            return false;
        }
        let key = term_link.key();
        if let Some(record) = self.records.iter_mut().find(|(k, _)| k == key) {
            if time < record.1 + record_length as u64 {
                return false;
            }
            record.1 = time;
            return true;
        }
        if self.records.len() >= record_length {
            self.records.pop_front();
        }
        self.records.push_back((key.to_owned(), time));
        true
    }
}

impl Item for TaskLink {
    fn key(&self) -> &str {
        &self.key
    }

    fn budget(&self) -> Budget {
        self.budget
    }

    fn set_budget(&mut self, budget: Budget) {
        self.budget = budget;
    }
}
