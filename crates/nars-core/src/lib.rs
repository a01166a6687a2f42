//! Non-axiomatic reasoning core.
//!
//! Attention is allocated by priority-bucketed bags: the memory holds a bag
//! of concepts, each concept holds bags of task- and term-references, and a
//! shared distributor table turns the bucket layout into a deterministic,
//! priority-weighted selection order. One `work_cycle` per tick processes
//! new input, one novel task and one concept firing, reporting conclusions
//! into an export buffer.
//!
//! Zero I/O. Single-threaded: a [`Memory`] is `!Send` and is driven by one
//! thread; independent instances share nothing.

pub mod bag;
pub mod budget;
pub mod concept;
pub mod config;
pub mod constants;
pub mod context;
pub mod distributor;
pub mod inference;
pub mod link;
pub mod memory;
pub mod narsese;
pub mod reasoner;
pub mod sentence;
pub mod stamp;
pub mod term;
pub mod truth;

pub use bag::{Bag, Item};
pub use budget::Budget;
pub use concept::Concept;
pub use config::{ConfigError, Parameters};
pub use constants::{BAG_LEVEL, BAG_THRESHOLD};
pub use context::StepContext;
pub use distributor::{DISTRIBUTOR, Distributor};
pub use link::{LinkKind, TaskLink, TermLink, TermLinkTemplate};
pub use memory::Memory;
pub use narsese::{InputLine, ParseError, parse_task, parse_term};
pub use reasoner::Reasoner;
pub use sentence::{Punctuation, Sentence, Task};
pub use stamp::Stamp;
pub use term::{Operator, Term, VarKind};
pub use truth::TruthValue;
