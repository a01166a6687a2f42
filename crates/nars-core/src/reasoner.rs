//! Tick driver around one [`Memory`]: feeds queued protocol lines, advances
//! the clock and collects the report lines of each cycle. No I/O.

use std::collections::VecDeque;

use crate::config::Parameters;
use crate::memory::Memory;
use crate::narsese::{self, InputLine};

#[derive(Debug)]
pub struct Reasoner {
    memory: Memory,
    clock: u64,
    pending: VecDeque<String>,
    walking_steps: u64,
}

impl Reasoner {
    pub fn new(params: Parameters) -> Self {
        Self {
            memory: Memory::new(params),
            clock: 0,
            pending: VecDeque::new(),
            walking_steps: 0,
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Queue protocol text, one line per entry.
    pub fn add_input(&mut self, text: &str) {
        self.pending.extend(text.lines().map(str::to_owned));
    }

    /// No queued input and no walking steps left.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.walking_steps == 0
    }

    /// One tick. A walking tick reads no input; otherwise queued input is
    /// read up to and including the next step-count line.
    pub fn tick(&mut self) -> Vec<String> {
        if self.walking_steps > 0 {
            self.walking_steps -= 1;
        } else {
            self.feed();
        }
        self.clock += 1;
        self.memory.work_cycle(self.clock);
        self.memory.drain_output()
    }

    /// `n` ticks, concatenating their report lines.
    pub fn run(&mut self, n: u64) -> Vec<String> {
        (0..n).flat_map(|_| self.tick()).collect()
    }

    /// Forget everything and restart the clock. Queued input is kept.
    pub fn reset(&mut self) {
        tracing::debug!(clock = self.clock, "reset");
        self.memory.reset();
        self.clock = 0;
        self.walking_steps = 0;
    }

    fn feed(&mut self) {
        while let Some(line) = self.pending.pop_front() {
            match InputLine::parse(&line) {
                InputLine::Empty | InputLine::Comment => {}
                InputLine::Reset => self.reset(),
                InputLine::Steps(n) => {
                    self.walking_steps = n;
                    return;
                }
                InputLine::Sentence(text) => match narsese::parse_task(&text, &mut self.memory) {
                    Ok(task) => self.memory.input_task(task),
                    Err(e) => tracing::warn!(line = %text, error = %e, "input skipped"),
                },
            }
        }
    }
}

impl Default for Reasoner {
    fn default() -> Self {
        Self::new(Parameters::default())
    }
}
