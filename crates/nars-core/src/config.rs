//! Tunable system parameters.
//!
//! Every field has a default, so a parameter file only needs to name the
//! values it changes. Level count and level threshold are fixed at compile
//! time (see [`crate::constants`]) because the distributor table is shared.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub concept_bag_size: usize,
    pub task_link_bag_size: usize,
    pub term_link_bag_size: usize,
    pub novel_task_bag_size: usize,

    pub concept_forgetting_cycle: u32,
    pub task_link_forgetting_cycle: u32,
    pub term_link_forgetting_cycle: u32,
    pub new_task_forgetting_cycle: u32,

    pub maximum_belief_length: usize,
    pub maximum_question_length: usize,

    /// Term-references reasoned with per fired task-reference.
    pub term_link_max_reasoned: usize,
    /// Take-out attempts when looking for a novel term-reference.
    pub term_link_max_matched: usize,
    /// Size of the recency ring in each task-reference, and the window in ticks.
    pub term_link_record_length: usize,

    pub budget_threshold: f32,
    pub default_creation_expectation: f32,
    pub maximum_stamp_length: usize,

    /// 0..=100. Derived tasks whose budget summary is not above silence/100 are not reported.
    pub silence: u8,

    pub default_judgment_confidence: f32,
    pub default_judgment_priority: f32,
    pub default_judgment_durability: f32,
    pub default_question_priority: f32,
    pub default_question_durability: f32,
    pub default_goal_priority: f32,
    pub default_goal_durability: f32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            concept_bag_size: 1000,
            task_link_bag_size: 20,
            term_link_bag_size: 100,
            novel_task_bag_size: 10,
            concept_forgetting_cycle: 10,
            task_link_forgetting_cycle: 20,
            term_link_forgetting_cycle: 50,
            new_task_forgetting_cycle: 5,
            maximum_belief_length: 7,
            maximum_question_length: 5,
            term_link_max_reasoned: 3,
            term_link_max_matched: 10,
            term_link_record_length: 10,
            budget_threshold: 0.01,
            default_creation_expectation: 0.66,
            maximum_stamp_length: 8,
            silence: 0,
            default_judgment_confidence: 0.9,
            default_judgment_priority: 0.8,
            default_judgment_durability: 0.5,
            default_question_priority: 0.9,
            default_question_durability: 0.9,
            default_goal_priority: 0.9,
            default_goal_durability: 0.9,
        }
    }
}

impl Parameters {
    /// Check ranges. Capacities must be positive, unit-interval values must
    /// lie in [0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacities = [
            ("concept_bag_size", self.concept_bag_size),
            ("task_link_bag_size", self.task_link_bag_size),
            ("term_link_bag_size", self.term_link_bag_size),
            ("novel_task_bag_size", self.novel_task_bag_size),
            ("maximum_belief_length", self.maximum_belief_length),
            ("maximum_question_length", self.maximum_question_length),
            ("term_link_record_length", self.term_link_record_length),
            ("maximum_stamp_length", self.maximum_stamp_length),
        ];
        for (name, value) in capacities {
            if value == 0 {
                return Err(ConfigError::ZeroCapacity(name));
            }
        }

        let rates = [
            ("concept_forgetting_cycle", self.concept_forgetting_cycle),
            ("task_link_forgetting_cycle", self.task_link_forgetting_cycle),
            ("term_link_forgetting_cycle", self.term_link_forgetting_cycle),
            ("new_task_forgetting_cycle", self.new_task_forgetting_cycle),
        ];
        for (name, value) in rates {
            if value == 0 {
                return Err(ConfigError::ZeroCapacity(name));
            }
        }

        let unit = [
            ("budget_threshold", self.budget_threshold),
            ("default_creation_expectation", self.default_creation_expectation),
            ("default_judgment_confidence", self.default_judgment_confidence),
            ("default_judgment_priority", self.default_judgment_priority),
            ("default_judgment_durability", self.default_judgment_durability),
            ("default_question_priority", self.default_question_priority),
            ("default_question_durability", self.default_question_durability),
            ("default_goal_priority", self.default_goal_priority),
            ("default_goal_durability", self.default_goal_durability),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange(name, value));
            }
        }

        if self.silence > 100 {
            return Err(ConfigError::Silence(self.silence));
        }
        Ok(())
    }

    /// Report threshold derived from `silence`.
    pub fn silence_threshold(&self) -> f32 {
        self.silence as f32 / 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroCapacity(&'static str),
    OutOfUnitRange(&'static str, f32),
    Silence(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCapacity(name) => write!(f, "{name} must be at least 1"),
            ConfigError::OutOfUnitRange(name, v) => {
                write!(f, "{name} must lie in [0, 1], got {v}")
            }
            ConfigError::Silence(v) => write!(f, "silence must lie in 0..=100, got {v}"),
        }
    }
}

impl std::error::Error for ConfigError {}
