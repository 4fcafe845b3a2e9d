//! Cycle scheduler. One [`Reasoner::run_cycle`] is one tick:
//!
//! 1. intake: every task queued before the tick is processed immediately
//!    when it is input or its concept is resident, otherwise buffered in the
//!    novel-task bag; then one buffered task is processed;
//! 2. firing: one concept is drawn, put straight back, and fired.
//!
//! Work per tick is bounded by the queue snapshot plus one buffered task and
//! one firing.

use crate::config::{BagRole, ReasonerConfig};
use crate::error::{ConfigError, ParseError};
use crate::inference::{Inference, MatchingInference};
use crate::item::Item;
use crate::memory::Memory;
use crate::report::Report;
use crate::task::{Task, parse_task};

pub struct Reasoner<I = MatchingInference> {
    memory: Memory,
    inference: I,
}

impl Reasoner<MatchingInference> {
    pub fn with_config(config: ReasonerConfig) -> Result<Self, ConfigError> {
        Self::new(config, MatchingInference)
    }
}

impl<I: Inference> Reasoner<I> {
    pub fn new(config: ReasonerConfig, inference: I) -> Result<Self, ConfigError> {
        Ok(Self {
            memory: Memory::new(config)?,
            inference,
        })
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn inference(&self) -> &I {
        &self.inference
    }

    pub fn inference_mut(&mut self) -> &mut I {
        &mut self.inference
    }

    pub fn clock(&self) -> u64 {
        self.memory.clock()
    }

    /// Queue an input task for the next cycle.
    pub fn input(&mut self, task: Task) {
        self.memory.push_input(task);
    }

    pub fn input_line(&mut self, line: &str) -> Result<(), ParseError> {
        let task = parse_task(line)?;
        self.input(task);
        Ok(())
    }

    pub fn run_cycle(&mut self) {
        self.memory.tick();
        tracing::trace!(clock = self.memory.clock(), "cycle");
        self.intake_new_tasks();
        self.process_novel_task();
        self.fire_concept();
    }

    pub fn run(&mut self, cycles: usize) {
        for _ in 0..cycles {
            self.run_cycle();
        }
    }

    /// Drain the tasks queued before this call. Derivations produced while
    /// draining wait for the next call.
    pub fn intake_new_tasks(&mut self) {
        let creation_expectation = self.memory.config().creation_expectation;
        let counter = self.memory.new_tasks().len();
        for _ in 0..counter {
            let Some(task) = self.memory.pop_new_task() else {
                break;
            };
            if task.is_input() || self.memory.term_to_concept(task.content()).is_some() {
                self.memory.immediate_process(task, &mut self.inference);
                continue;
            }
            if let Some(gate) = creation_expectation {
                let expectation = match (task.sentence().is_judgment(), task.sentence().truth) {
                    (true, Some(truth)) => truth.expectation(),
                    _ => 0.0,
                };
                if expectation <= gate {
                    tracing::debug!(task = task.key(), expectation, "neglected");
                    continue;
                }
            }
            if let Some(rejected) = self.memory.novel_tasks_mut().put_in(task) {
                tracing::debug!(task = rejected.key(), "novel task dropped");
            }
        }
    }

    /// Process one task from the novel-task bag. Returns whether there was one.
    pub fn process_novel_task(&mut self) -> bool {
        let Some(task) = self.memory.novel_tasks_mut().take_out() else {
            return false;
        };
        self.memory.immediate_process(task, &mut self.inference);
        true
    }

    /// Draw one concept, put it back, and fire it. Returns whether a concept
    /// was fired.
    pub fn fire_concept(&mut self) -> bool {
        let Some(concept) = self.memory.concepts_mut().take_out() else {
            return false;
        };
        let key = concept.key().to_string();
        if let Some(lost) = self.memory.concepts_mut().put_back(concept) {
            tracing::debug!(concept = lost.key(), "concept forgotten");
        }
        self.memory.fire(&key, &mut self.inference);
        true
    }

    pub fn drain_reports(&mut self) -> Vec<Report> {
        self.memory.drain_reports()
    }

    pub fn set_forget_rate(&mut self, role: BagRole, rate: f32) -> Result<(), ConfigError> {
        self.memory.set_forget_rate(role, rate)
    }

    pub fn reset(&mut self) {
        self.memory.reset();
    }
}
