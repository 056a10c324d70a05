//! # intelligence::lesson
//!
//! A generated lesson consumed one step at a time. Forward only: there is no
//! rewind, and once the last step has been advanced past the cursor stays
//! complete.

use serde::Serialize;

use super::{Lesson, LessonStep};

/// Where the student is in a lesson.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LessonProgress {
    Step {
        topic: String,
        index: usize,
        total: usize,
        step:  LessonStep,
    },
    Complete {
        topic: String,
    },
}

#[derive(Debug, Clone)]
pub struct LessonCursor {
    lesson: Lesson,
    index:  usize,
}

impl LessonCursor {
    pub fn new(lesson: Lesson) -> Self {
        Self { lesson, index: 0 }
    }

    pub fn topic(&self) -> &str {
        &self.lesson.topic
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.lesson.steps.len()
    }

    pub fn current(&self) -> LessonProgress {
        match self.lesson.steps.get(self.index) {
            Some(step) => LessonProgress::Step {
                topic: self.lesson.topic.clone(),
                index: self.index,
                total: self.lesson.steps.len(),
                step:  step.clone(),
            },
            None => LessonProgress::Complete { topic: self.lesson.topic.clone() },
        }
    }

    /// Move to the next step. Advancing from the last step completes the
    /// lesson; advancing again stays complete.
    pub fn advance(&mut self) -> LessonProgress {
        if !self.is_complete() {
            self.index += 1;
        }
        self.current()
    }
}
