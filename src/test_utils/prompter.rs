use std::collections::VecDeque;

use crate::error::{HubError, Result};
use crate::prompt::{Prompter, CANCELLED};

/// A queued answer for [`ScriptedPrompter`].
#[derive(Debug, Clone)]
pub enum Answer {
    Text(String),
    Select(Option<String>),
    Confirm(bool),
    /// The user pressed Ctrl-C on whatever was asked.
    Interrupt,
}

/// Prompter that replays queued answers in order and records every question.
///
/// Running out of answers, or getting a different kind of question than the
/// next answer, is a validation error so the test fails with the prompt text.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, answer: impl Into<String>) -> Self {
        self.answers.push_back(Answer::Text(answer.into()));
        self
    }

    #[must_use]
    pub fn select(mut self, choice: impl Into<String>) -> Self {
        self.answers.push_back(Answer::Select(Some(choice.into())));
        self
    }

    #[must_use]
    pub fn cancel_select(mut self) -> Self {
        self.answers.push_back(Answer::Select(None));
        self
    }

    #[must_use]
    pub fn confirm(mut self, answer: bool) -> Self {
        self.answers.push_back(Answer::Confirm(answer));
        self
    }

    #[must_use]
    pub fn interrupt(mut self) -> Self {
        self.answers.push_back(Answer::Interrupt);
        self
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, message: &str) -> Result<Answer> {
        self.asked.push(message.to_string());
        match self.answers.pop_front() {
            Some(Answer::Interrupt) => Err(HubError::UserAbort(CANCELLED.to_string())),
            Some(answer) => Ok(answer),
            None => Err(HubError::ValidationFailed(format!(
                "unexpected prompt: {message}"
            ))),
        }
    }
}

fn mismatch(message: &str, answer: &Answer) -> HubError {
    HubError::ValidationFailed(format!("prompt {message:?} got scripted answer {answer:?}"))
}

impl Prompter for ScriptedPrompter {
    fn text(&mut self, message: &str) -> Result<String> {
        match self.next(message)? {
            Answer::Text(text) => Ok(text),
            other => Err(mismatch(message, &other)),
        }
    }

    fn secret(&mut self, message: &str) -> Result<String> {
        Prompter::text(self, message)
    }

    fn select(&mut self, message: &str, choices: &[&str]) -> Result<Option<String>> {
        match self.next(message)? {
            Answer::Select(Some(choice)) if choices.contains(&choice.as_str()) => Ok(Some(choice)),
            Answer::Select(None) => Ok(None),
            other => Err(mismatch(message, &other)),
        }
    }

    fn confirm(&mut self, message: &str) -> Result<bool> {
        match self.next(message)? {
            Answer::Confirm(answer) => Ok(answer),
            other => Err(mismatch(message, &other)),
        }
    }
}
