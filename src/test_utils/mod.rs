//! Shared test utilities for skillhub.

pub mod fixtures;
pub mod prompter;

pub use fixtures::SkillFixture;
pub use prompter::{Answer, ScriptedPrompter};
