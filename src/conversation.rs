//! Conversation transcripts exchanged with the model.
//!
//! A transcript is an ordered list of role-tagged turns. An assistant turn that
//! requests tools must be answered by one tool turn per call id before the
//! model sees the transcript again; [`Transcript::check_ready`] enforces that.

use crate::error::{ColloquyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Call identifier, echoed back on the tool turn.
    pub id: String,
    /// Tool name as the model spelled it.
    pub name: String,
    /// Raw JSON arguments.
    pub arguments: String,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Turn {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocation>,
    },
    Tool {
        call_id: String,
        content: String,
    },
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Turn::System { content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Turn::User { content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Turn::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Assistant turn that only carries tool calls.
    pub fn tool_request(tool_calls: Vec<ToolInvocation>) -> Self {
        Turn::Assistant {
            content: None,
            tool_calls,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Turn::Tool {
            call_id: call_id.into(),
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Turn::System { .. } => Role::System,
            Turn::User { .. } => Role::User,
            Turn::Assistant { .. } => Role::Assistant,
            Turn::Tool { .. } => Role::Tool,
        }
    }

    /// Text content of the turn, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Turn::System { content } | Turn::User { content } | Turn::Tool { content, .. } => {
                Some(content)
            }
            Turn::Assistant { content, .. } => content.as_deref(),
        }
    }
}

/// How much history a session keeps between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPolicy {
    /// Keep every turn; the transcript grows for the whole session.
    #[default]
    Unbounded,
    /// Keep only the newest `n` turns.
    KeepLast(usize),
}

impl HistoryPolicy {
    /// Build a policy from a configured turn count; 0 means unbounded.
    pub fn from_max_turns(max_turns: usize) -> Self {
        if max_turns == 0 {
            HistoryPolicy::Unbounded
        } else {
            HistoryPolicy::KeepLast(max_turns)
        }
    }

    /// Drop old turns according to the policy. Returns how many were removed.
    ///
    /// The kept window never starts with a tool turn, since its matching
    /// request would be gone.
    pub fn apply(&self, turns: &mut Vec<Turn>) -> usize {
        let HistoryPolicy::KeepLast(max) = *self else {
            return 0;
        };

        let before = turns.len();
        if turns.len() > max {
            turns.drain(..turns.len() - max);
        }
        let orphans = turns
            .iter()
            .take_while(|t| t.role() == Role::Tool)
            .count();
        turns.drain(..orphans);
        before - turns.len()
    }
}

/// Ordered list of turns sent to the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript with a system prompt. An empty prompt adds nothing.
    pub fn with_system(prompt: &str) -> Self {
        let mut transcript = Self::new();
        if !prompt.trim().is_empty() {
            transcript.push(Turn::system(prompt));
        }
        transcript
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn extend(&mut self, turns: impl IntoIterator<Item = Turn>) {
        self.turns.extend(turns);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Remove everything except leading system turns.
    pub fn clear_history(&mut self) {
        let keep = self
            .turns
            .iter()
            .take_while(|t| t.role() == Role::System)
            .count();
        self.turns.truncate(keep);
    }

    /// Apply a history policy to the non-system part of the transcript.
    pub fn trim(&mut self, policy: HistoryPolicy) -> usize {
        let keep = self
            .turns
            .iter()
            .take_while(|t| t.role() == Role::System)
            .count();
        let mut history = self.turns.split_off(keep);
        let removed = policy.apply(&mut history);
        self.turns.extend(history);
        removed
    }

    /// Verify the transcript can be sent to the model: every requested tool
    /// call has exactly one result, and results directly follow their request.
    pub fn check_ready(&self) -> Result<()> {
        let mut pending: HashSet<&str> = HashSet::new();

        for (index, turn) in self.turns.iter().enumerate() {
            match turn {
                Turn::Tool { call_id, .. } => {
                    if !pending.remove(call_id.as_str()) {
                        return Err(ColloquyError::Transcript(format!(
                            "tool result at position {} answers unknown call id '{}'",
                            index, call_id
                        )));
                    }
                }
                other => {
                    if !pending.is_empty() {
                        return Err(ColloquyError::Transcript(format!(
                            "{} turn at position {} arrives before results for tool calls: {}",
                            other.role(),
                            index,
                            sorted(&pending).join(", ")
                        )));
                    }
                    if let Turn::Assistant { tool_calls, .. } = other {
                        pending.extend(tool_calls.iter().map(|c| c.id.as_str()));
                    }
                }
            }
        }

        if !pending.is_empty() {
            return Err(ColloquyError::Transcript(format!(
                "missing results for tool calls: {}",
                sorted(&pending).join(", ")
            )));
        }

        Ok(())
    }
}

fn sorted<'a>(ids: &HashSet<&'a str>) -> Vec<&'a str> {
    let mut ids: Vec<&str> = ids.iter().copied().collect();
    ids.sort_unstable();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str) -> ToolInvocation {
        ToolInvocation {
            id: id.to_string(),
            name: "search_web".to_string(),
            arguments: r#"{"query":"rust"}"#.to_string(),
        }
    }

    #[test]
    fn test_ready_with_matched_tool_results() {
        let mut t = Transcript::with_system("sys");
        t.push(Turn::user("hi"));
        t.push(Turn::tool_request(vec![call("a"), call("b")]));
        t.push(Turn::tool_result("b", "two"));
        t.push(Turn::tool_result("a", "one"));
        assert!(t.check_ready().is_ok());
    }

    #[test]
    fn test_missing_tool_result_is_rejected() {
        let mut t = Transcript::new();
        t.push(Turn::user("hi"));
        t.push(Turn::tool_request(vec![call("call_1")]));
        let err = t.check_ready().unwrap_err();
        assert!(err.to_string().contains("call_1"));
    }

    #[test]
    fn test_interleaved_turn_is_rejected() {
        let mut t = Transcript::new();
        t.push(Turn::tool_request(vec![call("call_1")]));
        t.push(Turn::user("wait"));
        t.push(Turn::tool_result("call_1", "late"));
        assert!(matches!(t.check_ready(), Err(ColloquyError::Transcript(_))));
    }

    #[test]
    fn test_mismatched_call_id_is_rejected() {
        let mut t = Transcript::new();
        t.push(Turn::tool_request(vec![call("call_1")]));
        t.push(Turn::tool_result("call_2", "wrong"));
        assert!(t.check_ready().is_err());
    }

    #[test]
    fn test_keep_last_drops_orphaned_tool_turns() {
        let mut turns = vec![
            Turn::user("q1"),
            Turn::tool_request(vec![call("x")]),
            Turn::tool_result("x", "r"),
            Turn::assistant("a1"),
            Turn::user("q2"),
            Turn::assistant("a2"),
        ];
        let removed = HistoryPolicy::KeepLast(4).apply(&mut turns);
        assert_eq!(removed, 3);
        assert_eq!(turns.first(), Some(&Turn::assistant("a1")));
        assert_eq!(turns.len(), 3);
    }

    #[test]
    fn test_unbounded_keeps_everything() {
        let mut turns: Vec<Turn> = (0..50).map(|i| Turn::user(format!("q{i}"))).collect();
        assert_eq!(HistoryPolicy::from_max_turns(0).apply(&mut turns), 0);
        assert_eq!(turns.len(), 50);
    }

    #[test]
    fn test_trim_and_clear_keep_system_prompt() {
        let mut t = Transcript::with_system("sys");
        for i in 0..10 {
            t.push(Turn::user(format!("q{i}")));
            t.push(Turn::assistant(format!("a{i}")));
        }
        t.trim(HistoryPolicy::KeepLast(4));
        assert_eq!(t.len(), 5);
        assert_eq!(t.turns()[0], Turn::system("sys"));
        assert_eq!(t.turns()[1], Turn::user("q8"));

        t.clear_history();
        assert_eq!(t.turns(), &[Turn::system("sys")]);
    }

    #[test]
    fn test_empty_system_prompt_is_skipped() {
        assert!(Transcript::with_system("  ").is_empty());
    }
}
