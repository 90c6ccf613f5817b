// Guardrail Evaluation Context
//
// Builds the field namespace a condition's dotted path is resolved against:
// the tool call's arguments, the session context, and aggregates derived from
// the call history.

use crate::policy::types::{CallHistoryEntry, ToolCall};
use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Timestamp layout shared by call history entries
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Window used by `context.call_count_last_minute`
const LAST_MINUTE_SECS: i64 = 60;

/// Evaluation context for rule conditions
///
/// # Field Namespace
///
/// - `tool`: name of the tool being invoked
/// - `arguments.<path>`: dotted traversal into the call's arguments
/// - `context.<path>`: session context, layered over history aggregates:
///   - `call_count`: number of prior calls
///   - `failed_call_count`: prior calls with `allowed == false`
///   - `call_count_last_minute`: prior calls within 60s of the latest one
///   - `distinct_tools`: number of distinct tools called so far
///
/// Explicit session keys override derived aggregates. Any path that does not
/// resolve yields `null`.
#[derive(Debug, Clone)]
pub struct EvalContext {
    tool: String,
    arguments: Value,
    context: Value,
}

impl EvalContext {
    /// Create evaluation context for one tool call
    ///
    /// # Example
    ///
    /// ```rust
    /// use guardrail_corpus_core_rs::policy::{EvalContext, ToolCall};
    /// use serde_json::{json, Map};
    ///
    /// let call = ToolCall::new("get_balance").arg("account_id", "ACC-SELF-001");
    /// let context = EvalContext::build(&call, &[], &Map::new());
    ///
    /// assert_eq!(context.resolve("arguments.account_id"), json!("ACC-SELF-001"));
    /// assert_eq!(context.resolve("context.call_count_last_minute"), json!(0));
    /// assert_eq!(context.resolve("arguments.missing"), json!(null));
    /// ```
    pub fn build(
        tool_call: &ToolCall,
        call_history: &[CallHistoryEntry],
        session_context: &Map<String, Value>,
    ) -> Self {
        let mut context = history_aggregates(call_history);
        for (key, value) in session_context {
            context.insert(key.clone(), value.clone());
        }

        Self {
            tool: tool_call.tool.clone(),
            arguments: Value::Object(tool_call.arguments.clone()),
            context: Value::Object(context),
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Resolve a dotted field path, `null` when unresolved
    pub fn resolve(&self, field: &str) -> Value {
        let mut segments = field.split('.');
        let root = match segments.next() {
            Some("tool") => {
                return if segments.next().is_none() {
                    Value::String(self.tool.clone())
                } else {
                    Value::Null
                }
            }
            Some("arguments") => &self.arguments,
            Some("context") => &self.context,
            _ => return Value::Null,
        };

        let mut current = root;
        for segment in segments {
            match current.get(segment) {
                Some(next) => current = next,
                None => return Value::Null,
            }
        }
        current.clone()
    }
}

/// Parse a history timestamp
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}

fn history_aggregates(history: &[CallHistoryEntry]) -> Map<String, Value> {
    let mut fields = Map::new();

    fields.insert("call_count".to_string(), Value::from(history.len()));

    let failed = history.iter().filter(|entry| !entry.allowed).count();
    fields.insert("failed_call_count".to_string(), Value::from(failed));

    let distinct: BTreeSet<&str> = history.iter().map(|entry| entry.tool.as_str()).collect();
    fields.insert("distinct_tools".to_string(), Value::from(distinct.len()));

    let timestamps: Vec<NaiveDateTime> = history
        .iter()
        .filter_map(|entry| parse_timestamp(&entry.timestamp))
        .collect();
    let last_minute = match timestamps.iter().max() {
        Some(latest) => timestamps
            .iter()
            .filter(|ts| (*latest - **ts).num_seconds() <= LAST_MINUTE_SECS)
            .count(),
        None => 0,
    };
    fields.insert("call_count_last_minute".to_string(), Value::from(last_minute));

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(tool: &str, allowed: bool, ts: &str) -> CallHistoryEntry {
        CallHistoryEntry::new(tool, allowed, ts)
    }

    #[test]
    fn test_resolves_nested_argument_paths() {
        let call = ToolCall::new("execute_trade").arg("order", json!({"limit": {"price": 12.5}}));
        let ctx = EvalContext::build(&call, &[], &Map::new());
        assert_eq!(ctx.resolve("arguments.order.limit.price"), json!(12.5));
        assert_eq!(ctx.resolve("arguments.order.limit.missing"), Value::Null);
        assert_eq!(ctx.resolve("tool"), json!("execute_trade"));
        assert_eq!(ctx.resolve("unknown.root"), Value::Null);
    }

    #[test]
    fn test_history_aggregates() {
        let history = vec![
            entry("get_balance", true, "2024-03-01T10:00:00Z"),
            entry("transfer_funds", false, "2024-03-01T10:00:30Z"),
            entry("transfer_funds", false, "2024-03-01T10:02:00Z"),
            entry("get_balance", true, "2024-03-01T10:02:45Z"),
        ];
        let ctx = EvalContext::build(&ToolCall::new("close_account"), &history, &Map::new());

        assert_eq!(ctx.resolve("context.call_count"), json!(4));
        assert_eq!(ctx.resolve("context.failed_call_count"), json!(2));
        assert_eq!(ctx.resolve("context.distinct_tools"), json!(2));
        // Only 10:02:00 and 10:02:45 are within 60s of the latest call
        assert_eq!(ctx.resolve("context.call_count_last_minute"), json!(2));
    }

    #[test]
    fn test_session_context_overrides_aggregates() {
        let mut session = Map::new();
        session.insert("call_count_last_minute".to_string(), json!(25));
        session.insert("region".to_string(), json!("eu"));

        let ctx = EvalContext::build(&ToolCall::new("get_balance"), &[], &session);
        assert_eq!(ctx.resolve("context.call_count_last_minute"), json!(25));
        assert_eq!(ctx.resolve("context.region"), json!("eu"));
    }
}
