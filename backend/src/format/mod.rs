//! Example Formatter
//!
//! Renders a labeled `Scenario` into the three-turn conversation record:
//!
//! - system: fixed guardrail instruction
//! - user: tool call, ruleset and (when present) call history / session
//!   context, in a fixed YAML-like layout
//! - assistant: the JSON-encoded `Decision`
//!
//! Embedded JSON (lists, history arguments, the assistant turn) uses `", "`
//! and `": "` separators.

use crate::models::{Decision, Example};
use crate::policy::{CallHistoryEntry, Condition, Rule, RulePredicate, ToolCall};
use crate::scenarios::Scenario;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::io;

/// Instruction shared by every example
pub const SYSTEM_PROMPT: &str = "You are a security guardrail for AI agent tool calls. You receive a tool call and a ruleset defining security policies.
Evaluate whether the tool call violates any rules in the ruleset.
Respond with JSON only:
{\"pass_weight\": <float 0-1>, \"block_weight\": <float 0-1>, \"decision\": \"<pass|block>\", \"reasoning\": \"<brief explanation>\"}";

// ============================================================================
// JSON LAYOUT
// ============================================================================

/// Single-line JSON with a space after every `,` and `:`
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Serialize with `SpacedFormatter`
pub fn to_spaced_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Scalar or structured value as it appears after `key: `
///
/// Strings are double-quoted verbatim, lists and objects are spaced JSON.
fn render_value(value: &Value) -> Result<String, serde_json::Error> {
    Ok(match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => to_spaced_json(value)?,
    })
}

// ============================================================================
// SECTIONS
// ============================================================================

fn render_tool_call(out: &mut String, call: &ToolCall) -> Result<(), serde_json::Error> {
    out.push_str("TOOL CALL:\n");
    out.push_str(&format!("tool: {}\n", call.tool));
    out.push_str("arguments:\n");
    for (key, value) in &call.arguments {
        out.push_str(&format!("  {}: {}\n", key, render_value(value)?));
    }
    Ok(())
}

fn render_condition(
    out: &mut String,
    condition: &Condition,
    first_line: &str,
    indent: &str,
) -> Result<(), serde_json::Error> {
    out.push_str(&format!("{}field: {}\n", first_line, condition.field));
    out.push_str(&format!("{}operator: {}\n", indent, condition.operator.as_str()));
    out.push_str(&format!("{}value: {}\n", indent, render_value(&condition.value)?));
    Ok(())
}

fn render_rule(out: &mut String, rule: &Rule) -> Result<(), serde_json::Error> {
    out.push_str(&format!("- id: {}\n", rule.id));
    out.push_str(&format!("  name: {}\n", rule.name));
    out.push_str(&format!("  enabled: {}\n", rule.enabled));
    out.push_str(&format!("  severity: {}\n", rule.severity.as_str()));
    out.push_str(&format!("  action: {}\n", rule.action.as_str()));
    out.push_str(&format!("  tools: {}\n", to_spaced_json(&rule.tools)?));

    match &rule.predicate {
        RulePredicate::Conditions(conditions) if conditions.is_empty() => {
            out.push_str("  conditions: []\n");
        }
        RulePredicate::Conditions(conditions) => {
            out.push_str("  conditions:\n");
            for condition in conditions {
                render_condition(out, condition, "    - ", "      ")?;
            }
        }
        RulePredicate::ConditionGroups(groups) => {
            out.push_str("  condition_groups:\n");
            for group in groups {
                for (i, condition) in group.conditions().iter().enumerate() {
                    let first_line = if i == 0 { "    - - " } else { "      - " };
                    render_condition(out, condition, first_line, "        ")?;
                }
            }
        }
    }
    Ok(())
}

fn render_history(out: &mut String, history: &[CallHistoryEntry]) -> Result<(), serde_json::Error> {
    out.push_str("\nCALL HISTORY:\n");
    for entry in history {
        out.push_str(&format!("- tool: {}\n", entry.tool));
        out.push_str(&format!("  arguments: {}\n", to_spaced_json(&entry.arguments)?));
        out.push_str(&format!("  allowed: {}\n", entry.allowed));
        out.push_str(&format!("  timestamp: \"{}\"\n", entry.timestamp));
    }
    Ok(())
}

fn render_context(out: &mut String, context: &Map<String, Value>) -> Result<(), serde_json::Error> {
    out.push_str("\nCONTEXT:\n");
    for (key, value) in context {
        out.push_str(&format!("  {}: {}\n", key, render_value(value)?));
    }
    Ok(())
}

/// User turn: tool call, rules, then optional history and context
pub fn render_user_turn(scenario: &Scenario) -> Result<String, serde_json::Error> {
    let mut out = String::with_capacity(1024);
    render_tool_call(&mut out, &scenario.tool_call)?;

    out.push_str("\nRULES:\n");
    for rule in &scenario.rules {
        render_rule(&mut out, rule)?;
    }

    if !scenario.call_history.is_empty() {
        render_history(&mut out, &scenario.call_history)?;
    }
    if !scenario.context.is_empty() {
        render_context(&mut out, &scenario.context)?;
    }

    Ok(out.trim().to_string())
}

/// Assistant turn
pub fn render_decision(decision: &Decision) -> Result<String, serde_json::Error> {
    to_spaced_json(decision)
}

pub fn format_example(scenario: &Scenario) -> Result<Example, serde_json::Error> {
    Ok(Example::new(
        SYSTEM_PROMPT.to_string(),
        render_user_turn(scenario)?,
        render_decision(&scenario.decision)?,
    ))
}
