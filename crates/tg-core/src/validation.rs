use crate::error::StoreError;
use crate::types::{EventType, RecordEventInput};
use chrono::{DateTime, Utc};

/// Schema validation for one event before it is appended. `last_at` is the
/// run's most recent accepted timestamp; emission order must be
/// non-decreasing within a run.
pub fn validate_event(
    input: &RecordEventInput,
    last_at: Option<DateTime<Utc>>,
) -> Result<(), StoreError> {
    if input.step_name.is_empty() {
        return invalid("step_name must not be empty");
    }

    if let Some(last) = last_at {
        if input.at < last {
            return invalid(&format!(
                "timestamp {} regresses before the run's last event at {}",
                input.at, last
            ));
        }
    }

    if let Some(duration) = input.duration_ms {
        if !duration.is_finite() || duration < 0.0 {
            return invalid("duration_ms must be finite and non-negative");
        }
    }

    match input.event_type {
        EventType::ToolCallStart | EventType::ToolCallEnd => {
            if input.tool_name.is_none() {
                return invalid("tool events require tool_name");
            }
        }
        EventType::DelegationStart | EventType::DelegationEnd => {
            if input.from_agent.is_none() || input.to_agent.is_none() {
                return invalid("delegation events require from_agent and to_agent");
            }
        }
        EventType::Error => {
            if input.error_message.is_none() {
                return invalid("error events require error_message");
            }
        }
        EventType::RunStart
        | EventType::RunEnd
        | EventType::LlmCallStart
        | EventType::LlmCallEnd => {}
    }

    if input.success == Some(false) && input.error_message.is_none() {
        return invalid("failed events require error_message");
    }

    Ok(())
}

fn invalid(message: &str) -> Result<(), StoreError> {
    Err(StoreError::InvalidEvent {
        message: message.to_string(),
    })
}
