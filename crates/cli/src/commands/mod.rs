pub mod config;
pub mod doctor;
pub mod simulate;
pub mod smoke;

use serde::Serialize;
use serde_json::json;

/// Why a command failed. Each class owns the process exit code it reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    ConfigValidation,
    IntentRegistration,
    TurnFailed,
    Serialization,
    SmokeFailed,
}

impl FailureClass {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::ConfigValidation => 2,
            Self::IntentRegistration => 3,
            Self::TurnFailed | Self::Serialization => 5,
            Self::SmokeFailed => 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    /// Human-readable report that always exits cleanly.
    pub fn report(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }
}

/// JSON lines for a simulated conversation: one line per played turn, then
/// an outcome line naming the command, session and turn count.
#[derive(Debug)]
pub struct Transcript {
    command: &'static str,
    session: Option<String>,
    lines: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Outcome<'a> {
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a str>,
    turns: usize,
    error_class: Option<FailureClass>,
    message: String,
}

impl Transcript {
    pub fn new(command: &'static str) -> Self {
        Self { command, session: None, lines: Vec::new() }
    }

    pub fn for_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    pub fn turns(&self) -> usize {
        self.lines.len()
    }

    pub fn record<T: Serialize>(&mut self, turn: &T) -> Result<(), serde_json::Error> {
        self.lines.push(serde_json::to_string(turn)?);
        Ok(())
    }

    pub fn finish(self, message: impl Into<String>) -> CommandResult {
        self.close(None, message.into())
    }

    pub fn fail(self, class: FailureClass, message: impl Into<String>) -> CommandResult {
        self.close(Some(class), message.into())
    }

    fn close(mut self, error_class: Option<FailureClass>, message: String) -> CommandResult {
        let outcome = Outcome {
            command: self.command,
            status: if error_class.is_some() { "error" } else { "ok" },
            session: self.session.as_deref(),
            turns: self.lines.len(),
            error_class,
            message,
        };
        let line = serde_json::to_string(&outcome).unwrap_or_else(|error| {
            json!({
                "command": self.command,
                "status": "error",
                "error_class": FailureClass::Serialization,
                "message": error.to_string(),
            })
            .to_string()
        });
        self.lines.push(line);

        CommandResult {
            exit_code: error_class.map_or(0, FailureClass::exit_code),
            output: self.lines.join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{FailureClass, Transcript};

    #[test]
    fn failure_classes_report_their_exit_codes() {
        assert_eq!(FailureClass::ConfigValidation.exit_code(), 2);
        assert_eq!(FailureClass::IntentRegistration.exit_code(), 3);
        assert_eq!(FailureClass::TurnFailed.exit_code(), 5);
        assert_eq!(FailureClass::SmokeFailed.exit_code(), 6);
    }

    #[test]
    fn transcript_ends_with_outcome_counting_recorded_turns() {
        let mut transcript = Transcript::new("simulate").for_session("sessions/s-1");
        transcript.record(&json!({ "intent": "Default Welcome Intent" })).expect("record");
        transcript.record(&json!({ "intent": "Merchant Transaction" })).expect("record");

        let result = transcript.fail(FailureClass::TurnFailed, "`Delivery Address` failed");
        let lines: Vec<&str> = result.output.lines().collect();
        let outcome: Value = serde_json::from_str(lines[2]).expect("outcome json");

        assert_eq!(result.exit_code, 5);
        assert_eq!(lines.len(), 3);
        assert_eq!(outcome["status"], "error");
        assert_eq!(outcome["error_class"], "turn_failed");
        assert_eq!(outcome["session"], "sessions/s-1");
        assert_eq!(outcome["turns"], 2);
    }

    #[test]
    fn finished_transcript_without_session_omits_it() {
        let result = Transcript::new("simulate").finish("nothing played");
        let outcome: Value = serde_json::from_str(&result.output).expect("outcome json");

        assert_eq!(result.exit_code, 0);
        assert_eq!(outcome["status"], "ok");
        assert!(outcome.get("session").is_none());
        assert!(outcome["error_class"].is_null());
    }
}
