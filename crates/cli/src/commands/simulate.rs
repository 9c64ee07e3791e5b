use voicecart_core::config::{AppConfig, LoadOptions};
use voicecart_core::domain::payment::PaymentPath;
use voicecart_fulfillment::{scripted_transaction, ConversationSimulator, FulfillmentService};

use crate::commands::{CommandResult, FailureClass, Transcript};

#[derive(Clone, Debug)]
pub struct SimulateOptions {
    pub google_pay: bool,
    pub decline_address: bool,
    pub session: String,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            google_pay: false,
            decline_address: false,
            session: "projects/voicecart/agent/sessions/cli".to_string(),
        }
    }
}

/// One JSON line per turn, then the command outcome line.
pub fn run(options: SimulateOptions) -> CommandResult {
    let mut transcript = Transcript::new("simulate").for_session(options.session.clone());
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return transcript.fail(FailureClass::ConfigValidation, error.to_string()),
    };
    let service = match FulfillmentService::from_config(&config) {
        Ok(service) => service,
        Err(error) => return transcript.fail(FailureClass::IntentRegistration, error.to_string()),
    };

    let path = if options.google_pay { PaymentPath::GooglePay } else { PaymentPath::Merchant };
    let script = scripted_transaction(path, !options.decline_address);
    let mut simulator = ConversationSimulator::new(&service, options.session);

    for turn in &script {
        let played = match simulator.play(turn) {
            Ok(played) => played,
            Err(error) => {
                return transcript.fail(
                    FailureClass::TurnFailed,
                    format!("`{}` failed: {error}", turn.intent),
                )
            }
        };
        if let Err(error) = transcript.record(&played) {
            return transcript.fail(FailureClass::Serialization, error.to_string());
        }
        if played.closed {
            break;
        }
    }

    let final_state = simulator
        .session()
        .flow_state()
        .map(|state| state.as_str().to_string())
        .unwrap_or_else(|error| format!("unreadable ({error})"));
    let message = format!(
        "played {} turns on the {} path; final flow state `{final_state}`",
        transcript.turns(),
        path.context_name()
    );
    transcript.finish(message)
}
