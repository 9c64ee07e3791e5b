use voicecart_core::conversation::SimpleResponse;
use voicecart_core::{FlowEvent, HandlerError, HandlerOutcome, TurnContext};

pub const WELCOME_SPEECH: &str = "Hey there! I can help you go through a transaction with \
Google Pay and Merchant-managed payments.";
pub const WELCOME_TEXT: &str = "Hi there! I can help you go through a transaction with \
Google Pay and Merchant-managed payments.";

pub fn welcome(_turn: &TurnContext<'_>) -> Result<HandlerOutcome, HandlerError> {
    Ok(HandlerOutcome::new(FlowEvent::Welcomed)
        .prompt(SimpleResponse::new(WELCOME_SPEECH).with_display_text(WELCOME_TEXT))
        .suggest(["Merchant Transaction", "Google Pay Transaction"]))
}

#[cfg(test)]
mod tests {
    use voicecart_core::conversation::ResponseDirective;
    use voicecart_core::flows::FlowState;
    use voicecart_core::{FlowEvent, Request, TurnContext};

    use super::welcome;

    #[test]
    fn greeting_speech_and_text_differ() {
        let request = Request::new("s-1", "Default Welcome Intent");
        let outcome = welcome(&TurnContext::new(&request, FlowState::Start)).expect("welcome");

        assert_eq!(outcome.event, FlowEvent::Welcomed);
        let ResponseDirective::SpeechPrompt(prompt) = &outcome.directives[0] else {
            panic!("first directive should be a prompt");
        };
        assert!(prompt.speech.starts_with("Hey there!"));
        assert_eq!(prompt.display_text.as_deref().map(|text| text.starts_with("Hi there!")), Some(true));
        assert_eq!(
            outcome.directives[1],
            ResponseDirective::SuggestionChips {
                chips: vec!["Merchant Transaction".to_owned(), "Google Pay Transaction".to_owned()]
            }
        );
    }
}
