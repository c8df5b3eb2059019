use crate::TerminalPrompt;

/// WHAT: Only an explicit yes grants consent
/// WHY: An empty line or anything unclear must not enable the microphone
#[test]
fn given_answers_when_parsing_then_only_yes_allows() {
    // Given/When/Then: Affirmative answers, any case and whitespace
    for yes in ["y", "Y", "yes", " YES \n"] {
        assert!(TerminalPrompt::parse_answer(yes), "{:?}", yes);
    }
    for no in ["", "\n", "n", "no", "yeah", "sure"] {
        assert!(!TerminalPrompt::parse_answer(no), "{:?}", no);
    }
}
