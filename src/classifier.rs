//! Email Intent Classifier
//!
//! Maps an inbound email body to the kind of task it asks for:
//! - Meeting: "can we meet / call / discuss ..."
//! - Summary: "send me a summary / report"
//! - Analysis: "analyze / review ..."

use crate::models::{EmailIntent, IntentMatch};

/// Rules are checked in order; first hit wins
const RULES: &[(&[&str], EmailIntent, f32)] = &[
    (&["meet", "call", "discuss"], EmailIntent::Meeting, 0.9),
    (&["summary", "report"], EmailIntent::Summary, 0.85),
    (&["analyze", "review"], EmailIntent::Analysis, 0.8),
];

const UNKNOWN_CONFIDENCE: f32 = 0.5;

pub struct IntentClassifier;

impl IntentClassifier {
    pub fn classify(email_body: &str) -> IntentMatch {
        let body = email_body.to_lowercase();

        RULES
            .iter()
            .find(|(keywords, _, _)| keywords.iter().any(|kw| body.contains(kw)))
            .map(|(_, intent, confidence)| IntentMatch {
                intent: *intent,
                confidence: *confidence,
            })
            .unwrap_or(IntentMatch {
                intent: EmailIntent::Unknown,
                confidence: UNKNOWN_CONFIDENCE,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meeting_requests() {
        let cases = vec![
            "Can we meet on Friday?",
            "Let's CALL about the budget",
            "I'd like to discuss runway",
        ];

        for c in cases {
            let m = IntentClassifier::classify(c);
            assert_eq!(m.intent, EmailIntent::Meeting, "{}", c);
            assert_eq!(m.confidence, 0.9);
        }
    }

    #[test]
    fn test_summary_and_analysis() {
        assert_eq!(
            IntentClassifier::classify("Send the monthly report").intent,
            EmailIntent::Summary
        );
        assert_eq!(
            IntentClassifier::classify("Please analyze Q3 spend").intent,
            EmailIntent::Analysis
        );
    }

    #[test]
    fn test_rule_order() {
        // "review" would be analysis, but "discuss" is checked first
        let m = IntentClassifier::classify("discuss and review the summary");
        assert_eq!(m.intent, EmailIntent::Meeting);
    }

    #[test]
    fn test_unknown() {
        let m = IntentClassifier::classify("hello there");
        assert_eq!(m.intent, EmailIntent::Unknown);
        assert_eq!(m.confidence, 0.5);
    }
}
