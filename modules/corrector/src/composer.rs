use corrector_common::ErrorMatch;

use crate::traits::MessageComposer;

/// Two-line correction: the wrong form, then the right one.
#[derive(Debug, Clone, Default)]
pub struct TemplateComposer;

impl MessageComposer for TemplateComposer {
    fn compose(&self, error_match: &ErrorMatch) -> String {
        format!("❌ {}\n✅ {}", error_match.incorrect, error_match.correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_both_forms() {
        let msg = TemplateComposer.compose(&ErrorMatch {
            incorrect: "انشاء الله".into(),
            correct: "إن شاء الله".into(),
        });
        assert_eq!(msg, "❌ انشاء الله\n✅ إن شاء الله");
    }
}
