//! Pure gate functions of the decision pipeline.

use crate::config::MatchPrecedence;
use crate::matching::Match;

use super::decision::SilentReason;

/// Reconciles a text match and an image match for the same message.
///
/// With [`MatchPrecedence::Earliest`] the image match wins unless the text match is strictly
/// older.
pub fn choose_match<'a>(
    text: Option<Match<'a>>,
    image: Option<Match<'a>>,
    precedence: MatchPrecedence,
) -> Option<Match<'a>> {
    match (text, image) {
        (Some(t), Some(i)) => match precedence {
            MatchPrecedence::PreferImage => Some(i),
            MatchPrecedence::PreferText => Some(t),
            MatchPrecedence::Earliest => {
                if t.record.timestamp < i.record.timestamp {
                    Some(t)
                } else {
                    Some(i)
                }
            }
        },
        (t, i) => i.or(t),
    }
}

pub fn sender_count_gate(count: usize, required: usize) -> Option<SilentReason> {
    (count < required).then_some(SilentReason::TooFewSenders { count, required })
}

pub fn self_repost_gate(sender_id: &str, matched_sender_id: &str) -> Option<SilentReason> {
    (sender_id == matched_sender_id).then_some(SilentReason::SelfRepost)
}

pub fn cooldown_gate(now: f64, matched_at: f64, cooldown: f64) -> Option<SilentReason> {
    let elapsed = now - matched_at;
    (elapsed < cooldown).then_some(SilentReason::Cooldown { elapsed, cooldown })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::MatchKind;
    use crate::record::Record;

    fn m(record: &Record, kind: MatchKind) -> Match<'_> {
        Match {
            index: 0,
            record,
            score: 1.0,
            kind,
        }
    }

    #[test]
    fn test_choose_match_earliest() {
        let old = Record::new("a", "a", "x", 10.0);
        let new = Record::new("b", "b", "y", 20.0);

        let chosen = choose_match(
            Some(m(&old, MatchKind::Text)),
            Some(m(&new, MatchKind::Image)),
            MatchPrecedence::Earliest,
        );
        assert_eq!(chosen.unwrap().kind, MatchKind::Text);

        let chosen = choose_match(
            Some(m(&new, MatchKind::Text)),
            Some(m(&old, MatchKind::Image)),
            MatchPrecedence::Earliest,
        );
        assert_eq!(chosen.unwrap().kind, MatchKind::Image);

        let chosen = choose_match(
            Some(m(&old, MatchKind::Text)),
            Some(m(&old, MatchKind::Image)),
            MatchPrecedence::Earliest,
        );
        assert_eq!(chosen.unwrap().kind, MatchKind::Image);
    }

    #[test]
    fn test_choose_match_fixed_precedence_and_single_side() {
        let old = Record::new("a", "a", "x", 10.0);
        let new = Record::new("b", "b", "y", 20.0);
        let chosen = choose_match(
            Some(m(&old, MatchKind::Text)),
            Some(m(&new, MatchKind::Image)),
            MatchPrecedence::PreferImage,
        );
        assert_eq!(chosen.unwrap().kind, MatchKind::Image);
        let chosen = choose_match(
            Some(m(&new, MatchKind::Text)),
            Some(m(&old, MatchKind::Image)),
            MatchPrecedence::PreferText,
        );
        assert_eq!(chosen.unwrap().kind, MatchKind::Text);

        assert_eq!(
            choose_match(Some(m(&old, MatchKind::Text)), None, MatchPrecedence::PreferImage)
                .unwrap()
                .kind,
            MatchKind::Text
        );
        assert!(choose_match(None, None, MatchPrecedence::Earliest).is_none());
    }

    #[test]
    fn test_gates() {
        assert_eq!(
            sender_count_gate(2, 3),
            Some(SilentReason::TooFewSenders { count: 2, required: 3 })
        );
        assert!(sender_count_gate(3, 3).is_none());
        assert_eq!(self_repost_gate("1", "1"), Some(SilentReason::SelfRepost));
        assert!(self_repost_gate("1", "2").is_none());
        assert!(cooldown_gate(100.0, 0.0, 3600.0).is_some());
        assert!(cooldown_gate(3600.0, 0.0, 3600.0).is_none());
    }
}
