use crate::slack::client::SlackProfile;
use regex::Regex;

/// Emoji the engine stamps on every status it writes. The guard treats
/// it as the engine's fingerprint.
pub const MARKER_EMOJI: &str = ":musical_note:";

/// Decide whether the engine may replace the user's current Slack status.
///
/// Conservative policy: only touch what we previously wrote, or what is
/// blank. The engine cannot distinguish its own writes from the user's
/// except by this emoji-and-pattern fingerprint, so a manual status that
/// happens to match the pattern is an accepted false positive.
pub fn can_overwrite(profile: &SlackProfile) -> bool {
    // An expiring status means the user (or their calendar) set it.
    if profile.status_expiration != 0 {
        return false;
    }

    if !profile.status_emoji.is_empty() && profile.status_emoji != MARKER_EMOJI {
        return false;
    }

    // Must match the vaguest shape we emit, the over-limit fallback,
    // which also recognizes the two richer forms.
    let own_format = Regex::new(r"Listening to .* on Spotify").unwrap();
    if !profile.status_text.is_empty() && !own_format.is_match(&profile.status_text) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(text: &str, emoji: &str, expiration: i64) -> SlackProfile {
        SlackProfile {
            status_text: text.to_string(),
            status_emoji: emoji.to_string(),
            status_expiration: expiration,
        }
    }

    #[test]
    fn test_blank_state_is_overwritable() {
        assert!(can_overwrite(&profile("", "", 0)));
    }

    #[test]
    fn test_own_prior_output_is_overwritable() {
        assert!(can_overwrite(&profile(
            "Listening to \"X\" on Spotify",
            ":musical_note:",
            0
        )));
    }

    #[test]
    fn test_all_three_formatter_shapes_are_recognized() {
        for text in [
            "Listening to \"Song\" by A, B on Spotify",
            "Listening to \"Episode 12\" (Some Show) by Some Network on Spotify",
            "Listening to \"Song\" on Spotify",
        ] {
            assert!(can_overwrite(&profile(text, ":musical_note:", 0)), "{}", text);
        }
    }

    #[test]
    fn test_expiring_status_always_blocks() {
        assert!(!can_overwrite(&profile(
            "Listening to \"X\" on Spotify",
            ":musical_note:",
            1_700_000_000
        )));
        assert!(!can_overwrite(&profile("", "", 1_700_000_000)));
    }

    #[test]
    fn test_foreign_emoji_blocks() {
        assert!(!can_overwrite(&profile("On vacation", ":palm_tree:", 0)));
        assert!(!can_overwrite(&profile("", ":palm_tree:", 0)));
    }

    #[test]
    fn test_foreign_text_blocks() {
        assert!(!can_overwrite(&profile("In a meeting", "", 0)));
    }

    #[test]
    fn test_marker_emoji_with_foreign_text_blocks() {
        assert!(!can_overwrite(&profile(
            "Humming to myself",
            ":musical_note:",
            0
        )));
    }
}
