use crate::spotify::models::PlaybackSnapshot;

/// Slack rejects status text longer than this.
pub const MAX_STATUS_CHARS: usize = 100;

/// Map a playback snapshot to the candidate status string.
///
/// Not playing (or an absent snapshot) maps to the empty string, which
/// signals "clear status" downstream. Output that would exceed Slack's
/// length limit collapses to the minimal title-only form.
pub fn format_status(snapshot: Option<&PlaybackSnapshot>) -> String {
    let Some(snapshot) = snapshot else {
        return String::new();
    };

    let title = match snapshot {
        PlaybackSnapshot::Track { title, .. } => title,
        PlaybackSnapshot::Episode { title, .. } => title,
    };

    let full = match snapshot {
        PlaybackSnapshot::Track { title, artists } => {
            let kept: Vec<&str> = artists
                .iter()
                .filter(|artist| !duplicates_title(artist, title))
                .map(String::as_str)
                .collect();

            if kept.is_empty() {
                minimal_form(title)
            } else {
                format!(
                    "Listening to \"{}\" by {} on Spotify",
                    title,
                    kept.join(", ")
                )
            }
        }
        PlaybackSnapshot::Episode {
            title,
            show,
            publisher,
        } => format!(
            "Listening to \"{}\" ({}) by {} on Spotify",
            title, show, publisher
        ),
    };

    if full.chars().count() > MAX_STATUS_CHARS {
        minimal_form(title)
    } else {
        full
    }
}

fn minimal_form(title: &str) -> String {
    format!("Listening to \"{}\" on Spotify", title)
}

// Handles "feat. X" duplication in either direction: an artist whose name
// already appears in the title, or an artist whose name embeds the title.
fn duplicates_title(artist: &str, title: &str) -> bool {
    artist.contains(title) || title.contains(artist)
}
