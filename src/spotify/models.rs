use serde::Deserialize;

/// Wire shape of Spotify's `currently-playing` endpoint, reduced to the
/// fields the status formatter needs.
#[derive(Debug, Deserialize)]
pub struct CurrentlyPlayingResponse {
    pub is_playing: bool,
    pub currently_playing_type: Option<String>,
    pub item: Option<PlayingItem>,
}

#[derive(Debug, Deserialize)]
pub struct PlayingItem {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub show: Option<Show>,
}

#[derive(Debug, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Show {
    pub name: String,
    pub publisher: String,
}

/// A single point-in-time read of what a user is playing. Produced fresh
/// each poll cycle and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackSnapshot {
    Track {
        title: String,
        artists: Vec<String>,
    },
    Episode {
        title: String,
        show: String,
        publisher: String,
    },
}

impl CurrentlyPlayingResponse {
    /// Collapse the wire payload into a snapshot. Paused playback and
    /// unsupported playback types (ads, local files) read as not-playing.
    pub fn into_snapshot(self) -> Option<PlaybackSnapshot> {
        if !self.is_playing {
            return None;
        }

        let item = self.item?;
        match self.currently_playing_type.as_deref() {
            Some("track") => Some(PlaybackSnapshot::Track {
                title: item.name,
                artists: item.artists.into_iter().map(|a| a.name).collect(),
            }),
            Some("episode") => {
                let show = item.show?;
                Some(PlaybackSnapshot::Episode {
                    title: item.name,
                    show: show.name,
                    publisher: show.publisher,
                })
            }
            _ => None,
        }
    }
}
