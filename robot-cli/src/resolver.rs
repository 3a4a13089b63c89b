//! Track resolution and the `set track` verb
//!
//! A user token is bound to the id-or-name template and searched. Exactly
//! one match resolves the token; a second match stops the stream at once
//! with an ambiguity error and nothing is updated.

use crate::search::search;
use crate::store::{RemoteStore, TrackUpdate, Visit};
use robot_common::models::Track;
use robot_common::{id_or_name, Error, Result};
use tracing::{debug, info};

/// Field values for a track update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub head: Option<String>,
}

/// Resolution state for one token
#[derive(Debug)]
pub enum Resolution {
    /// Stream still open, nothing matched yet
    Unresolved,
    /// Exactly one match so far
    Resolved(Track),
}

/// Search visitor enforcing the single-match rule
#[derive(Debug)]
pub struct TrackMatcher {
    token: String,
    state: Resolution,
}

impl TrackMatcher {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            state: Resolution::Unresolved,
        }
    }

    /// Record one match; a second one is an ambiguity
    pub fn visit(&mut self, track: Track) -> Visit {
        match self.state {
            Resolution::Unresolved => {
                self.state = Resolution::Resolved(track);
                Visit::Continue
            }
            Resolution::Resolved(_) => Visit::Stop(Error::Ambiguous(self.token.clone())),
        }
    }

    /// Outcome once the stream has ended cleanly
    pub fn finish(self) -> Result<Track> {
        match self.state {
            Resolution::Resolved(track) => Ok(track),
            Resolution::Unresolved => Err(Error::NotFound(self.token)),
        }
    }
}

/// Find the single track whose id or name equals `token`
pub async fn resolve_track(store: &dyn RemoteStore, token: &str) -> Result<Track> {
    let query = id_or_name(token);
    let mut matcher = TrackMatcher::new(token);
    search::<Track, _>(store, &query, |track| matcher.visit(track)).await?;
    let track = matcher.finish()?;
    debug!("Resolved {:?} to track {}", token, track.id);
    Ok(track)
}

/// Apply `fields` to the track named by `token`
///
/// Without a token the update carries no id and the server decides what to
/// do with it (normally it creates a track).
pub async fn set_track(store: &dyn RemoteStore, token: Option<&str>, fields: &TrackFields) -> Result<Track> {
    let id = match token {
        Some(token) => resolve_track(store, token).await?.id,
        None => String::new(),
    };

    let update = TrackUpdate {
        id,
        name: fields.name.clone(),
        description: fields.description.clone(),
        head: fields.head.clone(),
    };
    let track = store.update_track(&update).await?;
    info!("Updated track {}", track.id);
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_matcher_single_match_resolves() {
        let mut matcher = TrackMatcher::new("alpha");
        assert!(matches!(matcher.visit(track("t1")), Visit::Continue));
        assert_eq!(matcher.finish().unwrap().id, "t1");
    }

    #[test]
    fn test_matcher_second_match_stops() {
        let mut matcher = TrackMatcher::new("dup");
        matcher.visit(track("t1"));
        match matcher.visit(track("t2")) {
            Visit::Stop(Error::Ambiguous(token)) => assert_eq!(token, "dup"),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_matcher_no_match_is_not_found() {
        let matcher = TrackMatcher::new("beta");
        assert!(matches!(matcher.finish(), Err(Error::NotFound(t)) if t == "beta"));
    }
}
