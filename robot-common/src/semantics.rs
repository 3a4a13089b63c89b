//! Vertex stream semantic guessing
//!
//! Captured vertex buffers often lack explicit semantics, but their stream
//! names usually hint at them ("Position0", "a_normal", "uv1"). This pass
//! labels streams by name so viewers can pick sensible defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Meaning of a vertex stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    Bitangent,
    Texcoord,
}

/// Named vertex data stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexStream {
    pub name: String,
    #[serde(default)]
    pub semantic: Option<Semantic>,
}

impl VertexStream {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            semantic: None,
        }
    }
}

/// Name patterns, ordered from highest priority to lowest
pub const SEMANTIC_PATTERNS: &[(&str, Semantic)] = &[
    ("position", Semantic::Position),
    ("normal", Semantic::Normal),
    ("tangent", Semantic::Tangent),
    ("bitangent", Semantic::Bitangent),
    ("binormal", Semantic::Bitangent),
    ("texcoord", Semantic::Texcoord),
    ("pos", Semantic::Position),
    ("uv", Semantic::Texcoord),
    ("vertex", Semantic::Position),
];

/// Label streams using the default pattern table
pub fn guess_semantics(streams: &mut [VertexStream]) {
    guess_semantics_with(SEMANTIC_PATTERNS, streams);
}

/// Label streams using `patterns`, highest priority first
///
/// Each semantic is given to at most one stream: once a rule claims a
/// semantic, later rules for the same semantic are skipped. A rule labels the
/// first stream whose name contains its pattern, even one an earlier rule
/// already labelled, so the last matching rule decides. Streams matching
/// nothing stay unlabelled.
pub fn guess_semantics_with(patterns: &[(&str, Semantic)], streams: &mut [VertexStream]) {
    let mut taken = HashSet::new();
    for (pattern, semantic) in patterns {
        if taken.contains(semantic) {
            continue;
        }
        let pattern = pattern.to_lowercase();
        let candidate = streams
            .iter_mut()
            .find(|s| s.name.to_lowercase().contains(&pattern));
        if let Some(stream) = candidate {
            stream.semantic = Some(*semantic);
            taken.insert(*semantic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streams(names: &[&str]) -> Vec<VertexStream> {
        names.iter().map(|n| VertexStream::new(*n)).collect()
    }

    #[test]
    fn test_claimed_semantic_is_not_reassigned() {
        let rules = [
            ("position", Semantic::Position),
            ("pos", Semantic::Position),
            ("vertex", Semantic::Position),
        ];
        let mut s = streams(&["Position0", "vertex_pos"]);
        guess_semantics_with(&rules, &mut s);
        assert_eq!(s[0].semantic, Some(Semantic::Position));
        assert_eq!(s[1].semantic, None);
    }

    #[test]
    fn test_default_table_labels_common_names() {
        let mut s = streams(&["a_Position", "a_Normal", "a_TexCoord0", "a_Color"]);
        guess_semantics(&mut s);
        assert_eq!(s[0].semantic, Some(Semantic::Position));
        assert_eq!(s[1].semantic, Some(Semantic::Normal));
        assert_eq!(s[2].semantic, Some(Semantic::Texcoord));
        assert_eq!(s[3].semantic, None);
    }

    #[test]
    fn test_lower_priority_pattern_used_when_higher_absent() {
        let mut s = streams(&["inPos", "inUV", "inColor"]);
        guess_semantics(&mut s);
        assert_eq!(s[0].semantic, Some(Semantic::Position));
        assert_eq!(s[1].semantic, Some(Semantic::Texcoord));
        assert_eq!(s[2].semantic, None);
    }

    #[test]
    fn test_first_stream_in_order_wins_a_rule() {
        let mut s = streams(&["uv0", "uv1"]);
        guess_semantics(&mut s);
        assert_eq!(s[0].semantic, Some(Semantic::Texcoord));
        assert_eq!(s[1].semantic, None);
    }

    #[test]
    fn test_later_rule_relabels_matching_stream() {
        // "normal" labels it first, then "pos" overwrites
        let mut s = streams(&["normal_pos", "color"]);
        guess_semantics(&mut s);
        assert_eq!(s[0].semantic, Some(Semantic::Position));
        assert_eq!(s[1].semantic, None);
    }

    #[test]
    fn test_relabelled_stream_still_shadows_later_streams() {
        let mut s = streams(&["normal_uv", "uv1"]);
        guess_semantics(&mut s);
        assert_eq!(s[0].semantic, Some(Semantic::Texcoord));
        assert_eq!(s[1].semantic, None);
    }

    #[test]
    fn test_empty_input_is_noop() {
        let mut s: Vec<VertexStream> = Vec::new();
        guess_semantics(&mut s);
        assert!(s.is_empty());
    }
}
