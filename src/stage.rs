//! In-memory model of the visual targets an animation layer drives.
//!
//! A [`Stage`] is a tree of targets. Each target carries marker strings
//! (class or `#id` style), optional text content, a layout top offset in
//! document space and a sparse property map. Queries are always scoped to
//! a root so two mounted views never see each other's targets.

use std::collections::BTreeMap;

use crate::core::{Prop, TargetId};

#[derive(Clone, Debug, Default)]
struct Node {
    markers: Vec<String>,
    parent: Option<TargetId>,
    text: String,
    top: f64,
    props: BTreeMap<Prop, f64>,
}

#[derive(Clone, Debug, Default)]
pub struct Stage {
    next_id: u64,
    nodes: BTreeMap<TargetId, Node>, // id order == document order
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    Chars,
    Lines,
}

/// Generated children of a split text target.
#[derive(Clone, Debug)]
pub struct Split {
    pub source: TargetId,
    pub kind: SplitKind,
    pub parts: Vec<TargetId>,
}

impl Split {
    /// Removes the generated parts. Safe to call any number of times.
    pub fn revert(&self, stage: &mut Stage) {
        for id in &self.parts {
            stage.remove(*id);
        }
    }
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, parent: Option<TargetId>, markers: &[&str]) -> TargetId {
        let id = TargetId(self.next_id);
        self.next_id += 1;
        let parent = parent.filter(|p| self.nodes.contains_key(p));
        self.nodes.insert(
            id,
            Node {
                markers: markers.iter().map(|m| (*m).to_string()).collect(),
                parent,
                ..Node::default()
            },
        );
        id
    }

    pub fn spawn_text(
        &mut self,
        parent: Option<TargetId>,
        markers: &[&str],
        text: impl Into<String>,
    ) -> TargetId {
        let id = self.spawn(parent, markers);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.text = text.into();
        }
        id
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn text(&self, id: TargetId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.text.as_str())
    }

    pub fn set_top(&mut self, id: TargetId, top: f64) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.top = top;
        }
    }

    /// Layout top offset of a target in document space.
    pub fn top_of(&self, id: TargetId) -> Option<f64> {
        self.nodes.get(&id).map(|n| n.top)
    }

    /// Current value, or `None` when the target does not exist.
    pub fn get(&self, id: TargetId, prop: Prop) -> Option<f64> {
        let node = self.nodes.get(&id)?;
        Some(node.props.get(&prop).copied().unwrap_or(prop.natural()))
    }

    /// Current value, falling back to the property's natural default.
    pub fn value(&self, id: TargetId, prop: Prop) -> f64 {
        self.get(id, prop).unwrap_or(prop.natural())
    }

    /// Writes a property. Returns `false` (and writes nothing) when the
    /// target is gone.
    pub fn set(&mut self, id: TargetId, prop: Prop, value: f64) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.props.insert(prop, value);
                true
            }
            None => {
                tracing::trace!(?id, ?prop, "write to missing target skipped");
                false
            }
        }
    }

    pub fn has_marker(&self, id: TargetId, marker: &str) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|n| n.markers.iter().any(|m| m == marker))
    }

    pub fn is_descendant(&self, id: TargetId, root: TargetId) -> bool {
        let mut cur = self.nodes.get(&id).and_then(|n| n.parent);
        while let Some(p) = cur {
            if p == root {
                return true;
            }
            cur = self.nodes.get(&p).and_then(|n| n.parent);
        }
        false
    }

    /// All descendants of `root` carrying `marker`, in document order.
    pub fn query(&self, root: TargetId, marker: &str) -> Vec<TargetId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.markers.iter().any(|m| m == marker))
            .map(|(id, _)| *id)
            .filter(|id| self.is_descendant(*id, root))
            .collect()
    }

    pub fn query_one(&self, root: TargetId, marker: &str) -> Option<TargetId> {
        self.query(root, marker).into_iter().next()
    }

    /// Removes a target and its whole subtree. Missing ids are ignored.
    pub fn remove(&mut self, id: TargetId) {
        if !self.nodes.contains_key(&id) {
            return;
        }
        let doomed: Vec<TargetId> = self
            .nodes
            .keys()
            .copied()
            .filter(|n| *n == id || self.is_descendant(*n, id))
            .collect();
        for n in doomed {
            self.nodes.remove(&n);
        }
    }

    /// Splits the text of `source` into one child target per visible char or
    /// per non-empty line. A missing source yields an empty split.
    pub fn split(&mut self, source: TargetId, kind: SplitKind) -> Split {
        let Some(text) = self.text(source).map(str::to_owned) else {
            tracing::debug!(?source, "split of missing target skipped");
            return Split {
                source,
                kind,
                parts: Vec::new(),
            };
        };

        let pieces: Vec<String> = match kind {
            SplitKind::Chars => text
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(String::from)
                .collect(),
            SplitKind::Lines => text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_owned)
                .collect(),
        };

        let marker = match kind {
            SplitKind::Chars => "char",
            SplitKind::Lines => "line",
        };
        let parts = pieces
            .into_iter()
            .map(|p| self.spawn_text(Some(source), &[marker], p))
            .collect();

        Split {
            source,
            kind,
            parts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (Stage, TargetId, TargetId) {
        let mut stage = Stage::new();
        let a = stage.spawn(None, &["view"]);
        let b = stage.spawn(None, &["view"]);
        stage.spawn(Some(a), &["card"]);
        stage.spawn(Some(a), &["card"]);
        stage.spawn(Some(b), &["card"]);
        (stage, a, b)
    }

    #[test]
    fn query_is_scoped_to_root() {
        let (stage, a, b) = tree();
        assert_eq!(stage.query(a, "card").len(), 2);
        assert_eq!(stage.query(b, "card").len(), 1);
    }

    #[test]
    fn writes_to_missing_targets_are_noops() {
        let mut stage = Stage::new();
        assert!(!stage.set(TargetId(99), Prop::Opacity, 0.0));
        assert_eq!(stage.get(TargetId(99), Prop::Opacity), None);
        assert_eq!(stage.value(TargetId(99), Prop::Opacity), 1.0);
    }

    #[test]
    fn remove_drops_subtree() {
        let (mut stage, a, b) = tree();
        stage.remove(a);
        assert!(!stage.contains(a));
        assert_eq!(stage.len(), 2);
        assert_eq!(stage.query(b, "card").len(), 1);
        stage.remove(a);
        assert_eq!(stage.len(), 2);
    }

    #[test]
    fn split_chars_skips_whitespace_and_reverts_once() {
        let mut stage = Stage::new();
        let h = stage.spawn_text(None, &["#text-header"], "Is it");
        let split = stage.split(h, SplitKind::Chars);
        assert_eq!(split.parts.len(), 4);
        assert_eq!(stage.text(split.parts[2]), Some("i"));
        split.revert(&mut stage);
        split.revert(&mut stage);
        assert_eq!(stage.len(), 1);
        assert_eq!(stage.text(h), Some("Is it"));
    }

    #[test]
    fn split_lines_ignores_blank_lines() {
        let mut stage = Stage::new();
        let p = stage.spawn_text(None, &["#para"], "one\n\n  two  \nthree");
        let split = stage.split(p, SplitKind::Lines);
        let texts: Vec<_> = split.parts.iter().map(|t| stage.text(*t)).collect();
        assert_eq!(texts, vec![Some("one"), Some("two"), Some("three")]);
    }
}
