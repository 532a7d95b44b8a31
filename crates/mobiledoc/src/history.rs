// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Undo/redo history over serialized snapshots.
//!
//! Each snapshot captures the whole document as Mobiledoc plus the
//! selection, recorded by leaf section index since section identity does
//! not survive serialization. A pending snapshot is promoted to the undo
//! stack when the next snapshot does not group with it (same edit action,
//! within the grouping window); the undo stack is a fixed-capacity ring
//! that evicts its oldest entry.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde_json::Value;
use strum_macros::{AsRefStr, Display};
use tracing::debug;

use crate::codec::{render, MobiledocVersion};
use crate::cursor::{Position, Range};
use crate::post::Post;

/// Tag describing what kind of edit produced a snapshot; snapshots with
/// the same tag group into one undo step when close enough in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
pub enum EditAction {
    InsertText,
    Delete,
}

/// A selection recorded against leaf section indexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotRange {
    pub head: (usize, usize),
    pub tail: (usize, usize),
}

/// An immutable capture of the document and selection at one instant.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub taken_at: Instant,
    pub mobiledoc: Value,
    pub range: Option<SnapshotRange>,
    pub action: Option<EditAction>,
}

impl Snapshot {
    pub fn capture(
        post: &Post,
        range: &Range,
        action: Option<EditAction>,
        taken_at: Instant,
        version: MobiledocVersion,
    ) -> Self {
        let snapshot_range = match (range.head.parts(), range.tail.parts()) {
            (Some((head_section, head_offset)), Some((tail_section, tail_offset))) => {
                match (
                    post.leaf_index(head_section),
                    post.leaf_index(tail_section),
                ) {
                    (Some(head_index), Some(tail_index)) => Some(SnapshotRange {
                        head: (head_index, head_offset),
                        tail: (tail_index, tail_offset),
                    }),
                    _ => None,
                }
            }
            _ => None,
        };
        Self {
            taken_at,
            mobiledoc: render(post, version),
            range: snapshot_range,
            action,
        }
    }

    /// Re-resolve the recorded selection against a freshly parsed post,
    /// clamping to valid leaf indexes and offsets.
    pub fn resolve_range(&self, post: &Post) -> Range {
        let Some(range) = &self.range else {
            return post.head_position().to_range();
        };
        let resolve = |(index, offset): (usize, usize)| -> Position {
            match post.leaf_at_index(index) {
                Some(leaf) => Position::at(leaf, offset.min(post.leaf_len(leaf))),
                None => post.tail_position(),
            }
        };
        Range::new(resolve(range.head), resolve(range.tail))
    }

    /// Whether a snapshot taken at `at` with `action` belongs to the same
    /// undo group as this one.
    fn groups_with(
        &self,
        at: Instant,
        action: Option<EditAction>,
        window: Duration,
    ) -> bool {
        action.is_some()
            && self.action == action
            && at.saturating_duration_since(self.taken_at) <= window
    }
}

/// Undo/redo stacks plus the pending snapshot of the current edit group.
pub struct EditHistory {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    pending: Option<Snapshot>,
    depth: usize,
    group_within: Duration,
}

impl EditHistory {
    pub fn new(depth: usize, group_within: Duration) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            pending: None,
            depth,
            group_within,
        }
    }

    pub fn has_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn has_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Store a snapshot taken just before an edit. A pending snapshot
    /// that groups with the new one is kept, so undoing the group
    /// reverts to the state where it began; otherwise the pending one is
    /// promoted to the undo stack and the new snapshot takes its place.
    /// The redo stack clears whenever an edit supersedes it.
    pub fn store(&mut self, snapshot: Snapshot) {
        match self.pending.take() {
            Some(pending)
                if pending.groups_with(
                    snapshot.taken_at,
                    snapshot.action,
                    self.group_within,
                ) =>
            {
                debug!("snapshot grouped with pending edit");
                self.pending = Some(pending);
            }
            Some(pending) => {
                self.push_undo(pending);
                self.pending = Some(snapshot);
            }
            None => self.pending = Some(snapshot),
        }
        self.redo_stack.clear();
    }

    /// Drop the pending snapshot, so a cancelled transaction leaves no
    /// trace.
    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// Pop an undo entry, pushing `current` onto the redo stack. A
    /// pending snapshot is promoted first, so the most recent edit is
    /// the first thing undone.
    pub fn step_backward(&mut self, current: Snapshot) -> Option<Snapshot> {
        if let Some(pending) = self.pending.take() {
            self.push_undo(pending);
        }
        let snapshot = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(current);
        Some(snapshot)
    }

    /// Pop a redo entry, pushing `current` onto the undo stack.
    pub fn step_forward(&mut self, current: Snapshot) -> Option<Snapshot> {
        self.pending = None;
        let snapshot = self.redo_stack.pop_back()?;
        self.push_undo(current);
        Some(snapshot)
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        if self.undo_stack.len() == self.depth {
            self.undo_stack.pop_front();
            debug!("undo ring evicted its oldest snapshot");
        }
        self.undo_stack.push_back(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::{Marker, Markerable, MarkupSection, Section, SectionTag};

    fn post_with_text(text: &str) -> Post {
        let mut post = Post::new();
        post.sections_mut().append(Section::Markup(MarkupSection::new(
            SectionTag::P,
            Markerable::from_markers(vec![Marker::text(text, vec![])]),
        )));
        post
    }

    fn snapshot_at(
        text: &str,
        action: Option<EditAction>,
        taken_at: Instant,
    ) -> Snapshot {
        let post = post_with_text(text);
        let range = post.head_position().to_range();
        Snapshot::capture(&post, &range, action, taken_at, MobiledocVersion::V0_3_2)
    }

    fn history() -> EditHistory {
        EditHistory::new(10, Duration::from_millis(100))
    }

    #[test]
    fn first_snapshot_only_becomes_pending() {
        let mut history = history();
        history.store(snapshot_at("a", None, Instant::now()));
        assert!(!history.has_undo());
    }

    #[test]
    fn non_grouping_snapshot_promotes_the_pending_one() {
        let mut history = history();
        let t0 = Instant::now();
        history.store(snapshot_at("", Some(EditAction::InsertText), t0));
        history.store(snapshot_at(
            "a",
            Some(EditAction::Delete),
            t0 + Duration::from_millis(10),
        ));
        assert!(history.has_undo());
    }

    #[test]
    fn same_action_within_the_window_groups() {
        let mut history = history();
        let t0 = Instant::now();
        history.store(snapshot_at("", Some(EditAction::InsertText), t0));
        history.store(snapshot_at(
            "a",
            Some(EditAction::InsertText),
            t0 + Duration::from_millis(10),
        ));
        assert!(!history.has_undo());
    }

    #[test]
    fn same_action_outside_the_window_does_not_group() {
        let mut history = history();
        let t0 = Instant::now();
        history.store(snapshot_at("", Some(EditAction::InsertText), t0));
        history.store(snapshot_at(
            "a",
            Some(EditAction::InsertText),
            t0 + Duration::from_millis(500),
        ));
        assert!(history.has_undo());
    }

    #[test]
    fn actionless_snapshots_never_group() {
        let mut history = history();
        let t0 = Instant::now();
        history.store(snapshot_at("", None, t0));
        history.store(snapshot_at("a", None, t0 + Duration::from_millis(1)));
        assert!(history.has_undo());
    }

    #[test]
    fn a_new_edit_clears_the_redo_stack() {
        let mut history = history();
        let t0 = Instant::now();
        history.store(snapshot_at("", None, t0));
        history.store(snapshot_at("a", None, t0 + Duration::from_millis(1)));
        history
            .step_backward(snapshot_at("ab", None, t0 + Duration::from_millis(2)))
            .unwrap();
        assert!(history.has_redo());
        history.store(snapshot_at("c", None, t0 + Duration::from_millis(3)));
        history.store(snapshot_at("cd", None, t0 + Duration::from_millis(4)));
        assert!(!history.has_redo());
    }

    #[test]
    fn step_backward_on_an_empty_stack_is_a_noop() {
        let mut history = history();
        assert!(history
            .step_backward(snapshot_at("a", None, Instant::now()))
            .is_none());
        assert!(!history.has_redo());
    }

    #[test]
    fn stepping_back_and_forward_round_trips() {
        let mut history = history();
        let t0 = Instant::now();
        history.store(snapshot_at("", None, t0));
        history.store(snapshot_at("a", None, t0 + Duration::from_millis(1)));
        let undone = history
            .step_backward(snapshot_at("a", None, t0 + Duration::from_millis(2)))
            .unwrap();
        let redone = history
            .step_forward(undone.clone())
            .unwrap();
        assert_eq!(undone.mobiledoc["sections"], redone.mobiledoc["sections"]);
        assert!(history.has_undo());
        assert!(!history.has_redo());
    }

    #[test]
    fn the_undo_ring_evicts_its_oldest_entry() {
        let mut history = EditHistory::new(2, Duration::from_millis(0));
        let t0 = Instant::now();
        for (index, text) in ["a", "b", "c", "d"].iter().enumerate() {
            history.store(snapshot_at(
                text,
                None,
                t0 + Duration::from_millis(index as u64),
            ));
        }
        // Three snapshots were promoted; the ring holds the last two.
        assert_eq!(history.undo_stack.len(), 2);
    }

    #[test]
    fn cancel_pending_leaves_no_trace() {
        let mut history = history();
        history.store(snapshot_at("a", None, Instant::now()));
        history.cancel_pending();
        history.store(snapshot_at("b", None, Instant::now()));
        assert!(!history.has_undo());
    }

    #[test]
    fn resolve_range_clamps_to_the_new_post() {
        let post = post_with_text("abc");
        let range = post.tail_position().to_range();
        let snapshot = Snapshot::capture(
            &post,
            &range,
            None,
            Instant::now(),
            MobiledocVersion::V0_3_2,
        );
        let shorter = post_with_text("a");
        let resolved = snapshot.resolve_range(&shorter);
        assert_eq!(resolved.head.offset(), 1);
    }
}
