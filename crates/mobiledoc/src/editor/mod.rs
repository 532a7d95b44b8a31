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

//! The editing session: a [`Post`], the live selection, and the undo
//! history, mutated one transaction at a time.
//!
//! [`Editor::run`] opens a single-use [`PostEditor`] over the current
//! range, runs the caller's mutations, drains the completion queues and
//! stores the pre-edit snapshot into history. Exactly one transaction
//! can be open at a time; the borrow checker enforces that statically.

mod post_editor;

pub use post_editor::{BlockTag, PostEditor, Queue};

use std::mem;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use crate::codec::{self, MobiledocVersion};
use crate::cursor::Range;
use crate::error::ParseError;
use crate::history::{EditAction, EditHistory, Snapshot};
use crate::post::{Post, Section};

/// Session tuning. The defaults match interactive-editor expectations:
/// a hundred undo steps and a three second typing-group window.
#[derive(Clone, Copy, Debug)]
pub struct EditorOptions {
    pub undo_depth: usize,
    pub undo_group_within: Duration,
    /// Wire revision used for history snapshots and [`Editor::serialize`]
    /// without an explicit version.
    pub snapshot_version: MobiledocVersion,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            undo_depth: 100,
            undo_group_within: Duration::from_millis(3000),
            snapshot_version: MobiledocVersion::LATEST,
        }
    }
}

pub struct Editor {
    post: Post,
    range: Range,
    history: EditHistory,
    options: EditorOptions,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    /// A fresh session over a single blank paragraph, so the head
    /// position is immediately addressable.
    pub fn with_options(options: EditorOptions) -> Self {
        let mut post = Post::new();
        post.sections_mut().append(Section::blank_markup());
        Self::from_post_with_options(post, options)
    }

    pub fn from_post(post: Post) -> Self {
        Self::from_post_with_options(post, EditorOptions::default())
    }

    pub fn from_post_with_options(post: Post, options: EditorOptions) -> Self {
        let range = post.head_position().to_range();
        Self {
            post,
            range,
            history: EditHistory::new(options.undo_depth, options.undo_group_within),
            options,
        }
    }

    /// Open an editing session over a serialized Mobiledoc document.
    pub fn from_mobiledoc(doc: &Value) -> Result<Self, ParseError> {
        Ok(Self::from_post(codec::parse(doc)?))
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn has_undo(&self) -> bool {
        self.history.has_undo()
    }

    pub fn has_redo(&self) -> bool {
        self.history.has_redo()
    }

    /// Move the selection outside of a transaction.
    pub fn select(&mut self, range: Range) {
        self.range = range;
    }

    /// Run one untagged transaction; each such edit is its own undo
    /// step.
    pub fn run<T>(&mut self, mutate: impl FnOnce(&mut PostEditor) -> T) -> T {
        self.run_as(None, mutate)
    }

    /// Run one transaction tagged with `action`. Consecutive edits with
    /// the same tag inside the grouping window collapse into a single
    /// undo step (typing, repeated deletion).
    pub fn run_as<T>(
        &mut self,
        action: Option<EditAction>,
        mutate: impl FnOnce(&mut PostEditor) -> T,
    ) -> T {
        let snapshot = Snapshot::capture(
            &self.post,
            &self.range,
            action,
            Instant::now(),
            self.options.snapshot_version,
        );
        let mut editor = PostEditor::new(mem::take(&mut self.post), self.range);
        let result = mutate(&mut editor);
        editor.complete();
        let outcome = editor.into_outcome();
        self.post = outcome.post;
        self.range = outcome.range;
        if outcome.did_mutate && !outcome.snapshot_cancelled {
            self.history.store(snapshot);
        }
        result
    }

    /// Step back one undo group. Returns whether anything was restored.
    pub fn undo(&mut self) -> bool {
        let current = self.capture_current();
        match self.history.step_backward(current) {
            Some(snapshot) => {
                debug!("restoring undo snapshot");
                self.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Step forward one undo group. Returns whether anything was
    /// restored.
    pub fn redo(&mut self) -> bool {
        let current = self.capture_current();
        match self.history.step_forward(current) {
            Some(snapshot) => {
                debug!("restoring redo snapshot");
                self.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Serialize the current post.
    pub fn serialize(&self, version: MobiledocVersion) -> Value {
        codec::render(&self.post, version)
    }

    fn capture_current(&self) -> Snapshot {
        Snapshot::capture(
            &self.post,
            &self.range,
            None,
            Instant::now(),
            self.options.snapshot_version,
        )
    }

    /// Replace the live post wholesale with a snapshot's re-parsed
    /// document and re-select its recorded range. Runs as a cancelled
    /// transaction so the restore itself never enters history.
    fn restore(&mut self, snapshot: &Snapshot) {
        let post = codec::parse(&snapshot.mobiledoc)
            .expect("a history snapshot always re-parses");
        let mut editor = PostEditor::new(mem::take(&mut self.post), self.range);
        editor.replace_post(post);
        editor.cancel_snapshot();
        editor.complete();
        self.post = editor.into_outcome().post;
        self.range = snapshot.resolve_range(&self.post);
    }
}
