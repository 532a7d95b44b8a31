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

//! The editable-document engine beneath a rich text editor.
//!
//! The crate provides, bottom up:
//!
//! - [`list`]: the handle-addressed doubly linked list backing every
//!   ordered collection in the document tree.
//! - [`post`]: the document model — a [`Post`] of sections holding
//!   markers and interned markups.
//! - [`cursor`]: logical [`Position`] and [`Range`] addresses into the
//!   tree, with unit and word movement.
//! - [`editor`]: the transactional mutation engine. All structural
//!   changes go through [`Editor::run`] and the [`PostEditor`] it opens.
//! - [`history`]: snapshot-based undo/redo with action grouping.
//! - [`codec`]: the versioned Mobiledoc JSON serialization format
//!   (0.2, 0.3, 0.3.1 and 0.3.2), parsed and rendered losslessly.
//!
//! The crate is a pure model: rendering, DOM reconciliation and event
//! handling are a platform layer's concern. The model is single
//! threaded and synchronous; a transaction runs to completion before
//! control returns to the caller.

pub mod codec;
pub mod cursor;
pub mod editor;
pub mod history;
pub mod list;
pub mod post;

mod error;

pub use codec::{parse, parse_with, render, MobiledocVersion, ParseOptions};
pub use cursor::{Direction, Position, Range};
pub use editor::{BlockTag, Editor, EditorOptions, PostEditor, Queue};
pub use error::ParseError;
pub use history::{EditAction, EditHistory, Snapshot};
pub use list::{ItemId, LinkedList};
pub use post::{
    Atom, Attributes, CardSection, ImageSection, ListItem, ListSection, ListTag,
    Marker, MarkerContent, Markerable, Markup, MarkupId, MarkupSection,
    MarkupTag, Post, Section, SectionId, SectionTag,
};
