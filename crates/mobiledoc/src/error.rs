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

//! Errors raised while parsing a serialized Mobiledoc document.
//!
//! A parse error rejects the whole document; there is no partial load.
//! Programmer-contract violations elsewhere in the crate panic instead,
//! since they are bugs at the call site rather than recoverable states.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    /// The document's `version` field names a schema revision this crate
    /// does not understand.
    #[error("unrecognized mobiledoc version `{0}`")]
    UnrecognizedVersion(String),

    /// A structural expectation of the wire format was not met.
    #[error("malformed mobiledoc: {context}")]
    Malformed { context: &'static str },

    /// A section or markup tag string is outside the closed tag set.
    #[error("invalid tag in mobiledoc")]
    InvalidTag(#[from] strum::ParseError),

    /// A card name outside the registered set, with no fallback handler
    /// to absorb it.
    #[error("unknown card `{0}` and no unknown-card handler is registered")]
    UnknownCard(String),

    /// An atom name outside the registered set, with no fallback handler
    /// to absorb it.
    #[error("unknown atom `{0}` and no unknown-atom handler is registered")]
    UnknownAtom(String),
}

impl ParseError {
    pub(crate) fn malformed(context: &'static str) -> Self {
        ParseError::Malformed { context }
    }
}
