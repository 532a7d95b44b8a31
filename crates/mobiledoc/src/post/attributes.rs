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

//! Whitelisted per-section attributes. Only text alignment today; it is
//! carried by markup sections and list sections, and serialized by the
//! 0.3.2 wire format.

/// Attribute keys a section may carry.
pub const VALID_SECTION_ATTRIBUTES: &[&str] = &["data-md-text-align"];

/// Key of the text alignment attribute.
pub const TEXT_ALIGN: &str = "data-md-text-align";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any existing entry.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not a whitelisted section attribute.
    pub fn set(&mut self, key: &str, value: &str) {
        assert!(
            VALID_SECTION_ATTRIBUTES.contains(&key),
            "`{key}` is not a valid section attribute"
        );
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
