// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Nodes with no dependencies: they receive the start signal as soon as the
/// request payload is written.
///
/// The input node is not listed; it is driven by the payload itself.
///
/// ```
/// use the_switchboard::config::EntryPoints;
///
/// let mut entry_points = EntryPoints::new();
/// entry_points.add("clock".to_string());
/// assert_eq!(entry_points.iter().count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPoints(pub Vec<String>);

impl EntryPoints {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn add(&mut self, node: String) {
        self.0.push(node);
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for EntryPoints {
    fn from(entry_points: Vec<String>) -> Self {
        Self(entry_points)
    }
}

impl From<EntryPoints> for Vec<String> {
    fn from(value: EntryPoints) -> Self {
        value.0
    }
}
