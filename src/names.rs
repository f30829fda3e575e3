//! Display-name overrides for chats

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps a raw identity key to an optional display-name override.
pub trait NameResolver {
    fn lookup(&self, raw_key: &str) -> Option<String>;
}

/// Resolver that never overrides anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverrides;

impl NameResolver for NoOverrides {
    fn lookup(&self, _raw_key: &str) -> Option<String> {
        None
    }
}

/// Table of overrides, as read from the `[display_names]` config section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayNames(BTreeMap<String, String>);

impl DisplayNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, raw_key: impl Into<String>, name: impl Into<String>) {
        self.0.insert(raw_key.into(), name.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl NameResolver for DisplayNames {
    fn lookup(&self, raw_key: &str) -> Option<String> {
        // An empty override means "no override"
        self.0
            .get(raw_key)
            .filter(|name| !name.trim().is_empty())
            .cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DisplayNames {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
