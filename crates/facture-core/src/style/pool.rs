//! Style deduplication

use super::Style;
use ahash::AHashMap;

/// Deduplicating pool of cell styles.
///
/// A filled template keeps most of its cells on a handful of styles, so
/// sheets store each unique style once and cells reference it by index.
/// Index 0 is always the default style.
#[derive(Debug, Clone)]
pub struct StylePool {
    styles: Vec<Style>,
    index_map: AHashMap<StyleKey, u32>,
}

/// Pre-hashed lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StyleKey(u64);

impl StyleKey {
    fn from_style(style: &Style) -> Self {
        use std::hash::{Hash, Hasher};
        let mut hasher = ahash::AHasher::default();
        style.hash(&mut hasher);
        StyleKey(hasher.finish())
    }
}

impl StylePool {
    pub fn new() -> Self {
        let mut pool = Self {
            styles: Vec::with_capacity(16),
            index_map: AHashMap::with_capacity(16),
        };

        let default = Style::default();
        let key = StyleKey::from_style(&default);
        pool.styles.push(default);
        pool.index_map.insert(key, 0);

        pool
    }

    /// Return the index of this style, inserting it if new.
    pub fn get_or_insert(&mut self, style: Style) -> u32 {
        let key = StyleKey::from_style(&style);

        if let Some(&idx) = self.index_map.get(&key) {
            // Guard against hash collisions before reusing the slot
            if self.styles[idx as usize] == style {
                return idx;
            }
        }

        let idx = self.styles.len() as u32;
        self.index_map.insert(key, idx);
        self.styles.push(style);
        idx
    }

    pub fn get(&self, index: u32) -> Option<&Style> {
        self.styles.get(index as usize)
    }

    pub fn default_style(&self) -> &Style {
        &self.styles[0]
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// True when only the default style is present.
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Style)> {
        self.styles.iter().enumerate().map(|(i, s)| (i as u32, s))
    }
}

impl Default for StylePool {
    fn default() -> Self {
        Self::new()
    }
}
