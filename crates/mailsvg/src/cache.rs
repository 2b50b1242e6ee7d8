// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;

use lru::LruCache;
use svg2vml::{DialectDocument, TranspileOptions};

/// An LRU cache of VML conversions.
///
/// Wraps [`svg2vml::transpile_with`]. The conversion itself never caches anything,
/// so a cache should be created explicitly and passed around.
///
/// Entries are keyed by a hash of the source text and the conversion options.
#[derive(Debug)]
pub struct TranspileCache {
    lru: Option<LruCache<u64, DialectDocument>>,
    hits: u64,
    misses: u64,
}

impl TranspileCache {
    /// Creates a new cache with the specified capacity.
    ///
    /// A zero capacity disables the cache.
    pub fn new(capacity: usize) -> Self {
        TranspileCache {
            lru: NonZeroUsize::new(capacity).map(LruCache::new),
            hits: 0,
            misses: 0,
        }
    }

    /// Converts an SVG document into VML or returns a cached result.
    pub fn transpile(&mut self, text: &str, opt: &TranspileOptions) -> DialectDocument {
        let lru = match self.lru {
            Some(ref mut lru) => lru,
            None => return svg2vml::transpile_with(text, opt),
        };

        let key = cache_key(text, opt);
        if let Some(doc) = lru.get(&key) {
            self.hits += 1;
            log::debug!("VML cache hit for {:016x}.", key);
            return doc.clone();
        }

        self.misses += 1;
        let doc = svg2vml::transpile_with(text, opt);
        lru.put(key, doc.clone());
        doc
    }

    /// Returns the number of cached conversions.
    pub fn len(&self) -> usize {
        self.lru.as_ref().map_or(0, |lru| lru.len())
    }

    /// Checks that the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Returns the number of lookups that required a conversion.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        if let Some(ref mut lru) = self.lru {
            lru.clear();
        }
    }
}

fn cache_key(text: &str, opt: &TranspileOptions) -> u64 {
    let mut hasher = siphasher::sip::SipHasher13::new();
    text.hash(&mut hasher);
    opt.width.map(f64::to_bits).hash(&mut hasher);
    opt.height.map(f64::to_bits).hash(&mut hasher);
    opt.placeholder_color.hash(&mut hasher);
    opt.analyze.max_document_size.hash(&mut hasher);
    opt.analyze.max_path_commands.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = "<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'>\
                       <rect width='10' height='10'/></svg>";

    #[test]
    fn repeated_conversion_is_cached() {
        let mut cache = TranspileCache::new(4);
        let opt = TranspileOptions::default();

        let first = cache.transpile(SVG, &opt);
        let second = cache.transpile(SVG, &opt);
        assert_eq!(first.markup(), second.markup());
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn options_are_part_of_the_key() {
        let mut cache = TranspileCache::new(4);
        let doc1 = cache.transpile(SVG, &TranspileOptions::default());
        let opt = TranspileOptions {
            width: Some(20.0),
            ..TranspileOptions::default()
        };
        let doc2 = cache.transpile(SVG, &opt);
        assert_ne!(doc1.markup(), doc2.markup());
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let mut cache = TranspileCache::new(1);
        let opt = TranspileOptions::default();
        cache.transpile(SVG, &opt);
        cache.transpile("<svg xmlns='http://www.w3.org/2000/svg'/>", &opt);
        cache.transpile(SVG, &opt);
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn disabled() {
        let mut cache = TranspileCache::new(0);
        cache.transpile(SVG, &TranspileOptions::default());
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 0);
    }
}
