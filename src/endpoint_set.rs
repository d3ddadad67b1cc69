use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::extractor::{HttpMethod, RawEndpoint};
use crate::path_normalizer::{CanonicalPath, PathNormalizer};

/// Where a path was seen.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
}

impl SourceLocation {
    pub fn of(raw: &RawEndpoint) -> Self {
        Self {
            file: raw.source_file.clone(),
            line: raw.line,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathEntry {
    pub methods: BTreeSet<HttpMethod>,
    pub sites: BTreeSet<SourceLocation>,
}

/// Deduplicated set of canonical paths, remembering the methods and source
/// sites each one was seen with. Iteration is in path order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointSet {
    entries: BTreeMap<CanonicalPath, PathEntry>,
}

impl EndpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize every raw endpoint and collect the ones that are paths.
    pub fn from_raw<'a>(
        normalizer: &PathNormalizer,
        raws: impl IntoIterator<Item = &'a RawEndpoint>,
    ) -> Self {
        let mut set = Self::new();
        for raw in raws {
            set.add_raw(normalizer, raw);
        }
        set
    }

    /// Returns false when the raw path does not normalize.
    pub fn add_raw(&mut self, normalizer: &PathNormalizer, raw: &RawEndpoint) -> bool {
        match normalizer.normalize(&raw.raw_path) {
            Some(path) => {
                self.insert(path, raw.http_method, Some(SourceLocation::of(raw)));
                true
            }
            None => false,
        }
    }

    pub fn insert(
        &mut self,
        path: CanonicalPath,
        method: Option<HttpMethod>,
        site: Option<SourceLocation>,
    ) {
        let entry = self.entries.entry(path).or_default();
        entry.methods.extend(method);
        entry.sites.extend(site);
    }

    /// Merge `other` into this set.
    pub fn union(&mut self, other: EndpointSet) {
        for (path, entry) in other.entries {
            let existing = self.entries.entry(path).or_default();
            existing.methods.extend(entry.methods);
            existing.sites.extend(entry.sites);
        }
    }

    pub fn contains(&self, path: &CanonicalPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get(&self, path: &CanonicalPath) -> Option<&PathEntry> {
        self.entries.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &CanonicalPath> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalPath, &PathEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `method → paths` view. Paths seen without a method are left out.
    pub fn by_method(&self) -> BTreeMap<HttpMethod, BTreeSet<CanonicalPath>> {
        let mut view: BTreeMap<HttpMethod, BTreeSet<CanonicalPath>> = BTreeMap::new();
        for (path, entry) in &self.entries {
            for method in &entry.methods {
                view.entry(*method).or_default().insert(path.clone());
            }
        }
        view
    }
}

impl FromIterator<CanonicalPath> for EndpointSet {
    fn from_iter<I: IntoIterator<Item = CanonicalPath>>(iter: I) -> Self {
        let mut set = Self::new();
        for path in iter {
            set.insert(path, None, None);
        }
        set
    }
}
