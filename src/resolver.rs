//! Package name resolution.
//!
//! Maps the name a user typed to the native package name for a given package
//! manager. Exact hits (canonical names and aliases) are authoritative;
//! everything else goes through a normalised Levenshtein similarity search
//! over the table.

use crate::package_manager::PackageManager;
use crate::packages::PackageTable;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Candidates scoring below this are not considered matches.
pub const MIN_SCORE: f64 = 0.3;

/// Number of suggestions attached to a heuristic resolution.
pub const MAX_SUGGESTIONS: usize = 5;

/// Fragments removed by [`normalize`], first occurrence only.
const STRIPPED_FRAGMENTS: [&str; 4] = ["-ce", "-desktop", "-bin", "lib"];

/// Outcome of resolving one user-supplied package name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPackage {
    pub original_name: String,
    pub package_manager: PackageManager,
    pub version: Option<String>,
    /// Name to hand to the package manager.
    pub resolved_name: String,
    /// 1.0 for a known package, below 1.0 for a fuzzy match, 0.0 for pass-through.
    pub confidence: f64,
    /// Ranked alternatives; only populated when `confidence < 1.0`.
    pub suggestions: Vec<String>,
}

impl ResolvedPackage {
    pub fn is_exact(&self) -> bool {
        self.confidence >= 1.0
    }

    pub fn is_pass_through(&self) -> bool {
        self.confidence <= 0.0
    }
}

/// A scored match against a canonical package.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub score: f64,
}

pub struct Resolver<'a> {
    table: &'a PackageTable,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a PackageTable) -> Self {
        Self { table }
    }

    /// Resolve `name` for `pm`, optionally pinned to `version`.
    ///
    /// Never fails: an unknown name with no close match is passed through
    /// unchanged with confidence 0.0.
    pub fn resolve(
        &self,
        name: &str,
        pm: PackageManager,
        version: Option<&str>,
    ) -> ResolvedPackage {
        let mut result = ResolvedPackage {
            original_name: name.to_string(),
            package_manager: pm,
            version: version.map(str::to_string),
            resolved_name: name.to_string(),
            confidence: 0.0,
            suggestions: Vec::new(),
        };

        if let Some(entry) = self.table.package_info(name) {
            let versioned = version.and_then(|v| entry.version_mapping(v, pm));
            result.resolved_name = versioned
                .or_else(|| entry.mapping(pm))
                .unwrap_or(name)
                .to_string();
            result.confidence = 1.0;
            debug!(
                name,
                package = %entry.name,
                resolved = %result.resolved_name,
                %pm,
                "exact package match"
            );
            return result;
        }

        let candidates = self.candidates(name);
        let Some(best) = candidates.first() else {
            debug!(name, %pm, "no package match, passing name through");
            return result;
        };

        result.resolved_name = self.table.mapping(&best.name, pm).to_string();
        result.confidence = best.score;
        if best.score < 1.0 {
            result.suggestions = candidates
                .iter()
                .take(MAX_SUGGESTIONS)
                .map(|candidate| candidate.name.clone())
                .collect();
        }
        debug!(
            name,
            package = %best.name,
            score = best.score,
            resolved = %result.resolved_name,
            "fuzzy package match"
        );
        result
    }

    /// Up to `max_results` canonical package names ranked by similarity to `name`.
    pub fn suggestions(&self, name: &str, max_results: usize) -> Vec<String> {
        self.candidates(name)
            .into_iter()
            .take(max_results)
            .map(|candidate| candidate.name)
            .collect()
    }

    /// Every package scoring at least [`MIN_SCORE`] against `name`.
    ///
    /// Each package appears once with the best score of its canonical name and
    /// aliases. Ordered by descending score, ties broken by ascending name.
    pub fn candidates(&self, name: &str) -> Vec<Candidate> {
        let input = normalize(name);
        let mut best: BTreeMap<&str, f64> = BTreeMap::new();

        for entry in self.table.iter() {
            let names = std::iter::once(&entry.name).chain(entry.aliases.iter());
            for candidate in names {
                let score = fuzzy_match(&input, &normalize(candidate));
                if score < MIN_SCORE {
                    continue;
                }
                let slot = best.entry(entry.name.as_str()).or_insert(score);
                if score > *slot {
                    *slot = score;
                }
            }
        }

        let mut ranked: Vec<Candidate> = best
            .into_iter()
            .map(|(name, score)| Candidate {
                name: name.to_string(),
                score,
            })
            .collect();
        ranked.sort_by(compare_candidates);
        ranked
    }
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.name.cmp(&b.name))
}

/// Lower-case `name` and drop the first occurrence of each common packaging
/// fragment (`-ce`, `-desktop`, `-bin`, `lib`).
///
/// Fragments are matched anywhere in the string, so a name such as
/// `"calibre"` loses its inner `"lib"`.
pub fn normalize(name: &str) -> String {
    let mut result = name.to_lowercase();
    for fragment in STRIPPED_FRAGMENTS {
        if let Some(pos) = result.find(fragment) {
            result.replace_range(pos..pos + fragment.len(), "");
        }
    }
    result
}

/// Similarity in `[0, 1]`: `1 - distance / max(len(a), len(b))`.
pub fn fuzzy_match(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// Edit distance counting single-character insertions, deletions and substitutions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
