use chrono::{DateTime, Duration, TimeZone};
use log::debug;
use regex::Regex;

use crate::error::{Error, Result};
use crate::release::Release;

/// A list of independently compiled regular expressions, matched as a union.
#[derive(Debug, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| Error::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True when any pattern matches somewhere in `haystack`.
    pub fn is_match(&self, haystack: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(haystack))
    }

    /// Include semantics: an empty set lets everything through.
    fn includes(&self, haystack: &str) -> bool {
        self.is_empty() || self.is_match(haystack)
    }

    /// Exclude semantics: an empty set rejects nothing.
    fn excludes(&self, haystack: &str) -> bool {
        !self.is_empty() && self.is_match(haystack)
    }
}

/// Which releases a clean run acts on.
#[derive(Debug, Default)]
pub struct Criteria {
    /// Minimum time since the last update.
    pub max_age: Duration,
    pub include_charts: PatternSet,
    pub exclude_charts: PatternSet,
    /// Matched against `<namespace>:<name>`.
    pub include: PatternSet,
    /// Matched against `<namespace>:<name>`.
    pub exclude: PatternSet,
}

/// Every predicate of the selection, evaluated for one release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub eligible_by_age: bool,
    pub chart_included: bool,
    pub key_included: bool,
    pub chart_excluded: bool,
    pub key_excluded: bool,
}

impl Verdict {
    pub fn is_selected(&self) -> bool {
        self.eligible_by_age
            && self.chart_included
            && self.key_included
            && !self.chart_excluded
            && !self.key_excluded
    }

    fn reason(&self) -> &'static str {
        if !self.eligible_by_age {
            "it was updated too recently"
        } else if !self.chart_included {
            "its chart is not included"
        } else if !self.key_included {
            "it is not included"
        } else if self.chart_excluded {
            "its chart is excluded"
        } else {
            "it is excluded"
        }
    }
}

impl Criteria {
    /// Evaluates all predicates against `release` as seen at `now`.
    ///
    /// Update times without an offset are read in the zone of `now`.
    pub fn evaluate<Tz: TimeZone>(&self, release: &Release, now: &DateTime<Tz>) -> Result<Verdict> {
        let updated = release.updated_at(&now.timezone())?;
        let eligible_by_age = updated
            .checked_add_signed(self.max_age)
            .is_some_and(|deadline| *now >= deadline);
        let key = release.key();

        Ok(Verdict {
            eligible_by_age,
            chart_included: self.include_charts.includes(&release.chart),
            key_included: self.include.includes(&key),
            chart_excluded: self.exclude_charts.excludes(&release.chart),
            key_excluded: self.exclude.excludes(&key),
        })
    }
}

/// Picks the releases matching `criteria` at `now`, keeping their order.
///
/// A single unparsable update time fails the whole selection.
pub fn select<'a, Tz: TimeZone>(
    releases: &'a [Release],
    criteria: &Criteria,
    now: &DateTime<Tz>,
) -> Result<Vec<&'a Release>> {
    let mut selected = Vec::new();
    for release in releases {
        let verdict = criteria.evaluate(release, now)?;
        if verdict.is_selected() {
            selected.push(release);
        } else {
            debug!(
                "Skipping release {} in namespace {} because {}.",
                release.name,
                release.namespace,
                verdict.reason()
            );
        }
    }
    Ok(selected)
}
