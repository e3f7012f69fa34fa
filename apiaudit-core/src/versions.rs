//! Release version parsing and ordering.
//!
//! Covers the subset of PEP 440 that published packages use in practice:
//! a dotted release, an optional pre-release (`a`, `b`, `rc`), post-release
//! and dev-release segment, and an optional leading `v`. Local version
//! labels and epochs are not supported.

use std::cmp::Ordering;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)^v?
        (?P<release>\d+(?:\.\d+)*)
        (?:[-_.]?(?P<pre>a|alpha|b|beta|rc|c|pre|preview)[-_.]?(?P<pre_n>\d*))?
        (?:[-_.]?(?:post|rev|r)[-_.]?(?P<post_n>\d*))?
        (?:[-_.]?dev[-_.]?(?P<dev_n>\d*))?
        $",
    )
    .unwrap()
});

/// Pre-release phase, in release order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreRelease {
    Alpha,
    Beta,
    ReleaseCandidate,
}

impl PreRelease {
    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => PreRelease::Alpha,
            "b" | "beta" => PreRelease::Beta,
            _ => PreRelease::ReleaseCandidate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PreRelease::Alpha => "a",
            PreRelease::Beta => "b",
            PreRelease::ReleaseCandidate => "rc",
        }
    }
}

/// A parsed release version. Keeps the text it was parsed from.
#[derive(Clone, Debug)]
pub struct Version {
    text: String,
    release: Vec<u64>,
    pre: Option<(PreRelease, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
}

impl Version {
    pub fn parse(text: &str) -> Option<Self> {
        let caps = VERSION_PATTERN.captures(text.trim())?;
        let number = |name: &str| -> Option<u64> {
            caps.name(name).map(|m| m.as_str().parse().unwrap_or(0))
        };

        let release = caps["release"]
            .split('.')
            .map(|part| part.parse().ok())
            .collect::<Option<Vec<u64>>>()?;
        let pre = caps
            .name("pre")
            .map(|label| (PreRelease::from_label(label.as_str()), number("pre_n").unwrap_or(0)));

        Some(Self {
            text: text.trim().to_string(),
            release,
            pre,
            post: number("post_n"),
            dev: number("dev_n"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Pre-releases and dev releases.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Release with trailing zeros dropped, so `1.0` equals `1.0.0`.
    fn release_key(&self) -> &[u64] {
        let len = self
            .release
            .iter()
            .rposition(|part| *part != 0)
            .map_or(0, |idx| idx + 1);
        &self.release[..len]
    }

    // A bare dev release sorts before every pre-release of the same release.
    fn pre_key(&self) -> (u8, Option<(PreRelease, u64)>) {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => (0, None),
            (Some(pre), _, _) => (1, Some(pre)),
            (None, _, _) => (2, None),
        }
    }

    fn post_key(&self) -> Option<u64> {
        self.post
    }

    fn dev_key(&self) -> (u8, u64) {
        match self.dev {
            Some(n) => (0, n),
            None => (1, 0),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release_key()
            .cmp(other.release_key())
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post_key().cmp(&other.post_key()))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
    }
}

/// Parse and sort versions ascending; unparseable ones are dropped.
pub fn sort_versions<I, S>(versions: I) -> Vec<Version>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed: Vec<Version> = versions
        .into_iter()
        .filter_map(|text| {
            let version = Version::parse(text.as_ref());
            if version.is_none() {
                debug!("Skipping unparseable version {}", text.as_ref());
            }
            version
        })
        .collect();
    parsed.sort();
    parsed
}

/// Latest release of any kind and latest stable release of sorted versions.
pub fn latest_and_stable(sorted: &[Version]) -> (Option<&Version>, Option<&Version>) {
    let latest = sorted.last();
    let stable = sorted.iter().rev().find(|v| !v.is_prerelease());
    (latest, stable)
}
