//! PEP 440 version parsing and ordering.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^\s*v?
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?P<pre>[-_.]?(?P<pre_l>alpha|beta|preview|pre|rc|a|b|c)[-_.]?(?P<pre_n>[0-9]+)?)?
        (?P<post>(?:-(?P<post_n1>[0-9]+))|(?:[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?))?
        (?P<dev>[-_.]?dev[-_.]?(?P<dev_n>[0-9]+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        \s*$",
    )
    .expect("valid version pattern")
});

/// Sorts below and above every real value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Bound<T> {
    NegInf,
    Val(T),
    PosInf,
}

/// Numeric local segments sort above alphanumeric ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum LocalSegment {
    Text(String),
    Number(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    epoch: u64,
    release: Vec<u64>,
    pre: Bound<(u8, u64)>,
    post: Bound<u64>,
    dev: Bound<u64>,
    local: Bound<Vec<LocalSegment>>,
}

/// A parsed version that remembers how it was written.
#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    key: SortKey,
}

impl Version {
    /// Returns `None` for strings that are not valid PEP 440 versions.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = VERSION_PATTERN.captures(text)?;
        let number = |name: &str| -> Option<Option<u64>> {
            match caps.name(name) {
                Some(m) => m.as_str().parse().ok().map(Some),
                None => Some(None),
            }
        };

        let epoch = number("epoch")?.unwrap_or(0);
        let mut release = caps["release"]
            .split('.')
            .map(|part| part.parse().ok())
            .collect::<Option<Vec<u64>>>()?;
        while release.len() > 1 && release.last() == Some(&0) {
            release.pop();
        }

        let pre = match caps.name("pre_l") {
            Some(label) => {
                let rank = match label.as_str().to_ascii_lowercase().as_str() {
                    "a" | "alpha" => 0,
                    "b" | "beta" => 1,
                    _ => 2,
                };
                Some((rank, number("pre_n")?.unwrap_or(0)))
            }
            None => None,
        };

        let post = if caps.name("post").is_some() {
            Some(number("post_n1")?.or(number("post_n2")?).unwrap_or(0))
        } else {
            None
        };

        let dev = if caps.name("dev").is_some() {
            Some(number("dev_n")?.unwrap_or(0))
        } else {
            None
        };

        let local = caps.name("local").map(|m| {
            m.as_str()
                .split(['-', '_', '.'])
                .map(|segment| match segment.parse() {
                    Ok(n) => LocalSegment::Number(n),
                    Err(_) => LocalSegment::Text(segment.to_ascii_lowercase()),
                })
                .collect()
        });

        let key = SortKey {
            epoch,
            release,
            pre: match (pre, post, dev) {
                (None, None, Some(_)) => Bound::NegInf,
                (None, _, _) => Bound::PosInf,
                (Some(p), _, _) => Bound::Val(p),
            },
            post: post.map_or(Bound::NegInf, Bound::Val),
            dev: dev.map_or(Bound::PosInf, Bound::Val),
            local: local.map_or(Bound::NegInf, Bound::Val),
        };

        Some(Self {
            text: text.trim().to_string(),
            key,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
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
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Keeps valid versions, drops duplicates and orders them newest first.
pub fn sort_newest_first<I, S>(versions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed: Vec<Version> = Vec::new();
    for text in versions {
        let Some(version) = Version::parse(text.as_ref()) else {
            continue;
        };
        if !parsed.iter().any(|v| v.as_str() == version.as_str()) {
            parsed.push(version);
        }
    }
    parsed.sort_by(|a, b| b.cmp(a));
    parsed.into_iter().map(|v| v.text).collect()
}
