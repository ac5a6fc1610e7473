//! Player identity resolution across the season and contract sources.

use crate::domain::valuation::MatchKind;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const GENERATIONAL_SUFFIXES: &[&str] = &[" jr.", " jr", " sr.", " sr", " iii", " ii", " iv", " v"];

/// Canonical form used for every name comparison.
///
/// Strips diacritics, case-folds, drops one generational suffix and all
/// punctuation except hyphens, and collapses whitespace.
pub fn normalize_name(name: &str) -> String {
    let folded: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    let mut trimmed = folded.trim();

    for suffix in GENERATIONAL_SUFFIXES {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            trimmed = stripped;
            break;
        }
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone)]
struct PlayerName {
    raw: String,
    normalized: String,
    first: String,
    last: String,
}

impl PlayerName {
    fn new(raw: &str) -> Self {
        let normalized = normalize_name(raw);
        let (first, last) = split_first_last(&normalized);
        Self {
            raw: raw.to_string(),
            normalized,
            first,
            last,
        }
    }
}

fn split_first_last(normalized: &str) -> (String, String) {
    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    let first = tokens.first().copied().unwrap_or_default().to_string();
    let last = tokens.last().copied().unwrap_or_default().to_string();
    (first, last)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatch {
    /// Name as spelled in the season source.
    pub player: String,
    pub kind: MatchKind,
}

/// Index over the season source's player names.
#[derive(Debug, Clone, Default)]
pub struct NameMatcher {
    players: Vec<PlayerName>,
}

impl NameMatcher {
    /// Names are kept in the given order; pass them sorted for stable results.
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            players: names.into_iter().map(PlayerName::new).collect(),
        }
    }

    /// Whether any known player shares the exact normalized name.
    pub fn knows(&self, name: &str) -> bool {
        let target = normalize_name(name);
        self.players.iter().any(|p| p.normalized == target)
    }

    /// Tries each strategy in order against players accepted by `eligible`.
    ///
    /// Fuzzy strategies only match when exactly one candidate qualifies.
    pub fn resolve<F>(&self, name: &str, eligible: F) -> Option<NameMatch>
    where
        F: Fn(&str) -> bool,
    {
        let target = normalize_name(name);
        if target.is_empty() {
            return None;
        }
        let (first, last) = split_first_last(&target);
        let first_initial = first.chars().next();

        let candidates: Vec<&PlayerName> = self
            .players
            .iter()
            .filter(|p| eligible(&p.raw))
            .collect();

        if let Some(p) = candidates.iter().find(|p| p.normalized == target) {
            return Some(NameMatch {
                player: p.raw.clone(),
                kind: MatchKind::ExactNormalized,
            });
        }

        let unique = |pred: &dyn Fn(&PlayerName) -> bool, kind: MatchKind| {
            let mut hits = candidates.iter().filter(|p| pred(p));
            match (hits.next(), hits.next()) {
                (Some(p), None) => Some(NameMatch {
                    player: p.raw.clone(),
                    kind,
                }),
                _ => None,
            }
        };

        unique(
            &|p: &PlayerName| p.last == last && first_initial.is_some() && p.first.chars().next() == first_initial,
            MatchKind::LastNameFirstInitial,
        )
        .or_else(|| unique(&|p: &PlayerName| p.last == last, MatchKind::UniqueLastName))
        .or_else(|| {
            unique(
                &|p: &PlayerName| p.normalized.contains(&first) && p.normalized.contains(&last),
                MatchKind::ContainsBothNames,
            )
        })
        .or_else(|| {
            if last.chars().count() <= 3 {
                return None;
            }
            let prefix: String = last.chars().take(4).collect();
            unique(&|p: &PlayerName| p.last.starts_with(&prefix), MatchKind::PartialLastName)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_diacritics_and_suffix() {
        assert_eq!(normalize_name("José Ramírez Jr."), normalize_name("jose ramirez"));
        assert_eq!(normalize_name("José Ramírez Jr."), "jose ramirez");
        assert_eq!(normalize_name("  Ronald  Acuña  Jr "), "ronald acuna");
        assert_eq!(normalize_name("Cal Ripken III"), "cal ripken");
        assert_eq!(normalize_name("Ken Griffey Sr."), "ken griffey");
    }

    #[test]
    fn test_normalize_keeps_hyphens_drops_punctuation() {
        assert_eq!(normalize_name("Isiah Kiner-Falefa"), "isiah kiner-falefa");
        assert_eq!(normalize_name("Travis d'Arnaud"), "travis darnaud");
        assert_eq!(normalize_name("J.D. Martinez"), "jd martinez");
    }

    fn matcher() -> NameMatcher {
        NameMatcher::new([
            "Corey Seager",
            "Kyle Seager",
            "Marcus Semien",
            "Ronald Acuña Jr.",
            "Giancarlo Stanton",
        ])
    }

    #[test]
    fn test_exact_normalized_match() {
        let m = matcher().resolve("Ronald Acuna", |_| true).unwrap();
        assert_eq!(m.player, "Ronald Acuña Jr.");
        assert_eq!(m.kind, MatchKind::ExactNormalized);
    }

    #[test]
    fn test_first_initial_disambiguates_shared_last_name() {
        let m = matcher().resolve("C. Seager", |_| true).unwrap();
        assert_eq!(m.player, "Corey Seager");
        assert_eq!(m.kind, MatchKind::LastNameFirstInitial);
    }

    #[test]
    fn test_unique_last_name() {
        let m = matcher().resolve("Mike Stanton", |_| true).unwrap();
        assert_eq!(m.player, "Giancarlo Stanton");
        assert_eq!(m.kind, MatchKind::UniqueLastName);
    }

    #[test]
    fn test_partial_last_name() {
        let m = matcher().resolve("Marc Semienn", |_| true).unwrap();
        assert_eq!(m.player, "Marcus Semien");
        assert_eq!(m.kind, MatchKind::PartialLastName);
    }

    #[test]
    fn test_ambiguous_last_name_is_not_matched() {
        assert!(matcher().resolve("Bobby Seager", |_| true).is_none());
    }

    #[test]
    fn test_eligibility_filter_applies_to_every_strategy() {
        let m = matcher().resolve("Corey Seager", |name| name != "Corey Seager");
        // Kyle is the only remaining Seager.
        assert_eq!(m.map(|m| m.player), Some("Kyle Seager".to_string()));
        assert!(matcher().knows("corey seager"));
    }
}
