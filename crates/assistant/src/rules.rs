//! Plain-language restatement of the flight scoring rules.
//!
//! This text feeds the assistant only. It is not read by the scoring engine,
//! so answers built from it are informative, never authoritative.

pub struct RuleSection {
    pub title: &'static str,
    pub keywords: &'static [&'static str],
    pub body: &'static str,
}

pub const RULE_SECTIONS: &[RuleSection] = &[
    RuleSection {
        title: "Height",
        keywords: &["height", "altura", "meters", "metres", "high"],
        body: "Every meter of service height is worth 0.1 points.",
    },
    RuleSection {
        title: "Service position",
        keywords: &["service", "servicio", "distance", "position", "overhead"],
        body: "A service within 30 m of the falconer earns 15 points. Between 30 and 40 m \
               the score drops by 0.3 points per meter, reaching 12 at 40 m. Beyond 40 m \
               it loses 0.1 points per meter and is worth nothing past 160 m.",
    },
    RuleSection {
        title: "Dive",
        keywords: &["dive", "stoop", "picado", "speed", "km/h"],
        body: "Dives under 100 km/h score nothing. From 100 km/h every additional 10 km/h \
               adds one point.",
    },
    RuleSection {
        title: "Climb rate",
        keywords: &["climb", "remontada", "rate", "ascent", "minute"],
        body: "The climb rate is the service height divided by the flight duration, in \
               meters per minute. Up to 20 m/min it scores nothing; above that it scores \
               2 points plus 0.2 points for every meter per minute over 20.",
    },
    RuleSection {
        title: "Capture",
        keywords: &[
            "capture", "captura", "pinning", "pursuit", "slashing", "touch", "yields", "prey",
        ],
        body: "Capture points are the service height divided by a factor that depends on \
               the outcome: clean capture or pinning 12, short pursuit 15, long pursuit 18, \
               slashing 40, touch or yields 50. No capture scores nothing.",
    },
    RuleSection {
        title: "Time bonus",
        keywords: &["time", "tiempo", "duration", "bonus", "seconds", "minutes"],
        body: "Flights of up to 7 minutes (420 s) earn a 6 point bonus, up to 8 minutes \
               (480 s) 4 points, up to 9 minutes (540 s) 2 points. Longer flights earn no \
               time bonus.",
    },
    RuleSection {
        title: "Clean retrieval bonus",
        keywords: &["retrieval", "recogida", "manual", "bonus", "clean"],
        body: "Judges may award between 0 and 4 whole points for a clean retrieval. They are \
               added as given.",
    },
    RuleSection {
        title: "Penalties",
        keywords: &[
            "penalty", "penalties", "penalización", "lure", "señuelo", "release", "aesthetics",
        ],
        body: "Showing an incarnate lure costs 4 points, showing the lure 6 points and a \
               forced release 10 points. The judges' dive aesthetics penalty, from 0 to 5 in \
               half point steps, is subtracted as given. Penalties can take a total below zero.",
    },
    RuleSection {
        title: "Disqualification",
        keywords: &[
            "disqualification", "disqualified", "descalificación", "no show", "lost", "zero",
        ],
        body: "A flight is disqualified when the falconer does not show up, the falcon is \
               lost, for unsportsmanlike conduct or for flying outside the flight zone. A \
               disqualified flight scores exactly 0 whatever else happened.",
    },
    RuleSection {
        title: "Ranking",
        keywords: &["ranking", "rank", "leaderboard", "clasificación", "winner", "tie"],
        body: "Flights are ranked by total points, highest first. Totals are rounded to two \
               decimals and equal totals share a place.",
    },
];

/// The full restatement as one document
pub fn rules_text() -> String {
    RULE_SECTIONS
        .iter()
        .map(|section| format!("## {}\n{}", section.title, section.body))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Whole-word match; a keyword of several words must appear in order
fn mentions(question: &[&str], keyword: &str) -> bool {
    let phrase = words(keyword);
    !phrase.is_empty()
        && question
            .windows(phrase.len())
            .any(|window| window == phrase.as_slice())
}

/// Sections whose keywords appear in the question, best match first
pub fn lookup(question: &str) -> Vec<&'static RuleSection> {
    let question = question.to_lowercase();
    let question = words(&question);

    let mut matches: Vec<(usize, &'static RuleSection)> = RULE_SECTIONS
        .iter()
        .filter_map(|section| {
            let hits = section
                .keywords
                .iter()
                .filter(|keyword| mentions(&question, keyword))
                .count();
            (hits > 0).then_some((hits, section))
        })
        .collect();

    matches.sort_by(|a, b| b.0.cmp(&a.0));
    matches.into_iter().map(|(_, section)| section).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_text_contains_every_section() {
        let text = rules_text();
        for section in RULE_SECTIONS {
            assert!(text.contains(section.title));
        }
    }

    #[test]
    fn test_lookup_finds_relevant_section() {
        let sections = lookup("How many points is a dive at 150 km/h worth?");
        assert_eq!(sections[0].title, "Dive");
    }

    #[test]
    fn test_lookup_prefers_more_keyword_hits() {
        let sections = lookup("Does a lure penalty stack with the aesthetics penalty?");
        assert_eq!(sections[0].title, "Penalties");
    }

    #[test]
    fn test_lookup_without_match() {
        assert!(lookup("what's for lunch?").is_empty());
    }

    #[test]
    fn test_lookup_matches_whole_words_only() {
        assert!(lookup("Sometimes we separate them").is_empty());
        assert!(lookup("Is a no-show scored?")
            .iter()
            .any(|section| section.title == "Disqualification"));
    }
}
