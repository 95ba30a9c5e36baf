//! Activity rule tables.
//!
//! A rule is a list of conditions over the per-class summary plus the phrase it
//! contributes. All conditions of a rule must hold for it to fire. Tables are
//! evaluated top to bottom, so their order is the order of phrases in the
//! output.

use super::ClassSummary;

/// A predicate over the per-class summary of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Condition {
    /// At least one detection of the class.
    Present(&'static str),
    /// At least `n` detections of the class.
    AtLeast(&'static str, usize),
    /// Mean confidence of the class strictly above the bound. False when absent.
    ConfidenceAbove(&'static str, f32),
}

impl Condition {
    pub fn holds(&self, summary: &ClassSummary) -> bool {
        match *self {
            Condition::Present(label) => summary.count(label) >= 1,
            Condition::AtLeast(label, n) => summary.count(label) >= n,
            Condition::ConfidenceAbove(label, bound) => summary
                .mean_confidence(label)
                .is_some_and(|mean| mean > bound),
        }
    }
}

/// Conditions that must all hold, and the phrase contributed when they do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rule {
    pub when: &'static [Condition],
    pub phrase: &'static str,
}

impl Rule {
    pub fn fires(&self, summary: &ClassSummary) -> bool {
        self.when.iter().all(|condition| condition.holds(summary))
    }
}

/// Reliable person presence: seen at least twice with mean confidence above 0.5.
macro_rules! person_with {
    ($label:literal) => {
        &[
            Condition::AtLeast("person", 2),
            Condition::ConfidenceAbove("person", 0.5),
            Condition::Present($label),
        ]
    };
}

/// Cumulative rule set: every firing rule contributes.
pub const EXTENDED_RULES: &[Rule] = &[
    Rule { when: person_with!("tv"), phrase: "Person watching TV" },
    Rule { when: person_with!("laptop"), phrase: "Person using laptop" },
    Rule { when: person_with!("cell phone"), phrase: "Person using phone" },
    Rule { when: person_with!("dog"), phrase: "Person with dog" },
    Rule { when: person_with!("cat"), phrase: "Person with cat" },
    Rule { when: person_with!("car"), phrase: "Person near car" },
    Rule { when: person_with!("bicycle"), phrase: "Person with bicycle" },
    Rule { when: person_with!("chair"), phrase: "Person sitting" },
    Rule { when: person_with!("dining table"), phrase: "Person at table" },
    Rule { when: &[Condition::AtLeast("car", 2)], phrase: "Multiple cars present" },
    Rule { when: &[Condition::Present("truck")], phrase: "Truck present" },
    Rule { when: &[Condition::Present("bus")], phrase: "Bus present" },
    Rule { when: &[Condition::Present("motorcycle")], phrase: "Motorcycle present" },
    Rule { when: &[Condition::AtLeast("dog", 2)], phrase: "Multiple dogs present" },
    Rule { when: &[Condition::AtLeast("cat", 2)], phrase: "Multiple cats present" },
];

/// First-match rule set over plain co-occurrence.
pub const MINIMAL_RULES: &[Rule] = &[
    Rule {
        when: &[Condition::Present("person"), Condition::Present("tv")],
        phrase: "person is watching TV",
    },
    Rule {
        when: &[Condition::Present("person"), Condition::Present("cell phone")],
        phrase: "person is using a phone",
    },
    Rule {
        when: &[Condition::Present("person"), Condition::Present("laptop")],
        phrase: "person is using a laptop",
    },
    Rule {
        when: &[Condition::Present("person"), Condition::Present("dog")],
        phrase: "person is with a dog",
    },
    Rule {
        when: &[Condition::Present("person"), Condition::Present("cat")],
        phrase: "person is with a cat",
    },
    Rule {
        when: &[Condition::Present("person"), Condition::Present("car")],
        phrase: "person is near a car",
    },
    Rule {
        when: &[Condition::Present("person"), Condition::Present("bicycle")],
        phrase: "person is riding a bicycle",
    },
];
