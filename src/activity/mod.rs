//! Activity inference.
//!
//! Derives a human-readable activity description from the co-occurrence of
//! detected classes across a run. Works on the raw detection sequence because
//! rules need per-class counts and mean confidence, not just the ranked stats.
//!
//! Two tiers:
//! - `Extended` (default): cumulative. Every firing rule contributes its
//!   phrase; phrases are joined with `"; "`. When nothing fires, falls back to a
//!   per-class count summary.
//! - `Minimal`: first match over plain co-occurrence, exactly one phrase.
//!
//! Evaluation is deterministic; the same detections always give the same string.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::detect::Detection;

pub mod rules;

pub use rules::{Condition, Rule, EXTENDED_RULES, MINIMAL_RULES};

/// Returned when there are no detections at all.
pub const NO_OBJECTS: &str = "No objects detected";

/// Returned by the minimal tier when no rule matches.
pub const NO_SPECIFIC_ACTIVITY: &str = "No specific activity detected";

const PHRASE_SEPARATOR: &str = "; ";

/// Rule richness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityTier {
    #[default]
    Extended,
    Minimal,
}

impl std::str::FromStr for ActivityTier {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "extended" => Ok(Self::Extended),
            "minimal" => Ok(Self::Minimal),
            other => Err(anyhow::anyhow!(
                "unknown activity tier '{}' (expected extended or minimal)",
                other
            )),
        }
    }
}

// ----------------------------------------------------------------------------
// ClassSummary
// ----------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct ClassEntry {
    label: String,
    count: usize,
    confidence_sum: f64,
}

/// Per-class count and mean confidence, remembering first-seen order.
#[derive(Clone, Debug, Default)]
pub struct ClassSummary {
    entries: Vec<ClassEntry>,
    positions: HashMap<String, usize>,
}

impl ClassSummary {
    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut summary = Self::default();
        for detection in detections {
            let slot = match summary.positions.get(&detection.class_label) {
                Some(&slot) => slot,
                None => {
                    summary.entries.push(ClassEntry {
                        label: detection.class_label.clone(),
                        count: 0,
                        confidence_sum: 0.0,
                    });
                    let slot = summary.entries.len() - 1;
                    summary
                        .positions
                        .insert(detection.class_label.clone(), slot);
                    slot
                }
            };
            let entry = &mut summary.entries[slot];
            entry.count += 1;
            entry.confidence_sum += f64::from(detection.confidence);
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, label: &str) -> usize {
        self.entry(label).map_or(0, |entry| entry.count)
    }

    pub fn mean_confidence(&self, label: &str) -> Option<f32> {
        self.entry(label)
            .map(|entry| (entry.confidence_sum / entry.count as f64) as f32)
    }

    /// `(label, count)` in first-seen order.
    pub fn counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries
            .iter()
            .map(|entry| (entry.label.as_str(), entry.count))
    }

    fn entry(&self, label: &str) -> Option<&ClassEntry> {
        self.positions.get(label).map(|&slot| &self.entries[slot])
    }
}

// ----------------------------------------------------------------------------
// ActivityInferencer
// ----------------------------------------------------------------------------

/// Applies a rule tier to a run's detections.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActivityInferencer {
    tier: ActivityTier,
}

impl ActivityInferencer {
    pub fn new(tier: ActivityTier) -> Self {
        Self { tier }
    }

    pub fn tier(&self) -> ActivityTier {
        self.tier
    }

    /// Describe the activity in `detections`.
    pub fn infer(&self, detections: &[Detection]) -> String {
        let summary = ClassSummary::from_detections(detections);
        if summary.is_empty() {
            return NO_OBJECTS.to_string();
        }
        match self.tier {
            ActivityTier::Extended => infer_extended(&summary),
            ActivityTier::Minimal => infer_minimal(&summary),
        }
    }
}

fn infer_extended(summary: &ClassSummary) -> String {
    let phrases: Vec<&str> = EXTENDED_RULES
        .iter()
        .filter(|rule| rule.fires(summary))
        .map(|rule| rule.phrase)
        .collect();
    if phrases.is_empty() {
        return describe_counts(summary);
    }
    phrases.join(PHRASE_SEPARATOR)
}

fn infer_minimal(summary: &ClassSummary) -> String {
    MINIMAL_RULES
        .iter()
        .find(|rule| rule.fires(summary))
        .map_or(NO_SPECIFIC_ACTIVITY, |rule| rule.phrase)
        .to_string()
}

/// `"Detected: 3 person, 1 dog"` in first-seen order.
fn describe_counts(summary: &ClassSummary) -> String {
    let objects: Vec<String> = summary
        .counts()
        .map(|(label, count)| format!("{} {}", count, label))
        .collect();
    format!("Detected: {}", objects.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn dets(items: &[(&str, f32)]) -> Vec<Detection> {
        items
            .iter()
            .map(|(label, conf)| Detection::new(*label, *conf, BoundingBox::default()))
            .collect()
    }

    fn repeat(label: &str, conf: f32, n: usize) -> Vec<(&str, f32)> {
        vec![(label, conf); n]
    }

    #[test]
    fn no_detections_is_sentinel_in_both_tiers() {
        assert_eq!(ActivityInferencer::default().infer(&[]), NO_OBJECTS);
        assert_eq!(
            ActivityInferencer::new(ActivityTier::Minimal).infer(&[]),
            NO_OBJECTS
        );
    }

    #[test]
    fn person_watching_tv() {
        let mut items = repeat("person", 0.6, 3);
        items.push(("tv", 0.9));
        let activity = ActivityInferencer::default().infer(&dets(&items));
        assert!(activity.contains("Person watching TV"), "{}", activity);
    }

    #[test]
    fn extended_rules_accumulate_in_table_order() {
        let mut items = repeat("person", 0.8, 2);
        items.extend([("dog", 0.7), ("laptop", 0.6), ("dog", 0.6), ("truck", 0.5)]);
        let activity = ActivityInferencer::default().infer(&dets(&items));
        assert_eq!(
            activity,
            "Person using laptop; Person with dog; Truck present; Multiple dogs present"
        );
    }

    #[test]
    fn single_person_sighting_does_not_fire_person_rules() {
        let activity = ActivityInferencer::default().infer(&dets(&[("person", 0.9), ("tv", 0.9)]));
        assert_eq!(activity, "Detected: 1 person, 1 tv");
    }

    #[test]
    fn low_confidence_person_does_not_fire_person_rules() {
        let mut items = repeat("person", 0.4, 4);
        items.push(("cell phone", 0.9));
        let activity = ActivityInferencer::default().infer(&dets(&items));
        assert_eq!(activity, "Detected: 4 person, 1 cell phone");
    }

    #[test]
    fn vehicle_rules_do_not_need_a_person() {
        let activity = ActivityInferencer::default()
            .infer(&dets(&[("car", 0.4), ("bus", 0.5), ("car", 0.6), ("motorcycle", 0.7)]));
        assert_eq!(
            activity,
            "Multiple cars present; Bus present; Motorcycle present"
        );
    }

    #[test]
    fn fallback_lists_classes_in_first_seen_order() {
        let items = [("dog", 0.5), ("person", 0.5), ("person", 0.5), ("person", 0.5)];
        let activity = ActivityInferencer::default().infer(&dets(&items));
        assert_eq!(activity, "Detected: 1 dog, 3 person");
    }

    #[test]
    fn minimal_tier_returns_first_match_only() {
        let items = [("dog", 0.9), ("person", 0.2), ("cell phone", 0.9), ("tv", 0.9)];
        let activity = ActivityInferencer::new(ActivityTier::Minimal).infer(&dets(&items));
        assert_eq!(activity, "person is watching TV");
    }

    #[test]
    fn minimal_tier_without_match() {
        let activity =
            ActivityInferencer::new(ActivityTier::Minimal).infer(&dets(&[("tv", 0.9)]));
        assert_eq!(activity, NO_SPECIFIC_ACTIVITY);
    }

    #[test]
    fn minimal_tier_phrase_for_each_companion() {
        let cases = [
            ("tv", "person is watching TV"),
            ("cell phone", "person is using a phone"),
            ("laptop", "person is using a laptop"),
            ("dog", "person is with a dog"),
            ("cat", "person is with a cat"),
            ("car", "person is near a car"),
            ("bicycle", "person is riding a bicycle"),
        ];
        assert_eq!(cases.len(), MINIMAL_RULES.len());
        let inferencer = ActivityInferencer::new(ActivityTier::Minimal);
        for (companion, phrase) in cases {
            let activity = inferencer.infer(&dets(&[("person", 0.4), (companion, 0.4)]));
            assert_eq!(activity, phrase, "{}", companion);
        }
    }

    #[test]
    fn minimal_tier_precedence_follows_table_order() {
        let inferencer = ActivityInferencer::new(ActivityTier::Minimal);
        let cases: [(&[(&str, f32)], &str); 4] = [
            (
                &[("laptop", 0.9), ("person", 0.9), ("cell phone", 0.9)],
                "person is using a phone",
            ),
            (
                &[("bicycle", 0.9), ("cat", 0.9), ("person", 0.9), ("dog", 0.9)],
                "person is with a dog",
            ),
            (&[("car", 0.9), ("bicycle", 0.9), ("person", 0.9)], "person is near a car"),
            (&[("laptop", 0.9), ("cat", 0.9), ("person", 0.9)], "person is using a laptop"),
        ];
        for (items, phrase) in cases {
            assert_eq!(inferencer.infer(&dets(items)), phrase);
        }
    }

    #[test]
    fn inference_is_idempotent() {
        let mut items = repeat("person", 0.7, 5);
        items.extend([("car", 0.6), ("chair", 0.5), ("car", 0.8), ("dining table", 0.4)]);
        let detections = dets(&items);
        let inferencer = ActivityInferencer::default();
        let first = inferencer.infer(&detections);
        for _ in 0..10 {
            assert_eq!(inferencer.infer(&detections), first);
        }
        assert_eq!(
            first,
            "Person near car; Person sitting; Person at table; Multiple cars present"
        );
    }

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("MINIMAL".parse::<ActivityTier>().unwrap(), ActivityTier::Minimal);
        assert!("fancy".parse::<ActivityTier>().is_err());
    }
}
