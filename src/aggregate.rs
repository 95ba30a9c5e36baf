//! Per-class aggregation of detections across all sampled frames.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::detect::Detection;

/// Aggregate statistics for one class label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassStat {
    pub class_label: String,
    pub occurrence_count: usize,
    pub mean_confidence: f32,
    /// Fraction of all detections carrying this label.
    pub share_of_total: f32,
}

/// Group `detections` by label, ranked by count (descending).
///
/// Ties keep the order in which labels were first seen.
pub fn aggregate(detections: &[Detection]) -> Vec<ClassStat> {
    // (label, count, confidence sum) in first-seen order
    let mut groups: Vec<(&str, usize, f64)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for detection in detections {
        let label = detection.class_label.as_str();
        let slot = *positions.entry(label).or_insert_with(|| {
            groups.push((label, 0, 0.0));
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.1 += 1;
        group.2 += f64::from(detection.confidence);
    }

    let total = detections.len();
    let mut stats: Vec<ClassStat> = groups
        .into_iter()
        .map(|(label, count, sum)| ClassStat {
            class_label: label.to_string(),
            occurrence_count: count,
            mean_confidence: (sum / count as f64) as f32,
            share_of_total: count as f32 / total as f32,
        })
        .collect();
    // stable: equal counts stay in first-seen order
    stats.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));
    stats
}

/// The `n` most frequent classes.
pub fn top_classes(stats: &[ClassStat], n: usize) -> &[ClassStat] {
    &stats[..n.min(stats.len())]
}
