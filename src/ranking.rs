//! Experience-based route selection and annotation

use std::cmp::Ordering;

use serde::Serialize;

use crate::models::{DriverExperience, RoadType, RouteAssessment};

/// An assessed route as presented to the driver
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteReport {
    #[serde(flatten)]
    pub assessment: RouteAssessment,
    pub safety_score: u8,
    pub warnings: Vec<String>,
    pub advantages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_note: Option<String>,
}

impl RouteReport {
    #[must_use]
    pub fn new(assessment: RouteAssessment, experience: DriverExperience) -> Self {
        let safety_score = assessment.safety_score();
        Self {
            warnings: warnings(&assessment),
            advantages: advantages(&assessment),
            experience_note: experience_note(&assessment, experience),
            safety_score,
            assessment,
        }
    }
}

/// Order assessments and keep those suited to `experience`
///
/// With `avoid_risk` the order is average risk, then peak risk, then high-risk
/// segment count; otherwise it is travel time. Never empty for non-empty input.
#[must_use]
pub fn select(
    mut assessments: Vec<RouteAssessment>,
    experience: DriverExperience,
    avoid_risk: bool,
) -> Vec<RouteAssessment> {
    if avoid_risk {
        assessments.sort_by(by_risk);
    } else {
        assessments.sort_by_key(|a| parse_duration_minutes(&a.duration));
    }

    let (fallback, cap) = match experience {
        DriverExperience::Beginner => (1, 3),
        DriverExperience::Intermediate => (2, 4),
        DriverExperience::Expert => (0, 5),
    };

    let Some(ceiling) = experience.risk_ceiling() else {
        assessments.truncate(cap);
        return assessments;
    };

    let (mut within, mut above): (Vec<_>, Vec<_>) = assessments
        .into_iter()
        .partition(|a| a.average_risk < ceiling);

    if within.is_empty() {
        above.sort_by(by_risk);
        above.truncate(fallback);
        return above;
    }

    within.truncate(cap);
    within
}

fn by_risk(a: &RouteAssessment, b: &RouteAssessment) -> Ordering {
    a.average_risk
        .total_cmp(&b.average_risk)
        .then(a.max_risk.total_cmp(&b.max_risk))
        .then(a.high_risk_segments.cmp(&b.high_risk_segments))
}

/// Total minutes in a duration like "2 hours 45 mins", 60 when nothing parses
#[must_use]
pub fn parse_duration_minutes(text: &str) -> u64 {
    let tokens: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();

    let mut minutes: u64 = 0;
    let mut parsed = false;
    for pair in tokens.windows(2) {
        let Ok(value) = pair[0].parse::<u64>() else {
            continue;
        };
        let unit = pair[1].as_str();
        let factor = if unit.starts_with("day") {
            24 * 60
        } else if unit.starts_with("hour") || unit.starts_with("hr") {
            60
        } else if unit.starts_with("min") {
            1
        } else {
            continue;
        };
        minutes = minutes.saturating_add(value.saturating_mul(factor));
        parsed = true;
    }

    if parsed { minutes } else { 60 }
}

fn experience_note(assessment: &RouteAssessment, experience: DriverExperience) -> Option<String> {
    let safety = assessment.safety_score();
    let above_ceiling = experience
        .risk_ceiling()
        .is_some_and(|ceiling| assessment.average_risk >= ceiling);

    let note = match experience {
        DriverExperience::Beginner if above_ceiling => {
            "Above beginner risk level - safest available option, consider postponing"
        }
        DriverExperience::Beginner if safety < 80 => "Pay extra attention to road conditions",
        DriverExperience::Intermediate if above_ceiling => {
            "Above intermediate risk level - safest available option, consider postponing"
        }
        DriverExperience::Intermediate if safety < 60 => {
            "Requires careful attention in icy sections"
        }
        DriverExperience::Expert if safety < 40 => "Extreme conditions - expert skills required",
        DriverExperience::Expert if safety < 60 => "Challenging conditions ahead",
        _ => return None,
    };
    Some(note.to_string())
}

fn warnings(assessment: &RouteAssessment) -> Vec<String> {
    let mut warnings = Vec::new();

    if assessment.max_risk >= 0.8 {
        warnings.push("Severe icing expected on parts of this route".to_string());
    }
    match assessment.high_risk_segments {
        0 => {}
        1 => warnings.push("1 high-risk segment".to_string()),
        n => warnings.push(format!("{n} high-risk segments")),
    }
    if assessment.crosses_bridge() {
        warnings.push("Bridges and overpasses freeze first".to_string());
    }
    if matches!(assessment.road_type, RoadType::Local | RoadType::Scenic) {
        warnings.push("Limited winter maintenance".to_string());
    }

    warnings
}

fn advantages(assessment: &RouteAssessment) -> Vec<String> {
    let mut advantages = Vec::new();

    if assessment.road_type == RoadType::Highway {
        advantages.push("Well-maintained highway".to_string());
    }
    if assessment.average_risk < 0.3 {
        advantages.push("Low overall ice risk".to_string());
    }
    if !assessment.samples.is_empty() && assessment.risk_variance < 0.01 {
        advantages.push("Consistent conditions along the route".to_string());
    }

    advantages
}
