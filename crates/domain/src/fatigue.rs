//! Fatigue self-report scoring

use crate::model::{ComplianceState, FatigueAnswers, FatigueAssessment};

/// Highest attainable fatigue score
pub const MAX_FATIGUE_SCORE: u8 = 4;

/// Score a four-question fatigue self-report
///
/// One point for each of the first three answers being true, and one point
/// for *not* having taken alertness-affecting medication.
pub fn score_fatigue(
    slept_seven_hours: bool,
    feels_fatigue_free: bool,
    fit_to_drive: bool,
    took_medication: bool,
) -> FatigueAssessment {
    let score = [
        slept_seven_hours,
        feels_fatigue_free,
        fit_to_drive,
        !took_medication,
    ]
    .into_iter()
    .filter(|point| *point)
    .count() as u8;

    FatigueAssessment {
        score,
        state: fatigue_state(score),
    }
}

/// Map a fatigue score to its compliance state
pub fn fatigue_state(score: u8) -> ComplianceState {
    match score {
        s if s >= MAX_FATIGUE_SCORE => ComplianceState::Normal,
        2 | 3 => ComplianceState::Warning,
        _ => ComplianceState::Critical,
    }
}

impl FatigueAnswers {
    pub fn assess(&self) -> FatigueAssessment {
        score_fatigue(
            self.slept_seven_hours,
            self.feels_fatigue_free,
            self.fit_to_drive,
            self.took_alertness_affecting_medication,
        )
    }
}
