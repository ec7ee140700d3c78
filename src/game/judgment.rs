use serde::Serialize;

// All windows are distances in field units from the hit line, not seconds.
// A note's timing error and its on-screen distance are proportional through
// the fall speed, so judging on distance keeps the judgement and the visuals
// in lockstep even when the slow-fall upgrade changes the speed.

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeGrade {
    Perfect,
    Great,
    Good,
    Miss,
}

impl JudgeGrade {
    pub fn label(self) -> &'static str {
        match self {
            JudgeGrade::Perfect => "PERFECT",
            JudgeGrade::Great => "GREAT",
            JudgeGrade::Good => "GOOD",
            JudgeGrade::Miss => "MISS",
        }
    }
}

pub fn grade_base_points(grade: JudgeGrade) -> u64 {
    match grade {
        JudgeGrade::Perfect => 100,
        JudgeGrade::Great => 75,
        JudgeGrade::Good => 50,
        JudgeGrade::Miss => 0,
    }
}

/// Per-rating tallies for one attempt.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RatingCounts {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub miss: u32,
}

impl RatingCounts {
    pub fn bump(&mut self, grade: JudgeGrade) {
        match grade {
            JudgeGrade::Perfect => self.perfect = self.perfect.saturating_add(1),
            JudgeGrade::Great => self.great = self.great.saturating_add(1),
            JudgeGrade::Good => self.good = self.good.saturating_add(1),
            JudgeGrade::Miss => self.miss = self.miss.saturating_add(1),
        }
    }
}

/// Grades a press that already qualified for the effective hit window.
/// `distance` is the absolute distance from the hit line.
#[inline(always)]
pub fn classify_distance(distance: f32, perfect_window: f32, great_window: f32) -> JudgeGrade {
    if distance <= perfect_window {
        JudgeGrade::Perfect
    } else if distance <= great_window {
        JudgeGrade::Great
    } else {
        JudgeGrade::Good
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_respects_window_boundaries() {
        // Boundary distances land in the tighter bucket.
        assert_eq!(classify_distance(0.0, 40.0, 80.0), JudgeGrade::Perfect);
        assert_eq!(classify_distance(40.0, 40.0, 80.0), JudgeGrade::Perfect);
        assert_eq!(classify_distance(40.1, 40.0, 80.0), JudgeGrade::Great);
        assert_eq!(classify_distance(80.0, 40.0, 80.0), JudgeGrade::Great);
        assert_eq!(classify_distance(80.1, 40.0, 80.0), JudgeGrade::Good);
        assert_eq!(classify_distance(149.9, 40.0, 80.0), JudgeGrade::Good);
    }

    #[test]
    fn base_points_follow_the_rating_ladder() {
        assert_eq!(grade_base_points(JudgeGrade::Perfect), 100);
        assert_eq!(grade_base_points(JudgeGrade::Great), 75);
        assert_eq!(grade_base_points(JudgeGrade::Good), 50);
        assert_eq!(grade_base_points(JudgeGrade::Miss), 0);
    }

    #[test]
    fn rating_counts_accumulate_per_grade() {
        let mut counts = RatingCounts::default();
        counts.bump(JudgeGrade::Perfect);
        counts.bump(JudgeGrade::Perfect);
        counts.bump(JudgeGrade::Good);
        counts.bump(JudgeGrade::Miss);
        assert_eq!(counts.perfect, 2);
        assert_eq!(counts.great, 0);
        assert_eq!(counts.good, 1);
        assert_eq!(counts.miss, 1);
    }
}
