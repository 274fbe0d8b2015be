//! Mapping from pipeline stages to completion percentages.

/// Fixed stages around the per-rendition encodes: fetch, probe, manifest, upload.
const FIXED_STAGES: u32 = 4;

/// Percent schedule for one run.
///
/// With `S` stages, finishing stage `k` (1-based) reports `floor(k * 100 / S)`.
/// Progress inside a stage stays strictly below that stage's end value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSchedule {
    total: u32,
}

impl StageSchedule {
    pub fn new(renditions: usize) -> Self {
        Self {
            total: FIXED_STAGES + renditions as u32,
        }
    }

    /// Number of stages in the run.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Stage number of the first encode.
    pub fn first_encode(&self) -> u32 {
        3
    }

    pub fn manifest(&self) -> u32 {
        self.total - 1
    }

    pub fn upload(&self) -> u32 {
        self.total
    }

    /// Percent once `completed` stages have finished.
    pub fn completed(&self, completed: u32) -> u8 {
        (completed.min(self.total) * 100 / self.total) as u8
    }

    /// Percent `fraction` of the way through `stage`.
    pub fn within(&self, stage: u32, fraction: f32) -> u8 {
        let start = self.completed(stage.saturating_sub(1));
        let end = self.completed(stage);
        if end <= start {
            return start;
        }
        let span = (end - start) as f32;
        let step = (span * fraction.clamp(0.0, 1.0)) as u8;
        (start + step).min(end - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ladder_schedule() {
        // fetch, probe, 3 encodes, manifest, upload
        let schedule = StageSchedule::new(3);
        assert_eq!(schedule.total(), 7);
        let percents: Vec<u8> = (1..=7).map(|k| schedule.completed(k)).collect();
        assert_eq!(percents, vec![14, 28, 42, 57, 71, 85, 100]);
        assert_eq!(schedule.manifest(), 6);
        assert_eq!(schedule.upload(), 7);
    }

    #[test]
    fn test_within_stays_below_stage_end() {
        let schedule = StageSchedule::new(3);
        assert_eq!(schedule.within(3, 0.0), 28);
        assert_eq!(schedule.within(3, 0.5), 35);
        assert_eq!(schedule.within(3, 1.0), 41);
        assert_eq!(schedule.within(7, 1.0), 99);
        // Out of range fractions are clamped
        assert_eq!(schedule.within(3, 7.0), 41);
        assert_eq!(schedule.within(3, -1.0), 28);
    }

    #[test]
    fn test_fewer_stages_never_lower_progress() {
        let full = StageSchedule::new(3);
        let trimmed = StageSchedule::new(1);
        for k in 1..=trimmed.total() {
            assert!(trimmed.completed(k) >= full.completed(k));
        }
    }
}
