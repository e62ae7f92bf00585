/// One logical step of a run: render once at `logical_time`, emit `repeat` copies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleStep {
    /// Zero-based logical step index
    pub index: u64,
    /// Simulation time in seconds, `index / fps`
    pub logical_time: f64,
    /// How many identical output frames this step produces
    pub repeat: u32,
}

/// Maps a frame budget onto logical steps under a duplication factor
///
/// Every step but the last repeats `duplication_factor` times; the last is clamped
/// to whatever remains, so the repeats always sum to exactly `target_frames`.
#[derive(Debug, Clone)]
pub struct FrameSchedule {
    target_frames: u64,
    fps: f64,
    duplication_factor: u32,
    next_index: u64,
    frames_scheduled: u64,
}

impl FrameSchedule {
    pub fn new(target_frames: u64, fps: f64, duplication_factor: u32) -> Self {
        Self {
            target_frames,
            fps,
            duplication_factor: duplication_factor.max(1),
            next_index: 0,
            frames_scheduled: 0,
        }
    }

    pub fn target_frames(&self) -> u64 {
        self.target_frames
    }

    /// Total number of frames the synthesizer is asked to compute
    pub fn logical_steps(&self) -> u64 {
        self.target_frames.div_ceil(u64::from(self.duplication_factor))
    }
}

impl Iterator for FrameSchedule {
    type Item = ScheduleStep;

    fn next(&mut self) -> Option<ScheduleStep> {
        let remaining = self.target_frames - self.frames_scheduled;
        if remaining == 0 {
            return None;
        }

        let repeat = remaining.min(u64::from(self.duplication_factor)) as u32;
        let step = ScheduleStep {
            index: self.next_index,
            logical_time: self.next_index as f64 / self.fps,
            repeat,
        };

        self.next_index += 1;
        self.frames_scheduled += u64::from(repeat);
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.logical_steps() - self.next_index) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for FrameSchedule {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_batch_is_truncated() {
        let repeats: Vec<u32> = FrameSchedule::new(10, 30.0, 3).map(|s| s.repeat).collect();
        assert_eq!(repeats, vec![3, 3, 3, 1]);
    }

    #[test]
    fn test_repeats_sum_to_target() {
        for target in [1u64, 2, 7, 30, 299, 300, 301] {
            for dup in [1u32, 2, 3, 5, 8, 1000] {
                let schedule = FrameSchedule::new(target, 24.0, dup);
                let steps = schedule.logical_steps();
                let collected: Vec<ScheduleStep> = schedule.collect();

                assert_eq!(collected.iter().map(|s| u64::from(s.repeat)).sum::<u64>(), target);
                assert_eq!(collected.len() as u64, steps);
                assert!(collected.iter().all(|s| s.repeat >= 1 && s.repeat <= dup));
            }
        }
    }

    #[test]
    fn test_logical_time_advances_one_frame_per_step() {
        let steps: Vec<ScheduleStep> = FrameSchedule::new(8, 4.0, 2).collect();
        let times: Vec<f64> = steps.iter().map(|s| s.logical_time).collect();
        assert_eq!(times, vec![0.0, 0.25, 0.5, 0.75]);
        assert_eq!(steps.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_exact_size_and_restart() {
        let schedule = FrameSchedule::new(10, 30.0, 3);
        assert_eq!(schedule.len(), 4);

        let first: Vec<_> = schedule.clone().collect();
        let second: Vec<_> = schedule.collect();
        assert_eq!(first, second);
    }
}
