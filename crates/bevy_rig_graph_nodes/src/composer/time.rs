/// Time values flowing through a composer pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PipelineTime {
    /// Time in seconds once the time stages have run.
    pub time: f32,
    pub delta_time: f32,
    /// Index of the cycle `time` fell into before looping.
    pub cycle: i32,
    /// Position within the cycle, from 0 at the start to 1 at the end.
    pub cycle_fraction: f32,
}

impl PipelineTime {
    pub fn new(time: f32, delta_time: f32) -> Self {
        Self {
            time,
            delta_time,
            cycle: 0,
            cycle_fraction: 0.,
        }
    }

    /// Converts normalized time and delta time into seconds.
    pub fn denormalize(&mut self, duration: f32) {
        self.time *= duration;
        self.delta_time *= duration;
    }

    /// Wraps time into `[0, duration)`. A clip without duration stays at time zero.
    pub fn wrap(&mut self, duration: f32) {
        if duration <= 0. || !self.time.is_finite() {
            self.time = 0.;
            self.cycle = 0;
            self.cycle_fraction = 0.;
            return;
        }

        let mut cycle = (self.time / duration).floor();
        let mut wrapped = self.time - cycle * duration;
        if wrapped >= duration {
            wrapped -= duration;
            cycle += 1.;
        }
        let wrapped = wrapped.max(0.);

        // Saturates for times far outside the i32 cycle range
        self.cycle = cycle as i32;
        self.time = wrapped;
        self.cycle_fraction = wrapped / duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_into_cycles() {
        let mut time = PipelineTime::new(2.5, 0.1);
        time.wrap(1.);
        assert_eq!(time.cycle, 2);
        assert!((time.time - 0.5).abs() < 1e-6);
        assert!((time.cycle_fraction - 0.5).abs() < 1e-6);

        let mut time = PipelineTime::new(-0.25, 0.1);
        time.wrap(1.);
        assert_eq!(time.cycle, -1);
        assert!((time.time - 0.75).abs() < 1e-6);

        let mut time = PipelineTime::new(2., 0.);
        time.wrap(1.);
        assert_eq!((time.cycle, time.time), (2, 0.));
    }

    #[test]
    fn long_playback_keeps_counting_cycles() {
        let mut time = PipelineTime::new(20000.5, 0.1);
        time.wrap(1.);
        assert_eq!(time.cycle, 20000);
        assert!((time.cycle_fraction - 0.5).abs() < 1e-3);
    }

    #[test]
    fn denormalizes_time_and_delta() {
        let mut time = PipelineTime::new(0.5, 0.25);
        time.denormalize(2.);
        assert_eq!((time.time, time.delta_time), (1., 0.5));
    }

    #[test]
    fn empty_duration_stays_at_start() {
        let mut time = PipelineTime::new(3., 0.1);
        time.wrap(0.);
        assert_eq!(time, PipelineTime::new(0., 0.1));
    }
}
