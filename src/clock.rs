/// Frame counter for the animation. The model never owns time; the driver
/// passes `now()` into every evaluation.
#[derive(Clone, Copy, Debug)]
pub struct SimulationClock {
    frame: u64,
    step: f64,
    max_frames: Option<u64>,
}

impl SimulationClock {
    pub fn new(step: f64, max_frames: Option<u64>) -> Self {
        Self {
            frame: 0,
            step,
            max_frames,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn now(&self) -> f64 {
        self.frame as f64 * self.step
    }

    pub fn is_finished(&self) -> bool {
        self.max_frames.map_or(false, |max| self.frame >= max)
    }

    /// Returns false once the frame cap is reached.
    pub fn advance(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.frame += 1;
        true
    }

    pub fn reset(&mut self) {
        self.frame = 0;
    }
}
