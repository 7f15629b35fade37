//! Optional exponential-moving-average smoothing over a `ControlParam`.
//!
//! `evaluate()` is stateless, so an `AudioReactive` param's `smoothing`
//! field has no effect there. Callers that want actual smoothing (e.g. a
//! render worker walking frames in order) drive one of these instead,
//! feeding it the raw per-frame value and keeping it alive across frames.

/// EMA smoother: `smoothed' = smoothed + alpha * (raw - smoothed)`.
///
/// `time_constant_s <= 0.0` disables smoothing (the wrapper becomes a
/// pass-through).
pub struct SmoothedParam {
    time_constant_s: f64,
    frame_period_s: f64,
    state: Option<f32>,
}

impl SmoothedParam {
    pub fn new(time_constant_s: f64, frame_rate: u32) -> Self {
        SmoothedParam {
            time_constant_s,
            frame_period_s: 1.0 / frame_rate.max(1) as f64,
            state: None,
        }
    }

    /// Feed the next raw value in frame order and get back the smoothed
    /// value. The first call always returns `raw` unchanged.
    pub fn push(&mut self, raw: f32) -> f32 {
        if self.time_constant_s <= 0.0 {
            return raw;
        }
        let alpha = (1.0 - (-self.frame_period_s / self.time_constant_s).exp()) as f32;
        let next = match self.state {
            Some(prev) => prev + alpha * (raw - prev),
            None => raw,
        };
        self.state = Some(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_time_constant_passes_through() {
        let mut s = SmoothedParam::new(0.0, 30);
        assert_eq!(s.push(1.0), 1.0);
        assert_eq!(s.push(0.0), 0.0);
    }

    #[test]
    fn first_sample_is_unchanged() {
        let mut s = SmoothedParam::new(0.5, 30);
        assert_eq!(s.push(0.8), 0.8);
    }

    #[test]
    fn smoothing_dampens_a_step_change() {
        let mut s = SmoothedParam::new(0.5, 30);
        s.push(0.0);
        let stepped = s.push(1.0);
        assert!(stepped > 0.0 && stepped < 1.0);
    }
}
