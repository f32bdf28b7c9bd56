use foundation::time::Time;

/// Longest step a single frame may advance.
///
/// Browsers pause animation callbacks for background tabs; without a cap the
/// first frame after resuming would spin the globe by minutes' worth of angle.
pub const MAX_FRAME_DT_S: f64 = 0.1;

/// Frame metadata handed to per-frame update code.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Seconds since the previous frame (clamped).
    pub dt_s: f64,
    /// Host time at the start of the frame.
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64, time: Time) -> Self {
        Self { index, dt_s, time }
    }
}

/// Turns host animation timestamps into `Frame`s.
///
/// The host owns scheduling (e.g. `requestAnimationFrame`); the clock only
/// measures the distance between consecutive callbacks.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    next_index: u64,
    last: Option<Time>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, now: Time) -> Frame {
        let dt_s = match self.last {
            Some(last) => now.since(last).min(MAX_FRAME_DT_S),
            None => 0.0,
        };
        self.last = Some(now);
        let frame = Frame::new(self.next_index, dt_s, now);
        self.next_index = self.next_index.wrapping_add(1);
        frame
    }

    pub fn frames_elapsed(&self) -> u64 {
        self.next_index
    }
}
