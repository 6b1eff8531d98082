use foundation::time::Time;

/// Frame metadata handed to everything that advances with the host's
/// per-frame callback.
///
/// Frames are plain values so tests can fabricate any timeline without a
/// real clock.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Seconds since the previous frame (0 for the first).
    pub dt_s: f64,
    /// Time at the start of the frame.
    pub time: Time,
}

impl Frame {
    /// Fixed-step frame: `time = index * dt_s`.
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    pub fn at(index: u64, time: Time, dt_s: f64) -> Self {
        Self { index, dt_s, time }
    }

    pub fn next(self) -> Self {
        Self::at(self.index + 1, self.time.after(self.dt_s), self.dt_s)
    }
}

/// Turns raw host timestamps into monotonic [`Frame`]s.
///
/// A timestamp older than the previous one is held at the previous time, so
/// consumers never observe time running backwards.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    next_index: u64,
    last: Option<Time>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, now: Time) -> Frame {
        let time = match self.last {
            Some(last) if now.0 < last.0 => last,
            _ => now,
        };
        let dt_s = self.last.map_or(0.0, |last| time.since(last));
        let frame = Frame::at(self.next_index, time, dt_s);
        self.next_index += 1;
        self.last = Some(time);
        frame
    }
}
