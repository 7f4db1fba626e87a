use crate::Millis;

/// Milliseconds from `since` to `now`, correct across a counter wrap.
pub fn elapsed(now: Millis, since: Millis) -> Millis {
    now.wrapping_sub(since)
}

/// Fires once per `interval` of board time. The first call always fires.
pub struct LoopTimer {
    last_fired: Option<Millis>,
    interval: Millis,
}

impl LoopTimer {
    pub const fn new(interval: Millis) -> Self {
        Self {
            last_fired: None,
            interval,
        }
    }

    pub fn should_update(&mut self, now: Millis) -> bool {
        match self.last_fired {
            Some(last) if elapsed(now, last) < self.interval => false,
            Some(last) => {
                self.last_fired = Some(last.wrapping_add(self.interval));
                true
            }
            None => {
                self.last_fired = Some(now);
                true
            }
        }
    }
}
