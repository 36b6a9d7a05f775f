pub const DEFAULT_FOCUS_MINUTES: u32 = 25;

#[derive(Debug, Clone)]
pub struct FocusTimer {
    session_secs: u32,
    remaining_secs: u32,
    running: bool,
}

impl FocusTimer {
    pub fn new(session_minutes: u32) -> Self {
        let session_secs = session_minutes.max(1) * 60;
        Self {
            session_secs,
            remaining_secs: session_secs,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    // One tick per second of wall clock; the caller owns the cadence.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.running = false;
        }
    }

    pub fn toggle(&mut self) {
        if self.remaining_secs == 0 {
            return;
        }
        self.running = !self.running;
    }

    pub fn reset(&mut self) {
        self.remaining_secs = self.session_secs;
        self.running = false;
    }

    pub fn display(&self) -> String {
        format_countdown(self.remaining_secs)
    }
}

pub fn format_countdown(total_seconds: u32) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::{FocusTimer, format_countdown};

    #[test]
    fn ticks_only_while_running_and_stops_at_zero() {
        let mut timer = FocusTimer::new(1);
        timer.tick();
        assert_eq!(timer.remaining_secs(), 60, "paused timers do not advance");

        timer.toggle();
        for _ in 0..60 {
            timer.tick();
        }
        assert_eq!(timer.remaining_secs(), 0);
        assert!(!timer.is_running(), "timer stops itself at zero");

        timer.tick();
        assert_eq!(timer.remaining_secs(), 0);
        timer.toggle();
        assert!(!timer.is_running(), "an elapsed timer cannot be restarted without reset");
    }

    #[test]
    fn toggle_is_an_involution_and_reset_restores_the_session() {
        let mut timer = FocusTimer::new(25);
        timer.toggle();
        assert!(timer.is_running());
        timer.toggle();
        assert!(!timer.is_running());

        timer.toggle();
        timer.tick();
        timer.tick();
        timer.reset();
        assert_eq!(timer.remaining_secs(), 25 * 60);
        assert!(!timer.is_running());
    }

    #[test]
    fn countdown_formats_as_zero_padded_minutes_and_seconds() {
        assert_eq!(format_countdown(25 * 60), "25:00");
        assert_eq!(format_countdown(9), "00:09");
        assert_eq!(format_countdown(61), "01:01");
        assert_eq!(FocusTimer::new(25).display(), "25:00");
    }
}
