//! Linear counter: the triangle channel's fine-grained gate

/// Triangle linear counter
#[derive(Debug, Clone, Default)]
pub struct LinearCounter {
    /// Reload value from $4008
    pub period: u8,
    /// Current count; the triangle is silent at zero
    pub value: u8,
    /// Reload request, set by a $400B write
    pub reload: bool,
    /// Control bit from $4008 bit 7; while set, the reload flag is sticky
    pub control: bool,
}

impl LinearCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quarter-frame clock
    pub fn clock(&mut self) {
        if self.reload {
            self.value = self.period;
        } else if self.value > 0 {
            self.value -= 1;
        }
        if !self.control {
            self.reload = false;
        }
    }

    pub fn active(&self) -> bool {
        self.value > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_then_count() {
        let mut lc = LinearCounter::new();
        lc.period = 3;
        lc.reload = true;

        lc.clock();
        assert_eq!(lc.value, 3, "reload applied");
        assert!(!lc.reload, "reload clears when control is off");

        lc.clock();
        assert_eq!(lc.value, 2);
    }

    #[test]
    fn test_control_keeps_reloading() {
        let mut lc = LinearCounter::new();
        lc.period = 5;
        lc.reload = true;
        lc.control = true;

        lc.clock();
        lc.clock();
        assert_eq!(lc.value, 5, "sticky reload holds the counter at period");
    }
}
