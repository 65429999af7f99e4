//! Barrel shifters with a dynamic shift-amount port.
//!
//! The shift amount is a signal, not a construction constant, because the
//! variable-latency designs compute it per cycle (the normalization step of
//! the shift-add multiplier). Shifting a 32-bit value by 32 or more drains
//! it to zero, as a real barrel shifter would.

/// A 32-bit left shifter: `out = input << shamt`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LShifter {
    /// Value port.
    pub input: u32,
    /// Shift-amount port.
    pub shamt: u32,
    /// Output port.
    pub out: u32,
}

impl LShifter {
    /// Creates a shifter with all ports zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the left shift; amounts of 32 or more yield zero.
    pub fn recompute(&mut self) {
        self.out = self.input.checked_shl(self.shamt).unwrap_or(0);
    }
}

/// A 32-bit logical right shifter: `out = input >> shamt`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RShifter {
    /// Value port.
    pub input: u32,
    /// Shift-amount port.
    pub shamt: u32,
    /// Output port.
    pub out: u32,
}

impl RShifter {
    /// Creates a shifter with all ports zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the right shift; amounts of 32 or more yield zero.
    pub fn recompute(&mut self) {
        self.out = self.input.checked_shr(self.shamt).unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_shift_by_port_amount() {
        let mut u = LShifter::new();
        u.input = 0b101;
        u.shamt = 3;
        u.recompute();
        assert_eq!(u.out, 0b101000);
    }

    #[test]
    fn right_shift_by_port_amount() {
        let mut u = RShifter::new();
        u.input = 0xF0;
        u.shamt = 4;
        u.recompute();
        assert_eq!(u.out, 0xF);
    }

    #[test]
    fn overlong_shift_drains_to_zero() {
        let mut l = LShifter::new();
        l.input = 1;
        l.shamt = 32;
        l.recompute();
        assert_eq!(l.out, 0);

        let mut r = RShifter::new();
        r.input = u32::MAX;
        r.shamt = 40;
        r.recompute();
        assert_eq!(r.out, 0);
    }
}
