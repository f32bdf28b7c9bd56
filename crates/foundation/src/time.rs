/// Time primitives
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64); // seconds

impl Time {
    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `earlier`, never negative.
    pub fn since(self, earlier: Time) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Time;

    #[test]
    fn since_never_goes_negative() {
        assert_eq!(Time(2.5).since(Time(1.0)), 1.5);
        assert_eq!(Time(1.0).since(Time(2.5)), 0.0);
    }
}
