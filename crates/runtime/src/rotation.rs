/// Auto-rotation state of the globe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RotationState {
    #[default]
    Rotating,
    Stopped,
}

impl RotationState {
    pub fn flipped(self) -> Self {
        match self {
            RotationState::Rotating => RotationState::Stopped,
            RotationState::Stopped => RotationState::Rotating,
        }
    }

    /// Caption for the button that triggers the next transition.
    pub fn button_label(self) -> &'static str {
        match self {
            RotationState::Rotating => "Stop Rotation",
            RotationState::Stopped => "Start Rotation",
        }
    }
}

/// Two-state toggle driving the globe spin.
///
/// Starts `Rotating`; each activation flips the state. The spin angle only
/// accumulates while rotating, so resuming continues from where it stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationToggle {
    state: RotationState,
    speed_rad_per_s: f64,
    angle_rad: f64,
}

impl RotationToggle {
    pub fn new(speed_rad_per_s: f64) -> Self {
        Self {
            state: RotationState::Rotating,
            speed_rad_per_s,
            angle_rad: 0.0,
        }
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    pub fn angle_rad(&self) -> f64 {
        self.angle_rad
    }

    /// Flips the state and returns the new one.
    pub fn activate(&mut self) -> RotationState {
        self.state = self.state.flipped();
        tracing::debug!(state = ?self.state, "rotation toggled");
        self.state
    }

    /// Advances the spin by `dt_s` seconds and returns the current angle.
    pub fn advance(&mut self, dt_s: f64) -> f64 {
        if self.state == RotationState::Rotating {
            self.angle_rad = (self.angle_rad + self.speed_rad_per_s * dt_s) % std::f64::consts::TAU;
        }
        self.angle_rad
    }
}

#[cfg(test)]
mod tests {
    use super::{RotationState, RotationToggle};

    #[test]
    fn starts_rotating() {
        let toggle = RotationToggle::new(0.1);
        assert_eq!(toggle.state(), RotationState::Rotating);
        assert_eq!(toggle.state().button_label(), "Stop Rotation");
    }

    #[test]
    fn three_activations_alternate() {
        let mut toggle = RotationToggle::new(0.1);
        let states: Vec<_> = (0..3).map(|_| toggle.activate()).collect();
        assert_eq!(
            states,
            vec![
                RotationState::Stopped,
                RotationState::Rotating,
                RotationState::Stopped
            ]
        );
        assert_eq!(toggle.state().button_label(), "Start Rotation");
    }

    #[test]
    fn angle_only_advances_while_rotating() {
        let mut toggle = RotationToggle::new(0.5);
        assert_eq!(toggle.advance(2.0), 1.0);
        toggle.activate();
        assert_eq!(toggle.advance(10.0), 1.0);
        toggle.activate();
        assert_eq!(toggle.advance(1.0), 1.5);
    }

    #[test]
    fn angle_wraps_at_full_turn() {
        let mut toggle = RotationToggle::new(1.0);
        let a = toggle.advance(std::f64::consts::TAU + 0.25);
        assert!((a - 0.25).abs() < 1e-12);
    }
}
