use teleop_core::{BaseVelocity, DummyMoveBase, MoveBase};
use tracing::{debug, info};

/// `MoveBase` for `--dry-run`: logs every velocity instead of sending it.
///
/// A velocity that differs from the previous one is logged at `info`,
/// repeats at `debug`. Everything is also recorded by the inner
/// [`DummyMoveBase`].
#[derive(Debug, Default)]
pub struct LoggingMoveBase {
    inner: DummyMoveBase,
}

impl LoggingMoveBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> &DummyMoveBase {
        &self.inner
    }
}

impl MoveBase for LoggingMoveBase {
    fn send_velocity(&self, velocity: &BaseVelocity) -> Result<(), teleop_core::Error> {
        let changed = self.inner.sent_count() == 0 || self.inner.current_velocity() != *velocity;
        if changed {
            info!(x = velocity.x, y = velocity.y, theta = velocity.theta, "send_velocity");
        } else {
            debug!(x = velocity.x, y = velocity.y, theta = velocity.theta, "send_velocity");
        }
        self.inner.send_velocity(velocity)
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn test_records_every_velocity() {
        let base = LoggingMoveBase::new();
        assert_eq!(base.recorded().sent_count(), 0);
        base.send_velocity(&BaseVelocity::ZERO).unwrap();
        base.send_velocity(&BaseVelocity::new(0.5, 0.0, -0.3)).unwrap();
        base.send_velocity(&BaseVelocity::new(0.5, 0.0, -0.3)).unwrap();
        assert_eq!(base.recorded().sent_count(), 3);
        let vel = base.recorded().current_velocity();
        assert_approx_eq!(vel.x, 0.5);
        assert_approx_eq!(vel.theta, -0.3);
    }
}
