use std::sync::Mutex;

use crate::{
    error::Error,
    move_base::{BaseVelocity, MoveBase},
};

/// `MoveBase` that records every velocity it receives.
#[derive(Debug, Default)]
pub struct DummyMoveBase {
    sent: Mutex<Vec<BaseVelocity>>,
}

impl DummyMoveBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last velocity sent, or zero if nothing has been sent yet.
    pub fn current_velocity(&self) -> BaseVelocity {
        self.sent.lock().unwrap().last().copied().unwrap_or_default()
    }

    pub fn sent_velocities(&self) -> Vec<BaseVelocity> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl MoveBase for DummyMoveBase {
    fn send_velocity(&self, velocity: &BaseVelocity) -> Result<(), Error> {
        self.sent.lock().unwrap().push(*velocity);
        Ok(())
    }
}
