use super::{SonanceWorld, logged};
use crate::backend::ListenerProperty;
use crate::math::{Pose, Vec3};

impl SonanceWorld {
    /// Moves and turns the listener.
    pub fn set_listener_pose(&mut self, pose: Pose) -> bool {
        let backend = self.hardware.get_mut();
        let moved = logged(
            "set_listener_property",
            backend.set_listener_property(ListenerProperty::Position(pose.position)),
        )
        .is_some();
        let turned = logged(
            "set_listener_property",
            backend.set_listener_property(ListenerProperty::Orientation(pose.orientation())),
        )
        .is_some();
        self.listener = pose;
        moved && turned
    }

    pub fn listener_pose(&self) -> Pose {
        self.listener
    }

    pub fn set_listener_velocity(&mut self, velocity: Vec3) -> bool {
        logged(
            "set_listener_property",
            self.hardware
                .get_mut()
                .set_listener_property(ListenerProperty::Velocity(velocity)),
        )
        .is_some()
    }

    /// Sets the master gain applied to everything the listener hears.
    pub fn set_listener_volume(&mut self, volume: f32) -> bool {
        logged(
            "set_listener_property",
            self.hardware
                .get_mut()
                .set_listener_property(ListenerProperty::Gain(volume)),
        )
        .is_some()
    }
}
