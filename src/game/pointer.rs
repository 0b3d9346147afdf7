use crate::{
    engine::{ControllerState, Millis},
    game::EntityId,
    math::{Matrix4, Vector3},
};

/// Trigger and laser state of a hand-held pointer.
#[derive(Debug)]
pub struct Pointer {
    controller: usize,
    active: bool,
    released_at: Option<Millis>,
    posed: bool,
    laser: Option<EntityId>,
}

impl Pointer {
    #[inline]
    pub fn new(controller: usize) -> Pointer {
        Pointer {
            controller,
            active: false,
            released_at: None,
            posed: false,
            laser: None,
        }
    }

    /// Which controller slot of the frame input drives this pointer.
    #[inline]
    pub fn controller(&self) -> usize {
        self.controller
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the last sampled controller reported an orientation.
    #[inline]
    pub fn is_posed(&self) -> bool {
        self.posed
    }

    #[inline]
    pub fn laser(&self) -> Option<EntityId> {
        self.laser
    }

    #[inline]
    pub(crate) fn set_laser(&mut self, laser: EntityId) {
        self.laser = Some(laser);
    }

    #[inline]
    pub(crate) fn set_posed(&mut self, posed: bool) {
        self.posed = posed;
    }

    /// Feed this frame's controller state through the trigger logic.
    ///
    /// Pressing activates immediately. Once released, the pointer stays active for `cooldown`
    /// more milliseconds. Returns the new state when it changed.
    pub fn sample(
        &mut self,
        controller: Option<&ControllerState>,
        now: Millis,
        cooldown: Millis,
    ) -> Option<bool> {
        let controller = controller?;
        if !self.active {
            if controller.trigger() {
                self.active = true;
                self.released_at = None;
                return Some(true);
            }
            return None;
        }

        if controller.trigger() {
            self.released_at = None;
            return None;
        }
        let released_at = *self.released_at.get_or_insert(now);
        if now.saturating_sub(released_at) > cooldown {
            self.active = false;
            self.released_at = None;
            return Some(false);
        }
        None
    }
}

/// World-space direction a pointer with the given orientation matrix aims along.
///
/// Local forward is pushed through the orientation as a direction (w = 0). The orientation
/// matrix comes from the pose convention, which disagrees with the render pipeline on the
/// sign of z, so z is flipped afterwards.
pub fn ray_direction(orientation: &Matrix4) -> Vector3 {
    let mut direction = (orientation * Vector3::forward().widened(0.0))
        .narrowed()
        .normalized();
    direction.set_z(-direction.z());
    direction
}

/// Line/sphere intersection with `direction` a unit vector.
///
/// The line is infinite in both directions, so spheres behind the origin count as hits.
pub fn ray_hits_sphere(origin: Vector3, direction: Vector3, center: Vector3, radius: f32) -> bool {
    let offset = origin - center;
    let along = direction.dot(offset);
    along * along >= offset.squared_normal() - radius * radius
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Quaternion;

    fn pressed() -> ControllerState {
        ControllerState::connected().with_trigger(true)
    }

    fn released() -> ControllerState {
        ControllerState::connected()
    }

    #[test]
    fn identity_orientation_aims_down_negative_z() {
        let direction = ray_direction(&Matrix4::identity());
        assert!(direction.approx_eq(Vector3::new(0.0, 0.0, -1.0), 1e-6));
    }

    #[test]
    fn direction_follows_orientation() {
        let q = Quaternion::from_axis_angle(Vector3::up(), std::f32::consts::FRAC_PI_2);
        let direction = ray_direction(&Matrix4::inverse_rotation(q));
        assert!((direction.length() - 1.0).abs() < 1e-6);
        assert!(direction.approx_eq(Vector3::new(-1.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn hits_sphere_on_the_line() {
        let direction = Vector3::new(0.0, 0.0, -1.0);
        let origin = Vector3::default();
        assert!(ray_hits_sphere(origin, direction, Vector3::new(0.0, 0.0, -5.0), 1.0));
        assert!(ray_hits_sphere(origin, direction, Vector3::new(0.9, 0.0, -5.0), 1.0));
        assert!(!ray_hits_sphere(origin, direction, Vector3::new(0.0, 5.0, -5.0), 1.0));
        // No near clamp: behind counts too.
        assert!(ray_hits_sphere(origin, direction, Vector3::new(0.0, 0.0, 5.0), 1.0));
    }

    #[test]
    fn trigger_activates_and_cools_down_after_release() {
        let mut pointer = Pointer::new(0);
        assert_eq!(None, pointer.sample(Some(&released()), 0, 250));
        assert_eq!(Some(true), pointer.sample(Some(&pressed()), 10, 250));
        assert_eq!(None, pointer.sample(Some(&pressed()), 500, 250));
        assert!(pointer.is_active());

        // Released at 600, still inside the cooldown at 850.
        assert_eq!(None, pointer.sample(Some(&released()), 600, 250));
        assert_eq!(None, pointer.sample(Some(&released()), 850, 250));
        assert_eq!(Some(false), pointer.sample(Some(&released()), 851, 250));
        assert!(!pointer.is_active());
    }

    #[test]
    fn pressing_again_cancels_cooldown() {
        let mut pointer = Pointer::new(0);
        pointer.sample(Some(&pressed()), 0, 250);
        pointer.sample(Some(&released()), 100, 250);
        pointer.sample(Some(&pressed()), 200, 250);
        assert_eq!(None, pointer.sample(Some(&released()), 400, 250));
        assert!(pointer.is_active());
    }

    #[test]
    fn missing_controller_leaves_state_alone() {
        let mut pointer = Pointer::new(1);
        pointer.sample(Some(&pressed()), 0, 250);
        assert_eq!(None, pointer.sample(None, 10_000, 250));
        assert!(pointer.is_active());
    }
}
