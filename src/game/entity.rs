use crate::{
    collections::Handle,
    engine::{FrameInput, Millis},
    game::{Composite, CompositeFlags, Pointer},
    gfx::{Appearance, FaceColors, RenderBuffers},
    math::{self, Matrix4, Quaternion, Vector3},
};

pub type EntityId = Handle<Entity>;

/// Where an entity's orientation quaternion comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tracking {
    None,
    /// Derived from (axis, angle) on every update.
    Entity,
    /// Supplied from outside, i.e. the head pose held by the scene.
    Scene,
}

/// Tag deciding which pairs get registered and who handles a collision.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CollisionRole {
    None,
    /// Casts a ray at targets.
    Pointer,
    /// Owns a pointer and hands collisions to it.
    Controller,
    /// Gets flagged and expires when a pointer hits it.
    Target,
}

#[derive(Debug)]
pub enum Behavior {
    Plain,
    Rig { pointer: Option<EntityId> },
    Pointer(Pointer),
}

// One record for every kind of node: plain boxes, composites, rigs, and pointers all share
// the transform and motion state, the rest hangs off `composite` and `behavior`.
#[derive(Debug)]
pub struct Entity {
    parent: Option<EntityId>,

    position: Vector3,
    scale: Vector3,
    angle: f32,
    axis: Vector3,
    orientation: Quaternion,

    velocity: Vector3,
    acceleration: Vector3,
    angular_rate: f32,
    radius: f32,

    tracking: Tracking,
    role: CollisionRole,
    allow_rendering: bool,
    expires_at: Option<Millis>,

    appearance: Appearance,
    buffers: RenderBuffers,

    composite: Option<Composite>,
    behavior: Behavior,
}

impl Default for Entity {
    #[inline]
    fn default() -> Entity {
        Entity::new()
    }
}

impl Entity {
    pub fn new() -> Entity {
        Entity {
            parent: None,
            position: Vector3::default(),
            scale: Vector3::splat(1.0),
            angle: 0.0,
            axis: Vector3::forward(),
            orientation: Quaternion::identity(),
            velocity: Vector3::default(),
            acceleration: Vector3::default(),
            angular_rate: 0.0,
            radius: 1.0,
            tracking: Tracking::None,
            role: CollisionRole::None,
            allow_rendering: true,
            expires_at: None,
            appearance: Appearance::default(),
            buffers: RenderBuffers::default(),
            composite: None,
            behavior: Behavior::Plain,
        }
    }

    /// Something pointers can shoot at.
    #[inline]
    pub fn target() -> Entity {
        Entity::new().with_role(CollisionRole::Target)
    }

    /// A container that renders its children but leaves updating them off.
    #[inline]
    pub fn group() -> Entity {
        Entity {
            composite: Some(Composite::new(CompositeFlags::RENDER_CHILDREN)),
            ..Entity::new()
        }
    }

    /// The player viewpoint. Tracks the head pose and keeps its children ticking.
    #[inline]
    pub fn rig() -> Entity {
        Entity {
            composite: Some(Composite::new(CompositeFlags::all())),
            behavior: Behavior::Rig { pointer: None },
            tracking: Tracking::Scene,
            role: CollisionRole::Controller,
            ..Entity::new()
        }
    }

    #[inline]
    pub fn pointer(controller: usize) -> Entity {
        Entity {
            composite: Some(Composite::new(CompositeFlags::RENDER_CHILDREN)),
            behavior: Behavior::Pointer(Pointer::new(controller)),
            role: CollisionRole::Pointer,
            ..Entity::new()
        }
    }

    #[inline]
    pub fn with_position<V: Into<Vector3>>(mut self, position: V) -> Entity {
        self.position = position.into();
        self
    }

    #[inline]
    pub fn with_scale<V: Into<Vector3>>(mut self, scale: V) -> Entity {
        self.scale = scale.into();
        self
    }

    #[inline]
    pub fn with_rotation<V: Into<Vector3>>(mut self, angle: f32, axis: V) -> Entity {
        self.angle = angle;
        self.axis = axis.into();
        self
    }

    #[inline]
    pub fn with_velocity<V: Into<Vector3>>(mut self, velocity: V) -> Entity {
        self.velocity = velocity.into();
        self
    }

    #[inline]
    pub fn with_acceleration<V: Into<Vector3>>(mut self, acceleration: V) -> Entity {
        self.acceleration = acceleration.into();
        self
    }

    #[inline]
    pub fn with_angular_rate(mut self, angular_rate: f32) -> Entity {
        self.angular_rate = angular_rate;
        self
    }

    #[inline]
    pub fn with_radius(mut self, radius: f32) -> Entity {
        self.radius = radius;
        self
    }

    #[inline]
    pub fn with_tracking(mut self, tracking: Tracking) -> Entity {
        self.tracking = tracking;
        self
    }

    #[inline]
    pub fn with_role(mut self, role: CollisionRole) -> Entity {
        self.role = role;
        self
    }

    #[inline]
    pub fn with_face_colors(mut self, face_colors: FaceColors) -> Entity {
        self.appearance.set_face_colors(face_colors);
        self
    }

    #[inline]
    pub fn with_expiry(mut self, expires_at: Millis) -> Entity {
        self.expires_at = Some(expires_at);
        self
    }

    #[inline]
    pub fn with_composite_flags(mut self, flags: CompositeFlags) -> Entity {
        if let Some(composite) = &mut self.composite {
            composite.set_flags(flags);
        }
        self
    }

    #[inline]
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }

    #[inline]
    pub fn position(&self) -> Vector3 {
        self.position
    }

    #[inline]
    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }

    #[inline]
    pub fn scale(&self) -> Vector3 {
        self.scale
    }

    /// Rotation angle in radians, wrapped into one turn (\[0, TAU)) by `update`.
    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    #[inline]
    pub fn axis(&self) -> Vector3 {
        self.axis
    }

    /// Stored as given; the next `update` wraps `angle` into one turn.
    #[inline]
    pub fn set_rotation(&mut self, angle: f32, axis: Vector3) {
        self.angle = angle;
        self.axis = axis;
    }

    #[inline]
    pub fn orientation(&self) -> Quaternion {
        self.orientation
    }

    #[inline]
    pub fn set_orientation(&mut self, orientation: Quaternion) {
        self.orientation = orientation;
    }

    #[inline]
    pub fn velocity(&self) -> Vector3 {
        self.velocity
    }

    #[inline]
    pub fn set_velocity(&mut self, velocity: Vector3) {
        self.velocity = velocity;
    }

    #[inline]
    pub fn acceleration(&self) -> Vector3 {
        self.acceleration
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn tracking(&self) -> Tracking {
        self.tracking
    }

    #[inline]
    pub fn set_tracking(&mut self, tracking: Tracking) {
        self.tracking = tracking;
    }

    #[inline]
    pub fn role(&self) -> CollisionRole {
        self.role
    }

    #[inline]
    pub fn allows_rendering(&self) -> bool {
        self.allow_rendering
    }

    #[inline]
    pub fn set_allow_rendering(&mut self, allow_rendering: bool) {
        self.allow_rendering = allow_rendering;
    }

    #[inline]
    pub fn expires_at(&self) -> Option<Millis> {
        self.expires_at
    }

    #[inline]
    pub fn set_expires_at(&mut self, expires_at: Option<Millis>) {
        self.expires_at = expires_at;
    }

    #[inline]
    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    #[inline]
    pub fn appearance_mut(&mut self) -> &mut Appearance {
        &mut self.appearance
    }

    #[inline]
    pub fn buffers(&self) -> &RenderBuffers {
        &self.buffers
    }

    #[inline]
    pub fn composite(&self) -> Option<&Composite> {
        self.composite.as_ref()
    }

    #[inline]
    pub fn composite_mut(&mut self) -> Option<&mut Composite> {
        self.composite.as_mut()
    }

    #[inline]
    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    #[inline]
    pub fn as_pointer(&self) -> Option<&Pointer> {
        match &self.behavior {
            Behavior::Pointer(pointer) => Some(pointer),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn as_pointer_mut(&mut self) -> Option<&mut Pointer> {
        match &mut self.behavior {
            Behavior::Pointer(pointer) => Some(pointer),
            _ => None,
        }
    }

    /// The pointer a rig hands its collisions to.
    #[inline]
    pub fn rig_pointer(&self) -> Option<EntityId> {
        match self.behavior {
            Behavior::Rig { pointer } => pointer,
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn set_rig_pointer(&mut self, id: EntityId) {
        if let Behavior::Rig { pointer } = &mut self.behavior {
            *pointer = Some(id);
        }
    }

    /// Advance linear motion and spin by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.velocity += self.acceleration * dt;
        self.angle = math::normalize_angle(self.angle + self.angular_rate * dt);
        if self.tracking == Tracking::Entity {
            self.orientation = Quaternion::from_axis_angle(self.axis, self.angle);
        }
    }

    /// Pull this entity's controller (if it has one) out of the frame snapshot.
    ///
    /// Returns the pointer's new trigger state when it toggled.
    pub(crate) fn sample_input(&mut self, input: &FrameInput, cooldown: Millis) -> Option<bool> {
        let pointer = match &mut self.behavior {
            Behavior::Pointer(pointer) => pointer,
            _ => return None,
        };
        let controller = input.controller(pointer.controller());
        let pose = controller.and_then(|controller| controller.orientation());
        pointer.set_posed(pose.is_some());
        if let Some(orientation) = pose {
            self.orientation = orientation;
        }
        pointer.sample(controller, input.now(), cooldown)
    }

    /// This entity's transform composed onto `parent`: translate, rotate, then scale.
    pub fn local_matrix(&self, parent: &Matrix4) -> Matrix4 {
        let translated = parent.translated(self.position);
        let rotated = match &self.behavior {
            Behavior::Pointer(pointer) if pointer.is_posed() => {
                &translated * &Matrix4::from(self.orientation)
            }
            _ => translated.rotated(self.angle, self.axis),
        };
        rotated.scaled(self.scale)
    }

    /// Inverse of the orientation quaternion's rotation, the way views and rays consume it.
    #[inline]
    pub fn orientation_matrix(&self) -> Matrix4 {
        Matrix4::inverse_rotation(self.orientation)
    }

    /// Whether inserting `other` next to `self` should register the pair `(self, other)`.
    pub fn is_collidable(&self, other: &Entity) -> bool {
        match (self.role, other.role) {
            (CollisionRole::Target, CollisionRole::Pointer)
            | (CollisionRole::Target, CollisionRole::Controller)
            | (CollisionRole::Controller, CollisionRole::Target) => true,
            _ => false,
        }
    }

    #[inline]
    pub fn is_expired(&self, now: Millis) -> bool {
        self.expires_at.map_or(false, |expires_at| now > expires_at)
    }

    /// Falling through the floor. Resting on it is fine.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.position.y() <= 0.0 && self.velocity.y() < 0.0
    }

    /// Regenerate the render buffers from the current appearance.
    #[inline]
    pub fn rebuild_buffers(&mut self) {
        self.buffers.rebuild(&self.appearance);
    }
}
