use crate::math::{Matrix4, Quaternion};

/// Milliseconds on whatever monotonic clock the driver samples.
pub type Millis = u64;

/// A tracked controller as sampled at the start of a frame.
#[derive(Copy, Clone, Debug, Default)]
pub struct ControllerState {
    connected: bool,
    orientation: Option<Quaternion>,
    trigger: bool,
}

impl ControllerState {
    #[inline]
    pub fn connected() -> ControllerState {
        ControllerState {
            connected: true,
            ..ControllerState::default()
        }
    }

    #[inline]
    pub fn with_orientation(mut self, orientation: Quaternion) -> ControllerState {
        self.orientation = Some(orientation);
        self
    }

    #[inline]
    pub fn with_trigger(mut self, pressed: bool) -> ControllerState {
        self.trigger = pressed;
        self
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[inline]
    pub fn orientation(&self) -> Option<Quaternion> {
        self.orientation
    }

    #[inline]
    pub fn trigger(&self) -> bool {
        self.trigger
    }
}

/// The immutable per-frame snapshot handed to `Scene::update`.
#[derive(Clone, Debug, Default)]
pub struct FrameInput {
    now: Millis,
    controllers: Vec<ControllerState>,
}

impl FrameInput {
    #[inline]
    pub fn new(now: Millis) -> FrameInput {
        FrameInput {
            now,
            controllers: Vec::new(),
        }
    }

    #[inline]
    pub fn with_controller(mut self, controller: ControllerState) -> FrameInput {
        self.controllers.push(controller);
        self
    }

    #[inline]
    pub fn now(&self) -> Millis {
        self.now
    }

    /// A controller slot, only if something is connected there.
    #[inline]
    pub fn controller(&self, index: usize) -> Option<&ControllerState> {
        self.controllers
            .get(index)
            .filter(|controller| controller.is_connected())
    }

    #[inline]
    pub fn controllers(&self) -> &[ControllerState] {
        &self.controllers
    }
}

/// Head pose plus the projection for each eye, as reported by the display for one frame.
#[derive(Copy, Clone, Debug)]
pub struct FramePose {
    pub orientation: Quaternion,
    pub left_projection: Matrix4,
    pub right_projection: Matrix4,
}
