mod input;

pub use input::*;

use crate::{
    game::Scene,
    gfx::{RenderTarget, Viewport},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// One pass over the whole surface with whatever projection the scene currently holds.
pub fn render_mono<T: RenderTarget>(scene: &Scene, target: &mut T, viewport: Viewport) {
    target.set_viewport(viewport);
    scene.render(target);
}

/// Two passes, left eye then right eye, each into its half of a `width` x `height` surface.
///
/// The scene keeps no per-eye state: the head orientation is applied once and each pass
/// overwrites the projection before rendering. Leaves the right eye's projection installed.
pub fn render_stereo<T: RenderTarget>(
    scene: &mut Scene,
    pose: &FramePose,
    target: &mut T,
    width: u32,
    height: u32,
) {
    scene.set_orientation(pose.orientation);
    let [left, right] = Viewport::stereo_halves(width, height);
    let passes = [
        (Eye::Left, pose.left_projection, left),
        (Eye::Right, pose.right_projection, right),
    ];
    for &(eye, projection, viewport) in passes.iter() {
        log::trace!("Rendering {:?} eye into {:?}", eye, viewport);
        scene.set_projection(projection);
        target.set_viewport(viewport);
        scene.render(target);
    }
}
