use crate::{game::EntityId, math::Matrix4};

mod mesh;

pub use mesh::*;

/// Everything a backend needs to draw one entity.
#[derive(Debug)]
pub struct DrawCall<'a> {
    pub entity: EntityId,
    pub model_view: Matrix4,
    pub projection: Matrix4,
    pub buffers: &'a RenderBuffers,
}

/// The rendering backend the scene graph draws through.
///
/// Depth testing is the backend's job, draw calls arrive in tree order.
pub trait Renderer {
    fn draw(&mut self, call: &DrawCall<'_>);
}

/// A drawable surface that can be restricted to a sub-rectangle.
pub trait RenderTarget: Renderer {
    fn set_viewport(&mut self, viewport: Viewport);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub fn full(width: u32, height: u32) -> Viewport {
        Viewport {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Left and right halves of a surface, in that order.
    #[inline]
    pub fn stereo_halves(width: u32, height: u32) -> [Viewport; 2] {
        let half = width / 2;
        [
            Viewport {
                x: 0,
                y: 0,
                width: half,
                height,
            },
            Viewport {
                x: half,
                y: 0,
                width: half,
                height,
            },
        ]
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}
