use crate::math::{Vector3, Vector4};

#[repr(C)]
#[derive(Copy, Clone, Default, Debug)]
pub struct Vertex {
    pub position: Vector3,
    pub color: Vector4,
}

unsafe impl bytemuck::Zeroable for Vertex {}

unsafe impl bytemuck::Pod for Vertex {}

/// One RGBA color per cube face: front, back, top, bottom, right, left.
pub type FaceColors = [Vector4; 6];

pub const WHITE: Vector4 = Vector4::new(1.0, 1.0, 1.0, 1.0);
pub const RED: Vector4 = Vector4::new(1.0, 0.0, 0.0, 1.0);
pub const GREEN: Vector4 = Vector4::new(0.0, 1.0, 0.0, 1.0);
pub const BLUE: Vector4 = Vector4::new(0.0, 0.0, 1.0, 1.0);
pub const YELLOW: Vector4 = Vector4::new(1.0, 1.0, 0.0, 1.0);
pub const PURPLE: Vector4 = Vector4::new(1.0, 0.0, 1.0, 1.0);
pub const CYAN: Vector4 = Vector4::new(0.0, 1.0, 1.0, 1.0);

pub const PALETTE: [Vector4; 7] = [WHITE, RED, GREEN, BLUE, YELLOW, PURPLE, CYAN];

pub const DEFAULT_FACE_COLORS: FaceColors = [WHITE, RED, GREEN, BLUE, YELLOW, PURPLE];

// Only the front face is opaque, the laser reads as a thin beam.
pub const IDLE_FACE_COLORS: FaceColors = [
    WHITE,
    Vector4::new(1.0, 1.0, 1.0, 0.0),
    Vector4::new(1.0, 1.0, 1.0, 0.0),
    Vector4::new(1.0, 1.0, 1.0, 0.0),
    Vector4::new(1.0, 1.0, 1.0, 0.0),
    Vector4::new(1.0, 1.0, 1.0, 0.0),
];

pub const FLAGGED_FACE_COLORS: FaceColors = [
    RED,
    Vector4::new(1.0, 0.0, 0.0, 0.0),
    Vector4::new(1.0, 0.0, 0.0, 0.0),
    Vector4::new(1.0, 0.0, 0.0, 0.0),
    Vector4::new(1.0, 0.0, 0.0, 0.0),
    Vector4::new(1.0, 0.0, 0.0, 0.0),
];

#[inline]
pub fn solid(color: Vector4) -> FaceColors {
    [color; 6]
}

#[rustfmt::skip]
const CUBE_VERTEX_POSITIONS: [Vector3; 24] = [
    // Front
    Vector3::new(-1.0, -1.0, 1.0), Vector3::new(1.0, -1.0, 1.0),
    Vector3::new(1.0, 1.0, 1.0), Vector3::new(-1.0, 1.0, 1.0),
    // Back
    Vector3::new(-1.0, -1.0, -1.0), Vector3::new(-1.0, 1.0, -1.0),
    Vector3::new(1.0, 1.0, -1.0), Vector3::new(1.0, -1.0, -1.0),
    // Top
    Vector3::new(-1.0, 1.0, -1.0), Vector3::new(-1.0, 1.0, 1.0),
    Vector3::new(1.0, 1.0, 1.0), Vector3::new(1.0, 1.0, -1.0),
    // Bottom
    Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, -1.0, -1.0),
    Vector3::new(1.0, -1.0, 1.0), Vector3::new(-1.0, -1.0, 1.0),
    // Right
    Vector3::new(1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, -1.0),
    Vector3::new(1.0, 1.0, 1.0), Vector3::new(1.0, -1.0, 1.0),
    // Left
    Vector3::new(-1.0, -1.0, -1.0), Vector3::new(-1.0, -1.0, 1.0),
    Vector3::new(-1.0, 1.0, 1.0), Vector3::new(-1.0, 1.0, -1.0),
];

#[rustfmt::skip]
const CUBE_INDICES: [u16; 36] = [
    0, 1, 2, 0, 2, 3,
    4, 5, 6, 4, 6, 7,
    8, 9, 10, 8, 10, 11,
    12, 13, 14, 12, 14, 15,
    16, 17, 18, 16, 18, 19,
    20, 21, 22, 20, 22, 23,
];

/// What an entity looks like: its own face colors, possibly overridden by the "flagged"
/// highlight a pointer hit applies.
#[derive(Copy, Clone, Debug)]
pub struct Appearance {
    face_colors: FaceColors,
    flagged: bool,
}

impl Appearance {
    #[inline]
    pub fn new(face_colors: FaceColors) -> Appearance {
        Appearance {
            face_colors,
            flagged: false,
        }
    }

    #[inline]
    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    #[inline]
    pub fn set_flagged(&mut self, flagged: bool) {
        self.flagged = flagged;
    }

    #[inline]
    pub fn set_face_colors(&mut self, face_colors: FaceColors) {
        self.face_colors = face_colors;
    }

    #[inline]
    pub fn colors(&self) -> &FaceColors {
        if self.flagged {
            &FLAGGED_FACE_COLORS
        } else {
            &self.face_colors
        }
    }
}

impl Default for Appearance {
    #[inline]
    fn default() -> Appearance {
        Appearance::new(DEFAULT_FACE_COLORS)
    }
}

/// CPU-side geometry ready for upload.
///
/// The `generation` goes up on every rebuild; a backend re-uploads whenever it sees a
/// generation it has not uploaded yet.
#[derive(Debug, Default)]
pub struct RenderBuffers {
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
    generation: u32,
}

impl RenderBuffers {
    pub fn rebuild(&mut self, appearance: &Appearance) {
        let colors = appearance.colors();
        self.vertices.clear();
        self.vertices
            .extend(CUBE_VERTEX_POSITIONS.iter().enumerate().map(|(i, &position)| Vertex {
                position,
                color: colors[i / 4],
            }));
        self.indices.clear();
        self.indices.extend_from_slice(&CUBE_INDICES);
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    #[inline]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
