use bitflags::bitflags;
use smallvec::SmallVec;

use crate::game::EntityId;

bitflags! {
    pub struct CompositeFlags: u8 {
        const UPDATE_CHILDREN = 0b01;
        const RENDER_CHILDREN = 0b10;
    }
}

/// An ordered pair checked every tick: `first.check_and_handle_collision(second)`.
pub type CollidablePair = (EntityId, EntityId);

/// The child-owning half of an entity.
///
/// Children keep insertion order. Pairs are decided once, when the second entity is
/// inserted, and only ever go away together with one of their endpoints.
#[derive(Debug)]
pub struct Composite {
    flags: CompositeFlags,
    children: SmallVec<[EntityId; 8]>,
    collidables: SmallVec<[CollidablePair; 8]>,
}

impl Composite {
    #[inline]
    pub fn new(flags: CompositeFlags) -> Composite {
        Composite {
            flags,
            children: SmallVec::new(),
            collidables: SmallVec::new(),
        }
    }

    #[inline]
    pub fn flags(&self) -> CompositeFlags {
        self.flags
    }

    #[inline]
    pub fn set_flags(&mut self, flags: CompositeFlags) {
        self.flags = flags;
    }

    #[inline]
    pub fn updates_children(&self) -> bool {
        self.flags.contains(CompositeFlags::UPDATE_CHILDREN)
    }

    #[inline]
    pub fn renders_children(&self) -> bool {
        self.flags.contains(CompositeFlags::RENDER_CHILDREN)
    }

    #[inline]
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Get the nth direct child's id
    #[inline]
    pub fn nth_child(&self, n: usize) -> Option<EntityId> {
        self.children.get(n).copied()
    }

    #[inline]
    pub fn collidables(&self) -> &[CollidablePair] {
        &self.collidables
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.children.contains(&id)
    }

    pub(crate) fn push(&mut self, id: EntityId, partners: &[EntityId]) {
        self.collidables
            .extend(partners.iter().map(|&partner| (partner, id)));
        self.children.push(id);
    }

    /// Drop `id` and every pair mentioning it. Survivors keep their relative order.
    pub(crate) fn remove(&mut self, id: EntityId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.collidables
            .retain(|&mut (first, second)| first != id && second != id);
        self.children.retain(|&mut child| child != id);
        true
    }
}
