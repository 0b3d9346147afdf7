use smallvec::SmallVec;
use std::cell::Cell;

use crate::{
    collections::{Pool, PoolIter},
    config::{PointerConfig, ProjectionConfig, SceneConfig},
    engine::{FrameInput, Millis},
    game::{
        pointer, CollidablePair, CollisionRole, CompositeFlags, Entity, EntityId, Pointer, Tracking,
    },
    gfx::{DrawCall, Renderer, IDLE_FACE_COLORS},
    math::{Matrix4, Quaternion, Vector3},
};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SceneError {
    #[error("No live entity {0:?} in the scene")]
    UnknownEntity(EntityId),

    #[error("Entity {0:?} cannot own children")]
    NotComposite(EntityId),
}

type Children = SmallVec<[EntityId; 8]>;
type Pairs = SmallVec<[CollidablePair; 8]>;

/// The root of the entity tree plus everything needed to look at it.
///
/// All entities live in one arena; the tree is expressed through composite child lists and
/// parent handles. The view entity is an ordinary member of the tree.
#[derive(Debug)]
pub struct Scene {
    entities: Pool<Entity>,
    root: EntityId,
    view_entity: EntityId,
    orientation: Quaternion,
    perspective: ProjectionConfig,
    projection: Cell<Option<Matrix4>>,
    pointer_config: PointerConfig,
}

impl Default for Scene {
    #[inline]
    fn default() -> Scene {
        Scene::new()
    }
}

impl Scene {
    #[inline]
    pub fn new() -> Scene {
        Scene::with_config(&SceneConfig::default())
    }

    /// A scene viewed through a player rig at the configured viewpoint.
    pub fn with_config(config: &SceneConfig) -> Scene {
        let mut scene = Scene::empty(config);
        let root = scene.root;
        scene.view_entity = scene.build_player_rig(root, config.viewpoint_position.into());
        scene
    }

    /// A scene viewed through `viewpoint`, which becomes the root's first child.
    pub fn with_viewpoint(config: &SceneConfig, viewpoint: Entity) -> Scene {
        let mut scene = Scene::empty(config);
        let root = scene.root;
        scene.view_entity = scene.link(root, viewpoint);
        scene
    }

    fn empty(config: &SceneConfig) -> Scene {
        let mut entities = Pool::default();
        let root = entities.register(Entity::group().with_composite_flags(CompositeFlags::all()));
        Scene {
            entities,
            root,
            view_entity: root,
            orientation: Quaternion::identity(),
            perspective: config.projection.clone(),
            projection: Cell::new(None),
            pointer_config: config.pointer.clone(),
        }
    }

    #[inline]
    pub fn root(&self) -> EntityId {
        self.root
    }

    #[inline]
    pub fn view_entity(&self) -> EntityId {
        self.view_entity
    }

    /// Look through a different entity from now on.
    pub fn set_view_entity(&mut self, id: EntityId) -> Result<(), SceneError> {
        if !self.entities.contains(id) {
            return Err(SceneError::UnknownEntity(id));
        }
        log::debug!("Switching view to {:?}", id);
        self.view_entity = id;
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.try_get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.try_get_mut(id)
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    /// Number of live entities, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Every live entity, in no particular order.
    #[inline]
    pub fn entities(&self) -> PoolIter<'_, Entity> {
        self.entities.iter()
    }

    #[inline]
    pub fn orientation(&self) -> Quaternion {
        self.orientation
    }

    /// The externally tracked head orientation, used by any view entity that does not
    /// track its own.
    #[inline]
    pub fn set_orientation(&mut self, orientation: Quaternion) {
        self.orientation = orientation;
    }

    #[inline]
    pub fn perspective(&self) -> &ProjectionConfig {
        &self.perspective
    }

    pub fn change_projection(&mut self, fov: f32, aspect: f32, near: f32, far: f32) {
        self.perspective = ProjectionConfig {
            fov,
            aspect,
            near,
            far,
        };
        self.projection
            .set(Some(Matrix4::perspective(fov, aspect, near, far)));
    }

    /// Replace the projection outright, e.g. with the matrix a headset reports for one eye.
    #[inline]
    pub fn set_projection(&mut self, projection: Matrix4) {
        self.projection.set(Some(projection));
    }

    pub fn projection_matrix(&self) -> Matrix4 {
        if let Some(projection) = self.projection.get() {
            return projection;
        }
        let ProjectionConfig {
            fov,
            aspect,
            near,
            far,
        } = self.perspective;
        let projection = Matrix4::perspective(fov, aspect, near, far);
        self.projection.set(Some(projection));
        projection
    }

    pub fn view_matrix(&self) -> Matrix4 {
        let (position, orientation) = match self.entities.try_get(self.view_entity) {
            Some(view) if view.tracking() == Tracking::Entity => {
                (view.position(), view.orientation_matrix())
            }
            Some(view) => (view.position(), Matrix4::inverse_rotation(self.orientation)),
            None => {
                log::warn!("View entity {:?} is gone, viewing from the origin", self.view_entity);
                (Vector3::default(), Matrix4::inverse_rotation(self.orientation))
            }
        };
        orientation.translated(-position)
    }

    /// World transform of an entity: every ancestor's local transform composed top-down.
    pub fn model_matrix(&self, id: EntityId) -> Matrix4 {
        let entity = match self.entities.try_get(id) {
            Some(entity) => entity,
            None => {
                log::warn!("No entity {:?} for a transform query", id);
                return Matrix4::identity();
            }
        };
        let parent = match entity.parent() {
            Some(parent) => self.model_matrix(parent),
            None => Matrix4::identity(),
        };
        entity.local_matrix(&parent)
    }

    /// Sum of the positions along the ancestor chain. Ancestor rotation and scale are not
    /// applied.
    pub fn world_position(&self, id: EntityId) -> Vector3 {
        let mut position = Vector3::default();
        let mut next = Some(id);
        while let Some(id) = next {
            match self.entities.try_get(id) {
                Some(entity) => {
                    position += entity.position();
                    next = entity.parent();
                }
                None => {
                    log::warn!("No entity {:?} for a position query", id);
                    break;
                }
            }
        }
        position
    }

    /// Insert `entity` as the last child of `parent`.
    ///
    /// Every existing child that finds the newcomer collidable gets paired with it. The
    /// newcomer's own opinion of the existing children is never asked.
    pub fn add_entity(&mut self, parent: EntityId, entity: Entity) -> Result<EntityId, SceneError> {
        match self.entities.try_get(parent) {
            None => Err(SceneError::UnknownEntity(parent)),
            Some(owner) if owner.composite().is_none() => Err(SceneError::NotComposite(parent)),
            Some(_) => Ok(self.link(parent, entity)),
        }
    }

    /// Insert under the root.
    #[inline]
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let root = self.root;
        self.link(root, entity)
    }

    /// A pointer driven by `controller`, with its body and laser.
    pub fn add_pointer(
        &mut self,
        parent: EntityId,
        position: Vector3,
        controller: usize,
    ) -> Result<EntityId, SceneError> {
        self.check_composite(parent)?;
        Ok(self.build_pointer(parent, position, controller))
    }

    /// A player rig holding a pointer on controller 0.
    pub fn add_player_rig(&mut self, parent: EntityId, position: Vector3) -> Result<EntityId, SceneError> {
        self.check_composite(parent)?;
        Ok(self.build_player_rig(parent, position))
    }

    /// Detach `child` from `parent` and free its whole subtree. Returns whether anything
    /// was removed.
    pub fn remove_entity(&mut self, parent: EntityId, child: EntityId) -> bool {
        let removed = self
            .entities
            .try_get_mut(parent)
            .and_then(Entity::composite_mut)
            .map_or(false, |composite| composite.remove(child));
        if removed {
            self.free_subtree(child);
            log::debug!("Removed {:?} from {:?}", child, parent);
        }
        removed
    }

    /// Advance the whole tree by `dt` seconds against one input snapshot.
    pub fn update(&mut self, dt: f32, input: &FrameInput) {
        let root = self.root;
        self.update_entity(root, dt, input);
    }

    /// Emit a draw call for every renderable leaf, in tree order.
    pub fn render<R: Renderer>(&self, renderer: &mut R) {
        let view = self.view_matrix();
        let projection = self.projection_matrix();
        self.render_entity(self.root, &Matrix4::identity(), &view, &projection, renderer);
    }

    fn render_entity<R: Renderer>(
        &self,
        id: EntityId,
        parent: &Matrix4,
        view: &Matrix4,
        projection: &Matrix4,
        renderer: &mut R,
    ) {
        let entity = match self.entities.try_get(id) {
            Some(entity) => entity,
            None => return,
        };
        let model = entity.local_matrix(parent);
        match entity.composite() {
            Some(composite) => {
                if composite.renders_children() {
                    for &child in composite.children() {
                        self.render_entity(child, &model, view, projection, renderer);
                    }
                }
            }
            None => {
                if entity.allows_rendering() {
                    renderer.draw(&DrawCall {
                        entity: id,
                        model_view: view * &model,
                        projection: *projection,
                        buffers: entity.buffers(),
                    });
                }
            }
        }
    }

    fn check_composite(&self, id: EntityId) -> Result<(), SceneError> {
        match self.entities.try_get(id) {
            None => Err(SceneError::UnknownEntity(id)),
            Some(entity) if entity.composite().is_none() => Err(SceneError::NotComposite(id)),
            Some(_) => Ok(()),
        }
    }

    fn link(&mut self, parent: EntityId, mut entity: Entity) -> EntityId {
        let entities = &self.entities;
        let partners: Children = entities
            .try_get(parent)
            .and_then(Entity::composite)
            .map(|composite| {
                composite
                    .children()
                    .iter()
                    .copied()
                    .filter(|&child| {
                        entities
                            .try_get(child)
                            .map_or(false, |child| child.is_collidable(&entity))
                    })
                    .collect()
            })
            .unwrap_or_default();

        entity.set_parent(Some(parent));
        entity.rebuild_buffers();
        let id = self.entities.register(entity);
        if let Some(composite) = self.entities.try_get_mut(parent).and_then(Entity::composite_mut) {
            composite.push(id, &partners);
        }
        log::debug!("Added {:?} under {:?} ({} new pairs)", id, parent, partners.len());
        id
    }

    fn build_pointer(&mut self, parent: EntityId, position: Vector3, controller: usize) -> EntityId {
        let id = self.link(parent, Entity::pointer(controller).with_position(position));
        self.link(
            id,
            Entity::new()
                .with_position((0.0, 0.0, 0.04))
                .with_scale((0.04, 0.04, 0.08))
                .with_face_colors(IDLE_FACE_COLORS),
        );
        let laser = self.link(
            id,
            Entity::new()
                .with_position((0.0, 0.0, -10.0))
                .with_scale((0.01, 0.01, 10.0))
                .with_face_colors(IDLE_FACE_COLORS),
        );
        if let Some(pointer) = self.entities.try_get_mut(id).and_then(Entity::as_pointer_mut) {
            pointer.set_laser(laser);
        }
        id
    }

    fn build_player_rig(&mut self, parent: EntityId, position: Vector3) -> EntityId {
        let rig = self.link(parent, Entity::rig().with_position(position));
        let pointer = self.build_pointer(rig, Vector3::new(0.1, -0.3, -0.5), 0);
        if let Some(entity) = self.entities.try_get_mut(rig) {
            entity.set_rig_pointer(pointer);
        }
        rig
    }

    fn free_subtree(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.try_remove(id) {
            if let Some(composite) = entity.composite() {
                for &child in composite.children() {
                    self.free_subtree(child);
                }
            }
        }
    }

    fn update_entity(&mut self, id: EntityId, dt: f32, input: &FrameInput) {
        let cooldown = self.pointer_config.release_cooldown_ms;
        let (toggled, laser, snapshot) = match self.entities.try_get_mut(id) {
            Some(entity) => {
                // Composites only sweep their children, they never move themselves.
                if entity.composite().is_none() {
                    entity.update(dt);
                }
                let toggled = entity.sample_input(input, cooldown);
                let laser = entity.as_pointer().and_then(Pointer::laser);
                let snapshot = entity
                    .composite()
                    .filter(|composite| composite.updates_children())
                    .map(|composite| -> (Children, Pairs) {
                        (
                            SmallVec::from_slice(composite.children()),
                            SmallVec::from_slice(composite.collidables()),
                        )
                    });
                (toggled, laser, snapshot)
            }
            None => return,
        };

        if let Some(active) = toggled {
            log::debug!("Pointer {:?} trigger active: {}", id, active);
            if let Some(laser) = laser.and_then(|laser| self.entities.try_get_mut(laser)) {
                laser.appearance_mut().set_flagged(active);
                laser.rebuild_buffers();
            }
        }

        let (children, pairs) = match snapshot {
            Some(snapshot) => snapshot,
            None => return,
        };
        for &child in &children {
            self.update_entity(child, dt, input);
        }

        let now = input.now();
        for &pair in &pairs {
            self.check_and_handle_collision(pair, now);
        }

        let mut doomed = Children::new();
        for &child in &children {
            if let Some(entity) = self.entities.try_get(child) {
                if (entity.is_expired(now) || entity.is_grounded()) && !doomed.contains(&child) {
                    doomed.push(child);
                }
            }
        }
        for child in doomed {
            self.remove_entity(id, child);
        }
    }

    /// Hand a registered pair to whichever side knows how to handle it.
    fn check_and_handle_collision(&mut self, (first, second): CollidablePair, now: Millis) {
        let (a, b) = match (self.entities.try_get(first), self.entities.try_get(second)) {
            (Some(a), Some(b)) => (a, b),
            _ => panic!("Collidable pair ({:?}, {:?}) outlived an endpoint", first, second),
        };
        let (pointer, target) = match (a.role(), b.role()) {
            (_, CollisionRole::Pointer) => (second, first),
            (_, CollisionRole::Controller) => match b.rig_pointer() {
                Some(pointer) => (pointer, first),
                None => return,
            },
            (CollisionRole::Controller, _) => match a.rig_pointer() {
                Some(pointer) => (pointer, second),
                None => return,
            },
            _ => return,
        };
        self.handle_pointer_collision(pointer, target, now);
    }

    fn handle_pointer_collision(&mut self, pointer: EntityId, target: EntityId, now: Millis) {
        let (direction, radius) = match (self.entities.try_get(pointer), self.entities.try_get(target)) {
            (Some(p), Some(t)) if p.as_pointer().map_or(false, Pointer::is_active) => {
                (pointer::ray_direction(&p.orientation_matrix()), t.radius())
            }
            _ => return,
        };
        let origin = self.world_position(pointer);
        let center = self.world_position(target);
        if !pointer::ray_hits_sphere(origin, direction, center, radius) {
            return;
        }

        let expires_at = now + self.pointer_config.hit_expiry_ms;
        if let Some(entity) = self.entities.try_get_mut(target) {
            if !entity.appearance().is_flagged() {
                log::info!("Pointer {:?} hit {:?}", pointer, target);
            }
            entity.appearance_mut().set_flagged(true);
            entity.set_expires_at(Some(expires_at));
            entity.rebuild_buffers();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::ControllerState;

    fn bare() -> Scene {
        Scene::with_viewpoint(&SceneConfig::default(), Entity::new())
    }

    fn firing(now: Millis) -> FrameInput {
        FrameInput::new(now).with_controller(ControllerState::connected().with_trigger(true))
    }

    fn children(scene: &Scene, id: EntityId) -> Vec<EntityId> {
        scene
            .get(id)
            .and_then(Entity::composite)
            .map(|composite| composite.children().to_vec())
            .unwrap_or_default()
    }

    fn pairs(scene: &Scene, id: EntityId) -> Vec<CollidablePair> {
        scene
            .get(id)
            .and_then(Entity::composite)
            .map(|composite| composite.collidables().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn default_scene_has_rig_and_pointer() {
        let scene = Scene::new();
        let rig = scene.view_entity();
        assert_eq!(&[rig], children(&scene, scene.root()).as_slice());

        let entity = scene.get(rig).unwrap();
        assert_eq!(Tracking::Scene, entity.tracking());
        let pointer = entity.rig_pointer().unwrap();
        assert!(scene.world_position(pointer).approx_eq(Vector3::new(0.1, -0.3, 4.5), 1e-6));

        let laser = scene.get(pointer).and_then(Entity::as_pointer).and_then(Pointer::laser).unwrap();
        assert_eq!(2, children(&scene, pointer).len());
        assert_eq!(Some(pointer), scene.get(laser).unwrap().parent());
        // root, rig, pointer, body, laser
        assert_eq!(5, scene.len());
        assert_eq!(5, scene.entities().count());
    }

    #[test]
    fn extra_rigs_get_their_own_pointer() {
        let mut scene = bare();
        let rig = scene
            .add_player_rig(scene.root(), Vector3::new(1.0, 0.0, 0.0))
            .unwrap();
        let pointer = scene.get(rig).and_then(Entity::rig_pointer).unwrap();
        assert_eq!(Some(rig), scene.get(pointer).unwrap().parent());
        assert_eq!(CollisionRole::Controller, scene.get(rig).unwrap().role());

        let body = children(&scene, pointer)[0];
        assert_eq!(
            Err(SceneError::NotComposite(body)),
            scene.add_player_rig(body, Vector3::default())
        );
    }

    #[test]
    fn insertion_order_decides_pairs() {
        let mut scene = bare();
        let root = scene.root();

        let first = scene.add_entity(root, Entity::group()).unwrap();
        let target = scene.add_entity(first, Entity::target()).unwrap();
        let pointer = scene.add_entity(first, Entity::pointer(0)).unwrap();
        assert_eq!(vec![(target, pointer)], pairs(&scene, first));

        let second = scene.add_entity(root, Entity::group()).unwrap();
        scene.add_entity(second, Entity::pointer(0)).unwrap();
        scene.add_entity(second, Entity::target()).unwrap();
        assert!(pairs(&scene, second).is_empty());
    }

    #[test]
    fn rejects_bad_parents() {
        let mut scene = bare();
        let leaf = scene.spawn(Entity::new());
        assert_eq!(
            Err(SceneError::NotComposite(leaf)),
            scene.add_entity(leaf, Entity::new())
        );
        assert!(scene.remove_entity(scene.root(), leaf));
        assert_eq!(
            Err(SceneError::UnknownEntity(leaf)),
            scene.add_entity(leaf, Entity::new())
        );
        assert_eq!(Err(SceneError::UnknownEntity(leaf)), scene.set_view_entity(leaf));
    }

    #[test]
    fn removing_absent_entity_is_a_no_op() {
        let mut scene = bare();
        let root = scene.root();
        let target = scene.spawn(Entity::target());
        scene.spawn(Entity::pointer(0));
        let stray = scene.spawn(Entity::new());
        assert!(scene.remove_entity(root, stray));

        let before = (children(&scene, root).len(), pairs(&scene, root).len());
        assert!(!scene.remove_entity(root, stray));
        assert!(!scene.remove_entity(target, root));
        assert_eq!(before, (children(&scene, root).len(), pairs(&scene, root).len()));
    }

    #[test]
    fn removal_frees_subtree_and_pairs() {
        let mut scene = bare();
        let root = scene.root();
        let target = scene.spawn(Entity::target());
        let pointer = scene.add_pointer(root, Vector3::default(), 0).unwrap();
        assert_eq!(vec![(target, pointer)], pairs(&scene, root));
        let body = children(&scene, pointer)[0];

        assert!(scene.remove_entity(root, pointer));
        assert!(pairs(&scene, root).is_empty());
        assert!(!scene.contains(pointer));
        assert!(!scene.contains(body));
        assert!(scene.contains(target));
    }

    #[test]
    fn pointer_hits_target_on_its_line() {
        let mut scene = bare();
        let target = scene.spawn(Entity::target().with_position((0.0, 0.0, -5.0)));
        let missed = scene.spawn(Entity::target().with_position((0.0, 5.0, -5.0)));
        scene.spawn(Entity::pointer(0));
        let generation = scene.get(target).unwrap().buffers().generation();

        scene.update(0.0, &firing(5000));

        let hit = scene.get(target).unwrap();
        assert!(hit.appearance().is_flagged());
        assert_eq!(Some(6000), hit.expires_at());
        assert!(hit.buffers().generation() > generation);

        let other = scene.get(missed).unwrap();
        assert!(!other.appearance().is_flagged());
        assert_eq!(None, other.expires_at());
    }

    #[test]
    fn idle_pointer_hits_nothing() {
        let mut scene = bare();
        let target = scene.spawn(Entity::target().with_position((0.0, 0.0, -5.0)));
        scene.spawn(Entity::pointer(0));

        scene.update(0.0, &FrameInput::new(5000).with_controller(ControllerState::connected()));
        assert!(!scene.get(target).unwrap().appearance().is_flagged());
    }

    #[test]
    fn rig_forwards_hits_to_its_pointer() {
        let config = SceneConfig {
            viewpoint_position: [0.0, 0.0, 0.0],
            ..SceneConfig::default()
        };
        let mut scene = Scene::with_config(&config);
        let rig = scene.view_entity();
        let target = scene.spawn(Entity::target().with_position((0.1, -0.3, -5.0)));
        assert_eq!(vec![(rig, target)], pairs(&scene, scene.root()));

        scene.update(0.0, &firing(100));
        assert_eq!(Some(1100), scene.get(target).unwrap().expires_at());
    }

    #[test]
    fn trigger_flags_laser_until_cooldown() {
        let mut scene = bare();
        let pointer = scene.add_pointer(scene.root(), Vector3::default(), 0).unwrap();
        let laser = scene.get(pointer).and_then(Entity::as_pointer).and_then(Pointer::laser).unwrap();
        let released = |now| FrameInput::new(now).with_controller(ControllerState::connected());

        scene.update(0.0, &firing(0));
        assert!(scene.get(laser).unwrap().appearance().is_flagged());
        scene.update(0.0, &released(100));
        scene.update(0.0, &released(350));
        assert!(scene.get(laser).unwrap().appearance().is_flagged());
        scene.update(0.0, &released(351));
        assert!(!scene.get(laser).unwrap().appearance().is_flagged());
    }

    #[test]
    fn falling_through_the_ground_despawns() {
        let mut scene = bare();
        let falling = scene.spawn(Entity::new().with_velocity((0.0, -1.0, 0.0)));
        let rising = scene.spawn(Entity::new().with_velocity((0.0, 1.0, 0.0)));

        scene.update(0.0, &FrameInput::new(0));
        assert!(!scene.contains(falling));
        assert!(scene.contains(rising));
        assert!(!children(&scene, scene.root()).contains(&falling));
    }

    #[test]
    fn expired_entities_despawn() {
        let now = 50_000;
        let mut scene = bare();
        let stale = scene.spawn(Entity::new().with_position((0.0, 1.0, 0.0)).with_expiry(now - 1));
        let fresh = scene.spawn(Entity::new().with_position((0.0, 1.0, 0.0)).with_expiry(now + 10_000));

        scene.update(0.0, &FrameInput::new(now));
        assert!(!scene.contains(stale));
        assert!(scene.contains(fresh));
    }

    #[test]
    fn expired_and_grounded_child_is_removed_once() {
        let now = 2_000;
        let mut scene = bare();
        let root = scene.root();
        let doomed = scene.spawn(
            Entity::target()
                .with_velocity((0.0, -1.0, 0.0))
                .with_expiry(now - 1),
        );
        let survivor = scene.spawn(Entity::target().with_position((0.0, 1.0, 0.0)));
        let before = scene.len();

        scene.update(0.0, &FrameInput::new(now));
        assert!(!scene.contains(doomed));
        assert!(scene.contains(survivor));
        assert_eq!(before - 1, scene.len());
        assert_eq!(vec![scene.view_entity(), survivor], children(&scene, root));
        assert!(!scene.remove_entity(root, doomed));
    }

    #[test]
    fn composites_do_not_move_themselves() {
        let mut scene = bare();
        let group = scene.spawn(
            Entity::group()
                .with_position((0.0, 5.0, 0.0))
                .with_velocity((1.0, 0.0, 0.0))
                .with_acceleration((0.0, 1.0, 0.0))
                .with_angular_rate(1.0),
        );
        let flocked = scene.spawn(
            Entity::group()
                .with_composite_flags(CompositeFlags::all())
                .with_position((0.0, 5.0, 0.0))
                .with_velocity((1.0, 0.0, 0.0)),
        );

        scene.update(1.0, &FrameInput::new(0));
        for &id in [group, flocked].iter() {
            let entity = scene.get(id).unwrap();
            assert!(entity.position().approx_eq(Vector3::new(0.0, 5.0, 0.0), 1e-6));
            assert!(entity.velocity().approx_eq(Vector3::new(1.0, 0.0, 0.0), 1e-6));
        }
        assert_eq!(0.0, scene.get(group).unwrap().angle());
    }

    #[test]
    fn composites_only_update_children_when_asked() {
        let mut scene = bare();
        let frozen = scene.spawn(Entity::group());
        let child = scene
            .add_entity(frozen, Entity::new().with_position((0.0, 5.0, 0.0)).with_velocity((1.0, 0.0, 0.0)))
            .unwrap();

        scene.update(1.0, &FrameInput::new(0));
        assert!(scene.get(child).unwrap().position().approx_eq(Vector3::new(0.0, 5.0, 0.0), 1e-6));

        scene
            .get_mut(frozen)
            .and_then(Entity::composite_mut)
            .unwrap()
            .set_flags(CompositeFlags::all());
        scene.update(1.0, &FrameInput::new(0));
        assert!(scene.get(child).unwrap().position().approx_eq(Vector3::new(1.0, 5.0, 0.0), 1e-6));
    }

    #[test]
    fn model_matrix_composes_ancestors() {
        let mut scene = bare();
        let group = scene.spawn(Entity::group().with_position((1.0, 0.0, 0.0)));
        let child = scene
            .add_entity(group, Entity::new().with_position((0.0, 2.0, 0.0)))
            .unwrap();
        assert!(scene
            .model_matrix(child)
            .translation()
            .approx_eq(Vector3::new(1.0, 2.0, 0.0), 1e-6));
        assert!(scene.world_position(child).approx_eq(Vector3::new(1.0, 2.0, 0.0), 1e-6));

        assert!(scene.remove_entity(scene.root(), group));
        assert_eq!(Matrix4::identity(), scene.model_matrix(child));
    }

    #[test]
    fn world_position_ignores_ancestor_rotation_and_scale() {
        let mut scene = bare();
        let turned = scene.spawn(
            Entity::group()
                .with_position((0.0, 0.0, -4.0))
                .with_rotation(std::f32::consts::FRAC_PI_2, (0.0, 1.0, 0.0)),
        );
        let child = scene
            .add_entity(turned, Entity::new().with_position((1.0, 0.0, 0.0)))
            .unwrap();
        let summed = Vector3::new(1.0, 0.0, -4.0);
        assert!(scene.world_position(child).approx_eq(summed, 1e-6));
        let placed = scene.model_matrix(child).translation();
        assert!(placed.approx_eq(Vector3::new(0.0, 0.0, -5.0), 1e-5));
        assert!(!placed.approx_eq(summed, 1e-3));

        let scaled = scene.spawn(Entity::group().with_scale((2.0, 2.0, 2.0)));
        let child = scene
            .add_entity(scaled, Entity::new().with_position((1.0, 1.0, 0.0)))
            .unwrap();
        assert!(scene.world_position(child).approx_eq(Vector3::new(1.0, 1.0, 0.0), 1e-6));
        assert!(scene
            .model_matrix(child)
            .translation()
            .approx_eq(Vector3::new(2.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn view_follows_scene_or_entity_orientation() {
        let yaw = Quaternion::from_axis_angle(Vector3::up(), 0.7);
        let mut scene = Scene::with_viewpoint(
            &SceneConfig::default(),
            Entity::new().with_position((0.0, 0.0, 5.0)),
        );
        scene.set_orientation(yaw);
        let expected = Matrix4::inverse_rotation(yaw).translated(Vector3::new(0.0, 0.0, -5.0));
        assert!(scene.view_matrix().approx_eq(&expected, 1e-6));

        let spinner = scene.spawn(
            Entity::new()
                .with_position((1.0, 0.0, 0.0))
                .with_rotation(0.3, (0.0, 1.0, 0.0))
                .with_tracking(Tracking::Entity),
        );
        scene.update(0.0, &FrameInput::new(0));
        scene.set_view_entity(spinner).unwrap();
        let spin = Quaternion::from_axis_angle(Vector3::up(), 0.3);
        let expected = Matrix4::inverse_rotation(spin).translated(Vector3::new(-1.0, 0.0, 0.0));
        assert!(scene.view_matrix().approx_eq(&expected, 1e-6));
    }

    #[test]
    fn projection_is_cached_until_replaced() {
        let mut scene = bare();
        let defaults = ProjectionConfig::default();
        let expected = Matrix4::perspective(defaults.fov, defaults.aspect, defaults.near, defaults.far);
        assert!(scene.projection_matrix().approx_eq(&expected, 1e-6));

        scene.change_projection(1.0, 1.0, 0.5, 50.0);
        assert!(scene
            .projection_matrix()
            .approx_eq(&Matrix4::perspective(1.0, 1.0, 0.5, 50.0), 1e-6));
        assert_eq!(50.0, scene.perspective().far);

        scene.set_projection(Matrix4::identity());
        assert_eq!(Matrix4::identity(), scene.projection_matrix());
    }

    #[derive(Default)]
    struct Recorder(Vec<(EntityId, Matrix4)>);

    impl Renderer for Recorder {
        fn draw(&mut self, call: &DrawCall<'_>) {
            self.0.push((call.entity, call.model_view));
        }
    }

    #[test]
    fn renders_leaves_in_tree_order() {
        let mut scene = bare();
        let view = scene.view_entity();
        let hidden = scene.spawn(Entity::group());
        scene.add_entity(hidden, Entity::new()).unwrap();
        let group = scene.spawn(Entity::group().with_position((0.0, 1.0, 0.0)));
        let a = scene.add_entity(group, Entity::new()).unwrap();
        let b = scene.add_entity(group, Entity::new().with_position((2.0, 0.0, 0.0))).unwrap();
        let invisible = scene.spawn(Entity::new());
        scene.get_mut(invisible).unwrap().set_allow_rendering(false);
        scene
            .get_mut(hidden)
            .and_then(Entity::composite_mut)
            .unwrap()
            .set_flags(CompositeFlags::UPDATE_CHILDREN);

        let mut recorder = Recorder::default();
        scene.render(&mut recorder);
        let drawn: Vec<_> = recorder.0.iter().map(|&(id, _)| id).collect();
        assert_eq!(vec![view, a, b], drawn);

        let b_model_view = recorder.0[2].1;
        let expected = &scene.view_matrix() * &scene.model_matrix(b);
        assert!(b_model_view.approx_eq(&expected, 1e-6));
    }
}
