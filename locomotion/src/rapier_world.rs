//! Rapier query world holding fixed geometry and host-driven moving platforms.
//!
//! Every collider is inserted without a parent body and positioned directly, so a platform is
//! moved by rewriting its collider pose and refreshing the broad phase. Nothing is simulated;
//! the world only answers the shape casts of the character controller.
//!
//! Given the same definitions (sorted by `id`), the world is built identically.

use std::collections::HashMap;

use log::{debug, warn};
use rapier3d::prelude::*;

use crate::{Iso, Quat, Vec3};

/// Schema-agnostic definition of one world collider.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - For planes the normal is `rotation * +Y`, shifted along it by `offset_along_normal`.
#[derive(Clone, Debug)]
pub struct WorldColliderDef {
    /// Stable unique identifier; also the key for [`PlatformWorld::handle`].
    pub id: u32,
    /// World-space translation.
    pub translation: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
    pub shape: ColliderShapeDef,
}

impl WorldColliderDef {
    pub fn new(id: u32, translation: Vec3, shape: ColliderShapeDef) -> Self {
        Self {
            id,
            translation,
            rotation: Quat::identity(),
            shape,
        }
    }

    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// World pose of the collider.
    fn pose(&self) -> Iso {
        let mut translation = self.translation;
        if let ColliderShapeDef::Plane {
            offset_along_normal,
        } = self.shape
        {
            translation += self.rotation * Vec3::y() * offset_along_normal;
        }
        Iso::from_parts(translation.into(), self.rotation)
    }
}

/// Supported collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space) facing `rotation * +Y`.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vec3 },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },

    /// Rounded cuboid (meters).
    ///
    /// `border_radius` rounds all edges/corners.
    RoundCuboid {
        half_extents: Vec3,
        border_radius: f32,
    },
}

/// Build a Rapier collider in its local frame; the pose is applied separately.
fn collider_from_def(def: &WorldColliderDef) -> Collider {
    match &def.shape {
        ColliderShapeDef::Plane { .. } => ColliderBuilder::halfspace(Vector::y_axis()).build(),

        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build()
        }

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius).build(),

        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius).build(),

        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius).build(),

        ColliderShapeDef::RoundCuboid {
            half_extents,
            border_radius,
        } => ColliderBuilder::round_cuboid(
            half_extents.x,
            half_extents.y,
            half_extents.z,
            *border_radius,
        )
        .build(),
    }
}

/// In-memory Rapier structures the character controller queries.
///
/// This stores:
/// - `RigidBodySet`/`ColliderSet`; bodies stay empty, colliders are positioned directly.
/// - `NarrowPhase` and `BroadPhaseBvh` used to create a borrowed `QueryPipeline`.
pub struct PlatformWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    handles: HashMap<u32, ColliderHandle>,
    dt: f32,
}

impl PlatformWorld {
    /// Build a world from collider definitions.
    ///
    /// `dt` is the step the broad phase assumes when refreshing bounding volumes.
    pub fn build(mut defs: Vec<WorldColliderDef>, dt: f32) -> Self {
        // Ensure deterministic insertion order.
        defs.sort_by_key(|d| d.id);

        let mut colliders = ColliderSet::new();
        let mut handles = HashMap::with_capacity(defs.len());
        let mut modified = Vec::with_capacity(defs.len());

        for def in &defs {
            let mut collider = collider_from_def(def);
            collider.set_position(def.pose());
            let handle = colliders.insert(collider);
            if handles.insert(def.id, handle).is_some() {
                warn!("duplicate world collider id {}, keeping the last one", def.id);
            }
            modified.push(handle);
        }

        let mut world = Self {
            bodies: RigidBodySet::new(),
            colliders,
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            handles,
            dt,
        };
        world.refresh(&modified);
        debug!("platform world built with {} colliders", world.colliders.len());
        world
    }

    fn refresh(&mut self, modified: &[ColliderHandle]) {
        let mut events = Vec::new();
        self.broad_phase.update(
            &IntegrationParameters {
                dt: self.dt,
                ..IntegrationParameters::default()
            },
            &self.colliders,
            &self.bodies,
            modified,
            &[],
            &mut events,
        );
    }

    /// Handle of the collider built from the definition with this `id`.
    pub fn handle(&self, id: u32) -> Option<ColliderHandle> {
        self.handles.get(&id).copied()
    }

    /// Current world pose of a collider, `None` if it does not exist.
    pub fn body_pose(&self, handle: ColliderHandle) -> Option<Iso> {
        self.colliders.get(handle).map(|c| *c.position())
    }

    /// Teleport a collider, typically a moving platform. Returns false if it does not exist.
    pub fn set_body_pose(&mut self, handle: ColliderHandle, pose: Iso) -> bool {
        let Some(collider) = self.colliders.get_mut(handle) else {
            return false;
        };
        collider.set_position(pose);
        self.refresh(&[handle]);
        true
    }

    /// Shift a collider by `offset`. Returns false if it does not exist.
    pub fn translate_body(&mut self, handle: ColliderHandle, offset: Vec3) -> bool {
        let Some(mut pose) = self.body_pose(handle) else {
            return false;
        };
        pose.translation.vector += offset;
        self.set_body_pose(handle, pose)
    }

    /// Create a borrowed `QueryPipeline` view for scene queries and the controller.
    ///
    /// The returned pipeline borrows `self`, so it should be used within the scope
    /// of the borrow.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::yaw_rotation;

    fn platform() -> WorldColliderDef {
        WorldColliderDef::new(
            2,
            Vec3::new(0.0, 0.25, 0.0),
            ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(2.0, 0.25, 2.0),
            },
        )
    }

    fn floor() -> WorldColliderDef {
        WorldColliderDef::new(
            1,
            Vec3::zeros(),
            ColliderShapeDef::Plane {
                offset_along_normal: -1.0,
            },
        )
    }

    #[test]
    fn plane_offset_moves_along_normal() {
        let world = PlatformWorld::build(vec![floor()], 1.0 / 60.0);
        let pose = world.body_pose(world.handle(1).unwrap()).unwrap();
        assert!((pose.translation.vector - Vec3::new(0.0, -1.0, 0.0)).norm() < 1.0e-6);
    }

    #[test]
    fn moving_a_platform_updates_its_pose() {
        let mut world = PlatformWorld::build(vec![platform(), floor()], 1.0 / 60.0);
        let handle = world.handle(2).unwrap();

        assert!(world.translate_body(handle, Vec3::new(1.0, 0.0, 0.0)));
        let pose = world.body_pose(handle).unwrap();
        assert!((pose.translation.vector - Vec3::new(1.0, 0.25, 0.0)).norm() < 1.0e-6);

        let turned = Iso::from_parts(pose.translation, yaw_rotation(0.3));
        assert!(world.set_body_pose(handle, turned));
        assert_eq!(world.body_pose(handle), Some(turned));
        assert!(world.handle(99).is_none());
    }

    #[test]
    fn queries_see_moved_platforms() {
        let mut world = PlatformWorld::build(vec![platform()], 1.0 / 60.0);
        let handle = world.handle(2).unwrap();
        world.translate_body(handle, Vec3::new(10.0, 0.0, 0.0));

        let ray = Ray::new(point![10.0, 5.0, 0.0], vector![0.0, -1.0, 0.0]);
        let pipeline = world.query_pipeline(QueryFilter::default());
        let hit = pipeline.cast_ray(&ray, 10.0, true);
        assert_eq!(hit.map(|(h, _)| h), Some(handle));

        let miss = Ray::new(point![0.0, 5.0, 0.0], vector![0.0, -1.0, 0.0]);
        assert!(pipeline.cast_ray(&miss, 10.0, true).is_none());
    }

    #[test]
    fn rotated_plane_faces_its_rotated_normal() {
        // +Y turned onto +X, then pushed 2 m along it.
        let wall = WorldColliderDef::new(
            5,
            Vec3::zeros(),
            ColliderShapeDef::Plane {
                offset_along_normal: 2.0,
            },
        )
        .rotated(Quat::from_axis_angle(&Vector::z_axis(), -std::f32::consts::FRAC_PI_2));
        let world = PlatformWorld::build(vec![wall], 1.0 / 60.0);
        let handle = world.handle(5).unwrap();

        let pose = world.body_pose(handle).unwrap();
        assert!((pose.translation.vector - Vec3::new(2.0, 0.0, 0.0)).norm() < 1.0e-5);

        let ray = Ray::new(point![10.0, 0.0, 0.0], vector![-1.0, 0.0, 0.0]);
        let pipeline = world.query_pipeline(QueryFilter::default());
        let (hit, toi) = pipeline.cast_ray(&ray, 20.0, true).unwrap();
        assert_eq!(hit, handle);
        assert!((toi - 8.0).abs() < 1.0e-4);
    }

    #[test]
    fn every_shape_answers_queries() {
        let shapes = [
            (ColliderShapeDef::Sphere { radius: 0.5 }, 0.5),
            (
                ColliderShapeDef::CapsuleY {
                    radius: 0.3,
                    half_height: 0.5,
                },
                0.8,
            ),
            (
                ColliderShapeDef::CylinderY {
                    radius: 0.4,
                    half_height: 0.5,
                },
                0.5,
            ),
            (
                ColliderShapeDef::RoundCuboid {
                    half_extents: Vec3::new(0.5, 0.2, 0.5),
                    border_radius: 0.05,
                },
                0.25,
            ),
        ];
        let defs = shapes
            .iter()
            .enumerate()
            .map(|(i, (shape, _))| {
                WorldColliderDef::new(i as u32, Vec3::new(3.0 * i as f32, 0.0, 0.0), shape.clone())
            })
            .collect();
        let world = PlatformWorld::build(defs, 1.0 / 60.0);
        let pipeline = world.query_pipeline(QueryFilter::default());

        for (i, (_, top)) in shapes.iter().enumerate() {
            let ray = Ray::new(point![3.0 * i as f32, 5.0, 0.0], vector![0.0, -1.0, 0.0]);
            let (hit, toi) = pipeline.cast_ray(&ray, 10.0, true).unwrap();
            assert_eq!(Some(hit), world.handle(i as u32));
            assert!((toi - (5.0 - top)).abs() < 1.0e-2, "shape {i}: toi {toi}");
        }
    }
}
