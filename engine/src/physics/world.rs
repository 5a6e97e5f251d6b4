//! Physics world
//!
//! Owns every registered object and advances them one tick at a time. There
//! is no global state: construct as many worlds as needed and drive each with
//! [`PhysicsWorld::update`].
//!
//! # Tick
//!
//! 1. Integrate awake dynamic bodies (gravity, carried-over support forces,
//!    velocity, rotation, damping, sleep).
//! 2. Dynamic-dynamic pairs: implicit O(n²) loop, or GPU sphere culling when a
//!    GPU broad phase is attached and enough dynamics are registered.
//! 3. Kinematic-dynamic, dynamic-static, kinematic-static.
//! 4. Kinematic-mesh, dynamic-mesh.
//! 5. Contact transitions are dispatched to handlers and queued as events.
//!
//! # Groups
//!
//! Objects are classified once, at registration: no rigidbody is Static, a
//! kinematic rigidbody is Kinematic, anything else is Dynamic. Toggling
//! `is_kinematic` afterwards does not move an object between groups.
//!
//! # Example
//!
//! ```ignore
//! use tumble_engine::physics::{Collider, PhysicsObject, PhysicsWorld, RigidBody, Transform};
//! use glam::Vec3;
//!
//! let mut world = PhysicsWorld::default();
//! world.add(
//!     PhysicsObject::new("floor")
//!         .with_transform(Transform::from_position(Vec3::new(0.0, -0.5, 0.0)))
//!         .with_collider(Collider::cuboid(Vec3::new(20.0, 0.5, 20.0))),
//! )?;
//! let ball = world.add(
//!     PhysicsObject::new("ball")
//!         .with_transform(Transform::from_position(Vec3::new(0.0, 5.0, 0.0)))
//!         .with_rigidbody(RigidBody::default())
//!         .with_collider(Collider::sphere(0.5)),
//! )?;
//!
//! for _ in 0..120 {
//!     world.update(1.0 / 60.0);
//! }
//! ```

use std::fmt;

use slotmap::{SecondaryMap, SlotMap};

use super::broadphase::BroadPhaseSphere;
use super::collider::Collider;
use super::config::PhysicsConfig;
use super::contact::{CollisionHandler, ContactEvent, ContactKind, ContactTracker};
use super::error::PhysicsError;
use super::integrator::{BodyState, integrate};
use super::raycast::{RaycastHit, raycast_nearest};
use super::resolver::{
    Fixed, Mover, ResolveContext, resolve_against_mesh, resolve_dynamic_pair, resolve_dynamic_static,
    resolve_kinematic_dynamic, resolve_kinematic_static,
};
use super::rigidbody::RigidBody;
use super::transform::Transform;
use super::types::Vec3;
use crate::compute::{ComputeError, GpuBroadPhase};

slotmap::new_key_type! {
    /// Stable identity of an object registered with a [`PhysicsWorld`].
    pub struct BodyHandle;
}

/// Group an object was placed in at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    Kinematic,
    Static,
}

/// Bounding sphere radius for dynamic bodies without a collider.
const DEFAULT_BROAD_PHASE_RADIUS: f32 = 0.5;

// =============================================================================
// PhysicsObject
// =============================================================================

/// An object as the physics world sees it: transform, optional rigidbody,
/// optional collider, identity and collision listeners.
pub struct PhysicsObject {
    pub name: String,
    pub tags: Vec<String>,
    pub transform: Transform,
    pub rigidbody: Option<RigidBody>,
    pub collider: Option<Collider>,
    handlers: Vec<Box<dyn CollisionHandler>>,
}

impl fmt::Debug for PhysicsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsObject")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("transform", &self.transform)
            .field("rigidbody", &self.rigidbody)
            .field("collider", &self.collider)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl PhysicsObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            transform: Transform::default(),
            rigidbody: None,
            collider: None,
            handlers: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_rigidbody(mut self, rigidbody: RigidBody) -> Self {
        self.rigidbody = Some(rigidbody);
        self
    }

    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_handler(mut self, handler: impl CollisionHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn kind(&self) -> BodyKind {
        match &self.rigidbody {
            None => BodyKind::Static,
            Some(rb) if rb.is_kinematic => BodyKind::Kinematic,
            Some(_) => BodyKind::Dynamic,
        }
    }

    fn mover(&mut self, handle: BodyHandle) -> Option<Mover<'_>> {
        let PhysicsObject {
            transform,
            rigidbody,
            collider,
            ..
        } = self;
        Some(Mover {
            handle,
            transform,
            body: rigidbody.as_mut()?,
            collider: collider.as_ref()?,
        })
    }

    fn fixed(&self, handle: BodyHandle) -> Option<Fixed<'_>> {
        Some(Fixed {
            handle,
            transform: &self.transform,
            collider: self.collider.as_ref()?,
        })
    }

    fn has_mesh(&self) -> bool {
        self.collider.as_ref().is_some_and(Collider::is_mesh)
    }

    fn broad_phase_sphere(&self) -> BroadPhaseSphere {
        match &self.collider {
            Some(collider) => BroadPhaseSphere::new(
                collider.world_center(&self.transform),
                collider.bounding_radius(&self.transform),
            ),
            None => BroadPhaseSphere::new(self.transform.position, DEFAULT_BROAD_PHASE_RADIUS),
        }
    }
}

// =============================================================================
// PhysicsWorld
// =============================================================================

pub struct PhysicsWorld {
    config: PhysicsConfig,
    objects: SlotMap<BodyHandle, PhysicsObject>,
    dynamic: Vec<BodyHandle>,
    kinematic: Vec<BodyHandle>,
    statics: Vec<BodyHandle>,
    kinds: SecondaryMap<BodyHandle, BodyKind>,
    contacts: ContactTracker,
    support_forces: SecondaryMap<BodyHandle, Vec3>,
    events: Vec<ContactEvent>,
    gpu: Option<GpuBroadPhase>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig) -> Self {
        log::info!(
            "Physics world created (gravity {:?}, GPU broad phase threshold {})",
            config.gravity,
            config.gpu_broad_phase_threshold
        );
        Self {
            config,
            objects: SlotMap::with_key(),
            dynamic: Vec::new(),
            kinematic: Vec::new(),
            statics: Vec::new(),
            kinds: SecondaryMap::new(),
            contacts: ContactTracker::new(),
            support_forces: SecondaryMap::new(),
            events: Vec::new(),
            gpu: None,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PhysicsConfig {
        &mut self.config
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Registers an object and places it in its group for good.
    ///
    /// # Errors
    /// * [`PhysicsError::InvalidMass`] for a rigidbody without a finite, positive mass
    /// * [`PhysicsError::MovingMeshCollider`] for a mesh collider on a rigidbody
    pub fn add(&mut self, object: PhysicsObject) -> Result<BodyHandle, PhysicsError> {
        if let Some(rb) = &object.rigidbody {
            rb.validate()?;
            if object.has_mesh() {
                return Err(PhysicsError::MovingMeshCollider {
                    name: object.name.clone(),
                });
            }
        }

        let kind = object.kind();
        let name = object.name.clone();
        let handle = self.objects.insert(object);
        self.kinds.insert(handle, kind);
        match kind {
            BodyKind::Dynamic => self.dynamic.push(handle),
            BodyKind::Kinematic => self.kinematic.push(handle),
            BodyKind::Static => self.statics.push(handle),
        }
        log::debug!("Registered '{}' as {:?}", name, kind);
        Ok(handle)
    }

    /// Removes an object, dropping its contacts without exit callbacks.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<PhysicsObject> {
        let object = self.objects.remove(handle)?;
        if let Some(kind) = self.kinds.remove(handle) {
            let group = match kind {
                BodyKind::Dynamic => &mut self.dynamic,
                BodyKind::Kinematic => &mut self.kinematic,
                BodyKind::Static => &mut self.statics,
            };
            group.retain(|&h| h != handle);
        }
        self.contacts.purge(handle);
        self.support_forces.remove(handle);
        self.events.retain(|e| e.a != handle && e.b != handle);
        log::debug!("Removed '{}'", object.name);
        Some(object)
    }

    pub fn add_handler(&mut self, handle: BodyHandle, handler: impl CollisionHandler + 'static) -> bool {
        match self.objects.get_mut(handle) {
            Some(object) => {
                object.handlers.push(Box::new(handler));
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn get(&self, handle: BodyHandle) -> Option<&PhysicsObject> {
        self.objects.get(handle)
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut PhysicsObject> {
        self.objects.get_mut(handle)
    }

    pub fn transform(&self, handle: BodyHandle) -> Option<&Transform> {
        self.objects.get(handle).map(|o| &o.transform)
    }

    pub fn transform_mut(&mut self, handle: BodyHandle) -> Option<&mut Transform> {
        self.objects.get_mut(handle).map(|o| &mut o.transform)
    }

    pub fn rigidbody(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.objects.get(handle)?.rigidbody.as_ref()
    }

    pub fn rigidbody_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.objects.get_mut(handle)?.rigidbody.as_mut()
    }

    /// Group the object was registered into.
    pub fn kind(&self, handle: BodyHandle) -> Option<BodyKind> {
        self.kinds.get(handle).copied()
    }

    pub fn find(&self, name: &str) -> Option<BodyHandle> {
        self.objects
            .iter()
            .find(|(_, o)| o.name == name)
            .map(|(h, _)| h)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn dynamic_count(&self) -> usize {
        self.dynamic.len()
    }

    pub fn kinematic_count(&self) -> usize {
        self.kinematic.len()
    }

    pub fn static_count(&self) -> usize {
        self.statics.len()
    }

    pub fn is_sleeping(&self, handle: BodyHandle) -> bool {
        self.rigidbody(handle).is_some_and(RigidBody::is_sleeping)
    }

    pub fn wake(&mut self, handle: BodyHandle) {
        if let Some(rb) = self.rigidbody_mut(handle) {
            rb.wake();
        }
    }

    /// True when the two objects were touching at the end of the last tick.
    pub fn is_touching(&self, a: BodyHandle, b: BodyHandle) -> bool {
        self.contacts.is_touching(a, b)
    }

    /// Every object that carries a collider.
    pub fn collidable_objects(&self) -> Vec<BodyHandle> {
        self.objects
            .iter()
            .filter(|(_, o)| o.collider.is_some())
            .map(|(h, _)| h)
            .collect()
    }

    /// Nearest sphere or box hit along the ray within `max_distance`.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        let targets = self
            .objects
            .iter()
            .filter_map(|(h, o)| o.collider.as_ref().map(|c| (h, &o.transform, c)));
        raycast_nearest(targets, origin, direction, max_distance)
    }

    /// Contact events of the most recent [`update`](Self::update).
    pub fn drain_contact_events(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.events)
    }

    // -------------------------------------------------------------------------
    // GPU broad phase
    // -------------------------------------------------------------------------

    /// Uses `gpu` for dynamic-dynamic candidates once the dynamic count
    /// reaches `gpu_broad_phase_threshold`.
    pub fn attach_gpu_broad_phase(&mut self, gpu: GpuBroadPhase) {
        self.gpu = Some(gpu);
    }

    /// Acquires a GPU and attaches a broad phase sized from the config.
    ///
    /// On error the world keeps using the CPU path.
    pub fn init_gpu_broad_phase(&mut self) -> Result<(), ComputeError> {
        let gpu = GpuBroadPhase::new(self.config.max_gpu_objects, self.config.max_gpu_pairs())?;
        self.attach_gpu_broad_phase(gpu);
        Ok(())
    }

    pub fn has_gpu_broad_phase(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn detach_gpu_broad_phase(&mut self) -> Option<GpuBroadPhase> {
        self.gpu.take()
    }

    // -------------------------------------------------------------------------
    // Simulation
    // -------------------------------------------------------------------------

    /// Advances the world by `dt` seconds. Non-positive or non-finite steps
    /// are ignored.
    pub fn update(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            log::warn!("Ignoring physics step with dt = {}", dt);
            return;
        }

        self.contacts.begin_tick();
        self.integrate_dynamics(dt);
        self.support_forces.clear();
        self.resolve_collisions();

        let events = self.contacts.finish_tick();
        self.dispatch(&events);
        self.events = events;
    }

    fn integrate_dynamics(&mut self, dt: f32) {
        for &handle in &self.dynamic {
            let support = self.support_forces.get(handle).copied().unwrap_or(Vec3::ZERO);
            let Some(object) = self.objects.get_mut(handle) else {
                continue;
            };
            let PhysicsObject {
                name,
                transform,
                rigidbody,
                ..
            } = object;
            if let Some(body) = rigidbody {
                if integrate(transform, body, support, &self.config, dt) == BodyState::FellAsleep {
                    log::debug!("'{}' fell asleep", name);
                }
            }
        }
    }

    fn resolve_collisions(&mut self) {
        let Self {
            config,
            objects,
            dynamic,
            kinematic,
            statics,
            contacts,
            support_forces,
            gpu,
            ..
        } = self;
        let config: &PhysicsConfig = config;
        let mut ctx = ResolveContext {
            config,
            contacts,
            support_forces,
        };

        // Dynamic x Dynamic
        let gpu_pairs = match gpu {
            Some(gpu) if dynamic.len() >= config.gpu_broad_phase_threshold => {
                let spheres: Vec<BroadPhaseSphere> = dynamic
                    .iter()
                    .filter_map(|&h| objects.get(h).map(PhysicsObject::broad_phase_sphere))
                    .collect();
                match gpu.detect_pairs(&spheres) {
                    Ok(pairs) => Some(pairs),
                    Err(err) => {
                        log::warn!("GPU broad phase failed, falling back to CPU: {}", err);
                        None
                    }
                }
            }
            _ => None,
        };

        match gpu_pairs {
            Some(pairs) => {
                for pair in pairs {
                    let (Some(&ha), Some(&hb)) = (dynamic.get(pair.a as usize), dynamic.get(pair.b as usize)) else {
                        continue;
                    };
                    resolve_movers(objects, ha, hb, |a, b| resolve_dynamic_pair(&mut ctx, a, b));
                }
            }
            None => {
                for i in 0..dynamic.len() {
                    for j in (i + 1)..dynamic.len() {
                        resolve_movers(objects, dynamic[i], dynamic[j], |a, b| {
                            resolve_dynamic_pair(&mut ctx, a, b)
                        });
                    }
                }
            }
        }

        // Kinematic x Dynamic
        for &k in kinematic.iter() {
            for &d in dynamic.iter() {
                resolve_movers(objects, k, d, |kin, dy| resolve_kinematic_dynamic(&mut ctx, kin, dy));
            }
        }

        // Dynamic x Static, Kinematic x Static
        for &s in statics.iter() {
            if objects.get(s).is_none_or(PhysicsObject::has_mesh) {
                continue;
            }
            for &d in dynamic.iter() {
                resolve_against_fixed(objects, d, s, |m, f| resolve_dynamic_static(&mut ctx, m, f));
            }
            for &k in kinematic.iter() {
                resolve_against_fixed(objects, k, s, |m, f| resolve_kinematic_static(&mut ctx, m, f));
            }
        }

        // Kinematic x Mesh, Dynamic x Mesh
        for &s in statics.iter() {
            if !objects.get(s).is_some_and(PhysicsObject::has_mesh) {
                continue;
            }
            for &k in kinematic.iter() {
                resolve_against_fixed(objects, k, s, |m, f| resolve_against_mesh(&mut ctx, m, f));
            }
            for &d in dynamic.iter() {
                resolve_against_fixed(objects, d, s, |m, f| resolve_against_mesh(&mut ctx, m, f));
            }
        }
    }

    fn dispatch(&mut self, events: &[ContactEvent]) {
        for event in events {
            for (me, other) in [(event.a, event.b), (event.b, event.a)] {
                let Some(object) = self.objects.get_mut(me) else {
                    continue;
                };
                for handler in &mut object.handlers {
                    match event.kind {
                        ContactKind::Enter => handler.on_collision_enter(other),
                        ContactKind::Exit => handler.on_collision_exit(other),
                    }
                }
            }
        }
    }
}

/// Runs `f` on two moving objects; pairs missing a rigidbody or collider are skipped.
fn resolve_movers(
    objects: &mut SlotMap<BodyHandle, PhysicsObject>,
    a: BodyHandle,
    b: BodyHandle,
    f: impl FnOnce(Mover<'_>, Mover<'_>),
) {
    let Some([obj_a, obj_b]) = objects.get_disjoint_mut([a, b]) else {
        return;
    };
    if let (Some(ma), Some(mb)) = (obj_a.mover(a), obj_b.mover(b)) {
        f(ma, mb);
    }
}

/// Runs `f` on a moving object and a static one.
fn resolve_against_fixed(
    objects: &mut SlotMap<BodyHandle, PhysicsObject>,
    mover: BodyHandle,
    fixed: BodyHandle,
    f: impl FnOnce(Mover<'_>, Fixed<'_>),
) {
    let Some([obj_m, obj_f]) = objects.get_disjoint_mut([mover, fixed]) else {
        return;
    };
    if let (Some(m), Some(s)) = (obj_m.mover(mover), obj_f.fixed(fixed)) {
        f(m, s);
    }
}
