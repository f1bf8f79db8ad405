//! Collision skins: the primitives attached to one body
//!
//! A skin keeps its primitives in body space and caches two world copies per
//! step, one at the start-of-step pose and one at the end-of-step pose.

use super::primitives::{Primitive, PrimitiveKind};
use crate::foundation::math::{Transform, Vec3};

/// Start and end of step positions of the owning body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    /// Position at the start of the step
    pub old_position: Vec3,
    /// Position at the end of the step
    pub new_position: Vec3,
}

impl BodyPose {
    /// Body that did not move
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            old_position: position,
            new_position: position,
        }
    }
}

/// Ordered set of primitives belonging to one body
#[derive(Debug, Clone, Default)]
pub struct CollisionSkin {
    local: Vec<Primitive>,
    old_world: Vec<Primitive>,
    new_world: Vec<Primitive>,
    old_transform: Transform,
    new_transform: Transform,
    owner: Option<BodyPose>,
}

impl CollisionSkin {
    /// Skin without an owning body; reports its position as the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Skin owned by a body whose position follows the skin transforms
    pub fn with_owner(pose: BodyPose) -> Self {
        Self {
            owner: Some(pose),
            ..Self::default()
        }
    }

    /// Add a body-space primitive; returns its index
    pub fn add_primitive(&mut self, primitive: impl Into<Primitive>) -> usize {
        let primitive = primitive.into();
        self.old_world.push(primitive.transformed(&self.old_transform));
        self.new_world.push(primitive.transformed(&self.new_transform));
        self.local.push(primitive);
        self.local.len() - 1
    }

    /// Number of primitives
    pub fn num_primitives(&self) -> usize {
        self.local.len()
    }

    /// Refresh the world copies for the start and end of the step
    ///
    /// An owned skin moves its body position along with the transforms.
    pub fn set_transforms(&mut self, old: Transform, new: Transform) {
        self.old_transform = old;
        self.new_transform = new;
        for (i, primitive) in self.local.iter().enumerate() {
            self.old_world[i] = primitive.transformed(&old);
            self.new_world[i] = primitive.transformed(&new);
        }
        if let Some(pose) = &mut self.owner {
            pose.old_position = old.position;
            pose.new_position = new.position;
        }
    }

    /// Override the owner positions when the body origin differs from the skin frame
    pub fn set_owner_pose(&mut self, pose: BodyPose) {
        self.owner = Some(pose);
    }

    /// Owning body pose, if any
    pub fn owner(&self) -> Option<&BodyPose> {
        self.owner.as_ref()
    }

    /// True for skins with no owning body
    pub fn is_static(&self) -> bool {
        self.owner.is_none()
    }

    /// Body-space primitive `i`
    pub fn primitive_local(&self, i: usize) -> &Primitive {
        &self.local[i]
    }

    /// Primitive `i` at the start-of-step pose
    pub fn primitive_old_world(&self, i: usize) -> &Primitive {
        &self.old_world[i]
    }

    /// Primitive `i` at the end-of-step pose
    pub fn primitive_new_world(&self, i: usize) -> &Primitive {
        &self.new_world[i]
    }

    /// Start-of-step transform
    pub fn old_transform(&self) -> &Transform {
        &self.old_transform
    }

    /// End-of-step transform
    pub fn new_transform(&self) -> &Transform {
        &self.new_transform
    }

    /// Body position at the start of the step
    pub fn old_position(&self) -> Vec3 {
        self.owner.map_or_else(Vec3::zeros, |p| p.old_position)
    }

    /// Body position at the end of the step
    pub fn new_position(&self) -> Vec3 {
        self.owner.map_or_else(Vec3::zeros, |p| p.new_position)
    }
}

/// A candidate primitive pair handed to the narrow phase
#[derive(Debug, Clone, Copy)]
pub struct CollDetectInfo<'a> {
    skin0: &'a CollisionSkin,
    prim0: usize,
    skin1: &'a CollisionSkin,
    prim1: usize,
}

impl<'a> CollDetectInfo<'a> {
    /// Pair primitive `prim0` of `skin0` with primitive `prim1` of `skin1`
    ///
    /// # Panics
    /// If either index is out of range for its skin.
    pub fn new(skin0: &'a CollisionSkin, prim0: usize, skin1: &'a CollisionSkin, prim1: usize) -> Self {
        assert!(prim0 < skin0.num_primitives(), "primitive index {} out of range", prim0);
        assert!(prim1 < skin1.num_primitives(), "primitive index {} out of range", prim1);
        Self {
            skin0,
            prim0,
            skin1,
            prim1,
        }
    }

    /// Exchange the roles of A and B
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.skin0, &mut self.skin1);
        std::mem::swap(&mut self.prim0, &mut self.prim1);
    }

    /// Skin of body A
    pub fn skin0(&self) -> &'a CollisionSkin {
        self.skin0
    }

    /// Skin of body B
    pub fn skin1(&self) -> &'a CollisionSkin {
        self.skin1
    }

    /// Primitive index within skin A
    pub fn prim0(&self) -> usize {
        self.prim0
    }

    /// Primitive index within skin B
    pub fn prim1(&self) -> usize {
        self.prim1
    }

    /// Kind of primitive A
    pub fn kind0(&self) -> PrimitiveKind {
        self.skin0.primitive_local(self.prim0).kind()
    }

    /// Kind of primitive B
    pub fn kind1(&self) -> PrimitiveKind {
        self.skin1.primitive_local(self.prim1).kind()
    }

    /// Primitive A at the start of the step
    pub fn old0(&self) -> &'a Primitive {
        self.skin0.primitive_old_world(self.prim0)
    }

    /// Primitive B at the start of the step
    pub fn old1(&self) -> &'a Primitive {
        self.skin1.primitive_old_world(self.prim1)
    }

    /// Primitive A at the end of the step
    pub fn new0(&self) -> &'a Primitive {
        self.skin0.primitive_new_world(self.prim0)
    }

    /// Primitive B at the end of the step
    pub fn new1(&self) -> &'a Primitive {
        self.skin1.primitive_new_world(self.prim1)
    }
}
