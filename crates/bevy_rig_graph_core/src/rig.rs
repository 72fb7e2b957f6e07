use bevy::{platform::collections::HashMap, transform::components::Transform};
use serde::{Deserialize, Serialize};

use crate::{errors::RigError, id::ChannelId};

/// Kind of an animated channel. Streams lay their channels out in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Translation,
    Rotation,
    Scale,
    Float,
    Int,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 5] = [
        ChannelKind::Translation,
        ChannelKind::Rotation,
        ChannelKind::Scale,
        ChannelKind::Float,
        ChannelKind::Int,
    ];
}

/// A bone of the rig with its bind pose, relative to its parent.
#[derive(Clone, Debug, PartialEq)]
pub struct RigBone {
    pub id: ChannelId,
    pub parent: Option<usize>,
    pub bind_pose: Transform,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FloatBinding {
    pub id: ChannelId,
    pub default: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntBinding {
    pub id: ChannelId,
    pub default: i32,
}

/// Immutable skeleton and channel binding metadata.
///
/// Bone `i` owns translation, rotation and scale binding `i`. Float and int bindings follow
/// in declaration order. Binding indices never change once the rig is built, so a rig is
/// shared as `Arc<RigDefinition>` by every stream, clip instance and node that animates it.
#[derive(Debug)]
pub struct RigDefinition {
    bones: Vec<RigBone>,
    floats: Vec<FloatBinding>,
    ints: Vec<IntBinding>,
    root_bone: Option<usize>,
    bone_lookup: HashMap<ChannelId, usize>,
    float_lookup: HashMap<ChannelId, usize>,
    int_lookup: HashMap<ChannelId, usize>,
}

impl RigDefinition {
    pub fn builder() -> RigBuilder {
        RigBuilder::default()
    }

    pub fn bones(&self) -> &[RigBone] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> Option<&RigBone> {
        self.bones.get(index)
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.bones.get(index).and_then(|bone| bone.parent)
    }

    pub fn floats(&self) -> &[FloatBinding] {
        &self.floats
    }

    pub fn ints(&self) -> &[IntBinding] {
        &self.ints
    }

    /// Index of the designated root bone, if the rig has one.
    pub fn root_bone(&self) -> Option<usize> {
        self.root_bone
    }

    pub fn bone_index(&self, id: ChannelId) -> Option<usize> {
        self.bone_lookup.get(&id).copied()
    }

    pub fn binding_index(&self, kind: ChannelKind, id: ChannelId) -> Option<usize> {
        match kind {
            ChannelKind::Translation | ChannelKind::Rotation | ChannelKind::Scale => {
                self.bone_index(id)
            }
            ChannelKind::Float => self.float_lookup.get(&id).copied(),
            ChannelKind::Int => self.int_lookup.get(&id).copied(),
        }
    }

    pub fn binding_id(&self, kind: ChannelKind, index: usize) -> Option<ChannelId> {
        match kind {
            ChannelKind::Translation | ChannelKind::Rotation | ChannelKind::Scale => {
                self.bones.get(index).map(|bone| bone.id)
            }
            ChannelKind::Float => self.floats.get(index).map(|binding| binding.id),
            ChannelKind::Int => self.ints.get(index).map(|binding| binding.id),
        }
    }

    pub fn binding_count(&self, kind: ChannelKind) -> usize {
        match kind {
            ChannelKind::Translation | ChannelKind::Rotation | ChannelKind::Scale => {
                self.bones.len()
            }
            ChannelKind::Float => self.floats.len(),
            ChannelKind::Int => self.ints.len(),
        }
    }

    /// Total number of channels, which is also the bit length of stream channel masks.
    pub fn channel_count(&self) -> usize {
        3 * self.bones.len() + self.floats.len() + self.ints.len()
    }

    /// Offset of the first channel of `kind` in the global channel layout.
    pub fn channel_offset(&self, kind: ChannelKind) -> usize {
        let bones = self.bones.len();
        match kind {
            ChannelKind::Translation => 0,
            ChannelKind::Rotation => bones,
            ChannelKind::Scale => 2 * bones,
            ChannelKind::Float => 3 * bones,
            ChannelKind::Int => 3 * bones + self.floats.len(),
        }
    }

    pub fn channel_index(&self, kind: ChannelKind, index: usize) -> usize {
        self.channel_offset(kind) + index
    }

    /// Composes bind pose transforms from `ancestor` (exclusive) down to `bone` (inclusive).
    /// Returns `None` when `ancestor` is not an ancestor of `bone`.
    pub fn bind_pose_between(&self, ancestor: usize, bone: usize) -> Option<Transform> {
        let mut current = bone;
        let mut transform = Transform::IDENTITY;
        while current != ancestor {
            let rig_bone = self.bones.get(current)?;
            transform = rig_bone.bind_pose * transform;
            current = rig_bone.parent?;
        }
        Some(transform)
    }
}

#[derive(Default)]
pub struct RigBuilder {
    bones: Vec<RigBone>,
    floats: Vec<FloatBinding>,
    ints: Vec<IntBinding>,
    root_bone: Option<usize>,
}

impl RigBuilder {
    /// Adds a bone. `parent` is the index of a previously added bone.
    pub fn bone(mut self, path: &str, parent: Option<usize>, bind_pose: Transform) -> Self {
        self.bones.push(RigBone {
            id: ChannelId::from_path(path),
            parent,
            bind_pose,
        });
        self
    }

    pub fn float(mut self, path: &str, default: f32) -> Self {
        self.floats.push(FloatBinding {
            id: ChannelId::from_path(path),
            default,
        });
        self
    }

    pub fn int(mut self, path: &str, default: i32) -> Self {
        self.ints.push(IntBinding {
            id: ChannelId::from_path(path),
            default,
        });
        self
    }

    /// Overrides the root bone. By default the first bone without a parent is the root.
    pub fn root(mut self, index: usize) -> Self {
        self.root_bone = Some(index);
        self
    }

    pub fn build(self) -> Result<RigDefinition, RigError> {
        let mut bone_lookup = HashMap::default();
        for (index, bone) in self.bones.iter().enumerate() {
            if let Some(parent) = bone.parent
                && parent >= index
            {
                return Err(RigError::ParentOutOfOrder {
                    bone: index,
                    parent,
                });
            }
            if bone_lookup.insert(bone.id, index).is_some() {
                return Err(RigError::DuplicateBone(bone.id));
            }
        }

        let float_lookup = Self::lookup(
            self.floats.iter().map(|binding| binding.id),
            ChannelKind::Float,
        )?;
        let int_lookup = Self::lookup(self.ints.iter().map(|binding| binding.id), ChannelKind::Int)?;

        let root_bone = match self.root_bone {
            Some(index) if index >= self.bones.len() => {
                return Err(RigError::RootOutOfRange {
                    index,
                    bone_count: self.bones.len(),
                });
            }
            Some(index) => Some(index),
            None => self.bones.iter().position(|bone| bone.parent.is_none()),
        };

        Ok(RigDefinition {
            bones: self.bones,
            floats: self.floats,
            ints: self.ints,
            root_bone,
            bone_lookup,
            float_lookup,
            int_lookup,
        })
    }

    fn lookup(
        ids: impl Iterator<Item = ChannelId>,
        kind: ChannelKind,
    ) -> Result<HashMap<ChannelId, usize>, RigError> {
        let mut lookup = HashMap::default();
        for (index, id) in ids.enumerate() {
            if lookup.insert(id, index).is_some() {
                return Err(RigError::DuplicateChannel { kind, id });
            }
        }
        Ok(lookup)
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::{Quat, Vec3};

    use super::*;

    fn rig() -> RigDefinition {
        RigDefinition::builder()
            .bone("Root", None, Transform::IDENTITY)
            .bone("Hips", Some(0), Transform::from_xyz(0., 1., 0.))
            .bone(
                "Spine",
                Some(1),
                Transform::from_xyz(0., 0.5, 0.).with_rotation(Quat::from_rotation_y(0.5)),
            )
            .float("Blink", 0.25)
            .int("Prop", 3)
            .build()
            .unwrap()
    }

    #[test]
    fn channel_layout_is_kind_major() {
        let rig = rig();
        assert_eq!(rig.channel_count(), 3 * 3 + 1 + 1);
        assert_eq!(rig.channel_index(ChannelKind::Rotation, 1), 4);
        assert_eq!(rig.channel_index(ChannelKind::Scale, 0), 6);
        assert_eq!(rig.channel_index(ChannelKind::Float, 0), 9);
        assert_eq!(rig.channel_index(ChannelKind::Int, 0), 10);
    }

    #[test]
    fn lookups_and_default_root() {
        let rig = rig();
        assert_eq!(rig.root_bone(), Some(0));
        assert_eq!(rig.bone_index(ChannelId::from_path("Spine")), Some(2));
        assert_eq!(
            rig.binding_index(ChannelKind::Float, ChannelId::from_path("Blink")),
            Some(0)
        );
        assert_eq!(
            rig.binding_index(ChannelKind::Int, ChannelId::from_path("Blink")),
            None
        );
    }

    #[test]
    fn bind_pose_between_composes_chain() {
        let rig = rig();
        let spine_in_root = rig.bind_pose_between(0, 2).unwrap();
        assert!(
            spine_in_root
                .translation
                .abs_diff_eq(Vec3::new(0., 1.5, 0.), 1e-6)
        );
        assert!(rig.bind_pose_between(2, 0).is_none());
    }

    #[test]
    fn rejects_invalid_rigs() {
        let duplicate = RigDefinition::builder()
            .bone("A", None, Transform::IDENTITY)
            .bone("A", Some(0), Transform::IDENTITY)
            .build();
        assert_eq!(
            duplicate.unwrap_err(),
            RigError::DuplicateBone(ChannelId::from_path("A"))
        );

        let forward_parent = RigDefinition::builder()
            .bone("A", Some(1), Transform::IDENTITY)
            .bone("B", None, Transform::IDENTITY)
            .build();
        assert!(matches!(
            forward_parent,
            Err(RigError::ParentOutOfOrder { bone: 0, parent: 1 })
        ));

        let bad_root = RigDefinition::builder()
            .bone("A", None, Transform::IDENTITY)
            .root(4)
            .build();
        assert!(matches!(bad_root, Err(RigError::RootOutOfRange { .. })));
    }
}
