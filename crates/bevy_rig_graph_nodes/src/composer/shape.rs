use bevy_rig_graph_core::{
    clip_configuration::{ClipConfiguration, ClipConfigurationMask},
    id::ChannelId,
};

/// Which clip sample a stage reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Branch {
    /// The clip at the (possibly looped) evaluation time.
    Main,
    /// The first frame of the clip.
    Start,
    /// The last frame of the clip.
    Stop,
}

/// Tag of one stage of a composer pipeline. Stages run in the order they are listed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageDesc {
    /// Scales time and delta time by the clip duration.
    NormalizedTime,
    /// Wraps time into `[0, duration)` and records the cycle index.
    TimeLoop,
    Sample(Branch),
    /// Moves the ground motion of `motion` onto the root, for every sampled branch.
    InPlace { motion: ChannelId, boundaries: bool },
    /// Removes the end-to-start pose difference over each cycle.
    LoopValues { zero_root: bool },
    CycleRootMotion,
    RootMotionFromVelocity,
    /// Replaces the root with the motion since the previous evaluation. Always last.
    DeltaRootMotion,
}

/// The stages needed to sample a clip with `config`.
///
/// The result only depends on `config`. Velocity root motion takes precedence over every
/// other root motion stage, including in-place extraction.
pub fn desired_shape(config: &ClipConfiguration) -> Vec<StageDesc> {
    let mask = config.mask;
    let velocity = mask.contains(ClipConfigurationMask::ROOT_MOTION_FROM_VELOCITY);
    let in_place = config.in_place() && !velocity;
    let cycle = mask.contains(ClipConfigurationMask::CYCLE_ROOT_MOTION) && !velocity;
    let boundaries = mask.contains(ClipConfigurationMask::LOOP_VALUES) || cycle;

    let mut shape = Vec::new();
    if mask.contains(ClipConfigurationMask::NORMALIZED_TIME) {
        shape.push(StageDesc::NormalizedTime);
    }
    if mask.needs_loop() {
        shape.push(StageDesc::TimeLoop);
    }
    shape.push(StageDesc::Sample(Branch::Main));
    if boundaries {
        shape.push(StageDesc::Sample(Branch::Start));
        shape.push(StageDesc::Sample(Branch::Stop));
    }
    if in_place {
        shape.push(StageDesc::InPlace {
            motion: config.motion_id,
            boundaries,
        });
    }
    if mask.contains(ClipConfigurationMask::LOOP_VALUES) {
        shape.push(StageDesc::LoopValues {
            zero_root: in_place || cycle || velocity,
        });
    }
    if cycle {
        shape.push(StageDesc::CycleRootMotion);
    }
    if velocity {
        shape.push(StageDesc::RootMotionFromVelocity);
    }
    if mask.contains(ClipConfigurationMask::DELTA_ROOT_MOTION) && !velocity {
        shape.push(StageDesc::DeltaRootMotion);
    }
    shape
}

#[cfg(test)]
mod tests {
    use bevy_rig_graph_core::test_fixtures::HIPS;

    use super::*;

    #[test]
    fn plain_sampling_is_one_stage() {
        assert_eq!(
            desired_shape(&ClipConfiguration::default()),
            vec![StageDesc::Sample(Branch::Main)]
        );
    }

    #[test]
    fn full_looping_pipeline() {
        let config = ClipConfiguration::new(
            ClipConfigurationMask::NORMALIZED_TIME
                | ClipConfigurationMask::LOOP_VALUES
                | ClipConfigurationMask::CYCLE_ROOT_MOTION
                | ClipConfigurationMask::DELTA_ROOT_MOTION,
        )
        .with_motion(HIPS);
        assert_eq!(
            desired_shape(&config),
            vec![
                StageDesc::NormalizedTime,
                StageDesc::TimeLoop,
                StageDesc::Sample(Branch::Main),
                StageDesc::Sample(Branch::Start),
                StageDesc::Sample(Branch::Stop),
                StageDesc::InPlace {
                    motion: ChannelId::from_path(HIPS),
                    boundaries: true
                },
                StageDesc::LoopValues { zero_root: true },
                StageDesc::CycleRootMotion,
                StageDesc::DeltaRootMotion,
            ]
        );
    }

    #[test]
    fn velocity_overrides_other_root_motion() {
        let config = ClipConfiguration::new(
            ClipConfigurationMask::ROOT_MOTION_FROM_VELOCITY
                | ClipConfigurationMask::CYCLE_ROOT_MOTION
                | ClipConfigurationMask::DELTA_ROOT_MOTION,
        )
        .with_motion(HIPS);
        assert_eq!(
            desired_shape(&config),
            vec![
                StageDesc::TimeLoop,
                StageDesc::Sample(Branch::Main),
                StageDesc::RootMotionFromVelocity,
            ]
        );
    }
}
