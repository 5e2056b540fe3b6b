/// Joint-angle state and the discrete angle update policy
use log::debug;
use serde::{Deserialize, Serialize};

/// How a joint reacts to a step that leaves its range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum JointLimit {
    /// Remainder modulo 360, keeping the sign of the angle. Unbounded.
    Wrap,
    /// A step whose result would leave `[min, max]` is dropped.
    Clamp { min: f32, max: f32 },
}

impl JointLimit {
    /// Whether `angle` is a reachable value under this limit
    pub fn contains(&self, angle: f32) -> bool {
        match *self {
            JointLimit::Wrap => angle.is_finite(),
            JointLimit::Clamp { min, max } => (min..=max).contains(&angle),
        }
    }

    /// Angle after one step of `delta`, or `None` when the step is refused
    pub fn step(&self, angle: f32, delta: f32) -> Option<f32> {
        let next = angle + delta;
        match *self {
            JointLimit::Wrap => Some(next % 360.0),
            JointLimit::Clamp { min, max } => (min..=max).contains(&next).then_some(next),
        }
    }
}

/// A single input-driven angle step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmCommand {
    Arm1Left,
    Arm1Right,
    Arm2Up,
    Arm2Down,
    PalmLeft,
    PalmRight,
    FingerOpen,
    FingerClose,
}

/// Step size and range policy per joint (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnglePolicy {
    pub step: f32,
    pub arm1: JointLimit,
    pub arm2: JointLimit,
    pub palm: JointLimit,
    pub finger: JointLimit,
}

impl Default for AnglePolicy {
    fn default() -> Self {
        Self {
            step: 3.0,
            arm1: JointLimit::Wrap,
            arm2: JointLimit::Clamp {
                min: -135.0,
                max: 135.0,
            },
            palm: JointLimit::Wrap,
            finger: JointLimit::Clamp {
                min: -60.0,
                max: 60.0,
            },
        }
    }
}

/// Current joint angles of the arm (degrees).
///
/// Fingers share one angle: finger1 rotates by `+finger`, finger2 by `-finger`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticulatedModelState {
    pub arm1: f32,
    pub arm2: f32,
    pub palm: f32,
    pub finger: f32,
}

impl ArticulatedModelState {
    pub fn new(arm1: f32, arm2: f32, palm: f32, finger: f32) -> Self {
        Self {
            arm1,
            arm2,
            palm,
            finger,
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Apply one command. Returns whether any angle changed.
    pub fn apply(&mut self, command: ArmCommand, policy: &AnglePolicy) -> bool {
        let step = policy.step;
        let (angle, limit, delta) = match command {
            ArmCommand::Arm1Left => (&mut self.arm1, &policy.arm1, -step),
            ArmCommand::Arm1Right => (&mut self.arm1, &policy.arm1, step),
            ArmCommand::Arm2Up => (&mut self.arm2, &policy.arm2, step),
            ArmCommand::Arm2Down => (&mut self.arm2, &policy.arm2, -step),
            ArmCommand::PalmLeft => (&mut self.palm, &policy.palm, -step),
            ArmCommand::PalmRight => (&mut self.palm, &policy.palm, step),
            ArmCommand::FingerOpen => (&mut self.finger, &policy.finger, step),
            ArmCommand::FingerClose => (&mut self.finger, &policy.finger, -step),
        };

        match limit.step(*angle, delta) {
            Some(next) => {
                *angle = next;
                debug!("{:?} -> {:.1}", command, next);
                true
            }
            None => {
                debug!("{:?} refused at {:.1}", command, *angle);
                false
            }
        }
    }
}

impl Default for ArticulatedModelState {
    /// Starting pose of the multi-joint arm
    fn default() -> Self {
        Self::new(90.0, 45.0, 0.0, 0.0)
    }
}
