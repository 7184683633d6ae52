//! Pose data model and the external-model adapter boundary.
//!
//! Pose estimation itself is *not* part of this crate. A model is plugged in
//! through the [`PoseSource`] trait and treated as a black box that turns a
//! camera frame into a list of [`Pose`]s. The built-in index scheme and
//! skeleton topology match the 17-keypoint scheme used by MoveNet-style body
//! models, which is what the viewer's default topology assumes.

use std::thread;

use once_cell::sync::Lazy;

use crate::{image::Image, slot::Latest, timer::FpsCounter};

/// A detected anatomical landmark with position and confidence.
///
/// Coordinates are in media (video frame) pixels. Confidence is in range 0.0
/// to 1.0; what counts as "visible" is decided by the model adapter's
/// [`PoseSource::visibility_threshold`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    x: f32,
    y: f32,
    confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// One detected body: an ordered list of keypoints with a fixed index scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    /// Returns the keypoint at `index`.
    ///
    /// A model may return fewer keypoints than its index scheme defines;
    /// out-of-range indices are "not detected", never an error.
    pub fn get(&self, index: usize) -> Option<Keypoint> {
        self.keypoints.get(index).copied()
    }
}

/// A skeletal connection between two keypoint indices, drawn as a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
}

/// Keypoint indices of the 17-point MoveNet-style body topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypointIdx {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

const CONNECTIVITY: &[(KeypointIdx, KeypointIdx)] = {
    use KeypointIdx::*;
    &[
        (Nose, LeftEye),
        (Nose, RightEye),
        (LeftEye, LeftEar),
        (RightEye, RightEar),
        (LeftShoulder, RightShoulder),
        (LeftShoulder, LeftElbow),
        (LeftElbow, LeftWrist),
        (RightShoulder, RightElbow),
        (RightElbow, RightWrist),
        (LeftShoulder, LeftHip),
        (RightShoulder, RightHip),
        (LeftHip, RightHip),
        (LeftHip, LeftKnee),
        (LeftKnee, LeftAnkle),
        (RightHip, RightKnee),
        (RightKnee, RightAnkle),
    ]
};

/// Returns the skeleton edge list of the 17-point body topology.
pub fn skeleton_edges() -> &'static [Edge] {
    static EDGES: Lazy<Vec<Edge>> = Lazy::new(|| {
        CONNECTIVITY
            .iter()
            .map(|&(a, b)| Edge {
                a: a as usize,
                b: b as usize,
            })
            .collect()
    });

    &EDGES
}

/// Adapter around an external pose-estimation model.
///
/// The two observed model generations differ in keypoint schema and usable
/// confidence threshold, so both are adapter configuration rather than
/// renderer constants.
pub trait PoseSource: Send + 'static {
    /// Returns the skeleton topology of the active model.
    fn skeleton(&self) -> &[Edge];

    /// Runs detection on a frame, returning all detected bodies.
    ///
    /// May be arbitrarily slow; the caller is expected to run it off the
    /// render path and tolerate stale results.
    fn detect(&mut self, frame: &Image) -> Vec<Pose>;

    /// Keypoint visibility threshold appropriate for this model's confidence
    /// scale. Keypoints at or below the threshold are not drawn.
    fn visibility_threshold(&self) -> f32 {
        0.1
    }
}

/// Relative keypoint positions of an upright figure, used by [`Synthetic`].
#[rustfmt::skip]
const NEUTRAL_POSE: [(f32, f32); 17] = [
    (0.50, 0.15),             // nose
    (0.52, 0.13), (0.48, 0.13), // eyes
    (0.55, 0.14), (0.45, 0.14), // ears
    (0.60, 0.25), (0.40, 0.25), // shoulders
    (0.64, 0.38), (0.36, 0.38), // elbows
    (0.66, 0.50), (0.34, 0.50), // wrists
    (0.57, 0.52), (0.43, 0.52), // hips
    (0.58, 0.70), (0.42, 0.70), // knees
    (0.58, 0.88), (0.42, 0.88), // ankles
];

/// A scripted pose source producing a slowly swaying figure.
///
/// Exists so that the overlay pipeline can run end to end (and be tested)
/// without a real model attached.
pub struct Synthetic {
    phase: f32,
}

impl Synthetic {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }
}

impl Default for Synthetic {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseSource for Synthetic {
    fn skeleton(&self) -> &[Edge] {
        skeleton_edges()
    }

    fn detect(&mut self, frame: &Image) -> Vec<Pose> {
        self.phase += 0.05;

        let w = frame.width() as f32;
        let h = frame.height() as f32;
        let sway = self.phase.sin() * 0.03;
        let keypoints = NEUTRAL_POSE
            .iter()
            .enumerate()
            .map(|(i, &(rx, ry))| {
                // Upper-body keypoints sway more than the legs.
                let damp = 1.0 - i as f32 / NEUTRAL_POSE.len() as f32;
                Keypoint::new((rx + sway * damp) * w, ry * h, 1.0)
            })
            .collect();

        vec![Pose::new(keypoints)]
    }
}

/// Spawns the detection thread connecting a [`PoseSource`] to the render loop.
///
/// The thread consumes the most recent frame from `frames` and publishes the
/// resulting poses to `poses`, overwriting whatever the render loop hasn't
/// picked up yet. It runs at the model's own cadence, which may be slower
/// than the frame rate; the render loop then draws stale poses over fresh
/// video. There is no shutdown signal, the thread runs until the process
/// ends.
pub fn spawn_detector<S: PoseSource>(
    mut source: S,
    frames: Latest<Image>,
    poses: Latest<Vec<Pose>>,
) {
    thread::Builder::new()
        .name("detector".into())
        .spawn(move || {
            let mut fps = FpsCounter::new("detector");
            loop {
                let frame = frames.wait();
                poses.set(source.detect(&frame));
                fps.tick();
            }
        })
        .expect("failed to spawn detector thread");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keypoints_are_absent() {
        let pose = Pose::new(vec![Keypoint::new(1.0, 2.0, 0.9)]);
        assert!(pose.get(0).is_some());
        assert_eq!(pose.get(KeypointIdx::RightAnkle as usize), None);
    }

    #[test]
    fn test_skeleton_indices_in_range() {
        for edge in skeleton_edges() {
            assert!(edge.a < NEUTRAL_POSE.len());
            assert!(edge.b < NEUTRAL_POSE.len());
            assert_ne!(edge.a, edge.b);
        }
    }

    #[test]
    fn test_synthetic_covers_topology() {
        let mut source = Synthetic::new();
        let frame = Image::new(640, 480);
        let detections = source.detect(&frame);
        assert_eq!(detections.len(), 1);

        let pose = &detections[0];
        assert_eq!(pose.keypoints().len(), 17);
        for kp in pose.keypoints() {
            assert!(kp.confidence() > source.visibility_threshold());
            assert!(kp.x() >= 0.0 && kp.x() < 640.0);
            assert!(kp.y() >= 0.0 && kp.y() < 480.0);
        }
    }

    #[test]
    fn test_detector_thread_publishes() {
        let frames = Latest::new();
        let poses = Latest::new();
        spawn_detector(Synthetic::new(), frames.clone(), poses.clone());

        frames.set(Image::new(64, 64));
        // The detector runs at its own cadence; wait for the first result.
        let mut result = None;
        for _ in 0..100 {
            result = poses.peek();
            if result.is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(result.map(|poses| poses.len()), Some(1));
    }
}
