//! Real-time pose keypoint overlay rendering.
//!
//! This crate draws the keypoints and skeleton connections reported by an
//! external pose-estimation model over live webcam video. The model itself is
//! a black box behind the [`pose::PoseSource`] trait; what lives here is the
//! presentation pipeline: frame acquisition, the aspect-preserving
//! media-to-canvas fit, and the overlay drawing.
//!
//! # Coordinates
//!
//! Keypoint coordinates are in *media* (video frame) pixels, X pointing right
//! and Y pointing down. [`fit::Fit::project`] maps them to canvas pixels.
//!
//! # Environment Variables
//!
//! * `POSEVIEW_WEBCAM_NAME`: Forces the device to use for [`Webcam`]s created
//!   without an explicit device name. If unset, the first device that supports
//!   a compatible image format will be used.
//!
//! [`Webcam`]: video::webcam::Webcam

use log::LevelFilter;

pub mod fit;
pub mod gui;
pub mod image;
pub mod overlay;
pub mod pose;
pub mod slot;
pub mod timer;
pub mod video;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .filter(Some("wgpu"), LevelFilter::Warn)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and poseview will log at *debug* level, `wgpu` at *warn*
/// level. `RUST_LOG` overrides both.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
