//! Video frame acquisition.

pub mod webcam;
