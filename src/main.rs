use std::{thread, time::Duration};

use poseview::{
    fit::Fit,
    gui,
    image::{draw, Image, Resolution},
    overlay::{Overlay, OverlayStyle},
    pose::{self, PoseSource, Synthetic},
    slot::Latest,
    timer::FpsCounter,
    video::webcam::{Webcam, WebcamOptions},
};

const WINDOW: &str = "pose overlay";

fn main() -> ! {
    poseview::init_logger!();
    gui::run(viewer)
}

fn viewer() -> anyhow::Result<()> {
    let source = Synthetic::new();
    let overlay = Overlay::new(source.skeleton().to_vec()).with_style(OverlayStyle {
        threshold: source.visibility_threshold(),
        ..Default::default()
    });

    let frames = Latest::new();
    let poses = Latest::new();
    pose::spawn_detector(source, frames.clone(), poses.clone());

    let mut webcam = match Webcam::open(WebcamOptions::default().resolution(Resolution::RES_720P)) {
        Ok(webcam) => webcam,
        Err(e) => {
            // Keep showing a placeholder instead of tearing the viewer down.
            log::error!("failed to open webcam: {:?}", e);
            return placeholder_loop();
        }
    };

    let mut fps = FpsCounter::new("viewer");
    loop {
        let frame = webcam.read()?;
        frames.set(frame.clone());

        let canvas_res = gui::canvas_resolution(WINDOW).unwrap_or(frame.resolution());
        if !canvas_res.is_valid() {
            // Window is minimized; nothing to draw onto.
            continue;
        }

        // The canvas can be resized between frames, so the fit is recomputed
        // every pass. Poses may lag the displayed frame by however long the
        // detector takes; the latest result is drawn regardless.
        let fit = Fit::contain(Some(frame.resolution()), canvas_res);
        let detected = poses.peek().unwrap_or_default();

        let mut canvas = Image::new(canvas_res.width(), canvas_res.height());
        overlay.render(&mut canvas, Some(&frame), &fit, &detected);
        gui::show_image(WINDOW, &canvas);

        fps.tick_with(webcam.timers());
    }
}

fn placeholder_loop() -> anyhow::Result<()> {
    loop {
        let canvas_res = gui::canvas_resolution(WINDOW).unwrap_or(Resolution::RES_480P);
        if canvas_res.is_valid() {
            let mut canvas = Image::new(canvas_res.width(), canvas_res.height());
            draw::text(
                &mut canvas,
                canvas_res.width() as i32 / 2,
                canvas_res.height() as i32 / 2,
                "no camera detected",
            );
            gui::show_image(WINDOW, &canvas);
        }

        thread::sleep(Duration::from_millis(33));
    }
}
