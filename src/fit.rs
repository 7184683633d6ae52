//! Aspect-preserving media-to-canvas fit computation.
//!
//! The canvas (window surface) and the media (camera frame) change size
//! independently of each other, so the fit is recomputed on every render
//! pass. "Contain" semantics are used: the media is scaled uniformly until it
//! touches the canvas bounds on the constraining axis, and centered on the
//! other axis. The media is never cropped.

use crate::image::Resolution;

/// Result of fitting a media resolution into a canvas.
///
/// All values are in canvas pixels, except `scale`, which is the uniform
/// media-to-canvas scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub scale: f32,
    pub draw_width: f32,
    pub draw_height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Fit {
    /// Computes the contain fit of `media` into `canvas`.
    ///
    /// `media` may be [`None`] (or have a zero dimension) while a video
    /// source hasn't loaded its metadata yet; [`Resolution::RES_480P`] is
    /// substituted in that case so that no division by zero can occur.
    ///
    /// A canvas with a zero dimension (eg. a minimized window) produces the
    /// all-zero [`Fit`]. Overlay mark sizing clamps to configured minimums,
    /// so a degenerate scale is harmless downstream.
    pub fn contain(media: Option<Resolution>, canvas: Resolution) -> Fit {
        let media = media
            .filter(Resolution::is_valid)
            .unwrap_or(Resolution::RES_480P);

        if !canvas.is_valid() {
            return Fit {
                scale: 0.0,
                draw_width: 0.0,
                draw_height: 0.0,
                offset_x: 0.0,
                offset_y: 0.0,
            };
        }

        let media_w = media.width() as f32;
        let media_h = media.height() as f32;
        let canvas_w = canvas.width() as f32;
        let canvas_h = canvas.height() as f32;

        let scale = f32::min(canvas_w / media_w, canvas_h / media_h);
        let draw_width = media_w * scale;
        let draw_height = media_h * scale;
        Fit {
            scale,
            draw_width,
            draw_height,
            offset_x: (canvas_w - draw_width) * 0.5,
            offset_y: (canvas_h - draw_height) * 0.5,
        }
    }

    /// Maps a point from media coordinates to canvas coordinates.
    #[inline]
    pub fn project(&self, x: f32, y: f32) -> [f32; 2] {
        [
            self.offset_x + x * self.scale,
            self.offset_y + y * self.scale,
        ]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_wide_media_in_square_canvas() {
        let fit = Fit::contain(
            Some(Resolution::RES_720P),
            Resolution::new(800, 800),
        );
        assert_relative_eq!(fit.scale, 0.625);
        assert_relative_eq!(fit.draw_width, 800.0);
        assert_relative_eq!(fit.draw_height, 450.0);
        assert_relative_eq!(fit.offset_x, 0.0);
        assert_relative_eq!(fit.offset_y, 175.0);
    }

    #[test]
    fn test_tall_media_in_wide_canvas() {
        let fit = Fit::contain(Some(Resolution::new(480, 960)), Resolution::new(1000, 480));
        assert_relative_eq!(fit.scale, 0.5);
        assert_relative_eq!(fit.draw_width, 240.0);
        assert_relative_eq!(fit.draw_height, 480.0);
        assert_relative_eq!(fit.offset_x, 380.0);
        assert_relative_eq!(fit.offset_y, 0.0);
    }

    #[test]
    fn test_contain_never_exceeds_canvas() {
        let sizes = [(1280, 720), (720, 1280), (1, 1), (4096, 10), (33, 77)];
        for (mw, mh) in sizes {
            for (cw, ch) in sizes {
                let media = Resolution::new(mw, mh);
                let canvas = Resolution::new(cw, ch);
                let fit = Fit::contain(Some(media), canvas);

                assert!(fit.draw_width <= cw as f32 + 1e-3);
                assert!(fit.draw_height <= ch as f32 + 1e-3);
                // One axis must touch the canvas bounds.
                assert!(
                    (fit.draw_width - cw as f32).abs() < 1e-3
                        || (fit.draw_height - ch as f32).abs() < 1e-3
                );
                // Aspect ratio is preserved.
                assert_relative_eq!(
                    fit.draw_width / fit.draw_height,
                    mw as f32 / mh as f32,
                    epsilon = 1e-3
                );
                // Leftover space is split evenly.
                assert!(fit.offset_x >= 0.0 && fit.offset_y >= 0.0);
                assert_relative_eq!(fit.offset_x, (cw as f32 - fit.draw_width) * 0.5);
                assert_relative_eq!(fit.offset_y, (ch as f32 - fit.draw_height) * 0.5);
            }
        }
    }

    #[test]
    fn test_media_fallback() {
        let canvas = Resolution::new(320, 240);
        let fallback = Fit::contain(None, canvas);
        assert_eq!(fallback, Fit::contain(Some(Resolution::RES_480P), canvas));
        assert_eq!(
            Fit::contain(Some(Resolution::new(0, 720)), canvas),
            fallback
        );
        assert_relative_eq!(fallback.scale, 0.5);
    }

    #[test]
    fn test_degenerate_canvas() {
        let fit = Fit::contain(Some(Resolution::RES_720P), Resolution::new(0, 600));
        assert_relative_eq!(fit.scale, 0.0);
        assert_relative_eq!(fit.draw_width, 0.0);
        assert_relative_eq!(fit.draw_height, 0.0);
    }

    #[test]
    fn test_recompute_is_deterministic() {
        // Resizing the canvas to the same size twice must not change the fit.
        let media = Some(Resolution::RES_720P);
        let canvas = Resolution::new(1024, 513);
        assert_eq!(Fit::contain(media, canvas), Fit::contain(media, canvas));
    }

    #[test]
    fn test_project() {
        let fit = Fit::contain(Some(Resolution::RES_720P), Resolution::new(800, 800));
        let [x, y] = fit.project(640.0, 360.0);
        assert_relative_eq!(x, 400.0);
        assert_relative_eq!(y, 400.0);

        let [x, y] = fit.project(0.0, 0.0);
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 175.0);
    }
}
