//! Keypoint and skeleton overlay rendering.

use crate::{
    fit::Fit,
    image::{draw, Color, Image},
    pose::{Edge, Pose},
};

/// Visual parameters of the overlay.
///
/// Stroke width and point size are derived from the fit scale and clamped to
/// the configured minimums, so marks stay visible when the video is scaled
/// down and stay proportionate when it is scaled up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// Keypoints with confidence *strictly above* this value are drawn.
    pub threshold: f32,
    pub base_stroke: f32,
    pub min_stroke: f32,
    pub base_point_size: f32,
    pub min_point_size: f32,
    pub edge_color: Color,
    pub point_color: Color,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            base_stroke: 2.5,
            min_stroke: 1.5,
            base_point_size: 8.0,
            min_point_size: 4.0,
            edge_color: Color::RED,
            point_color: Color::GREEN,
        }
    }
}

impl OverlayStyle {
    /// Returns the edge stroke width for the given fit scale.
    pub fn stroke_width(&self, scale: f32) -> f32 {
        f32::max(self.min_stroke, self.base_stroke * scale)
    }

    /// Returns the keypoint marker diameter for the given fit scale.
    pub fn point_size(&self, scale: f32) -> f32 {
        f32::max(self.min_point_size, self.base_point_size * scale)
    }
}

/// Renders video frames and the pose overlay onto a canvas image.
pub struct Overlay {
    edges: Vec<Edge>,
    style: OverlayStyle,
}

impl Overlay {
    /// Creates an overlay renderer for the given skeleton topology.
    pub fn new(edges: Vec<Edge>) -> Self {
        Self {
            edges,
            style: OverlayStyle::default(),
        }
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Draws one complete frame onto `canvas`.
    ///
    /// The canvas is cleared and redrawn from scratch, so repeated calls with
    /// the same inputs produce the same result. `frame` may be [`None`] while
    /// the media source isn't ready yet; the overlay (if any) is still drawn.
    ///
    /// Edges are drawn only when both endpoints exist and clear the
    /// confidence threshold. A pose with fewer keypoints than an edge refers
    /// to simply doesn't get that edge.
    pub fn render(&self, canvas: &mut Image, frame: Option<&Image>, fit: &Fit, poses: &[Pose]) {
        canvas.clear(Color::BLACK);

        if let Some(frame) = frame {
            canvas.blit_scaled(
                frame,
                fit.offset_x.round() as i64,
                fit.offset_y.round() as i64,
                fit.draw_width.round() as u32,
                fit.draw_height.round() as u32,
            );
        }

        let thresh = self.style.threshold;
        let stroke = self.style.stroke_width(fit.scale).round().max(1.0) as u32;
        let diameter = self.style.point_size(fit.scale).round().max(1.0) as u32;

        for pose in poses {
            for edge in &self.edges {
                let (Some(a), Some(b)) = (pose.get(edge.a), pose.get(edge.b)) else {
                    continue;
                };
                if a.confidence() > thresh && b.confidence() > thresh {
                    let [ax, ay] = fit.project(a.x(), a.y());
                    let [bx, by] = fit.project(b.x(), b.y());
                    draw::line(
                        canvas,
                        ax.round() as i32,
                        ay.round() as i32,
                        bx.round() as i32,
                        by.round() as i32,
                    )
                    .color(self.style.edge_color)
                    .stroke_width(stroke);
                }
            }
        }

        for pose in poses {
            for kp in pose.keypoints() {
                if kp.confidence() > thresh {
                    let [x, y] = fit.project(kp.x(), kp.y());
                    draw::circle(canvas, x.round() as i32, y.round() as i32, diameter)
                        .fill()
                        .color(self.style.point_color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        image::Resolution,
        pose::{skeleton_edges, Keypoint},
    };

    use super::*;

    fn identity_fit() -> Fit {
        Fit::contain(Some(Resolution::new(100, 100)), Resolution::new(100, 100))
    }

    fn assert_blank(canvas: &Image) {
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                assert_eq!(canvas.get(x, y), Color::BLACK, "pixel ({x}, {y}) is set");
            }
        }
    }

    #[test]
    fn test_threshold_is_strictly_greater() {
        let overlay = Overlay::new(Vec::new());
        let mut canvas = Image::new(100, 100);

        let at = Pose::new(vec![Keypoint::new(50.0, 50.0, 0.1)]);
        overlay.render(&mut canvas, None, &identity_fit(), &[at]);
        assert_blank(&canvas);

        let above = Pose::new(vec![Keypoint::new(50.0, 50.0, 0.1 + 1e-4)]);
        overlay.render(&mut canvas, None, &identity_fit(), &[above]);
        assert_eq!(canvas.get(50, 50), Color::GREEN);
    }

    #[test]
    fn test_edge_needs_both_endpoints() {
        let overlay = Overlay::new(vec![Edge { a: 0, b: 1 }]);
        let mut canvas = Image::new(100, 100);

        let one_hidden = Pose::new(vec![
            Keypoint::new(10.0, 10.0, 0.05),
            Keypoint::new(90.0, 90.0, 0.9),
        ]);
        overlay.render(&mut canvas, None, &identity_fit(), &[one_hidden]);
        // The visible endpoint is marked, but the line between them isn't drawn.
        assert_eq!(canvas.get(50, 50), Color::BLACK);
        assert_eq!(canvas.get(90, 90), Color::GREEN);

        let both_visible = Pose::new(vec![
            Keypoint::new(10.0, 10.0, 0.9),
            Keypoint::new(90.0, 90.0, 0.9),
        ]);
        overlay.render(&mut canvas, None, &identity_fit(), &[both_visible]);
        assert_eq!(canvas.get(50, 50), Color::RED);
    }

    #[test]
    fn test_short_keypoint_list_skips_edge() {
        let overlay = Overlay::new(vec![Edge { a: 0, b: 5 }]);
        let mut canvas = Image::new(100, 100);

        let pose = Pose::new(vec![Keypoint::new(0.0, 0.0, 0.0)]);
        overlay.render(&mut canvas, None, &identity_fit(), &[pose]);
        assert_blank(&canvas);
    }

    #[test]
    fn test_no_poses_renders_video_only() {
        let overlay = Overlay::new(skeleton_edges().to_vec());
        let mut canvas = Image::new(100, 100);
        let mut frame = Image::new(100, 100);
        frame.clear(Color::WHITE);

        overlay.render(&mut canvas, Some(&frame), &identity_fit(), &[]);
        assert_eq!(canvas.get(0, 0), Color::WHITE);
        assert_eq!(canvas.get(99, 99), Color::WHITE);
    }

    #[test]
    fn test_letterboxed_frame_is_centered() {
        let overlay = Overlay::new(Vec::new());
        let mut canvas = Image::new(100, 100);
        let mut frame = Image::new(100, 50);
        frame.clear(Color::WHITE);

        let fit = Fit::contain(Some(frame.resolution()), canvas.resolution());
        overlay.render(&mut canvas, Some(&frame), &fit, &[]);
        assert_eq!(canvas.get(50, 10), Color::BLACK);
        assert_eq!(canvas.get(50, 50), Color::WHITE);
        assert_eq!(canvas.get(50, 90), Color::BLACK);
    }

    #[test]
    fn test_mark_sizes_clamp_at_degenerate_scale() {
        let style = OverlayStyle::default();
        assert_eq!(style.stroke_width(0.0), style.min_stroke);
        assert_eq!(style.point_size(0.0), style.min_point_size);
        assert!(style.stroke_width(0.0) > 0.0);

        // Large scales grow proportionally instead.
        assert_eq!(style.stroke_width(4.0), style.base_stroke * 4.0);
        assert_eq!(style.point_size(4.0), style.base_point_size * 4.0);
    }
}
