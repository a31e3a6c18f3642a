/// Column-major 4x4 matrix, the layout `glUniformMatrix4fv(.., transpose = false, ..)` expects.
pub type Mat4 = [f32; 16];

pub const IDENTITY: Mat4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Orthographic view volume that letterboxes or pillarboxes the unit quad.
///
/// The quad spans `[-1, 1]` on both axes. Widening the volume on one axis shrinks the quad on
/// that axis, so the video keeps its aspect ratio and fills the other axis exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectFit {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl AspectFit {
    /// Full-surface volume (video and screen share an aspect ratio).
    pub const FILL: AspectFit = AspectFit {
        left: -1.0,
        right: 1.0,
        bottom: -1.0,
        top: 1.0,
    };

    /// Computes the volume for a `screen_w x screen_h` surface showing `video_w x video_h`.
    ///
    /// Zero dimensions fall back to [`AspectFit::FILL`].
    pub fn compute(screen_w: u32, screen_h: u32, video_w: u32, video_h: u32) -> Self {
        if screen_w == 0 || screen_h == 0 || video_w == 0 || video_h == 0 {
            return Self::FILL;
        }
        let sa = screen_w as f32 / screen_h as f32;
        let va = video_w as f32 / video_h as f32;
        if va > sa {
            let k = va / sa;
            Self {
                left: -1.0,
                right: 1.0,
                bottom: -k,
                top: k,
            }
        } else {
            let k = sa / va;
            Self {
                left: -k,
                right: k,
                bottom: -1.0,
                top: 1.0,
            }
        }
    }

    /// `ortho(left, right, bottom, top, -1, 1)`.
    pub fn matrix(&self) -> Mat4 {
        let (near, far) = (-1.0f32, 1.0f32);
        let rw = 1.0 / (self.right - self.left);
        let rh = 1.0 / (self.top - self.bottom);
        let rd = 1.0 / (far - near);

        let mut m = [0.0f32; 16];
        m[0] = 2.0 * rw;
        m[5] = 2.0 * rh;
        m[10] = -2.0 * rd;
        m[12] = -(self.right + self.left) * rw;
        m[13] = -(self.top + self.bottom) * rh;
        m[14] = -(far + near) * rd;
        m[15] = 1.0;
        m
    }

    /// Pixel size of the unit quad once projected onto a `screen_w x screen_h` surface.
    pub fn rendered_size(&self, screen_w: u32, screen_h: u32) -> (f32, f32) {
        let w = screen_w as f32 * 2.0 / (self.right - self.left);
        let h = screen_h as f32 * 2.0 / (self.top - self.bottom);
        (w, h)
    }
}

/// Preferred drawable size for a window showing a video.
///
/// Portrait video keeps the window height and narrows the width to the video aspect; anything
/// else uses the full window.
pub fn layout_for(window: (u32, u32), video: Option<(u32, u32)>) -> (u32, u32) {
    match video {
        Some((vw, vh)) if vw > 0 && vh > 0 && vw < vh => {
            let ratio = window.1 as f32 / vh as f32;
            (((ratio * vw as f32) as u32).max(1), window.1)
        }
        _ => window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn equal_aspect_fills_the_surface() {
        let fit = AspectFit::compute(1280, 720, 1920, 1080);
        assert!(close(fit.right, 1.0) && close(fit.top, 1.0));
        assert_eq!(fit.matrix()[0], 1.0);
        assert_eq!(fit.matrix()[5], 1.0);
    }

    #[test]
    fn wide_video_on_square_surface_letterboxes() {
        let fit = AspectFit::compute(1000, 1000, 1920, 1080);
        assert_eq!((fit.left, fit.right), (-1.0, 1.0));
        assert!(close(fit.top, 1920.0 / 1080.0));
        let (w, h) = fit.rendered_size(1000, 1000);
        assert!(close(w, 1000.0));
        assert!(close(w / h, 1920.0 / 1080.0));
    }

    #[test]
    fn portrait_video_on_landscape_surface_pillarboxes() {
        let fit = AspectFit::compute(1920, 1080, 1080, 1920);
        assert_eq!((fit.bottom, fit.top), (-1.0, 1.0));
        assert!((fit.right - 3.1605).abs() < 1e-3);
        assert!(close(fit.left, -fit.right));
    }

    #[test]
    fn matrix_maps_volume_edges_to_clip_edges() {
        let fit = AspectFit::compute(1920, 1080, 1080, 1920);
        let m = fit.matrix();
        // x_clip = m[0] * x + m[12]
        assert!(close(m[0] * fit.right + m[12], 1.0));
        assert!(close(m[0] * fit.left + m[12], -1.0));
        assert!(close(m[5] * fit.top + m[13], 1.0));
    }

    #[test]
    fn portrait_layout_keeps_window_height() {
        assert_eq!(layout_for((1920, 1080), Some((1080, 1920))), (607, 1080));
        assert_eq!(layout_for((1920, 1080), Some((1920, 1080))), (1920, 1080));
        assert_eq!(layout_for((1920, 1080), None), (1920, 1080));
    }

    #[test]
    fn zero_dimensions_fall_back_to_fill() {
        assert_eq!(AspectFit::compute(0, 1080, 10, 10), AspectFit::FILL);
        assert_eq!(AspectFit::compute(1920, 1080, 10, 0), AspectFit::FILL);
    }
}
