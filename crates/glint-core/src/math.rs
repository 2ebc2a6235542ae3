//! Projection math for screen-space rendering.

use glam::Mat4;

/// Build an orthographic projection mapping `[left,right]x[bottom,top]` to
/// the clip-space square, with `[near,far]` mapped to wgpu's [0,1] depth
/// range.
///
/// For a top-left-origin screen space pass `(0.0, width, height, 0.0)`:
/// pixel (0,0) lands at clip (-1,1) and (width,height) at (1,-1).
///
/// # Panics
///
/// Panics when any axis is degenerate (`left == right`, `bottom == top` or
/// `near == far`) since the projection would divide by zero.
pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    assert!(left != right, "degenerate orthographic x axis: left == right ({left})");
    assert!(bottom != top, "degenerate orthographic y axis: bottom == top ({bottom})");
    assert!(near != far, "degenerate orthographic z axis: near == far ({near})");

    Mat4::orthographic_rh(left, right, bottom, top, near, far)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_screen_space_corners() {
        let m = orthographic(0.0, 640.0, 480.0, 0.0, -1.0, 1.0);

        let origin = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(origin.x, -1.0);
        assert_eq!(origin.y, 1.0);

        let far_corner = m * Vec4::new(640.0, 480.0, 0.0, 1.0);
        assert_eq!(far_corner.x, 1.0);
        assert_eq!(far_corner.y, -1.0);
    }

    #[test]
    fn test_center_maps_to_clip_origin() {
        let m = orthographic(0.0, 800.0, 600.0, 0.0, -1.0, 1.0);
        let center = m * Vec4::new(400.0, 300.0, 0.0, 1.0);
        assert_eq!(center.x, 0.0);
        assert_eq!(center.y, 0.0);
    }

    #[test]
    #[should_panic(expected = "degenerate orthographic x axis")]
    fn test_degenerate_horizontal_range_panics() {
        orthographic(100.0, 100.0, 480.0, 0.0, -1.0, 1.0);
    }

    #[test]
    #[should_panic(expected = "degenerate orthographic z axis")]
    fn test_degenerate_depth_range_panics() {
        orthographic(0.0, 640.0, 480.0, 0.0, 1.0, 1.0);
    }
}
