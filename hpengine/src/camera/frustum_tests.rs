use glam::{Mat4, Vec3};
use crate::scene::AABB;
use super::*;
use crate::camera::Camera;

/// 90° square perspective from the origin down -Z, far plane at 100.
/// At depth d the side planes sit at x = ±d and y = ±d.
fn right_angle_camera() -> Camera {
    Camera::perspective(Vec3::ZERO, Vec3::NEG_Z, std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0)
}

fn frustum() -> Frustum {
    *right_angle_camera().frustum()
}

fn boxed(min: Vec3, max: Vec3) -> AABB {
    AABB { min, max }
}

/// Loose node test as the octree runs it: sphere first, then the 3-way test.
fn node_test(volume: &dyn CullingVolume, aabb: &AABB) -> FrustumTest {
    if !volume.sphere_in_frustum(aabb.center(), aabb.bounding_radius()) {
        return FrustumTest::Outside;
    }
    volume.classify_aabb(aabb)
}

// ============================================================================
// Plane extraction
// ============================================================================

#[test]
fn test_planes_are_normalized_for_skewed_ortho() {
    let projection = Mat4::orthographic_rh(-40.0, 10.0, -2.0, 3.0, 0.5, 900.0);
    let view = Mat4::look_at_rh(Vec3::new(3.0, 7.0, -2.0), Vec3::new(50.0, 0.0, 10.0), Vec3::Y);
    let frustum = Frustum::from_view_projection(&(projection * view));

    for plane in &frustum.planes {
        let length = Vec3::new(plane.x, plane.y, plane.z).length();
        assert!((length - 1.0).abs() < 1e-4, "plane {:?} not normalized", plane);
    }
}

#[test]
fn test_far_and_side_planes_of_right_angle_perspective() {
    let frustum = frustum();

    let far = frustum.planes[PLANE_FAR];
    assert!((Vec3::new(far.x, far.y, far.z) - Vec3::Z).length() < 1e-4);
    assert!((far.w - 100.0).abs() < 1e-2);

    let half = std::f32::consts::FRAC_1_SQRT_2;
    let right = frustum.planes[PLANE_RIGHT];
    assert!((Vec3::new(right.x, right.y, right.z) - Vec3::new(-half, 0.0, -half)).length() < 1e-4);
    let top = frustum.planes[PLANE_TOP];
    assert!((Vec3::new(top.x, top.y, top.z) - Vec3::new(0.0, -half, -half)).length() < 1e-4);
}

// ============================================================================
// sphere_in_frustum
// ============================================================================

#[test]
fn test_sphere_near_side_plane_uses_true_distance() {
    // (20, 0, -10) is 10 / sqrt(2) ≈ 7.07 outside the right plane
    let center = Vec3::new(20.0, 0.0, -10.0);
    assert!(!frustum().sphere_in_frustum(center, 7.0));
    assert!(frustum().sphere_in_frustum(center, 7.2));
}

#[test]
fn test_sphere_against_far_plane() {
    let center = Vec3::new(0.0, 0.0, -105.0);
    assert!(!frustum().sphere_in_frustum(center, 4.9));
    assert!(frustum().sphere_in_frustum(center, 5.1));
}

#[test]
fn test_sphere_behind_eye_is_rejected() {
    assert!(!frustum().sphere_in_frustum(Vec3::new(0.0, 0.0, 5.0), 1.0));
    assert!(frustum().sphere_in_frustum(Vec3::new(0.0, 0.0, -50.0), 0.01));
}

// ============================================================================
// classify_aabb / intersects_aabb
// ============================================================================

#[test]
fn test_classify_against_perspective_sides() {
    let frustum = frustum();

    let deep = boxed(Vec3::new(-1.0, -1.0, -51.0), Vec3::new(1.0, 1.0, -49.0));
    assert_eq!(frustum.classify_aabb(&deep), FrustumTest::Inside);

    let straddling = boxed(Vec3::new(9.0, -1.0, -11.0), Vec3::new(11.0, 1.0, -9.0));
    assert_eq!(frustum.classify_aabb(&straddling), FrustumTest::Partial);
    assert!(frustum.intersects_aabb(&straddling));

    let beside = boxed(Vec3::new(30.0, -1.0, -11.0), Vec3::new(32.0, 1.0, -9.0));
    assert_eq!(frustum.classify_aabb(&beside), FrustumTest::Outside);
    assert!(!frustum.intersects_aabb(&beside));
}

#[test]
fn test_box_beyond_far_plane_is_outside() {
    let aabb = boxed(Vec3::new(-1.0, -1.0, -140.0), Vec3::new(1.0, 1.0, -120.0));
    assert!(!frustum().intersects_aabb(&aabb));
}

// ============================================================================
// CullingVolume
// ============================================================================

#[test]
fn test_sphere_test_never_rejects_a_kept_box() {
    let camera = right_angle_camera();
    let volumes: [&dyn CullingVolume; 2] = [camera.frustum(), &camera];

    for volume in volumes {
        for x in -12..=12 {
            for z in -14..=2 {
                let center = Vec3::new(x as f32 * 10.0, 3.0, z as f32 * 10.0);
                let aabb = AABB::from_center_size(center, 8.0);
                if volume.classify_aabb(&aabb) != FrustumTest::Outside {
                    assert!(volume.sphere_in_frustum(center, aabb.bounding_radius()),
                        "sphere rejected box kept by classify at {}", center);
                }
            }
        }
    }
}

#[test]
fn test_camera_and_frustum_agree_as_culling_volumes() {
    let camera = right_angle_camera();
    let loose_nodes = [
        AABB::from_center_size(Vec3::new(0.0, 0.0, -20.0), 10.0),
        AABB::from_center_size(Vec3::new(0.0, 0.0, -20.0), 200.0),
        AABB::from_center_size(Vec3::new(60.0, 0.0, -20.0), 10.0),
        AABB::from_center_size(Vec3::new(0.0, 0.0, 40.0), 10.0),
    ];

    for aabb in &loose_nodes {
        assert_eq!(node_test(&camera, aabb), node_test(camera.frustum(), aabb));
    }
    assert_eq!(node_test(&camera, &loose_nodes[0]), FrustumTest::Inside);
    assert_eq!(node_test(&camera, &loose_nodes[1]), FrustumTest::Partial);
    assert_eq!(node_test(&camera, &loose_nodes[2]), FrustumTest::Outside);
    assert_eq!(node_test(&camera, &loose_nodes[3]), FrustumTest::Outside);
}
