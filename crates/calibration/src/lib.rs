//! # Calibration
//!
//! Pure geometry turning two simultaneous finger-sensor samples plus the
//! reference sensor's pose into a canonical-frame reference point.
//!
//! The rotation order is azimuth about Z, then elevation about Y, then roll
//! about X, each step computed by polar decomposition in the relevant plane
//! rather than explicit rotation matrices. Angles are degrees throughout;
//! conversion happens at each trigonometric call.

use contracts::{Point3, ReferencePoint};

/// Canonical-frame offset of the finger midpoint relative to the reference
/// sensor.
///
/// Computes `midpoint(finger_a, finger_b) - ref_sensor` and rotates the
/// result into the zero-orientation frame using the reference sensor's own
/// azimuth/elevation/roll at capture time.
pub fn canonical_offset(finger_a: &Point3, finger_b: &Point3, ref_sensor: &Point3) -> Point3 {
    let offset = Point3::from_position(
        (finger_a.x + finger_b.x) / 2.0 - ref_sensor.x,
        (finger_a.y + finger_b.y) / 2.0 - ref_sensor.y,
        (finger_a.z + finger_b.z) / 2.0 - ref_sensor.z,
    );
    rotate_to_canonical(offset, ref_sensor)
}

/// Build a complete reference point from one capture.
///
/// `pos` is the canonical-frame offset; `ref_sensor_pos` keeps the
/// uncalibrated reference-sensor sample.
pub fn reference_point(
    index: usize,
    finger_a: &Point3,
    finger_b: &Point3,
    ref_sensor: &Point3,
) -> ReferencePoint {
    ReferencePoint::new(
        index,
        canonical_offset(finger_a, finger_b, ref_sensor),
        *ref_sensor,
    )
}

/// Express one tick's finger midpoint relative to the nearest reference
/// point.
///
/// This is the per-tick output transform of a full run: the canonical-frame
/// offset minus the position of the closest calibrated reference point.
/// Returns `None` when the reference set is empty.
pub fn calibrated_sample(
    finger_a: &Point3,
    finger_b: &Point3,
    ref_sensor: &Point3,
    references: &[ReferencePoint],
) -> Option<Point3> {
    let canonical = canonical_offset(finger_a, finger_b, ref_sensor);
    let nearest = nearest_reference(&canonical, references)?;
    Some(Point3::from_position(
        canonical.x - nearest.pos.x,
        canonical.y - nearest.pos.y,
        canonical.z - nearest.pos.z,
    ))
}

/// The reference point whose canonical position is closest to `point`.
pub fn nearest_reference<'a>(
    point: &Point3,
    references: &'a [ReferencePoint],
) -> Option<&'a ReferencePoint> {
    references.iter().min_by(|a, b| {
        let da = a.pos.position_distance(point);
        let db = b.pos.position_distance(point);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// Rotate an offset into the canonical frame.
///
/// The elevation step pairs the azimuth-rotated x with the *original* offset
/// z, and the roll step pairs the azimuth-rotated y with the
/// elevation-rotated z. Sign convention: azimuth subtracted, elevation
/// added, roll subtracted. This sequencing has not been validated against
/// ground truth for all quadrants; the tests below pin the current
/// convention.
fn rotate_to_canonical(offset: Point3, orientation: &Point3) -> Point3 {
    let azimuth = orientation.azimuth;
    let elevation = orientation.elevation;
    let roll = orientation.roll;

    // Azimuth: rotation about the Z axis in the x/y plane.
    let azimuth_distance = offset.x.hypot(offset.y);
    let a = offset.y.atan2(offset.x).to_degrees() - azimuth;
    let x_az = azimuth_distance * a.to_radians().cos();
    let y_az = azimuth_distance * a.to_radians().sin();

    // Elevation: rotation about the Y axis in the x/z plane.
    let elevation_distance = x_az.hypot(offset.z);
    let b = offset.z.atan2(x_az).to_degrees() + elevation;
    let x_el = elevation_distance * b.to_radians().cos();
    let z_el = elevation_distance * b.to_radians().sin();

    // Roll: rotation about the X axis in the y/z plane.
    let roll_distance = y_az.hypot(z_el);
    let c = z_el.atan2(y_az).to_degrees() - roll;
    let y_roll = roll_distance * c.to_radians().cos();
    let z_roll = roll_distance * c.to_radians().sin();

    Point3::from_position(x_el, y_roll, z_roll)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_pos_eq(p: &Point3, x: f64, y: f64, z: f64) {
        assert!((p.x - x).abs() < EPS, "x: {} vs {}", p.x, x);
        assert!((p.y - y).abs() < EPS, "y: {} vs {}", p.y, y);
        assert!((p.z - z).abs() < EPS, "z: {} vs {}", p.z, z);
    }

    #[test]
    fn test_zero_orientation_is_identity() {
        // With a zero-orientation reference sensor the calibrated position
        // is exactly midpoint - ref_sensor_pos.
        let finger_a = Point3::from_position(10.0, 4.0, 2.0);
        let finger_b = Point3::from_position(14.0, 8.0, 6.0);
        let reference = Point3::from_position(2.0, 1.0, 3.0);

        let offset = canonical_offset(&finger_a, &finger_b, &reference);
        assert_pos_eq(&offset, 10.0, 5.0, 1.0);
    }

    #[test]
    fn test_azimuth_quarter_turn() {
        // Midpoint one unit along +y, reference sensor azimuth 90 degrees:
        // the azimuth step brings the offset onto the +x axis.
        let finger = Point3::from_position(0.0, 1.0, 0.0);
        let reference = Point3::new(0.0, 0.0, 0.0, 90.0, 0.0, 0.0);

        let offset = canonical_offset(&finger, &finger, &reference);
        assert_pos_eq(&offset, 1.0, 0.0, 0.0);
    }

    #[test]
    fn test_elevation_quarter_turn() {
        // Offset along +x with elevation 90: x rotates into +z.
        let finger = Point3::from_position(1.0, 0.0, 0.0);
        let reference = Point3::new(0.0, 0.0, 0.0, 0.0, 90.0, 0.0);

        let offset = canonical_offset(&finger, &finger, &reference);
        assert_pos_eq(&offset, 0.0, 0.0, 1.0);
    }

    #[test]
    fn test_roll_quarter_turn() {
        // Offset along +z with roll 90: z rotates into +y.
        let finger = Point3::from_position(0.0, 0.0, 1.0);
        let reference = Point3::new(0.0, 0.0, 0.0, 0.0, 0.0, 90.0);

        let offset = canonical_offset(&finger, &finger, &reference);
        assert_pos_eq(&offset, 0.0, 1.0, 0.0);
    }

    #[test]
    fn test_rotation_preserves_distance() {
        let finger_a = Point3::from_position(3.0, -2.0, 7.0);
        let finger_b = Point3::from_position(5.0, 2.0, 1.0);
        let reference = Point3::new(1.0, 1.0, 1.0, 33.0, -21.0, 74.0);

        let plain = Point3::from_position(
            (finger_a.x + finger_b.x) / 2.0 - reference.x,
            (finger_a.y + finger_b.y) / 2.0 - reference.y,
            (finger_a.z + finger_b.z) / 2.0 - reference.z,
        );
        let rotated = canonical_offset(&finger_a, &finger_b, &reference);

        let origin = Point3::default();
        assert!(
            (plain.position_distance(&origin) - rotated.position_distance(&origin)).abs() < EPS
        );
    }

    #[test]
    fn test_reference_point_keeps_raw_sensor_pose() {
        let finger = Point3::from_position(4.0, 0.0, 0.0);
        let reference = Point3::new(1.0, 2.0, 3.0, 10.0, 20.0, 30.0);

        let point = reference_point(2, &finger, &finger, &reference);
        assert_eq!(point.index, 2);
        assert_eq!(point.ref_sensor_pos, reference);
    }

    #[test]
    fn test_nearest_reference() {
        let refs = vec![
            ReferencePoint::new(0, Point3::from_position(0.0, 0.0, 0.0), Point3::default()),
            ReferencePoint::new(1, Point3::from_position(10.0, 0.0, 0.0), Point3::default()),
        ];
        let near_second = Point3::from_position(8.0, 0.0, 0.0);
        assert_eq!(nearest_reference(&near_second, &refs).unwrap().index, 1);
        assert!(nearest_reference(&near_second, &[]).is_none());
    }

    #[test]
    fn test_calibrated_sample_relative_to_nearest() {
        let refs = vec![ReferencePoint::new(
            0,
            Point3::from_position(1.0, 1.0, 1.0),
            Point3::default(),
        )];
        let finger = Point3::from_position(2.0, 2.0, 2.0);
        let reference = Point3::default();

        let out = calibrated_sample(&finger, &finger, &reference, &refs).unwrap();
        assert_pos_eq(&out, 1.0, 1.0, 1.0);
        assert!(calibrated_sample(&finger, &finger, &reference, &[]).is_none());
    }
}
