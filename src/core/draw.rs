use opencv::{
    core::{Mat, Point, Scalar},
    imgproc,
    prelude::*,
};

use crate::core::params::MAX_TRACK_ERROR;
use crate::core::tracking::TrackedPoint;

/// Tracks the estimator lost, or whose error is strictly above the
/// threshold, are dropped. An error of exactly the threshold survives.
pub fn keeps_track(found: bool, error: f32) -> bool {
    found && error <= MAX_TRACK_ERROR
}

// Nearest-pixel coordinate, clamped into [0, len).
fn round_clamp(v: f32, len: i32) -> i32 {
    (v.round() as i32).clamp(0, len - 1)
}

fn vector_color() -> Scalar {
    // red, BGR order
    Scalar::new(0.0, 0.0, 255.0, 0.0)
}

/// Draws every surviving track as a 1 px red segment from its position in
/// the newest frame to its match in the prior one. 8-connected, no
/// anti-aliasing. Returns the drawn count.
pub fn draw_tracks(frame: &mut Mat, tracks: &[TrackedPoint]) -> opencv::Result<u64> {
    let (cols, rows) = (frame.cols(), frame.rows());
    let mut drawn = 0;
    for track in tracks {
        if !keeps_track(track.found, track.error) {
            continue;
        }
        let from = Point::new(
            round_clamp(track.from.x, cols),
            round_clamp(track.from.y, rows),
        );
        let to = Point::new(round_clamp(track.to.x, cols), round_clamp(track.to.y, rows));
        imgproc::line(frame, from, to, vector_color(), 1, imgproc::LINE_8, 0)?;
        drawn += 1;
    }
    Ok(drawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{self, Point2f, Vec3b};

    fn track(from: (f32, f32), to: (f32, f32), found: bool, error: f32) -> TrackedPoint {
        TrackedPoint {
            from: Point2f::new(from.0, from.1),
            to: Point2f::new(to.0, to.1),
            found,
            error,
        }
    }

    fn black_frame(width: i32, height: i32) -> Mat {
        Mat::zeros(height, width, core::CV_8UC3)
            .unwrap()
            .to_mat()
            .unwrap()
    }

    #[test]
    fn error_boundary_is_inclusive() {
        assert!(keeps_track(true, 550.0));
        assert!(!keeps_track(true, 551.0));
        assert!(!keeps_track(false, 0.0));
    }

    #[test]
    fn endpoints_round_then_clamp() {
        assert_eq!(round_clamp(3.4, 10), 3);
        assert_eq!(round_clamp(3.5, 10), 4);
        assert_eq!(round_clamp(-2.7, 10), 0);
        assert_eq!(round_clamp(42.7, 10), 9);
    }

    #[test]
    fn filtered_tracks_leave_the_frame_untouched() {
        let mut frame = black_frame(16, 16);
        let tracks = [
            track((2.0, 2.0), (10.0, 10.0), false, 0.0),
            track((2.0, 2.0), (10.0, 10.0), true, 551.0),
        ];
        let drawn = draw_tracks(&mut frame, &tracks).unwrap();
        assert_eq!(drawn, 0);
        assert!(frame.data_bytes().unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn surviving_track_paints_a_red_segment() {
        let mut frame = black_frame(16, 16);
        let drawn = draw_tracks(&mut frame, &[track((2.0, 2.0), (10.0, 10.0), true, 550.0)]).unwrap();
        assert_eq!(drawn, 1);
        let px: Vec3b = *frame.at_2d::<Vec3b>(2, 2).unwrap();
        assert_eq!(px, Vec3b::from([0, 0, 255]));
    }

    #[test]
    fn out_of_range_endpoints_stay_inside_the_frame() {
        let mut frame = black_frame(16, 16);
        let drawn = draw_tracks(
            &mut frame,
            &[track((-5.0, -5.0), (100.0, 100.0), true, 0.0)],
        )
        .unwrap();
        assert_eq!(drawn, 1);
        // Clamped to the main diagonal, so both corners carry the vector.
        assert_eq!(*frame.at_2d::<Vec3b>(0, 0).unwrap(), Vec3b::from([0, 0, 255]));
        assert_eq!(
            *frame.at_2d::<Vec3b>(15, 15).unwrap(),
            Vec3b::from([0, 0, 255])
        );
    }
}
