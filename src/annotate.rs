use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut},
    rect::Rect,
};

use crate::{counter::CountingLine, tracker::Track};

const LINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const CENTER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Draws the audit overlay for one frame: the counting line across the full
/// width, each confirmed track's box and its center reference point.
pub fn draw_overlay(frame: &mut RgbImage, line: &CountingLine, tracks: &[Track]) {
    let width = frame.width() as f64;

    draw_line_segment_mut(
        frame,
        (0.0, line.y_at(0.0) as f32),
        (width as f32, line.y_at(width) as f32),
        LINE_COLOR,
    );

    for track in tracks {
        let bbox = track.bbox;
        let w = (bbox.x_2 - bbox.x_1).max(1.0) as u32;
        let h = (bbox.y_2 - bbox.y_1).max(1.0) as u32;
        let rect = Rect::at(bbox.x_1 as i32, bbox.y_1 as i32).of_size(w, h);
        draw_hollow_rect_mut(frame, rect, BOX_COLOR);

        let (cx, cy) = bbox.center();
        draw_filled_circle_mut(frame, (cx as i32, cy as i32), 4, CENTER_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;

    #[test]
    fn test_overlay_marks_the_counting_line() {
        let mut frame = RgbImage::new(100, 100);
        let line = CountingLine::horizontal(50.0, 6.0);

        draw_overlay(&mut frame, &line, &[]);

        assert_eq!(*frame.get_pixel(10, 50), LINE_COLOR);
    }

    #[test]
    fn test_overlay_marks_track_center() {
        let mut frame = RgbImage::new(100, 100);
        let line = CountingLine::horizontal(90.0, 6.0);
        let tracks = [Track {
            id: 1,
            bbox: BBox::new(20.0, 20.0, 40.0, 40.0),
        }];

        draw_overlay(&mut frame, &line, &tracks);

        assert_eq!(*frame.get_pixel(30, 30), CENTER_COLOR);
        assert_eq!(*frame.get_pixel(20, 20), BOX_COLOR);
    }

    #[test]
    fn test_overlay_clips_boxes_outside_the_frame() {
        let mut frame = RgbImage::new(50, 50);
        let line = CountingLine::horizontal(25.0, 6.0);
        let tracks = [Track {
            id: 1,
            bbox: BBox::new(-10.0, -10.0, 120.0, 120.0),
        }];

        // must not panic
        draw_overlay(&mut frame, &line, &tracks);
    }
}
