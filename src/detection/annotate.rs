//! Overlays for detection results and intermediate stages.

use image::{GrayImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::config::AnnotationOptions;
use crate::models::{BoundingBox, Contour, DetectionResult, RejectedContour};

pub const MARKED_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const UNMARKED_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const REJECTED_COLOR: Rgba<u8> = Rgba([128, 128, 128, 255]);
const CONTOUR_COLOR: Rgba<u8> = Rgba([0, 128, 255, 255]);
const LABEL_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LABEL_FOREGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Draw the detection result over a copy of `image`.
///
/// The returned image always has the input's dimensions; `image` is not modified.
pub fn annotate(
    image: &RgbaImage,
    result: &DetectionResult,
    rejected: &[RejectedContour],
    options: &AnnotationOptions,
) -> RgbaImage {
    let mut canvas = image.clone();

    if options.draw_rejected {
        for r in rejected {
            if let Some(bbox) = &r.bounding_box {
                draw_box(&mut canvas, bbox, 1, REJECTED_COLOR);
            }
        }
    }

    for detection in &result.detections {
        let color = if detection.is_marked { MARKED_COLOR } else { UNMARKED_COLOR };
        draw_box(&mut canvas, &detection.bounding_box, options.line_thickness, color);
    }

    if options.draw_count {
        draw_count_label(&mut canvas, result.total);
    }

    canvas
}

/// Draw a rectangle outline `thickness` pixels wide, growing outwards from `bbox`.
pub fn draw_box(canvas: &mut RgbaImage, bbox: &BoundingBox, thickness: u32, color: Rgba<u8>) {
    for t in 0..thickness.max(1) {
        let rect = Rect::at(bbox.x as i32 - t as i32, bbox.y as i32 - t as i32)
            .of_size(bbox.width + 2 * t, bbox.height + 2 * t);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// Outline every contour over the grayscale image (stage previews)
pub fn draw_contours(gray: &GrayImage, contours: &[Contour]) -> RgbaImage {
    let mut canvas = gray_to_rgba(gray);
    for contour in contours {
        let n = contour.points.len();
        for i in 0..n {
            let a = contour.points[i];
            let b = contour.points[(i + 1) % n];
            draw_line_segment_mut(
                &mut canvas,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                CONTOUR_COLOR,
            );
        }
    }
    canvas
}

/// Outline boxes in one color over the grayscale image (stage previews)
pub fn draw_boxes(gray: &GrayImage, boxes: &[BoundingBox], color: Rgba<u8>) -> RgbaImage {
    let mut canvas = gray_to_rgba(gray);
    for bbox in boxes {
        draw_box(&mut canvas, bbox, 1, color);
    }
    canvas
}

fn gray_to_rgba(gray: &GrayImage) -> RgbaImage {
    RgbaImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgba([v, v, v, 255])
    })
}

// Seven-segment glyphs: bits a b c d e f g (top, top-right, bottom-right,
// bottom, bottom-left, top-left, middle).
const DIGIT_SEGMENTS: [u8; 10] = [
    0b1111110, 0b0110000, 0b1101101, 0b1111001, 0b0110011,
    0b1011011, 0b1011111, 0b1110000, 0b1111111, 0b1111011,
];

const SEGMENT: i32 = 2; // stroke width
const DIGIT_W: i32 = 10;
const DIGIT_H: i32 = 18;
const PADDING: i32 = 4;

/// Draw `count` as seven-segment digits on a dark plate in the top-left corner
fn draw_count_label(canvas: &mut RgbaImage, count: usize) {
    let digits: Vec<usize> = count
        .to_string()
        .bytes()
        .map(|b| usize::from(b - b'0'))
        .collect();

    let plate_w = PADDING * 2 + digits.len() as i32 * (DIGIT_W + PADDING) - PADDING;
    let plate_h = PADDING * 2 + DIGIT_H;
    draw_filled_rect_mut(
        canvas,
        Rect::at(0, 0).of_size(plate_w as u32, plate_h as u32),
        LABEL_BACKGROUND,
    );

    for (i, &digit) in digits.iter().enumerate() {
        let x0 = PADDING + i as i32 * (DIGIT_W + PADDING);
        draw_digit(canvas, x0, PADDING, DIGIT_SEGMENTS[digit]);
    }
}

fn draw_digit(canvas: &mut RgbaImage, x0: i32, y0: i32, segments: u8) {
    let half = DIGIT_H / 2;
    // (x, y, width, height) of each segment relative to the digit origin
    let rects = [
        (0, 0, DIGIT_W, SEGMENT),                       // a
        (DIGIT_W - SEGMENT, 0, SEGMENT, half + 1),      // b
        (DIGIT_W - SEGMENT, half, SEGMENT, half),       // c
        (0, DIGIT_H - SEGMENT, DIGIT_W, SEGMENT),       // d
        (0, half, SEGMENT, half),                       // e
        (0, 0, SEGMENT, half + 1),                      // f
        (0, half - SEGMENT / 2, DIGIT_W, SEGMENT),      // g
    ];

    for (bit, (x, y, w, h)) in rects.into_iter().enumerate() {
        if segments & (1 << (6 - bit)) != 0 {
            draw_filled_rect_mut(
                canvas,
                Rect::at(x0 + x, y0 + y).of_size(w as u32, h as u32),
                LABEL_FOREGROUND,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Detection;

    fn result_with(bbox: BoundingBox, is_marked: bool) -> DetectionResult {
        DetectionResult::new(vec![Detection {
            bounding_box: bbox,
            is_marked,
            mean_intensity: 0.0,
        }])
    }

    #[test]
    fn output_matches_input_dimensions() {
        let img = RgbaImage::from_pixel(64, 48, Rgba([255, 255, 255, 255]));
        let out = annotate(&img, &result_with(BoundingBox::new(50, 40, 30, 30), true), &[], &AnnotationOptions::default());
        assert_eq!(out.dimensions(), img.dimensions());
    }

    #[test]
    fn input_is_untouched() {
        let img = RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255]));
        let before = img.clone();
        let _ = annotate(&img, &result_with(BoundingBox::new(20, 20, 20, 20), false), &[], &AnnotationOptions::default());
        assert_eq!(img, before);
    }

    #[test]
    fn colors_follow_classification() {
        let img = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let options = AnnotationOptions {
            draw_count: false,
            ..AnnotationOptions::default()
        };
        let bbox = BoundingBox::new(40, 40, 20, 20);

        let marked = annotate(&img, &result_with(bbox, true), &[], &options);
        assert_eq!(*marked.get_pixel(40, 40), MARKED_COLOR);
        // second ring of a 2px outline
        assert_eq!(*marked.get_pixel(39, 39), MARKED_COLOR);

        let unmarked = annotate(&img, &result_with(bbox, false), &[], &options);
        assert_eq!(*unmarked.get_pixel(59, 59), UNMARKED_COLOR);
        // interior stays untouched
        assert_eq!(*unmarked.get_pixel(50, 50), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn count_label_is_drawn_in_the_corner() {
        let img = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let out = annotate(&img, &DetectionResult::default(), &[], &AnnotationOptions::default());
        assert_eq!(*out.get_pixel(1, 1), LABEL_BACKGROUND);
        // top segment of the "0" digit
        assert_eq!(*out.get_pixel(PADDING as u32 + 3, PADDING as u32), LABEL_FOREGROUND);
    }

    #[test]
    fn rejected_boxes_are_optional() {
        let img = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let rejected = vec![RejectedContour {
            contour_index: 0,
            bounding_box: Some(BoundingBox::new(60, 60, 5, 30)),
            reason: crate::models::RejectReason::TooSmall,
        }];
        let hidden = AnnotationOptions {
            draw_count: false,
            ..AnnotationOptions::default()
        };
        let out = annotate(&img, &DetectionResult::default(), &rejected, &hidden);
        assert_eq!(*out.get_pixel(60, 60), Rgba([255, 255, 255, 255]));

        let shown = AnnotationOptions {
            draw_rejected: true,
            ..hidden
        };
        let out = annotate(&img, &DetectionResult::default(), &rejected, &shown);
        assert_eq!(*out.get_pixel(60, 60), REJECTED_COLOR);
    }
}
