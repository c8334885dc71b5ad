use image::{Rgba, RgbaImage};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Blank white sheet
pub fn blank_sheet(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, WHITE)
}

/// Paint a solid square (a filled-in answer box)
pub fn fill_square(img: &mut RgbaImage, x: u32, y: u32, size: u32) {
    for yy in y..y + size {
        for xx in x..x + size {
            img.put_pixel(xx, yy, BLACK);
        }
    }
}

/// Paint a square outline `stroke` pixels wide (an empty answer box)
pub fn outline_square(img: &mut RgbaImage, x: u32, y: u32, size: u32, stroke: u32) {
    for yy in y..y + size {
        for xx in x..x + size {
            let inside = xx >= x + stroke
                && xx < x + size - stroke
                && yy >= y + stroke
                && yy < y + size - stroke;
            if !inside {
                img.put_pixel(xx, yy, BLACK);
            }
        }
    }
}

/// Sheet with one 40x40 filled square at (80, 80)
pub fn sheet_with_filled_square() -> RgbaImage {
    let mut img = blank_sheet(200, 200);
    fill_square(&mut img, 80, 80, 40);
    img
}

/// Sheet with one 40x40 outline square (2px stroke) at (80, 80)
pub fn sheet_with_outline_square() -> RgbaImage {
    let mut img = blank_sheet(200, 200);
    outline_square(&mut img, 80, 80, 40, 2);
    img
}

/// One row of answer boxes: filled at even positions, empty at odd ones.
/// Returns the sheet and the top-left corner of every box, left to right.
pub fn answer_row(boxes: u32, size: u32, gap: u32) -> (RgbaImage, Vec<(u32, u32)>) {
    let margin = 30;
    let width = margin * 2 + boxes * size + (boxes - 1) * gap;
    let mut img = blank_sheet(width, size + margin * 2);
    let mut corners = Vec::new();
    for i in 0..boxes {
        let x = margin + i * (size + gap);
        if i % 2 == 0 {
            fill_square(&mut img, x, margin, size);
        } else {
            outline_square(&mut img, x, margin, size, 2);
        }
        corners.push((x, margin));
    }
    (img, corners)
}

/// Assert a box sits within `tolerance` pixels of the expected square
pub fn assert_box_near(actual: &markscan::BoundingBox, x: u32, y: u32, size: u32, tolerance: u32) {
    let near = |a: u32, b: u32| a.abs_diff(b) <= tolerance;
    assert!(
        near(actual.x, x) && near(actual.y, y) && near(actual.width, size) && near(actual.height, size),
        "box {:?} is not within {}px of ({}, {}) {}x{}",
        actual,
        tolerance,
        x,
        y,
        size,
        size
    );
}
