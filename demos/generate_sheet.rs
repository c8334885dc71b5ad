use image::{Rgba, RgbaImage};
use std::env;

const BOX_SIZE: u32 = 30;
const GAP: u32 = 20;
const MARGIN: u32 = 40;
const STROKE: u32 = 2;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let output = args.get(1).map(String::as_str).unwrap_or("sheet.png");

    // 5 questions x 4 options, one filled answer per row
    let (rows, cols) = (5u32, 4u32);
    let width = MARGIN * 2 + cols * BOX_SIZE + (cols - 1) * GAP;
    let height = MARGIN * 2 + rows * BOX_SIZE + (rows - 1) * GAP;
    let mut img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    for row in 0..rows {
        for col in 0..cols {
            let x = MARGIN + col * (BOX_SIZE + GAP);
            let y = MARGIN + row * (BOX_SIZE + GAP);
            let filled = col == (row * 3 + 1) % cols;
            draw_answer_box(&mut img, x, y, filled);
        }
    }

    img.save(output)?;
    println!("Created {} ({}x{}, {} boxes, {} filled)", output, width, height, rows * cols, rows);
    Ok(())
}

fn draw_answer_box(img: &mut RgbaImage, x: u32, y: u32, filled: bool) {
    let ink = Rgba([20, 20, 20, 255]);
    for yy in y..y + BOX_SIZE {
        for xx in x..x + BOX_SIZE {
            let border = xx < x + STROKE || xx >= x + BOX_SIZE - STROKE || yy < y + STROKE || yy >= y + BOX_SIZE - STROKE;
            if filled || border {
                img.put_pixel(xx, yy, ink);
            }
        }
    }
}
