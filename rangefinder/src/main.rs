// This file is an example of how to use the `rangefinder` library.
// The main library entry point is `src/lib.rs`.

use rangefinder::{CameraParameters, Frame, process};

fn main() {
    println!("Rangefinder - Example Runner");

    // A black 320x240 frame with a bright 40x40 target in the middle.
    let mut frame = match Frame::filled(320, 240, [0, 0, 0]) {
        Ok(frame) => frame,
        Err(err) => {
            eprintln!("could not build frame: {err}");
            return;
        }
    };
    for y in 100..140 {
        for x in 140..180 {
            frame.put_pixel(x, y, [255, 255, 255]);
        }
    }

    let processed = process(frame, &CameraParameters::default());
    match processed.measurement.detection() {
        Some(detection) => println!(
            "{} (contour area {:.1} px^2)",
            detection.label, detection.contour_area
        ),
        None => println!("No contour found"),
    }
}
