//! Shared helpers for integration tests.

use std::io::Cursor;
use std::sync::Once;

use image::{ImageFormat, RgbImage};

static INIT: Once = Once::new();

/// Install a test tracing subscriber once per process. `RUST_LOG` controls
/// verbosity when debugging a failing test.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Bytes of a small but fully valid JPEG, for endpoints serving cover art.
#[allow(dead_code)]
pub fn jpeg_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, image::Rgb([200, 60, 30]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .expect("jpeg encode");
    buf.into_inner()
}
