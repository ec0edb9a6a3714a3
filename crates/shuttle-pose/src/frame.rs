//! Frame decoding.

use image::RgbImage;
use shuttle_core::{Error, FrameSize, Result};

/// One incoming video frame before decoding
#[derive(Debug, Clone, Copy)]
pub enum FrameInput<'a> {
    /// Encoded still image (PNG, JPEG)
    Encoded(&'a [u8]),
    /// Packed 8-bit RGB pixels, row-major
    Rgb {
        width: u32,
        height: u32,
        data: &'a [u8],
    },
}

impl<'a> FrameInput<'a> {
    pub fn decode(&self) -> Result<RgbImage> {
        match *self {
            FrameInput::Encoded(bytes) => image::load_from_memory(bytes)
                .map(|img| img.to_rgb8())
                .map_err(|e| Error::FrameDecode(e.to_string())),
            FrameInput::Rgb {
                width,
                height,
                data,
            } => {
                let expected = width as usize * height as usize * 3;
                if data.len() != expected {
                    return Err(Error::FrameDecode(format!(
                        "raw RGB buffer is {} bytes, expected {expected} for {width}x{height}",
                        data.len()
                    )));
                }
                RgbImage::from_raw(width, height, data.to_vec()).ok_or_else(|| {
                    Error::FrameDecode("raw RGB buffer does not match dimensions".to_string())
                })
            }
        }
    }
}

pub fn frame_size(image: &RgbImage) -> FrameSize {
    FrameSize::new(image.width(), image.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageOutputFormat;
    use std::io::Cursor;

    #[test]
    fn test_decode_png() {
        let img = RgbImage::new(8, 6);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();

        let decoded = FrameInput::Encoded(&bytes).decode().unwrap();
        assert_eq!(frame_size(&decoded), FrameSize::new(8, 6));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = FrameInput::Encoded(b"not an image").decode();
        assert!(matches!(result, Err(Error::FrameDecode(_))));
    }

    #[test]
    fn test_raw_buffer_size_checked() {
        let data = vec![0u8; 4 * 4 * 3];
        assert!(FrameInput::Rgb { width: 4, height: 4, data: &data }.decode().is_ok());
        assert!(FrameInput::Rgb { width: 5, height: 4, data: &data }.decode().is_err());
    }
}
