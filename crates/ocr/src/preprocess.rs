use image::RgbImage;
use ndarray::Array4;
use rxscan_core::ChannelOrder;
use std::path::Path;

use crate::recognizer::OcrError;
use crate::types::{InputGeometry, InputTensor};

/// A decoded three-channel 8-bit image of any size.
#[derive(Debug, Clone)]
pub struct RawImage(RgbImage);

impl RawImage {
    pub fn from_rgb(image: RgbImage) -> Result<Self, OcrError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::Decode(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }
        Ok(RawImage(image))
    }

    /// Decode PNG / JPEG / BMP / … bytes. Grey and alpha images are converted to 3 channels.
    pub fn decode(data: &[u8]) -> Result<Self, OcrError> {
        if data.is_empty() {
            return Err(OcrError::Decode("no image data".to_string()));
        }
        let img = image::load_from_memory(data).map_err(|e| OcrError::Decode(e.to_string()))?;
        Self::from_rgb(img.to_rgb8())
    }

    pub fn open(path: &Path) -> Result<Self, OcrError> {
        let img = image::open(path).map_err(|e| OcrError::Decode(e.to_string()))?;
        Self::from_rgb(img.to_rgb8())
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.0
    }
}

/// Stretches images to the model's input size and lays them out as a float tensor.
///
/// Aspect ratio is not preserved and pixel values are not rescaled:
/// the model was trained on stretched `[0, 255]` inputs.
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    geometry: InputGeometry,
    channel_order: ChannelOrder,
}

impl Preprocessor {
    pub fn new(geometry: InputGeometry, channel_order: ChannelOrder) -> Result<Self, OcrError> {
        if geometry.channels != 3 {
            return Err(OcrError::Config(format!(
                "model expects {} input channels, only 3-channel colour input is supported",
                geometry.channels
            )));
        }
        Ok(Self { geometry, channel_order })
    }

    pub fn geometry(&self) -> InputGeometry {
        self.geometry
    }

    /// Resizes with OpenCV's `INTER_LINEAR` rule: each output pixel samples the
    /// source at `(dst + 0.5) * scale - 0.5`, clamped to the edges, and blends
    /// the 2x2 neighbours. Blended values are rounded back to 8 bits.
    pub fn prepare(&self, image: &RawImage) -> InputTensor {
        let src = image.as_rgb();
        let xs = linear_taps(src.width() as usize, self.geometry.width);
        let ys = linear_taps(src.height() as usize, self.geometry.height);

        let order: [usize; 3] = match self.channel_order {
            ChannelOrder::Bgr => [2, 1, 0],
            ChannelOrder::Rgb => [0, 1, 2],
        };

        Array4::from_shape_fn(self.geometry.tensor_shape(), |(_, y, x, c)| {
            let (x0, x1, fx) = xs[x];
            let (y0, y1, fy) = ys[y];
            let ch = order[c];
            let px = |x: usize, y: usize| src.get_pixel(x as u32, y as u32)[ch] as f32;
            let top = px(x0, y0) * (1.0 - fx) + px(x1, y0) * fx;
            let bottom = px(x0, y1) * (1.0 - fx) + px(x1, y1) * fx;
            (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0)
        })
    }
}

/// Source neighbours and weight of the second one, per output coordinate.
fn linear_taps(src_len: usize, dst_len: usize) -> Vec<(usize, usize, f32)> {
    let scale = src_len as f64 / dst_len as f64;
    let last = src_len.saturating_sub(1);
    (0..dst_len)
        .map(|d| {
            let pos = (d as f64 + 0.5) * scale - 0.5;
            let floor = pos.floor();
            if floor < 0.0 {
                (0, 0, 0.0)
            } else if floor as usize >= last {
                (last, last, 0.0)
            } else {
                let i = floor as usize;
                (i, i + 1, (pos - floor) as f32)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::io::Cursor;

    fn solid(width: u32, height: u32, px: [u8; 3]) -> RawImage {
        RawImage::from_rgb(ImageBuffer::from_fn(width, height, |_, _| Rgb(px))).unwrap()
    }

    fn preprocessor(h: usize, w: usize, order: ChannelOrder) -> Preprocessor {
        Preprocessor::new(InputGeometry::new(h, w, 3), order).unwrap()
    }

    #[test]
    fn output_shape_ignores_aspect_ratio() {
        let pre = preprocessor(32, 128, ChannelOrder::Bgr);
        for (w, h) in [(1, 1), (128, 32), (40, 300), (1000, 7), (33, 33)] {
            let tensor = pre.prepare(&solid(w, h, [10, 20, 30]));
            assert_eq!(tensor.shape(), &[1, 32, 128, 3], "input {w}x{h}");
        }
    }

    #[test]
    fn pixel_values_are_not_rescaled() {
        let pre = preprocessor(4, 8, ChannelOrder::Rgb);
        let tensor = pre.prepare(&solid(17, 3, [200, 200, 200]));
        assert!(tensor.iter().all(|&v| v == 200.0));
    }

    #[test]
    fn bgr_order_puts_blue_first() {
        let pre = preprocessor(2, 2, ChannelOrder::Bgr);
        let tensor = pre.prepare(&solid(2, 2, [255, 0, 7]));
        assert_eq!(tensor[[0, 0, 0, 0]], 7.0);
        assert_eq!(tensor[[0, 0, 0, 1]], 0.0);
        assert_eq!(tensor[[0, 1, 1, 2]], 255.0);
    }

    #[test]
    fn rgb_order_is_verbatim() {
        let pre = preprocessor(2, 2, ChannelOrder::Rgb);
        let tensor = pre.prepare(&solid(2, 2, [255, 0, 7]));
        assert_eq!(tensor[[0, 1, 0, 0]], 255.0);
        assert_eq!(tensor[[0, 1, 0, 2]], 7.0);
    }

    #[test]
    fn same_size_image_is_copied_exactly() {
        let img: RgbImage = ImageBuffer::from_fn(3, 2, |x, y| Rgb([(x * 10 + y) as u8, 0, 0]));
        let pre = preprocessor(2, 3, ChannelOrder::Rgb);
        let tensor = pre.prepare(&RawImage::from_rgb(img).unwrap());
        assert_eq!(tensor[[0, 1, 2, 0]], 21.0);
        assert_eq!(tensor[[0, 0, 1, 0]], 10.0);
    }

    fn row(values: &[u8]) -> RawImage {
        let img = ImageBuffer::from_fn(values.len() as u32, 1, |x, _| {
            let v = values[x as usize];
            Rgb([v, v, v])
        });
        RawImage::from_rgb(img).unwrap()
    }

    fn red_row(tensor: &InputTensor) -> Vec<f32> {
        tensor.slice(ndarray::s![0, 0, .., 0]).to_vec()
    }

    #[test]
    fn shrinking_samples_neighbours_instead_of_averaging() {
        // 6 -> 2 samples source x = 1.0 and x = 4.0 exactly.
        let pre = preprocessor(1, 2, ChannelOrder::Rgb);
        let tensor = pre.prepare(&row(&[0, 255, 0, 0, 255, 0]));
        assert_eq!(red_row(&tensor), vec![255.0, 255.0]);
    }

    #[test]
    fn enlarging_blends_and_clamps_at_edges() {
        // 2 -> 4 samples x = -0.25 (clamped), 0.25, 0.75, 1.25 (clamped).
        let pre = preprocessor(1, 4, ChannelOrder::Rgb);
        let tensor = pre.prepare(&row(&[0, 200]));
        assert_eq!(red_row(&tensor), vec![0.0, 50.0, 150.0, 200.0]);
    }

    #[test]
    fn fractional_shrink_blends_two_neighbours() {
        // 5 -> 2: scale 2.5, samples x = 0.75 and x = 3.25.
        let pre = preprocessor(1, 2, ChannelOrder::Rgb);
        let tensor = pre.prepare(&row(&[0, 100, 0, 40, 80]));
        assert_eq!(red_row(&tensor), vec![75.0, 50.0]);
    }

    #[test]
    fn taps_are_clamped_for_single_pixel_sources() {
        assert_eq!(linear_taps(1, 3), vec![(0, 0, 0.0); 3]);
    }

    #[test]
    fn non_colour_model_is_rejected() {
        let err = Preprocessor::new(InputGeometry::new(32, 128, 1), ChannelOrder::Bgr).unwrap_err();
        assert!(matches!(err, OcrError::Config(_)));
    }

    #[test]
    fn empty_bytes_are_a_decode_error() {
        assert!(matches!(RawImage::decode(b""), Err(OcrError::Decode(_))));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        assert!(matches!(
            RawImage::decode(b"definitely not an image"),
            Err(OcrError::Decode(_))
        ));
    }

    #[test]
    fn grey_png_decodes_to_three_channels() {
        let grey = image::GrayImage::from_fn(5, 4, |_, _| image::Luma([90u8]));
        let mut png = Vec::new();
        DynamicImage::ImageLuma8(grey)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let raw = RawImage::decode(&png).unwrap();
        assert_eq!((raw.width(), raw.height()), (5, 4));
        assert_eq!(raw.as_rgb().get_pixel(0, 0).0, [90, 90, 90]);
    }

    #[test]
    fn zero_sized_image_rejected() {
        assert!(matches!(
            RawImage::from_rgb(RgbImage::new(0, 5)),
            Err(OcrError::Decode(_))
        ));
    }
}
