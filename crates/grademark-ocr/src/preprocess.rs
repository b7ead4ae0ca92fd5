//! Page binarization and speckle removal.

use grademark_core::config::PreprocessConfig;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::open;

const WHITE: Luma<u8> = Luma([255]);
const BLACK: Luma<u8> = Luma([0]);

/// Turns a decoded page into a black-on-white binary image of the same size.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Grayscale, adaptive threshold, then an opening on the ink.
    pub fn preprocess(&self, page: &DynamicImage) -> GrayImage {
        let gray = page.to_luma8();
        if gray.width() == 0 || gray.height() == 0 {
            return gray;
        }
        let binary = self.binarize(&gray);
        self.remove_speckles(binary)
    }

    /// A pixel is white when brighter than its Gaussian-weighted neighbourhood
    /// mean minus the configured constant.
    fn binarize(&self, gray: &GrayImage) -> GrayImage {
        let local_mean = gaussian_blur_f32(gray, window_sigma(self.config.window_size));
        let constant = self.config.threshold_constant;

        GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let value = f32::from(gray.get_pixel(x, y)[0]);
            let mean = f32::from(local_mean.get_pixel(x, y)[0]);
            if value > mean - constant {
                WHITE
            } else {
                BLACK
            }
        })
    }

    /// Opening with ink as the foreground: isolated dark specks vanish,
    /// strokes wider than the structuring element survive.
    fn remove_speckles(&self, mut binary: GrayImage) -> GrayImage {
        let radius = self.config.opening_radius;
        if radius == 0 {
            return binary;
        }
        image::imageops::invert(&mut binary);
        let mut opened = open(&binary, Norm::L1, radius);
        image::imageops::invert(&mut opened);
        opened
    }
}

/// Gaussian sigma for a nominal window of side `window`.
///
/// imageproc sizes the kernel from sigma alone, so the sampled extent is
/// `2 * ceil(3 * sigma) + 1`, wider than `window` itself.
fn window_sigma(window: u32) -> f32 {
    let window = window.max(3) as f32;
    0.3 * ((window - 1.0) * 0.5 - 1.0) + 0.8
}
