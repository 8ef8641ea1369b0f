use image::imageops;

use crate::config::Size;
use crate::decoder::Frame;

/// Pixel rectangle inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Centered crop window, clamped to the frame.
///
/// Half extents are floored, so an odd crop dimension comes out one pixel
/// short: the window spans `[mid - half, mid + half)` on each axis.
pub fn center_crop_region(frame_width: u32, frame_height: u32, target: Size) -> CropRegion {
    let crop_w = target.width.min(frame_width);
    let crop_h = target.height.min(frame_height);
    let (mid_x, mid_y) = (frame_width / 2, frame_height / 2);
    let (cw2, ch2) = (crop_w / 2, crop_h / 2);

    CropRegion {
        x: mid_x - cw2,
        y: mid_y - ch2,
        width: cw2 * 2,
        height: ch2 * 2,
    }
}

pub fn center_crop(frame: &Frame, target: Size) -> Frame {
    let r = center_crop_region(frame.width(), frame.height(), target);
    match frame {
        Frame::Color(img) => Frame::Color(imageops::crop_imm(img, r.x, r.y, r.width, r.height).to_image()),
        Frame::Gray(img) => Frame::Gray(imageops::crop_imm(img, r.x, r.y, r.width, r.height).to_image()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_region_inside_full_hd() {
        let r = center_crop_region(1920, 1080, Size::new(500, 500));
        assert_eq!(r, CropRegion { x: 710, y: 290, width: 500, height: 500 });
    }

    #[test]
    fn test_region_clamps_to_frame() {
        let r = center_crop_region(320, 240, Size::new(500, 500));
        assert_eq!(r, CropRegion { x: 0, y: 0, width: 320, height: 240 });

        let r = center_crop_region(640, 200, Size::new(300, 500));
        assert_eq!(r, CropRegion { x: 170, y: 0, width: 300, height: 200 });
    }

    #[test]
    fn test_odd_target_loses_a_pixel() {
        let r = center_crop_region(500, 500, Size::new(89, 89));
        assert_eq!(r, CropRegion { x: 206, y: 206, width: 88, height: 88 });
    }

    #[test]
    fn test_odd_frame_clamp_stays_in_bounds() {
        let r = center_crop_region(5, 7, Size::new(9, 9));
        assert_eq!(r, CropRegion { x: 0, y: 0, width: 4, height: 6 });
        assert!(r.x + r.width <= 5 && r.y + r.height <= 7);
    }

    #[test]
    fn test_one_pixel_target_is_empty() {
        assert!(center_crop_region(10, 10, Size::new(1, 4)).is_empty());
    }

    #[test]
    fn test_center_crop_content() {
        let img = GrayImage::from_fn(8, 6, |x, y| Luma([(y * 8 + x) as u8]));
        let Frame::Gray(out) = center_crop(&Frame::Gray(img), Size::new(4, 2)) else {
            panic!("expected gray frame")
        };
        assert_eq!(out.dimensions(), (4, 2));
        // window is columns 2..6, rows 2..4
        assert_eq!(out.get_pixel(0, 0).0[0], 2 * 8 + 2);
        assert_eq!(out.get_pixel(3, 1).0[0], 3 * 8 + 5);
    }
}
