use image::{GrayImage, Luma};

use crate::decoder::Frame;

// BT.601 luma weights in 14-bit fixed point (0.299, 0.587, 0.114)
const R2Y: u32 = 4899;
const G2Y: u32 = 9617;
const B2Y: u32 = 1868;
const SHIFT: u32 = 14;

#[inline(always)]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * R2Y + g as u32 * G2Y + b as u32 * B2Y + (1 << (SHIFT - 1))) >> SHIFT) as u8
}

/// Convert a color frame to single-channel intensity. Gray frames pass through.
pub fn to_grayscale(frame: &Frame) -> Frame {
    match frame {
        Frame::Color(img) => Frame::Gray(GrayImage::from_fn(img.width(), img.height(), |x, y| {
            let [r, g, b] = img.get_pixel(x, y).0;
            Luma([luma(r, g, b)])
        })),
        Frame::Gray(img) => Frame::Gray(img.clone()),
    }
}
