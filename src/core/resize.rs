//! Area interpolation.
//!
//! Each destination pixel is the mean of the source pixels it covers,
//! weighted by fractional overlap. Enlarging degenerates to near-nearest
//! sampling.

use rayon::prelude::*;

use crate::config::Size;
use crate::decoder::Frame;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    index: usize,
    weight: f64,
}

/// Per destination index, the source indices it overlaps and their weights.
fn area_taps(src: u32, dst: u32) -> Vec<Vec<Tap>> {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|d| {
            let start = d as f64 * scale;
            let end = (d + 1) as f64 * scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src as usize);
            (first..last)
                .filter_map(|s| {
                    let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                    (overlap > 1e-9).then_some(Tap {
                        index: s,
                        weight: overlap / scale,
                    })
                })
                .collect()
        })
        .collect()
}

/// Rescale a frame to exactly `target` using area interpolation.
pub fn resize_area(frame: &Frame, target: Size) -> Result<Frame> {
    let (src_w, src_h) = (frame.width(), frame.height());
    let channels = frame.channels() as usize;

    if (src_w, src_h) == (target.width, target.height) {
        return Ok(frame.clone());
    }

    let src = frame.as_bytes();
    let x_taps = area_taps(src_w, target.width);
    let y_taps = area_taps(src_h, target.height);
    let src_stride = src_w as usize * channels;
    let dst_stride = target.width as usize * channels;

    let mut out = vec![0u8; dst_stride * target.height as usize];
    out.par_chunks_mut(dst_stride.max(1))
        .zip(y_taps.par_iter())
        .for_each(|(row, ys)| {
            let mut acc = vec![0f64; channels];
            for (dx, xs) in x_taps.iter().enumerate() {
                acc.iter_mut().for_each(|a| *a = 0.0);
                for ty in ys {
                    let src_row = ty.index * src_stride;
                    for tx in xs {
                        let w = ty.weight * tx.weight;
                        let base = src_row + tx.index * channels;
                        for (c, a) in acc.iter_mut().enumerate() {
                            *a += w * src[base + c] as f64;
                        }
                    }
                }
                let px = &mut row[dx * channels..(dx + 1) * channels];
                for (dst, a) in px.iter_mut().zip(&acc) {
                    *dst = a.round().clamp(0.0, 255.0) as u8;
                }
            }
        });

    Frame::from_raw(target.width, target.height, channels as u8, out)
}
