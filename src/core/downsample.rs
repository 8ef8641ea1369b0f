/// Frame-rate reduction policy.
///
/// Clips shorter than one second of frames are copied whole. Otherwise
/// sources below 31 fps keep every third frame (`index % 3 == 2`) and
/// sources below 61 fps keep every second frame (`index % 2 == 1`).
/// Sources at 61 fps or above keep nothing.
pub fn should_keep_frame(index: u64, frame_count: u64, fps: f64) -> bool {
    if (frame_count as f64) < fps {
        true
    } else if fps < 31.0 {
        index % 3 == 2
    } else if fps < 61.0 {
        index % 2 == 1
    } else {
        false
    }
}

/// True when the policy drops every frame of a clip with this metadata.
pub fn drops_all_frames(frame_count: u64, fps: f64) -> bool {
    (frame_count as f64) >= fps && fps >= 61.0
}
