//! Pixel/time coordinate mapping for the playhead and click-to-seek.

/// Map a playback time to a horizontal pixel position on a surface of the
/// given width. Returns 0 while the duration is still unknown.
pub fn time_to_x(time: f32, duration: f32, width: f32) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    (time / duration) * width
}

/// Inverse of [`time_to_x`]: map a clicked pixel back to a playback time.
pub fn x_to_time(x: f32, duration: f32, width: f32) -> f32 {
    if duration <= 0.0 || width <= 0.0 {
        return 0.0;
    }
    (x / width) * duration
}

/// Playback position as reported by the player. Owned by the presentation
/// layer; the duration is 0 until the player has reported it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackCursor {
    pub current_time: f32,
    pub duration: f32,
}

impl PlaybackCursor {
    /// Pixel position of the playhead marker.
    pub fn playhead_x(&self, width: f32) -> f32 {
        time_to_x(self.current_time.min(self.duration), self.duration, width)
    }

    /// Seek target for a click at pixel `x`, clamped to the surface.
    pub fn seek_for_click(&self, x: f32, width: f32) -> f32 {
        x_to_time(x.clamp(0.0, width.max(0.0)), self.duration, width)
    }
}
