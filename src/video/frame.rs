use image::{ImageBuffer, Rgb, RgbImage};

/// Represents a single video frame
///
/// A dense `height x width x 3` raster of 8-bit samples, row-major, top-to-bottom,
/// red-green-blue with no padding. This is exactly the layout the encoder pipe
/// expects on its input, so [`Frame::as_bytes`] can be written without copying.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame with the given dimensions filled with black
    pub fn new_black(width: u32, height: u32) -> Self {
        Self { buffer: ImageBuffer::new(width, height) }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb(color));
        Self { buffer }
    }

    /// Create a frame from raw RGB bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    /// Number of bytes in one frame of the given size
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Raw packed RGB bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Mutable packed RGB bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Paint the square `[cx - half, cx + half] x [cy - half, cy + half]`, clipped to the frame
    pub fn fill_square(&mut self, cx: i64, cy: i64, half: i64, color: [u8; 3]) {
        self.for_each_in_square(cx, cy, half, |px| px.copy_from_slice(&color));
    }

    /// Add `color` to the square with per-channel saturation at 255
    pub fn add_square_saturating(&mut self, cx: i64, cy: i64, half: i64, color: [u8; 3]) {
        self.for_each_in_square(cx, cy, half, |px| {
            for (c, add) in px.iter_mut().zip(color) {
                *c = c.saturating_add(add);
            }
        });
    }

    fn for_each_in_square(&mut self, cx: i64, cy: i64, half: i64, mut f: impl FnMut(&mut [u8])) {
        let width = self.width() as i64;
        let height = self.height() as i64;
        let x0 = (cx - half).max(0);
        let x1 = (cx + half + 1).min(width);
        let y0 = (cy - half).max(0);
        let y1 = (cy + half + 1).min(height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let stride = width as usize * 3;
        let bytes = self.as_bytes_mut();
        for y in y0 as usize..y1 as usize {
            let row = &mut bytes[y * stride..(y + 1) * stride];
            for px in row[x0 as usize * 3..x1 as usize * 3].chunks_exact_mut(3) {
                f(px);
            }
        }
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_packed_rgb_rows() {
        let mut frame = Frame::new_black(4, 2);
        frame.set_pixel(1, 1, [10, 20, 30]);

        let bytes = frame.as_bytes();
        assert_eq!(bytes.len(), Frame::byte_len(4, 2));
        let idx = (4 + 1) * 3;
        assert_eq!(&bytes[idx..idx + 3], &[10, 20, 30]);
    }

    #[test]
    fn test_fill_square_clips_at_edges() {
        let mut frame = Frame::new_black(5, 5);
        frame.fill_square(0, 0, 1, [255, 0, 0]);

        assert_eq!(frame.get_pixel(0, 0), [255, 0, 0]);
        assert_eq!(frame.get_pixel(1, 1), [255, 0, 0]);
        assert_eq!(frame.get_pixel(2, 2), [0, 0, 0]);

        // Entirely outside: no panic, no change
        frame.fill_square(-10, 3, 2, [1, 1, 1]);
        assert_eq!(frame.get_pixel(0, 3), [0, 0, 0]);
    }

    #[test]
    fn test_additive_square_saturates() {
        let mut frame = Frame::new_filled(3, 3, [200, 10, 0]);
        frame.add_square_saturating(1, 1, 0, [100, 100, 5]);

        assert_eq!(frame.get_pixel(1, 1), [255, 110, 5]);
        assert_eq!(frame.get_pixel(0, 0), [200, 10, 0]);
    }

    #[test]
    fn test_from_rgb_bytes_checks_length() {
        assert!(Frame::from_rgb_bytes(2, 2, vec![0; 12]).is_some());
        assert!(Frame::from_rgb_bytes(2, 2, vec![0; 11]).is_none());
    }
}
