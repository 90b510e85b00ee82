use crate::style::Rgb;

/// Braille Unicode canvas for high-resolution terminal graphics.
/// Each character cell represents a 2x4 pixel grid (8 dots).
/// Unicode Braille patterns: U+2800 to U+28FF
///
/// Every cell also remembers the ink of the last dot written into it, so a
/// single canvas can hold markers of different colors. Later writes win,
/// which gives insertion-order z-ordering.
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    pixels: Vec<u8>,
    inks: Vec<Option<Rgb>>,
    pen: Option<Rgb>,
}

/// One non-empty character cell
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrailleCell {
    pub col: usize,
    pub row: usize,
    pub glyph: char,
    pub ink: Option<Rgb>,
}

impl BrailleCanvas {
    /// Create a new canvas with the given character dimensions.
    /// Effective pixel resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width * height],
            inks: vec![None; width * height],
            pen: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Ink used by subsequent `set_pixel` calls. `None` leaves cell inks untouched.
    pub fn set_pen(&mut self, ink: Option<Rgb>) {
        self.pen = ink;
    }

    /// Set a pixel at the given coordinates.
    /// Braille dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.width || cy >= self.height {
            return;
        }

        let bit = match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => 0,
        };

        let idx = cy * self.width + cx;
        self.pixels[idx] |= bit;
        if self.pen.is_some() {
            self.inks[idx] = self.pen;
        }
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Non-empty cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = BrailleCell> + '_ {
        self.pixels
            .iter()
            .enumerate()
            .filter(|(_, &bits)| bits != 0)
            .map(|(idx, &bits)| BrailleCell {
                col: idx % self.width,
                row: idx / self.width,
                glyph: glyph(bits),
                ink: self.inks[idx],
            })
    }

    /// Convert the canvas to a string of Braille characters
    #[cfg(test)]
    pub fn to_string(&self) -> String {
        if self.width == 0 {
            return String::new();
        }
        self.pixels
            .chunks(self.width)
            .map(|row| row.iter().map(|&b| glyph(b)).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[inline(always)]
fn glyph(bits: u8) -> char {
    char::from_u32(0x2800 + bits as u32).unwrap_or(' ')
}
