//! Vision source trait

use heapless::String;

/// Maximum stored length of a color name
pub const MAX_COLOR_LEN: usize = 16;

/// Lower-case color label ("red", "yellow", "silver", "unknown", ...)
pub type ColorName = String<MAX_COLOR_LEN>;

/// One frame's detection result at the pickup point
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Detection {
    pub detected: bool,
    pub color: ColorName,
}

impl Detection {
    /// Detection of an item with the given color
    ///
    /// Names longer than [`MAX_COLOR_LEN`] are reported as "unknown".
    pub fn item(color: &str) -> Self {
        let mut name = ColorName::new();
        for c in color.chars() {
            if name.push(c.to_ascii_lowercase()).is_err() {
                name.clear();
                let _ = name.push_str("unknown");
                break;
            }
        }
        Self {
            detected: true,
            color: name,
        }
    }

    /// Empty frame
    pub fn nothing() -> Self {
        Self::default()
    }
}

/// Per-frame "object present" signal
pub trait VisionSource {
    /// Latest detection, or `None` if no frame was available
    fn detect(&mut self) -> Option<Detection>;
}
