use super::Point;

/// Quadrilateral bounds of a detected code, in surface pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    /// Top-left corner
    pub top_left: Point,
    /// Top-right corner
    pub top_right: Point,
    /// Bottom-right corner
    pub bottom_right: Point,
    /// Bottom-left corner
    pub bottom_left: Point,
}

impl Location {
    /// Build a location from corners ordered TL, TR, BR, BL
    pub fn from_corners(corners: [Point; 4]) -> Self {
        let [top_left, top_right, bottom_right, bottom_left] = corners;
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// Corners in TL, TR, BR, BL order
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Outline segments TL→TR, TR→BR, BR→BL, BL→TL.
    ///
    /// The order is fixed; corners reported in an unusual orientation are
    /// drawn as given, never re-sorted.
    pub fn segments(&self) -> [(Point, Point); 4] {
        [
            (self.top_left, self.top_right),
            (self.top_right, self.bottom_right),
            (self.bottom_right, self.bottom_left),
            (self.bottom_left, self.top_left),
        ]
    }
}

/// A successful decode of one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodeResult {
    /// Decoded text payload (may be empty)
    pub data: String,
    /// Raw payload bytes as read from the symbol
    pub binary_data: Vec<u8>,
    /// QR version (1-40) when the decoder reports it
    pub version: Option<u8>,
    /// Where the code sits on the surface
    pub location: Location,
}

impl DecodeResult {
    /// Create a result carrying only text and location
    pub fn new(data: impl Into<String>, location: Location) -> Self {
        let data = data.into();
        Self {
            binary_data: data.as_bytes().to_vec(),
            data,
            version: None,
            location,
        }
    }
}
