//! Anchor generation for the palm detector's Single Shot MultiBox outputs.
//!
//! Only fixed-size anchors are supported, which is all the MediaPipe palm networks use.

use std::ops::Index;

/// An SSD anchor. Coordinates range from 0 to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    x_center: f32,
    y_center: f32,
}

impl Anchor {
    pub fn x_center(&self) -> f32 {
        self.x_center
    }

    pub fn y_center(&self) -> f32 {
        self.y_center
    }
}

#[derive(Debug, Clone)]
pub struct AnchorParams<'a> {
    pub input_width: u32,
    pub input_height: u32,
    /// One entry per output layer. Consecutive layers with the same stride share a feature map.
    pub strides: &'a [u32],
    /// Anchors emitted per cell for every layer.
    pub anchors_per_layer: u32,
    pub anchor_offset: f32,
}

impl AnchorParams<'static> {
    /// Anchor layout of the MediaPipe palm detection networks.
    pub fn palm(input_width: u32, input_height: u32) -> Self {
        Self {
            input_width,
            input_height,
            strides: &[8, 16, 16, 16],
            // one anchor for the aspect ratio 1.0 plus the interpolated scale
            anchors_per_layer: 2,
            anchor_offset: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Anchors {
    anchors: Vec<Anchor>,
}

impl Anchors {
    pub fn calculate(params: &AnchorParams<'_>) -> Self {
        let mut anchors = Vec::new();

        let mut layer = 0;
        while layer < params.strides.len() {
            let stride = params.strides[layer];
            let mut same_stride = 0;
            while layer < params.strides.len() && params.strides[layer] == stride {
                same_stride += 1;
                layer += 1;
            }

            let height = params.input_height.div_ceil(stride);
            let width = params.input_width.div_ceil(stride);
            let per_cell = same_stride * params.anchors_per_layer;

            for y in 0..height {
                for x in 0..width {
                    let x_center = (x as f32 + params.anchor_offset) / width as f32;
                    let y_center = (y as f32 + params.anchor_offset) / height as f32;
                    for _ in 0..per_cell {
                        anchors.push(Anchor { x_center, y_center });
                    }
                }
            }
        }

        Self { anchors }
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }
}

impl Index<usize> for Anchors {
    type Output = Anchor;

    fn index(&self, index: usize) -> &Anchor {
        &self.anchors[index]
    }
}
