//! Progress curves for the two pipeline shapes.
//!
//! Each stage owns a start percentage; the looping stages (compositing,
//! overlays) additionally own a span that is interpolated across the
//! scene loop so polling clients observe steady advancement instead of
//! stage-boundary jumps. When the project has no product asset, the
//! extraction and compositing windows are removed and every later stage
//! shifts up to fill the freed range.

/// A progress window for a stage that loops over scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSpan {
    /// Percentage at stage entry
    pub start: u8,
    /// Percentage points covered by the loop
    pub span: u8,
}

impl ProgressSpan {
    /// Progress after `completed` of `count` items, interpolated linearly
    /// and floored to an integer.
    pub fn at(&self, completed: usize, count: usize) -> u8 {
        if count == 0 {
            return self.start;
        }
        self.start + (completed * self.span as usize / count) as u8
    }
}

/// Stage start percentages for one run. Fixed per pipeline shape.
#[derive(Debug, Clone, Copy)]
pub struct ProgressCurve {
    with_product: bool,
}

impl ProgressCurve {
    pub fn new(with_product: bool) -> Self {
        Self { with_product }
    }

    /// Extraction window; absent when there is no product asset.
    pub fn extraction(&self) -> Option<u8> {
        self.with_product.then_some(10)
    }

    pub fn planning(&self) -> u8 {
        if self.with_product {
            15
        } else {
            10
        }
    }

    pub fn generation(&self) -> u8 {
        if self.with_product {
            25
        } else {
            20
        }
    }

    /// Compositing window; absent when there is no product asset.
    pub fn compositing(&self) -> Option<ProgressSpan> {
        self.with_product.then_some(ProgressSpan { start: 40, span: 15 })
    }

    pub fn overlays(&self) -> ProgressSpan {
        if self.with_product {
            ProgressSpan { start: 60, span: 10 }
        } else {
            ProgressSpan { start: 50, span: 10 }
        }
    }

    pub fn audio(&self) -> u8 {
        if self.with_product {
            75
        } else {
            70
        }
    }

    pub fn rendering(&self) -> u8 {
        if self.with_product {
            85
        } else {
            80
        }
    }
}
