/// Axis-aligned 2-D extent in source projection units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Extent2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Extent2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Extent2 { min, max }
    }

    pub fn empty() -> Self {
        Extent2 {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn extend(&mut self, x: f64, y: f64) {
        self.min[0] = self.min[0].min(x);
        self.min[1] = self.min[1].min(y);
        self.max[0] = self.max[0].max(x);
        self.max[1] = self.max[1].max(y);
    }

    pub fn center(&self) -> Option<[f64; 2]> {
        if self.is_empty() {
            return None;
        }
        Some([
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ])
    }
}
