use crate::entity::PrimitiveId;

/// Renderer-owned handle to a decoded image.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),
    #[error("image decode failed: {0}")]
    Decode(String),
}

/// Offscreen RGBA8 raster, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 0]; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn put(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            self.pixels[idx] = rgba;
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// A deferred image acquisition for one billboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub id: RequestId,
    pub billboard: PrimitiveId,
    /// The billboard's `image_generation` when the request was issued.
    pub generation: u32,
    pub src: String,
}

/// FIFO of image requests waiting for the host to pick them up.
///
/// Cancelling only drops requests not yet taken; completions for requests
/// already handed out must still be checked against the billboard.
#[derive(Debug, Default)]
pub struct ImageQueue {
    next_id: u64,
    pending: Vec<ImageRequest>,
}

impl ImageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, billboard: PrimitiveId, generation: u32, src: impl Into<String>) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.push(ImageRequest {
            id,
            billboard,
            generation,
            src: src.into(),
        });
        id
    }

    /// Drops every pending request for `billboard`.
    pub fn cancel_for(&mut self, billboard: PrimitiveId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|r| r.billboard != billboard);
        before - self.pending.len()
    }

    pub fn drain(&mut self) -> Vec<ImageRequest> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[ImageRequest] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
