use foundation::handles::HandleAllocator;
use indexmap::IndexMap;

use crate::entity::PrimitiveId;
use crate::error::SceneError;
use crate::primitives::ScenePrimitive;

/// Ordered per-kind container owned by the renderer.
///
/// Order is insertion order (removal does not reorder the survivors), lookup
/// by id is O(1), and ids are generational so a removed primitive's id never
/// resolves again.
#[derive(Debug)]
pub struct PrimitiveCollection<T> {
    handles: HandleAllocator,
    items: IndexMap<PrimitiveId, T>,
}

impl<T> Default for PrimitiveCollection<T> {
    fn default() -> Self {
        Self {
            handles: HandleAllocator::new(),
            items: IndexMap::new(),
        }
    }
}

impl<T: ScenePrimitive> PrimitiveCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs the primitive in the renderer. Fails without side effects if
    /// the renderer rejects it.
    pub fn append(&mut self, primitive: T) -> Result<PrimitiveId, SceneError> {
        primitive.validate()?;
        let id = PrimitiveId::new(T::KIND, self.handles.allocate());
        self.items.insert(id, primitive);
        Ok(id)
    }

    pub fn remove(&mut self, id: PrimitiveId) -> Option<T> {
        let item = self.items.shift_remove(&id)?;
        self.handles.free(id.handle);
        Some(item)
    }

    pub fn get(&self, index: usize) -> Option<(PrimitiveId, &T)> {
        self.items.get_index(index).map(|(id, item)| (*id, item))
    }

    pub fn get_by_id(&self, id: PrimitiveId) -> Option<&T> {
        self.items.get(&id)
    }

    pub fn get_mut_by_id(&mut self, id: PrimitiveId) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    pub fn contains(&self, id: PrimitiveId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveId, &T)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PrimitiveId, &mut T)> {
        self.items.iter_mut().map(|(id, item)| (*id, item))
    }

    pub fn ids(&self) -> Vec<PrimitiveId> {
        self.items.keys().copied().collect()
    }

    /// Renderer-side destruction (e.g. context loss). The primitive stays in
    /// the collection but can no longer be updated in place.
    pub fn invalidate(&mut self, id: PrimitiveId) -> bool {
        match self.items.get_mut(&id) {
            Some(item) => {
                item.state_mut().destroy();
                tracing::debug!("primitive {id} invalidated by renderer");
                true
            }
            None => false,
        }
    }
}
