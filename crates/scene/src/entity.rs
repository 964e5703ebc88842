use foundation::handles::Handle;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Billboard,
    Polyline,
    Primitive,
    Label,
}

/// Identity of a scene primitive. Content is never used for identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId {
    pub kind: PrimitiveKind,
    pub handle: Handle,
}

impl PrimitiveId {
    pub fn new(kind: PrimitiveKind, handle: Handle) -> Self {
        Self { kind, handle }
    }

    pub fn index(&self) -> u32 {
        self.handle.index()
    }
}

impl std::fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}#{}.{}",
            self.kind,
            self.handle.index(),
            self.handle.generation()
        )
    }
}
