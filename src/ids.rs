use crate::tree::NodeId;
use uuid::Uuid;

/// Source of fresh node identifiers.
///
/// The mutation functions receive the generator instead of reaching for a global one so that
/// they stay deterministic under test.
pub trait IdGenerator {
    fn next_id(&mut self) -> NodeId;
}

impl<G: IdGenerator + ?Sized> IdGenerator for &mut G {
    #[inline]
    fn next_id(&mut self) -> NodeId {
        (**self).next_id()
    }
}

/// Mints random (v4) UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    #[inline]
    fn next_id(&mut self) -> NodeId {
        NodeId::new(Uuid::new_v4().to_string())
    }
}

/// Mints `<prefix>-1`, `<prefix>-2`, ... in order.
#[derive(Clone, Debug)]
pub struct SequentialIds {
    prefix: String,
    counter: usize,
}

impl SequentialIds {
    const DEFAULT_PREFIX: &'static str = "node";

    pub fn new() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            counter: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(format!("{}-{}", self.prefix, self.counter));
        self.counter += 1;
        id
    }
}
