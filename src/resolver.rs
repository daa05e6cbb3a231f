//! Raw record resolution

use crate::address::{dispatch, ClientAddress};
use crate::engine::{LookupEngine, RawRecord};
use crate::error::{FieldError, Result};

/// Fetches the raw record for an address from an engine
///
/// Stateless: every call goes back to the engine.
pub struct RecordResolver<'e, E: ?Sized> {
    engine: &'e E,
}

impl<'e, E> RecordResolver<'e, E>
where
    E: LookupEngine + ?Sized,
{
    /// Create a resolver over a shared engine
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    /// Dispatch `address`, look it up and resolve the node to its record
    pub fn resolve(&self, address: &ClientAddress) -> Result<RawRecord<'e>> {
        let engine = self.engine;
        let bits = dispatch(address, engine)?;
        let node = engine
            .lookup(bits.bytes(), bits.bit_len())
            .map_err(FieldError::engine)?;
        let record = engine.resolve_node(node).map_err(FieldError::engine)?;

        tracing::trace!(%node, len = record.len(), "resolved record");
        Ok(record)
    }
}
