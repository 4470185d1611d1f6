// # Built-in adapters
//
// - `NONE`: registrar that never changes delegation
// - `MEMORY`: in-memory provider and registrar, patched in place
// - `JSONFILE`: provider storing each zone as a JSON file

pub mod file;
pub mod memory;
pub mod none;

pub use file::{JsonFileProvider, JsonFileProviderFactory};
pub use memory::{MemoryProvider, MemoryProviderFactory, MemoryRegistrar, MemoryRegistrarFactory};
pub use none::{NoneRegistrar, NoneRegistrarFactory};

use crate::registry::ProviderRegistry;

/// Register every built-in adapter type
pub fn register_builtin(registry: &ProviderRegistry) {
    registry.register_registrar("NONE", Box::new(NoneRegistrarFactory));
    registry.register_registrar("MEMORY", Box::new(MemoryRegistrarFactory));
    registry.register_provider("MEMORY", Box::new(MemoryProviderFactory));
    registry.register_provider("JSONFILE", Box::new(JsonFileProviderFactory));
}
