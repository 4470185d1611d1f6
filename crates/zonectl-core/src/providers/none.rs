// The `NONE` registrar: for domains whose delegation is managed elsewhere.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Correction, DomainConfig};
use crate::traits::{ProviderSettings, Registrar, RegistrarFactory};

/// Registrar that never proposes a change
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneRegistrar;

#[async_trait]
impl Registrar for NoneRegistrar {
    async fn get_registrar_corrections(&self, _dc: &mut DomainConfig) -> Result<Vec<Correction>> {
        Ok(Vec::new())
    }

    fn registrar_name(&self) -> &'static str {
        "NONE"
    }
}

pub struct NoneRegistrarFactory;

impl RegistrarFactory for NoneRegistrarFactory {
    fn create(&self, _settings: &ProviderSettings) -> Result<Arc<dyn Registrar>> {
        Ok(Arc::new(NoneRegistrar))
    }
}
