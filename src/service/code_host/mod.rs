pub mod github;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::Res;

// Traits.

/// Generic code-host client trait that clients must implement.
#[async_trait]
pub trait GenericCodeHostClient: Send + Sync + 'static {
    /// Returns the login of the account the client authenticates as.
    async fn viewer_login(&self) -> Res<String>;
}

// Structs.

/// Code-host client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct CodeHostClient {
    inner: Arc<dyn GenericCodeHostClient>,
}

impl Deref for CodeHostClient {
    type Target = dyn GenericCodeHostClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl CodeHostClient {
    pub fn new(inner: Arc<dyn GenericCodeHostClient>) -> Self {
        Self { inner }
    }
}
