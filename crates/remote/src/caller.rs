use std::sync::Arc;

use async_trait::async_trait;

use crate::outcome::RemoteOutcome;
use crate::request::RemoteRequest;

/// Issues one logical call to a collaborator service.
///
/// Implementations are responsible for their own retry discipline; callers
/// only interpret the returned outcome.
#[async_trait]
pub trait RemoteCaller: Send + Sync {
    async fn call(&self, request: &RemoteRequest) -> RemoteOutcome;
}

#[async_trait]
impl<T: RemoteCaller + ?Sized> RemoteCaller for Arc<T> {
    async fn call(&self, request: &RemoteRequest) -> RemoteOutcome {
        (**self).call(request).await
    }
}
