use crate::endpoint::Endpoint;
use crate::fallback::{Degradable, ReadFallback, ReadPolicy};
use crate::shim::{HttpShim, RequestOptions, ShimConfig};
use sb_config::Settings;
use sb_core::{Envelope, Result, Transport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Typed access to the forum backend. The endpoint methods live in
/// [`crate::api`].
pub struct ForumClient {
    pub(crate) shim: HttpShim,
    fallback: ReadFallback,
    list_policy: ReadPolicy,
}

impl ForumClient {
    pub fn new(transport: Arc<dyn Transport>, config: ShimConfig) -> Self {
        Self {
            shim: HttpShim::new(transport, config),
            fallback: ReadFallback::new(),
            list_policy: ReadPolicy::CacheOrEmpty,
        }
    }

    pub fn from_settings(transport: Arc<dyn Transport>, settings: &Settings) -> Self {
        Self::new(transport, ShimConfig::from_settings(settings))
    }

    /// Policy applied to the post list reads.
    pub fn with_list_policy(mut self, policy: ReadPolicy) -> Self {
        self.list_policy = policy;
        self
    }

    pub fn list_policy(&self) -> ReadPolicy {
        self.list_policy
    }

    pub fn shim(&self) -> &HttpShim {
        &self.shim
    }

    pub(crate) async fn get_raw(&self, endpoint: &Endpoint) -> Result<Value> {
        self.shim
            .request(&endpoint.to_string(), RequestOptions::get())
            .await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T> {
        Envelope::decode(self.get_raw(endpoint).await?)?.into_result()
    }

    pub(crate) async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        let value = self
            .shim
            .request(endpoint, RequestOptions::post(body))
            .await?;
        Envelope::decode(value)?.into_result()
    }

    /// A list read under the configured list policy.
    pub(crate) async fn get_list<T, P>(
        &self,
        endpoint: &Endpoint,
        extract: impl FnOnce(P) -> T,
    ) -> Result<Degradable<T>>
    where
        T: Serialize + DeserializeOwned + Default,
        P: DeserializeOwned,
    {
        self.read_through(endpoint, self.list_policy, extract).await
    }

    pub(crate) async fn read_through<T, P>(
        &self,
        endpoint: &Endpoint,
        policy: ReadPolicy,
        extract: impl FnOnce(P) -> T,
    ) -> Result<Degradable<T>>
    where
        T: Serialize + DeserializeOwned + Default,
        P: DeserializeOwned,
    {
        let key = endpoint.to_string();
        self.fallback
            .read(&key, policy, async {
                self.get::<P>(endpoint).await.map(extract)
            })
            .await
    }
}
