// ── Backend-backed CollectionSource ──

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use trafficdeck_api::{Query, RealtimeHandle, ReconnectConfig, RestClient};

use super::{ChangeFeed, CollectionSource, Entity, Filters};
use crate::config::{BackendConfig, TlsVerification};
use crate::error::CoreError;

/// Serves every entity kind from the REST tables and realtime channel.
pub struct BackendSource {
    rest: RestClient,
    config: BackendConfig,
    reconnect: ReconnectConfig,
}

impl BackendSource {
    pub fn new(config: BackendConfig) -> Result<Self, CoreError> {
        let rest = RestClient::new(config.url.clone(), &config.api_key, &config.transport())?;
        Ok(Self {
            rest,
            config,
            reconnect: ReconnectConfig::default(),
        })
    }

    /// Override realtime reconnection backoff.
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn query<T: Entity>(filters: &Filters) -> Query {
        filters
            .iter()
            .fold(Query::table(T::TABLE), |q, (field, value)| {
                q.eq(T::column(field), value)
            })
    }
}

impl<T: Entity> CollectionSource<T> for BackendSource {
    async fn fetch_all(&self, filters: &Filters) -> Result<Vec<T>, CoreError> {
        let mut query = Self::query::<T>(filters);
        if let Some(column) = T::ORDER_BY {
            query = query.order_desc(column);
        }
        let rows: Vec<T::Record> = self.rest.select(&query).await?;
        debug!(kind = %T::KIND, rows = rows.len(), "fetched");
        rows.into_iter().map(T::from_record).collect()
    }

    async fn count(&self, filters: &Filters) -> Result<u64, CoreError> {
        let count = self.rest.count(&Self::query::<T>(filters)).await?;
        debug!(kind = %T::KIND, count, "counted");
        Ok(count)
    }

    fn subscribe(&self) -> Result<ChangeFeed, CoreError> {
        if !self.config.realtime_enabled {
            return Err(CoreError::Unsupported {
                operation: format!("subscribe to {}", T::TABLE),
                required: "realtime enabled in config".into(),
            });
        }
        // The socket verifies against the bundled web roots only.
        if self.config.url.scheme() == "https"
            && !matches!(self.config.tls, TlsVerification::SystemDefaults)
        {
            return Err(CoreError::Unsupported {
                operation: format!("subscribe to {}", T::TABLE),
                required: "system TLS verification (no insecure or ca_cert) for realtime".into(),
            });
        }
        let cancel = CancellationToken::new();
        let handle = RealtimeHandle::connect(
            &self.config.url,
            &self.config.api_key,
            T::TABLE,
            self.reconnect.clone(),
            cancel.clone(),
        )?;
        info!(table = T::TABLE, "realtime subscription opened");
        Ok(ChangeFeed::new(handle.subscribe(), cancel))
    }
}
