//! Sync client for the item service
//!
//! [`ItemApi`] is the CRUD contract of the remote service, [`HttpItemApi`]
//! speaks it over HTTP, and [`SyncClient`] applies each confirmed result to
//! the local [`ItemStore`]. The store is never touched before the service
//! has answered successfully.

use crate::{Config, Error, Item, ItemDraft, ItemStore, ItemUpdate, Result};
use crate::store::{CollectionChangeListener, SubscriptionId};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// CRUD operations offered by the item service
#[async_trait]
pub trait ItemApi: Send + Sync {
    /// All items, in service order
    async fn list(&self) -> Result<Vec<Item>>;

    /// Create an item; the returned record carries the assigned id
    async fn create(&self, draft: &ItemDraft) -> Result<Item>;

    /// Replace every mutable field of an item; returns the stored record
    async fn update(&self, id: &str, fields: &ItemUpdate) -> Result<Item>;

    /// Delete an item
    async fn remove(&self, id: &str) -> Result<()>;
}

/// [`ItemApi`] over the service's JSON HTTP endpoints
#[derive(Debug, Clone)]
pub struct HttpItemApi {
    client: Client,
    base_url: Url,
}

impl HttpItemApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, Client::new())
    }

    /// Build from config: base URL plus the optional request timeout
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Self::with_client(&config.api_url, client)
    }

    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid api_url {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Invalid api_url {:?}: not a base URL",
                base_url.as_str()
            )));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `<base>/items` or `<base>/items/<id>`, with the id escaped as one segment
    fn url(&self, id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("items").extend(id);
        }
        url
    }
}

#[async_trait]
impl ItemApi for HttpItemApi {
    async fn list(&self) -> Result<Vec<Item>> {
        let url = self.url(None);
        tracing::debug!(%url, "GET items");
        let response = self.client.get(url).send().await.map_err(Error::Transport)?;
        check(response).await?.json().await.map_err(Error::Decode)
    }

    async fn create(&self, draft: &ItemDraft) -> Result<Item> {
        let url = self.url(None);
        tracing::debug!(%url, name = %draft.name, "POST item");
        let response = self
            .client
            .post(url)
            .json(draft)
            .send()
            .await
            .map_err(Error::Transport)?;
        check(response).await?.json().await.map_err(Error::Decode)
    }

    async fn update(&self, id: &str, fields: &ItemUpdate) -> Result<Item> {
        let url = self.url(Some(id));
        tracing::debug!(%url, "PUT item");
        let response = self
            .client
            .put(url)
            .json(fields)
            .send()
            .await
            .map_err(Error::Transport)?;
        check(response).await?.json().await.map_err(Error::Decode)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let url = self.url(Some(id));
        tracing::debug!(%url, "DELETE item");
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(Error::Transport)?;
        check(response).await?;
        Ok(())
    }
}

/// Turn any non-2xx response into [`Error::Http`]
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    // The service wraps failures as {"error": "..."}
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);

    tracing::warn!(status = status.as_u16(), %message, "item service request failed");
    Err(Error::Http {
        status: status.as_u16(),
        message,
    })
}

/// Issues remote calls and mirrors their confirmed results locally.
///
/// Methods take `&self`, so several calls may be in flight at once. Each
/// one applies its own store transition when it resolves, in resolution
/// order. The store lock is never held across an await.
pub struct SyncClient<A> {
    api: A,
    store: Arc<Mutex<ItemStore>>,
}

impl<A: ItemApi> SyncClient<A> {
    pub fn new(api: A) -> Self {
        Self::from_store(api, Arc::new(Mutex::new(ItemStore::new())))
    }

    /// Share an existing store, e.g. one a view already subscribed to
    pub fn from_store(api: A, store: Arc<Mutex<ItemStore>>) -> Self {
        Self { api, store }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> Arc<Mutex<ItemStore>> {
        Arc::clone(&self.store)
    }

    /// Run `f` against the store under its lock
    pub fn with_store<R>(&self, f: impl FnOnce(&ItemStore) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshot(&self) -> Vec<Item> {
        self.lock().snapshot()
    }

    pub fn subscribe<L>(&self, listener: L) -> SubscriptionId
    where
        L: CollectionChangeListener + 'static,
    {
        self.lock().subscribe(listener)
    }

    /// Reload the whole collection from the service; returns the item count
    pub async fn refresh(&self) -> Result<usize> {
        let items = self.api.list().await?;
        let count = items.len();
        self.lock().load(items);
        tracing::info!(count, "items loaded");
        Ok(count)
    }

    /// Create an item and append the service's record to the store
    pub async fn create(&self, draft: ItemDraft) -> Result<Item> {
        let item = self.api.create(&draft).await?;
        self.lock().insert(item.clone())?;
        Ok(item)
    }

    /// Send a full update and overwrite the stored record with the reply.
    ///
    /// A reply for a different id is rejected and the store is left alone.
    pub async fn update(&self, id: &str, fields: ItemUpdate) -> Result<Item> {
        let item = self.api.update(id, &fields).await?;
        if item.id != id {
            tracing::warn!(requested = id, returned = %item.id, "update returned a different id");
            return Err(Error::IdMismatch {
                requested: id.to_string(),
                returned: item.id,
            });
        }
        self.lock().replace(item.clone())?;
        Ok(item)
    }

    /// Flip the completion flag of a stored item
    pub async fn toggle(&self, id: &str) -> Result<Item> {
        let fields = {
            let store = self.lock();
            let item = store
                .get(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            item.toggled()
        };
        self.update(id, fields).await
    }

    /// Delete remotely, then locally
    pub async fn remove(&self, id: &str) -> Result<()> {
        self.api.remove(id).await?;
        self.lock().remove(id)
    }

    fn lock(&self) -> MutexGuard<'_, ItemStore> {
        // Listener panics poison the lock; the items themselves stay valid.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ChangeEvent;
    use crate::Priority;
    use indexmap::IndexMap;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tokio::sync::Notify;

    /// In-memory service. Mutations take effect when called; replies can be
    /// held back per item name to control resolution order.
    #[derive(Default)]
    struct FakeApi {
        items: Mutex<IndexMap<String, Item>>,
        next_id: AtomicU32,
        fail: AtomicBool,
        gates: Mutex<HashMap<String, Arc<Notify>>>,
        reply_id: Mutex<Option<String>>,
    }

    impl FakeApi {
        fn failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn gate(&self, name: &str) -> Arc<Notify> {
            let notify = Arc::new(Notify::new());
            self.gates
                .lock()
                .unwrap()
                .insert(name.to_string(), notify.clone());
            notify
        }

        fn check(&self) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Http {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(())
        }

        async fn wait(&self, name: &str) {
            let gate = self.gates.lock().unwrap().get(name).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
        }
    }

    #[async_trait]
    impl ItemApi for FakeApi {
        async fn list(&self) -> Result<Vec<Item>> {
            self.check()?;
            Ok(self.items.lock().unwrap().values().cloned().collect())
        }

        async fn create(&self, draft: &ItemDraft) -> Result<Item> {
            self.check()?;
            let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let item = Item::from_draft(format!("a{n}"), draft.clone());
            self.items
                .lock()
                .unwrap()
                .insert(item.id.clone(), item.clone());
            self.wait(&draft.name).await;
            Ok(item)
        }

        async fn update(&self, id: &str, fields: &ItemUpdate) -> Result<Item> {
            self.check()?;
            let item = {
                let mut items = self.items.lock().unwrap();
                let item = items
                    .get_mut(id)
                    .ok_or_else(|| Error::Http {
                        status: 404,
                        message: format!("Item {} not found", id),
                    })?;
                item.apply(fields.clone());
                item.clone()
            };
            self.wait(&fields.name).await;
            match self.reply_id.lock().unwrap().clone() {
                Some(reply_id) => Ok(Item { id: reply_id, ..item }),
                None => Ok(item),
            }
        }

        async fn remove(&self, id: &str) -> Result<()> {
            self.check()?;
            self.items
                .lock()
                .unwrap()
                .shift_remove(id)
                .map(|_| ())
                .ok_or_else(|| Error::Http {
                    status: 404,
                    message: format!("Item {} not found", id),
                })
        }
    }

    fn renamed(item: &Item, name: &str) -> ItemUpdate {
        ItemUpdate {
            name: name.to_string(),
            ..ItemUpdate::from(item)
        }
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let client = SyncClient::new(FakeApi::default());
        client.with_store(|s| assert!(s.is_empty()));
        assert_eq!(client.refresh().await.unwrap(), 0);

        let created = client
            .create(ItemDraft::new("Buy milk").with_priority(Priority::Low))
            .await
            .unwrap();
        assert_eq!(
            created,
            Item {
                id: "a1".to_string(),
                name: "Buy milk".to_string(),
                completed: false,
                priority: Priority::Low,
                category: String::new(),
                due_date: None,
            }
        );
        assert_eq!(client.snapshot(), vec![created.clone()]);

        let done = client
            .update(
                "a1",
                ItemUpdate {
                    completed: true,
                    ..ItemUpdate::from(&created)
                },
            )
            .await
            .unwrap();
        assert_eq!(
            done,
            Item {
                completed: true,
                ..created.clone()
            }
        );
        assert_eq!(client.snapshot(), vec![done]);

        client.remove("a1").await.unwrap();
        assert!(client.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_failed_update_leaves_store_untouched() {
        let client = SyncClient::new(FakeApi::default());
        let item = client.create(ItemDraft::new("a")).await.unwrap();
        client.create(ItemDraft::new("b")).await.unwrap();

        let before = serde_json::to_vec(&client.snapshot()).unwrap();
        let revision = client.with_store(|s| s.revision());

        client.api().failing(true);
        let err = client.update(&item.id, item.toggled()).await.unwrap_err();
        assert!(err.is_remote());
        let err = client.toggle(&item.id).await.unwrap_err();
        assert!(matches!(err, Error::Http { status: 500, .. }));
        client.remove(&item.id).await.unwrap_err();
        client.create(ItemDraft::new("c")).await.unwrap_err();
        client.refresh().await.unwrap_err();

        assert_eq!(serde_json::to_vec(&client.snapshot()).unwrap(), before);
        assert_eq!(client.with_store(|s| s.revision()), revision);
    }

    #[tokio::test]
    async fn test_no_mutation_while_in_flight() {
        let client = SyncClient::new(FakeApi::default());
        client.create(ItemDraft::new("seed")).await.unwrap();
        let gate = client.api().gate("pending");
        let before = client.snapshot();

        let (created, ()) = tokio::join!(client.create(ItemDraft::new("pending")), async {
            tokio::task::yield_now().await;
            assert_eq!(client.snapshot(), before);
            gate.notify_one();
        });

        let created = created.unwrap();
        assert_eq!(client.snapshot().last(), Some(&created));
    }

    #[tokio::test]
    async fn test_toggle_unknown_id_skips_remote_call() {
        let client = SyncClient::new(FakeApi::default());
        client.api().failing(true);
        let err = client.toggle("ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(ref id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_toggle_flips_and_keeps_position() {
        let client = SyncClient::new(FakeApi::default());
        for name in ["x", "y", "z"] {
            client.create(ItemDraft::new(name)).await.unwrap();
        }

        let toggled = client.toggle("a2").await.unwrap();
        assert!(toggled.completed);

        let snapshot = client.snapshot();
        assert_eq!(snapshot[1], toggled);
        assert!(!snapshot[0].completed);
        assert!(!snapshot[2].completed);
    }

    #[tokio::test]
    async fn test_overlapping_updates_apply_in_resolution_order() {
        let client = SyncClient::new(FakeApi::default());
        let item = client.create(ItemDraft::new("orig")).await.unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        client.subscribe(move |event: &ChangeEvent| {
            if let ChangeEvent::Replaced(item) = event {
                sink.lock().unwrap().push(item.name.clone());
            }
        });

        let first_gate = client.api().gate("first");
        let second_gate = client.api().gate("second");

        let (first, second, ()) = tokio::join!(
            client.update(&item.id, renamed(&item, "first")),
            client.update(&item.id, renamed(&item, "second")),
            async {
                second_gate.notify_one();
                tokio::task::yield_now().await;
                first_gate.notify_one();
            }
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(*events.lock().unwrap(), vec!["second", "first"]);
        let name = client.with_store(|s| s.get(&item.id).unwrap().name.clone());
        assert_eq!(name, "first");
        assert_eq!(client.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_update_resolving_after_remove_reports_not_found() {
        let client = SyncClient::new(FakeApi::default());
        let item = client.create(ItemDraft::new("doomed")).await.unwrap();
        let gate = client.api().gate("late");

        let (updated, removed, ()) = tokio::join!(
            client.update(&item.id, renamed(&item, "late")),
            client.remove(&item.id),
            async {
                tokio::task::yield_now().await;
                gate.notify_one();
            }
        );

        removed.unwrap();
        let err = updated.unwrap_err();
        assert!(err.is_consistency());
        assert!(client.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_update_reply_for_other_id_is_rejected() {
        let client = SyncClient::new(FakeApi::default());
        let target = client.create(ItemDraft::new("target")).await.unwrap();
        let other = client.create(ItemDraft::new("other")).await.unwrap();
        let before = client.snapshot();

        *client.api().reply_id.lock().unwrap() = Some(other.id.clone());
        let err = client
            .update(&target.id, renamed(&target, "renamed"))
            .await
            .unwrap_err();

        assert!(err.is_consistency());
        assert!(matches!(
            err,
            Error::IdMismatch { ref requested, ref returned }
                if *requested == target.id && *returned == other.id
        ));
        assert_eq!(client.snapshot(), before);
    }

    #[tokio::test]
    async fn test_refresh_loads_service_order() {
        let api = FakeApi::default();
        for id in ["c", "a", "b"] {
            let item = Item::from_draft(id.to_string(), ItemDraft::new(id));
            api.items.lock().unwrap().insert(id.to_string(), item);
        }

        let client = SyncClient::new(api);
        assert_eq!(client.refresh().await.unwrap(), 3);
        let ids: Vec<_> = client.snapshot().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_http_urls() {
        let api = HttpItemApi::new("http://localhost:3000").unwrap();
        assert_eq!(api.url(None).as_str(), "http://localhost:3000/items");
        assert_eq!(api.url(Some("a1")).as_str(), "http://localhost:3000/items/a1");

        let api = HttpItemApi::new("http://host/api/").unwrap();
        assert_eq!(api.url(None).as_str(), "http://host/api/items");
        assert_eq!(api.url(Some("a/b c")).as_str(), "http://host/api/items/a%2Fb%20c");
    }

    #[test]
    fn test_http_rejects_bad_base_url() {
        assert!(matches!(HttpItemApi::new("not a url"), Err(Error::Config(_))));
        assert!(matches!(HttpItemApi::new("mailto:me@example.com"), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_config_uses_api_url() {
        let config = Config {
            api_url: "http://example.test:9000".to_string(),
            request_timeout_secs: Some(3),
            ..Config::default()
        };
        let api = HttpItemApi::from_config(&config).unwrap();
        assert_eq!(api.base_url().as_str(), "http://example.test:9000/");
    }
}
