//! Scoped client owning the HTTP session, and the lazy gift detail bridge.

use crate::config::Config;
use crate::error::{FragmentError, Result};
use crate::fragment::models::{detail_path, Gift, GiftInfo};
use crate::fragment::paginator::Paginator;
use crate::fragment::parser::Parser;
use crate::fragment::query::{Query, RequestSpec};
use crate::fragment::session::{GiftSource, HttpSession};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, info};

pub(crate) struct ClientInner {
    config: Config,
    /// Preset source installed on open instead of a fresh HTTP session
    preset: Option<Arc<dyn GiftSource>>,
    session: RwLock<Option<Arc<dyn GiftSource>>>,
    scopes: Mutex<Scopes>,
}

/// Scopes currently running on this client and its clones.
#[derive(Default)]
struct Scopes {
    active: usize,
    /// Whether the outermost scope opened the session (and so must close it)
    opened: bool,
}

impl ClientInner {
    fn open(&self) -> Result<()> {
        let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Ok(());
        }

        let source: Arc<dyn GiftSource> = match &self.preset {
            Some(source) => Arc::clone(source),
            None => Arc::new(HttpSession::new(&self.config)?),
        };
        debug!("Session opened for {}", source.base_url());
        *slot = Some(source);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.session.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    fn release(&self) {
        let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            debug!("Session closed");
        }
    }

    fn enter_scope(&self) -> Result<()> {
        let mut scopes = self.scopes.lock().unwrap_or_else(PoisonError::into_inner);
        let opened = !self.is_open();
        self.open()?;

        if scopes.active == 0 {
            scopes.opened = opened;
        }
        scopes.active += 1;
        Ok(())
    }

    fn exit_scope(&self) {
        let mut scopes = self.scopes.lock().unwrap_or_else(PoisonError::into_inner);
        scopes.active = scopes.active.saturating_sub(1);

        if scopes.active == 0 && std::mem::take(&mut scopes.opened) {
            self.release();
        }
    }
}

/// Client for the Fragment gift marketplace.
///
/// The client must be opened before use. Clones share one session, and
/// gifts returned by it keep only a weak handle, so closing (or dropping
/// every clone) makes later calls fail with [`FragmentError::SessionClosed`].
#[derive(Clone)]
pub struct FragmentClient {
    inner: Arc<ClientInner>,
}

impl FragmentClient {
    /// Creates a closed client that will use an HTTP session once opened.
    pub fn new(config: Config) -> Self {
        Self::build(config, None)
    }

    /// Creates a closed client that will use `source` once opened (for testing).
    pub fn with_source(config: Config, source: Arc<dyn GiftSource>) -> Self {
        Self::build(config, Some(source))
    }

    fn build(config: Config, preset: Option<Arc<dyn GiftSource>>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                preset,
                session: RwLock::new(None),
                scopes: Mutex::new(Scopes::default()),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Establishes the session. Does nothing if already open.
    pub fn open(&self) -> Result<()> {
        self.inner.open()
    }

    /// Releases the session. Does nothing if already closed.
    ///
    /// Fetches already in flight keep their own handle and finish normally.
    pub fn close(&self) {
        self.inner.release();
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    /// Opens the client, runs `f`, and closes it again on every exit path,
    /// including errors, panics and cancellation of the returned future.
    ///
    /// Scopes may overlap across clones; the session is closed when the last
    /// one exits, and only if a scope opened it. A client opened explicitly
    /// beforehand stays open.
    pub async fn scoped<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(FragmentClient) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.inner.enter_scope()?;
        let _guard = ScopeGuard(&self.inner);
        f(self.clone()).await
    }

    fn session(&self) -> Result<Arc<dyn GiftSource>> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(FragmentError::SessionClosed)
    }

    /// Lists gifts of a collection. `filter` is one of all, auction, sold,
    /// sale; `sort` one of price_asc, price_desc, listed, ending, or None for
    /// the site's default order.
    pub async fn get_gifts(
        &self,
        type_gift: &str,
        filter: &str,
        sort: Option<&str>,
    ) -> Result<Vec<Gift>> {
        let query = Query::parse(type_gift, filter, sort)?;
        self.collect_gifts(&query, None).await
    }

    /// Lists gifts for a validated query, stopping after `limit` gifts.
    pub async fn collect_gifts(&self, query: &Query, limit: Option<usize>) -> Result<Vec<Gift>> {
        let session = self.session()?;

        info!(
            "Listing gifts: {} (filter {}, sort {})",
            if query.type_gift.is_empty() { "all collections" } else { query.type_gift.as_str() },
            query.filter,
            query.sort.map_or("default", |s| s.as_str())
        );

        let paginator =
            Paginator::new(Parser::new(session.base_url()), self.inner.config.max_pages);

        match paginator.collect(session.as_ref(), query, limit).await {
            Ok(mut gifts) => {
                self.bind(&mut gifts);
                info!("Found {} gifts", gifts.len());
                Ok(gifts)
            }
            Err(FragmentError::Partial { page, mut partial, source }) => {
                self.bind(&mut partial);
                Err(FragmentError::Partial { page, partial, source })
            }
            Err(e) => Err(e),
        }
    }

    /// Fetches and parses the detail page of one gift.
    pub async fn gift_info(&self, slug: &str, id: u64) -> Result<GiftInfo> {
        let session = self.session()?;

        info!("Fetching gift: {}-{}", slug, id);
        let html = session.fetch(&RequestSpec::new(detail_path(slug, id))).await?;
        Parser::new(session.base_url()).parse_detail(&html, slug, id)
    }

    /// Fetches details for many gifts concurrently. Results keep input order;
    /// the session's concurrency cap bounds requests in flight.
    pub async fn get_infos(&self, gifts: &[Gift]) -> Vec<Result<GiftInfo>> {
        let mut tasks = JoinSet::new();
        for (idx, gift) in gifts.iter().enumerate() {
            let client = self.clone();
            let (slug, id) = (gift.slug.clone(), gift.id);
            tasks.spawn(async move { (idx, client.gift_info(&slug, id).await) });
        }

        let mut results: Vec<Option<Result<GiftInfo>>> = gifts.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => results[idx] = Some(result),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => debug!("Detail task did not complete: {}", e),
            }
        }

        results
            .into_iter()
            .zip(gifts)
            .map(|(result, gift)| result.unwrap_or_else(|| Err(unfinished(gift))))
            .collect()
    }

    fn bind(&self, gifts: &mut [Gift]) {
        let handle = Arc::downgrade(&self.inner);
        for gift in gifts {
            gift.client = handle.clone();
        }
    }
}

/// Error for a detail fetch whose task was cancelled before finishing.
fn unfinished(gift: &Gift) -> FragmentError {
    FragmentError::Fetch {
        url: gift.url.clone(),
        status: None,
        message: "detail fetch was cancelled before it finished".to_string(),
    }
}

impl Gift {
    /// Fetches this gift's detail page. Every call performs a fresh request.
    pub async fn get_info(&self) -> Result<GiftInfo> {
        let inner = self.client.upgrade().ok_or(FragmentError::SessionClosed)?;
        FragmentClient { inner }.gift_info(&self.slug, self.id).await
    }
}

struct ScopeGuard<'a>(&'a ClientInner);

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.0.exit_scope();
    }
}
