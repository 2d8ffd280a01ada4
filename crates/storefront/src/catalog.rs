//! Catalog query state machine: pagination plus faceted filtering.
//!
//! The controller owns the current page, category and facet selection,
//! and orchestrates fetch + incremental render. It never touches markup
//! itself; successful fetches are handed to a [`CatalogView`]
//! implementation supplied by the UI-binding layer.
//!
//! # Concurrency
//!
//! Everything runs on one logical thread; network fetches are the only
//! suspension points. Interior mutability (`RefCell`) lets a second call
//! start while an earlier fetch is still in flight, which is exactly the
//! race the query generation guards against: every fetch captures the
//! generation it was issued under and a completion whose generation no
//! longer matches is discarded without touching state or the view.

use std::cell::RefCell;

use bravex_core::Page;
use tracing::debug;

use crate::api::{ApiClient, ApiError, Category, FacetSelection, Product, ProductQuery};

/// Phases of the catalog state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing loaded yet.
    Idle,
    /// Full-list load in flight.
    Loading,
    /// A list is on screen.
    Loaded,
    /// Append batch in flight.
    LoadingMore,
    /// Full-list load failed; manual retry required.
    Error,
}

/// Paged product fetches, abstracted for testability.
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    /// Fetch one page of products.
    async fn fetch_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError>;

    /// Resolve a category by slug (for the header title).
    async fn fetch_category(&self, slug: &str) -> Result<Category, ApiError>;
}

impl CatalogSource for ApiClient {
    async fn fetch_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        self.get_products(query).await
    }

    async fn fetch_category(&self, slug: &str) -> Result<Category, ApiError> {
        self.get_category_by_slug(slug).await
    }
}

/// Render collaborator the controller pushes results into.
pub trait CatalogView {
    /// Render a batch of products, replacing or appending.
    fn show_products(&mut self, products: &[Product], append: bool);

    /// Render the "no products found" state.
    fn show_empty(&mut self);

    /// Render the full-list error state with its manual retry.
    fn show_error(&mut self);
}

struct QueryState {
    page: u32,
    page_size: u32,
    category: Option<String>,
    category_title: Option<String>,
    facets: FacetSelection,
    phase: Phase,
    has_more: bool,
    generation: u64,
}

impl QueryState {
    fn query_for(&self, page: u32) -> ProductQuery {
        ProductQuery {
            page,
            page_size: self.page_size,
            category: self.category.clone(),
            facets: self.facets.clone(),
        }
    }
}

/// Controller for the catalog page list.
pub struct CatalogController<S, V> {
    source: S,
    view: RefCell<V>,
    state: RefCell<QueryState>,
}

impl<S: CatalogSource, V: CatalogView> CatalogController<S, V> {
    /// Create an idle controller. Nothing is fetched until [`Self::init`].
    pub fn new(source: S, view: V, page_size: u32) -> Self {
        Self {
            source,
            view: RefCell::new(view),
            state: RefCell::new(QueryState {
                page: 1,
                page_size,
                category: None,
                category_title: None,
                facets: FacetSelection::new(),
                phase: Phase::Idle,
                has_more: true,
                generation: 0,
            }),
        }
    }

    /// Current machine phase.
    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    /// Whether another page is believed to exist.
    pub fn has_more(&self) -> bool {
        self.state.borrow().has_more
    }

    /// Last successfully loaded page number.
    pub fn page(&self) -> u32 {
        self.state.borrow().page
    }

    /// Resolved title of the active category, when one is selected.
    pub fn category_title(&self) -> Option<String> {
        self.state.borrow().category_title.clone()
    }

    /// Enter the catalog, optionally scoped to a category, and load
    /// page 1.
    ///
    /// The category title is resolved for the header; a failed lookup is
    /// tolerated (the list still loads).
    pub async fn init(&self, category: Option<&str>) {
        {
            // Supersede any in-flight fetch before the title await below,
            // so its completion cannot render under the new query.
            let mut st = self.state.borrow_mut();
            st.generation += 1;
            st.page = 1;
            st.has_more = true;
            st.phase = Phase::Loading;
            st.category = category.map(ToString::to_string);
            st.category_title = None;
            st.facets = FacetSelection::new();
        }

        if let Some(slug) = category {
            match self.source.fetch_category(slug).await {
                Ok(cat) => self.state.borrow_mut().category_title = Some(cat.title),
                Err(e) => tracing::warn!(error = %e, slug, "failed to resolve category title"),
            }
        }

        self.load_fresh().await;
    }

    /// Apply a new facet selection: reset to page 1 and reload.
    ///
    /// The selection is collected from the UI immediately before this
    /// call; any in-flight fetch for the previous selection is
    /// superseded and its result will be discarded.
    pub async fn apply_facets(&self, selection: FacetSelection) {
        self.state.borrow_mut().facets = selection;
        self.load_fresh().await;
    }

    /// Clear all facets and reload from page 1.
    pub async fn reset_facets(&self) {
        self.state.borrow_mut().facets = FacetSelection::new();
        self.load_fresh().await;
    }

    /// Scroll-triggered request for the next page.
    ///
    /// Idempotent: overlapping triggers while a fetch is in flight, or
    /// when no further page exists, are no-ops. The page number only
    /// advances on success, so a failed batch is retried at the same
    /// page by the next trigger.
    pub async fn load_more(&self) {
        let (query, generation) = {
            let mut st = self.state.borrow_mut();
            if st.phase != Phase::Loaded || !st.has_more {
                return;
            }
            st.phase = Phase::LoadingMore;
            (st.query_for(st.page + 1), st.generation)
        };

        let result = self.source.fetch_products(&query).await;
        self.finish(result, generation, query.page, true);
    }

    /// Full reload from page 1 under the current filters, superseding
    /// any fetch already in flight.
    async fn load_fresh(&self) {
        let (query, generation) = {
            let mut st = self.state.borrow_mut();
            st.generation += 1;
            st.page = 1;
            st.has_more = true;
            st.phase = Phase::Loading;
            (st.query_for(1), st.generation)
        };

        let result = self.source.fetch_products(&query).await;
        self.finish(result, generation, query.page, false);
    }

    /// Apply a completed fetch, unless the query has moved on since it
    /// was issued.
    fn finish(
        &self,
        result: Result<Page<Product>, ApiError>,
        generation: u64,
        fetched_page: u32,
        append: bool,
    ) {
        let mut st = self.state.borrow_mut();
        if st.generation != generation {
            debug!(generation, current = st.generation, "discarding stale product response");
            return;
        }

        match result {
            Ok(batch) => {
                st.has_more = batch.has_more(fetched_page, st.page_size);
                st.page = fetched_page;
                st.phase = Phase::Loaded;
                drop(st);

                let mut view = self.view.borrow_mut();
                if batch.data.is_empty() {
                    if !append {
                        view.show_empty();
                    }
                } else {
                    view.show_products(&batch.data, append);
                }
            }
            Err(e) if append => {
                // Only the appended batch failed; the rendered list stands.
                tracing::warn!(error = %e, page = fetched_page, "failed to load more products");
                st.phase = Phase::Loaded;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load products");
                st.phase = Phase::Error;
                drop(st);
                self.view.borrow_mut().show_error();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    use bravex_core::{FacetId, Pagination, ProductId};
    use rust_decimal::Decimal;
    use tokio::sync::Notify;

    fn product(id: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Decimal::from(10),
            slug: None,
            description: None,
            preview_image: None,
            gallery_images: Vec::new(),
            sizes: Vec::new(),
        }
    }

    fn full_page(prefix: &str, count: usize, pagination: Option<Pagination>) -> Page<Product> {
        Page {
            data: (0..count).map(|i| product(&format!("{prefix}{i}"))).collect(),
            pagination,
        }
    }

    #[derive(Debug, PartialEq)]
    enum ViewEvent {
        Products(Vec<String>, bool),
        Empty,
        Error,
    }

    #[derive(Clone, Default)]
    struct RecordingView {
        events: Rc<RefCell<Vec<ViewEvent>>>,
    }

    impl CatalogView for RecordingView {
        fn show_products(&mut self, products: &[Product], append: bool) {
            self.events.borrow_mut().push(ViewEvent::Products(
                products.iter().map(|p| p.id.to_string()).collect(),
                append,
            ));
        }

        fn show_empty(&mut self) {
            self.events.borrow_mut().push(ViewEvent::Empty);
        }

        fn show_error(&mut self) {
            self.events.borrow_mut().push(ViewEvent::Error);
        }
    }

    /// Source that serves scripted pages and counts fetches.
    struct ScriptedSource {
        pages: RefCell<Vec<Result<Page<Product>, ApiError>>>,
        fetches: Cell<u32>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<Page<Product>, ApiError>>) -> Self {
            Self {
                pages: RefCell::new(pages),
                fetches: Cell::new(0),
            }
        }
    }

    impl CatalogSource for ScriptedSource {
        async fn fetch_products(&self, _query: &ProductQuery) -> Result<Page<Product>, ApiError> {
            self.fetches.set(self.fetches.get() + 1);
            self.pages.borrow_mut().remove(0)
        }

        async fn fetch_category(&self, slug: &str) -> Result<Category, ApiError> {
            Ok(Category {
                id: bravex_core::CategoryId::new(slug),
                title: format!("Category {slug}"),
                slug: slug.to_string(),
                image: None,
            })
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn meta(page: u32, page_count: u32) -> Pagination {
        Pagination {
            page,
            page_size: 8,
            page_count,
            total: u64::from(page_count) * 8,
        }
    }

    #[tokio::test]
    async fn test_init_loads_first_page_and_resolves_title() {
        let source = ScriptedSource::new(vec![Ok(full_page("p", 8, Some(meta(1, 2))))]);
        let view = RecordingView::default();
        let events = Rc::clone(&view.events);

        let ctrl = CatalogController::new(source, view, 8);
        ctrl.init(Some("shoes")).await;

        assert_eq!(ctrl.phase(), Phase::Loaded);
        assert!(ctrl.has_more());
        assert_eq!(ctrl.category_title().as_deref(), Some("Category shoes"));
        assert!(matches!(
            events.borrow().first(),
            Some(ViewEvent::Products(ids, false)) if ids.len() == 8
        ));
    }

    #[tokio::test]
    async fn test_server_page_count_clears_has_more() {
        // Full batch of 8 but the server says there is exactly 1 page.
        let source = ScriptedSource::new(vec![Ok(full_page("p", 8, Some(meta(1, 1))))]);
        let view = RecordingView::default();

        let ctrl = CatalogController::new(source, view, 8);
        ctrl.init(None).await;

        assert!(!ctrl.has_more());
        assert_eq!(ctrl.source.fetches.get(), 1);

        // A load-more trigger in this state performs no fetch.
        ctrl.load_more().await;
        assert_eq!(ctrl.source.fetches.get(), 1);
    }

    #[tokio::test]
    async fn test_short_batch_heuristic_without_metadata() {
        let source = ScriptedSource::new(vec![Ok(full_page("p", 5, None))]);
        let view = RecordingView::default();

        let ctrl = CatalogController::new(source, view, 8);
        ctrl.init(None).await;

        assert!(!ctrl.has_more());
    }

    #[tokio::test]
    async fn test_load_more_appends_and_advances_page() {
        let source = ScriptedSource::new(vec![
            Ok(full_page("a", 8, Some(meta(1, 2)))),
            Ok(full_page("b", 4, Some(meta(2, 2)))),
        ]);
        let view = RecordingView::default();
        let events = Rc::clone(&view.events);

        let ctrl = CatalogController::new(source, view, 8);
        ctrl.init(None).await;
        ctrl.load_more().await;

        assert_eq!(ctrl.page(), 2);
        assert!(!ctrl.has_more());
        let events = events.borrow();
        assert!(matches!(&events[0], ViewEvent::Products(_, false)));
        assert!(matches!(&events[1], ViewEvent::Products(ids, true) if ids.len() == 4));
    }

    #[tokio::test]
    async fn test_load_more_failure_is_non_fatal_and_retries_same_page() {
        init_tracing();
        let source = ScriptedSource::new(vec![
            Ok(full_page("a", 8, Some(meta(1, 3)))),
            Err(ApiError::Gateway("boom".to_string())),
            Ok(full_page("b", 8, Some(meta(2, 3)))),
        ]);
        let view = RecordingView::default();
        let events = Rc::clone(&view.events);

        let ctrl = CatalogController::new(source, view, 8);
        ctrl.init(None).await;

        ctrl.load_more().await;
        // Failed batch: still Loaded, page not advanced, no error render.
        assert_eq!(ctrl.phase(), Phase::Loaded);
        assert_eq!(ctrl.page(), 1);
        assert_eq!(events.borrow().len(), 1);

        // Next trigger retries page 2 and succeeds.
        ctrl.load_more().await;
        assert_eq!(ctrl.page(), 2);
    }

    #[tokio::test]
    async fn test_fresh_load_failure_renders_error_state() {
        init_tracing();
        let source = ScriptedSource::new(vec![Err(ApiError::Gateway("down".to_string()))]);
        let view = RecordingView::default();
        let events = Rc::clone(&view.events);

        let ctrl = CatalogController::new(source, view, 8);
        ctrl.init(None).await;

        assert_eq!(ctrl.phase(), Phase::Error);
        assert_eq!(*events.borrow(), vec![ViewEvent::Error]);

        // No load-more from the error state.
        ctrl.load_more().await;
        assert_eq!(ctrl.source.fetches.get(), 1);
    }

    #[tokio::test]
    async fn test_empty_first_page_renders_empty_state() {
        let source = ScriptedSource::new(vec![Ok(full_page("a", 0, Some(meta(1, 0))))]);
        let view = RecordingView::default();
        let events = Rc::clone(&view.events);

        let ctrl = CatalogController::new(source, view, 8);
        ctrl.init(None).await;

        assert_eq!(ctrl.phase(), Phase::Loaded);
        assert_eq!(*events.borrow(), vec![ViewEvent::Empty]);
    }

    /// Source that blocks responses carrying the "slow" facet until
    /// released, so tests can reorder completions.
    struct GatedSource {
        gate: Arc<Notify>,
    }

    impl CatalogSource for GatedSource {
        async fn fetch_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
            let slow = query
                .facets
                .iter()
                .any(|(id, _)| id.as_str() == "slow");
            if slow {
                self.gate.notified().await;
                Ok(full_page("slow", 3, None))
            } else {
                Ok(full_page("fast", 8, None))
            }
        }

        async fn fetch_category(&self, _slug: &str) -> Result<Category, ApiError> {
            Err(ApiError::NotFound("no categories here".to_string()))
        }
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let gate = Arc::new(Notify::new());
        let source = GatedSource {
            gate: Arc::clone(&gate),
        };
        let view = RecordingView::default();
        let events = Rc::clone(&view.events);

        let ctrl = CatalogController::new(source, view, 8);

        let mut slow_selection = FacetSelection::new();
        slow_selection.select(FacetId::new("slow"), vec!["x".to_string()]);

        // Filter A (slow) is issued first, filter B (fast) second; B
        // completes first and A's response arrives afterwards.
        let slow_fetch = ctrl.apply_facets(slow_selection);
        let fast_fetch = async {
            ctrl.apply_facets(FacetSelection::new()).await;
            gate.notify_one();
        };
        tokio::join!(slow_fetch, fast_fetch);

        // Only the fast batch was rendered; the slow one was stale.
        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ViewEvent::Products(ids, false) if ids.first().unwrap().starts_with("fast")
        ));
        assert_eq!(ctrl.phase(), Phase::Loaded);
    }

    /// Source whose unfiltered page-2 fetch blocks until the category
    /// lookup runs, so a load-more response arrives mid category switch.
    struct CategorySwitchSource {
        gate: Arc<Notify>,
    }

    impl CatalogSource for CategorySwitchSource {
        async fn fetch_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
            if query.category.is_some() {
                Ok(full_page("new", 8, None))
            } else if query.page == 1 {
                Ok(full_page("first", 8, Some(meta(1, 2))))
            } else {
                self.gate.notified().await;
                Ok(full_page("old", 8, Some(meta(2, 2))))
            }
        }

        async fn fetch_category(&self, slug: &str) -> Result<Category, ApiError> {
            // Release the blocked page-2 fetch and let it complete while
            // the title lookup is still in flight.
            self.gate.notify_one();
            tokio::task::yield_now().await;
            Ok(Category {
                id: bravex_core::CategoryId::new(slug),
                title: format!("Category {slug}"),
                slug: slug.to_string(),
                image: None,
            })
        }
    }

    #[tokio::test]
    async fn test_category_switch_discards_inflight_load_more() {
        let gate = Arc::new(Notify::new());
        let source = CategorySwitchSource {
            gate: Arc::clone(&gate),
        };
        let view = RecordingView::default();
        let events = Rc::clone(&view.events);

        let ctrl = CatalogController::new(source, view, 8);
        ctrl.init(None).await;

        // A page-2 load-more is in flight when the category changes; its
        // response lands during the title lookup and must be dropped.
        tokio::join!(ctrl.load_more(), ctrl.init(Some("shoes")));

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            ViewEvent::Products(ids, false) if ids.first().unwrap().starts_with("first")
        ));
        assert!(matches!(
            &events[1],
            ViewEvent::Products(ids, false) if ids.first().unwrap().starts_with("new")
        ));
        assert_eq!(ctrl.page(), 1);
        assert_eq!(ctrl.category_title().as_deref(), Some("Category shoes"));
    }
}
