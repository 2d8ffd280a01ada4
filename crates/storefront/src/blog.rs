//! Blog feed state machine.
//!
//! Same pagination machine as the catalog, without facets, plus one
//! rule: on the very first successful page-1 load the leading posts are
//! diverted to a separate featured slot and excluded from the main feed
//! list. The diversion happens exactly once per session; later pages
//! and reloads render into the main list untouched.

use std::cell::RefCell;

use bravex_core::Page;
use tracing::debug;

use crate::api::{ApiClient, ApiError, Post};
use crate::catalog::Phase;

/// Number of leading feed items diverted to the featured slot.
pub const FEATURED_COUNT: usize = 2;

/// Paged post fetches, abstracted for testability.
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    /// Fetch one page of posts, newest first.
    async fn fetch_posts(&self, page: u32, page_size: u32) -> Result<Page<Post>, ApiError>;
}

impl FeedSource for ApiClient {
    async fn fetch_posts(&self, page: u32, page_size: u32) -> Result<Page<Post>, ApiError> {
        self.get_posts(page, page_size).await
    }
}

/// Render collaborator for the feed.
pub trait FeedView {
    /// Render the featured slot.
    fn show_featured(&mut self, posts: &[Post]);

    /// Render a batch into the main feed list, replacing or appending.
    fn show_posts(&mut self, posts: &[Post], append: bool);

    /// Render the "no posts" state for the main list.
    fn show_empty(&mut self);

    /// Render the full-list error state.
    fn show_error(&mut self);
}

struct FeedState {
    page: u32,
    page_size: u32,
    phase: Phase,
    has_more: bool,
    generation: u64,
    featured_taken: bool,
}

/// Controller for the blog feed.
pub struct FeedController<S, V> {
    source: S,
    view: RefCell<V>,
    state: RefCell<FeedState>,
}

impl<S: FeedSource, V: FeedView> FeedController<S, V> {
    /// Create an idle controller. Nothing is fetched until [`Self::init`].
    pub fn new(source: S, view: V, page_size: u32) -> Self {
        Self {
            source,
            view: RefCell::new(view),
            state: RefCell::new(FeedState {
                page: 1,
                page_size,
                phase: Phase::Idle,
                has_more: true,
                generation: 0,
                featured_taken: false,
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

    /// Enter the blog page and load page 1.
    pub async fn init(&self) {
        let (page_size, generation) = {
            let mut st = self.state.borrow_mut();
            st.generation += 1;
            st.page = 1;
            st.has_more = true;
            st.phase = Phase::Loading;
            (st.page_size, st.generation)
        };

        let result = self.source.fetch_posts(1, page_size).await;
        self.finish(result, generation, 1, false);
    }

    /// Scroll-triggered request for the next page.
    ///
    /// Idempotent; see [`crate::catalog::CatalogController::load_more`].
    pub async fn load_more(&self) {
        let (page, page_size, generation) = {
            let mut st = self.state.borrow_mut();
            if st.phase != Phase::Loaded || !st.has_more {
                return;
            }
            st.phase = Phase::LoadingMore;
            (st.page + 1, st.page_size, st.generation)
        };

        let result = self.source.fetch_posts(page, page_size).await;
        self.finish(result, generation, page, true);
    }

    fn finish(
        &self,
        result: Result<Page<Post>, ApiError>,
        generation: u64,
        fetched_page: u32,
        append: bool,
    ) {
        let mut st = self.state.borrow_mut();
        if st.generation != generation {
            debug!(generation, current = st.generation, "discarding stale post response");
            return;
        }

        match result {
            Ok(batch) => {
                // has_more reflects the undiverted batch size.
                st.has_more = batch.has_more(fetched_page, st.page_size);
                st.page = fetched_page;
                st.phase = Phase::Loaded;

                let divert = !append && fetched_page == 1 && !st.featured_taken;
                if divert {
                    st.featured_taken = true;
                }
                drop(st);

                let mut view = self.view.borrow_mut();
                let main = if divert {
                    let featured: Vec<Post> =
                        batch.data.iter().take(FEATURED_COUNT).cloned().collect();
                    if !featured.is_empty() {
                        view.show_featured(&featured);
                    }
                    batch.data.get(FEATURED_COUNT..).unwrap_or_default()
                } else {
                    batch.data.as_slice()
                };

                if main.is_empty() {
                    if !append {
                        view.show_empty();
                    }
                } else {
                    view.show_posts(main, append);
                }
            }
            Err(e) if append => {
                tracing::warn!(error = %e, page = fetched_page, "failed to load more posts");
                st.phase = Phase::Loaded;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load posts");
                st.phase = Phase::Error;
                drop(st);
                self.view.borrow_mut().show_error();
            }
        }
    }
}
