//! View-state router.
//!
//! Tracks which screen is showing, the screen to return to from an article,
//! and the article being read. History is a single level deep.

use nk_core::{Article, Listeners, Subscription, View};
use tracing::debug;

/// Published after every transition. Readers of the new view expect to
/// start at the top, hence `reset_scroll`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationEvent {
    pub from: View,
    pub to: View,
    pub reset_scroll: bool,
}

#[derive(Debug)]
pub struct ViewRouter {
    current_view: View,
    previous_view: View,
    selected_article: Option<Article>,
    listeners: Listeners<NavigationEvent>,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewRouter {
    pub fn new() -> Self {
        Self {
            current_view: View::Landing,
            previous_view: View::Landing,
            selected_article: None,
            listeners: Listeners::new(),
        }
    }

    pub fn current_view(&self) -> View {
        self.current_view
    }

    pub fn previous_view(&self) -> View {
        self.previous_view
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.selected_article.as_ref()
    }

    /// Switch to `target`. Leaving the article view drops the selection.
    pub fn navigate_to(&mut self, target: View) {
        if self.current_view == View::ArticleDetail {
            self.selected_article = None;
        }
        self.transition(target);
    }

    /// Open `article`, remembering the current view for [`go_back`](Self::go_back).
    pub fn select_article(&mut self, article: Article) {
        if !self.current_view.produces_articles() {
            debug!("Article {} opened from {} view", article.id, self.current_view);
        }
        self.previous_view = self.current_view;
        self.selected_article = Some(article);
        self.transition(View::ArticleDetail);
    }

    /// Return to the remembered view and drop the selection.
    ///
    /// Outside the article view this still jumps to whatever view was
    /// remembered last, however long ago that was.
    pub fn go_back(&mut self) {
        self.selected_article = None;
        self.transition(self.previous_view);
    }

    /// The view actually shown: the article view needs a selection.
    pub fn rendered_view(&self) -> View {
        match (self.current_view, &self.selected_article) {
            (View::ArticleDetail, None) => View::Home,
            (view, _) => view,
        }
    }

    pub fn has_chrome(&self) -> bool {
        self.rendered_view().has_chrome()
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&NavigationEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    fn transition(&mut self, to: View) {
        let from = self.current_view;
        self.current_view = to;
        debug!("Navigated {} -> {}", from, to);
        self.listeners.emit(&NavigationEvent { from, to, reset_scroll: true });
    }
}
