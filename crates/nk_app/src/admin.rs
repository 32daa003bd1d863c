//! Admin console: authoring articles behind a login.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use nk_core::{Article, Error, Result};
use nk_storage::{AdminArticles, NewArticle};
use tracing::{info, warn};

pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Decides whether a console login attempt succeeds.
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    async fn authenticate(&self, secret: &str) -> Result<bool>;
}

/// Compares against one shared password held in memory.
///
/// This is a convenience gate for local demos, not a security boundary:
/// the password is a plain string and every process shares it.
#[derive(Clone)]
pub struct StaticPasswordAuthenticator {
    password: String,
}

impl StaticPasswordAuthenticator {
    pub fn new(password: impl Into<String>) -> Self {
        Self { password: password.into() }
    }
}

impl Default for StaticPasswordAuthenticator {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_PASSWORD)
    }
}

impl fmt::Debug for StaticPasswordAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticPasswordAuthenticator")
            .field("password", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Authenticator for StaticPasswordAuthenticator {
    async fn authenticate(&self, secret: &str) -> Result<bool> {
        Ok(secret == self.password)
    }
}

#[derive(Debug)]
pub struct AdminConsole {
    articles: Arc<AdminArticles>,
    authenticator: Arc<dyn Authenticator>,
    authenticated: AtomicBool,
}

impl AdminConsole {
    pub fn new(articles: Arc<AdminArticles>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            articles,
            authenticator,
            authenticated: AtomicBool::new(false),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    pub async fn login(&self, secret: &str) -> Result<()> {
        if self.authenticator.authenticate(secret).await? {
            self.authenticated.store(true, Ordering::SeqCst);
            info!("🔑 Admin console unlocked");
            Ok(())
        } else {
            warn!("Rejected admin login attempt");
            Err(Error::Unauthorized)
        }
    }

    pub fn logout(&self) {
        self.authenticated.store(false, Ordering::SeqCst);
    }

    fn ensure_authenticated(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }

    pub async fn list(&self) -> Result<Vec<Article>> {
        self.ensure_authenticated()?;
        Ok(self.articles.list().await)
    }

    pub async fn create(&self, input: NewArticle) -> Result<Article> {
        self.ensure_authenticated()?;
        self.articles.create(input).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.ensure_authenticated()?;
        self.articles.delete(id).await
    }
}
