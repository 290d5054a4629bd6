//! A scope-owned `Writer`. Where the reference backend this crate was
//! written against uses an explicit deferred release, a `Writer` here is
//! wrapped in a guard whose `Drop` aborts it if nothing ever called
//! [`WriterGuard::commit`] — an early return via `?` can never leak an open
//! unit of work.

use std::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::registry::Writer;

pub struct WriterGuard {
    inner: Option<Box<dyn Writer>>,
}

impl WriterGuard {
    pub fn new(writer: Box<dyn Writer>) -> Self {
        Self { inner: Some(writer) }
    }

    /// Commits the wrapped writer. Consumes the guard, so there's nothing
    /// left for `Drop` to abort afterwards.
    pub async fn commit(mut self) -> Result<()> {
        let writer = self.inner.take().expect("writer taken exactly once");
        writer.commit().await
    }
}

impl Deref for WriterGuard {
    type Target = dyn Writer;

    fn deref(&self) -> &Self::Target {
        self.inner.as_deref().expect("writer taken exactly once")
    }
}

impl DerefMut for WriterGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_deref_mut().expect("writer taken exactly once")
    }
}

impl Drop for WriterGuard {
    fn drop(&mut self) {
        if let Some(writer) = self.inner.take() {
            tracing::debug!("writer guard dropped without commit; aborting pending writes");
            writer.abort();
        }
    }
}
