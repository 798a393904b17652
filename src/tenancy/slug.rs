//! URL-safe slugs with collision suffixing.
//!
//! The storage layer's unique constraint is the source of truth. The
//! existence check only picks a good first candidate; a conflict on the final
//! insert moves on to the next suffix.

use std::future::Future;

use async_trait::async_trait;

use crate::database::{Constraint, StoreError, StoreResult};
use crate::text::strip_accents;

pub const MAX_SLUG_LEN: usize = 50;
const MAX_ATTEMPTS: u32 = 25;

/// Derives a slug from a display name. Returns `None` when nothing usable
/// is left (e.g. a name made only of punctuation).
pub fn slugify(name: &str) -> Option<String> {
    let ascii = strip_accents(name).to_lowercase();

    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
        // anything else is dropped without separating words
    }

    let mut slug = slug.trim_matches(|c| c == '-' || c == '_').to_string();
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        slug = slug.trim_end_matches(|c| c == '-' || c == '_').to_string();
    }

    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

/// Whether a caller-supplied slug is already in canonical form.
pub fn is_valid_slug(slug: &str) -> bool {
    slugify(slug).as_deref() == Some(slug)
}

/// `base` for n = 0, `base-n` otherwise. The base is shortened when the
/// suffix would push the slug past [`MAX_SLUG_LEN`].
pub fn candidate(base: &str, n: u32) -> String {
    if n == 0 {
        return base.to_string();
    }
    let suffix = format!("-{}", n);
    let keep = MAX_SLUG_LEN.saturating_sub(suffix.len()).min(base.len());
    let head = base.get(..keep).unwrap_or(base).trim_end_matches('-');
    format!("{}{}", head, suffix)
}

/// Existence check for one slug namespace.
#[async_trait]
pub trait SlugLookup: Send + Sync {
    async fn slug_taken(&self, slug: &str) -> StoreResult<bool>;
}

/// Lowest `n >= start` whose candidate is free, with the candidate.
pub async fn first_available<L>(lookup: &L, base: &str, start: u32) -> StoreResult<(String, u32)>
where
    L: SlugLookup + ?Sized,
{
    let mut n = start;
    loop {
        let slug = candidate(base, n);
        if !lookup.slug_taken(&slug).await? {
            return Ok((slug, n));
        }
        n += 1;
    }
}

/// Runs `insert` with the first free slug derived from `base`, retrying with
/// the next suffix whenever the insert reports a conflict on `constraint`.
pub async fn insert_with_unique_slug<L, F, Fut, T>(
    lookup: &L,
    base: &str,
    constraint: Constraint,
    mut insert: F,
) -> StoreResult<T>
where
    L: SlugLookup + ?Sized,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut start = 0;
    for _ in 0..MAX_ATTEMPTS {
        let (slug, n) = first_available(lookup, base, start).await?;
        match insert(slug.clone()).await {
            Err(StoreError::Conflict(c)) if c == constraint => {
                tracing::debug!("Slug '{}' was taken concurrently, trying next suffix", slug);
                start = n + 1;
            }
            other => return other,
        }
    }
    Err(StoreError::SlugExhausted(MAX_ATTEMPTS))
}
