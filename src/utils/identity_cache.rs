use crate::model::subject::Subject;
use crate::utils::card_filter::normalize;
use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// card token -> resolved subject, so repeated scans from the same badge
/// skip the database on the hot path.
pub static IDENTITY_CACHE: Lazy<Cache<String, Subject>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000) // tune based on memory
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Remember a resolved badge
pub async fn remember(subject: &Subject) {
    IDENTITY_CACHE
        .insert(normalize(&subject.card_token), subject.clone())
        .await;
}

/// Cached lookup; None means "not cached", not "unknown badge"
pub async fn get(token: &str) -> Option<Subject> {
    IDENTITY_CACHE.get(&normalize(token)).await
}

/// Drop a badge, e.g. after deregistration
pub async fn forget(token: &str) {
    IDENTITY_CACHE.invalidate(&normalize(token)).await;
}

/// Batch insert resolved subjects
async fn batch_remember(subjects: &[Subject]) {
    let futures: Vec<_> = subjects
        .iter()
        .map(|s| IDENTITY_CACHE.insert(normalize(&s.card_token), s.clone()))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load registered subjects into the in-memory cache (batched)
pub async fn warmup_identity_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, Subject>(
        r#"
        SELECT id, card_token, display_name
        FROM subjects
        ORDER BY id
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        batch.push(row?);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_remember(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining subjects
    if !batch.is_empty() {
        batch_remember(&batch).await;
    }

    log::info!(
        "Identity cache warmup complete: {} subjects",
        total_count
    );

    Ok(())
}
