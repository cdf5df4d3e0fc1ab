use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real badge counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static CARD_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE))
});

/// Badge readers send hex card ids with inconsistent casing.
#[inline]
pub fn normalize(token: &str) -> String {
    token.trim().to_ascii_uppercase()
}

/// Check if a card token might be registered (false positives possible)
pub fn might_exist(token: &str) -> bool {
    let token = normalize(token);
    CARD_FILTER
        .read()
        .expect("card filter poisoned")
        .contains(&token)
}

/// Insert a single card token into the filter
pub fn insert(token: &str) {
    let token = normalize(token);
    CARD_FILTER
        .write()
        .expect("card filter poisoned")
        .add(&token);
}

/// Remove a card token from the filter
pub fn remove(token: &str) {
    let token = normalize(token);
    CARD_FILTER
        .write()
        .expect("card filter poisoned")
        .remove(&token);
}

/// Warm up the card filter using streaming + batching
pub async fn warmup_card_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String,)>("SELECT card_token FROM subjects").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (token,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&token));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Card filter warmup complete: {} badges", total);
    Ok(())
}

/// Insert a batch of normalized tokens
fn insert_batch(tokens: &[String]) {
    let mut filter = CARD_FILTER.write().expect("card filter poisoned");

    for token in tokens {
        filter.add(token);
    }
}
