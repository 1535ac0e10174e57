/// A macro to simplify read-through caching on top of [`Cache`](crate::db::Cache).
///
/// Looks the key up first and returns the cached value on a hit. On a miss (or when the
/// cache cannot be reached) the block is awaited, its value is queued for a background
/// write when `$store_if` accepts it, and the value is returned.
///
/// # Arguments
/// * `$cache`: cache with `get_from_cache` and `set_in_background` methods.
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live in seconds for stored values.
/// * `$store_if`: predicate over `&value`; only accepted values are written.
/// * `$block`: future computing the value on a miss; its error is propagated with `?`.
///
/// # Example
/// ```rust,ignore
/// let outcome = cached!(cache, key, TTL, |o: &ParseOutcome<_>| o.is_parsed(), async move {
///     inner.lookup(&query).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $store_if:expr, $block:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Ok(Some(cached)) => Ok(cached),
            miss => {
                if let Err(e) = miss {
                    tracing::warn!(error = %e, key = %$key, "Cache read failed, treating as miss");
                }
                let value = $block.await?;
                if ($store_if)(&value) {
                    $cache.set_in_background(&$key, &value, $ttl);
                }
                Ok(value)
            }
        }
    }};
}
