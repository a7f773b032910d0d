/// A macro to simplify caching logic using Redis.
///
/// Checks the cache for the given key; on a hit the cached value is
/// returned, on a miss the provided block computes the value, which is
/// stored in the background and returned.
///
/// # Arguments
/// * `$cache`: The cache instance, with `get_from_cache` and
///   `set_in_background` methods.
/// * `$key`: The key to cache the value under.
/// * `$ttl`: Time-to-live for the cached value, in seconds.
/// * `$block`: The async block to compute the value on a miss.
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
