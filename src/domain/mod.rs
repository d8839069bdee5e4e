pub mod media;
pub mod todo;
pub mod verification;

#[cfg(test)]
pub mod test_util;

/// Maps a poisoned lock on one of the in-memory stores into a port error instead of a panic
pub(crate) fn poisoned<T>(store_name: &str) -> impl FnOnce(T) -> anyhow::Error + '_ {
    move |_| anyhow::anyhow!("the {store_name} lock was poisoned")
}
