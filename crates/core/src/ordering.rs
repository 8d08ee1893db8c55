//! Priority ordering and bundle fingerprints.

use crate::hashing::sha256_hex_records;
use crate::registry::AssetDefinition;

/// Stable sort by ascending priority; equal priorities keep their order.
pub fn sort_by_priority<T, F>(items: &mut [T], priority: F)
where
    F: Fn(&T) -> i64,
{
    // `sort_by_key` is a stable sort.
    items.sort_by_key(priority);
}

/// Fingerprint of the source paths contributing to a bundle.
///
/// Every source path of every asset is hashed in order, each terminated by
/// a newline so that regrouping paths cannot produce the same digest.
/// Returns `None` when no asset is given.
pub fn fingerprint<'a, I>(assets: I) -> Option<String>
where
    I: IntoIterator<Item = &'a AssetDefinition>,
{
    let mut assets = assets.into_iter().peekable();
    assets.peek()?;
    Some(sha256_hex_records(
        assets.flat_map(|asset| asset.sources.iter()),
    ))
}
