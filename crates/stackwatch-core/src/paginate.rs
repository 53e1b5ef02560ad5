//! Draining paginated listings

use crate::error::{CoreError, Result};
use futures_util::stream::{BoxStream, Stream, TryStreamExt};

/// Pages of items produced by a paginated API call
pub type Pages<'a, T> = BoxStream<'a, Result<Vec<T>>>;

/// Collect every page of `pages` into one sequence, preserving order.
///
/// There is no bound on the number of pages and no retry; the first page
/// error is returned as-is.
pub async fn collect_pages<T, S>(pages: S) -> Result<Vec<T>>
where
    S: Stream<Item = Result<Vec<T>>>,
{
    let items = pages
        .try_fold(Vec::new(), |mut items, page| async move {
            items.extend(page);
            Ok::<_, CoreError>(items)
        })
        .await?;

    tracing::debug!("Collected {} items from paginated listing", items.len());
    Ok(items)
}
