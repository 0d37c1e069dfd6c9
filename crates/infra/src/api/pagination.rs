//! Cursor-driven page fetching
//!
//! [`ApiClient::fetch_page`] returns exactly one page. [`ApiClient::pages`]
//! wraps it in a lazy stream that follows forward cursors.

use adreach_domain::{Cursor, GraphEnvelope, PageResult, Result};
use futures::stream::{self, Stream};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::client::{decode, owned_params, ApiClient};

/// Query parameters that carry a cursor and are replaced when one is given
const CURSOR_PARAMS: [&str; 2] = ["after", "before"];

impl ApiClient {
    /// Fetch one page of a collection endpoint.
    ///
    /// With a cursor, its `after`/`before` parameter replaces any already
    /// present in `params`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`](adreach_domain::ApiError) of the
    /// last attempt, or `ProtocolError` if the body is not a Graph envelope.
    #[instrument(skip_all, fields(endpoint = %endpoint, resumed = cursor.is_some()))]
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        cursor: Option<&Cursor>,
    ) -> Result<PageResult<T>> {
        let mut query = owned_params(params);
        if let Some(cursor) = cursor {
            let (name, token) = cursor.query_param();
            query.retain(|(key, _)| !CURSOR_PARAMS.contains(&key.as_str()));
            query.push((name.to_string(), token.to_string()));
        }

        let delivered =
            self.call(Method::GET, endpoint, &query, None, self.read_executor()).await?;
        let envelope: GraphEnvelope<T> = decode(&delivered)?;
        let page = PageResult::from(envelope);

        debug!(
            records = page.len(),
            has_next = page.has_next,
            attempts = delivered.attempts,
            "fetched page"
        );
        Ok(page)
    }

    /// Lazily walk every page of a collection.
    ///
    /// Page N+1 is requested only when the stream is polled after page N.
    /// The stream ends after the last page or after yielding an error.
    pub fn pages<'a, T>(
        &'a self,
        endpoint: &'a str,
        params: &'a [(&'a str, &'a str)],
    ) -> impl Stream<Item = Result<PageResult<T>>> + 'a
    where
        T: DeserializeOwned + 'a,
    {
        // None: exhausted. Some(None): first page. Some(Some(c)): resume at c.
        stream::unfold(Some(None::<Cursor>), move |state| async move {
            let cursor = state?;
            match self.fetch_page::<T>(endpoint, params, cursor.as_ref()).await {
                Ok(page) => {
                    let next = page.next_cursor().map(Some);
                    Some((Ok(page), next))
                }
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}
