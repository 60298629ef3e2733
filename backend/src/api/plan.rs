use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};
use futures::{Stream, TryStreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, Instrument};
use uuid::Uuid;
use warp::{Rejection, Reply};

use crate::coach::PlanResolver;
use crate::error::ApiError;
use crate::models::UserProfile;

/// Drains a request body of any framing (sized or chunked), refusing it once
/// more than `limit` bytes have arrived.
pub(crate) async fn collect_body<S, B>(stream: S, limit: usize) -> Result<Bytes, ApiError>
where
    S: Stream<Item = Result<B, warp::Error>>,
    B: Buf,
{
    let body = stream
        .map_err(|e| ApiError::BadRequest(e.to_string()))
        .try_fold(BytesMut::new(), |mut acc, mut chunk| async move {
            if acc.len() + chunk.remaining() > limit {
                return Err(ApiError::PayloadTooLarge(limit));
            }
            let data = chunk.copy_to_bytes(chunk.remaining());
            acc.extend_from_slice(&data);
            Ok(acc)
        })
        .await?;

    Ok(body.freeze())
}

pub async fn handle_generate_plan(
    body: Bytes,
    resolver: Arc<PlanResolver>,
    shutdown: CancellationToken,
) -> Result<impl Reply, Rejection> {
    let profile: UserProfile = serde_json::from_slice(&body)
        .map_err(|e| warp::reject::custom(ApiError::BadRequest(e.to_string())))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("generate_plan", %request_id, user_id = %profile.user_id);

    // Cancelled when this request is dropped or the server shuts down.
    let cancel = shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let content = async {
        info!("Generating plan");
        resolver.resolve(&profile, &cancel).await
    }
    .instrument(span)
    .await
    .map_err(warp::reject::custom)?;

    Ok(warp::reply::with_header(
        content,
        "Content-Type",
        "application/json",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes, warp::Error>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok::<_, warp::Error>(Bytes::from_static(*p)))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn joins_chunks_in_order() {
        let body = collect_body(chunks(&[b"{\"name\":", b"\"Ann\"}"]), 64).await.unwrap();
        assert_eq!(body.as_ref(), b"{\"name\":\"Ann\"}");
    }

    #[tokio::test]
    async fn accepts_a_body_exactly_at_the_limit() {
        let body = collect_body(chunks(&[b"12345", b"678"]), 8).await.unwrap();
        assert_eq!(body.len(), 8);
    }

    #[tokio::test]
    async fn refuses_a_body_over_the_limit() {
        let result = collect_body(chunks(&[b"12345", b"6789"]), 8).await;
        assert!(matches!(result, Err(ApiError::PayloadTooLarge(8))));
    }

    #[tokio::test]
    async fn empty_body_is_empty() {
        let body = collect_body(chunks(&[]), 8).await.unwrap();
        assert!(body.is_empty());
    }
}
