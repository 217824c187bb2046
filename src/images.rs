use html5ever::tokenizer::Tag;
use tokio::sync::mpsc;

use crate::extract::FetchError;
use crate::models::ImageRecord;
use crate::resolve::{image_name, resolve};
use crate::tokens::StartTags;

/// Response chunks buffered between the network reader and the tokenizer.
const CHUNK_QUEUE_DEPTH: usize = 8;

/// Image records for every qualifying `<img>` in a chunked HTML document,
/// in document order.
pub fn scan_images<I, B>(chunks: I, host: &str) -> Vec<ImageRecord>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    StartTags::new(chunks.into_iter())
        .filter(|tag| is_img(tag))
        .filter_map(|tag| image_from_tag(&tag, host))
        .collect()
}

/// Streams `response` through the tokenizer and drops it once the pass ends.
///
/// The tokenizer is not `Send`, so it lives on a blocking thread and pulls
/// chunks off a bounded channel; this task only moves bytes. A body read
/// error ends the pass like end-of-stream does and keeps what was found.
pub async fn extract_images(
    mut response: reqwest::Response,
    host: String,
) -> Result<Vec<ImageRecord>, FetchError> {
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(CHUNK_QUEUE_DEPTH);
    let scan = tokio::task::spawn_blocking(move || {
        scan_images(std::iter::from_fn(move || rx.blocking_recv()), &host)
    });

    let mut chunks = 0usize;
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                chunks += 1;
                if tx.send(chunk.to_vec()).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("image pass cut short after {} chunks: {}", chunks, e);
                break;
            }
        }
    }
    drop(tx);
    drop(response);
    tracing::debug!("image pass read {} chunks", chunks);

    scan.await.map_err(|e| FetchError::Body(e.to_string()))
}

fn is_img(tag: &Tag) -> bool {
    let name: &str = &tag.name;
    name.eq_ignore_ascii_case("img")
}

/// The tokenizer keeps only the first of repeated attributes, so a second
/// `src` or `alt` on the same tag is never seen here.
fn image_from_tag(tag: &Tag, host: &str) -> Option<ImageRecord> {
    let mut url = None;
    let mut description = String::new();

    for attr in &tag.attrs {
        let key: &str = &attr.name.local;
        if key.eq_ignore_ascii_case("src") {
            url = Some(resolve(&attr.value, host));
        } else if key.eq_ignore_ascii_case("alt") {
            description = attr.value.to_string();
        }
    }

    let url = url.filter(|u| !u.is_empty())?;
    Some(ImageRecord {
        name: image_name(&url).to_string(),
        description,
        url,
    })
}
