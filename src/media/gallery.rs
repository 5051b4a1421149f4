use super::catalog::VideoCatalog;
use super::video::generate_thumbnail;
use super::{Thumbnail, VideoRecord};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{Instrument, Span, error, info, info_span, warn};
use uuid::Uuid;

/// Thumbnails for every clip in the catalog, in catalog order
///
/// Each clip is decoded on its own blocking thread with its own decoder, at
/// most `workers` at a time. Clips that fail to decode are left out.
pub async fn collect_thumbnails(catalog: &VideoCatalog, workers: usize) -> Vec<Thumbnail> {
    let scan_id = Uuid::new_v4();
    let span = info_span!("thumbnail_scan", %scan_id);

    async move {
        let catalog = catalog.clone();
        let records = match task::spawn_blocking(move || catalog.list()).await {
            Ok(records) => records,
            Err(e) => {
                error!("Catalog scan did not complete: {}", e);
                return Vec::new();
            }
        };

        info!("Generating thumbnails for {} videos", records.len());
        let thumbnails = thumbnails_for(records, workers).await;
        info!("Generated {} thumbnails", thumbnails.len());

        thumbnails
    }
    .instrument(span)
    .await
}

/// Decode previews for `records` concurrently, keeping their order
pub async fn thumbnails_for(records: Vec<VideoRecord>, workers: usize) -> Vec<Thumbnail> {
    thumbnails_with(records, workers, |path: &Path| generate_thumbnail(path)).await
}

/// Run `extract` over `records` with at most `workers` running at once
///
/// Dropping the returned future aborts every clip still waiting for a
/// worker; only decodes already running finish, and their output is discarded.
async fn thumbnails_with<F>(records: Vec<VideoRecord>, workers: usize, extract: F) -> Vec<Thumbnail>
where
    F: Fn(&Path) -> Option<Vec<u8>> + Send + Sync + 'static,
{
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let extract = Arc::new(extract);
    let mut slots: Vec<Option<Thumbnail>> = vec![None; records.len()];

    let mut tasks = JoinSet::new();
    for (index, record) in records.into_iter().enumerate() {
        let permits = Arc::clone(&permits);
        let extract = Arc::clone(&extract);
        let span = Span::current();
        tasks.spawn(async move {
            let permit = permits.acquire_owned().await.ok()?;
            let video_id = record.id.clone();
            let decoded = task::spawn_blocking(move || {
                let _permit = permit;
                span.in_scope(|| (*extract)(&record.path))
                    .map(|image| Thumbnail {
                        video_id: record.id,
                        image,
                    })
            })
            .await;

            match decoded {
                Ok(thumbnail) => thumbnail.map(|thumbnail| (index, thumbnail)),
                Err(e) => {
                    warn!("Thumbnail worker for {} failed: {}", video_id, e);
                    None
                }
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some((index, thumbnail))) => {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(thumbnail);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Thumbnail task failed: {}", e),
        }
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    fn records(ids: &[&str]) -> Vec<VideoRecord> {
        ids.iter()
            .map(|id| VideoRecord {
                id: id.to_string(),
                path: PathBuf::from(format!("/clips/{id}.mp4")),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_catalog_yields_no_thumbnails() {
        let dir = tempdir().unwrap();
        let catalog = VideoCatalog::new(dir.path());
        assert!(collect_thumbnails(&catalog, 2).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_clips_are_skipped() {
        crate::media::video::init_ffmpeg().unwrap();
        let dir = tempdir().unwrap();
        for name in ["a.mp4", "b.mp4", "c.mp4"] {
            std::fs::write(dir.path().join(name), b"garbage").unwrap();
        }

        let catalog = VideoCatalog::new(dir.path());
        assert_eq!(catalog.list().len(), 3);
        assert!(collect_thumbnails(&catalog, 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_results_keep_catalog_order() {
        let thumbnails = thumbnails_with(records(&["a", "b", "c", "d"]), 4, |path: &Path| {
            // earlier clips finish last
            let delay = match path.file_stem()?.to_str()? {
                "a" => 150,
                "c" => 80,
                _ => 10,
            };
            std::thread::sleep(Duration::from_millis(delay));
            (!path.ends_with("b.mp4")).then(|| vec![0xFF, 0xD8])
        })
        .await;

        let ids: Vec<&str> = thumbnails.iter().map(|t| t.video_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
    }

    #[tokio::test]
    async fn test_dropped_listing_stops_queued_clips() {
        let started = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&started);

        let listing = thumbnails_with(records(&["a", "b", "c", "d", "e"]), 1, move |_: &Path| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(200));
            Some(vec![0xFF, 0xD8])
        });
        assert!(
            tokio::time::timeout(Duration::from_millis(50), listing)
                .await
                .is_err()
        );

        // long enough for every queued clip to have run had it survived
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(started.load(Ordering::SeqCst) <= 1);
    }
}
