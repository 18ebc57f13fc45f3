//! Best-effort PDF thumbnails.
//!
//! The service fetches or decodes the PDF source itself; rasterizing the
//! first page is delegated to a [`ThumbnailRenderer`] collaborator. Every
//! failure path returns `None` so callers can treat thumbnails as strictly
//! optional — an article is saved with or without one.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, warn};

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);
const TARGET_WIDTH: u32 = 800;

/// Renders the first page of a PDF to JPEG bytes.
pub trait ThumbnailRenderer: Send + Sync + 'static {
    fn render_first_page(&self, pdf: &[u8], target_width: u32) -> Option<Vec<u8>>;
}

/// Placeholder renderer used when no rasterizer is configured.
pub struct NoopRenderer;

impl ThumbnailRenderer for NoopRenderer {
    fn render_first_page(&self, _pdf: &[u8], _target_width: u32) -> Option<Vec<u8>> {
        debug!("no thumbnail renderer configured, skipping");
        None
    }
}

#[derive(Clone)]
pub struct ThumbnailService {
    http: reqwest::Client,
    renderer: Arc<dyn ThumbnailRenderer>,
}

impl ThumbnailService {
    pub fn new(http: reqwest::Client, renderer: Arc<dyn ThumbnailRenderer>) -> Self {
        Self { http, renderer }
    }

    /// Resolve a PDF source (data URL or remote URL) and render its first
    /// page to a JPEG data URL.
    pub async fn thumbnail_data_url(&self, pdf_src: &str) -> Option<String> {
        let bytes = if pdf_src.starts_with("data:") {
            decode_data_url(pdf_src)?
        } else {
            self.fetch_pdf(pdf_src).await?
        };
        self.thumbnail_from_bytes(&bytes)
    }

    /// Render already-loaded PDF bytes to a JPEG data URL.
    pub fn thumbnail_from_bytes(&self, pdf: &[u8]) -> Option<String> {
        if !pdf.starts_with(b"%PDF") {
            warn!("thumbnail source is not a PDF");
            return None;
        }
        let image = self.renderer.render_first_page(pdf, TARGET_WIDTH)?;
        Some(format!("data:image/jpeg;base64,{}", BASE64.encode(image)))
    }

    async fn fetch_pdf(&self, url: &str) -> Option<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| warn!(url, error = %e, "thumbnail fetch failed"))
            .ok()?;
        if response.status().as_u16() >= 400 {
            warn!(url, status = %response.status(), "thumbnail fetch returned an error");
            return None;
        }
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| warn!(url, error = %e, "thumbnail body read failed"))
            .ok()
    }
}

fn decode_data_url(src: &str) -> Option<Vec<u8>> {
    let (_, payload) = src.split_once(',')?;
    BASE64
        .decode(payload)
        .map_err(|e| warn!(error = %e, "invalid PDF data URL"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRenderer;

    impl ThumbnailRenderer for FixedRenderer {
        fn render_first_page(&self, _pdf: &[u8], _target_width: u32) -> Option<Vec<u8>> {
            Some(vec![0xFF, 0xD8, 0xFF])
        }
    }

    fn service(renderer: Arc<dyn ThumbnailRenderer>) -> ThumbnailService {
        ThumbnailService::new(reqwest::Client::new(), renderer)
    }

    #[test]
    fn rejects_non_pdf_bytes() {
        let svc = service(Arc::new(FixedRenderer));
        assert!(svc.thumbnail_from_bytes(b"plain text").is_none());
    }

    #[test]
    fn renders_pdf_bytes_to_a_data_url() {
        let svc = service(Arc::new(FixedRenderer));
        let url = svc.thumbnail_from_bytes(b"%PDF-1.4 rest").unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn noop_renderer_yields_no_thumbnail() {
        let svc = service(Arc::new(NoopRenderer));
        assert!(svc.thumbnail_from_bytes(b"%PDF-1.4 rest").is_none());
    }

    #[tokio::test]
    async fn decodes_a_pdf_data_url() {
        let svc = service(Arc::new(FixedRenderer));
        let payload = BASE64.encode(b"%PDF-1.4 rest");
        let src = format!("data:application/pdf;base64,{payload}");
        assert!(svc.thumbnail_data_url(&src).await.is_some());
    }
}
