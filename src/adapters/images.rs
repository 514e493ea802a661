use crate::adapters::build_http_client;
use crate::config::ImageConfig;
use crate::domain::model::ImageData;
use crate::domain::ports::ImageFetcher;
use crate::utils::error::{Result, StylistError};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageReader};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::io::Cursor;
use url::Url;

const JPEG_QUALITY: u8 = 90;

/// Downloads garment and try-on images over HTTP(S).
pub struct HttpImageFetcher {
    client: Client,
    config: ImageConfig,
}

impl HttpImageFetcher {
    pub fn new(config: &ImageConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<ImageData> {
        let parsed = Url::parse(url)
            .map_err(|e| StylistError::image(format!("invalid image URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StylistError::image(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        let mut response = self
            .client
            .get(parsed)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await?
            .error_for_status()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(StylistError::image(format!(
                "non-image content type '{}' from {}",
                content_type, url
            )));
        }

        let max_bytes = self.config.max_bytes;
        if let Some(length) = response.content_length() {
            if length > max_bytes as u64 {
                return Err(StylistError::image(format!(
                    "image at {} is {} bytes, limit is {}",
                    url, length, max_bytes
                )));
            }
        }

        // Servers may omit or misreport the length; count while reading.
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(StylistError::image(format!(
                    "image at {} exceeds {} bytes",
                    url, max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        prepare_image(ImageData::from_bytes(bytes)?, &self.config)
    }
}

/// Checks an image's dimensions and shrinks it to fit `max_side` x `max_side`.
///
/// Images already within bounds and stored as 8-bit RGB pass through
/// untouched. Anything else is flattened to RGB and re-encoded as JPEG.
pub fn prepare_image(image: ImageData, config: &ImageConfig) -> Result<ImageData> {
    let reader = || {
        ImageReader::new(Cursor::new(image.bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| StylistError::image(format!("unreadable image: {}", e)))
    };

    let (width, height) = reader()?
        .into_dimensions()
        .map_err(|e| StylistError::image(format!("cannot read {} image: {}", image.mime, e)))?;
    if width < config.min_side || height < config.min_side {
        return Err(StylistError::image(format!(
            "image is {}x{}, it needs at least {}px per side",
            width, height, config.min_side
        )));
    }
    if width > config.max_source_side || height > config.max_source_side {
        return Err(StylistError::image(format!(
            "image is {}x{}, the limit is {}px per side",
            width, height, config.max_source_side
        )));
    }

    let decoded = reader()?
        .decode()
        .map_err(|e| StylistError::image(format!("cannot decode {} image: {}", image.mime, e)))?;
    let oversized = width > config.max_side || height > config.max_side;
    if !oversized && decoded.color() == ColorType::Rgb8 {
        return Ok(image);
    }

    let decoded = if oversized {
        decoded.thumbnail(config.max_side, config.max_side)
    } else {
        decoded
    };
    let rgb = decoded.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| StylistError::image(format!("cannot re-encode image: {}", e)))?;

    tracing::debug!(
        "Prepared image {}x{} -> {}x{} ({} bytes)",
        width,
        height,
        rgb.width(),
        rgb.height(),
        bytes.len()
    );
    ImageData::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::fixtures::{encoded, PNG};
    use httpmock::prelude::*;
    use image::ImageFormat;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn fetcher(max_bytes: usize) -> HttpImageFetcher {
        HttpImageFetcher::new(&ImageConfig {
            max_bytes,
            ..ImageConfig::default()
        })
        .unwrap()
    }

    fn dimensions(image: &ImageData) -> (u32, u32) {
        let decoded = image::load_from_memory(&image.bytes).unwrap();
        (decoded.width(), decoded.height())
    }

    #[tokio::test]
    async fn test_fetch_image() {
        let server = MockServer::start_async().await;
        let shirt = encoded(120, 150, ImageFormat::Png);
        let image_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/shirt.png")
                    .header_exists("user-agent");
                then.status(200)
                    .header("Content-Type", "image/png")
                    .body(&shirt);
            })
            .await;

        let image = fetcher(64 * 1024)
            .fetch(&server.url("/shirt.png"))
            .await
            .unwrap();

        image_mock.assert_async().await;
        assert_eq!(image.mime, "image/png");
        assert_eq!(image.bytes, shirt);
    }

    #[tokio::test]
    async fn test_fetch_shrinks_large_image() {
        let server = MockServer::start_async().await;
        let poster = encoded(2000, 1000, ImageFormat::Png);
        server
            .mock_async(|when, then| {
                when.method(GET).path("/poster.png");
                then.status(200)
                    .header("Content-Type", "image/png")
                    .body(&poster);
            })
            .await;

        let image = fetcher(1024 * 1024)
            .fetch(&server.url("/poster.png"))
            .await
            .unwrap();

        assert_eq!(image.mime, "image/jpeg");
        assert_eq!(dimensions(&image), (1024, 512));
    }

    #[tokio::test]
    async fn test_rejects_non_image_content_type() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/page");
                then.status(200)
                    .header("Content-Type", "text/html")
                    .body("<html></html>");
            })
            .await;

        let err = fetcher(1024).fetch(&server.url("/page")).await.unwrap_err();
        assert!(matches!(err, StylistError::ImageError { .. }));
    }

    #[tokio::test]
    async fn test_rejects_oversized_image() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/big.png");
                then.status(200)
                    .header("Content-Type", "image/png")
                    .body(PNG);
            })
            .await;

        let err = fetcher(8).fetch(&server.url("/big.png")).await.unwrap_err();
        assert!(err.to_string().contains("bytes"));
    }

    #[tokio::test]
    async fn test_rejects_oversized_body_without_length() {
        // Raw server: no Content-Length, body delimited by closing the connection.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nConnection: close\r\n\r\n",
                )
                .await;
            let _ = socket.write_all(&[0u8; 4096]).await;
            let _ = socket.shutdown().await;
        });

        let err = fetcher(256)
            .fetch(&format!("http://{}/endless.png", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, StylistError::ImageError { .. }));
        assert!(err.to_string().contains("exceeds 256 bytes"));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone.png");
                then.status(404);
            })
            .await;

        let err = fetcher(1024).fetch(&server.url("/gone.png")).await.unwrap_err();
        assert!(matches!(err, StylistError::HttpError(_)));
    }

    #[tokio::test]
    async fn test_rejects_unsupported_scheme() {
        assert!(fetcher(1024).fetch("ftp://example.com/a.png").await.is_err());
        assert!(fetcher(1024).fetch("not a url").await.is_err());
    }

    #[test]
    fn test_prepare_keeps_small_rgb_image() {
        let bytes = encoded(300, 400, ImageFormat::Jpeg);
        let image = ImageData::from_bytes(bytes.clone()).unwrap();

        let prepared = prepare_image(image, &ImageConfig::default()).unwrap();
        assert_eq!(prepared.bytes, bytes);
        assert_eq!(prepared.mime, "image/jpeg");
    }

    #[test]
    fn test_prepare_flattens_alpha_to_jpeg() {
        let mut bytes = Vec::new();
        image::RgbaImage::from_pixel(200, 200, image::Rgba([10, 20, 30, 128]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let prepared =
            prepare_image(ImageData::from_bytes(bytes).unwrap(), &ImageConfig::default()).unwrap();
        assert_eq!(prepared.mime, "image/jpeg");
        assert_eq!(dimensions(&prepared), (200, 200));
    }

    #[test]
    fn test_prepare_rejects_out_of_range_dimensions() {
        let config = ImageConfig::default();
        let tiny = ImageData::from_bytes(encoded(50, 300, ImageFormat::Png)).unwrap();
        let err = prepare_image(tiny, &config).unwrap_err();
        assert!(err.to_string().contains("at least 100px"));

        let strict = ImageConfig {
            max_source_side: 1500,
            ..ImageConfig::default()
        };
        let huge = ImageData::from_bytes(encoded(2000, 1000, ImageFormat::Png)).unwrap();
        let err = prepare_image(huge, &strict).unwrap_err();
        assert!(err.to_string().contains("limit is 1500px"));

        let truncated = ImageData::from_bytes(PNG.to_vec()).unwrap();
        assert!(matches!(
            prepare_image(truncated, &config),
            Err(StylistError::ImageError { .. })
        ));
    }
}
