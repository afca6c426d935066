//! Card compositor
//!
//! Renders the shareable card raster: a vertical gradient background, the
//! avatar centered in the upper half, and an accent bar along the bottom.
//! The avatar is fetched over HTTP; a fetch or decode failure degrades to
//! the background-only card so export never blocks on the image host.

use std::io::Cursor;

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use monart_core::ports::{CaptureError, CapturedCard, CardCapture};
use monart_domain::Profile;
use reqwest::Method;
use tracing::{debug, warn};

use crate::http::HttpClient;

const CARD_WIDTH: u32 = 600;
const CARD_HEIGHT: u32 = 750;
const AVATAR_SIZE: u32 = 300;
const AVATAR_TOP: i64 = 120;
const ACCENT_BAR_HEIGHT: u32 = 24;

// Monad purple, top to bottom
const GRADIENT_TOP: Rgba<u8> = Rgba([131, 110, 249, 255]);
const GRADIENT_BOTTOM: Rgba<u8> = Rgba([32, 0, 82, 255]);
const ACCENT: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub struct CardCompositor {
    http: HttpClient,
}

impl CardCompositor {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn fetch_avatar(&self, url: &str) -> Option<DynamicImage> {
        let request = self.http.request(Method::GET, url);
        let response = match self.http.send(request).await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(%url, status = %response.status(), "avatar fetch rejected");
                return None;
            }
            Err(err) => {
                warn!(%url, error = %err, "avatar fetch failed");
                return None;
            }
        };

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%url, error = %err, "failed to read avatar bytes");
                return None;
            }
        };

        match image::load_from_memory(&bytes) {
            Ok(avatar) => Some(avatar),
            Err(err) => {
                warn!(%url, error = %err, "failed to decode avatar");
                None
            }
        }
    }

    fn compose(avatar: Option<&DynamicImage>) -> RgbaImage {
        let mut canvas = RgbaImage::from_fn(CARD_WIDTH, CARD_HEIGHT, |_, y| {
            blend_vertical(y, CARD_HEIGHT)
        });

        if let Some(avatar) = avatar {
            let resized = imageops::resize(
                &avatar.to_rgba8(),
                AVATAR_SIZE,
                AVATAR_SIZE,
                FilterType::Lanczos3,
            );
            let left = i64::from((CARD_WIDTH - AVATAR_SIZE) / 2);
            imageops::overlay(&mut canvas, &resized, left, AVATAR_TOP);
        }

        for y in (CARD_HEIGHT - ACCENT_BAR_HEIGHT)..CARD_HEIGHT {
            for x in 0..CARD_WIDTH {
                canvas.put_pixel(x, y, ACCENT);
            }
        }

        canvas
    }
}

fn blend_vertical(y: u32, height: u32) -> Rgba<u8> {
    let t = f64::from(y) / f64::from(height.max(1));
    let channel = |top: u8, bottom: u8| -> u8 {
        let value = f64::from(top) + (f64::from(bottom) - f64::from(top)) * t;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let clamped = value.round().clamp(0.0, 255.0) as u8;
        clamped
    };
    Rgba([
        channel(GRADIENT_TOP[0], GRADIENT_BOTTOM[0]),
        channel(GRADIENT_TOP[1], GRADIENT_BOTTOM[1]),
        channel(GRADIENT_TOP[2], GRADIENT_BOTTOM[2]),
        255,
    ])
}

#[async_trait]
impl CardCapture for CardCompositor {
    async fn capture(&self, profile: &Profile) -> Result<CapturedCard, CaptureError> {
        debug!(handle = %profile.handle, "capturing card");

        let avatar = self.fetch_avatar(&profile.avatar_url).await;
        let canvas = Self::compose(avatar.as_ref());

        let mut buffer = Cursor::new(Vec::new());
        canvas
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|err| CaptureError::Encode(err.to_string()))?;

        Ok(CapturedCard { png: buffer.into_inner() })
    }
}
