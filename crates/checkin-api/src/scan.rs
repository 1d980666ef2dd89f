use axum::{
    body::Bytes,
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::{debug, info};

use checkin_types::api::ScanQuery;

use crate::error::DirectoryError;
use crate::guests::check_in_response;
use crate::state::AppState;

/// Largest frame accepted by `POST /scan` (a 4K camera frame fits).
pub const MAX_FRAME_BYTES: usize = 4096 * 2160 * 4;

/// A captured camera frame: row-major RGBA, 4 bytes per pixel.
#[derive(Debug, Clone)]
pub struct RgbaFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RgbaFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DirectoryError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));

        if width == 0 || height == 0 || expected != Some(pixels.len()) {
            return Err(DirectoryError::InvalidFrame {
                width,
                height,
                len: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// ITU-R BT.601 luma of the pixel at (x, y), or `None` outside the
    /// frame. Alpha is ignored.
    pub fn luma(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width as usize || y >= self.height as usize {
            return None;
        }

        let i = (y * self.width as usize + x) * 4;
        let [r, g, b, _] = self.pixels.get(i..i + 4)? else {
            return None;
        };
        let (r, g, b) = (*r as u32, *g as u32, *b as u32);
        Some(((r * 299 + g * 587 + b * 114) / 1000) as u8)
    }
}

/// Turns a frame into the text of the first readable QR code, if any.
pub trait QrDecoder: Send + Sync {
    fn decode(&self, frame: &RgbaFrame) -> Option<String>;
}

pub struct RqrrDecoder;

impl QrDecoder for RqrrDecoder {
    fn decode(&self, frame: &RgbaFrame) -> Option<String> {
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            frame.width() as usize,
            frame.height() as usize,
            |x, y| frame.luma(x, y).unwrap_or(0),
        );

        let grids = prepared.detect_grids();
        debug!("Found {} QR grid candidates", grids.len());

        grids.iter().find_map(|grid| match grid.decode() {
            Ok((_, content)) => Some(content),
            Err(e) => {
                debug!("Skipping unreadable QR grid: {:?}", e);
                None
            }
        })
    }
}

/// POST /scan?width=&height=, raw RGBA body. Decodes the guest id from the
/// QR code and checks that guest in.
pub async fn scan(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, DirectoryError> {
    let frame = RgbaFrame::new(query.width, query.height, body.to_vec())?;
    info!("Scanning {}x{} frame", frame.width(), frame.height());

    let outcome = state.directory.scan_check_in(frame).await?;
    Ok(check_in_response(outcome))
}
