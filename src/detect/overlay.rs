//! Best-effort landmark overlay rasterization.
//!
//! Draws detected hand skeletons onto an RGB frame buffer for preview
//! display. Purely presentational — never feeds back into classification,
//! and out-of-range coordinates are silently skipped.

use crate::detect::types::{Hand, Landmark};

/// Skeleton edges over the 21-point hand landmark set.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (5, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (9, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (13, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (0, 17),
];

const CONNECTOR_COLOR: [u8; 3] = [0, 255, 0];
const LANDMARK_COLOR: [u8; 3] = [255, 0, 0];
const LANDMARK_RADIUS: i64 = 3;

/// Draw skeleton connectors and landmark dots for each hand onto an RGB24
/// buffer of the given dimensions.
pub fn render_hands(data: &mut [u8], width: u32, height: u32, hands: &[Hand]) {
    for hand in hands {
        draw_connectors(data, width, height, &hand.landmarks);
        draw_landmarks(data, width, height, &hand.landmarks);
    }
}

fn draw_connectors(data: &mut [u8], width: u32, height: u32, landmarks: &[Landmark]) {
    for &(a, b) in &HAND_CONNECTIONS {
        let (Some(from), Some(to)) = (landmarks.get(a), landmarks.get(b)) else {
            continue;
        };
        let from = to_pixel(from, width, height);
        let to = to_pixel(to, width, height);
        draw_line(data, width, height, from, to, CONNECTOR_COLOR);
    }
}

fn draw_landmarks(data: &mut [u8], width: u32, height: u32, landmarks: &[Landmark]) {
    for landmark in landmarks {
        let (cx, cy) = to_pixel(landmark, width, height);
        for dy in -LANDMARK_RADIUS..=LANDMARK_RADIUS {
            for dx in -LANDMARK_RADIUS..=LANDMARK_RADIUS {
                if dx * dx + dy * dy <= LANDMARK_RADIUS * LANDMARK_RADIUS {
                    set_pixel(data, width, height, cx + dx, cy + dy, LANDMARK_COLOR);
                }
            }
        }
    }
}

/// Normalized [0,1] coordinates to pixel coordinates.
fn to_pixel(landmark: &Landmark, width: u32, height: u32) -> (i64, i64) {
    (
        (landmark.x * width as f32) as i64,
        (landmark.y * height as f32) as i64,
    )
}

/// Bresenham line between two pixel coordinates.
///
/// Endpoints are clamped to just outside the frame rectangle first, so a
/// wild landmark coordinate cannot turn the walk into a near-unbounded
/// loop on the driver thread.
fn draw_line(
    data: &mut [u8],
    width: u32,
    height: u32,
    (x0, y0): (i64, i64),
    (x1, y1): (i64, i64),
    color: [u8; 3],
) {
    let (x0, y0) = clamp_endpoint(x0, y0, width, height);
    let (x1, y1) = clamp_endpoint(x1, y1, width, height);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        set_pixel(data, width, height, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Pull a pixel coordinate into [-1, width] x [-1, height] — one step
/// outside the frame, where `set_pixel` drops it.
fn clamp_endpoint(x: i64, y: i64, width: u32, height: u32) -> (i64, i64) {
    (
        x.clamp(-1, i64::from(width)),
        y.clamp(-1, i64::from(height)),
    )
}

/// Write one pixel, ignoring coordinates outside the buffer.
fn set_pixel(data: &mut [u8], width: u32, height: u32, x: i64, y: i64, color: [u8; 3]) {
    if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
        return;
    }
    let offset = ((y as usize) * (width as usize) + (x as usize)) * 3;
    if offset + 2 < data.len() {
        data[offset..offset + 3].copy_from_slice(&color);
    }
}
