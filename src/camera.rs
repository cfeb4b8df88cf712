//! Headless map camera.
//!
//! The camera is the one piece of viewport state shared between user
//! gestures and the feed controller. Every mutation is published on a watch
//! channel, which is what the controller treats as the "viewport moved"
//! signal. Bounds are derived on demand with the Web Mercator projection
//! using 256 px tiles, the same convention slippy-map widgets use.

use std::f64::consts::PI;
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::Coord;
use crate::geo::{MAX_ZOOM, ViewportBounds};

const TILE_SIZE: f64 = 256.0;

/// Latitude where the square Web Mercator world ends.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub center: Coord,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
}

impl CameraState {
    pub fn bounds(&self) -> ViewportBounds {
        let (cx, cy) = project(self.center, self.zoom);
        let half_w = f64::from(self.width) / 2.0;
        let half_h = f64::from(self.height) / 2.0;

        let north_west = unproject(cx - half_w, cy - half_h, self.zoom);
        let south_east = unproject(cx + half_w, cy + half_h, self.zoom);

        ViewportBounds {
            west: north_west.lon.clamp(-180.0, 180.0),
            north: north_west.lat.clamp(-90.0, 90.0),
            east: south_east.lon.clamp(-180.0, 180.0),
            south: south_east.lat.clamp(-90.0, 90.0),
            zoom: self.zoom,
        }
    }
}

#[derive(Clone)]
pub struct Camera {
    state: Arc<watch::Sender<CameraState>>,
}

impl Camera {
    pub fn new(center: Coord, zoom: u8, width: u32, height: u32) -> Self {
        let (state, _) = watch::channel(CameraState {
            center: clamp_center(center),
            zoom: zoom.min(MAX_ZOOM),
            width: width.max(1),
            height: height.max(1),
        });

        Self {
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> CameraState {
        *self.state.borrow()
    }

    pub fn zoom(&self) -> u8 {
        self.state.borrow().zoom
    }

    pub fn center(&self) -> Coord {
        self.state.borrow().center
    }

    /// Bounds of the live viewport, computed at call time.
    pub fn bounds(&self) -> ViewportBounds {
        self.state().bounds()
    }

    pub fn subscribe(&self) -> watch::Receiver<CameraState> {
        self.state.subscribe()
    }

    /// Moves to `center` at `zoom`; zoom is clamped to the supported range.
    pub fn set_view(&self, center: Coord, zoom: u8) {
        self.state.send_modify(|state| {
            state.center = clamp_center(center);
            state.zoom = zoom.min(MAX_ZOOM);
        });
    }

    /// Drag gesture: shifts the view by a screen-space offset in pixels.
    pub fn pan_by(&self, dx: f64, dy: f64) {
        self.state.send_modify(|state| {
            let (x, y) = project(state.center, state.zoom);
            state.center = clamp_center(unproject(x + dx, y + dy, state.zoom));
        });
    }

    pub fn zoom_by(&self, delta: i16) {
        self.state.send_modify(|state| {
            let zoom = (i16::from(state.zoom) + delta).clamp(0, i16::from(MAX_ZOOM));
            state.zoom = zoom as u8;
        });
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.state.send_modify(|state| {
            state.width = width.max(1);
            state.height = height.max(1);
        });
    }
}

fn clamp_center(c: Coord) -> Coord {
    Coord {
        lat: c.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
        lon: c.lon.clamp(-180.0, 180.0),
    }
}

fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * f64::from(1u32 << zoom)
}

fn project(c: Coord, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let sin = c.lat.to_radians().sin().clamp(-0.9999, 0.9999);

    let x = (c.lon + 180.0) / 360.0 * size;
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI)) * size;
    (x, y)
}

fn unproject(x: f64, y: f64, zoom: u8) -> Coord {
    let size = world_size(zoom);
    let n = PI - 2.0 * PI * y / size;

    Coord {
        lat: n.sinh().atan().to_degrees(),
        lon: x / size * 360.0 - 180.0,
    }
}
