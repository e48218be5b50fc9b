//! Raster basemap: XYZ tile math over web mercator and a background fetcher.

use std::collections::{HashMap, HashSet};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use reqwest::blocking::Client;

use crate::error::MapError;
use crate::layer::{LayerId, TileLayer};
use crate::map::View;
use crate::model::Extent;

pub const OSM_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Half the width of the EPSG:3857 world square, in metres.
pub const WORLD_HALF: f64 = 20_037_508.342_789_244;
pub const MAX_TILE_ZOOM: u8 = 19;
const WORKERS: usize = 4;
const MAX_CACHED: usize = 512;
const MAX_VISIBLE: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// A tile to paint. `extent` is where it lands on the map, which differs from
/// the tile's own bounds when the view crosses the antimeridian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleTile {
    pub id: TileId,
    pub extent: Extent,
}

fn tile_span(z: u8) -> f64 {
    2.0 * WORLD_HALF / f64::from(1u32 << z)
}

/// Tiles covering the view, at the zoom level nearest to the view's.
pub fn tile_range_for_view(view: &View, size: egui::Vec2) -> Vec<VisibleTile> {
    let z = view.zoom.round().clamp(0.0, f64::from(MAX_TILE_ZOOM)) as u8;
    let n = 1i64 << z;
    let span = tile_span(z);
    let extent = view.extent(size);
    if extent.is_empty() {
        return Vec::new();
    }
    let x0 = ((extent.min_x + WORLD_HALF) / span).floor() as i64;
    let x1 = ((extent.max_x + WORLD_HALF) / span).floor() as i64;
    let y0 = (((WORLD_HALF - extent.max_y) / span).floor() as i64).clamp(0, n - 1);
    let y1 = (((WORLD_HALF - extent.min_y) / span).floor() as i64).clamp(0, n - 1);

    let mut tiles = Vec::new();
    for y in y0..=y1 {
        for x in x0..=x1 {
            if tiles.len() >= MAX_VISIBLE {
                return tiles;
            }
            let min_x = x as f64 * span - WORLD_HALF;
            let max_y = WORLD_HALF - y as f64 * span;
            tiles.push(VisibleTile {
                id: TileId {
                    z,
                    x: x.rem_euclid(n) as u32,
                    y: y as u32,
                },
                extent: Extent::new(min_x, max_y - span, min_x + span, max_y),
            });
        }
    }
    tiles
}

/// Fills `{z}`, `{x}`, `{y}` and the `{s}` subdomain into a tile URL template.
pub fn tile_url(template: &str, id: TileId) -> String {
    let subdomain = ["a", "b", "c"][((id.x + id.y) % 3) as usize];
    template
        .replace("{z}", &id.z.to_string())
        .replace("{x}", &id.x.to_string())
        .replace("{y}", &id.y.to_string())
        .replace("{s}", subdomain)
}

fn fetch_tile(client: &Client, url: &str) -> Result<egui::ColorImage, MapError> {
    let response = client.get(url).send().map_err(|source| MapError::TileFetch {
        url: url.to_owned(),
        source,
    })?;
    if !response.status().is_success() {
        return Err(MapError::TileStatus {
            url: url.to_owned(),
            status: response.status(),
        });
    }
    let bytes = response.bytes().map_err(|source| MapError::TileFetch {
        url: url.to_owned(),
        source,
    })?;
    let rgba = image::load_from_memory(&bytes)?.into_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

pub enum TileState {
    Pending,
    Ready(egui::TextureHandle),
    Failed,
}

type TileRequest = (TileId, String);
type TileResult = (TileId, Result<egui::ColorImage, MapError>);

/// Downloads the tiles of one tile layer on worker threads and keeps them as textures.
pub struct TileCache {
    layer: LayerId,
    url_template: String,
    tiles: HashMap<TileId, TileState>,
    requests: Option<Sender<TileRequest>>,
    results: Receiver<TileResult>,
}

impl TileCache {
    pub fn new(ctx: &egui::Context, layer: &TileLayer, user_agent: &str) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<TileRequest>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<TileResult>();

        for worker in 0..WORKERS {
            let requests = request_rx.clone();
            let results = result_tx.clone();
            let ctx = ctx.clone();
            let user_agent = user_agent.to_owned();
            let spawned = thread::Builder::new()
                .name(format!("tile-fetch-{worker}"))
                .spawn(move || run_worker(&requests, &results, &ctx, &user_agent));
            if let Err(err) = spawned {
                log::error!("could not start tile worker: {err}");
            }
        }
        log::debug!("tile cache for layer {:?} from {}", layer.id, layer.url_template);

        Self {
            layer: layer.id,
            url_template: layer.url_template.clone(),
            tiles: HashMap::new(),
            requests: Some(request_tx),
            results: result_rx,
        }
    }

    /// The tile layer this cache paints.
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Current state of a tile, queueing a download the first time it is asked for.
    pub fn get(&mut self, id: TileId) -> &TileState {
        if !self.tiles.contains_key(&id) {
            if let Some(requests) = &self.requests {
                let url = tile_url(&self.url_template, id);
                if requests.send((id, url)).is_err() {
                    log::warn!("tile workers are gone, {id:?} not requested");
                }
            }
        }
        self.tiles.entry(id).or_insert(TileState::Pending)
    }

    /// Turns finished downloads into textures. Call once per frame.
    pub fn poll(&mut self, ctx: &egui::Context) {
        while let Ok((id, result)) = self.results.try_recv() {
            let state = match result {
                Ok(image) => {
                    let name = format!("tile-{}-{}-{}", id.z, id.x, id.y);
                    let options = egui::TextureOptions::LINEAR;
                    TileState::Ready(ctx.load_texture(name, image, options))
                }
                Err(err) => {
                    log::warn!("{err}");
                    TileState::Failed
                }
            };
            self.tiles.insert(id, state);
        }
    }

    /// Forgets tiles outside `keep` once the cache has grown large.
    pub fn trim(&mut self, keep: &[VisibleTile]) {
        if self.tiles.len() <= MAX_CACHED {
            return;
        }
        let keep: HashSet<TileId> = keep.iter().map(|t| t.id).collect();
        self.tiles.retain(|id, _| keep.contains(id));
    }
}

impl Drop for TileCache {
    fn drop(&mut self) {
        // Workers exit once the request channel closes.
        self.requests.take();
    }
}

fn run_worker(
    requests: &Receiver<TileRequest>,
    results: &Sender<TileResult>,
    ctx: &egui::Context,
    user_agent: &str,
) {
    let client = match Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(10))
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            log::error!("failed to build tile client: {err}");
            return;
        }
    };
    for (id, url) in requests.iter() {
        let result = fetch_tile(&client, &url);
        if results.send((id, result)).is_err() {
            return;
        }
        ctx.request_repaint();
    }
}
