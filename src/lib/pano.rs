
pub mod pano {

	use image::RgbImage;
	use std::time::Duration;
	use thiserror::Error;

	use crate::coord::coord::{McPoint, Tile};

	// A panorama is served as two rows of eight slices at detail level 4.
	pub const SLICE_ROWS: u32 = 2;
	pub const SLICE_COLS: u32 = 8;
	const SLICE_DETAIL: u32 = 4;

	// The tile host rejects clients that do not look like the map frontend.
	const REFERER: &str = "https://map.baidu.com/";
	const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

	#[derive(Error, Debug)]
	pub enum CrawlError {
		#[error("transport failure: {0}")]
		Transport(String),
		#[error("unexpected payload: {0}")]
		Decode(String),
		#[error("image data: {0}")]
		Image(#[from] image::ImageError),
		#[error("no usable scene or coordinate in response")]
		Resolution,
		#[error("incomplete panorama: row 1 has {row1}/8 slices, row 2 has {row2}/8")]
		Incomplete { row1: usize, row2: usize },
		#[error("bad configuration: {0}")]
		Config(String),
		#[error(transparent)]
		Io(#[from] std::io::Error),
	}

	// The one capability the pipeline needs from the outside world. Tests
	// drive the whole crawl through fakes of this.
	pub trait Transport {
		fn fetch(&self, url: &str) -> Result<(u16, Vec<u8>), CrawlError>;
	}

	pub struct HttpTransport {
		client: reqwest::blocking::Client,
	}

	impl HttpTransport {
		pub fn new() -> Result<HttpTransport, CrawlError> {
			let client = reqwest::blocking::Client::builder()
				.timeout(Duration::from_secs(30))
				.build()
				.map_err(|e| CrawlError::Transport(e.to_string()))?;
			return Ok(HttpTransport { client });
		}
	}

	impl Transport for HttpTransport {
		fn fetch(&self, url: &str) -> Result<(u16, Vec<u8>), CrawlError> {
			let response = self
				.client
				.get(url)
				.header("Referer", REFERER)
				.header("User-Agent", USER_AGENT)
				.send()
				.map_err(|e| CrawlError::Transport(e.to_string()))?;
			let status = response.status().as_u16();
			let bytes = response
				.bytes()
				.map_err(|e| CrawlError::Transport(e.to_string()))?;
			return Ok((status, bytes.to_vec()));
		}
	}

	pub fn tile_url(tile: &Tile) -> String {
		return format!(
			"https://mapsv0.bdimg.com/tile/?udt=20200825&qt=tile&styles=pl&x={}&y={}&z={}",
			tile.x, tile.y, tile.zoom
		);
	}

	pub fn scene_url(position: &McPoint) -> String {
		return format!(
			"https://mapsv0.bdimg.com/?qt=qsdata&x={}&y={}&time=201709&mode=day",
			position.x, position.y
		);
	}

	pub fn geoconv_url(lng: f64, lat: f64, ak: &str) -> String {
		return format!(
			"http://api.map.baidu.com/geoconv/v1/?coords={},{}&from=1&to=6&output=json&ak={}",
			lng, lat, ak
		);
	}

	pub fn slice_url(sid: &str, row: u32, col: u32) -> String {
		return format!(
			"https://mapsv0.bdimg.com/?qt=pdata&sid={}&pos={}_{}&z={}",
			sid, row, col, SLICE_DETAIL
		);
	}

	pub struct PanoClient<'a> {
		transport: &'a dyn Transport,
		ak: String,
	}

	impl<'a> PanoClient<'a> {
		pub fn new(transport: &'a dyn Transport, ak: &str) -> PanoClient<'a> {
			return PanoClient { transport, ak: ak.to_string() };
		}

		pub fn fetch_tile(&self, tile: &Tile) -> Result<RgbImage, CrawlError> {
			let bytes = self.fetch_ok(&tile_url(tile))?;
			return Ok(image::load_from_memory(&bytes)?.to_rgb8());
		}

		// Baidu geoconv service: the only coordinate step that is not done
		// locally. status 0 is the service's sole success marker.
		pub fn geoconv(&self, lng: f64, lat: f64) -> Result<McPoint, CrawlError> {
			let obj = self.fetch_json(&geoconv_url(lng, lat, &self.ak))?;
			if obj["status"].as_i32() != Some(0) {
				return Err(CrawlError::Resolution);
			}
			let x = obj["result"][0]["x"].as_f64().ok_or(CrawlError::Resolution)?;
			let y = obj["result"][0]["y"].as_f64().ok_or(CrawlError::Resolution)?;
			return Ok(McPoint { x, y });
		}

		pub fn resolve_scene(&self, position: &McPoint) -> Result<String, CrawlError> {
			let obj = self.fetch_json(&scene_url(position))?;
			match obj["content"]["id"].as_str() {
				Some(sid) => return Ok(sid.to_string()),
				None => return Err(CrawlError::Resolution),
			}
		}

		pub fn fetch_slice(&self, sid: &str, row: u32, col: u32) -> Result<RgbImage, CrawlError> {
			let bytes = self.fetch_ok(&slice_url(sid, row, col))?;
			return Ok(image::load_from_memory(&bytes)?.to_rgb8());
		}

		fn fetch_ok(&self, url: &str) -> Result<Vec<u8>, CrawlError> {
			let (status, bytes) = self.transport.fetch(url)?;
			if status != 200 {
				return Err(CrawlError::Transport(format!("status {} from {}", status, url)));
			}
			return Ok(bytes);
		}

		fn fetch_json(&self, url: &str) -> Result<json::JsonValue, CrawlError> {
			let bytes = self.fetch_ok(url)?;
			let text = String::from_utf8(bytes)
				.map_err(|_| CrawlError::Decode("payload is not utf-8".to_string()))?;
			return json::parse(&text).map_err(|e| CrawlError::Decode(e.to_string()));
		}
	}

	// Slices collected for one scene, by row. Stitching refuses to run
	// until both rows are complete.
	pub struct SliceGrid {
		rows: [Vec<RgbImage>; 2],
	}

	pub struct Stitched {
		pub row1: RgbImage,
		pub row2: RgbImage,
		pub full: RgbImage,
	}

	impl SliceGrid {
		pub fn new() -> SliceGrid {
			return SliceGrid { rows: [Vec::new(), Vec::new()] };
		}

		pub fn push(&mut self, row: u32, slice: RgbImage) {
			self.rows[(row - 1) as usize].push(slice);
		}

		pub fn counts(&self) -> (usize, usize) {
			return (self.rows[0].len(), self.rows[1].len());
		}

		pub fn stitch(&self) -> Result<Stitched, CrawlError> {
			let (row1, row2) = self.counts();
			if row1 != SLICE_COLS as usize || row2 != SLICE_COLS as usize {
				return Err(CrawlError::Incomplete { row1, row2 });
			}
			let top = stitch_row(&self.rows[0]);
			let bottom = stitch_row(&self.rows[1]);
			let full = stack_rows(&top, &bottom);
			return Ok(Stitched { row1: top, row2: bottom, full });
		}
	}

	impl Default for SliceGrid {
		fn default() -> SliceGrid {
			return SliceGrid::new();
		}
	}

	// Left-to-right concatenation in column order.
	pub fn stitch_row(slices: &[RgbImage]) -> RgbImage {
		let width: u32 = slices.iter().map(|s| s.width()).sum();
		let height: u32 = slices.iter().map(|s| s.height()).max().unwrap_or(0);

		let mut row = RgbImage::new(width, height);
		let mut x_offset = 0;
		for slice in slices {
			for y in 0..slice.height() {
				for x in 0..slice.width() {
					row.put_pixel(x_offset + x, y, *slice.get_pixel(x, y));
				}
			}
			x_offset += slice.width();
		}
		return row;
	}

	// Top row above bottom row.
	pub fn stack_rows(top: &RgbImage, bottom: &RgbImage) -> RgbImage {
		let width = top.width().max(bottom.width());
		let height = top.height() + bottom.height();

		let mut full = RgbImage::new(width, height);
		for y in 0..top.height() {
			for x in 0..top.width() {
				full.put_pixel(x, y, *top.get_pixel(x, y));
			}
		}
		for y in 0..bottom.height() {
			for x in 0..bottom.width() {
				full.put_pixel(x, top.height() + y, *bottom.get_pixel(x, y));
			}
		}
		return full;
	}

}
