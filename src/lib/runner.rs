
pub mod runner {

	use log::{info, warn};
	use std::fs::create_dir_all;
	use std::path::{Path, PathBuf};
	use std::thread::sleep;
	use std::time::Duration;

	use crate::coord::coord::{pixel_to_lnglat, resolution, Tile};
	use crate::detect::detect::{filter_close_points, find_road_pixels};
	use crate::pano::pano::{CrawlError, PanoClient, SliceGrid, SLICE_COLS, SLICE_ROWS};
	use crate::store::store::SceneStore;

	// Output layout under one root: raw tiles, raw slices, stitched rows,
	// final panoramas.
	pub struct OutputDirs {
		root: PathBuf,
	}

	impl OutputDirs {
		pub fn new(root: &Path) -> OutputDirs {
			return OutputDirs { root: PathBuf::from(root) };
		}

		pub fn prepare(&self) -> std::io::Result<()> {
			create_dir_all(self.tiles())?;
			create_dir_all(self.slices())?;
			create_dir_all(self.rows())?;
			create_dir_all(self.finals())?;
			return Ok(());
		}

		pub fn tiles(&self) -> PathBuf {
			return self.root.join("tiles");
		}

		pub fn slices(&self) -> PathBuf {
			return self.root.join("slices");
		}

		pub fn rows(&self) -> PathBuf {
			return self.root.join("rows");
		}

		pub fn finals(&self) -> PathBuf {
			return self.root.join("final");
		}
	}

	pub struct Crawler<'a> {
		client: PanoClient<'a>,
		store: SceneStore,
		out: OutputDirs,
		delay: Duration,
		save_tiles: bool,
	}

	impl<'a> Crawler<'a> {
		pub fn new(
			client: PanoClient<'a>,
			store: SceneStore,
			output_root: &Path,
			delay: Duration,
			save_tiles: bool,
		) -> Crawler<'a> {
			return Crawler {
				client,
				store,
				out: OutputDirs::new(output_root),
				delay,
				save_tiles,
			};
		}

		// Tile-driven crawl. Per-tile failures are logged and skipped; only
		// a degenerate configuration aborts.
		pub fn run(&mut self, tiles: &[Tile]) -> Result<(), CrawlError> {
			if tiles.is_empty() {
				return Err(CrawlError::Config("empty tile range".to_string()));
			}
			self.out.prepare()?;

			for (i, tile) in tiles.iter().enumerate() {
				info!(
					"tile ({}, {}) - {} of {}, {} remaining",
					tile.x,
					tile.y,
					i + 1,
					tiles.len(),
					tiles.len() - i - 1
				);
				if let Err(e) = self.crawl_tile(tile) {
					warn!("tile ({}, {}) skipped: {}", tile.x, tile.y, e);
				}
			}
			return Ok(());
		}

		// Point-driven crawl over WGS84 positions from a prepared list.
		pub fn run_points(&mut self, points: &[(f64, f64)]) -> Result<(), CrawlError> {
			if points.is_empty() {
				return Err(CrawlError::Config("empty point list".to_string()));
			}
			self.out.prepare()?;

			for (i, &(lng, lat)) in points.iter().enumerate() {
				info!("point {} of {}", i + 1, points.len());
				if let Err(e) = self.process_position(lng, lat) {
					warn!("point ({}, {}) skipped: {}", lng, lat, e);
				}
				sleep(self.delay);
			}
			return Ok(());
		}

		pub fn crawl_tile(&mut self, tile: &Tile) -> Result<(), CrawlError> {
			let img = self.client.fetch_tile(tile)?;
			if self.save_tiles {
				let path = self
					.out
					.tiles()
					.join(format!("{}_{}_{}.png", tile.x, tile.y, tile.zoom));
				img.save(&path)?;
			}

			let candidates = find_road_pixels(&img);
			if candidates.is_empty() {
				return Ok(());
			}
			let survivors = filter_close_points(&candidates, resolution(tile.zoom) * 35.0);
			info!(
				"tile ({}, {}): {} road pixels, {} after spacing filter",
				tile.x,
				tile.y,
				candidates.len(),
				survivors.len()
			);

			for (pixel_y, pixel_x) in survivors {
				let position = pixel_to_lnglat(pixel_x, pixel_y, *tile);
				if let Err(e) = self.process_position(position.lng, position.lat) {
					warn!(
						"pixel ({}, {}) on tile ({}, {}) skipped: {}",
						pixel_x, pixel_y, tile.x, tile.y, e
					);
				}
				sleep(self.delay);
			}
			return Ok(());
		}

		// One position: convert, resolve, dedup, and fetch. Returns Ok for
		// an already-seen scene; that is a normal outcome, not an error.
		pub fn process_position(&mut self, lng: f64, lat: f64) -> Result<(), CrawlError> {
			let position = self.client.geoconv(lng, lat)?;
			let sid = self.client.resolve_scene(&position)?;
			if !self.store.insert(&sid)? {
				info!("scene {} already fetched", sid);
				return Ok(());
			}
			info!("scene {} at ({}, {})", sid, lng, lat);
			return self.grab_pano(lng, lat, &sid);
		}

		// Download all slices, then stitch. Missing slices are logged and
		// left out; the completeness gate in the stitcher decides whether
		// the panorama survives.
		fn grab_pano(&mut self, lng: f64, lat: f64, sid: &str) -> Result<(), CrawlError> {
			let mut grid = SliceGrid::new();
			for row in 1..=SLICE_ROWS {
				for col in 0..SLICE_COLS {
					match self.client.fetch_slice(sid, row, col) {
						Ok(slice) => {
							let path = self.out.slices().join(format!(
								"{}_{}_{}_{}_{}.png",
								lng, lat, sid, row, col
							));
							slice.save(&path)?;
							grid.push(row, slice);
						}
						Err(e) => {
							warn!("slice {}_{} of {} missing: {}", row, col, sid, e);
						}
					}
				}
			}

			let stitched = grid.stitch()?;
			stitched
				.row1
				.save(self.out.rows().join(format!("{}_{}_{}_row1.png", lng, lat, sid)))?;
			stitched
				.row2
				.save(self.out.rows().join(format!("{}_{}_{}_row2.png", lng, lat, sid)))?;

			let final_path = self
				.out
				.finals()
				.join(format!("{}_{}_{}_final.png", lng, lat, sid));
			stitched.full.save(&final_path)?;
			info!(
				"panorama {} stitched ({}x{}) -> {}",
				sid,
				stitched.full.width(),
				stitched.full.height(),
				final_path.display()
			);
			return Ok(());
		}
	}

	#[cfg(test)]
	mod tests {
		use super::*;
		use crate::pano::pano::Transport;
		use image::{Rgb, RgbImage};
		use std::cell::RefCell;
		use std::fs;
		use std::io::Cursor;

		fn png_bytes(img: &RgbImage) -> Vec<u8> {
			let mut buffer = Cursor::new(Vec::new());
			image::DynamicImage::ImageRgb8(img.clone())
				.write_to(&mut buffer, image::ImageOutputFormat::Png)
				.unwrap();
			return buffer.into_inner();
		}

		struct FakeBaidu {
			tile: Vec<u8>,
			slice: Vec<u8>,
			sid: &'static str,
			requests: RefCell<Vec<String>>,
		}

		impl FakeBaidu {
			fn new(tile_img: &RgbImage) -> FakeBaidu {
				return FakeBaidu {
					tile: png_bytes(tile_img),
					slice: png_bytes(&RgbImage::from_pixel(4, 2, Rgb([1, 2, 3]))),
					sid: "0900220012SCENE",
					requests: RefCell::new(Vec::new()),
				};
			}

			fn count(&self, marker: &str) -> usize {
				return self
					.requests
					.borrow()
					.iter()
					.filter(|url| url.contains(marker))
					.count();
			}
		}

		impl Transport for FakeBaidu {
			fn fetch(&self, url: &str) -> Result<(u16, Vec<u8>), CrawlError> {
				self.requests.borrow_mut().push(url.to_string());
				if url.contains("qt=tile") {
					return Ok((200, self.tile.clone()));
				}
				if url.contains("geoconv") {
					let body = r#"{"status":0,"result":[{"x":13441968.22,"y":3680733.45}]}"#;
					return Ok((200, body.as_bytes().to_vec()));
				}
				if url.contains("qt=qsdata") {
					let body = format!(r#"{{"content":{{"id":"{}"}}}}"#, self.sid);
					return Ok((200, body.into_bytes()));
				}
				if url.contains("qt=pdata") {
					return Ok((200, self.slice.clone()));
				}
				return Ok((404, Vec::new()));
			}
		}

		fn scratch_root(name: &str) -> std::path::PathBuf {
			let root = std::env::temp_dir()
				.join(format!("bdpano_runner_{}_{}", std::process::id(), name));
			let _ = fs::remove_dir_all(&root);
			return root;
		}

		fn crawler<'a>(fake: &'a FakeBaidu, root: &Path, store: SceneStore) -> Crawler<'a> {
			let client = PanoClient::new(fake, "test-ak");
			return Crawler::new(client, store, root, Duration::ZERO, false);
		}

		#[test]
		fn blank_tile_triggers_no_lookups() {
			let fake = FakeBaidu::new(&RgbImage::new(16, 16));
			let root = scratch_root("blank");
			let mut crawler = crawler(&fake, &root, SceneStore::in_memory());

			crawler.run(&[Tile { x: 99, y: 88, zoom: 19 }]).unwrap();

			assert_eq!(fake.count("qt=tile"), 1);
			assert_eq!(fake.count("geoconv"), 0);
			assert_eq!(fake.count("qt=qsdata"), 0);
			assert_eq!(fake.count("qt=pdata"), 0);

			let _ = fs::remove_dir_all(&root);
		}

		#[test]
		fn known_scene_triggers_no_slice_fetches() {
			let mut tile_img = RgbImage::new(16, 16);
			tile_img.put_pixel(8, 8, Rgb([0, 0, 255]));
			let fake = FakeBaidu::new(&tile_img);
			let root = scratch_root("deduped");

			let mut store = SceneStore::in_memory();
			store.insert(fake.sid).unwrap();
			let mut crawler = crawler(&fake, &root, store);

			crawler.run(&[Tile { x: 99, y: 88, zoom: 19 }]).unwrap();

			assert_eq!(fake.count("qt=qsdata"), 1);
			assert_eq!(fake.count("qt=pdata"), 0);

			let _ = fs::remove_dir_all(&root);
		}

		#[test]
		fn new_scene_is_fetched_and_stitched() {
			let mut tile_img = RgbImage::new(16, 16);
			tile_img.put_pixel(8, 8, Rgb([0, 0, 255]));
			let fake = FakeBaidu::new(&tile_img);
			let root = scratch_root("stitched");
			let mut crawler = crawler(&fake, &root, SceneStore::in_memory());

			crawler.run(&[Tile { x: 99, y: 88, zoom: 19 }]).unwrap();

			assert_eq!(fake.count("qt=pdata"), 16);

			let finals: Vec<_> = fs::read_dir(root.join("final"))
				.unwrap()
				.map(|entry| entry.unwrap().path())
				.collect();
			assert_eq!(finals.len(), 1);
			let pano = image::open(&finals[0]).unwrap().to_rgb8();
			assert_eq!((pano.width(), pano.height()), (32, 4));

			assert_eq!(
				fs::read_dir(root.join("slices")).unwrap().count(),
				16
			);
			assert_eq!(fs::read_dir(root.join("rows")).unwrap().count(), 2);

			let _ = fs::remove_dir_all(&root);
		}

		#[test]
		fn second_visit_is_deduplicated() {
			let mut tile_img = RgbImage::new(16, 16);
			tile_img.put_pixel(8, 8, Rgb([0, 0, 255]));
			let fake = FakeBaidu::new(&tile_img);
			let root = scratch_root("revisit");
			let mut crawler = crawler(&fake, &root, SceneStore::in_memory());

			let tiles = [
				Tile { x: 99, y: 88, zoom: 19 },
				Tile { x: 99, y: 88, zoom: 19 },
			];
			crawler.run(&tiles).unwrap();

			// Second pass resolves the same scene but never re-fetches it.
			assert_eq!(fake.count("qt=qsdata"), 2);
			assert_eq!(fake.count("qt=pdata"), 16);

			let _ = fs::remove_dir_all(&root);
		}

		#[test]
		fn empty_tile_range_is_a_configuration_error() {
			let fake = FakeBaidu::new(&RgbImage::new(16, 16));
			let root = scratch_root("empty");
			let mut crawler = crawler(&fake, &root, SceneStore::in_memory());

			assert!(matches!(
				crawler.run(&[]),
				Err(CrawlError::Config(_))
			));
		}
	}
}
