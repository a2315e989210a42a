/*
	Street-level panorama crawl over a map tile range:
	1. convert the two bounding box corners (WGS84) to BD09
	2. enumerate the covered tiles at the configured zoom
	3. per tile: detect road pixels, thin them out, resolve scene ids
	4. per new scene: download the 2x8 slice grid and stitch the panorama
*/

#[path = "lib/coord.rs"]
pub mod coord;

#[path = "lib/detect.rs"]
pub mod detect;

#[path = "lib/store.rs"]
pub mod store;

#[path = "lib/pano.rs"]
pub mod pano;

#[path = "lib/runner.rs"]
pub mod runner;

use anyhow::{bail, Context};
use log::info;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::coord::coord::{gcj02_to_bd09, tile_range, wgs84_to_gcj02, Bd09, Wgs84};
use crate::pano::pano::{HttpTransport, PanoClient};
use crate::runner::runner::Crawler;
use crate::store::store::SceneStore;

#[derive(Debug)]
struct Arguments {
	ak: String,
	first_lng: f64,
	first_lat: f64,
	end_lng: f64,
	end_lat: f64,
	zoom: u32,
	output: String,
	panoid_file: String,
	delay_secs: u64,
	save_tiles: bool,
}

fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let args = parse_arguments()?;
	info!("args: {:?}", args);

	if args.ak.is_empty() {
		bail!("a Baidu API key (\"ak\") is required for the geoconv service");
	}
	if args.zoom < 1 || args.zoom > 20 {
		bail!("zoom {} is out of range 1..=20", args.zoom);
	}

	let first = to_bd09(Wgs84 { lng: args.first_lng, lat: args.first_lat });
	let end = to_bd09(Wgs84 { lng: args.end_lng, lat: args.end_lat });
	let tiles = tile_range(first, end, args.zoom);
	if tiles.is_empty() {
		bail!("the corners span no tiles at zoom {}", args.zoom);
	}
	info!("{} tiles to scan", tiles.len());

	let transport = HttpTransport::new()?;
	let client = PanoClient::new(&transport, &args.ak);
	let store = SceneStore::open(Path::new(&args.panoid_file))
		.with_context(|| format!("loading scene id log {}", args.panoid_file))?;
	info!("{} scene ids already in {}", store.len(), args.panoid_file);

	let mut crawler = Crawler::new(
		client,
		store,
		Path::new(&args.output),
		Duration::from_secs(args.delay_secs),
		args.save_tiles,
	);
	crawler.run(&tiles)?;

	return Ok(());
}

fn to_bd09(p: Wgs84) -> Bd09 {
	return gcj02_to_bd09(wgs84_to_gcj02(p));
}

fn parse_arguments() -> anyhow::Result<Arguments> {
	let args: Vec<String> = env::args().collect();
	let json_string: &String = &args.get(1).unwrap_or(&"{}".to_string()).to_string();
	let obj = &json::parse(json_string).context("arguments must be one JSON object")?;

	return Ok(Arguments {
		ak:          parse_str(obj, "ak", ""),
		first_lng:   parse_f64(obj, "first_lng", 120.63036),
		first_lat:   parse_f64(obj, "first_lat", 31.384998),
		end_lng:     parse_f64(obj, "end_lng", 120.644374),
		end_lat:     parse_f64(obj, "end_lat", 31.379819),
		zoom:        parse_u32(obj, "zoom", 19),
		output:      parse_str(obj, "output", "Images_output/By_Tile"),
		panoid_file: parse_str(obj, "panoid_file", "panoids.txt"),
		delay_secs:  parse_u64(obj, "delay_secs", 3),
		save_tiles:  obj["save_tiles"].as_bool().unwrap_or(true),
	});

	fn parse_str(obj: &json::JsonValue, name: &str, default: &str) -> String {
		return obj[name].as_str().unwrap_or(default).to_string();
	}

	fn parse_f64(obj: &json::JsonValue, name: &str, default: f64) -> f64 {
		return obj[name].as_f64().unwrap_or(default);
	}

	fn parse_u32(obj: &json::JsonValue, name: &str, default: u32) -> u32 {
		return obj[name].as_u32().unwrap_or(default);
	}

	fn parse_u64(obj: &json::JsonValue, name: &str, default: u64) -> u64 {
		return obj[name].as_u64().unwrap_or(default);
	}
}
