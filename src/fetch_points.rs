/*
	Panorama fetch for a prepared list of WGS84 points (no tile scan):
	1. read the point list from a CSV export, header line skipped
	2. per point: convert to BD09 Mercator via the geoconv service
	3. resolve the scene id, skip anything already in the id log
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
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::pano::pano::{HttpTransport, PanoClient};
use crate::runner::runner::Crawler;
use crate::store::store::SceneStore;

#[derive(Debug)]
struct Arguments {
	ak: String,
	csv: String,
	lng_col: usize,
	lat_col: usize,
	output: String,
	panoid_file: String,
	delay_secs: u64,
}

fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let args = parse_arguments()?;
	info!("args: {:?}", args);

	if args.ak.is_empty() {
		bail!("a Baidu API key (\"ak\") is required for the geoconv service");
	}

	let text = fs::read_to_string(&args.csv)
		.with_context(|| format!("reading point list {}", args.csv))?;
	let points = parse_points(&text, args.lng_col, args.lat_col)?;
	if points.is_empty() {
		bail!("{} holds no points", args.csv);
	}
	info!("{} points to process", points.len());

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
		false,
	);
	crawler.run_points(&points)?;

	return Ok(());
}

// Plain comma splitting; the upstream exports carry no quoted fields.
fn parse_points(text: &str, lng_col: usize, lat_col: usize) -> anyhow::Result<Vec<(f64, f64)>> {
	let mut points = Vec::new();
	for (number, line) in text.lines().enumerate().skip(1) {
		if line.trim().is_empty() {
			continue;
		}
		let fields: Vec<&str> = line.split(',').collect();
		let lng = parse_field(&fields, lng_col, number)?;
		let lat = parse_field(&fields, lat_col, number)?;
		points.push((lng, lat));
	}
	return Ok(points);
}

fn parse_field(fields: &[&str], column: usize, line_number: usize) -> anyhow::Result<f64> {
	let raw = match fields.get(column) {
		Some(raw) => raw,
		None => bail!("line {} has no column {}", line_number + 1, column),
	};
	return raw
		.trim()
		.parse()
		.with_context(|| format!("line {}, column {}: not a number: {}", line_number + 1, column, raw));
}

fn parse_arguments() -> anyhow::Result<Arguments> {
	let args: Vec<String> = env::args().collect();
	let json_string: &String = &args.get(1).unwrap_or(&"{}".to_string()).to_string();
	let obj = &json::parse(json_string).context("arguments must be one JSON object")?;

	return Ok(Arguments {
		ak:          parse_str(obj, "ak", ""),
		csv:         parse_str(obj, "csv", "Data/converted_data.csv"),
		lng_col:     parse_usize(obj, "lng_col", 15),
		lat_col:     parse_usize(obj, "lat_col", 16),
		output:      parse_str(obj, "output", "Images_output/By_Point"),
		panoid_file: parse_str(obj, "panoid_file", "panoids.txt"),
		delay_secs:  parse_u64(obj, "delay_secs", 6),
	});

	fn parse_str(obj: &json::JsonValue, name: &str, default: &str) -> String {
		return obj[name].as_str().unwrap_or(default).to_string();
	}

	fn parse_usize(obj: &json::JsonValue, name: &str, default: usize) -> usize {
		return obj[name].as_usize().unwrap_or(default);
	}

	fn parse_u64(obj: &json::JsonValue, name: &str, default: u64) -> u64 {
		return obj[name].as_u64().unwrap_or(default);
	}
}
