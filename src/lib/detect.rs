
pub mod detect {

	use image::RgbImage;

	// Road markers on the "pl" tile layer saturate the blue channel. The
	// threshold is the observed upstream cutoff, not a color-theory choice.
	const BLUE_THRESHOLD: u8 = 100;

	// Row-major scan, y before x. Downstream filtering is order-sensitive,
	// so this order is part of the contract.
	pub fn find_road_pixels(img: &RgbImage) -> Vec<(u32, u32)> {
		let mut pixels = Vec::new();
		for y in 0..img.height() {
			for x in 0..img.width() {
				if img.get_pixel(x, y)[2] > BLUE_THRESHOLD {
					pixels.push((y, x));
				}
			}
		}
		return pixels;
	}

	// Greedy thinning: a candidate survives only if it is farther than
	// min_distance from every earlier survivor. Not globally optimal, but
	// it has to stay this way to keep parity with the upstream scraper.
	pub fn filter_close_points(pixels: &[(u32, u32)], min_distance: f64) -> Vec<(u32, u32)> {
		let mut kept: Vec<(u32, u32)> = Vec::new();
		for &pixel in pixels {
			if kept.iter().all(|&p| distance(pixel, p) > min_distance) {
				kept.push(pixel);
			}
		}
		return kept;
	}

	fn distance(a: (u32, u32), b: (u32, u32)) -> f64 {
		let dy = a.0 as f64 - b.0 as f64;
		let dx = a.1 as f64 - b.1 as f64;
		return (dy * dy + dx * dx).sqrt();
	}

}
