
pub mod coord {

	// Baidu street view tiles address a BD09 Mercator plane. Getting there from
	// GPS coordinates takes the whole chain: WGS84 -> GCJ02 -> BD09 -> Mercator.

	const PI: f64 = std::f64::consts::PI;
	const X_PI: f64 = PI * 3000.0 / 180.0;
	const A: f64 = 6378245.0;
	const EE: f64 = 0.00669342162296594323;

	pub const TILE_SIZE: u32 = 256;

	// Latitude bands and correction rows of the BD09 Mercator projection.
	// Carried verbatim from the upstream tables; the tile grid only lines up
	// if these match bit for bit.
	const LLBAND: [f64; 6] = [75.0, 60.0, 45.0, 30.0, 15.0, 0.0];
	const LL2MC: [[f64; 10]; 6] = [
		[-0.0015702102444, 111320.7020616939, 1704480524535203.0, -10338987376042340.0, 26112667856603880.0,
			-35149669176653700.0, 26595700718403920.0, -10725012454188240.0, 1800819912950474.0, 82.5],
		[0.0008277824516172526, 111320.7020463578, 647795574.6671607, -4082003173.641316, 10774905663.51142,
			-15171875531.51559, 12053065338.62167, -5124939663.577472, 913311935.9512032, 67.5],
		[0.00337398766765, 111320.7020202162, 4481351.045890365, -23393751.19931662, 79682215.47186455,
			-115964993.2797253, 97236711.15602145, -43661946.33752821, 8477230.501135234, 52.5],
		[0.00220636496208, 111320.7020209128, 51751.86112841131, 3796837.749470245, 992013.7397791013,
			-1221952.21711287, 1340652.697009075, -620943.6990984312, 144416.9293806241, 37.5],
		[-0.0003441963504368392, 111320.7020576856, 278.2353980772752, 2485758.690035394, 6070.750963243378,
			54821.18345352118, 9540.606633304236, -2710.55326746645, 1405.483844121726, 22.5],
		[-0.0003218135878613132, 111320.7020701615, 0.00369383431289, 823725.6402795718, 0.46104986909093,
			2351.343141331292, 1.58060784298199, 8.77738589078284, 0.37238884252424, 7.45],
	];
	const MCBAND: [f64; 6] = [12890594.86, 8362377.87, 5591021.0, 3481989.83, 1678043.12, 0.0];
	const MC2LL: [[f64; 10]; 6] = [
		[1.410526172116255e-8, 0.00000898305509648872, -1.9939833816331, 200.9824383106796, -187.2403703815547,
			91.6087516669843, -23.38765649603339, 2.57121317296198, -0.03801003308653, 17337981.2],
		[-7.435856389565537e-9, 0.000008983055097726239, -0.78625201886289, 96.32687599759846, -1.85204757529826,
			-59.36935905485877, 47.40033549296737, -16.50741931063887, 2.28786674699375, 10260144.86],
		[-3.030883460898826e-8, 0.00000898305509983578, 0.30071316287616, 59.74293618442277, 7.357984074871,
			-25.38371002664745, 13.45380521110908, -3.29883767235584, 0.32710905363475, 6856817.37],
		[-1.981981304930552e-8, 0.000008983055099779535, 0.03278182852591, 40.31678527705744, 0.65659298677277,
			-4.44255534477492, 0.85341911805263, 0.12923347998204, -0.04625736007561, 4482777.06],
		[3.09191371068437e-9, 0.000008983055096812155, 0.00006995724062, 23.10934304144901, -0.00023663490511,
			-0.6321817810242, -0.00663494467273, 0.03430082397953, -0.00466043876332, 2555164.4],
		[2.890871144776878e-9, 0.000008983055095805407, -3.068298e-8, 7.47137025468032, -0.00000353937994,
			-0.02145144861037, -0.00001234426596, 0.00010322952773, -0.00000323890364, 826088.5],
	];

	#[derive(Debug, Clone, Copy, PartialEq)]
	pub struct Wgs84 {
		pub lng: f64,
		pub lat: f64,
	}

	#[derive(Debug, Clone, Copy, PartialEq)]
	pub struct Gcj02 {
		pub lng: f64,
		pub lat: f64,
	}

	#[derive(Debug, Clone, Copy, PartialEq)]
	pub struct Bd09 {
		pub lng: f64,
		pub lat: f64,
	}

	#[derive(Debug, Clone, Copy, PartialEq)]
	pub struct McPoint {
		pub x: f64,
		pub y: f64,
	}

	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct Tile {
		pub x: i64,
		pub y: i64,
		pub zoom: u32,
	}

	pub fn gcj02_to_bd09(p: Gcj02) -> Bd09 {
		let z = (p.lng * p.lng + p.lat * p.lat).sqrt() + 0.00002 * (p.lat * X_PI).sin();
		let theta = p.lat.atan2(p.lng) + 0.000003 * (p.lng * X_PI).cos();
		return Bd09 {
			lng: z * theta.cos() + 0.0065,
			lat: z * theta.sin() + 0.006,
		};
	}

	pub fn bd09_to_gcj02(p: Bd09) -> Gcj02 {
		let x = p.lng - 0.0065;
		let y = p.lat - 0.006;
		let z = (x * x + y * y).sqrt() - 0.00002 * (y * X_PI).sin();
		let theta = y.atan2(x) - 0.000003 * (x * X_PI).cos();
		return Gcj02 {
			lng: z * theta.cos(),
			lat: z * theta.sin(),
		};
	}

	pub fn wgs84_to_gcj02(p: Wgs84) -> Gcj02 {
		if out_of_china(p.lng, p.lat) {
			return Gcj02 { lng: p.lng, lat: p.lat };
		}
		let (dlng, dlat) = ellipsoid_offset(p.lng, p.lat);
		return Gcj02 {
			lng: p.lng + dlng,
			lat: p.lat + dlat,
		};
	}

	pub fn gcj02_to_wgs84(p: Gcj02) -> Wgs84 {
		if out_of_china(p.lng, p.lat) {
			return Wgs84 { lng: p.lng, lat: p.lat };
		}
		let (dlng, dlat) = ellipsoid_offset(p.lng, p.lat);
		return Wgs84 {
			lng: p.lng * 2.0 - (p.lng + dlng),
			lat: p.lat * 2.0 - (p.lat + dlat),
		};
	}

	pub fn out_of_china(lng: f64, lat: f64) -> bool {
		if lng < 72.004 || lng > 137.8347 {
			return true;
		}
		if lat < 0.8293 || lat > 55.8271 {
			return true;
		}
		return false;
	}

	// Shared core of the WGS84<->GCJ02 correction, evaluated at (lng, lat).
	fn ellipsoid_offset(lng: f64, lat: f64) -> (f64, f64) {
		let dlat = transform_lat(lng - 105.0, lat - 35.0);
		let dlng = transform_lng(lng - 105.0, lat - 35.0);
		let radlat = lat / 180.0 * PI;
		let magic = radlat.sin();
		let magic = 1.0 - EE * magic * magic;
		let sqrtmagic = magic.sqrt();
		return (
			(dlng * 180.0) / (A / sqrtmagic * radlat.cos() * PI),
			(dlat * 180.0) / ((A * (1.0 - EE)) / (magic * sqrtmagic) * PI),
		);
	}

	fn transform_lat(lng: f64, lat: f64) -> f64 {
		let mut ret = -100.0 + 2.0 * lng + 3.0 * lat + 0.2 * lat * lat
			+ 0.1 * lng * lat + 0.2 * lng.abs().sqrt();
		ret += (20.0 * (6.0 * lng * PI).sin() + 20.0 * (2.0 * lng * PI).sin()) * 2.0 / 3.0;
		ret += (20.0 * (lat * PI).sin() + 40.0 * (lat / 3.0 * PI).sin()) * 2.0 / 3.0;
		ret += (160.0 * (lat / 12.0 * PI).sin() + 320.0 * (lat * PI / 30.0).sin()) * 2.0 / 3.0;
		return ret;
	}

	fn transform_lng(lng: f64, lat: f64) -> f64 {
		let mut ret = 300.0 + lng + 2.0 * lat + 0.1 * lng * lng
			+ 0.1 * lng * lat + 0.1 * lng.abs().sqrt();
		ret += (20.0 * (6.0 * lng * PI).sin() + 20.0 * (2.0 * lng * PI).sin()) * 2.0 / 3.0;
		ret += (20.0 * (lng * PI).sin() + 40.0 * (lng / 3.0 * PI).sin()) * 2.0 / 3.0;
		ret += (150.0 * (lng / 12.0 * PI).sin() + 300.0 * (lng / 30.0 * PI).sin()) * 2.0 / 3.0;
		return ret;
	}

	pub fn bd09_to_mc(p: Bd09) -> McPoint {
		let lng = wrap(p.lng, -180.0, 180.0);
		let lat = clamp(p.lat, -74.0, 74.0);
		let (x, y) = convertor(lng, lat, &LL2MC[ll_band_index(lat)]);
		return McPoint { x, y };
	}

	pub fn mc_to_bd09(p: McPoint) -> Bd09 {
		let (lng, lat) = convertor(p.x, p.y, &MC2LL[mc_band_index(p.y.abs())]);
		return Bd09 { lng, lat };
	}

	// First band whose threshold the latitude meets, scanning the large
	// magnitudes first; the mirrored pass covers the southern hemisphere.
	pub fn ll_band_index(lat: f64) -> usize {
		for (i, band) in LLBAND.iter().enumerate() {
			if lat >= *band {
				return i;
			}
		}
		for (i, band) in LLBAND.iter().enumerate().rev() {
			if lat <= -*band {
				return i;
			}
		}
		return LLBAND.len() - 1;
	}

	fn mc_band_index(y_abs: f64) -> usize {
		for (i, band) in MCBAND.iter().enumerate() {
			if y_abs >= *band {
				return i;
			}
		}
		return MCBAND.len() - 1;
	}

	// Degree-6 polynomial in the normalized coordinate; the input signs
	// carry over to the output.
	fn convertor(x: f64, y: f64, c: &[f64; 10]) -> (f64, f64) {
		let mut out_x = c[0] + c[1] * x.abs();
		let n = y.abs() / c[9];
		let mut out_y = c[2];
		let mut power = 1.0;
		for coefficient in &c[3..9] {
			power *= n;
			out_y += coefficient * power;
		}
		if x < 0.0 {
			out_x = -out_x;
		}
		if y < 0.0 {
			out_y = -out_y;
		}
		return (out_x, out_y);
	}

	fn clamp(value: f64, low: f64, high: f64) -> f64 {
		return value.max(low).min(high);
	}

	fn wrap(mut value: f64, low: f64, high: f64) -> f64 {
		while value > high {
			value -= high - low;
		}
		while value < low {
			value += high - low;
		}
		return value;
	}

	// Mercator meters per tile pixel: 1.0 at zoom 18, doubling per level.
	pub fn resolution(zoom: u32) -> f64 {
		return (2.0_f64).powi(zoom as i32 - 18);
	}

	pub fn lng_to_tile_x(lng: f64, zoom: u32) -> i64 {
		let mc = bd09_to_mc(Bd09 { lng, lat: 0.0 });
		return (mc.x * resolution(zoom) / TILE_SIZE as f64).floor() as i64;
	}

	pub fn lat_to_tile_y(lat: f64, zoom: u32) -> i64 {
		let mc = bd09_to_mc(Bd09 { lng: 0.0, lat });
		return (mc.y * resolution(zoom) / TILE_SIZE as f64).floor() as i64;
	}

	pub fn lnglat_to_tile(p: Bd09, zoom: u32) -> Tile {
		return Tile {
			x: lng_to_tile_x(p.lng, zoom),
			y: lat_to_tile_y(p.lat, zoom),
			zoom,
		};
	}

	pub fn lng_to_pixel_x(lng: f64, zoom: u32) -> u32 {
		let tile_x = lng_to_tile_x(lng, zoom);
		let mc = bd09_to_mc(Bd09 { lng, lat: 0.0 });
		return (mc.x * resolution(zoom) - (tile_x * TILE_SIZE as i64) as f64).floor() as u32;
	}

	pub fn lat_to_pixel_y(lat: f64, zoom: u32) -> u32 {
		let tile_y = lat_to_tile_y(lat, zoom);
		let mc = bd09_to_mc(Bd09 { lng: 0.0, lat });
		return (mc.y * resolution(zoom) - (tile_y * TILE_SIZE as i64) as f64).floor() as u32;
	}

	pub fn lnglat_to_pixel(p: Bd09, zoom: u32) -> (u32, u32) {
		return (lng_to_pixel_x(p.lng, zoom), lat_to_pixel_y(p.lat, zoom));
	}

	pub fn pixel_to_lnglat(pixel_x: u32, pixel_y: u32, tile: Tile) -> Bd09 {
		let res = resolution(tile.zoom);
		return mc_to_bd09(McPoint {
			x: (tile.x * TILE_SIZE as i64 + pixel_x as i64) as f64 / res,
			y: (tile.y * TILE_SIZE as i64 + pixel_y as i64) as f64 / res,
		});
	}

	// Inclusive rectangle of tiles covering the box spanned by two corners,
	// row-major with x outermost. Corner order does not matter.
	pub fn tile_range(a: Bd09, b: Bd09, zoom: u32) -> Vec<Tile> {
		let t1 = lnglat_to_tile(a, zoom);
		let t2 = lnglat_to_tile(b, zoom);

		let mut tiles = Vec::new();
		for x in t1.x.min(t2.x)..=t1.x.max(t2.x) {
			for y in t1.y.min(t2.y)..=t1.y.max(t2.y) {
				tiles.push(Tile { x, y, zoom });
			}
		}
		return tiles;
	}

}
