//! Transverse Mercator projection on an ellipsoid (Krüger series).
//!
//! Used for the Polish national grid PUWG 1992 (EPSG:2180):
//! `+proj=tmerc +lat_0=0 +lon_0=19 +k=0.9993 +x_0=500000 +y_0=-5300000 +ellps=GRS80`.
//! GRS80 and WGS84 coincide to well below a millimetre here, so no datum shift
//! is applied.

use std::f64::consts::FRAC_PI_4;

use geo::{Coord, Point};

/// GRS80 semi-major axis (m)
pub const GRS80_A: f64 = 6_378_137.0;
/// GRS80 flattening
pub const GRS80_F: f64 = 1.0 / 298.257_222_101;

const CONFORMAL_LATITUDE_TOLERANCE: f64 = 1e-14;
const CONFORMAL_LATITUDE_MAX_ITERATIONS: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct TransverseMercator {
    /// Central meridian (degrees)
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
    /// First eccentricity
    e: f64,
    /// Rectifying radius
    big_a: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
}

impl TransverseMercator {
    pub fn new(
        a: f64,
        f: f64,
        lon0: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let n = f / (2.0 - f);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let big_a = a / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0);

        let alpha = [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0
                - 127.0 * n5 / 288.0
                + 7891.0 * n6 / 37800.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0 + 281.0 * n5 / 630.0
                - 1983433.0 * n6 / 1935360.0,
            61.0 * n3 / 240.0 - 103.0 * n4 / 140.0
                + 15061.0 * n5 / 26880.0
                + 167603.0 * n6 / 181440.0,
            49561.0 * n4 / 161280.0 - 179.0 * n5 / 168.0 + 6601661.0 * n6 / 7257600.0,
            34729.0 * n5 / 80640.0 - 3418889.0 * n6 / 1995840.0,
            212378941.0 * n6 / 319334400.0,
        ];

        let beta = [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0 - 81.0 * n5 / 512.0
                + 96199.0 * n6 / 604800.0,
            n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0 + 46.0 * n5 / 105.0
                - 1118711.0 * n6 / 3870720.0,
            17.0 * n3 / 480.0 - 37.0 * n4 / 840.0 - 209.0 * n5 / 4480.0
                + 5569.0 * n6 / 90720.0,
            4397.0 * n4 / 161280.0 - 11.0 * n5 / 504.0 - 830251.0 * n6 / 7257600.0,
            4583.0 * n5 / 161280.0 - 108847.0 * n6 / 3991680.0,
            20648693.0 * n6 / 638668800.0,
        ];

        Self {
            lon0,
            k0,
            false_easting,
            false_northing,
            e: (f * (2.0 - f)).sqrt(),
            big_a,
            alpha,
            beta,
        }
    }

    /// PUWG 1992 / EPSG:2180
    pub fn puwg1992() -> Self {
        Self::new(GRS80_A, GRS80_F, 19.0, 0.9993, 500_000.0, -5_300_000.0)
    }

    /// Planar (easting, northing) to geographic `Point(lon, lat)` in degrees
    pub fn inverse(&self, coord: Coord<f64>) -> Point<f64> {
        let scale = self.k0 * self.big_a;
        let xi = (coord.y - self.false_northing) / scale;
        let eta = (coord.x - self.false_easting) / scale;

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, beta) in self.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let lat = self.geodetic_latitude(chi);
        let lon = self.lon0.to_radians() + eta_p.sinh().atan2(xi_p.cos());

        Point::new(lon.to_degrees(), lat.to_degrees())
    }

    /// Geographic `Point(lon, lat)` in degrees to planar (easting, northing)
    pub fn forward(&self, point: Point<f64>) -> Coord<f64> {
        let lat = point.y().to_radians();
        let dlon = (point.x() - self.lon0).to_radians();

        let chi = self.conformal_latitude(lat);
        let xi_p = chi.sin().atan2(chi.cos() * dlon.cos());
        let eta_p = (chi.cos() * dlon.sin()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, alpha) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        let scale = self.k0 * self.big_a;
        Coord {
            x: self.false_easting + scale * eta,
            y: self.false_northing + scale * xi,
        }
    }

    fn conformal_latitude(&self, lat: f64) -> f64 {
        let es = self.e * lat.sin();
        let ratio = ((1.0 - es) / (1.0 + es)).powf(self.e / 2.0);
        2.0 * ((FRAC_PI_4 + lat / 2.0).tan() * ratio).atan() - 2.0 * FRAC_PI_4
    }

    /// Invert the conformal latitude by fixed-point iteration
    fn geodetic_latitude(&self, chi: f64) -> f64 {
        let t = (FRAC_PI_4 + chi / 2.0).tan();
        let mut lat = chi;
        for _ in 0..CONFORMAL_LATITUDE_MAX_ITERATIONS {
            let es = self.e * lat.sin();
            let next = 2.0 * (t * ((1.0 + es) / (1.0 - es)).powf(self.e / 2.0)).atan()
                - 2.0 * FRAC_PI_4;
            let done = (next - lat).abs() < CONFORMAL_LATITUDE_TOLERANCE;
            lat = next;
            if done {
                break;
            }
        }
        lat
    }
}

impl Default for TransverseMercator {
    fn default() -> Self {
        Self::puwg1992()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let tm = TransverseMercator::puwg1992();
        let p = tm.inverse(Coord {
            x: 500_000.0,
            y: -5_300_000.0,
        });
        assert!((p.x() - 19.0).abs() < 1e-6, "lon {}", p.x());
        assert!(p.y().abs() < 1e-6, "lat {}", p.y());
    }

    #[test]
    fn test_central_meridian_52n() {
        // Meridian arc to 52°N on GRS80 is 5763343.6 m
        let tm = TransverseMercator::puwg1992();
        let p = tm.inverse(Coord {
            x: 500_000.0,
            y: 459_309.27,
        });
        assert!((p.x() - 19.0).abs() < 1e-9);
        assert!((p.y() - 52.0).abs() < 2e-6, "lat {}", p.y());

        let c = tm.forward(Point::new(19.0, 52.0));
        assert!((c.x - 500_000.0).abs() < 1e-6);
        assert!((c.y - 459_309.27).abs() < 0.25, "northing {}", c.y);
    }

    #[test]
    fn test_parcel_vertex_lands_in_poland() {
        let tm = TransverseMercator::puwg1992();
        let p = tm.inverse(Coord {
            x: 741_707.5,
            y: 382_851.1,
        });
        assert!(p.x() > 22.2 && p.x() < 22.8, "lon {}", p.x());
        assert!(p.y() > 50.8 && p.y() < 51.8, "lat {}", p.y());
    }

    #[test]
    fn test_round_trip() {
        let tm = TransverseMercator::puwg1992();
        for (lon, lat) in [(14.2, 53.9), (24.1, 49.0), (19.0, 50.0), (16.9, 52.4)] {
            let planar = tm.forward(Point::new(lon, lat));
            let back = tm.inverse(planar);
            assert!((back.x() - lon).abs() < 1e-9, "lon {} vs {}", back.x(), lon);
            assert!((back.y() - lat).abs() < 1e-9, "lat {} vs {}", back.y(), lat);
        }
    }

    #[test]
    fn test_east_of_meridian_has_larger_easting() {
        let tm = TransverseMercator::puwg1992();
        let west = tm.forward(Point::new(18.0, 51.0));
        let east = tm.forward(Point::new(20.0, 51.0));
        assert!(west.x < 500_000.0);
        assert!(east.x > 500_000.0);
        assert!((west.y - east.y).abs() < 1e-6);
    }
}
