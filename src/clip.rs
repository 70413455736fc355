use geo::{BooleanOps, Geometry, Intersects, MultiLineString, MultiPolygon, Rect};

use crate::data::feature::Feature;

/// Clip features to `bounds`. Features entirely outside are dropped; lines
/// and polygons crossing the edge are cut at it.
pub fn clip_features(features: Vec<Feature>, bounds: Rect<f64>) -> Vec<Feature> {
    let window = MultiPolygon::new(vec![bounds.to_polygon()]);
    features
        .into_iter()
        .filter_map(|feature| {
            let geometry = clip_geometry(feature.geometry, &window, &bounds)?;
            Some(Feature::new(geometry, feature.properties))
        })
        .collect()
}

fn clip_geometry(
    geometry: Geometry<f64>,
    window: &MultiPolygon<f64>,
    bounds: &Rect<f64>,
) -> Option<Geometry<f64>> {
    match geometry {
        Geometry::LineString(ls) => clip_lines(MultiLineString::new(vec![ls]), window),
        Geometry::MultiLineString(mls) => clip_lines(mls, window),
        Geometry::Polygon(p) => clip_areas(MultiPolygon::new(vec![p]), window),
        Geometry::MultiPolygon(mp) => clip_areas(mp, window),
        other => other.intersects(bounds).then_some(other),
    }
}

fn clip_lines(lines: MultiLineString<f64>, window: &MultiPolygon<f64>) -> Option<Geometry<f64>> {
    let mut clipped = window.clip(&lines, false);
    match clipped.0.len() {
        0 => None,
        1 => clipped.0.pop().map(Geometry::LineString),
        _ => Some(Geometry::MultiLineString(clipped)),
    }
}

fn clip_areas(areas: MultiPolygon<f64>, window: &MultiPolygon<f64>) -> Option<Geometry<f64>> {
    let mut clipped = areas.intersection(window);
    match clipped.0.len() {
        0 => None,
        1 => clipped.0.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(clipped)),
    }
}
