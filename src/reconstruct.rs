use geo::{Intersects, LineString, MultiPolygon, Point, Polygon};
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::data::feature::{Feature, GeometryKind};
use crate::data::osm::{Element, MemberType, NodeIndex, OsmId, Relation, Way, WayIndex};

/// Smallest number of resolved points for a relation member to form a ring.
const MIN_RING_POINTS: usize = 3;

/// How relation members are arranged into a multipolygon.
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RingPolicy {
    /// Every member way becomes its own outer polygon; roles are ignored.
    #[default]
    Independent,
    /// Member ways are stitched into rings per role, and `inner` rings become
    /// holes of the outer polygon containing them.
    Roles,
}

/// Turns the flat node / way / relation graph of one response into features.
pub struct Reconstructor<'a> {
    nodes: NodeIndex,
    ways: WayIndex<'a>,
    kind: GeometryKind,
    attributes: &'a [String],
    ring_policy: RingPolicy,
    line_tags: &'a [String],
}

impl<'a> Reconstructor<'a> {
    pub fn new(
        elements: &'a [Element],
        kind: GeometryKind,
        attributes: &'a [String],
        ring_policy: RingPolicy,
    ) -> Reconstructor<'a> {
        Reconstructor {
            nodes: NodeIndex::new(elements),
            ways: WayIndex::new(elements),
            kind,
            attributes,
            ring_policy,
            line_tags: &[],
        }
    }

    /// Ways carrying any of these tag keys stay lines when polygons are
    /// requested, so a river is not closed into an area.
    pub fn with_line_tags(mut self, line_tags: &'a [String]) -> Reconstructor<'a> {
        self.line_tags = line_tags;
        self
    }

    fn is_line(&self, way: &Way) -> bool {
        way.tags
            .as_ref()
            .is_some_and(|tags| self.line_tags.iter().any(|key| tags.contains_key(key)))
    }

    /// Features in response order. Unresolvable references are dropped, so
    /// the result may be shorter than the element list, or empty.
    pub fn features(&self, elements: &[Element]) -> Vec<Feature> {
        let features: Vec<Feature> = elements
            .iter()
            .filter_map(|el| {
                let geometry = self.geometry(el)?;
                Some(Feature::new(geometry, self.properties(el)))
            })
            .collect();
        debug!(
            elements = elements.len(),
            nodes = self.nodes.len(),
            features = features.len();
            "Reconstructed geometries"
        );
        features
    }

    fn geometry(&self, element: &Element) -> Option<geo::Geometry<f64>> {
        match (element, self.kind) {
            (Element::Node(node), GeometryKind::Point) => {
                self.nodes.get(node.id).map(|c| Point::from(c).into())
            }
            (Element::Way(way), GeometryKind::Line) => {
                let coords = self.nodes.resolve(&way.nodes);
                (!coords.is_empty()).then(|| LineString::new(coords).into())
            }
            (Element::Way(way), GeometryKind::Polygon) if self.is_line(way) => {
                let coords = self.nodes.resolve(&way.nodes);
                (!coords.is_empty()).then(|| LineString::new(coords).into())
            }
            (Element::Way(way), GeometryKind::Polygon) => {
                let coords = self.nodes.resolve(&way.nodes);
                (!coords.is_empty()).then(|| Polygon::new(LineString::new(coords), vec![]).into())
            }
            (Element::Relation(relation), GeometryKind::Polygon) => {
                let polygons = match self.ring_policy {
                    RingPolicy::Independent => self.independent_polygons(relation),
                    RingPolicy::Roles => self.role_polygons(relation),
                };
                (!polygons.is_empty()).then(|| MultiPolygon::new(polygons).into())
            }
            _ => None,
        }
    }

    fn properties(&self, element: &Element) -> Map<String, Value> {
        let tags = element.tags();
        self.attributes
            .iter()
            .map(|name| {
                let value = tags
                    .and_then(|tags| tags.get(name))
                    .map(|v| Value::String(v.clone()))
                    .unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect()
    }

    fn member_ways<'r>(&self, relation: &'r Relation) -> Vec<(&'r str, &'a [OsmId])> {
        relation
            .members
            .iter()
            .filter(|m| m.member_type == MemberType::Way)
            .filter_map(|m| self.ways.get(m.member_ref).map(|nodes| (m.role.as_str(), nodes)))
            .collect()
    }

    fn independent_polygons(&self, relation: &Relation) -> Vec<Polygon<f64>> {
        self.member_ways(relation)
            .into_iter()
            .map(|(_role, way)| self.nodes.resolve(way))
            .filter(|coords| coords.len() >= MIN_RING_POINTS)
            .map(|coords| Polygon::new(LineString::new(coords), vec![]))
            .collect()
    }

    fn role_polygons(&self, relation: &Relation) -> Vec<Polygon<f64>> {
        let mut outer = vec![];
        let mut inner = vec![];
        for (role, way) in self.member_ways(relation) {
            if role == "inner" {
                inner.push(way.to_vec());
            } else {
                outer.push(way.to_vec());
            }
        }
        let mut polygons: Vec<Polygon<f64>> = self
            .resolve_rings(stitch_rings(outer))
            .into_iter()
            .map(|ring| Polygon::new(ring, vec![]))
            .collect();
        for ring in self.resolve_rings(stitch_rings(inner)) {
            let start = Point::from(ring.0[0]);
            match polygons.iter_mut().find(|p| p.intersects(&start)) {
                Some(polygon) => polygon.interiors_push(ring),
                None => debug!(relation = relation.id; "inner ring outside every outer ring"),
            }
        }
        polygons
    }

    fn resolve_rings(&self, rings: Vec<Vec<OsmId>>) -> Vec<LineString<f64>> {
        rings
            .into_iter()
            .map(|ring| self.nodes.resolve(&ring))
            .filter(|coords| coords.len() >= MIN_RING_POINTS)
            .map(LineString::new)
            .collect()
    }
}

/// Reconstruct features from one response in a single call.
pub fn reconstruct(
    elements: &[Element],
    kind: GeometryKind,
    attributes: &[String],
    ring_policy: RingPolicy,
) -> Vec<Feature> {
    Reconstructor::new(elements, kind, attributes, ring_policy).features(elements)
}

/// Join open ways sharing end nodes into closed rings.
///
/// Ways already closed are rings on their own. A chain that cannot be closed
/// is discarded.
fn stitch_rings(ways: Vec<Vec<OsmId>>) -> Vec<Vec<OsmId>> {
    let mut rings = vec![];
    let mut open = vec![];
    for way in ways.into_iter().filter(|w| w.len() > 1) {
        if way.first() == way.last() {
            rings.push(way);
        } else {
            open.push(way);
        }
    }
    while let Some(mut chain) = open.pop() {
        loop {
            let (head, tail) = match (chain.first(), chain.last()) {
                (Some(h), Some(t)) => (*h, *t),
                _ => break,
            };
            if head == tail {
                rings.push(chain);
                break;
            }
            let next = open
                .iter()
                .position(|w| w.first() == Some(&tail) || w.last() == Some(&tail));
            match next {
                Some(i) => {
                    let mut way = open.swap_remove(i);
                    if way.last() == Some(&tail) {
                        way.reverse();
                    }
                    chain.pop();
                    chain.extend(way);
                }
                None => {
                    debug!(head = head, tail = tail; "unclosed ring discarded");
                    break;
                }
            }
        }
    }
    rings
}
