use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

pub type OsmId = u64;
pub type Tags = BTreeMap<String, String>;

/// Body of an Overpass `[out:json]` response. Only `elements` is used.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct OverpassResponse {
    pub elements: Vec<Element>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Node(Node),
    Way(Way),
    Relation(Relation),
    /// `area`, `count` and any other element type a query can return.
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    pub id: OsmId,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Way {
    pub id: OsmId,
    /// Empty for ways fetched with `out tags` or `out ids`.
    #[serde(default)]
    pub nodes: Vec<OsmId>,
    pub tags: Option<Tags>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: OsmId,
    #[serde(default)]
    pub members: Vec<Member>,
    pub tags: Option<Tags>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Member {
    #[serde(rename = "type")]
    pub member_type: MemberType,
    #[serde(rename = "ref")]
    pub member_ref: OsmId,
    #[serde(default)]
    pub role: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    Node,
    Way,
    Relation,
}

impl Element {
    /// Tags of ways and relations. Nodes carry none.
    pub fn tags(&self) -> Option<&Tags> {
        match self {
            Element::Node(_) | Element::Other => None,
            Element::Way(way) => way.tags.as_ref(),
            Element::Relation(relation) => relation.tags.as_ref(),
        }
    }
}

/// Node id to (lon, lat), scoped to one response.
#[derive(Debug, Default)]
pub struct NodeIndex {
    coords: HashMap<OsmId, geo::Coord<f64>>,
}

impl NodeIndex {
    pub fn new(elements: &[Element]) -> NodeIndex {
        let coords = elements
            .iter()
            .filter_map(|el| match el {
                Element::Node(node) => Some((node.id, geo::coord! { x: node.lon, y: node.lat })),
                _ => None,
            })
            .collect();
        NodeIndex { coords }
    }

    pub fn get(&self, id: OsmId) -> Option<geo::Coord<f64>> {
        self.coords.get(&id).copied()
    }

    /// Resolve node ids in order, dropping any that are not in the index.
    pub fn resolve(&self, ids: &[OsmId]) -> Vec<geo::Coord<f64>> {
        ids.iter().filter_map(|id| self.get(*id)).collect()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }
}

/// Way id to its node ids, used to resolve relation members.
#[derive(Debug, Default)]
pub struct WayIndex<'a> {
    ways: HashMap<OsmId, &'a [OsmId]>,
}

impl<'a> WayIndex<'a> {
    pub fn new(elements: &'a [Element]) -> WayIndex<'a> {
        let ways = elements
            .iter()
            .filter_map(|el| match el {
                Element::Way(way) => Some((way.id, way.nodes.as_slice())),
                _ => None,
            })
            .collect();
        WayIndex { ways }
    }

    pub fn get(&self, id: OsmId) -> Option<&'a [OsmId]> {
        self.ways.get(&id).copied()
    }
}
