pub mod bbox;
pub mod feature;
pub mod osm;
pub mod parsed;
