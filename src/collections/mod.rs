//! Container types shared by the node tree and the rule library

mod ordered_map;

pub use ordered_map::OrderedMap;
