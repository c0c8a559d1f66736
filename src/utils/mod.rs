pub mod coercer;
pub mod encoder;
pub mod name_resolver;
pub mod normalizer;
pub mod type_matcher;
