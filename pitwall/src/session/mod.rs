//! Session descriptor parsing.
//!
//! Alongside the per-tick numeric stream the simulator publishes a YAML
//! descriptor blob: driver roster, weekend/track metadata, per-session rules
//! and results. It changes only a few times per session, so the parser
//! caches its output keyed by the session-unique id and only re-parses when
//! the raw text actually differs.

mod model;
mod parser;

pub use model::{
    DriverEntry, ParsedDescriptor, ResultPosition, SectorDescriptor, SessionDescriptor,
    SessionDetail, TireSetup, WeekendDescriptor,
};
pub use parser::DescriptorParser;
