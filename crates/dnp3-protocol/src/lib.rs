pub mod app;
pub mod context;
pub mod crc;
pub mod link;
pub mod pipeline;
pub mod segment;
pub mod sink;
pub mod transport;

pub use app::{AppOutcome, AppParser, DnpAppParser};
pub use context::{Context, ContextTable};
pub use crc::{Crc16Dnp, crc16_dnp};
pub use link::{DnpLinkParser, LinkParser, LinkParseOutcome, SyncOutcome, synchronize};
pub use pipeline::{Dissector, DissectorConfig};
pub use segment::{DnpSegmentParser, SegmentParser};
pub use sink::{Event, EventSink, TracingSink, VecSink};
pub use transport::{Token, TransportRecognizer, classify, tokens_for};
