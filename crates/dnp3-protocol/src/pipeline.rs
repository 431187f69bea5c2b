//! The dissection pipeline: orchestrates frame synchronization, context
//! lookup, segment parsing, transport-function recognition, application
//! parsing, and event emission over each `feed` call.

use bytes::{Buf, BytesMut};
use tracing::warn;

use dnp3_core::constants::{DEFAULT_BUFLEN, DEFAULT_CTXMAX};
use dnp3_core::{LinkFunction, Result, Segment};

use crate::app::{AppOutcome, AppParser, DnpAppParser};
use crate::context::ContextTable;
use crate::link::{DnpLinkParser, LinkParser, SyncOutcome, synchronize};
use crate::segment::{DnpSegmentParser, SegmentParser};
use crate::sink::EventSink;
use crate::transport::tokens_for;

/// Construction-time bounds for a [`Dissector`]: how many `(src, dst)`
/// contexts to track ([`ContextTable`]) and how large each context's raw
/// buffer is. Set directly by the host embedding this crate; there is no
/// CLI or config-file layer.
#[derive(Debug, Clone, Copy)]
pub struct DissectorConfig {
    pub ctxmax: usize,
    pub buflen: usize,
}

impl Default for DissectorConfig {
    fn default() -> Self {
        Self {
            ctxmax: DEFAULT_CTXMAX,
            buflen: DEFAULT_BUFLEN,
        }
    }
}

/// The streaming DNP3 dissector. Owns the frame-synchronizer tail buffer,
/// the context table, and the three parser collaborators, and drives them
/// in sequence on every [`Dissector::feed`] call.
///
/// Generic over the link/segment/app parsers so tests can substitute
/// fakes; [`Dissector::new`] and [`Dissector::with_config`] wire up the
/// bundled concrete DNP3 parsers ([`DnpLinkParser`], [`DnpSegmentParser`],
/// [`DnpAppParser`]).
///
/// Not safe for concurrent use. A single instance is meant to be driven by
/// one caller at a time; nothing here is `Sync`.
pub struct Dissector<L, T, A, S> {
    link_parser: L,
    segment_parser: T,
    app_parser: A,
    sink: S,
    contexts: ContextTable,
    buf: BytesMut,
}

impl<S: EventSink> Dissector<DnpLinkParser, DnpSegmentParser, DnpAppParser, S> {
    /// Build a dissector with the default bounds ([`DissectorConfig::default`])
    /// and the bundled DNP3 parsers.
    pub fn new(sink: S) -> Result<Self> {
        Self::with_config(DissectorConfig::default(), sink)
    }

    pub fn with_config(config: DissectorConfig, sink: S) -> Result<Self> {
        Self::with_parsers(config, DnpLinkParser, DnpSegmentParser, DnpAppParser, sink)
    }
}

impl<L, T, A, S> Dissector<L, T, A, S>
where
    L: LinkParser,
    T: SegmentParser,
    A: AppParser,
    S: EventSink,
{
    pub fn with_parsers(
        config: DissectorConfig,
        link_parser: L,
        segment_parser: T,
        app_parser: A,
        sink: S,
    ) -> Result<Self> {
        Ok(Self {
            link_parser,
            segment_parser,
            app_parser,
            sink,
            contexts: ContextTable::new(config.ctxmax, config.buflen)?,
            buf: BytesMut::new(),
        })
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn contexts(&self) -> &ContextTable {
        &self.contexts
    }

    pub fn contexts_mut(&mut self) -> &mut ContextTable {
        &mut self.contexts
    }

    /// Feed raw bytes captured from the link medium. Synchronous and
    /// run-to-completion: recognizes as many complete frames as the
    /// buffered bytes allow, then returns, retaining any tail for the next
    /// call. Never fails — every data-plane condition becomes a sink event.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);

        loop {
            match synchronize(&self.link_parser, &self.buf) {
                SyncOutcome::Frame { frame, consumed } => {
                    let raw = self.buf[..consumed].to_vec();
                    self.buf.advance(consumed);
                    self.sink.link_frame(&frame, &raw);

                    let source = frame.source;
                    let destination = frame.destination;
                    match (frame.func, frame.payload) {
                        (LinkFunction::UnconfirmedUserData, Some(payload)) => {
                            self.process_user_data(source, destination, &payload, &raw);
                        }
                        (LinkFunction::UnconfirmedUserData, None) => {
                            // Data-block CRC failure: the link parser already
                            // reported this as an absent payload; nothing
                            // further to dissect for this frame.
                        }
                        (LinkFunction::ConfirmedUserData, _) => {
                            warn!(source, destination, "confirmed user data not supported, frame skipped");
                        }
                        _ => {}
                    }
                }
                SyncOutcome::NeedMoreData { skipped } => {
                    self.buf.advance(skipped);
                    break;
                }
            }
        }
    }

    fn process_user_data(&mut self, source: u16, destination: u16, payload: &[u8], raw: &[u8]) {
        let idx = self.contexts.lookup(source, destination);

        let Some(segment) = self.segment_parser.parse(payload) else {
            self.sink.transport_reject();
            return;
        };

        if !self.contexts.get_mut(idx).push_raw(raw) {
            warn!(
                source,
                destination,
                frame_len = raw.len(),
                "context raw buffer overflow, frame bytes dropped"
            );
        }

        self.feed_transport(idx, segment);
    }

    fn feed_transport(&mut self, idx: usize, segment: Segment) {
        let (t0, t1) = {
            let ctx = self.contexts.get(idx);
            tokens_for(&segment, ctx.last_segment.as_ref())
        };
        self.contexts.get_mut(idx).last_segment = Some(segment.clone());
        self.sink.transport_segment(&segment);

        for token in std::iter::once(t0).chain(t1) {
            let completed = self.contexts.get_mut(idx).tfun.step(token, &segment);
            if let Some(series_payload) = completed {
                if let Some(payload) = series_payload {
                    self.sink.transport_payload(&payload);
                    let raw_snapshot = self.contexts.get(idx).raw().to_vec();
                    self.dispatch_app(&payload, &raw_snapshot);
                }
                // A completed top-level alternative — valid series, invalid
                // series, or a trivial non-A token — always clears the raw
                // buffer.
                self.contexts.get_mut(idx).clear_raw();
            }
            self.contexts.get_mut(idx).tfun_pos += 1;
        }
    }

    fn dispatch_app(&mut self, payload: &[u8], raw: &[u8]) {
        match self.app_parser.parse(payload) {
            Some(AppOutcome::Fragment(fragment)) => self.sink.app_fragment(&fragment, raw),
            Some(AppOutcome::Error(kind)) => self.sink.app_error(kind),
            None => self.sink.app_reject(),
        }
    }
}
