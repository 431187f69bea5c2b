//! The event sink: the one-way interface the pipeline emits observed
//! units through.

use dnp3_core::{AppErrorKind, Fragment, Frame, Segment};

/// One emitted event, owned and self-contained — useful for a sink (like
/// [`VecSink`]) that wants to capture the whole sequence for later
/// inspection rather than react to each call immediately.
#[derive(Debug, Clone)]
pub enum Event {
    LinkFrame { frame: Frame, raw: Vec<u8> },
    TransportReject,
    TransportSegment(Segment),
    TransportPayload(Vec<u8>),
    AppFragment { fragment: Fragment, raw: Vec<u8> },
    AppError(AppErrorKind),
    AppReject,
}

/// Receives one-way notifications for every unit the pipeline recognizes or
/// rejects. None of these methods return a value to the pipeline.
pub trait EventSink {
    fn link_frame(&mut self, frame: &Frame, raw: &[u8]);
    fn transport_reject(&mut self);
    fn transport_segment(&mut self, segment: &Segment);
    fn transport_payload(&mut self, payload: &[u8]);
    fn app_fragment(&mut self, fragment: &Fragment, raw: &[u8]);
    fn app_error(&mut self, kind: AppErrorKind);
    fn app_reject(&mut self);
}

/// Captures every event in order; the sink of choice for tests.
#[derive(Debug, Default)]
pub struct VecSink {
    pub events: Vec<Event>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every payload emitted via `transport_payload`, in order.
    pub fn payloads(&self) -> Vec<&[u8]> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::TransportPayload(p) => Some(p.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// Every fragment emitted via `app_fragment`, in order.
    pub fn fragments(&self) -> Vec<&Fragment> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::AppFragment { fragment, .. } => Some(fragment),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for VecSink {
    fn link_frame(&mut self, frame: &Frame, raw: &[u8]) {
        self.events.push(Event::LinkFrame {
            frame: frame.clone(),
            raw: raw.to_vec(),
        });
    }

    fn transport_reject(&mut self) {
        self.events.push(Event::TransportReject);
    }

    fn transport_segment(&mut self, segment: &Segment) {
        self.events.push(Event::TransportSegment(segment.clone()));
    }

    fn transport_payload(&mut self, payload: &[u8]) {
        self.events.push(Event::TransportPayload(payload.to_vec()));
    }

    fn app_fragment(&mut self, fragment: &Fragment, raw: &[u8]) {
        self.events.push(Event::AppFragment {
            fragment: fragment.clone(),
            raw: raw.to_vec(),
        });
    }

    fn app_error(&mut self, kind: AppErrorKind) {
        self.events.push(Event::AppError(kind));
    }

    fn app_reject(&mut self) {
        self.events.push(Event::AppReject);
    }
}

/// Forwards every event to `tracing`, at the level its severity warrants.
/// No subscriber is installed here — wiring one up is a host concern.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn link_frame(&mut self, frame: &Frame, raw: &[u8]) {
        tracing::trace!(
            func = ?frame.func,
            source = frame.source,
            destination = frame.destination,
            len = raw.len(),
            "link frame"
        );
    }

    fn transport_reject(&mut self) {
        tracing::warn!("transport segment parse rejected");
    }

    fn transport_segment(&mut self, segment: &Segment) {
        tracing::debug!(fir = segment.fir, fin = segment.fin, seq = segment.seq, len = segment.len(), "transport segment");
    }

    fn transport_payload(&mut self, payload: &[u8]) {
        tracing::debug!(len = payload.len(), "transport payload reassembled");
    }

    fn app_fragment(&mut self, fragment: &Fragment, raw: &[u8]) {
        tracing::info!(kind = ?fragment.kind, function = fragment.function, len = raw.len(), "app fragment");
    }

    fn app_error(&mut self, kind: AppErrorKind) {
        tracing::warn!(?kind, "app parse yielded an error token");
    }

    fn app_reject(&mut self) {
        tracing::warn!("app parse rejected outright");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_captures_events_in_order() {
        let mut sink = VecSink::new();
        let segment = Segment::new(true, true, 0, vec![1, 2]);
        sink.transport_segment(&segment);
        sink.transport_payload(&[1, 2]);
        assert_eq!(sink.events.len(), 2);
        assert_eq!(sink.payloads(), vec![&[1, 2][..]]);
    }
}
