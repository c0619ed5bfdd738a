//! Seams between the session and its collaborators.
//!
//! The lower layer implements [`Transport`] and calls the session's
//! `on_*` methods when it has something to report. The layer above receives
//! [`McsEvent`]s through an [`EventSink`] injected at construction.

use bytes::Bytes;

use super::channel::McsChannelInfo;
use super::error::SessionError;

/// Duplex byte stream under the MCS layer (X.224 / TPKT).
///
/// Writes are fire-and-forget; failures come back through the session's
/// `on_error` notification.
pub trait Transport {
    /// Queue one PDU for transmission.
    fn write(&mut self, data: Bytes);

    /// Close the stream.
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: Bytes) {
        (**self).write(data);
    }

    fn close(&mut self) {
        (**self).close();
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: Bytes) {
        (**self).write(data);
    }

    fn close(&mut self) {
        (**self).close();
    }
}

/// Notifications delivered to the layer above.
#[derive(Debug)]
pub enum McsEvent {
    /// Every channel is joined.
    Connected {
        /// User channel id assigned by the server
        user_id: u16,
        /// Joined channels in join order
        channels: Vec<McsChannelInfo>,
    },
    /// Inbound PDU received after the session connected.
    Data(Bytes),
    /// The session failed; no further events except [`McsEvent::Close`].
    Error(SessionError),
    /// The session is closed.
    Close,
}

impl McsEvent {
    /// Short event name, handy for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connect",
            Self::Data(_) => "data",
            Self::Error(_) => "error",
            Self::Close => "close",
        }
    }
}

/// Receiver of [`McsEvent`]s.
pub trait EventSink {
    /// Deliver one event.
    fn emit(&mut self, event: McsEvent);
}

impl<F> EventSink for F
where
    F: FnMut(McsEvent),
{
    fn emit(&mut self, event: McsEvent) {
        (*self)(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Vec<Bytes>, bool);

    impl Transport for Recorder {
        fn write(&mut self, data: Bytes) {
            self.0.push(data);
        }

        fn close(&mut self) {
            self.1 = true;
        }
    }

    fn write_through(transport: &mut impl Transport) {
        transport.write(Bytes::from_static(&[0x28]));
        transport.close();
    }

    #[test]
    fn test_transport_by_reference() {
        let mut recorder = Recorder(Vec::new(), false);
        write_through(&mut &mut recorder);

        assert_eq!(recorder.0, vec![Bytes::from_static(&[0x28])]);
        assert!(recorder.1);
    }

    #[test]
    fn test_closure_sink() {
        let mut names = Vec::new();
        let mut sink = |event: McsEvent| names.push(event.name());
        sink.emit(McsEvent::Data(Bytes::new()));
        sink.emit(McsEvent::Close);

        assert_eq!(names, vec!["data", "close"]);
    }
}
