//! A serialized per-endpoint channel: one dialect catalog, one outbound
//! sequence counter, one decoder, and (optionally) one signing key, wrapped
//! behind a single-threaded API so the state transitions that matter —
//! sequence increment, timestamp monotonicity, protocol upgrade — can never
//! race (`SPEC_FULL.md` §4.5). Grounded on the reference implementation's
//! `MavConnection` trait (`mavlink-core/src/connection/mod.rs`), stripped of
//! its socket/serial transport variants: a channel here is fed bytes and
//! handed bytes, never told how to move them.

use crate::decoder::{DecodeEvent, Decoder, SigRequest, SigVerdict};
use crate::dialect::{Catalog, MessageSpec};
use crate::encoder::{self, MessageKey};
use crate::error::{DecodeError, EncodeError};
use crate::record::{DecodedMessage, Protocol};
#[cfg(feature = "signing")]
use crate::signing::{SigningKey, SigningState};
use crate::stats::Statistics;
use crate::value::FieldMap;

/// A frame the application asked to send, along with the record that was
/// actually put on the wire (useful for logging/replay).
pub struct Sent {
    pub bytes: Vec<u8>,
}

/// Construction-time configuration for a [`Channel`] (`SPEC_FULL.md` §10.3):
/// a plain, directly constructible struct, no stringly-typed parsing layer.
#[derive(Clone)]
pub struct ChannelConfig {
    pub system_id: u8,
    pub component_id: u8,
    pub protocol: Protocol,
    /// Link id this channel identifies itself with when signing outbound
    /// frames and when bucketing inbound signing streams.
    pub link_id: u8,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            system_id: 1,
            component_id: 1,
            protocol: Protocol::V1,
            link_id: 0,
        }
    }
}

/// A decoded frame or a recoverable framing error, returned by [`Channel::feed`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Message(DecodedMessage),
    Error(DecodeError),
}

/// One endpoint of a MAVLink conversation: encodes outgoing records, decodes
/// incoming bytes, and keeps the bookkeeping (sequence, signing clock,
/// statistics) that both directions share.
pub struct Channel {
    catalog: Catalog,
    decoder: Decoder,
    config: ChannelConfig,
    sequence: u8,
    #[cfg(feature = "signing")]
    signing_key: Option<SigningKey>,
    #[cfg(feature = "signing")]
    signing_state: SigningState,
    #[cfg(feature = "signing")]
    accept_invalid_signature: Option<Box<dyn FnMut(SignatureContext) -> bool + Send>>,
    stats: Statistics,
    /// Collaborator-supplied error sink (`SPEC_FULL.md` §6 "report-error-sink"):
    /// notified of every encode/decode error in addition to it being returned
    /// from `encode`/`feed` directly, for applications that want a single
    /// place to log or forward framing anomalies without threading the
    /// return value through.
    error_sink: Option<Box<dyn FnMut(ChannelError) + Send>>,
}

/// Either side of the channel's fallible surface, handed to the error sink.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelError {
    Encode(EncodeError),
    Decode(DecodeError),
}

/// What an accept-signature predicate is told about a frame whose signature
/// failed cryptographic or timestamp verification.
#[cfg(feature = "signing")]
#[derive(Debug, Clone, Copy)]
pub struct SignatureContext {
    pub message_id: u32,
    pub system_id: u8,
    pub component_id: u8,
    pub link_id: u8,
    pub timestamp: u64,
}

impl Channel {
    pub fn new(catalog: Catalog, config: ChannelConfig) -> Self {
        Self {
            decoder: Decoder::new(catalog.clone()),
            catalog,
            config,
            sequence: 0,
            #[cfg(feature = "signing")]
            signing_key: None,
            #[cfg(feature = "signing")]
            signing_state: SigningState::default(),
            #[cfg(feature = "signing")]
            accept_invalid_signature: None,
            stats: Statistics::default(),
            error_sink: None,
        }
    }

    /// Installs a sink notified of every encode/decode error, in addition to
    /// it being returned normally from `encode`/`feed` (`SPEC_FULL.md` §6
    /// "report-error-sink"). Replaces any previously installed sink.
    pub fn set_error_sink<F>(&mut self, sink: F)
    where
        F: FnMut(ChannelError) + Send + 'static,
    {
        self.error_sink = Some(Box::new(sink));
    }

    /// Enables outbound signing and inbound signature verification with the
    /// given key. Frames already in flight are unaffected.
    #[cfg(feature = "signing")]
    pub fn configure_signing(&mut self, key: SigningKey) {
        self.signing_key = Some(key);
    }

    /// Disables signing entirely; inbound signed frames will be rejected
    /// unless an accept-predicate is configured to let them through anyway.
    #[cfg(feature = "signing")]
    pub fn disable_signing(&mut self) {
        self.signing_key = None;
    }

    /// Installs the predicate consulted when a signed inbound frame fails
    /// verification (bad crypto signature or a non-monotonic timestamp). A
    /// `true` result emits the frame anyway with `signature_valid: Some(false)`.
    #[cfg(feature = "signing")]
    pub fn set_accept_invalid_signature<F>(&mut self, predicate: F)
    where
        F: FnMut(SignatureContext) -> bool + Send + 'static,
    {
        self.accept_invalid_signature = Some(Box::new(predicate));
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn protocol(&self) -> Protocol {
        self.config.protocol
    }

    /// Changes the channel's outbound protocol version. Downgrading from v2
    /// to v1 after the channel has upgraded itself is forbidden (`SPEC_FULL.md`
    /// §4.5) since a peer that has already seen v2 frames may rely on them.
    pub fn set_protocol(&mut self, protocol: Protocol) -> Result<(), DecodeError> {
        if matches!(self.config.protocol, Protocol::V2) && matches!(protocol, Protocol::V1) {
            self.stats.bad_protocol += 1;
            return Err(DecodeError::BadProtocol);
        }
        self.config.protocol = protocol;
        Ok(())
    }

    fn message<'a>(&'a self, key: MessageKey) -> Result<&'a MessageSpec, EncodeError> {
        encoder::resolve(&self.catalog, &key)
    }

    /// Encodes and frames one record for sending, using the channel's current
    /// protocol, sequence, and identity. On success the sequence counter
    /// wraps modulo 256 and `frames_encoded` advances.
    pub fn encode(&mut self, key: MessageKey, fields: &FieldMap) -> Result<Sent, EncodeError> {
        let msg = match self.message(key) {
            Ok(msg) => msg,
            Err(err) => {
                match &err {
                    EncodeError::UnknownMessage(_) => self.stats.unknown_message += 1,
                    EncodeError::BadProtocol { .. } => self.stats.bad_protocol += 1,
                    _ => {}
                }
                if let Some(sink) = &mut self.error_sink {
                    sink(ChannelError::Encode(err.clone()));
                }
                return Err(err);
            }
        };

        #[cfg(feature = "signing")]
        let sign_outgoing = self.signing_key.is_some();
        #[cfg(not(feature = "signing"))]
        let sign_outgoing = false;
        let result = encoder::encode_frame(
            msg,
            fields,
            self.config.protocol,
            self.sequence,
            self.config.system_id,
            self.config.component_id,
            sign_outgoing,
        );
        let mut frame = match result {
            Ok(frame) => frame,
            Err(err) => {
                if matches!(err, EncodeError::BadProtocol { .. }) {
                    self.stats.bad_protocol += 1;
                }
                if let Some(sink) = &mut self.error_sink {
                    sink(ChannelError::Encode(err.clone()));
                }
                return Err(err);
            }
        };

        #[cfg(feature = "signing")]
        if frame.needs_signature {
            if let Some(key) = &self.signing_key {
                let timestamp = self.signing_state.next_outbound_timestamp();
                encoder::append_signature(&mut frame.bytes, key, self.config.link_id, timestamp);
            }
        }

        self.sequence = self.sequence.wrapping_add(1);
        self.stats.frames_encoded += 1;
        Ok(Sent { bytes: frame.bytes })
    }

    /// Feeds a chunk of bytes received from the peer, returning the decoded
    /// messages and framing errors produced along the way. A first
    /// successfully decoded v2 frame promotes the channel's protocol to v2
    /// if it was still v1 (`SPEC_FULL.md` §4.5).
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ChannelEvent> {
        #[cfg(feature = "signing")]
        let events = {
            let Channel {
                decoder,
                signing_state,
                signing_key,
                accept_invalid_signature,
                ..
            } = self;
            decoder.feed(bytes, move |request: SigRequest| {
                verify_signature(signing_key, signing_state, accept_invalid_signature, request)
            })
        };
        #[cfg(not(feature = "signing"))]
        let events = self
            .decoder
            .feed(bytes, |_request: SigRequest| SigVerdict::Rejected);

        let mut out = Vec::with_capacity(events.len());
        for event in events {
            match event {
                DecodeEvent::Frame(message) => {
                    self.stats.frames_decoded += 1;
                    if matches!(message.protocol, Protocol::V2)
                        && matches!(self.config.protocol, Protocol::V1)
                    {
                        self.config.protocol = Protocol::V2;
                    }
                    out.push(ChannelEvent::Message(message));
                }
                DecodeEvent::Error(err) => {
                    match &err {
                        DecodeError::UnknownMessage(_) => self.stats.unknown_message += 1,
                        DecodeError::BadChecksum { .. } => self.stats.bad_checksum += 1,
                        DecodeError::BadLength { .. } => self.stats.bad_length += 1,
                        DecodeError::BadSignature { .. } => self.stats.bad_signature += 1,
                        DecodeError::BadProtocol => self.stats.bad_protocol += 1,
                    }
                    if let Some(sink) = &mut self.error_sink {
                        sink(ChannelError::Decode(err.clone()));
                    }
                    out.push(ChannelEvent::Error(err));
                }
            }
        }
        out
    }
}

#[cfg(feature = "signing")]
fn verify_signature(
    signing_key: &Option<SigningKey>,
    signing_state: &mut SigningState,
    accept_invalid_signature: &mut Option<Box<dyn FnMut(SignatureContext) -> bool + Send>>,
    request: SigRequest,
) -> SigVerdict {
    let stream = (request.link_id, request.system_id, request.component_id);
    let timestamp_ok = signing_state.check_inbound_timestamp(stream, request.timestamp);
    let crypto_ok = signing_key.as_ref().is_some_and(|key| {
        crate::signing::compute_signature(key, request.signed_bytes, request.link_id, request.timestamp)
            == request.signature
    });

    if crypto_ok && timestamp_ok {
        // Only a cryptographically verified signature may advance the
        // replay baseline — an unauthenticated, forged timestamp must never
        // be committed, or it would permanently lock out every legitimate
        // frame on this stream (SPEC_FULL.md §9).
        signing_state.commit_inbound_timestamp(stream, request.timestamp);
        return SigVerdict::Valid;
    }

    let accepted = accept_invalid_signature
        .as_mut()
        .map(|predicate| {
            predicate(SignatureContext {
                message_id: request.message_id,
                system_id: request.system_id,
                component_id: request.component_id,
                link_id: request.link_id,
                timestamp: request.timestamp,
            })
        })
        .unwrap_or(false);

    if accepted {
        SigVerdict::AcceptedInvalid
    } else {
        SigVerdict::Rejected
    }
}
