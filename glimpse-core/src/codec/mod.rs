//! tokio_util codecs for the mirroring wire protocol.
//!
//! The protocol is asymmetric: each direction of the stream carries a
//! different frame type, so each endpoint gets its own codec pair.
//!
//! - [`RequesterCodec`] — writes [`ViewportRequest`]s, reads
//!   [`ImagePayload`]s.
//! - [`ResponderCodec`] — reads [`ViewportRequest`]s, writes
//!   [`ImagePayload`]s.
//!
//! A peer that closes the stream mid-frame surfaces as a
//! [`GlimpseError::ShortFrame`] from `decode_eof`, never as a silently
//! truncated payload.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::GlimpseError;
use crate::payload::{ImagePayload, MAX_PAYLOAD_SIZE};
use crate::request::ViewportRequest;

// ── Shared decode helpers ────────────────────────────────────────

fn decode_request(src: &mut BytesMut) -> Result<Option<ViewportRequest>, GlimpseError> {
    if src.len() < ViewportRequest::SIZE {
        return Ok(None);
    }
    let frame = src.split_to(ViewportRequest::SIZE);
    Ok(Some(ViewportRequest::decode(&frame)?))
}

fn decode_payload(src: &mut BytesMut) -> Result<Option<ImagePayload>, GlimpseError> {
    if src.len() < ImagePayload::LEN_PREFIX {
        return Ok(None);
    }

    let len = u32::from_be_bytes(src[..4].try_into().unwrap()) as usize;
    if len > MAX_PAYLOAD_SIZE {
        return Err(GlimpseError::PayloadTooLarge {
            size: len,
            max: MAX_PAYLOAD_SIZE,
        });
    }

    if src.len() < ImagePayload::LEN_PREFIX + len {
        // Reserve in one go so the read loop does not reallocate per chunk.
        src.reserve(ImagePayload::LEN_PREFIX + len - src.len());
        return Ok(None);
    }

    src.advance(ImagePayload::LEN_PREFIX);
    if len == 0 {
        return Ok(Some(ImagePayload::empty()));
    }
    Ok(Some(ImagePayload::new(src.split_to(len).freeze())))
}

/// EOF with a partial frame buffered is a transport error.
fn short_frame_on_eof<T>(
    decoded: Option<T>,
    src: &BytesMut,
    expected: usize,
) -> Result<Option<T>, GlimpseError> {
    match decoded {
        Some(item) => Ok(Some(item)),
        None if src.is_empty() => Ok(None),
        None => Err(GlimpseError::ShortFrame {
            expected,
            actual: src.len(),
        }),
    }
}

// ── RequesterCodec ───────────────────────────────────────────────

/// Codec for the requesting endpoint: request out, payload in.
#[derive(Debug, Default)]
pub struct RequesterCodec;

impl Encoder<ViewportRequest> for RequesterCodec {
    type Error = GlimpseError;

    fn encode(&mut self, item: ViewportRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item.encode());
        Ok(())
    }
}

impl Decoder for RequesterCodec {
    type Item = ImagePayload;
    type Error = GlimpseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_payload(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let decoded = self.decode(src)?;
        let expected = if src.len() >= ImagePayload::LEN_PREFIX {
            ImagePayload::LEN_PREFIX
                + u32::from_be_bytes(src[..4].try_into().unwrap()) as usize
        } else {
            ImagePayload::LEN_PREFIX
        };
        short_frame_on_eof(decoded, src, expected)
    }
}

// ── ResponderCodec ───────────────────────────────────────────────

/// Codec for the responding endpoint: request in, payload out.
#[derive(Debug, Default)]
pub struct ResponderCodec;

impl Encoder<ImagePayload> for ResponderCodec {
    type Error = GlimpseError;

    fn encode(&mut self, item: ImagePayload, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.wire_len());
        dst.put_u32(item.len() as u32);
        dst.extend_from_slice(item.bytes());
        Ok(())
    }
}

impl Decoder for ResponderCodec {
    type Item = ViewportRequest;
    type Error = GlimpseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_request(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let decoded = self.decode(src)?;
        short_frame_on_eof(decoded, src, ViewportRequest::SIZE)
    }
}

// ── Tests ────────────────────────────────────────────────────────
