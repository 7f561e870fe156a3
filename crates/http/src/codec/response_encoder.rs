//! Serving-side frame encoder.
//!
//! Writes a head first, then body items until the declared length is done.
//! Feeding a payload item without a preceding head, or a second head while a
//! body is unfinished, is a caller bug and surfaces as an error.

use crate::codec::body::PayloadEncoder;
use crate::codec::header::ResponseHeadEncoder;
use crate::protocol::{Message, PayloadSize, ResponseHead, SendError};
use bytes::BytesMut;
use std::io;
use std::io::ErrorKind;
use tokio_util::codec::Encoder;
use tracing::error;

pub struct ResponseEncoder {
    head_encoder: ResponseHeadEncoder,
    payload_encoder: Option<PayloadEncoder>,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for ResponseEncoder {
    fn default() -> Self {
        Self { head_encoder: ResponseHeadEncoder, payload_encoder: None }
    }
}

impl Encoder<Message<(ResponseHead, PayloadSize)>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message<(ResponseHead, PayloadSize)>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header((head, payload_size)) => {
                if self.payload_encoder.is_some() {
                    error!("expect payload item but receive response head");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                }

                self.payload_encoder = Some(payload_size.into());
                self.head_encoder.encode((head, payload_size), dst)
            }

            Message::Payload(payload_item) => {
                let Some(payload_encoder) = &mut self.payload_encoder else {
                    error!("expect response head but receive payload item");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                };

                let is_eof = payload_item.is_eof();
                let result = payload_encoder.encode(payload_item, dst);

                // the frame is over once its EOF marker has been encoded
                if is_eof {
                    self.payload_encoder.take();
                }

                result
            }
        }
    }
}
