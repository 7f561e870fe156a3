//! Requesting-side frame encoder, the mirror of [`ResponseEncoder`].
//!
//! [`ResponseEncoder`]: crate::codec::ResponseEncoder

use crate::codec::body::PayloadEncoder;
use crate::codec::header::RequestHeadEncoder;
use crate::protocol::{Message, PayloadSize, RequestHead, SendError};
use bytes::BytesMut;
use std::io;
use std::io::ErrorKind;
use tokio_util::codec::Encoder;
use tracing::error;

pub struct RequestEncoder {
    head_encoder: RequestHeadEncoder,
    payload_encoder: Option<PayloadEncoder>,
}

impl RequestEncoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for RequestEncoder {
    fn default() -> Self {
        Self { head_encoder: RequestHeadEncoder, payload_encoder: None }
    }
}

impl Encoder<Message<(RequestHead, PayloadSize)>> for RequestEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message<(RequestHead, PayloadSize)>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header((head, payload_size)) => {
                if self.payload_encoder.is_some() {
                    error!("expect payload item but receive request head");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                }

                self.payload_encoder = Some(payload_size.into());
                self.head_encoder.encode((head, payload_size), dst)
            }

            Message::Payload(payload_item) => {
                let Some(payload_encoder) = &mut self.payload_encoder else {
                    error!("expect request head but receive payload item");
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
