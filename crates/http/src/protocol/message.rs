use bytes::Bytes;

/// One step of a framed message stream: a parsed head or a payload item.
///
/// The decoders yield a `Header` first, then zero or more `Payload` items
/// until [`PayloadItem::Eof`]. The generic parameter `T` is the head type
/// together with its payload size (request or response flavored).
pub enum Message<T> {
    /// The parsed start line and header block
    Header(T),
    /// A chunk of body data or the end-of-body marker
    Payload(PayloadItem),
}

/// An item in a message's body stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    /// A chunk of body bytes
    Chunk(Bytes),
    /// Marks the end of the body
    Eof,
}

/// The declared body length of a frame.
///
/// Determined from the `Content-Length` header: present means `Length(n)`,
/// absent means `Empty`. There is no chunked variant in this protocol subset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Body with a known length in bytes
    Length(u64),
    /// No body
    Empty,
}

impl PayloadSize {
    pub fn new_length(length: u64) -> Self {
        if length == 0 { PayloadSize::Empty } else { PayloadSize::Length(length) }
    }

    pub fn new_empty() -> Self {
        PayloadSize::Empty
    }

    /// Returns true if the frame declares no body
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }

    /// The declared length in bytes (zero when empty)
    #[inline]
    pub fn len(&self) -> u64 {
        match self {
            PayloadSize::Length(n) => *n,
            PayloadSize::Empty => 0,
        }
    }
}

impl<T> Message<T> {
    #[inline]
    pub fn is_payload(&self) -> bool {
        matches!(self, Message::Payload(_))
    }

    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, Message::Header(_))
    }
}

impl PayloadItem {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }

    /// Returns the contained bytes if this is a `Chunk`
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}
