//! DNS message parsing and NOTIFY response synthesis.
//!
//! Only the header and question section are decoded. NOTIFY requests may
//! carry an answer-section SOA hint, but RFC 1996 makes it advisory and
//! the listener resyncs unconditionally, so record sections are left
//! unparsed.

use crate::error::Result;
use crate::header::Header;
use crate::opcode::OpCode;
use crate::question::Question;
use crate::{Error, HeaderFlags};
use bytes::BytesMut;

/// A partially decoded DNS message: header plus question section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The message header.
    pub header: Header,

    /// The question section.
    pub questions: Vec<Question>,
}

impl Message {
    /// Parses a message from wire format.
    ///
    /// Questions are decoded; answer/authority/additional sections are
    /// ignored (their counts remain available in the header).
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = Header::parse(data)?;

        let mut questions = Vec::with_capacity(usize::from(header.qd_count));
        let mut offset = crate::HEADER_SIZE;
        for _ in 0..header.qd_count {
            let (question, consumed) = Question::parse(data, offset)?;
            offset += consumed;
            questions.push(question);
        }

        Ok(Self { header, questions })
    }

    /// Builds a NOTIFY request for the given zone (primarily for tests
    /// and diagnostics).
    pub fn notify_request(id: u16, zone: impl Into<String>) -> Self {
        let mut header = Header::new(id, OpCode::Notify);
        header.set_authoritative(true);
        header.qd_count = 1;

        Self {
            header,
            questions: vec![Question::soa(zone)],
        }
    }

    /// Returns true if this message is a NOTIFY request: opcode NOTIFY
    /// with the QR flag clear.
    pub fn is_notify_request(&self) -> bool {
        self.header.opcode == OpCode::Notify && self.header.is_query()
    }

    /// Returns the first question, if any.
    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Builds the NOTIFY response for this request: the original question
    /// echoed with QR and AA set and the transaction ID copied.
    ///
    /// Fails with [`Error::MissingQuestion`] when the request carried no
    /// question to echo.
    pub fn notify_response(&self) -> Result<Message> {
        let question = self.question().ok_or(Error::MissingQuestion)?.clone();

        let mut header = Header::response_from(&self.header);
        header.flags = HeaderFlags::QR | HeaderFlags::AA;
        header.qd_count = 1;
        header.an_count = 0;
        header.ns_count = 0;
        header.ar_count = 0;

        Ok(Message {
            header,
            questions: vec![question],
        })
    }

    /// Serializes the message (header plus questions) to wire format.
    pub fn to_wire(&self) -> Result<Vec<u8>> {
        let questions_len: usize = self.questions.iter().map(Question::wire_len).sum();
        let mut buf = BytesMut::with_capacity(crate::HEADER_SIZE + questions_len);

        self.header.write_to(&mut buf);
        for question in &self.questions {
            question.write_to(&mut buf)?;
        }

        Ok(buf.to_vec())
    }
}
