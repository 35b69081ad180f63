//! Delta encoders.

use std::io::{BufWriter, Write};

use super::{Delta, Operation};
use crate::error::{Error, Result};
use crate::tree::Tree;

/// Knows how to render diff results.
pub trait Encoder {
    /// Writes the deltas produced by comparing `left` against `right`.
    fn encode(&mut self, left: &Tree, right: &Tree, deltas: &[Delta]) -> Result<()>;
}

/// Renders diff results in plain text, one line per delta.
///
/// Updates render as `Update('<left signature>'->'<right signature>')`, every
/// other operation as `<Op>('<signature>')`. An empty delta list renders the
/// single line `No difference.`.
pub struct PlainTextEncoder<W: Write> {
    w: BufWriter<W>,
}

impl<W: Write> PlainTextEncoder<W> {
    /// Creates a plain text encoder writing into `w`.
    pub fn new(w: W) -> Self {
        PlainTextEncoder { w: BufWriter::new(w) }
    }
}

impl<W: Write> Encoder for PlainTextEncoder<W> {
    fn encode(&mut self, left: &Tree, right: &Tree, deltas: &[Delta]) -> Result<()> {
        if deltas.is_empty() {
            writeln!(self.w, "No difference.").map_err(Error::Encode)?;
            return self.w.flush().map_err(Error::Encode);
        }
        for delta in deltas {
            match delta.operation {
                Operation::Update => {
                    let object = delta
                        .object
                        .expect("update deltas carry the right-side counterpart");
                    writeln!(
                        self.w,
                        "Update('{}'->'{}')",
                        String::from_utf8_lossy(left.node(delta.subject).signature()),
                        String::from_utf8_lossy(right.node(object).signature()),
                    )
                    .map_err(Error::Encode)?;
                }
                Operation::Insert | Operation::InsertSubtree => {
                    writeln!(
                        self.w,
                        "{}('{}')",
                        delta.operation,
                        String::from_utf8_lossy(right.node(delta.subject).signature()),
                    )
                    .map_err(Error::Encode)?;
                }
                Operation::Delete | Operation::DeleteSubtree => {
                    writeln!(
                        self.w,
                        "{}('{}')",
                        delta.operation,
                        String::from_utf8_lossy(left.node(delta.subject).signature()),
                    )
                    .map_err(Error::Encode)?;
                }
            }
        }
        self.w.flush().map_err(Error::Encode)
    }
}
