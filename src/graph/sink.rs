//! The emission seam between converters and their output.

use crate::error::GraphResult;

use super::Triple;

/// Receives triples from a converter.
///
/// Implemented by [`TripleGraph`](super::TripleGraph) (accumulate in memory),
/// [`RdfWriterSink`](super::serialize::RdfWriterSink) (stream to a file) and
/// [`CountingSink`] (measure only).
pub trait TripleSink {
    fn emit(&mut self, triple: Triple) -> GraphResult<()>;

    /// Emit a batch. The default forwards one triple at a time.
    fn emit_all(&mut self, triples: Vec<Triple>) -> GraphResult<()> {
        for triple in triples {
            self.emit(triple)?;
        }
        Ok(())
    }
}

impl<S: TripleSink + ?Sized> TripleSink for &mut S {
    fn emit(&mut self, triple: Triple) -> GraphResult<()> {
        (**self).emit(triple)
    }

    fn emit_all(&mut self, triples: Vec<Triple>) -> GraphResult<()> {
        (**self).emit_all(triples)
    }
}

/// A sink that discards triples and counts them.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingSink {
    pub count: usize,
}

impl TripleSink for CountingSink {
    fn emit(&mut self, _triple: Triple) -> GraphResult<()> {
        self.count += 1;
        Ok(())
    }
}

/// A sink that collects triples into a vector, preserving emission order.
impl TripleSink for Vec<Triple> {
    fn emit(&mut self, triple: Triple) -> GraphResult<()> {
        self.push(triple);
        Ok(())
    }

    fn emit_all(&mut self, mut triples: Vec<Triple>) -> GraphResult<()> {
        self.append(&mut triples);
        Ok(())
    }
}
