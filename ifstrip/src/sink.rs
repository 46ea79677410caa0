/// Append-only output buffer for one transformation.
///
/// Sized to the input up front: the output is a subsequence of the input,
/// so it never needs to grow.
#[derive(Debug)]
pub(crate) struct SourceSink {
    buffer: String,
}

impl SourceSink {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        SourceSink {
            buffer: String::with_capacity(capacity),
        }
    }

    pub(crate) fn append(&mut self, code: &str) {
        debug_assert!(self.buffer.len() + code.len() <= self.buffer.capacity());
        self.buffer.push_str(code);
    }

    pub(crate) fn into_string(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_in_order() {
        let mut sink = SourceSink::with_capacity(8);
        sink.append("ab");
        sink.append("");
        sink.append("cd\n");
        assert_eq!(sink.into_string(), "abcd\n");
    }
}
