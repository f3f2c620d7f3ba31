#[cfg(test)]
#[path = "chunk_decoder_test.rs"]
mod tests;

use futures::stream;
use futures::stream::BoxStream;
use futures::stream::StreamExt;
use serde_derive::Deserialize;

use crate::domain::models::ChatError;
use crate::domain::models::ChunkStream;
use crate::domain::models::SplitLinePolicy;

/// What a single stream record contributes to a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    Token(String),
    Done { context: Option<Vec<i64>> },
}

pub type DecodedStream = BoxStream<'static, Result<Decoded, ChatError>>;

#[derive(Debug, Deserialize)]
struct StreamRecord {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    context: Option<Vec<i64>>,
}

/// Turns raw newline delimited JSON chunks into tokens. Lines that do not
/// parse are logged and skipped, they never end the stream.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    policy: SplitLinePolicy,
    carry: Vec<u8>,
    skipped: usize,
}

impl ChunkDecoder {
    pub fn new(policy: SplitLinePolicy) -> ChunkDecoder {
        return ChunkDecoder {
            policy,
            carry: vec![],
            skipped: 0,
        };
    }

    /// Number of lines dropped so far.
    pub fn skipped(&self) -> usize {
        return self.skipped;
    }

    pub fn decode_chunk(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        let mut out = vec![];

        match self.policy {
            SplitLinePolicy::Drop => {
                for line in chunk.split(|byte| return *byte == b'\n') {
                    self.decode_line(line, &mut out);
                }
            }
            SplitLinePolicy::Carry => {
                self.carry.extend_from_slice(chunk);
                while let Some(pos) = self.carry.iter().position(|byte| return *byte == b'\n') {
                    let line = self.carry.drain(..=pos).collect::<Vec<u8>>();
                    self.decode_line(&line[..line.len() - 1], &mut out);
                }
            }
        }

        return out;
    }

    /// Flushes whatever is left once the upstream has ended.
    pub fn finish(&mut self) -> Vec<Decoded> {
        let mut out = vec![];
        if !self.carry.is_empty() {
            let line = std::mem::take(&mut self.carry);
            self.decode_line(&line, &mut out);
        }

        return out;
    }

    fn decode_line(&mut self, line: &[u8], out: &mut Vec<Decoded>) {
        let text = match std::str::from_utf8(line) {
            Ok(text) => text.trim(),
            Err(err) => {
                self.skip(&String::from_utf8_lossy(line), &err.to_string());
                return;
            }
        };

        if text.is_empty() {
            return;
        }

        let record = match serde_json::from_str::<StreamRecord>(text) {
            Ok(record) => record,
            Err(err) => {
                self.skip(text, &err.to_string());
                return;
            }
        };

        if let Some(token) = record.response {
            if !token.is_empty() {
                out.push(Decoded::Token(token));
            }
        }

        if record.done {
            out.push(Decoded::Done {
                context: record.context,
            });
        }
    }

    fn skip(&mut self, line: &str, reason: &str) {
        self.skipped += 1;
        let err = ChatError::DecodeSkipped {
            line: line.to_string(),
            reason: reason.to_string(),
        };
        tracing::warn!(error = %err, policy = %self.policy, "Dropping stream line");
    }
}

/// Lazily decodes a chunk stream. A transport error is yielded once and
/// ends the stream.
pub fn decode_stream(chunks: ChunkStream, policy: SplitLinePolicy) -> DecodedStream {
    let state = Some((chunks, ChunkDecoder::new(policy)));

    let batches = stream::unfold(state, |state| async move {
        let (mut chunks, mut decoder) = state?;

        return match chunks.next().await {
            Some(Ok(chunk)) => {
                let batch = decoder
                    .decode_chunk(&chunk)
                    .into_iter()
                    .map(Ok)
                    .collect::<Vec<Result<Decoded, ChatError>>>();
                Some((batch, Some((chunks, decoder))))
            }
            Some(Err(err)) => Some((vec![Err(err)], None)),
            None => {
                let batch = decoder
                    .finish()
                    .into_iter()
                    .map(Ok)
                    .collect::<Vec<Result<Decoded, ChatError>>>();
                tracing::debug!(skipped = decoder.skipped(), "Stream finished");
                Some((batch, None))
            }
        };
    });

    return batches.flat_map(stream::iter).boxed();
}
