use std::cell::RefCell;
use std::collections::VecDeque;
use std::iter::FusedIterator;

use encoding_rs::{CoderResult, Decoder, UTF_8};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
    TokenizerResult,
};

// ── Token sink ───────────────────────────────────────────────────────────────

/// Keeps start tags (self-closing included) and drops every other token.
/// Only holds what the current chunk produced; the iterator drains it
/// before feeding the next one.
///
/// With no tree builder attached, the sink is what switches the tokenizer
/// into raw text after `<script>`, `<style>` and friends, so markup inside
/// them is not mistaken for tags.
#[derive(Default)]
struct StartTagQueue {
    tags: RefCell<VecDeque<Tag>>,
}

impl StartTagQueue {
    fn pop(&self) -> Option<Tag> {
        self.tags.borrow_mut().pop_front()
    }
}

impl TokenSink for StartTagQueue {
    type Handle = ();

    fn process_token(&self, token: Token, line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) if tag.kind == TagKind::StartTag => {
                let switch = if tag.self_closing {
                    TokenSinkResult::Continue
                } else {
                    raw_content(&tag.name)
                };
                self.tags.borrow_mut().push_back(tag);
                return switch;
            }
            Token::ParseError(msg) => {
                tracing::trace!(line = line_number, "tokenizer: {}", msg);
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

fn raw_content(name: &str) -> TokenSinkResult<()> {
    match name {
        "script" => TokenSinkResult::RawData(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
            TokenSinkResult::RawData(RawKind::Rawtext)
        }
        "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
        "plaintext" => TokenSinkResult::Plaintext,
        _ => TokenSinkResult::Continue,
    }
}

// ── Incremental UTF-8 decoding ───────────────────────────────────────────────

/// Decodes a byte stream chunk by chunk. A multi-byte character cut by a chunk
/// boundary is held back until the next chunk; invalid bytes become U+FFFD.
struct ChunkDecoder {
    inner: Decoder,
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self {
            inner: UTF_8.new_decoder(),
        }
    }
}

impl ChunkDecoder {
    fn decode(&mut self, chunk: &[u8], last: bool) -> String {
        let mut out = String::new();
        let mut src = chunk;
        loop {
            let needed = self
                .inner
                .max_utf8_buffer_length(src.len())
                .unwrap_or(src.len() * 3 + 4);
            out.reserve(needed);
            let (result, read, _) = self.inner.decode_to_string(src, &mut out, last);
            src = &src[read..];
            match result {
                CoderResult::InputEmpty => return out,
                CoderResult::OutputFull => continue,
            }
        }
    }
}

// ── Pull-based start-tag stream ──────────────────────────────────────────────

/// Lazily tokenizes a sequence of byte chunks and yields start tags in
/// document order.
///
/// One forward pass, no tree: a chunk is only pulled from `chunks` once every
/// tag produced by the previous one has been handed out. The stream ends when
/// `chunks` does and cannot be restarted.
pub struct StartTags<I> {
    chunks: I,
    tokenizer: Tokenizer<StartTagQueue>,
    input: BufferQueue,
    decoder: ChunkDecoder,
    finished: bool,
}

impl<I> StartTags<I> {
    pub fn new(chunks: I) -> Self {
        Self {
            chunks,
            tokenizer: Tokenizer::new(StartTagQueue::default(), TokenizerOpts::default()),
            input: BufferQueue::default(),
            decoder: ChunkDecoder::default(),
            finished: false,
        }
    }

    fn feed(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        self.input.push_back(StrTendril::from(text));
        // The sink never pauses for scripts; resume until the input is drained.
        while let TokenizerResult::Script(()) = self.tokenizer.feed(&self.input) {}
    }
}

impl<I, B> Iterator for StartTags<I>
where
    I: Iterator<Item = B>,
    B: AsRef<[u8]>,
{
    type Item = Tag;

    fn next(&mut self) -> Option<Tag> {
        loop {
            if let Some(tag) = self.tokenizer.sink.pop() {
                return Some(tag);
            }
            if self.finished {
                return None;
            }
            match self.chunks.next() {
                Some(chunk) => {
                    let text = self.decoder.decode(chunk.as_ref(), false);
                    self.feed(text);
                }
                None => {
                    let tail = self.decoder.decode(&[], true);
                    self.feed(tail);
                    self.tokenizer.end();
                    self.finished = true;
                }
            }
        }
    }
}

impl<I, B> FusedIterator for StartTags<I>
where
    I: Iterator<Item = B>,
    B: AsRef<[u8]>,
{
}
