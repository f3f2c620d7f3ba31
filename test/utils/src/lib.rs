/// Newline delimited body as streamed by `/api/generate`, with one
/// malformed line mixed in.
pub fn ndjson_fixture() -> &'static str {
    return r#"{"model":"llama2","response":"The","done":false}
{"model":"llama2","response":" quick","done":false}
{"model":"llama2","response":" brown"
{"model":"llama2","response":" fox","done":false}

{"model":"llama2","response":"","done":true,"context":[1,2,3]}
"#;
}

/// Tokens expected from `ndjson_fixture`.
pub fn ndjson_fixture_tokens() -> Vec<String> {
    return vec!["The".to_string(), " quick".to_string(), " fox".to_string()];
}

/// Splits a body into chunks at the given byte offsets.
pub fn split_at_offsets(body: &str, offsets: &[usize]) -> Vec<Vec<u8>> {
    let bytes = body.as_bytes();
    let mut chunks = vec![];
    let mut start = 0;
    for offset in offsets {
        chunks.push(bytes[start..*offset].to_vec());
        start = *offset;
    }
    chunks.push(bytes[start..].to_vec());

    return chunks;
}
