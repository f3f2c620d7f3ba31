use anyhow::Result;
use bytes::Bytes;
use futures::stream;
use futures::stream::StreamExt;
use test_utils::ndjson_fixture;
use test_utils::ndjson_fixture_tokens;
use test_utils::split_at_offsets;

use super::decode_stream;
use super::ChunkDecoder;
use super::Decoded;
use crate::domain::models::ChatError;
use crate::domain::models::SplitLinePolicy;

fn decode_all(policy: SplitLinePolicy, chunks: &[Vec<u8>]) -> (Vec<Decoded>, usize) {
    let mut decoder = ChunkDecoder::new(policy);
    let mut out = vec![];
    for chunk in chunks {
        out.extend(decoder.decode_chunk(chunk));
    }
    out.extend(decoder.finish());

    return (out, decoder.skipped());
}

fn tokens(items: &[Decoded]) -> Vec<String> {
    return items
        .iter()
        .filter_map(|item| {
            return match item {
                Decoded::Token(token) => Some(token.to_string()),
                Decoded::Done { .. } => None,
            };
        })
        .collect();
}

fn newline_offsets(body: &str) -> Vec<usize> {
    return body
        .bytes()
        .enumerate()
        .filter(|(_, byte)| return *byte == b'\n')
        .map(|(idx, _)| return idx + 1)
        .filter(|offset| return *offset < body.len())
        .collect();
}

#[test]
fn it_decodes_a_single_chunk() {
    let (items, skipped) = decode_all(
        SplitLinePolicy::Drop,
        &[ndjson_fixture().as_bytes().to_vec()],
    );

    assert_eq!(tokens(&items), ndjson_fixture_tokens());
    assert_eq!(
        items.last(),
        Some(&Decoded::Done {
            context: Some(vec![1, 2, 3])
        })
    );
    assert_eq!(skipped, 1);
}

#[test]
fn it_yields_one_token_per_valid_line_around_a_malformed_one() {
    let body = "{\"response\":\"a\"}\n{\"response\":\"b\"}\n{\"response\":\n{\"response\":\"c\"}\n";
    for policy in [SplitLinePolicy::Drop, SplitLinePolicy::Carry] {
        let (items, skipped) = decode_all(policy, &[body.as_bytes().to_vec()]);
        assert_eq!(tokens(&items), vec!["a", "b", "c"]);
        assert_eq!(skipped, 1);
    }
}

#[test]
fn it_skips_blank_lines_and_empty_responses() {
    let body = "\n  \n{\"response\":\"\"}\n{\"done\":false}\n{\"response\":\"x\"}\r\n\n";
    let (items, skipped) = decode_all(SplitLinePolicy::Drop, &[body.as_bytes().to_vec()]);

    assert_eq!(items, vec![Decoded::Token("x".to_string())]);
    assert_eq!(skipped, 0);
}

#[test]
fn it_skips_records_of_the_wrong_shape() {
    let body = "[1,2]\n42\n{\"response\":7}\n{\"response\":\"ok\"}";
    let (items, skipped) = decode_all(SplitLinePolicy::Drop, &[body.as_bytes().to_vec()]);

    assert_eq!(tokens(&items), vec!["ok"]);
    assert_eq!(skipped, 3);
}

#[test]
fn it_skips_invalid_utf8_lines() {
    let mut body = b"{\"response\":\"\xff\"}\n".to_vec();
    body.extend_from_slice(b"{\"response\":\"fine\"}\n");
    let (items, skipped) = decode_all(SplitLinePolicy::Drop, &[body]);

    assert_eq!(tokens(&items), vec!["fine"]);
    assert_eq!(skipped, 1);
}

#[test]
fn it_decodes_a_final_line_without_newline() {
    let (items, _) = decode_all(
        SplitLinePolicy::Drop,
        &[b"{\"response\":\"a\"}\n{\"response\":\"b\"}".to_vec()],
    );
    assert_eq!(tokens(&items), vec!["a", "b"]);

    let (items, _) = decode_all(
        SplitLinePolicy::Carry,
        &[b"{\"response\":\"a\"}\n{\"response\":\"b\"}".to_vec()],
    );
    assert_eq!(tokens(&items), vec!["a", "b"]);
}

#[test]
fn it_drops_a_line_split_across_chunks() {
    let chunks = vec![
        br#"{"response":"Hel"}
{"resp"#
            .to_vec(),
        br#"onse":"lo"}
"#
        .to_vec(),
    ];

    let (items, skipped) = decode_all(SplitLinePolicy::Drop, &chunks);

    assert_eq!(tokens(&items), vec!["Hel"]);
    assert_eq!(skipped, 2);
}

#[test]
fn it_reassembles_a_line_split_across_chunks_when_carrying() {
    let chunks = vec![
        br#"{"response":"Hel"}
{"resp"#
            .to_vec(),
        br#"onse":"lo"}
"#
        .to_vec(),
    ];

    let (items, skipped) = decode_all(SplitLinePolicy::Carry, &chunks);

    assert_eq!(tokens(&items), vec!["Hel", "lo"]);
    assert_eq!(skipped, 0);
}

#[test]
fn it_is_invariant_to_splits_on_line_boundaries() {
    let body = ndjson_fixture();
    let (expected, _) = decode_all(SplitLinePolicy::Drop, &[body.as_bytes().to_vec()]);

    let offsets = newline_offsets(body);
    for offset in &offsets {
        let (items, _) = decode_all(SplitLinePolicy::Drop, &split_at_offsets(body, &[*offset]));
        assert_eq!(items, expected, "split at {offset}");
    }

    let (items, _) = decode_all(SplitLinePolicy::Drop, &split_at_offsets(body, &offsets));
    assert_eq!(items, expected);
}

#[test]
fn it_loses_only_the_split_line_when_dropping() {
    let body = "{\"response\":\"a\"}\n{\"response\":\"b\"}\n{\"response\":\"c\"}\n";
    // Inside the second line.
    let offset = body.find("\"b\"").unwrap();

    let (items, skipped) = decode_all(SplitLinePolicy::Drop, &split_at_offsets(body, &[offset]));

    assert_eq!(tokens(&items), vec!["a", "c"]);
    assert_eq!(skipped, 2);
}

#[test]
fn it_is_invariant_to_any_split_when_carrying() {
    let body = ndjson_fixture();
    let (expected, expected_skipped) =
        decode_all(SplitLinePolicy::Carry, &[body.as_bytes().to_vec()]);

    for offset in 1..body.len() {
        let (items, skipped) =
            decode_all(SplitLinePolicy::Carry, &split_at_offsets(body, &[offset]));
        assert_eq!(items, expected, "split at {offset}");
        assert_eq!(skipped, expected_skipped, "split at {offset}");
    }

    let every_byte = (1..body.len()).collect::<Vec<usize>>();
    let (items, _) = decode_all(SplitLinePolicy::Carry, &split_at_offsets(body, &every_byte));
    assert_eq!(items, expected);
}

#[tokio::test]
async fn it_decodes_a_stream_lazily() -> Result<()> {
    let chunks = split_at_offsets(ndjson_fixture(), &[10, 40, 90])
        .into_iter()
        .map(|chunk| return Ok(Bytes::from(chunk)))
        .collect::<Vec<Result<Bytes, ChatError>>>();

    let decoded = decode_stream(stream::iter(chunks).boxed(), SplitLinePolicy::Carry)
        .collect::<Vec<Result<Decoded, ChatError>>>()
        .await
        .into_iter()
        .collect::<Result<Vec<Decoded>, ChatError>>()?;

    assert_eq!(tokens(&decoded), ndjson_fixture_tokens());
    assert_eq!(
        decoded.last(),
        Some(&Decoded::Done {
            context: Some(vec![1, 2, 3])
        })
    );

    return Ok(());
}

#[tokio::test]
async fn it_ends_the_stream_after_a_transport_error() {
    let chunks: Vec<Result<Bytes, ChatError>> = vec![
        Ok(Bytes::from_static(b"{\"response\":\"a\"}\n")),
        Err(ChatError::TransportFailure("connection reset".to_string())),
        Ok(Bytes::from_static(b"{\"response\":\"b\"}\n")),
    ];

    let decoded = decode_stream(stream::iter(chunks).boxed(), SplitLinePolicy::Drop)
        .collect::<Vec<Result<Decoded, ChatError>>>()
        .await;

    assert_eq!(
        decoded,
        vec![
            Ok(Decoded::Token("a".to_string())),
            Err(ChatError::TransportFailure("connection reset".to_string())),
        ]
    );
}
