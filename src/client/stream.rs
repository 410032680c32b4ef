//! Decoding of the `text/event-stream` body returned by streamed chat.

use super::types::ApiErrorBody;
use crate::{Error, Result};
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::{Stream, StreamExt, stream::BoxStream};
use std::fmt::Display;

/// Turns a chat event stream into a stream of tokens. `token` and `message`
/// events carry text; `done` ends the stream; `error` becomes a service error.
pub fn token_stream<S, B, E>(body: S, timeout_secs: u64) -> BoxStream<'static, Result<String>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<TransportError> + Display + Send + 'static,
{
    let events = Box::pin(body.eventsource());

    futures_util::stream::unfold((events, false), move |(mut events, finished)| async move {
        if finished {
            return None;
        }

        loop {
            match events.next().await? {
                Ok(event) => match event.event.as_str() {
                    "done" => return None,
                    "error" => {
                        let body = ApiErrorBody::parse(event.data.as_bytes()).unwrap_or(
                            ApiErrorBody {
                                kind: "stream".to_string(),
                                message: event.data,
                            },
                        );
                        let err = Error::Service {
                            status: 200,
                            body: Some(body),
                        };
                        return Some((Err(err), (events, true)));
                    }
                    "token" | "message" => return Some((Ok(event.data), (events, false))),
                    _ => continue,
                },
                Err(EventStreamError::Transport(e)) => {
                    let transport: TransportError = e.into();
                    let err = match transport {
                        TransportError::Reqwest(e) => Error::from_transport(e, timeout_secs),
                        TransportError::Other(msg) => Error::invalid_response(msg),
                    };
                    return Some((Err(err), (events, true)));
                }
                Err(e) => {
                    let err = Error::invalid_response(format!("malformed event stream: {}", e));
                    return Some((Err(err), (events, true)));
                }
            }
        }
    })
    .boxed()
}

/// Failure reported by the underlying body stream.
#[derive(Debug)]
pub enum TransportError {
    Reqwest(reqwest::Error),
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Reqwest(err)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use pretty_assertions::assert_eq;

    type Chunk = std::result::Result<&'static [u8], std::io::Error>;

    async fn collect(chunks: Vec<Chunk>) -> Vec<Result<String>> {
        token_stream(stream::iter(chunks), 30).collect().await
    }

    #[tokio::test]
    async fn test_token_stream_stops_at_done() {
        let chunks: Vec<Chunk> = vec![
            Ok(&b"event: token\ndata: Use\n\n"[..]),
            Ok(&b"event: token\ndata:  urea.\n\nevent: done\ndata: [DONE]\n\n"[..]),
            Ok(&b"event: token\ndata: ignored\n\n"[..]),
        ];
        let tokens: Vec<String> = collect(chunks)
            .await
            .into_iter()
            .map(|t| t.unwrap())
            .collect();
        assert_eq!(tokens, vec!["Use".to_string(), " urea.".to_string()]);
    }

    #[tokio::test]
    async fn test_token_stream_chunks_split_mid_line() {
        let chunks: Vec<Chunk> = vec![
            Ok(&b"event: tok"[..]),
            Ok(&b"en\r\ndata: Use "[..]),
            Ok(&b"urea\r\n\r\n"[..]),
        ];
        let tokens: Vec<String> = collect(chunks)
            .await
            .into_iter()
            .map(|t| t.unwrap())
            .collect();
        assert_eq!(tokens, vec!["Use urea".to_string()]);
    }

    #[tokio::test]
    async fn test_token_stream_untyped_events_and_comments() {
        let chunks: Vec<Chunk> = vec![Ok(
            &b": keepalive\n\ndata: line one\ndata: line two\n\nevent: ping\ndata: x\n\n"[..],
        )];
        let tokens: Vec<String> = collect(chunks)
            .await
            .into_iter()
            .map(|t| t.unwrap())
            .collect();
        assert_eq!(tokens, vec!["line one\nline two".to_string()]);
    }

    #[tokio::test]
    async fn test_token_stream_error_event() {
        let chunks: Vec<Chunk> = vec![
            Ok(&b"event: error\ndata: {\"detail\":\"agent failed\"}\n\n"[..]),
            Ok(&b"event: token\ndata: after\n\n"[..]),
        ];
        let results = collect(chunks).await;
        assert_eq!(results.len(), 1);
        let err = results.into_iter().next().unwrap().unwrap_err();
        assert!(matches!(err, Error::Service { status: 200, .. }));
        assert!(err.to_string().contains("agent failed"));
    }

    #[tokio::test]
    async fn test_token_stream_transport_error() {
        let chunks: Vec<Chunk> = vec![
            Ok(&b"event: token\ndata: partial\n\n"[..]),
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "reset")),
        ];
        let results = collect(chunks).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), "partial");
        assert!(matches!(results[1], Err(Error::InvalidResponse(_))));
    }
}
