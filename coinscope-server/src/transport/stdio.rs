//! Newline-delimited JSON session over stdin/stdout
//!
//! Serves exactly one session. Logs must go to stderr while this runs.

use std::sync::Arc;

use coinscope_protocol::{JsonRpcResponse, MAX_FRAME_SIZE};
use coinscope_utils::{CoinscopeError, Result};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{info, warn};

use crate::mcp::{Dispatcher, Session};

const SESSION_QUEUE: usize = 32;

/// Serve one session on the process's stdin/stdout
pub async fn serve_stdio(dispatcher: Arc<Dispatcher>) -> Result<()> {
    info!("Serving one session on stdio");
    serve_lines(dispatcher, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve one session over any line-oriented reader/writer pair
///
/// Returns once the reader hits EOF and every pending response is written.
pub async fn serve_lines<R, W>(dispatcher: Arc<Dispatcher>, reader: R, writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let session = Session::new(dispatcher);
    let session_id = session.id();
    let (inbound_tx, inbound_rx) = mpsc::channel::<String>(SESSION_QUEUE);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<JsonRpcResponse>(SESSION_QUEUE);

    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_FRAME_SIZE));
    let mut sink = FramedWrite::new(writer, LinesCodec::new());

    let read = async move {
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    if inbound_tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    warn!(%session_id, "Dropped input line over {} bytes", MAX_FRAME_SIZE);
                }
                Err(LinesCodecError::Io(e)) => return Err(CoinscopeError::Io(e)),
            }
        }
        Ok(())
    };

    let write = async move {
        while let Some(response) = outbound_rx.recv().await {
            let json = serde_json::to_string(&response)?;
            sink.send(json).await.map_err(|e| match e {
                LinesCodecError::Io(e) => CoinscopeError::Io(e),
                other => CoinscopeError::protocol(other.to_string()),
            })?;
        }
        Ok::<_, CoinscopeError>(())
    };

    let ((), read_result, write_result) =
        tokio::join!(session.run(inbound_rx, outbound_tx), read, write);

    read_result?;
    write_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::PriceFetcher;
    use crate::mcp::FetcherSet;
    use crate::testing::StaticRequester;
    use serde_json::Value;
    use tokio::io::AsyncReadExt;

    fn dispatcher() -> Arc<Dispatcher> {
        Arc::new(Dispatcher::new(
            FetcherSet::default().with_price(PriceFetcher::new("http://mock")),
            Arc::new(StaticRequester::ok(r#"{"bitcoin":{"usd":3}}"#)),
        ))
    }

    async fn run(input: &str) -> Vec<Value> {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        serve_lines(dispatcher(), input.as_bytes(), server)
            .await
            .unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_one_response_per_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"get_coin_price","arguments":{"coin_id":"bitcoin"}}}"#,
            "\n",
        );

        let responses = run(input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["content"][0]["text"], r#"{"price":3}"#);
    }

    #[tokio::test]
    async fn test_garbage_line_answered_with_parse_error() {
        let input = "nonsense\n{\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"ping\"}\n";

        let responses = run(input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["id"], 5);
    }

    #[tokio::test]
    async fn test_empty_input() {
        assert!(run("").await.is_empty());
    }
}
