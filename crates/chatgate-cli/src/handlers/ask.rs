//! Ask command handler.
//!
//! Sends one message to a running chatgate server. Streaming replies are
//! copied to stdout as they arrive; complete replies are printed as the
//! server's JSON.

use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::commands::AskArgs;

/// JSON body for `POST /chat`.
pub fn request_body(args: &AskArgs) -> serde_json::Value {
    serde_json::json!({
        "message": args.prompt(),
        "temperature": args.temperature,
        "max_tokens": args.max_tokens,
        "stream": args.stream,
    })
}

/// Send the request and write the reply to `out`.
pub async fn ask<W>(client: &reqwest::Client, args: &AskArgs, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let url = format!("{}/chat", args.url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .json(&request_body(args))
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        bail!("Server returned {status}: {}", text.trim());
    }

    if args.stream {
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.context("Reply stream was interrupted")?;
            out.write_all(&chunk).await?;
            out.flush().await?;
        }
        out.write_all(b"\n").await?;
    } else {
        let reply: serde_json::Value = response.json().await.context("Invalid JSON reply")?;
        let pretty = serde_json::to_string_pretty(&reply)?;
        out.write_all(pretty.as_bytes()).await?;
        out.write_all(b"\n").await?;
    }
    out.flush().await?;
    Ok(())
}

pub async fn execute(args: &AskArgs) -> Result<()> {
    let client = reqwest::Client::new();
    let mut stdout = tokio::io::stdout();
    ask(&client, args, &mut stdout).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Commands;
    use crate::parser::Cli;
    use clap::Parser;

    #[test]
    fn test_request_body_carries_all_fields() {
        let Commands::Ask(args) =
            Cli::parse_from(["chatgate", "ask", "--max-tokens", "64", "Hi", "there"]).command
        else {
            panic!("expected ask");
        };

        let body = request_body(&args);
        assert_eq!(body["message"], "Hi there");
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["stream"], false);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }
}
