//! Merges five tickers, two at a time, and stops at the first value from `D`.
//!
//! Pass a mode (`no-close`, `close-no-wait`, `close-and-wait`) as the first
//! argument to see how the remaining tickers get closed.

use futures_fanin::prelude::*;
use futures_fanin::source::{self, Source};
use futures_fanin::{MergeOptions, Mode};
use futures_lite::{stream, StreamExt};
use std::convert::Infallible;
use std::error::Error;
use tokio::time::{sleep, Duration};

fn ticker(
    name: &'static str,
    period_ms: u64,
    limit: usize,
) -> impl Source<Item = String, Error = Infallible> {
    let ticks = stream::unfold(0, move |i| async move {
        if i == limit {
            return None;
        }
        if i > 0 {
            sleep(Duration::from_millis(period_ms)).await;
        }
        println!("{name} yielded {i}");
        Some((format!("{name}: {i}"), i + 1))
    });

    source::from_stream(ticks).on_close(async move {
        println!("Closing {name} (doing some cleanup)");
        sleep(Duration::from_millis(100)).await;
        Ok(())
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let mode = match std::env::args().nth(1) {
        Some(name) => name.parse()?,
        None => Mode::CloseAndWait,
    };

    let tickers = vec![
        ticker("A", 22, 5),
        ticker("B", 55, 5),
        ticker("C", 33, 5),
        ticker("D", 44, 5),
        ticker("E", 11, 5),
    ];
    let mut merged = tickers.merge_with(MergeOptions::new().mode(mode).concurrency(2));

    while let Some(message) = merged.next().await {
        let message = message?;
        if message.contains('D') {
            break;
        }
        println!("Received from {message}");
    }

    // Stopping early still has to close the tickers which are running.
    merged.close().await?;
    println!("Finishing");
    Ok(())
}
