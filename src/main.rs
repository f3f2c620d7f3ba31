#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use owo_colors::OwoColorize;
use owo_colors::Stream;
use tokio::sync::mpsc;
use tokio::task;

use crate::application::cli;
use crate::application::ui;
use crate::domain::models::Action;
use crate::domain::models::Envelope;
use crate::domain::services::actions::ActionsService;

fn handle_error(err: Error) {
    let text = format!(
        "Pagechat has failed with the following version and error.\n\nVersion: {}\nError: {}",
        env!("CARGO_PKG_VERSION"),
        err
    );
    eprintln!(
        "{}",
        text.if_supports_color(Stream::Stderr, |text| return text.red())
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

#[tokio::main]
async fn main() {
    better_panic::install();

    let debug_log_dir = env::var("PAGECHAT_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("pagechat")
            .to_string_lossy()
            .to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("pagechat")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let launch = match cli::parse().await {
        Ok(Some(launch)) => launch,
        Ok(None) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (popup_tx, popup_rx) = mpsc::unbounded_channel::<Envelope>();

    let mut background_futures = task::JoinSet::new();
    background_futures.spawn(async move {
        return ActionsService::default().start(&mut action_rx).await;
    });

    // The host page opens the popup, then forwards any selection as a quote.
    let mut startup = vec![Action::OpenChat {
        page: launch.page,
        surface: popup_tx,
    }];
    if let Some(quote) = launch.quote {
        startup.push(Action::AddQuote(quote));
    }
    for action in startup {
        if let Err(err) = action_tx.send(action) {
            handle_error(err.into());
            return;
        }
    }

    let ui_future = ui::start(action_tx, popup_rx);

    let res = tokio::select!(
        res = background_futures.join_next() => match res {
            Some(Ok(res)) => res,
            Some(Err(join_err)) => Err(join_err.into()),
            None => Ok(()),
        },
        res = ui_future => res,
    );

    if let Err(err) = res {
        handle_error(err);
    }

    process::exit(0);
}
