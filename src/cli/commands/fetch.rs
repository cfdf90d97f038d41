//! Fetch command - route one request through the worker

use crate::cli::args::FetchArgs;
use crate::cli::HostContext;
use crate::config::Config;
use crate::error::{SwError, SwResult};
use crate::http::{Destination, Method, Request, RequestMode};
use crate::worker::FetchOutcome;
use console::style;
use std::io::{self, Write};

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> SwResult<()> {
    let host = HostContext::open(config).await?;
    let request = build_request(&args, &host.registry.resolve(&args.url)?);

    let worker = host.worker(args.offline);
    let outcome = worker.handle_fetch(request).await?;
    worker.settle().await;

    print_outcome(&outcome);
    if args.body {
        println!();
        io::stdout()
            .write_all(&outcome.response.body)
            .map_err(|e| SwError::io("writing response body", e))?;
        println!();
    }
    Ok(())
}

fn build_request(args: &FetchArgs, url: &str) -> Request {
    let method: Method = args.method.parse().unwrap_or(Method::Get);
    let mut request = Request::get(url).with_method(method);

    if args.navigate {
        request = request
            .with_mode(RequestMode::Navigate)
            .with_destination(Destination::Document);
    }
    if let Some(destination) = &args.destination {
        request = request.with_destination(destination.parse().unwrap_or_default());
    }
    for (name, value) in &args.headers {
        request.headers.append(name.as_str(), value.as_str());
    }
    if let Some(accept) = &args.accept {
        request = request.with_header("Accept", accept);
    }
    request
}

fn print_outcome(outcome: &FetchOutcome) {
    let status = outcome.response.status;
    let status_styled = if outcome.response.ok() {
        style(status.to_string()).green()
    } else {
        style(status.to_string()).red()
    };

    println!("{:<10} {}", style("handler").bold(), outcome.handler);
    println!("{:<10} {}", style("source").bold(), outcome.source);
    println!(
        "{:<10} {} {}",
        style("status").bold(),
        status_styled,
        outcome.response.status_text
    );
    println!(
        "{:<10} {}",
        style("type").bold(),
        outcome.response.content_type().unwrap_or("-")
    );
    println!("{:<10} {} bytes", style("body").bold(), outcome.response.body.len());
}
