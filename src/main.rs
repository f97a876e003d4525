use std::time::Duration;

use clap::Parser;
use shadow_rs::shadow;
use shortform::{
    HttpShortener, OptionPanel, ResultDisplay, SubmissionController, Ttl,
    model::Style,
    render::Rendered,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing_subscriber::EnvFilter;

shadow!(build);

#[derive(Parser, Debug)]
#[command(version = build::VERSION, long_version = build::CLAP_LONG_VERSION, about = "Shorten URLs from the terminal", long_about = "")]
struct Args {
    /// Page the shortening form is served from; requests are posted there.
    #[arg(long, env = "SHORTFORM_ENDPOINT", default_value = "http://localhost:5000/")]
    endpoint: String,
    /// Index into the ttl options (0 never, 1 hour, 2 day, 3 week, 4 month, 5 year).
    #[arg(long, env = "SHORTFORM_TTL", default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..6))]
    ttl: u8,
    #[arg(long, env = "SHORTFORM_THROTTLE_MS", default_value_t = 500)]
    throttle_ms: u64,
    /// How long to wait for outstanding responses before exiting.
    #[arg(long, default_value_t = 30)]
    wait_secs: u64,
    /// Shorten this URL and exit instead of reading commands from stdin.
    origin: Option<String>,
}

/// Prints outcomes and reports settled ones back to the command loop.
struct TerminalDisplay {
    settled: mpsc::UnboundedSender<Style>,
}

impl ResultDisplay for TerminalDisplay {
    fn show(&self, rendered: Rendered) {
        match rendered.style {
            Style::Error => eprintln!("error: {}", rendered.text),
            Style::Normal => println!("{}", rendered.text),
        }
        if rendered.settled {
            let _ = self.settled.send(rendered.style);
        }
    }
}

#[derive(Default)]
struct TerminalPanel {
    selected: usize,
}

impl OptionPanel for TerminalPanel {
    fn mark_selected(&mut self, index: usize) {
        self.selected = index;
    }

    fn set_shown(&mut self, shown: bool) {
        if !shown {
            return;
        }
        for (i, ttl) in Ttl::ALL.iter().enumerate() {
            let mark = if i == self.selected { '*' } else { ' ' };
            println!(" {} {}: {}", mark, i, ttl);
        }
    }
}

async fn wait_settled(settled: &mut mpsc::UnboundedReceiver<Style>, outstanding: usize, limit: Duration) -> usize {
    let mut remaining = outstanding;
    let deadline = tokio::time::sleep(limit);
    tokio::pin!(deadline);
    while remaining > 0 {
        tokio::select! {
            received = settled.recv() => match received {
                Some(_) => remaining -= 1,
                None => break,
            },
            _ = &mut deadline => {
                tracing::warn!("gave up waiting on {} outstanding request(s)", remaining);
                break;
            }
        }
    }
    remaining
}

fn print_help() {
    println!(":ttl <index>  select how long the next link lives");
    println!(":options      show or hide the ttl options");
    println!(":history      list links created from this address");
    println!(":quit         wait for outstanding requests and exit");
    println!("<url>         shorten <url>");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // construct a subscriber that prints formatted traces to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    // use that subscriber to process traces emitted after this point
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    tracing::debug!("{:?}", &args);

    let shortener = HttpShortener::new(&args.endpoint)?;
    let (tx, mut settled) = mpsc::unbounded_channel();
    let mut controller = SubmissionController::with_delay(
        Duration::from_millis(args.throttle_ms),
        shortener.clone(),
        TerminalDisplay { settled: tx },
        TerminalPanel::default(),
    );
    controller.select_ttl(usize::from(args.ttl));
    tracing::info!("posting to {}, links expire: {}", shortener.endpoint(), controller.selected_ttl());
    let wait_limit = Duration::from_secs(args.wait_secs);

    if let Some(origin) = args.origin {
        if !controller.submit(Some(&origin)) {
            return Err("nothing to shorten".into());
        }
        return match tokio::time::timeout(wait_limit, settled.recv()).await {
            Ok(Some(Style::Normal)) => Ok(()),
            Ok(Some(Style::Error)) => Err("shortening failed".into()),
            _ => Err("no response from the endpoint".into()),
        };
    }

    let mut outstanding = 0usize;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                match line.split_once(' ').map_or((line, ""), |(cmd, rest)| (cmd, rest.trim())) {
                    ("", _) => {}
                    (":quit", _) => break,
                    (":help", _) => print_help(),
                    (":options", _) => controller.toggle_option_panel(),
                    (":ttl", index) => match index.parse::<usize>() {
                        Ok(index) if Ttl::from_index(index).is_some() => {
                            controller.select_ttl(index);
                            println!("links now expire: {}", controller.selected_ttl());
                        }
                        _ => eprintln!("expected an index between 0 and {}", Ttl::ALL.len() - 1),
                    },
                    (":history", _) => match shortener.history().await {
                        Ok(history) => {
                            if !history.note.is_empty() {
                                println!("{}", history.note);
                            }
                            println!("{} link(s) from {}", history.links.len(), history.ip);
                            for link in history.links.iter() {
                                println!("  {}", link);
                            }
                        }
                        Err(e) => eprintln!("error: {e}"),
                    },
                    _ if line.starts_with(':') => {
                        eprintln!("unknown command: {}", line);
                        print_help();
                    }
                    _ => {
                        if controller.submit(Some(line)) {
                            outstanding += 1;
                        }
                    }
                }
            }
            Some(_) = settled.recv() => {
                outstanding = outstanding.saturating_sub(1);
            }
        }
    }

    let remaining = wait_settled(&mut settled, outstanding, wait_limit).await;
    tracing::debug!("exiting with {} request(s) unresolved", remaining);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_in_range() {
        let args = Args::try_parse_from(["shortform", "--ttl", "5"]).unwrap();
        assert_eq!(args.ttl, 5);
        assert!(args.origin.is_none());
    }

    #[test]
    fn test_ttl_out_of_range_is_rejected() {
        assert!(Args::try_parse_from(["shortform", "--ttl", "6"]).is_err());
        assert!(Args::try_parse_from(["shortform", "--ttl", "-1"]).is_err());
    }
}
