// Interactive deck: one line of input per decision

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use colored::Colorize;
use jobdeck_core::application::{DeckConfig, PointerSample, PointerUpOutcome, SwipeDeck};
use jobdeck_core::port::{preference_channel, JobFeed, SwipeTelemetry};
use jobdeck_core::AppError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::render;

const HELP: &str = "l/pass  r/like  drag <dx> <ms>  prefs  refresh  stats  q";
const RELOAD_POLL: Duration = Duration::from_millis(25);
const RELOAD_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq)]
enum BrowseCommand {
    Pass,
    Like,
    /// Simulated pointer drag: horizontal travel in px over `ms`
    Drag { dx: f64, ms: i64 },
    Prefs,
    Refresh,
    Stats,
    Help,
    Quit,
}

fn parse_command(line: &str) -> std::result::Result<BrowseCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(BrowseCommand::Help);
    };

    match verb.to_ascii_lowercase().as_str() {
        "l" | "pass" => Ok(BrowseCommand::Pass),
        "r" | "like" => Ok(BrowseCommand::Like),
        "prefs" => Ok(BrowseCommand::Prefs),
        "refresh" | "retry" => Ok(BrowseCommand::Refresh),
        "stats" => Ok(BrowseCommand::Stats),
        "h" | "help" | "?" => Ok(BrowseCommand::Help),
        "q" | "quit" | "exit" => Ok(BrowseCommand::Quit),
        "drag" => {
            let dx = parts
                .next()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|dx| dx.is_finite())
                .ok_or_else(|| "usage: drag <dx> <ms>".to_string())?;
            let ms = parts
                .next()
                .and_then(|s| s.parse::<i64>().ok())
                .filter(|ms| *ms > 0)
                .ok_or_else(|| "usage: drag <dx> <ms> (ms > 0)".to_string())?;
            Ok(BrowseCommand::Drag { dx, ms })
        }
        other => Err(format!("unknown command '{}'", other)),
    }
}

/// Press, move halfway, release: the same trajectory a pointer would report
fn simulate_drag(deck: &SwipeDeck, card_id: &str, dx: f64, ms: i64, clock: &Instant) -> PointerUpOutcome {
    let start = clock.elapsed().as_millis() as i64;
    if !deck.on_pointer_down(card_id, PointerSample::new(0.0, 0.0, start)) {
        return PointerUpOutcome::Ignored;
    }
    deck.on_pointer_move(card_id, PointerSample::new(dx / 2.0, 0.0, start + ms / 2));
    deck.on_pointer_up(card_id, Some(PointerSample::new(dx, 0.0, start + ms)))
}

async fn report(deck: &SwipeDeck, card_id: &str, outcome: PointerUpOutcome) {
    match outcome {
        PointerUpOutcome::Committed(receipt) => {
            let verdict = if receipt.direction.is_like() {
                "✓ Liked".green().bold()
            } else {
                "✗ Passed".red().bold()
            };
            println!("{} {}", verdict, receipt.job_id);

            // No exit animation in a terminal
            if let Err(e) = deck.on_exit_complete(card_id) {
                warn!(card_id = %card_id, error = %e, "Exit completion rejected");
            }

            // Only wait for the next page when there is nothing left to show
            if let Some(prefetch) = receipt.prefetch {
                if receipt.remaining == 0 {
                    println!("{}", "Loading more jobs...".dimmed());
                    if let Err(e) = prefetch.await {
                        warn!(error = %e, "Prefetch task failed");
                    }
                }
            }
        }
        PointerUpOutcome::Cancelled => println!("{}", "↺ Snapped back".yellow()),
        PointerUpOutcome::Stale { job_id } => {
            println!("{} {}", "Card already handled:".yellow(), job_id)
        }
        PointerUpOutcome::Ignored => println!("{}", "Nothing to swipe".yellow()),
    }
}

fn show(deck: &SwipeDeck) {
    let window = deck.visible_window();
    println!();
    if window.is_empty() {
        if deck.is_terminal() {
            println!("{}", "You've seen every job".cyan().bold());
            println!("  {}", render::stats_line(&deck.stats()));
        } else {
            println!("{}", "Loading more jobs...".dimmed());
        }
    } else {
        print!("{}", render::stack(&window));
    }
    println!();
    println!("{}", HELP.dimmed());
}

/// Wait until a reload started after `generation` has landed or failed.
/// Returns false if it is still running after `RELOAD_TIMEOUT`.
async fn wait_for_reload(deck: &SwipeDeck, generation: u64) -> bool {
    let reloaded = async {
        loop {
            let snapshot = deck.queue_snapshot();
            if snapshot.generation != generation && !snapshot.load_in_flight {
                return;
            }
            tokio::time::sleep(RELOAD_POLL).await;
        }
    };
    tokio::time::timeout(RELOAD_TIMEOUT, reloaded).await.is_ok()
}

async fn load_or_explain(deck: &SwipeDeck, refresh: bool) {
    let result = if refresh { deck.refresh().await } else { deck.load().await };
    match result {
        Ok(0) => println!("{}", "No jobs available right now".yellow()),
        Ok(loaded) => println!("{}", format!("Loaded {} jobs", loaded).dimmed()),
        // A preference reload replaced this one; its result is already showing
        Err(AppError::StaleEvent(_)) => {
            println!("{}", "Deck was reloaded in the background".dimmed())
        }
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            println!("  Type {} to try again", "retry".bold());
        }
    }
}

pub async fn run(
    config: DeckConfig,
    feed: Arc<dyn JobFeed>,
    telemetry: Arc<dyn SwipeTelemetry>,
) -> Result<()> {
    let (notifier, subscription) = preference_channel();
    let deck = SwipeDeck::new(config, feed, telemetry, Some(subscription))?;
    let _listener = deck.spawn_preference_listener();
    let clock = Instant::now();

    load_or_explain(&deck, false).await;
    show(&deck);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message.red());
                continue;
            }
        };

        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => {}
            BrowseCommand::Stats => {
                println!("  {}", render::stats_line(&deck.stats()));
                continue;
            }
            BrowseCommand::Refresh => load_or_explain(&deck, true).await,
            BrowseCommand::Prefs => {
                let generation = deck.queue_snapshot().generation;
                notifier.notify();
                println!("{}", "Preferences changed; reloading the deck".dimmed());
                if !wait_for_reload(&deck, generation).await {
                    println!("{}", "Still reloading, the deck will catch up".yellow());
                }
            }
            BrowseCommand::Pass | BrowseCommand::Like | BrowseCommand::Drag { .. } => {
                let Some(top) = deck.top_card() else {
                    println!("{}", "Nothing to swipe".yellow());
                    continue;
                };
                let outcome = match command {
                    BrowseCommand::Pass => deck.pass(&top.id),
                    BrowseCommand::Like => deck.like(&top.id),
                    BrowseCommand::Drag { dx, ms } => simulate_drag(&deck, &top.id, dx, ms, &clock),
                    _ => PointerUpOutcome::Ignored,
                };
                report(&deck, &top.id, outcome).await;
            }
        }
        show(&deck);
    }

    println!("Session: {}", render::stats_line(&deck.stats()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobdeck_core::port::job_feed::mocks::MockJobFeed;
    use jobdeck_core::port::NoopSwipeTelemetry;

    #[test]
    fn test_parse_shortcuts() {
        assert_eq!(parse_command("l"), Ok(BrowseCommand::Pass));
        assert_eq!(parse_command("LIKE"), Ok(BrowseCommand::Like));
        assert_eq!(parse_command("retry"), Ok(BrowseCommand::Refresh));
        assert_eq!(parse_command("   "), Ok(BrowseCommand::Help));
        assert_eq!(parse_command("q"), Ok(BrowseCommand::Quit));
    }

    #[test]
    fn test_parse_drag() {
        assert_eq!(
            parse_command("drag -120 300"),
            Ok(BrowseCommand::Drag { dx: -120.0, ms: 300 })
        );
        assert!(parse_command("drag 50").is_err());
        assert!(parse_command("drag 50 0").is_err());
        assert!(parse_command("drag abc 10").is_err());
        assert!(parse_command("jump").is_err());
    }

    #[tokio::test]
    async fn test_simulated_drag_goes_through_thresholds() {
        let deck = SwipeDeck::new(
            DeckConfig::default(),
            Arc::new(MockJobFeed::with_catalog(10)),
            Arc::new(NoopSwipeTelemetry),
            None,
        )
        .unwrap();
        deck.load().await.unwrap();
        let clock = Instant::now();

        let slow = simulate_drag(&deck, "job-1", 60.0, 1000, &clock);
        assert!(matches!(slow, PointerUpOutcome::Cancelled));

        let flick = simulate_drag(&deck, "job-1", -80.0, 100, &clock);
        assert!(flick.is_committed());
        assert_eq!(deck.stats().passed, 1);
        assert_eq!(deck.top_card().unwrap().id, "job-2");
    }

    #[tokio::test]
    async fn test_prefs_waits_for_listener_reload() {
        let (notifier, subscription) = preference_channel();
        let deck = SwipeDeck::new(
            DeckConfig::default(),
            Arc::new(MockJobFeed::with_catalog(30)),
            Arc::new(NoopSwipeTelemetry),
            Some(subscription),
        )
        .unwrap();
        deck.load().await.unwrap();
        let _listener = deck.spawn_preference_listener().unwrap();
        assert!(deck.like("job-1").is_committed());

        let generation = deck.queue_snapshot().generation;
        notifier.notify();
        assert!(wait_for_reload(&deck, generation).await);

        let snapshot = deck.queue_snapshot();
        assert_eq!(snapshot.generation, generation + 1);
        assert_eq!(snapshot.len, 20);
        assert_eq!(deck.top_card().unwrap().id, "job-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_reload_gives_up() {
        let deck = SwipeDeck::new(
            DeckConfig::default(),
            Arc::new(MockJobFeed::with_catalog(5)),
            Arc::new(NoopSwipeTelemetry),
            None,
        )
        .unwrap();
        deck.load().await.unwrap();

        // Nobody resets the queue, so the generation never moves
        let generation = deck.queue_snapshot().generation;
        assert!(!wait_for_reload(&deck, generation).await);
    }
}
