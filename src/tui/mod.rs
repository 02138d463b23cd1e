//! Terminal UI for Chess Play.

mod app;
mod input;
mod rest_client;
mod ui;

pub use app::{App, Effect};
pub use input::move_cursor;
pub use rest_client::{ArchiveClient, ArchiveSnapshot};
pub use ui::format_move_log;

use crate::AppConfig;
use anyhow::Result;
use chess_play_game::{BotTicket, GameSession, RandomBot, ShakmatyOracle};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

const TICK: Duration = Duration::from_secs(1);
const POLL: Duration = Duration::from_millis(50);

/// Runs the terminal board until the player quits.
pub async fn run_tui(config: AppConfig) -> Result<()> {
    // Log to a file; the terminal belongs to the board.
    let log_file = std::fs::File::create(config.log_file())?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init();

    info!(mode = %config.mode(), time_control = %config.time_control(), "Starting Chess Play TUI");

    let bot = match config.bot_seed() {
        Some(seed) => RandomBot::seeded(*seed),
        None => RandomBot::from_entropy(),
    };
    let session = GameSession::new(ShakmatyOracle::new(), config.session_settings())
        .with_mode(*config.mode())
        .with_bot(bot);
    let app = App::new(session);
    let archive = config.server_url().clone().map(ArchiveClient::new);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, app, archive).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = ?err, "Game loop error");
    }
    res
}

/// The single mutator of the session: keys, clock ticks and bot replies are
/// handled one at a time on this task.
#[instrument(skip_all)]
async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: App,
    mut archive: Option<ArchiveClient>,
) -> Result<()> {
    let (mut bot_timer, mut bot_rx) = BotTimer::new();
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        if event::poll(POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.handle_key(key.code) {
                        Some(Effect::Quit) => break,
                        Some(Effect::ScheduleBot(ticket)) => bot_timer.schedule(ticket),
                        Some(Effect::CancelBot) => {
                            bot_timer.cancel();
                            last_tick = Instant::now();
                        }
                        Some(Effect::Save) => save(&mut app, archive.as_mut()).await,
                        None => {}
                    }
                }
            }
        }

        while let Ok(ticket) = bot_rx.try_recv() {
            bot_timer.fired();
            app.play_bot(ticket);
        }

        while last_tick.elapsed() >= TICK {
            last_tick += TICK;
            app.tick();
        }
    }

    bot_timer.cancel();
    Ok(())
}

/// Delivers a bot ticket back to the event loop once its delay has elapsed.
///
/// At most one reply is pending. Scheduling replaces the previous timer and
/// cancelling aborts it, so an aborted ticket is never delivered.
#[derive(Debug)]
struct BotTimer {
    tx: mpsc::UnboundedSender<BotTicket>,
    pending: Option<JoinHandle<()>>,
}

impl BotTimer {
    fn new() -> (Self, mpsc::UnboundedReceiver<BotTicket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, pending: None }, rx)
    }

    #[instrument(skip(self, ticket), fields(epoch = ticket.epoch(), delay = ?ticket.delay()))]
    fn schedule(&mut self, ticket: BotTicket) {
        self.cancel();
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(*ticket.delay()).await;
            let _ = tx.send(ticket);
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            debug!("Cancelling pending bot reply");
            handle.abort();
        }
    }

    /// Forgets the handle of a timer that has already delivered. A newer
    /// timer scheduled since then stays pending.
    fn fired(&mut self) {
        if self.pending.as_ref().is_some_and(JoinHandle::is_finished) {
            self.pending = None;
        }
    }
}

async fn save(app: &mut App, archive: Option<&mut ArchiveClient>) {
    let Some(archive) = archive else {
        app.set_status("No archive server configured (--server-url)");
        return;
    };
    let Some(snapshot) = app.snapshot() else {
        return;
    };
    match archive.save(&snapshot).await {
        Ok(record) => app.set_status(format!(
            "Saved as game #{} on {}",
            record.id(),
            archive.base_url()
        )),
        Err(e) => {
            warn!(error = %e, "Save failed");
            app.set_status(format!("Save failed: {:#}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_play_game::{BotOutcome, GameMode, SessionSettings, SubmitOutcome};
    use tokio::time;

    fn bot_session() -> GameSession<ShakmatyOracle> {
        GameSession::new(ShakmatyOracle::new(), SessionSettings::default())
            .with_mode(GameMode::HumanVsBot)
            .with_bot(RandomBot::seeded(7))
    }

    fn human_move(session: &mut GameSession<ShakmatyOracle>, from: &str, to: &str) -> BotTicket {
        let outcome = session.submit_move(
            from.parse().expect("valid square"),
            to.parse().expect("valid square"),
        );
        match outcome {
            SubmitOutcome::Applied(applied) => {
                (*applied.bot_reply()).expect("bot reply should be scheduled")
            }
            other => panic!("Move was not applied: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_reply_arrives_once_after_delay() {
        let mut session = bot_session();
        let (mut timer, mut rx) = BotTimer::new();
        let ticket = human_move(&mut session, "e2", "e4");

        timer.schedule(ticket);
        time::sleep(*ticket.delay() - Duration::from_millis(1)).await;
        assert!(rx.try_recv().is_err(), "Reply delivered before its delay");

        let delivered = rx.recv().await.expect("Reply should be delivered");
        timer.fired();
        assert_eq!(delivered, ticket);
        assert!(matches!(session.play_bot_move(delivered), BotOutcome::Played(_)));
        assert_eq!(session.move_log().len(), 2);

        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err(), "Reply delivered twice");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_reply_is_never_delivered() {
        let mut session = bot_session();
        let (mut timer, mut rx) = BotTimer::new();
        let ticket = human_move(&mut session, "e2", "e4");

        timer.schedule(ticket);
        time::sleep(Duration::from_millis(100)).await;
        session.new_game();
        timer.cancel();

        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert!(session.move_log().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_pending_reply() {
        let mut session = bot_session();
        let (mut timer, mut rx) = BotTimer::new();

        let first = human_move(&mut session, "e2", "e4");
        timer.schedule(first);
        session.new_game();
        let second = human_move(&mut session, "d2", "d4");
        timer.schedule(second);

        let delivered = rx.recv().await.expect("Reply should be delivered");
        assert_eq!(delivered, second);
        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err(), "Replaced reply was still delivered");

        assert!(matches!(session.play_bot_move(delivered), BotOutcome::Played(_)));
        assert_eq!(session.move_log().len(), 2);
    }
}
