//! The terminal driver.
//!
//! One task owns the loop and multiplexes four inputs: the tick timer, stdin
//! lines, finished chat replies and Ctrl-C. Chat replies are produced by
//! spawned tasks working from a snapshot and come back over an mpsc channel,
//! so a slow backend never delays a tick or a command.

use std::cell::Cell;
use std::sync::Arc;

use anyhow::Result;
use tami_core::decay::TickOutcome;
use tami_core::{Clock, Lifecycle, PetSession, SystemClock, TamiConfig};
use tami_llm::{Companion, LlmClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::commands::{self, Command};
use crate::status;

type SharedCompanion = Arc<Companion<LlmClient>>;

enum Flow {
    Continue,
    Quit,
}

struct App {
    session: Arc<PetSession>,
    companion: SharedCompanion,
    chat_tx: mpsc::Sender<String>,
    name: String,
    lifecycle: Cell<Lifecycle>,
}

/// Run until `quit`, end of input or Ctrl-C, then save and back up.
pub async fn run(config: TamiConfig) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let session = Arc::new(PetSession::open(config.clone(), clock)?);
    let client = LlmClient::from_config(&config.llm)?;
    let companion = Arc::new(Companion::from_config(client, &config.llm));
    let (chat_tx, mut chat_rx) = mpsc::channel::<String>(16);

    let app = App {
        session: Arc::clone(&session),
        companion,
        chat_tx,
        name: config.general.pet_name.clone(),
        lifecycle: Cell::new(Lifecycle::Alive),
    };

    // Catch up on whatever happened while we were away.
    app.on_tick();
    println!("{}", app.render_status());
    println!("Type 'help' for commands.");
    app.spawn_opener();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_tick = Instant::now() + session.next_tick_interval();

    loop {
        tokio::select! {
            () = tokio::time::sleep_until(next_tick) => {
                app.on_tick();
                next_tick = Instant::now() + session.next_tick_interval();
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                if let Flow::Quit = app.on_line(&line) {
                    break;
                }
                // A nap changes the tick cadence.
                next_tick = next_tick.min(Instant::now() + session.next_tick_interval());
            }
            Some(text) = chat_rx.recv() => {
                println!("{}: {text}", app.name);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    shutdown(&session);
    Ok(())
}

fn shutdown(session: &PetSession) {
    if let Err(e) = session.save() {
        error!(error = %e, "Final save failed");
    }
    if let Err(e) = session.backup() {
        warn!(error = %e, "Backup failed");
    }
    info!("Goodbye");
}

impl App {
    fn render_status(&self) -> String {
        let pet = self.session.snapshot();
        let sleep_secs = self.session.config().sleep.duration_secs;
        status::render(&pet, &self.name, self.session.now(), sleep_secs)
    }

    fn on_tick(&self) {
        match self.session.tick() {
            Ok(TickOutcome::Decayed { .. }) => self.spawn_needs(),
            Ok(TickOutcome::WokeUp) => println!("{}: I just woke up! I feel full of energy", self.name),
            Ok(TickOutcome::Died(cause)) => {
                println!("{} has died of {cause}.", self.name);
                println!("{}", self.render_status());
            }
            Ok(TickOutcome::Recovering { .. } | TickOutcome::Idle) => {}
            Err(e) => error!(error = %e, "Tick failed"),
        }

        let now = self.session.snapshot().lifecycle();
        if status::should_alert(self.lifecycle.replace(now), now) {
            warn!(pet = %self.name, "Pet is in critical condition");
            println!("{}", status::alert(&self.name));
        }
    }

    fn on_line(&self, line: &str) -> Flow {
        let command = match commands::parse(line) {
            Ok(command) => command,
            Err(usage) => {
                println!("{usage}");
                return Flow::Continue;
            }
        };

        let result = match command {
            Command::Empty => Ok(()),
            Command::Quit => return Flow::Quit,
            Command::Help => {
                println!("{}", commands::HELP);
                Ok(())
            }
            Command::Status => {
                print!("{}", self.render_status());
                Ok(())
            }
            Command::Feed => self.care(self.session.feed(), "Yum, thank you!"),
            Command::Play => self.care(self.session.play(), "That was fun!"),
            Command::Clean => self.care(self.session.clean(), "Squeaky clean!"),
            Command::Sleep => self.care(self.session.sleep(), ""),
            Command::Remember { category, text } => self.remember(category, &text),
            Command::Memories(category) => self.list_memories(category),
            Command::Say(message) => self.chat(message),
        };

        if let Err(e) = result {
            error!(error = %e, "Command failed");
            println!("Something went wrong: {e}");
        }
        Flow::Continue
    }

    fn care(&self, result: tami_core::error::Result<Option<String>>, done: &str) -> Result<()> {
        match result? {
            Some(reply) => println!("{}: {reply}", self.name),
            None if !done.is_empty() => println!("{}: {done}", self.name),
            None => {}
        }
        Ok(())
    }

    fn remember(&self, category: tami_core::MemoryCategory, text: &str) -> Result<()> {
        match self.session.add_memory(category, text) {
            Ok(()) => println!("{}: I'll remember that!", self.name),
            Err(tami_core::TamiError::InvalidMemory { reason }) => println!("Can't remember that: {reason}"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn list_memories(&self, category: Option<tami_core::MemoryCategory>) -> Result<()> {
        let memories = self.session.memories(category)?;
        if memories.is_empty() {
            println!("{}: I don't remember anything yet.", self.name);
        }
        for memory in memories {
            println!("  {}", memory.render());
        }
        Ok(())
    }

    fn chat(&self, message: String) -> Result<()> {
        if message.trim().is_empty() {
            return Ok(());
        }
        // A dead pet earns nothing but still gets its silent answer below.
        self.session.record_chat(&message)?;
        let snapshot = self.session.chat_snapshot()?;
        let companion = Arc::clone(&self.companion);
        let tx = self.chat_tx.clone();
        tokio::spawn(async move {
            if let Some(text) = companion.reply(&message, &snapshot).await {
                let _ = tx.send(text).await;
            }
        });
        Ok(())
    }

    fn spawn_needs(&self) {
        let snapshot = match self.session.chat_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Could not snapshot pet for needs check");
                return;
            }
        };
        let companion = Arc::clone(&self.companion);
        let tx = self.chat_tx.clone();
        tokio::spawn(async move {
            if let Some(text) = companion.needs_message(&snapshot).await {
                let _ = tx.send(text).await;
            }
        });
    }

    fn spawn_opener(&self) {
        let Ok(snapshot) = self.session.chat_snapshot() else {
            return;
        };
        let companion = Arc::clone(&self.companion);
        let tx = self.chat_tx.clone();
        tokio::spawn(async move {
            if let Some(text) = companion.opener(&snapshot).await {
                let _ = tx.send(text).await;
            }
        });
    }
}
