mod render;

use anyhow::{Context, Result, bail};
use console::Term;
use docgallery_common::GalleryConfig;
use docgallery_core::DocumentGrid;
use docgallery_core::card::CardTarget;
use docgallery_core::grid::GridPhase;
use docgallery_core::initialize_grid;
use docgallery_core::keyboard::Key;
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str =
    "commands: list | move <from> <to> | open <n> | esc | save | quit  (cards are numbered from 1)";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    List,
    Move { from: usize, to: usize },
    Open(usize),
    Escape,
    Save,
    Quit,
}

fn parse_command(line: &str) -> Result<Command> {
    let mut words = line.split_whitespace();
    let number = |word: Option<&str>| -> Result<usize> {
        let n: usize = word
            .context("missing card number")?
            .parse()
            .context("card numbers are integers")?;
        if n == 0 {
            bail!("cards are numbered from 1");
        }
        Ok(n - 1)
    };
    let command = match words.next() {
        Some("list") | Some("ls") => Command::List,
        Some("move") | Some("mv") => Command::Move {
            from: number(words.next())?,
            to: number(words.next())?,
        },
        Some("open") => Command::Open(number(words.next())?),
        Some("esc") => Command::Escape,
        Some("save") => Command::Save,
        Some("quit") | Some("q") => Command::Quit,
        Some(other) => bail!("unknown command '{other}'"),
        None => Command::List,
    };
    Ok(command)
}

/// Moves card `from` onto card `to` with the keyboard sensor.
async fn move_card(grid: &DocumentGrid, from: usize, to: usize) -> Result<()> {
    let ids = grid.drag_ids();
    let focused = ids.get(from).context("no such card")?.clone();
    if to >= ids.len() {
        bail!("no such card");
    }
    let step = if to > from { Key::ArrowRight } else { Key::ArrowLeft };

    grid.with_sortable(|sortable| sortable.key_down(&focused, Key::Space));
    for _ in 0..from.abs_diff(to) {
        grid.with_sortable(|sortable| sortable.key_down(&focused, step));
    }
    let Some(end) = grid.with_sortable(|sortable| sortable.key_down(&focused, Key::Enter)) else {
        return Ok(());
    };
    grid.handle_drag_end(end).await?;
    Ok(())
}

async fn run_command(grid: &DocumentGrid, command: Command) -> Result<()> {
    match command {
        Command::List | Command::Quit => {}
        Command::Move { from, to } => move_card(grid, from, to).await?,
        Command::Open(index) => {
            let document = grid
                .documents()
                .get(index)
                .cloned()
                .context("no such card")?;
            grid.with_card(document.id, |card| card.click(CardTarget::Body));
        }
        Command::Escape => grid.keys().dispatch(Key::Escape),
        Command::Save => {
            if let Some(result) = grid.save_now().await {
                result?;
            }
        }
    }
    Ok(())
}

// 端末に表示した時点でサムネイルは読み込み済みとみなす
fn mark_thumbnails_loaded(grid: &DocumentGrid) {
    for document in grid.documents() {
        grid.with_card(document.id, |card| card.image_loaded());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = GalleryConfig::from_env();
    info!("Starting document gallery...");

    let grid = initialize_grid(&config).context("Failed to set up the document grid")?;
    let term = Term::stdout();

    if grid.mount().await != GridPhase::Ready {
        render::print_grid(&term, &grid.render(render::viewport_width(&term)))?;
        error!("Document gallery could not load documents from {}", config.api_url);
        return Ok(());
    }

    let timers = grid.start_timers();
    let mut status = timers.status();
    let indicator = render::save_indicator();

    mark_thumbnails_loaded(&grid);
    indicator.suspend(|| render::print_grid(&term, &grid.render(render::viewport_width(&term))))?;
    indicator.suspend(|| term.write_line(HELP))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        indicator.suspend(|| term.write_line(&format!("{e:#}\n{HELP}")))?;
                        continue;
                    }
                };
                if command == Command::Quit {
                    break;
                }
                if let Err(e) = run_command(&grid, command).await {
                    warn!("Command failed: {e:#}");
                }
                mark_thumbnails_loaded(&grid);
                let view = grid.render(render::viewport_width(&term));
                indicator.suspend(|| render::print_grid(&term, &view))?;
                render::show_status(&indicator, view.status.to_string(), view.status.is_saving());
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let shown = *status.borrow_and_update();
                render::show_status(&indicator, shown.to_string(), shown.is_saving());
            }
        }
    }

    drop(timers);
    indicator.finish_and_clear();
    info!("Document gallery stopped.");
    Ok(())
}
