use console::{Term, style};
use docgallery_core::grid::GridView;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::time::Duration;

const CELL_WIDTH: usize = 28;

pub fn viewport_width(term: &Term) -> u32 {
    let (_, cols) = term.size();
    u32::from(cols) * 8
}

pub fn print_grid(term: &Term, view: &GridView) -> io::Result<()> {
    term.write_line(&style(view.title).bold().to_string())?;
    if let Some(message) = view.message {
        term.write_line(message)?;
        return Ok(());
    }

    for (row_index, row) in view.rows().enumerate() {
        let titles: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(col, card)| {
                let number = row_index * view.columns + col + 1;
                pad(&format!("[{number}] {}", card.title))
            })
            .collect();
        term.write_line(&titles.join(" "))?;

        let images: Vec<String> = row
            .iter()
            .map(|card| {
                if card.show_spinner {
                    pad("  (loading...)")
                } else {
                    pad(&format!("  {}", card.thumbnail))
                }
            })
            .collect();
        term.write_line(&style(images.join(" ")).dim().to_string())?;
    }

    for card in &view.cards {
        if let Some(overlay) = &card.overlay {
            term.write_line(&format!(
                "{} {} ({})  [esc to close]",
                style("Preview:").cyan(),
                overlay.alt,
                overlay.image
            ))?;
        }
    }
    Ok(())
}

fn pad(text: &str) -> String {
    console::pad_str(text, CELL_WIDTH, console::Alignment::Left, Some("...")).into_owned()
}

pub fn save_indicator() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        bar.set_style(template);
    }
    bar
}

pub fn show_status(bar: &ProgressBar, text: String, saving: bool) {
    if saving {
        bar.enable_steady_tick(Duration::from_millis(100));
    } else {
        bar.disable_steady_tick();
    }
    bar.set_message(text);
}
