use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use tracing_subscriber::EnvFilter;

use shrinetrack::app::{App, HomeEntry, Page, filter_label};
use shrinetrack::config::Config;
use shrinetrack::event::{AppEvent, EventHandler};
use shrinetrack::nav::{FocusHandle, FocusTarget, InteractionMode, PageKind};
use shrinetrack::store::ProgressBackend;
use shrinetrack::store::json_store::JsonStore;
use shrinetrack::ui;
use shrinetrack::ui::components::detail_dialog::{self, DetailDialog};
use shrinetrack::ui::components::filter_bar::{Chip, FilterBar, SearchField};
use shrinetrack::ui::components::help_overlay::HelpOverlay;
use shrinetrack::ui::components::item_grid::ItemGrid;
use shrinetrack::ui::components::menu::{Menu, MenuItem};
use shrinetrack::ui::components::offering_list::OfferingList;
use shrinetrack::ui::components::palette_view::PaletteView;
use shrinetrack::ui::components::sidebar::Sidebar;
use shrinetrack::ui::components::temple_overview::TempleOverview;
use shrinetrack::ui::layout::{AppLayout, CategoryLayout};

const TICK_RATE: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(
    name = "shrinetrack",
    version,
    about = "Track collections, villager hearts and temple offerings from the terminal"
)]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Save slot to open")]
    slot: Option<u8>,

    #[arg(long, value_name = "URL", help = "Sync progress with a tracker server")]
    api: Option<String>,

    #[arg(long, value_name = "PATH", help = "Log file (default: data dir)")]
    log_file: Option<PathBuf>,
}

fn init_tracing(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| JsonStore::default_dir().join("shrinetrack.log"));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env("SHRINETRACK_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout belongs to the terminal UI
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

#[cfg(feature = "network")]
fn remote_backend(config: &Config) -> Option<Box<dyn ProgressBackend>> {
    use shrinetrack::store::api::ApiClient;
    use shrinetrack::store::queued::QueuedBackend;

    let (url, token) = config.remote()?;
    match ApiClient::new(url, token) {
        Ok(client) => {
            tracing::info!(url, "using remote progress backend");
            Some(Box::new(QueuedBackend::spawn(Box::new(client))))
        }
        Err(e) => {
            tracing::warn!(error = %e, "remote backend unavailable, staying local");
            None
        }
    }
}

#[cfg(not(feature = "network"))]
fn remote_backend(config: &Config) -> Option<Box<dyn ProgressBackend>> {
    if config.remote().is_some() {
        tracing::warn!("built without the network feature; api settings ignored");
    }
    None
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file)?;

    let mut config = Config::load()?;
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(api) = cli.api {
        config.api_base_url = Some(api);
    }
    if config.api_base_url.is_some() && config.session_token.is_none() {
        tracing::warn!("api_base_url set without session_token; progress stays local");
    }
    config.validate();

    let store = JsonStore::new()?;
    let remote = remote_backend(&config);
    let mut app = App::new(config, Some(store), remote, cli.slot)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(TICK_RATE);

    let result = run_app(&mut terminal, &mut app, &events);
    app.flush();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = %err, "exiting after error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        let size = terminal.size()?;
        app.update_geometry(Rect::new(0, 0, size.width, size.height));
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => app.handle_key(key, Instant::now()),
            AppEvent::Mouse(mouse) => app.handle_mouse(mouse, Instant::now()),
            AppEvent::Tick => {
                app.tick(Instant::now());
            }
            AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    let layout = AppLayout::new(area, app.ui.sidebar_open);
    render_header(frame, app, layout.header);

    if let Some(sidebar_area) = layout.sidebar {
        let current = match app.page {
            Page::Category(ci) => Some(ci),
            _ => None,
        };
        let sidebar = Sidebar::new(&app.catalog, &app.progress, current, app.slot, &app.theme);
        frame.render_widget(sidebar, sidebar_area);
    }

    match app.page {
        Page::Home => render_home(frame, app, layout.main),
        Page::SaveSlots => render_slots(frame, app, layout.main),
        Page::Temple => {
            let overview = TempleOverview::new(&app.catalog, &app.progress, app.temple_cursor, &app.theme);
            frame.render_widget(overview, layout.main);
        }
        Page::Category(_) => render_category(frame, app, layout.main),
    }

    render_footer(frame, app, layout.footer);

    if let Some(view) = app.detail
        && let Some(category) = app.catalog.category(view.category)
        && let Some(item) = category.items.get(view.item)
    {
        let dialog = DetailDialog::new(category, item, &app.progress, app.detail_control(), &app.theme);
        frame.render_widget(dialog, detail_dialog::dialog_area(area));
    }
    if let Some(palette) = &app.palette {
        let palette_area = ui::layout::centered_rect(60, 60, area);
        frame.render_widget(PaletteView::new(palette, &app.catalog, &app.theme), palette_area);
    }
    if app.hub.is_help_open() {
        let help_area = ui::layout::centered_rect(60, 80, area);
        frame.render_widget(HelpOverlay::new(&app.theme), help_area);
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let page_name = match app.page {
        Page::Home => "Home".to_string(),
        Page::SaveSlots => "Save slots".to_string(),
        Page::Temple => "Temple".to_string(),
        Page::Category(ci) => app
            .catalog
            .category(ci)
            .map(|c| c.name.clone())
            .unwrap_or_default(),
    };
    let mode = match app.interaction_mode() {
        InteractionMode::Keyboard => "keyboard",
        InteractionMode::Mouse => "mouse",
    };
    let info = format!(
        " {page_name} | slot {} ({}) | {mode}",
        app.slot,
        app.backend_label()
    );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " shrinetrack ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(info, Style::default().fg(colors.muted()).bg(colors.header_bg())),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_home(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let items = app
        .home_entries()
        .into_iter()
        .map(|entry| match entry {
            HomeEntry::SaveSlots => MenuItem::new("S", "Save slots", format!("Playing slot {}", app.slot)),
            HomeEntry::Temple => {
                let altars = app.altar_indices().len();
                MenuItem::new("T", "Temple", format!("{altars} altars"))
            }
            HomeEntry::Category(ci) => {
                let category = &app.catalog.categories[ci];
                let (done, total) = app.progress.completion(category);
                let key = match ci {
                    0..=8 => (ci + 1).to_string(),
                    9 => "0".to_string(),
                    _ => "-".to_string(),
                };
                MenuItem::new(key, category.name.clone(), format!("{done} of {total} complete"))
            }
        })
        .collect();
    let menu = Menu::new("shrinetrack", "Collection tracker", items, &app.theme).selected(app.home_cursor);
    frame.render_widget(&menu, ui::layout::centered_rect(60, 90, area));
}

fn render_slots(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let total = app.total_items();
    let items = app
        .slot_summaries
        .iter()
        .map(|summary| {
            let active = if summary.slot == app.slot { " (active)" } else { "" };
            let description = match (&summary.error, summary.updated_at) {
                (Some(error), _) => format!("unavailable: {error}"),
                (None, Some(at)) => format!(
                    "{} of {total} complete, updated {}",
                    summary.done,
                    at.format("%Y-%m-%d %H:%M")
                ),
                (None, None) => "empty".to_string(),
            };
            MenuItem::new(summary.slot.to_string(), format!("Slot {}{active}", summary.slot), description)
        })
        .collect();
    let menu = Menu::new("Save slots", "Enter switches slot", items, &app.theme).selected(app.slot_cursor);
    frame.render_widget(&menu, ui::layout::centered_rect(60, 80, area));
}

fn render_category(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let Some(category) = app.current_category() else {
        return;
    };
    let colors = &app.theme.colors;
    let show_focus = app.interaction_mode() == InteractionMode::Keyboard;
    let regions = CategoryLayout::new(area);

    let (done, total) = app.progress.completion(category);
    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", category.name),
            Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {done}/{total}"), Style::default().fg(colors.muted())),
    ]));
    frame.render_widget(title, regions.title);

    if app.page_kind() == PageKind::Altar {
        let list = OfferingList::new(category, app.offerings.state(), &app.progress, show_focus, &app.theme);
        frame.render_widget(list, regions.altar_list());
        return;
    }

    let search_focused = app.focus.focused() == Some(FocusTarget::SearchInput);
    frame.render_widget(SearchField::new(&app.search, search_focused, &app.theme), regions.search);

    let filters = app.hub.filters();
    let chips = filters
        .registered()
        .map(|index| Chip {
            label: filter_label(index),
            on: app.is_filter_on(index),
            tab_stop: filters.tab_index(index) == 0,
            focused: filters.is_active() && filters.focused() == Some(index),
        })
        .collect();
    frame.render_widget(FilterBar::new(chips, filters.is_active(), &app.theme), regions.filters);

    let focused = match app.focus.focused() {
        Some(FocusTarget::GridItem(index)) => Some(index),
        _ => None,
    };
    let grid = ItemGrid::new(
        category,
        &app.visible,
        &app.progress,
        app.viewport,
        app.config.cell_width,
        &app.theme,
    )
    .focus(focused, show_focus);
    frame.render_widget(grid, regions.grid);
}

fn page_hints(app: &App) -> Vec<&'static str> {
    match app.page_kind() {
        PageKind::Home | PageKind::TempleOverview | PageKind::SaveSlots => vec![
            "[j/k] move",
            "[Enter] open",
            "[1-0] category",
            "[Ctrl+K] go to",
            "[?] help",
            "[q] quit",
        ],
        PageKind::Grid => vec![
            "[arrows] move",
            "[Enter] toggle",
            "[i] details",
            "[+/-] hearts",
            "[/] search",
            "[f] filters",
            "[Tab] region",
            "[?] help",
        ],
        PageKind::Altar => vec![
            "[j/k] move",
            "[Enter] expand / offer",
            "[Esc] collapse",
            "[Ctrl+K] go to",
            "[?] help",
        ],
    }
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let mut lines = Vec::new();
    if let Some(status) = &app.status {
        let color = if status.is_error { colors.error() } else { colors.success() };
        lines.push(Line::from(Span::styled(format!(" {}", status.text), Style::default().fg(color))));
    }
    let hints = page_hints(app);
    for line in ui::layout::pack_hint_lines(&hints, usize::from(area.width)) {
        lines.push(Line::from(Span::styled(line, Style::default().fg(colors.muted()))));
    }
    frame.render_widget(Paragraph::new(lines), area);
}
