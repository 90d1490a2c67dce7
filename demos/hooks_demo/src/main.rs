//! Headless walkthrough of the Tarry hooks.
//!
//! Reads an optional JSON config (first argument) shaped like
//! `{"search": {"delay_ms": 300}, "upload": {"accept": "image/*", "max_size_mb": 2}}`,
//! then drives every hook on virtual time. Run with `RUST_LOG=debug` to see
//! the hooks' own logging.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Context;
use serde::Deserialize;
use tarry_core::prelude::*;
use tarry_hooks::*;
use web_time::Duration;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DemoConfig {
    search: DebounceConfig,
    upload: FileInputOptions,
}

fn load_config() -> anyhow::Result<DemoConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(DemoConfig {
            search: DebounceConfig {
                delay_ms: 300,
                max_wait_ms: Some(1000),
                ..DebounceConfig::default()
            },
            upload: FileInputOptions::default()
                .accept("image/*,.pdf")
                .max_size_mb(2.0),
        });
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

struct Screen {
    search: Rc<DebouncedInvoker<String, ()>>,
    panel: Rc<Expandable>,
    upload: Rc<FileInput>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = load_config()?;
    let (delay, options) = config.search.validate().context("search debounce config")?;
    log::info!("search debounce: {delay:?} {options:?}");

    let timers = Rc::new(ManualTimers::new());
    let composition = Composition::headless(timers.clone());
    let start = timers.now();
    let elapsed = {
        let timers = timers.clone();
        move || timers.now().duration_since(start)
    };

    let queries = Rc::new(RefCell::new(Vec::new()));
    let toasts = Rc::new(Cell::new(0u32));
    let menu = region_ref();
    let menu_closed = Rc::new(Cell::new(false));

    let screen = |show_toast: bool| -> anyhow::Result<Screen> {
        let upload_options = config.upload.clone();
        composition.compose(|| {
            let run_query: Target<String, ()> = {
                let queries = queries.clone();
                let elapsed = elapsed.clone();
                remember(move || -> Target<String, ()> {
                    Rc::new(move |q: String| {
                        log::info!("search {q:?} at {:?}", elapsed());
                        queries.borrow_mut().push(q);
                    })
                })
                .as_ref()
                .clone()
            };
            let search = use_debounce_callback(run_query, delay, options)?;

            let toast: Rc<dyn Fn()> = {
                let toasts = toasts.clone();
                remember(move || -> Rc<dyn Fn()> { Rc::new(move || toasts.set(toasts.get() + 1)) })
                    .as_ref()
                    .clone()
            };
            use_timeout(toast, show_toast.then(|| Duration::from_secs(2)));

            let close_menu: OutsideHandler = {
                let menu_closed = menu_closed.clone();
                remember(move || -> OutsideHandler {
                    Rc::new(move |_: &PointerEvent| menu_closed.set(true))
                })
                .as_ref()
                .clone()
            };
            use_click_outside(menu.clone(), close_menu, MouseTrigger::MouseDown);

            Ok(Screen {
                search,
                panel: use_expandable(false),
                upload: use_file_input(upload_options),
            })
        })
    };

    let ui = screen(true)?;

    for (i, q) in ["r", "ru", "rus", "rust"].into_iter().enumerate() {
        if i > 0 {
            timers.advance(Duration::from_millis(120));
        }
        ui.search.invoke(q.to_string());
    }
    log::info!("typing done, pending = {}", ui.search.is_pending());
    timers.advance(delay);

    ui.search.invoke("rust hooks".into());
    ui.search.flush();
    log::info!("queries sent: {:?}", queries.borrow());

    menu.set(Some(Rect::new(10.0, 10.0, 200.0, 120.0)));
    let click = |x, y| {
        PointerEvent::mouse(PointerEventKind::Down(PointerButton::Primary), Vec2::new(x, y))
    };
    composition.dispatch_pointer(&click(50.0, 50.0));
    log::info!("click inside menu, closed = {}", menu_closed.get());
    composition.dispatch_pointer(&click(400.0, 300.0));
    log::info!("click outside menu, closed = {}", menu_closed.get());

    ui.panel.set_content_height(180.0);
    ui.panel.toggle();
    let mut frames = 0;
    while ui.panel.tick() {
        timers.advance(Duration::from_millis(16));
        frames += 1;
    }
    log::info!(
        "panel opened to {:.1}px in {frames} frames",
        ui.panel.height()
    );

    for file in [
        SelectedFile::new("holiday.jpg", 3 * 1024 * 1024, "image/jpeg"),
        SelectedFile::new("notes.txt", 2_000, "text/plain"),
        SelectedFile::new("invoice.PDF", 40_000, "application/pdf"),
    ] {
        let name = file.name.clone();
        match ui.upload.validate_and_set(Some(file)) {
            Ok(()) => log::info!("upload {name}: accepted"),
            Err(e) => log::info!("upload {name}: {e}"),
        }
    }
    log::info!("selected file: {:?}", ui.upload.file_name());

    // Re-render without the toast; a timer still waiting is cleared.
    screen(false)?;
    timers.advance(Duration::from_secs(5));
    log::info!("toasts shown: {}", toasts.get());

    ui.search.invoke("never sent".into());
    composition.dispose();
    timers.advance(Duration::from_secs(5));
    log::info!(
        "after dispose: {} queries, {} listeners",
        queries.borrow().len(),
        composition.pointer().len()
    );

    Ok(())
}
