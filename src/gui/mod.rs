//! Canvas windows for displaying rendered frames.
//!
//! The winit event loop owns the main thread; application code runs on a
//! secondary thread started by [`run`] and submits images with
//! [`show_image`]. Windows are resizable; the current canvas size of a window
//! can be queried with [`canvas_resolution`], so that the caller can rebuild
//! its canvas to match before the next [`show_image`].

mod renderer;

use std::{
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
    process,
    rc::Rc,
    sync::Mutex,
};

use once_cell::sync::OnceCell;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopClosed, EventLoopProxy},
    window::WindowId,
};

use crate::image::{Image, Resolution};

use self::renderer::{Gpu, Renderer, Window};

struct Gui {
    gpu: Rc<Gpu>,
    windows: HashMap<String, Renderer>,
    win_id_to_key: HashMap<WindowId, String>,
}

impl Gui {
    fn new() -> Self {
        Self {
            gpu: Rc::new(pollster::block_on(Gpu::open()).unwrap()),
            windows: HashMap::new(),
            win_id_to_key: HashMap::new(),
        }
    }

    fn key_of(&self, win: WindowId) -> Option<String> {
        self.win_id_to_key.get(&win).cloned()
    }

    fn run(mut self, event_loop: EventLoop<Msg>) -> ! {
        event_loop.run(move |event, target, flow| {
            *flow = ControlFlow::Wait;
            match event {
                Event::UserEvent(Msg::Image { key, res, data }) => {
                    let renderer = self.windows.entry(key.clone()).or_insert_with(|| {
                        log::debug!("creating window for canvas '{key}' at {res}");

                        let win = Window::open(target, &key, res).unwrap();
                        let win_id = win.win.id();
                        let renderer = Renderer::new(win, self.gpu.clone()).unwrap();

                        self.win_id_to_key.insert(win_id, key.clone());
                        renderer
                    });

                    publish_canvas_resolution(&key, renderer.canvas_resolution());
                    renderer.update_texture(res, &data);
                    renderer.window().request_redraw();
                }
                Event::WindowEvent { window_id, event } => match event {
                    WindowEvent::Resized(size) => {
                        let Some(key) = self.key_of(window_id) else { return };
                        publish_canvas_resolution(&key, Resolution::new(size.width, size.height));

                        let renderer = self.windows.get_mut(&key).unwrap();
                        renderer.resized();
                        renderer.window().request_redraw();
                    }
                    WindowEvent::CloseRequested => {
                        // No teardown protocol; closing the canvas ends the
                        // session.
                        process::exit(0);
                    }
                    _ => {}
                },
                Event::RedrawRequested(window_id) => {
                    let Some(key) = self.key_of(window_id) else { return };
                    self.windows.get_mut(&key).unwrap().redraw();
                }
                _ => {}
            }
        });
    }
}

#[derive(Debug)]
enum Msg {
    Image {
        key: String,
        res: Resolution,
        data: Vec<u8>,
    },
}

/// A connection to the display thread.
struct Display {
    proxy: Mutex<EventLoopProxy<Msg>>,
    canvas_sizes: Mutex<HashMap<String, Resolution>>,
}

impl Display {
    fn get() -> &'static Display {
        DISPLAY.get().expect("display not initialized")
    }
}

static DISPLAY: OnceCell<Display> = OnceCell::new();

fn publish_canvas_resolution(key: &str, res: Resolution) {
    Display::get()
        .canvas_sizes
        .lock()
        .unwrap()
        .insert(key.to_string(), res);
}

fn send(msg: Msg) {
    Display::get()
        .proxy
        .lock()
        .unwrap()
        .send_event(msg)
        .map_err(|_closed| EventLoopClosed(()))
        .unwrap();
}

/// Starts the display event loop and runs `cb` on a secondary thread.
///
/// This function never returns; when `cb` returns or panics, the process
/// exits with a matching status code.
pub fn run<F>(cb: F) -> !
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    let event_loop = EventLoopBuilder::with_user_event().build();
    let display = Display {
        proxy: Mutex::new(event_loop.create_proxy()),
        canvas_sizes: Mutex::new(HashMap::new()),
    };
    DISPLAY
        .set(display)
        .ok()
        .expect("display already initialized");

    // Display is now initialized; spawn another thread to run the application
    // code.
    std::thread::spawn(move || {
        let result = catch_unwind(AssertUnwindSafe(cb));
        match result {
            Ok(Ok(())) => process::exit(0),
            Ok(Err(e)) => {
                log::error!("{:?}", e);
                process::exit(1);
            }
            Err(_payload) => {
                // Panic handler has printed the panic message and backtrace
                // already, exit with 101 to mimick libstd behavior.
                process::exit(101);
            }
        }
    });

    let gui = Gui::new();
    gui.run(event_loop)
}

/// Displays an image in the window identified by `key`, creating the window
/// if necessary.
pub fn show_image(key: impl Into<String>, image: &Image) {
    // Image data is RGBA8 internally so that no conversion before GPU upload
    // is needed.
    send(Msg::Image {
        key: key.into(),
        res: image.resolution(),
        data: image.data().to_vec(),
    });
}

/// Returns the current canvas size of the window identified by `key`.
///
/// Returns [`None`] until the window has been created by a first
/// [`show_image`] call. Resizing the window to the same size twice leaves
/// the reported resolution (and any fit computed from it) unchanged.
pub fn canvas_resolution(key: &str) -> Option<Resolution> {
    DISPLAY.get()?.canvas_sizes.lock().unwrap().get(key).copied()
}
