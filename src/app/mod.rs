use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Rect, Vec2};
use log::{error, info};

use crate::board::{Board, CardFilter, IdeaCard, IdeaSet, load_board, sample_board};
use crate::sim::{Anchor, FrameLoop, QuadtreeCell, SimConfig, Simulator};

mod graph;
mod render_utils;
mod ui;

/// Startup choices collected from the command line.
#[derive(Clone, Debug)]
pub struct Launch {
    pub board: Option<PathBuf>,
    pub config: SimConfig,
    pub seed: Option<u64>,
    pub filter: CardFilter,
}

impl Launch {
    fn source_label(&self) -> String {
        match &self.board {
            Some(path) => path.display().to_string(),
            None => "sample board".to_owned(),
        }
    }
}

pub struct ThreadsApp {
    launch: Launch,
    state: AppState,
    reload_rx: Option<Receiver<Result<Board, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Board, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    board: Board,
    source: String,
    filter: CardFilter,
    cards: Vec<IdeaCard>,
    sets: Vec<IdeaSet>,
    categories: Vec<String>,
    simulator: Simulator,
    frame_loop: FrameLoop,
    paused: bool,
    anchor: Anchor,
    find: String,
    find_cache: Option<FindCache>,
    selected: Option<String>,
    link_target: Option<String>,
    dragging: Option<DragGrab>,
    pan: Vec2,
    zoom: f32,
    show_quadtree_overlay: bool,
    view_scratch: ViewScratch,
    board_revision: u64,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
    tick_millis: f32,
    visible_card_count: usize,
    visible_thread_count: usize,
}

struct FindCache {
    query: String,
    board_revision: u64,
    matches: Arc<HashSet<String>>,
}

/// Card held by the pointer and where it was grabbed, relative to its node.
struct DragGrab {
    id: String,
    offset: Vec2,
}

#[derive(Default)]
struct ViewScratch {
    card_rects: Vec<Rect>,
    quadtree_cells: Vec<QuadtreeCell>,
}

impl ThreadsApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, launch: Launch) -> Self {
        let state = Self::start_load(&launch);
        Self {
            launch,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(board: Option<PathBuf>) -> Receiver<Result<Board, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = match board {
                Some(path) => load_board(&path).map_err(|error| format!("{error:#}")),
                None => Ok(sample_board()),
            };
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(launch: &Launch) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(launch.board.clone()),
        }
    }

    fn ready(&self, ctx: &Context, board: Board) -> AppState {
        info!("threads view ready for {}", self.launch.source_label());
        AppState::Ready(Box::new(ViewModel::new(ctx, board, &self.launch)))
    }
}

impl eframe::App for ThreadsApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(result);
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading board...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(message) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the board");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.launch.board.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => self.reload_rx = Some(rx),
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(&self.launch);
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            if let AppState::Ready(model) = &mut self.state {
                model.unmount();
            }
            self.state = match result {
                Ok(board) => self.ready(ctx, board),
                Err(message) => {
                    error!("board load failed: {message}");
                    AppState::Error(message)
                }
            };
        }
    }
}
