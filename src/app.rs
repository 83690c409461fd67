use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::style::Color;
use std::time::Instant;

use crate::config::AppConfig;
use crate::player::{self, volume, Player};
use crate::prompt::{AddStreamFlow, FileForm, Step, StreamForm};
use crate::streams::StreamList;
use crate::theme::{colorize, parse_hex_color, Labeled, Palette};

/// Seconds a status message stays on the info line
const STATUS_SECONDS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    AddStream, // Two-stage name/address prompt
    Help,
    Confirm,
}

/// A stream button as drawn in the terminal
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRow {
    pub name: String,
    pub label: String,
    pub color: Color,
}

impl Labeled for StreamRow {
    fn label(&self) -> &str {
        &self.label
    }

    fn set_label(&mut self, label: String) {
        self.label = label;
    }

    fn set_color(&mut self, color: &str) {
        self.color = parse_hex_color(color).unwrap_or(Color::Reset);
    }
}

/// Colorized buttons for every stream in the list
pub fn stream_rows(streams: &StreamList, palette: &Palette) -> Vec<StreamRow> {
    let mut rows: Vec<StreamRow> = streams
        .streams()
        .iter()
        .map(|s| StreamRow {
            name: s.name.clone(),
            label: s.name.clone(),
            color: Color::Reset,
        })
        .collect();

    colorize(&mut rows, palette);
    rows
}

pub struct App {
    pub popup: Popup,

    pub config: AppConfig,
    pub palette: Palette,

    // Stream list and its buttons
    pub streams: StreamList,
    pub rows: Vec<StreamRow>,
    pub selected: usize,

    // Playback
    pub player: Player,
    pub playing: Option<usize>,
    pub volume: Option<u8>, // None if wpctl is unavailable

    // Add-stream prompt
    pub flow: Option<AddStreamFlow>,
    pub input_buffer: String,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
}

impl App {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let streams = StreamList::load(&config.streams_file)?;

        let volume = match volume::get_volume().await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Could not read volume: {}", e);
                None
            }
        };

        Ok(Self::from_parts(config, streams, volume))
    }

    pub fn from_parts(config: AppConfig, streams: StreamList, volume: Option<u8>) -> Self {
        let palette = Palette::from_config(config.palette.as_deref());
        let player = Player::new(config.player.clone(), config.sink.clone());
        let rows = stream_rows(&streams, &palette);

        Self {
            popup: Popup::None,
            config,
            palette,
            streams,
            rows,
            selected: 0,
            player,
            playing: None,
            volume,
            flow: None,
            input_buffer: String::new(),
            status_message: None,
            status_message_time: None,
        }
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Question shown in the add-stream popup
    pub fn prompt_question(&self) -> &'static str {
        self.flow
            .as_ref()
            .map(|f| f.question())
            .unwrap_or_default()
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle popups first
        if self.popup != Popup::None {
            return self.handle_popup_key(key).await;
        }

        self.handle_normal_key(key).await
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),

            // Play selected, or stop if it is already playing
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_selected().await?,
            KeyCode::Char('s') => {
                self.player.stop().await?;
                self.playing = None;
                self.set_status("Stopped");
            }

            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.change_volume(self.config.volume_step as i16).await
            }
            KeyCode::Char('-') => self.change_volume(-(self.config.volume_step as i16)).await,

            KeyCode::Char('a') => self.start_add_stream(),

            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(row) = self.rows.get(self.selected) {
                    self.set_status(format!("Delete '{}'? (y/n)", row.name));
                    self.popup = Popup::Confirm;
                }
            }

            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    async fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::AddStream => self.handle_add_stream_key(key),
            Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')) {
                    self.popup = Popup::None;
                }
                Ok(())
            }
            Popup::Confirm => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => {
                        self.popup = Popup::None;
                        self.delete_selected().await?;
                    }
                    KeyCode::Char('n') | KeyCode::Esc => {
                        self.popup = Popup::None;
                        self.status_message = None;
                    }
                    _ => {}
                }
                Ok(())
            }
            Popup::None => Ok(()),
        }
    }

    fn move_down(&mut self) {
        if !self.rows.is_empty() {
            self.selected = (self.selected + 1) % self.rows.len();
        }
    }

    fn move_up(&mut self) {
        if !self.rows.is_empty() {
            self.selected = self.selected.checked_sub(1).unwrap_or(self.rows.len() - 1);
        }
    }

    async fn toggle_selected(&mut self) -> Result<()> {
        if self.playing == Some(self.selected) {
            self.player.stop().await?;
            self.playing = None;
            self.set_status("Stopped");
            return Ok(());
        }

        let Some(stream) = self.streams.get(self.selected).cloned() else {
            return Ok(());
        };

        match self.player.play(&stream.name, &stream.address).await {
            Ok(()) => {
                self.playing = Some(self.selected);
                self.set_status(format!("Playing {}", stream.name));
                if self.config.notifications {
                    player::notify_playing(&stream.name);
                }
            }
            Err(e) => {
                self.playing = None;
                self.set_status(format!("Error: {}", e));
            }
        }
        Ok(())
    }

    async fn change_volume(&mut self, delta: i16) {
        let Some(current) = self.volume else {
            self.set_status("Volume control unavailable");
            return;
        };

        let target = (current as i16 + delta).clamp(0, 100) as u8;
        match volume::set_volume(target).await {
            Ok(v) => {
                self.volume = Some(v);
                self.set_status(format!("Volume {}%", v));
            }
            Err(e) => self.set_status(format!("Error: {}", e)),
        }
    }

    fn start_add_stream(&mut self) {
        self.popup = Popup::AddStream;
        self.flow = Some(AddStreamFlow::new());
        self.input_buffer.clear();
    }

    fn close_add_stream(&mut self) {
        self.popup = Popup::None;
        self.flow = None;
        self.input_buffer.clear();
    }

    /// Key input for the add-stream popup
    fn handle_add_stream_key(&mut self, key: KeyEvent) -> Result<()> {
        let answer = match key.code {
            KeyCode::Esc => None,
            KeyCode::Enter => Some(std::mem::take(&mut self.input_buffer)),
            KeyCode::Backspace => {
                self.input_buffer.pop();
                return Ok(());
            }
            KeyCode::Char(c) => {
                self.input_buffer.push(c);
                return Ok(());
            }
            _ => return Ok(()),
        };

        let Some(flow) = self.flow.as_mut() else {
            self.close_add_stream();
            return Ok(());
        };

        match flow.answer(answer) {
            Step::Ask(_) => self.input_buffer.clear(),
            Step::Abort => self.close_add_stream(),
            Step::Submit(stream) => {
                self.close_add_stream();

                let mut form = FileForm::new(&mut self.streams);
                form.fill(&stream.name, &stream.address);
                if let Err(e) = form.submit() {
                    self.set_status(format!("Failed: {}", e));
                    return Ok(());
                }

                self.rows = stream_rows(&self.streams, &self.palette);
                self.selected = self.rows.len().saturating_sub(1);
                self.set_status(format!("Added {}", stream.name));
            }
        }
        Ok(())
    }

    async fn delete_selected(&mut self) -> Result<()> {
        let index = self.selected;
        let removed = match self.streams.delete(index) {
            Ok(Some(removed)) => removed,
            Ok(None) => return Ok(()),
            Err(e) => {
                self.set_status(format!("Delete failed: {}", e));
                return Ok(());
            }
        };

        self.rows = stream_rows(&self.streams, &self.palette);
        if self.selected >= self.rows.len() && !self.rows.is_empty() {
            self.selected = self.rows.len() - 1;
        }
        self.set_status(format!("Deleted '{}'", removed.name));

        match self.playing {
            Some(p) if p == index => {
                self.playing = None;
                self.player.stop().await?;
            }
            Some(p) if p > index => self.playing = Some(p - 1),
            _ => {}
        }
        Ok(())
    }

    pub async fn tick(&mut self) -> Result<()> {
        // Clear status message after timeout
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_SECONDS && self.popup != Popup::Confirm {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        // Player exited on its own (stream ended, network dropped)
        if self.playing.is_some() && self.player.now_playing().is_none() {
            self.playing = None;
            self.set_status("Stream ended");
        }

        Ok(())
    }

    /// Stop playback before the UI exits
    pub async fn shutdown(&mut self) -> Result<()> {
        self.player.stop().await
    }
}
