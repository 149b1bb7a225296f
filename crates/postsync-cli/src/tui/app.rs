//! Application state and logic

use std::time::{Duration, Instant};

use postsync_core::{Draft, Operation, Post, Snapshot, SyncEvent, SyncPhase};

/// How long a status message stays visible
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// List navigation
    Normal,
    /// Typing into the new-post form
    Editing,
}

/// Which form field receives typed characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Body,
}

impl FormField {
    /// Switch to the other field
    pub fn toggle(self) -> Self {
        match self {
            FormField::Title => FormField::Body,
            FormField::Body => FormField::Title,
        }
    }
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_quit: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Field being edited
    pub focused_field: FormField,
    /// Title field contents
    pub title_input: String,
    /// Body field contents
    pub body_input: String,
    /// Latest coordinator snapshot
    pub snapshot: Snapshot,
    /// Currently selected post index
    pub post_index: usize,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<Instant>,
    /// Whether help overlay is visible
    pub show_help: bool,
    /// Draft handed to the coordinator by the last submit
    pub submitted_draft: Option<Draft>,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focused_field: FormField::Title,
            title_input: String::new(),
            body_input: String::new(),
            snapshot: Snapshot::default(),
            post_index: 0,
            status_message: None,
            status_message_time: None,
            show_help: false,
            submitted_draft: None,
        }
    }

    /// Replace the snapshot, keeping the selection in range
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        let len = self.snapshot.items.len();
        if self.post_index >= len {
            self.post_index = len.saturating_sub(1);
        }
    }

    /// React to a coordinator event
    pub fn handle_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::DraftAccepted => {
                // Keep anything typed after the submit went out
                if self.submitted_draft.take() == Some(self.draft()) {
                    self.title_input.clear();
                    self.body_input.clear();
                    self.focused_field = FormField::Title;
                }
            }
            SyncEvent::PostAdded(post) => {
                self.post_index = 0;
                self.set_status(format!("Added post {}", post.id));
            }
            SyncEvent::ItemsReplaced(count) => {
                self.set_status(format!("Loaded {} posts", count));
            }
            SyncEvent::Error(state) => {
                if state.operation == Operation::Submit {
                    self.submitted_draft = None;
                }
                self.set_status(state.message);
            }
            SyncEvent::PhaseChanged(_) => {}
        }
    }

    /// The draft currently typed into the form
    pub fn draft(&self) -> Draft {
        Draft::new(self.title_input.clone(), self.body_input.clone())
    }

    /// Remember the form contents as the draft being submitted
    pub fn submit_draft(&mut self) -> Draft {
        let draft = self.draft();
        self.submitted_draft = Some(draft.clone());
        draft
    }

    pub fn phase(&self) -> SyncPhase {
        self.snapshot.phase
    }

    /// True when a submit is in flight
    pub fn is_submitting(&self) -> bool {
        self.snapshot.phase == SyncPhase::Submitting
    }

    /// Label for the submit button
    pub fn submit_label(&self) -> &'static str {
        if self.is_submitting() {
            "Adding..."
        } else {
            "Add Post"
        }
    }

    /// Get the currently selected post
    pub fn current_post(&self) -> Option<&Post> {
        self.snapshot.items.get(self.post_index)
    }

    /// Set a status message (will auto-dismiss after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Check and clear expired status message
    pub fn check_status_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn move_up(&mut self) {
        self.post_index = self.post_index.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.post_index < self.snapshot.items.len().saturating_sub(1) {
            self.post_index += 1;
        }
    }

    pub fn move_to_first(&mut self) {
        self.post_index = 0;
    }

    pub fn move_to_last(&mut self) {
        self.post_index = self.snapshot.items.len().saturating_sub(1);
    }

    /// Start typing into the form
    pub fn enter_edit_mode(&mut self) {
        self.input_mode = InputMode::Editing;
    }

    /// Return to list navigation, keeping what was typed
    pub fn exit_edit_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn next_field(&mut self) {
        self.focused_field = self.focused_field.toggle();
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focused_field {
            FormField::Title => &mut self.title_input,
            FormField::Body => &mut self.body_input,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.focused_input().push(c);
    }

    pub fn delete_char(&mut self) {
        self.focused_input().pop();
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
