use std::collections::VecDeque;

use common::PlaylistEntry;
use rand::Rng;

pub mod storage;

pub use storage::{load_playlist, save_playlist, PlaylistError};

// What the audio layer should do after a transport call. The sequencer
// decides order; it never touches audio itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportAction {
    Load(String),
    Restart,
    Stay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSignal {
    Finished,
    // the owner's cue to bump the catalog play count
    HalfwayReached,
}

// In shuffle mode every loaded path is appended to a history stack and
// previous() walks that stack backwards.
pub struct PlaybackSequencer {
    playlist: Vec<PlaylistEntry>,
    cursor: Option<usize>,
    shuffle: bool,
    repeat: bool,
    history: Vec<String>,
    signals: VecDeque<PlaybackSignal>,
}

impl PlaybackSequencer {
    pub fn new(shuffle: bool, repeat: bool) -> Self {
        Self {
            playlist: Vec::new(),
            cursor: None,
            shuffle,
            repeat,
            history: Vec::new(),
            signals: VecDeque::new(),
        }
    }

    pub fn playlist(&self) -> &[PlaylistEntry] {
        &self.playlist
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&PlaylistEntry> {
        self.cursor.and_then(|index| self.playlist.get(index))
    }

    pub fn len(&self) -> usize {
        self.playlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlist.is_empty()
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    // turning shuffle off ends the session and discards its history
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
        if !shuffle {
            self.history.clear();
        }
    }

    pub fn set_playlist(&mut self, entries: Vec<PlaylistEntry>) {
        self.playlist = entries;
        self.cursor = None;
        self.history.clear();
    }

    pub fn clear(&mut self) {
        self.set_playlist(Vec::new());
    }

    pub fn append(&mut self, entry: PlaylistEntry) {
        self.playlist.push(entry);
    }

    // inserting at or before the cursor shifts it so the playing entry
    // stays the same
    pub fn insert(&mut self, entry: PlaylistEntry, index: usize) {
        let index = index.min(self.playlist.len());
        self.playlist.insert(index, entry);
        if let Some(current) = self.cursor {
            if index <= current {
                self.cursor = Some(current + 1);
            }
        }
    }

    // removing before the cursor shifts it; removing at the cursor leaves
    // playback pointed at whatever slides into that slot
    pub fn remove(&mut self, index: usize) -> Option<PlaylistEntry> {
        if index >= self.playlist.len() {
            return None;
        }
        let entry = self.playlist.remove(index);
        if let Some(current) = self.cursor {
            if self.playlist.is_empty() {
                self.cursor = None;
            } else if index < current {
                self.cursor = Some(current - 1);
            } else if current >= self.playlist.len() {
                self.cursor = Some(self.playlist.len() - 1);
            }
        }
        Some(entry)
    }

    pub fn play_at(&mut self, index: usize) -> TransportAction {
        self.load_at(index)
    }

    pub fn advance(&mut self) -> TransportAction {
        if self.shuffle {
            self.next_shuffled()
        } else {
            self.next_sequential()
        }
    }

    pub fn next_sequential(&mut self) -> TransportAction {
        if self.playlist.is_empty() {
            return TransportAction::Stay;
        }
        match self.cursor {
            Some(current) if current + 1 < self.playlist.len() => self.load_at(current + 1),
            Some(_) => {
                if self.repeat {
                    self.load_at(0)
                } else {
                    TransportAction::Stay
                }
            }
            None => self.load_at(0),
        }
    }

    pub fn next_shuffled(&mut self) -> TransportAction {
        if self.playlist.len() <= 1 {
            return TransportAction::Stay;
        }
        let mut rng = rand::rng();
        let mut index = rng.random_range(0..self.playlist.len());
        while Some(index) == self.cursor {
            index = rng.random_range(0..self.playlist.len());
        }
        self.load_at(index)
    }

    // In shuffle mode previous pops the history stack and replays its new
    // top without moving the cursor; with less than two entries of history
    // it restarts in place. In sequential mode it steps the cursor back,
    // restarting in place at the first entry. With nothing loaded there is
    // nothing to go back from.
    pub fn previous(&mut self) -> TransportAction {
        if self.playlist.is_empty() || self.cursor.is_none() {
            return TransportAction::Stay;
        }
        if self.shuffle {
            if self.history.len() >= 2 {
                self.history.pop();
                if let Some(path) = self.history.last() {
                    return TransportAction::Load(path.clone());
                }
            }
            return TransportAction::Restart;
        }
        match self.cursor {
            Some(current) if current > 0 => self.load_at(current - 1),
            Some(_) => TransportAction::Restart,
            None => TransportAction::Stay,
        }
    }

    pub fn notify(&mut self, signal: PlaybackSignal) {
        self.signals.push_back(signal);
    }

    pub fn poll_signal(&mut self) -> Option<PlaybackSignal> {
        self.signals.pop_front()
    }

    fn load_at(&mut self, index: usize) -> TransportAction {
        match self.playlist.get(index) {
            Some(entry) => {
                let path = entry.path.clone();
                self.cursor = Some(index);
                if self.shuffle {
                    self.history.push(path.clone());
                }
                TransportAction::Load(path)
            }
            None => TransportAction::Stay,
        }
    }
}
